//! 用户存储契约模块
//!
//! 定义核心对持久化层的唯一依赖 [`UserStore`]，并提供一个
//! 内存实现 [`InMemoryUserStore`]（适用于测试和单进程部署）。
//!
//! 具体的持久化引擎（SQL、文档文件等）由应用层实现此 trait 提供。
//! 所有操作都是同步的，超时和重试由调用方在外层处理。

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::error::{Error, Result, StorageError};
use crate::user::{UserRecord, normalize_email};

/// 用户存储契约
///
/// 核心只要求这几个操作。邮箱唯一性由存储层保证（例如唯一索引）。
///
/// `store_user` 采用「先查是否存在，再插入或更新」的模式，这不是
/// 原子操作：两个并发调用可能同时观察到「不存在」并都尝试插入，
/// 至少一方会收到存储层的冲突错误。核心接受这个竞争，原样上抛
/// 冲突错误，不做重试。
pub trait UserStore: Send + Sync {
    /// 写入或更新用户记录
    ///
    /// 参数是 `&mut`：派生存储键可能触发标识符的惰性生成。
    fn store_user(&self, user: &mut UserRecord) -> Result<()>;

    /// 按标识符查找用户
    ///
    /// # Errors
    ///
    /// 不存在时返回 [`Error::UserNotFound`]
    fn get_user_by_id(&self, id: Uuid) -> Result<UserRecord>;

    /// 按邮箱查找用户（输入会先规范化）
    ///
    /// # Errors
    ///
    /// 不存在时返回 [`Error::UserNotFound`]
    fn get_user_by_email(&self, email: &str) -> Result<UserRecord>;

    /// 邮箱对应的用户是否存在（输入会先规范化）
    fn user_exists_by_email(&self, email: &str) -> Result<bool>;

    /// 用户总数（供调用方的首次运行引导逻辑使用）
    fn user_count(&self) -> Result<usize>;

    /// 是否存在任何用户（供调用方的首次运行引导逻辑使用）
    fn users_exist(&self) -> Result<bool>;
}

/// 内存存储实现
///
/// 适用于测试和单进程部署。多实例部署需要共享的持久化引擎。
///
/// ## 示例
///
/// ```rust
/// use magiclink::{InMemoryUserStore, UserRecord, UserStore};
///
/// let store = InMemoryUserStore::new();
/// let mut user = UserRecord::new("user@example.com");
///
/// store.store_user(&mut user).unwrap();
/// assert!(store.user_exists_by_email("User@Example.com ").unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, UserRecord>>>,
}

impl InMemoryUserStore {
    /// 创建新的内存存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前存储的记录数量
    pub fn len(&self) -> usize {
        self.users.read().unwrap().len()
    }

    /// 存储是否为空
    pub fn is_empty(&self) -> bool {
        self.users.read().unwrap().is_empty()
    }
}

impl UserStore for InMemoryUserStore {
    fn store_user(&self, user: &mut UserRecord) -> Result<()> {
        let id = user.id();
        let mut users = self.users.write().unwrap();

        // 先查后写；同一邮箱被不同标识符占用时模拟唯一索引冲突
        let conflict = users
            .iter()
            .any(|(stored_id, stored)| stored.email == user.email && *stored_id != id);
        if conflict {
            return Err(Error::Storage(StorageError::AlreadyExists(
                user.email.clone(),
            )));
        }

        users.insert(id, user.clone());
        Ok(())
    }

    fn get_user_by_id(&self, id: Uuid) -> Result<UserRecord> {
        self.users
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(Error::UserNotFound)
    }

    fn get_user_by_email(&self, email: &str) -> Result<UserRecord> {
        let email = normalize_email(email);
        self.users
            .read()
            .unwrap()
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or(Error::UserNotFound)
    }

    fn user_exists_by_email(&self, email: &str) -> Result<bool> {
        let email = normalize_email(email);
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .any(|user| user.email == email))
    }

    fn user_count(&self) -> Result<usize> {
        Ok(self.len())
    }

    fn users_exist(&self) -> Result<bool> {
        Ok(!self.is_empty())
    }
}
