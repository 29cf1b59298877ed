//! 用户记录模块
//!
//! 提供贯穿 challenge 与 session 两条链路的身份实体 [`UserRecord`]，
//! 以及邮箱规范化函数。
//!
//! 记录有两个生命周期状态：**瞬态**（challenge 验证时在内存中构造，
//! 尚未落库）和**持久态**（调用方通过存储契约写入之后）。
//! 核心逻辑不区分这两种状态。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 规范化邮箱地址
///
/// 去掉首尾空白并转为小写。规范化在创建记录或签发 challenge 时
/// 恰好执行一次，之后所有比较和查找都使用规范化形式。
///
/// # Example
///
/// ```rust
/// use magiclink::user::normalize_email;
///
/// assert_eq!(normalize_email("  User@Example.com "), "user@example.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 用户记录
///
/// 标识符是 128 位、按创建时间有序的 UUID (v7)，**惰性生成**：
/// 字段初始为零值，第一次需要对外使用标识符的访问（[`UserRecord::id`]、
/// [`UserRecord::storage_key`]）触发生成，之后保持不变。
///
/// `custom_data` 是应用自定义的 JSON 负载，核心逻辑只在创建时
/// 初始化为 `null`，之后既不读也不改。序列化往返不保证保留应用
/// 原始的静态类型（数值可能变宽），这由应用层自行容忍。
///
/// ## 示例
///
/// ```rust
/// use magiclink::UserRecord;
///
/// let mut user = UserRecord::new("  User@Example.com ");
/// assert_eq!(user.email, "user@example.com");
/// assert!(user.enabled);
/// assert!(!user.has_id());
///
/// // 第一次访问时生成标识符，之后保持不变
/// let id = user.id();
/// assert!(user.has_id());
/// assert_eq!(user.id(), id);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// 惰性生成的唯一标识符，零值表示尚未分配
    id: Uuid,

    /// 规范化后的邮箱地址，在所有记录中逻辑唯一
    /// （唯一性由存储层的索引保证，不由核心保证）
    pub email: String,

    /// 是否启用；核心不处理该标志，只透传给调用方
    pub enabled: bool,

    /// 首次登录时间，创建时设置一次
    pub first_login_time: DateTime<Utc>,

    /// 最近登录时间，每次 challenge 验证成功后刷新
    pub recent_login_time: DateTime<Utc>,

    /// 应用自定义负载
    pub custom_data: serde_json::Value,
}

impl UserRecord {
    /// 创建新的用户记录
    ///
    /// 邮箱在这里完成规范化；标识符保持零值，等待第一次访问时生成。
    pub fn new(email: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::nil(),
            email: normalize_email(email),
            enabled: true,
            first_login_time: now,
            recent_login_time: now,
            custom_data: serde_json::Value::Null,
        }
    }

    /// 获取标识符，尚未分配时先生成
    ///
    /// 生成使用 UUID v7：毫秒时间戳前缀保证新记录仅按标识符排序
    /// 就晚于旧记录，每次调用独立产生随机部分。
    /// 标识符一旦非零就不再改变。
    pub fn id(&mut self) -> Uuid {
        if self.id.is_nil() {
            self.id = Uuid::now_v7();
        }
        self.id
    }

    /// 标识符是否已经分配
    pub fn has_id(&self) -> bool {
        !self.id.is_nil()
    }

    /// 派生存储键，格式为 `$<标识符>$<邮箱>`
    ///
    /// 文件类存储引擎用它做文件名。需要标识符，因此会触发惰性生成。
    pub fn storage_key(&mut self) -> String {
        let id = self.id();
        format!("${}${}", id, self.email)
    }

    /// 刷新最近登录时间
    pub fn touch_login(&mut self) {
        self.recent_login_time = Utc::now();
    }
}
