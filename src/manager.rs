//! Magic Link 管理器模块
//!
//! 提供无密码登录的两类操作：
//!
//! - **Challenge**: 签发/验证邮箱所有权 token（短期，嵌入登录链接）
//! - **Session**: 签发/验证会话 token（长期，每个请求无状态验证）
//!
//! 两类 token 都是自包含的签名字符串，服务端不保存任何 token。
//! 管理器构造后不可变，可以在并发调用方之间共享。
//!
//! ## 工作流程
//!
//! 1. 用户输入邮箱请求登录
//! 2. [`MagicLinkManager::generate_challenge`] 生成 challenge token，
//!    应用层把它嵌入 URL 发送到用户邮箱
//! 3. 用户点击链接，[`MagicLinkManager::verify_challenge`] 验证并返回
//!    用户记录（新邮箱会得到一条尚未落库的新记录）
//! 4. 调用方显式持久化记录，然后用
//!    [`MagicLinkManager::generate_session`] 签发会话 token
//! 5. 之后每个请求用 [`MagicLinkManager::verify_session`] 无状态验证
//!
//! ## 示例
//!
//! ```rust
//! use magiclink::{MagicLinkConfig, MagicLinkManager};
//!
//! let manager =
//!     MagicLinkManager::new(b"an-example-secret-key!!", MagicLinkConfig::default()).unwrap();
//!
//! // 签发并验证 challenge
//! let challenge = manager.generate_challenge("User@Example.com ").unwrap();
//! let mut user = manager.verify_challenge(&challenge).unwrap();
//! assert_eq!(user.email, "user@example.com");
//!
//! // 持久化是调用方的显式后续动作
//! manager.store_user(&mut user).unwrap();
//!
//! // 签发并验证 session
//! let session = manager.generate_session(&mut user).unwrap();
//! let verified = manager.verify_session(&session).unwrap();
//! assert_eq!(verified.email, "user@example.com");
//! ```

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::crypto::KeyMaterial;
use crate::error::{Error, Result};
use crate::random::generate_random_bytes;
use crate::store::{InMemoryUserStore, UserStore};
use crate::token::{SALT_LENGTH, TokenKind, decode_token, encode_token};
use crate::user::{UserRecord, normalize_email};

/// Magic Link 配置
///
/// 两个有效期都是有符号的时长：`session_ttl` 小于等于零表示签发
/// 过期字段为 `0` 的会话 token。
#[derive(Debug, Clone)]
pub struct MagicLinkConfig {
    /// Challenge token 有效期
    pub challenge_ttl: Duration,

    /// Session token 有效期；小于等于零时过期字段编码为 `0`
    pub session_ttl: Duration,
}

impl Default for MagicLinkConfig {
    fn default() -> Self {
        Self {
            challenge_ttl: Duration::minutes(15),
            session_ttl: Duration::days(30),
        }
    }
}

impl MagicLinkConfig {
    /// 创建新配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置 challenge 有效期
    pub fn with_challenge_ttl(mut self, ttl: Duration) -> Self {
        self.challenge_ttl = ttl;
        self
    }

    /// 设置 session 有效期
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// 高安全性配置
    ///
    /// - 5 分钟 challenge 有效期
    /// - 24 小时 session 有效期
    pub fn high_security() -> Self {
        Self {
            challenge_ttl: Duration::minutes(5),
            session_ttl: Duration::hours(24),
        }
    }
}

/// Magic Link 管理器
///
/// 持有签名密钥、有效期配置和用户存储，构造后不可变。
/// 所有操作都是同步的，只在取随机数和访问存储时可能阻塞。
///
/// ## 示例
///
/// ```rust
/// use magiclink::{InMemoryUserStore, MagicLinkConfig, MagicLinkManager};
///
/// // 默认使用内存存储
/// let manager =
///     MagicLinkManager::new(b"an-example-secret-key!!", MagicLinkConfig::default()).unwrap();
///
/// // 或者提供自定义存储实现
/// let store = InMemoryUserStore::new();
/// let manager = MagicLinkManager::with_store(
///     b"an-example-secret-key!!",
///     MagicLinkConfig::high_security(),
///     store,
/// )
/// .unwrap();
/// # let _ = manager;
/// ```
#[derive(Debug)]
pub struct MagicLinkManager<S: UserStore = InMemoryUserStore> {
    key: KeyMaterial,
    config: MagicLinkConfig,
    store: S,
}

impl MagicLinkManager<InMemoryUserStore> {
    /// 使用默认内存存储创建管理器
    ///
    /// # Errors
    ///
    /// 密钥短于 16 字节时返回 [`Error::SecretKeyTooShort`]
    pub fn new(secret: &[u8], config: MagicLinkConfig) -> Result<Self> {
        Self::with_store(secret, config, InMemoryUserStore::new())
    }
}

impl<S: UserStore> MagicLinkManager<S> {
    /// 使用自定义存储创建管理器
    ///
    /// # Errors
    ///
    /// 密钥短于 16 字节时返回 [`Error::SecretKeyTooShort`]
    pub fn with_store(secret: &[u8], config: MagicLinkConfig, store: S) -> Result<Self> {
        Ok(Self {
            key: KeyMaterial::new(secret)?,
            config,
            store,
        })
    }

    /// 为邮箱签发 challenge token
    ///
    /// 邮箱在这里完成规范化；过期时间为当前时间加 challenge 有效期。
    ///
    /// # Example
    ///
    /// ```rust
    /// use magiclink::{MagicLinkConfig, MagicLinkManager};
    ///
    /// let manager =
    ///     MagicLinkManager::new(b"an-example-secret-key!!", MagicLinkConfig::default()).unwrap();
    /// let challenge = manager.generate_challenge("user@example.com").unwrap();
    ///
    /// // 应用层把 token 嵌入登录链接发送邮件
    /// let url = format!("https://example.com/auth/magic?token={}", challenge);
    /// # let _ = url;
    /// ```
    pub fn generate_challenge(&self, email: &str) -> Result<String> {
        let email = normalize_email(email);
        let salt = generate_random_bytes(SALT_LENGTH)?;
        let expires_at = (Utc::now() + self.config.challenge_ttl).timestamp();

        let token = encode_token(
            TokenKind::Challenge,
            &self.key,
            &salt,
            email.as_bytes(),
            expires_at,
        );
        tracing::debug!(expires_at, "issued challenge token");
        Ok(token)
    }

    /// 验证 challenge token 并解析出用户记录
    ///
    /// 验证通过后按邮箱查找已有用户；不存在时在内存中构造一条新记录
    /// —— 验证过的 challenge 就是邮箱所有权的证明，足以开通身份。
    /// 这是唯一会凭空构造用户记录的路径。
    ///
    /// 每次验证成功都会刷新 `recent_login_time`，包括已有用户。
    ///
    /// **不会持久化**：把记录写入存储是调用方的显式后续动作
    /// （[`MagicLinkManager::store_user`]）。
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidChallenge`] - 前缀、字段数或字段解码失败
    /// - [`Error::ExpiredChallenge`] - token 已过期
    /// - [`Error::BrokenChallenge`] - MAC 校验失败
    /// - 存储层的其他错误原样上抛
    pub fn verify_challenge(&self, challenge: &str) -> Result<UserRecord> {
        let payload = decode_token(TokenKind::Challenge, &self.key, challenge)
            .map_err(|failure| failure.into_error(TokenKind::Challenge))?;
        let email = String::from_utf8(payload.subject).map_err(|_| Error::InvalidChallenge)?;

        let mut user = match self.store.get_user_by_email(&email) {
            Ok(user) => user,
            Err(Error::UserNotFound) => UserRecord::new(&email),
            Err(e) => return Err(e),
        };
        user.touch_login();

        tracing::debug!(known_user = user.has_id(), "challenge verified");
        Ok(user)
    }

    /// 为用户签发 session token
    ///
    /// 主体是用户的 16 字节原始标识符；标识符尚未分配时在这里
    /// 触发惰性生成（因此参数是 `&mut`）。
    ///
    /// session 有效期小于等于零时，过期字段编码为 `0`。
    pub fn generate_session(&self, user: &mut UserRecord) -> Result<String> {
        let salt = generate_random_bytes(SALT_LENGTH)?;
        let expires_at = if self.config.session_ttl <= Duration::zero() {
            0
        } else {
            (Utc::now() + self.config.session_ttl).timestamp()
        };
        let id = user.id();

        let token = encode_token(
            TokenKind::Session,
            &self.key,
            &salt,
            id.as_bytes(),
            expires_at,
        );
        tracing::debug!(expires_at, "issued session token");
        Ok(token)
    }

    /// 验证 session token 并加载用户记录
    ///
    /// 与 challenge 验证不同，标识符必须已经存在于存储中；
    /// 不存在时存储层的 [`Error::UserNotFound`] 原样上抛 ——
    /// session 链路永远不会凭空构造身份。
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSessionId`] - 前缀、字段数、字段解码失败，
    ///   或主体不是 16 字节标识符
    /// - [`Error::ExpiredSessionId`] - token 已过期
    /// - [`Error::BrokenSessionId`] - MAC 校验失败
    /// - [`Error::UserNotFound`] - 标识符不存在
    pub fn verify_session(&self, session: &str) -> Result<UserRecord> {
        let payload = decode_token(TokenKind::Session, &self.key, session)
            .map_err(|failure| failure.into_error(TokenKind::Session))?;
        let id = Uuid::from_slice(&payload.subject).map_err(|_| Error::InvalidSessionId)?;

        let user = self.store.get_user_by_id(id)?;
        tracing::debug!("session verified");
        Ok(user)
    }

    /// 把用户记录写入存储
    ///
    /// challenge 验证返回的瞬态记录由调用方通过这里显式落库。
    pub fn store_user(&self, user: &mut UserRecord) -> Result<()> {
        self.store.store_user(user)
    }

    /// 按邮箱查找用户（输入会先规范化）
    pub fn user_by_email(&self, email: &str) -> Result<UserRecord> {
        self.store.get_user_by_email(email)
    }

    /// 邮箱对应的用户是否存在
    pub fn user_exists(&self, email: &str) -> Result<bool> {
        self.store.user_exists_by_email(email)
    }

    /// 用户总数（首次运行引导逻辑用）
    pub fn user_count(&self) -> Result<usize> {
        self.store.user_count()
    }

    /// 是否存在任何用户（首次运行引导逻辑用）
    pub fn users_exist(&self) -> Result<bool> {
        self.store.users_exist()
    }

    /// 获取配置
    pub fn config(&self) -> &MagicLinkConfig {
        &self.config
    }

    /// 获取存储引用
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> MagicLinkManager {
        MagicLinkManager::new(b"an-example-secret-key!!", MagicLinkConfig::default()).unwrap()
    }

    #[test]
    fn test_short_secret_rejected() {
        // 10 字节密钥：构造直接失败，得不到任何可用的管理器
        let err =
            MagicLinkManager::new(b"0123456789", MagicLinkConfig::default()).unwrap_err();
        assert_eq!(err, Error::SecretKeyTooShort { min: 16, actual: 10 });
    }

    #[test]
    fn test_challenge_round_trip_normalizes_email() {
        let manager = manager();

        let challenge = manager.generate_challenge("User@Example.com ").unwrap();
        let user = manager.verify_challenge(&challenge).unwrap();
        assert_eq!(user.email, "user@example.com");
    }

    #[test]
    fn test_verified_challenge_for_unknown_email_is_ephemeral() {
        let manager = manager();

        let challenge = manager.generate_challenge("new@example.com").unwrap();
        let user = manager.verify_challenge(&challenge).unwrap();

        // 新记录尚未落库，标识符也尚未分配
        assert!(!user.has_id());
        assert_eq!(manager.user_count().unwrap(), 0);
        assert!(!manager.user_exists("new@example.com").unwrap());
    }

    #[test]
    fn test_verified_challenge_resolves_existing_user() {
        let manager = manager();

        let challenge = manager.generate_challenge("user@example.com").unwrap();
        let mut first = manager.verify_challenge(&challenge).unwrap();
        manager.store_user(&mut first).unwrap();
        let first_login = first.first_login_time;

        std::thread::sleep(std::time::Duration::from_millis(2));

        let challenge = manager.generate_challenge("user@example.com").unwrap();
        let mut again = manager.verify_challenge(&challenge).unwrap();

        assert_eq!(again.id(), first.id());
        assert_eq!(again.first_login_time, first_login);
        assert!(again.recent_login_time > first.recent_login_time);
    }

    #[test]
    fn test_expired_challenge() {
        let config = MagicLinkConfig::default().with_challenge_ttl(Duration::seconds(-60));
        let manager =
            MagicLinkManager::new(b"an-example-secret-key!!", config).unwrap();

        let challenge = manager.generate_challenge("user@example.com").unwrap();
        assert_eq!(
            manager.verify_challenge(&challenge).unwrap_err(),
            Error::ExpiredChallenge
        );
    }

    #[test]
    fn test_tampered_challenge_is_broken() {
        let manager = manager();
        let challenge = manager.generate_challenge("user@example.com").unwrap();

        // 在字母表内替换 MAC 字段的一个字符
        let dash = challenge.rfind('-').unwrap();
        let mut chars: Vec<char> = challenge.chars().collect();
        chars[dash + 1] = if chars[dash + 1] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();

        assert_eq!(
            manager.verify_challenge(&tampered).unwrap_err(),
            Error::BrokenChallenge
        );
    }

    #[test]
    fn test_session_round_trip() {
        let manager = manager();
        let mut user = UserRecord::new("user@example.com");
        manager.store_user(&mut user).unwrap();

        let session = manager.generate_session(&mut user).unwrap();
        let mut verified = manager.verify_session(&session).unwrap();
        assert_eq!(verified.id(), user.id());
        assert_eq!(verified.email, "user@example.com");
    }

    #[test]
    fn test_session_for_unknown_user_is_not_found() {
        let manager = manager();

        // 记录从未落库：session 链路不会凭空构造身份
        let mut user = UserRecord::new("ghost@example.com");
        let session = manager.generate_session(&mut user).unwrap();
        assert_eq!(
            manager.verify_session(&session).unwrap_err(),
            Error::UserNotFound
        );
    }

    #[test]
    fn test_non_positive_session_ttl_encodes_zero_expiry() {
        let config = MagicLinkConfig::default().with_session_ttl(Duration::zero());
        let manager =
            MagicLinkManager::new(b"an-example-secret-key!!", config).unwrap();

        let mut user = UserRecord::new("user@example.com");
        manager.store_user(&mut user).unwrap();

        let session = manager.generate_session(&mut user).unwrap();
        let parts: Vec<&str> = session[1..].split('-').collect();
        assert_eq!(parts[2], "0");

        // 过期字段 0 永远早于当前时间：这类 token 始终被判定为过期
        assert_eq!(
            manager.verify_session(&session).unwrap_err(),
            Error::ExpiredSessionId
        );
    }

    #[test]
    fn test_domain_separation() {
        let manager = manager();

        let challenge = manager.generate_challenge("user@example.com").unwrap();
        assert_eq!(
            manager.verify_session(&challenge).unwrap_err(),
            Error::InvalidSessionId
        );

        let mut user = UserRecord::new("user@example.com");
        manager.store_user(&mut user).unwrap();
        let session = manager.generate_session(&mut user).unwrap();
        assert_eq!(
            manager.verify_challenge(&session).unwrap_err(),
            Error::InvalidChallenge
        );
    }

    #[test]
    fn test_malformed_tokens_do_not_panic() {
        let manager = manager();

        for token in ["", "9", "S", "abc", "9a-b-c", "9!!-!!-!!-!!", "Sx-y-z-w-v"] {
            assert!(manager.verify_challenge(token).is_err());
            assert!(manager.verify_session(token).is_err());
        }
    }

    #[test]
    fn test_lazy_id_assigned_at_session_issuance() {
        let manager = manager();
        let mut user = UserRecord::new("user@example.com");
        assert!(!user.has_id());

        manager.generate_session(&mut user).unwrap();
        assert!(user.has_id());
    }
}
