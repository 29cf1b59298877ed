//! # MagicLink
//!
//! 一个无状态的魔法链接（Magic Link）无密码认证库。
//!
//! 签发和验证两类自包含的签名 bearer token，验证所需的全部数据
//! 都在 token 字符串里，服务端不需要 token 存储：
//!
//! - **Challenge token**: 短期，证明用户控制某个邮箱（嵌入登录链接）
//! - **Session token**: 长期，证明已建立的身份（每个请求无状态验证）
//!
//! ## 功能特性
//!
//! - **无状态验证**: HMAC-SHA256 签名，不依赖服务端 token 存储
//! - **域分离**: 两类 token 各有签名字符，一类永远不会被另一类接受
//! - **防篡改**: MAC 覆盖全部字段，常量时间比较
//! - **可插拔存储**: 用户记录通过 [`UserStore`] trait 接入任意持久化引擎
//! - **惰性标识符**: 用户记录的 128 位有序标识符 (UUID v7) 按需生成
//!
//! ## Token 格式
//!
//! ```text
//! <签名字符><盐值>-<主体>-<过期时间>-<MAC>
//! ```
//!
//! 字段使用去补位的 RFC 4648 base32 编码，token 可以直接放进
//! cookie、URL 查询参数或 bearer 头。
//!
//! ## 完整登录流程
//!
//! ```rust
//! use magiclink::{MagicLinkConfig, MagicLinkManager};
//!
//! let manager =
//!     MagicLinkManager::new(b"an-example-secret-key!!", MagicLinkConfig::default()).unwrap();
//!
//! // 1. 用户请求登录：签发 challenge，应用层发邮件
//! let challenge = manager.generate_challenge("User@Example.com ").unwrap();
//!
//! // 2. 用户点击链接：验证 challenge，得到用户记录（邮箱已规范化）
//! let mut user = manager.verify_challenge(&challenge).unwrap();
//! assert_eq!(user.email, "user@example.com");
//!
//! // 3. 持久化记录（调用方的显式动作），签发 session
//! manager.store_user(&mut user).unwrap();
//! let session = manager.generate_session(&mut user).unwrap();
//!
//! // 4. 之后每个请求无状态验证 session
//! let verified = manager.verify_session(&session).unwrap();
//! assert_eq!(verified.email, "user@example.com");
//! ```
//!
//! ## 错误区分
//!
//! 验证失败必须能被调用方区分为三类：
//!
//! ```rust
//! use magiclink::{Error, MagicLinkConfig, MagicLinkManager};
//!
//! let manager =
//!     MagicLinkManager::new(b"an-example-secret-key!!", MagicLinkConfig::default()).unwrap();
//!
//! match manager.verify_challenge("not-a-token") {
//!     Err(Error::InvalidChallenge) => {} // 格式错误
//!     Err(Error::ExpiredChallenge) => {} // 已过期
//!     Err(Error::BrokenChallenge) => {}  // 被篡改
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```
//!
//! ## 不包含的功能
//!
//! 本库只负责 token 的构造与验证协议。速率限制、token 撤销、
//! 重放窗口跟踪、传输安全、邮件发送和 HTTP 集成由外围服务负责。

pub mod crypto;
pub mod error;
pub mod manager;
pub mod random;
pub mod store;
pub mod token;
pub mod user;

pub use error::{Error, Result, StorageError};

// ============================================================================
// 管理器导出
// ============================================================================

pub use manager::{MagicLinkConfig, MagicLinkManager};

// ============================================================================
// 数据模型导出
// ============================================================================

pub use store::{InMemoryUserStore, UserStore};
pub use user::{UserRecord, normalize_email};

// ============================================================================
// 底层原语导出
// ============================================================================

pub use crypto::KeyMaterial;
pub use random::{constant_time_compare, generate_random_bytes};
pub use token::{SALT_LENGTH, TokenFailure, TokenKind, TokenPayload, decode_token, encode_token};
