//! 统一错误类型模块
//!
//! 提供 magiclink 库中所有操作的错误类型定义。
//!
//! Token 校验的三类失败必须可以被调用方区分开：
//!
//! - **Invalid**: 格式错误（前缀、字段数、无法解码的字段、无法解析的过期时间）
//! - **Expired**: 过期时间早于当前时间
//! - **Broken**: MAC 校验失败（被篡改或伪造）
//!
//! 系统边界（如 HTTP 层）在向用户返回错误时，不应透露具体哪个字段解码失败。

use std::fmt;

/// magiclink 库的统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// magiclink 库的错误类型
///
/// 每种失败对应一个独立的变体，调用方可以穷尽匹配，
/// 不需要通过字符串或错误码来区分。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// 密钥太短（最少 16 字节）
    SecretKeyTooShort {
        /// 要求的最小字节数
        min: usize,
        /// 实际提供的字节数
        actual: usize,
    },

    /// Challenge token 格式错误
    InvalidChallenge,

    /// Challenge token 已过期
    ExpiredChallenge,

    /// Challenge token MAC 校验失败
    BrokenChallenge,

    /// Session token 格式错误
    InvalidSessionId,

    /// Session token 已过期
    ExpiredSessionId,

    /// Session token MAC 校验失败
    BrokenSessionId,

    /// 用户不存在
    UserNotFound,

    /// 随机数生成失败
    Rng(String),

    /// 存储层错误
    Storage(StorageError),
}

/// 存储层相关错误
///
/// 具体存储引擎（内存、SQL、文件等）产生的失败。
/// `UserNotFound` 不在这里，它是协议层的一等变体。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// 邮箱已被另一个用户记录占用
    AlreadyExists(String),

    /// 其他存储操作失败
    OperationFailed(String),
}

// ============================================================================
// Display 实现
// ============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SecretKeyTooShort { min, actual } => {
                write!(f, "secret key too short (min {} bytes, got {})", min, actual)
            }
            Error::InvalidChallenge => write!(f, "invalid challenge"),
            Error::ExpiredChallenge => write!(f, "expired challenge"),
            Error::BrokenChallenge => write!(f, "broken challenge"),
            Error::InvalidSessionId => write!(f, "invalid session id"),
            Error::ExpiredSessionId => write!(f, "expired session id"),
            Error::BrokenSessionId => write!(f, "broken session id"),
            Error::UserNotFound => write!(f, "user not found"),
            Error::Rng(msg) => write!(f, "random number generation failed: {}", msg),
            Error::Storage(e) => write!(f, "storage error: {}", e),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::AlreadyExists(email) => write!(f, "already exists: {}", email),
            StorageError::OperationFailed(msg) => write!(f, "operation failed: {}", msg),
        }
    }
}

// ============================================================================
// std::error::Error 实现
// ============================================================================

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl std::error::Error for StorageError {}

// ============================================================================
// From 实现 - 方便错误转换
// ============================================================================

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Error::Storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::InvalidChallenge.to_string(), "invalid challenge");
        assert_eq!(Error::BrokenSessionId.to_string(), "broken session id");
        assert_eq!(Error::UserNotFound.to_string(), "user not found");
    }

    #[test]
    fn test_secret_key_too_short_display() {
        let err = Error::SecretKeyTooShort { min: 16, actual: 10 };
        assert_eq!(
            err.to_string(),
            "secret key too short (min 16 bytes, got 10)"
        );
    }

    #[test]
    fn test_error_from_storage() {
        let storage_err = StorageError::AlreadyExists("user@example.com".to_string());
        let err: Error = storage_err.into();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(
            err.to_string(),
            "storage error: already exists: user@example.com"
        );
    }

    #[test]
    fn test_token_errors_are_distinct() {
        // Invalid / Expired / Broken 三类互不相等，调用方靠它们分流
        assert_ne!(Error::InvalidChallenge, Error::ExpiredChallenge);
        assert_ne!(Error::ExpiredChallenge, Error::BrokenChallenge);
        assert_ne!(Error::InvalidSessionId, Error::InvalidChallenge);
    }
}
