//! Token 模块
//!
//! 提供通用的签名 token 编解码。
//!
//! 两类 token（challenge 与 session）共用同一套文本格式：
//!
//! ```text
//! <签名字符><盐值>-<主体>-<过期时间>-<MAC>
//! ```
//!
//! 首字符标识 token 的类别，解码时作为硬性前置条件检查，
//! 一类 token 永远不会被另一类校验通过。
//!
//! ## 示例
//!
//! ```rust
//! use magiclink::crypto::KeyMaterial;
//! use magiclink::token::{decode_token, encode_token, TokenKind};
//!
//! let key = KeyMaterial::new(b"an-example-secret-key!!").unwrap();
//!
//! let token = encode_token(
//!     TokenKind::Challenge,
//!     &key,
//!     b"12345678",
//!     b"user@example.com",
//!     i64::MAX,
//! );
//! assert!(token.starts_with('9'));
//!
//! let payload = decode_token(TokenKind::Challenge, &key, &token).unwrap();
//! assert_eq!(payload.subject, b"user@example.com");
//!
//! // 类别不匹配时直接拒绝
//! assert!(decode_token(TokenKind::Session, &key, &token).is_err());
//! ```

pub mod codec;

pub use codec::{
    SALT_LENGTH, TokenFailure, TokenKind, TokenPayload, decode_token, encode_token,
};
