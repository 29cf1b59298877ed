//! 密码学工具模块
//!
//! 提供签名密钥的派生与 MAC 计算。
//!
//! ## 功能
//!
//! - **KeyMaterial**: 从操作者提供的密钥派生固定长度的签名密钥，
//!   并提供 HMAC-SHA256 计算与常量时间校验
//!
//! ## 示例
//!
//! ```rust
//! use magiclink::crypto::KeyMaterial;
//!
//! let key = KeyMaterial::new(b"an-example-secret-key!!").unwrap();
//!
//! let tag = key.mac(&[b"salt", b"subject", b"1700000000"]);
//! assert!(key.verify_mac(&[b"salt", b"subject", b"1700000000"], &tag));
//! assert!(!key.verify_mac(&[b"salt", b"tampered", b"1700000000"], &tag));
//! ```

pub mod key;

pub use key::KeyMaterial;
