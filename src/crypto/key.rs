//! 签名密钥模块
//!
//! 把操作者提供的原始密钥转换为固定长度的签名密钥，
//! 并提供 token MAC 的计算与校验。

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{Error, Result};
use crate::random::constant_time_compare;

type HmacSha256 = Hmac<Sha256>;

/// 签名密钥材料
///
/// 构造时对原始密钥做一次 SHA-256 摘要，之后只保留摘要，
/// 原始密钥不再存储。所有 MAC 计算都以该摘要为密钥。
///
/// 构造完成后不可变，可以在多个线程间共享，无需加锁。
///
/// ## 示例
///
/// ```rust
/// use magiclink::crypto::KeyMaterial;
/// use magiclink::Error;
///
/// // 密钥至少 16 字节
/// let key = KeyMaterial::new(b"an-example-secret-key!!").unwrap();
///
/// // 太短的密钥会被拒绝
/// let err = KeyMaterial::new(b"too-short").unwrap_err();
/// assert!(matches!(err, Error::SecretKeyTooShort { .. }));
/// ```
#[derive(Clone)]
pub struct KeyMaterial {
    digest: [u8; 32],
}

impl KeyMaterial {
    /// 密钥的最小字节数
    pub const MIN_SECRET_LEN: usize = 16;

    /// 从原始密钥构造签名密钥
    ///
    /// # Arguments
    ///
    /// * `secret` - 操作者提供的原始密钥，至少 16 字节
    ///
    /// # Errors
    ///
    /// 密钥短于 16 字节时返回 [`Error::SecretKeyTooShort`]
    pub fn new(secret: &[u8]) -> Result<Self> {
        if secret.len() < Self::MIN_SECRET_LEN {
            return Err(Error::SecretKeyTooShort {
                min: Self::MIN_SECRET_LEN,
                actual: secret.len(),
            });
        }
        Ok(Self {
            digest: Sha256::digest(secret).into(),
        })
    }

    /// 计算一组字段的 MAC
    ///
    /// 字段之间以单个 `0x00` 字节连接后做 HMAC-SHA256。
    /// 分隔符保证字段边界无歧义：`["ab", "c"]` 与 `["a", "bc"]`
    /// 产生不同的 MAC。
    ///
    /// # Arguments
    ///
    /// * `fields` - 参与认证的字段，按固定顺序
    ///
    /// # Returns
    ///
    /// 返回 32 字节的 MAC
    pub fn mac(&self, fields: &[&[u8]]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.digest).expect("HMAC can take key of any size");
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                mac.update(&[0]);
            }
            mac.update(field);
        }
        mac.finalize().into_bytes().to_vec()
    }

    /// 校验一组字段的 MAC
    ///
    /// 重新计算期望的 MAC 并做常量时间比较，
    /// 不会因前缀相同而提前返回。
    ///
    /// # Arguments
    ///
    /// * `fields` - 参与认证的字段，按固定顺序
    /// * `tag` - 待校验的 MAC
    pub fn verify_mac(&self, fields: &[&[u8]], tag: &[u8]) -> bool {
        constant_time_compare(&self.mac(fields), tag)
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial([REDACTED])")
    }
}
