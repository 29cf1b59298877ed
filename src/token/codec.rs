//! 签名 token 编解码模块
//!
//! 实现固定格式的自包含签名 token：
//!
//! ```text
//! <签名字符><盐值>-<主体>-<过期时间>-<MAC>
//! ```
//!
//! - 盐值、主体、MAC 使用 RFC 4648 base32 编码并去掉尾部补位字符
//! - 过期时间是十进制 ASCII 的 Unix 秒
//! - MAC = HMAC-SHA256(盐值 ‖ 0x00 ‖ 主体 ‖ 0x00 ‖ 过期时间 ASCII)
//!
//! token 字符串只包含 base32 字母表、ASCII 数字和 `-`，
//! 可以直接放进 cookie、URL 查询参数或 bearer 头。
//!
//! 解码按固定顺序执行：前缀、字段数、字段解码、过期时间解析、
//! 过期检查、MAC 常量时间比较。格式失败、过期失败、MAC 失败
//! 通过 [`TokenFailure`] 区分，调用方据此映射到各自类别的错误。

use base32::{Alphabet, decode as base32_decode, encode as base32_encode};
use chrono::Utc;

use crate::crypto::KeyMaterial;
use crate::error::Error;

/// 每个 token 的盐值字节数
pub const SALT_LENGTH: usize = 8;

/// Challenge token 的签名字符
const CHALLENGE_SIGNATURE: char = '9';

/// Session token 的签名字符
const SESSION_SIGNATURE: char = 'S';

const B32: Alphabet = Alphabet::Rfc4648 { padding: true };

/// Token 类别
///
/// 每个类别有自己的签名字符，解码时首先检查。
/// 类别决定了主体字段的含义：challenge 携带规范化邮箱字节，
/// session 携带 16 字节的用户标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// 邮箱所有权验证 token（短期）
    Challenge,
    /// 会话 token（长期）
    Session,
}

impl TokenKind {
    /// 该类别的签名字符
    pub fn signature(self) -> char {
        match self {
            TokenKind::Challenge => CHALLENGE_SIGNATURE,
            TokenKind::Session => SESSION_SIGNATURE,
        }
    }
}

/// 解码失败的分类
///
/// 调用方需要区分「格式错误」「已过期」「被篡改」三种情况，
/// 用 [`TokenFailure::into_error`] 映射到对应类别的公开错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFailure {
    /// 前缀、字段数、字段解码或过期时间解析失败
    Malformed,
    /// 过期时间早于当前时间
    Expired,
    /// MAC 校验失败
    Tampered,
}

impl TokenFailure {
    /// 映射为指定 token 类别的公开错误
    pub fn into_error(self, kind: TokenKind) -> Error {
        match (kind, self) {
            (TokenKind::Challenge, TokenFailure::Malformed) => Error::InvalidChallenge,
            (TokenKind::Challenge, TokenFailure::Expired) => Error::ExpiredChallenge,
            (TokenKind::Challenge, TokenFailure::Tampered) => Error::BrokenChallenge,
            (TokenKind::Session, TokenFailure::Malformed) => Error::InvalidSessionId,
            (TokenKind::Session, TokenFailure::Expired) => Error::ExpiredSessionId,
            (TokenKind::Session, TokenFailure::Tampered) => Error::BrokenSessionId,
        }
    }
}

/// 解码成功后取出的字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPayload {
    /// 每 token 独立的随机盐值
    pub salt: Vec<u8>,
    /// 类别相关的主体字节
    pub subject: Vec<u8>,
    /// 过期时间（Unix 秒）
    pub expires_at: i64,
}

/// 编码一个签名 token
///
/// # Arguments
///
/// * `kind` - token 类别
/// * `key` - 签名密钥
/// * `salt` - 随机盐值
/// * `subject` - 主体字节（challenge 为规范化邮箱，session 为用户标识）
/// * `expires_at` - 过期时间（Unix 秒）；session 配置为不过期时为 0
pub fn encode_token(
    kind: TokenKind,
    key: &KeyMaterial,
    salt: &[u8],
    subject: &[u8],
    expires_at: i64,
) -> String {
    let expiry = expires_at.to_string();
    let mac = key.mac(&[salt, subject, expiry.as_bytes()]);
    format!(
        "{}{}-{}-{}-{}",
        kind.signature(),
        encode_base32(salt),
        encode_base32(subject),
        expiry,
        encode_base32(&mac),
    )
}

/// 解码并校验一个签名 token
///
/// 按固定顺序执行：
///
/// 1. 检查类别签名字符
/// 2. 按 `-` 切分，要求恰好 4 个字段
/// 3. 解码盐值、主体、MAC 字段
/// 4. 解析过期时间为整数
/// 5. 过期时间早于当前时间则拒绝
/// 6. 重新计算 MAC 并做常量时间比较
///
/// MAC 重算使用过期时间字段在 token 中的原始 ASCII 字节。
///
/// # Errors
///
/// 步骤 1-4 失败返回 [`TokenFailure::Malformed`]，
/// 步骤 5 失败返回 [`TokenFailure::Expired`]，
/// 步骤 6 失败返回 [`TokenFailure::Tampered`]。
pub fn decode_token(
    kind: TokenKind,
    key: &KeyMaterial,
    token: &str,
) -> std::result::Result<TokenPayload, TokenFailure> {
    let body = token
        .strip_prefix(kind.signature())
        .ok_or(TokenFailure::Malformed)?;

    let parts: Vec<&str> = body.split('-').collect();
    if parts.len() != 4 {
        return Err(TokenFailure::Malformed);
    }

    let salt = decode_base32(parts[0]).ok_or(TokenFailure::Malformed)?;
    let subject = decode_base32(parts[1]).ok_or(TokenFailure::Malformed)?;
    let mac = decode_base32(parts[3]).ok_or(TokenFailure::Malformed)?;
    let expires_at: i64 = parts[2].parse().map_err(|_| TokenFailure::Malformed)?;

    if expires_at < Utc::now().timestamp() {
        return Err(TokenFailure::Expired);
    }

    if !key.verify_mac(&[&salt, &subject, parts[2].as_bytes()], &mac) {
        return Err(TokenFailure::Tampered);
    }

    Ok(TokenPayload {
        salt,
        subject,
        expires_at,
    })
}

/// base32 编码并去掉尾部补位字符
fn encode_base32(data: &[u8]) -> String {
    let encoded = base32_encode(B32, data);
    encoded.trim_end_matches('=').to_string()
}

/// 恢复补位后 base32 解码
///
/// 长度 mod 8 为 1、3、6 的串不可能由去掉补位的合法编码产生，直接拒绝；
/// 其余情况补 `=` 到下一个 8 字符边界（本来就对齐的串不补）。
fn decode_base32(text: &str) -> Option<Vec<u8>> {
    if matches!(text.len() % 8, 1 | 3 | 6) {
        return None;
    }
    let mut padded = String::with_capacity(text.len() + 7);
    padded.push_str(text);
    while padded.len() % 8 != 0 {
        padded.push('=');
    }
    base32_decode(B32, &padded)
}
