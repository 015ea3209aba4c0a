//! 短链接 ID 生成
//!
//! 8 位、62 字符字母表，随机源为操作系统 CSPRNG。随机源失败时返回
//! [`ShortenerError::Entropy`]，绝不退化为弱随机或空 ID。

use crate::errors::Result;

/// 短 ID 长度
pub const SHORT_ID_LENGTH: usize = 8;

/// 字母表：小写、大写、数字
pub const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 拒绝采样上界：248 = 62 * 4，保证每个字符等概率
const ACCEPT_BELOW: u8 = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

/// 生成一个新的短 ID
///
/// 不做去重，碰撞由存储层的唯一性约束兜底。
pub fn generate_short_id() -> Result<String> {
    generate_with(getrandom::getrandom)
}

/// 使用给定随机源生成短 ID
pub(crate) fn generate_with<F>(mut fill: F) -> Result<String>
where
    F: FnMut(&mut [u8]) -> std::result::Result<(), getrandom::Error>,
{
    let mut id = String::with_capacity(SHORT_ID_LENGTH);
    let mut buf = [0u8; SHORT_ID_LENGTH * 2];

    while id.len() < SHORT_ID_LENGTH {
        fill(&mut buf)?;
        for &byte in buf.iter() {
            if byte < ACCEPT_BELOW {
                id.push(ALPHABET[(byte % ALPHABET.len() as u8) as usize] as char);
                if id.len() == SHORT_ID_LENGTH {
                    break;
                }
            }
        }
    }

    Ok(id)
}

/// 判断字符串是否形如生成器产出的短 ID
pub fn is_valid_short_id(id: &str) -> bool {
    id.len() == SHORT_ID_LENGTH && id.bytes().all(|b| b.is_ascii_alphanumeric())
}
