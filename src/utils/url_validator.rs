//! 原始 URL 校验
//!
//! 缩短前对调用方传入的 URL 做最小化清洗：去掉首尾空白，拒绝空串、
//! 非 http(s) 协议和无法解析的地址。

use url::Url;

use crate::errors::{Result, ShortenerError};

/// 直接拒绝的协议
const DANGEROUS_PROTOCOLS: &[&str] = &["javascript:", "data:", "file:", "vbscript:", "blob:"];

/// 校验并返回去掉首尾空白的 URL
///
/// 去重以返回值为键，因此 `" https://a.com "` 与 `"https://a.com"` 视为同一地址。
pub fn normalize_url(raw: &str) -> Result<String> {
    let url = raw.trim();

    if url.is_empty() {
        return Err(ShortenerError::validation("URL cannot be empty"));
    }

    let lower = url.to_lowercase();

    if let Some(proto) = DANGEROUS_PROTOCOLS.iter().find(|p| lower.starts_with(*p)) {
        return Err(ShortenerError::validation(format!(
            "Dangerous protocol blocked: {}",
            proto
        )));
    }

    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return Err(ShortenerError::validation(
            "URL must start with http:// or https://",
        ));
    }

    Url::parse(url)
        .map_err(|e| ShortenerError::validation(format!("Invalid URL format: {}", e)))?;

    Ok(url.to_string())
}
