use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// The four headers every partner API request carries. Plain values, not a
/// reqwest type, so signing stays a pure function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub content_type: &'static str,
    /// `Basic <base64(partner_id:signature)>`
    pub authorization: String,
    /// Goes out as `X-Timestamp`.
    pub timestamp: i64,
    /// Goes out as `X-Shopid`.
    pub shop_id: String,
}

/// Sign one request. The canonical string is
/// `partner_id + timestamp + shop_id + path + body` (body empty for GETs),
/// authenticated with HMAC-SHA256 under the partner secret key and
/// base64-encoded.
///
/// Deterministic: identical inputs, including the timestamp, always produce
/// identical headers. The caller supplies the timestamp rather than this
/// function reading the clock, so tests can pin it.
pub fn sign(
    partner_id: &str,
    secret_key: &str,
    shop_id: &str,
    path: &str,
    timestamp: i64,
    body: &str,
) -> Result<SignedHeaders> {
    if partner_id.is_empty() {
        return Err(AppError::Config("partner id is empty".to_string()));
    }
    if secret_key.is_empty() {
        return Err(AppError::Config("partner secret key is empty".to_string()));
    }

    let canonical = format!("{partner_id}{timestamp}{shop_id}{path}{body}");

    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|e| AppError::Config(format!("unusable secret key: {e}")))?;
    mac.update(canonical.as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    let credentials = STANDARD.encode(format!("{partner_id}:{signature}"));

    Ok(SignedHeaders {
        content_type: "application/json",
        authorization: format!("Basic {credentials}"),
        timestamp,
        shop_id: shop_id.to_string(),
    })
}
