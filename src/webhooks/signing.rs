//! HMAC-SHA256 payload signing.
//!
//! Subscribers verify `X-Webhook-Signature: sha256=<hex>` by recomputing the
//! HMAC over the raw request body with their shared secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const EVENT_HEADER: &str = "x-webhook-event";
pub const WEBHOOK_ID_HEADER: &str = "x-webhook-id";
pub const DELIVERY_ID_HEADER: &str = "x-webhook-delivery";

const SCHEME_PREFIX: &str = "sha256=";

fn mac_for(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length")
}

/// Hex-encoded HMAC-SHA256 of `payload`.
pub fn sign(secret: &str, payload: &[u8]) -> String {
    let mut mac = mac_for(secret);
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Value for the signature header.
pub fn signature_header_value(secret: &str, payload: &[u8]) -> String {
    format!("{}{}", SCHEME_PREFIX, sign(secret, payload))
}

/// Check a signature header against `payload`. Comparison is constant time.
pub fn verify_signature(secret: &str, payload: &[u8], header_value: &str) -> bool {
    let hex_sig = header_value
        .strip_prefix(SCHEME_PREFIX)
        .unwrap_or(header_value);
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let mut mac = mac_for(secret);
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}
