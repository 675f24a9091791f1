//! Webhook signature checks.
//!
//! Razorpay signs the raw body with HMAC-SHA256 and sends the hex digest in
//! `X-Razorpay-Signature`. Cashfree signs `timestamp + body` and sends the
//! base64 digest in `x-webhook-signature`.

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::error::{PaymentError, PaymentResult};

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &str) -> PaymentResult<HmacSha256> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| PaymentError::InvalidSignature)
}

/// Hex HMAC-SHA256 of `body`, as Razorpay computes it.
pub fn razorpay_signature(secret: &str, body: &[u8]) -> PaymentResult<String> {
    let mut mac = mac(secret)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn verify_razorpay_signature(secret: &str, body: &[u8], signature: &str) -> PaymentResult<()> {
    let expected = hex::decode(signature.trim()).map_err(|_| PaymentError::InvalidSignature)?;
    let mut mac = mac(secret)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| PaymentError::InvalidSignature)
}

/// Base64 HMAC-SHA256 of `timestamp + body`, as Cashfree computes it.
pub fn cashfree_signature(secret: &str, timestamp: &str, body: &[u8]) -> PaymentResult<String> {
    let mut mac = mac(secret)?;
    mac.update(timestamp.as_bytes());
    mac.update(body);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

pub fn verify_cashfree_signature(
    secret: &str,
    timestamp: &str,
    body: &[u8],
    signature: &str,
) -> PaymentResult<()> {
    let expected = STANDARD
        .decode(signature.trim())
        .map_err(|_| PaymentError::InvalidSignature)?;
    let mut mac = mac(secret)?;
    mac.update(timestamp.as_bytes());
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| PaymentError::InvalidSignature)
}
