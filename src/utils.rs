use hex::decode as hex_decode;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the HMAC of a push request body.
pub const SIGNATURE_HEADER: &str = "X-Notifier-Signature-256";

/// Helper function for verifying a push request signature
pub fn verify_signature(secret: &str, payload: &[u8], signature_header: &str) -> bool {
    // Expected format: "sha256=..."
    let Some(signature) = signature_header.strip_prefix("sha256=") else {
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);

    match hex_decode(signature) {
        // Constant-time comparison
        Ok(signature_bytes) => mac.verify_slice(&signature_bytes).is_ok(),
        Err(_) => {
            error!("Signature is not valid hex");
            false
        }
    }
}

/// Pub/Sub resource name from a CloudEvents `ce-source` value, e.g.
/// `//pubsub.googleapis.com/projects/p/topics/t` becomes `projects/p/topics/t`.
pub fn resource_from_ce_source(source: &str) -> &str {
    source
        .strip_prefix("//pubsub.googleapis.com/")
        .unwrap_or(source)
}
