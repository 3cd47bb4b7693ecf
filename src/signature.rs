//! Webhook signature verification (`X-Hub-Signature-256`).

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Verifies `signature_header` against the HMAC-SHA256 of `payload` keyed with `secret`.
///
/// Expected header format: `sha256=<hex digest>`. Anything missing or malformed
/// is a failed verification, never an error.
pub fn verify_github_signature(
    secret: &[u8],
    payload: &[u8],
    signature_header: Option<&str>,
) -> bool {
    let Some(hex_digest) = signature_header.and_then(|h| h.trim().strip_prefix(SIGNATURE_PREFIX))
    else {
        return false;
    };

    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);

    // Constant-time comparison
    mac.verify_slice(&expected).is_ok()
}

/// Computes the header value a sender would attach to `payload`.
pub fn sign(secret: &[u8], payload: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload);
    Some(format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Holds the optional shared secret. Without one the verifier runs in open mode.
#[derive(Clone, Default)]
pub struct SignatureVerifier {
    secret: Option<Vec<u8>>,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("enforced", &self.is_enforced())
            .finish()
    }
}

impl SignatureVerifier {
    pub fn new(secret: Option<Vec<u8>>) -> Self {
        Self { secret }
    }

    pub fn open() -> Self {
        Self { secret: None }
    }

    pub fn is_enforced(&self) -> bool {
        self.secret.is_some()
    }

    /// Returns `true` when the request may proceed.
    ///
    /// In open mode every request is trusted and the header is ignored.
    pub fn verify(&self, payload: &[u8], signature_header: Option<&str>) -> bool {
        match &self.secret {
            Some(secret) => verify_github_signature(secret, payload, signature_header),
            None => true,
        }
    }
}
