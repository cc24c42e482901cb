//! QR check-in token signing and verification.
//!
//! A QR token is the lowercase hex HMAC-SHA256 of
//! `child_id ‖ facility_id ‖ secret`, keyed by the same server-held secret.
//! The generator side and this verifier must share the secret; with a
//! mismatched secret every check-in fails closed.

use std::sync::LazyLock;

use hmac::{Hmac, Mac};
use regex::Regex;
use sha2::Sha256;

use crate::types::EntityId;

/// Length of a hex-encoded HMAC-SHA256 digest.
pub const TOKEN_HEX_LENGTH: usize = 64;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{64}$").expect("valid regex"));

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// Token format
// ---------------------------------------------------------------------------

/// Trim a submitted token and check it is 64 lowercase hex characters.
///
/// Returns the trimmed token, or `None` if it is malformed.
pub fn normalize_token(raw: &str) -> Option<&str> {
    let token = raw.trim();
    TOKEN_RE.is_match(token).then_some(token)
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

fn keyed_mac(child_id: &str, facility_id: &str, secret: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(child_id.as_bytes());
    mac.update(facility_id.as_bytes());
    mac.update(secret.as_bytes());
    mac
}

/// Compute the QR token for a child at a facility.
pub fn sign(child_id: &str, facility_id: &str, secret: &str) -> String {
    hex::encode(keyed_mac(child_id, facility_id, secret).finalize().into_bytes())
}

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string; `None` on odd length or a non-hex digit.
    pub fn decode(hex: &str) -> Option<Vec<u8>> {
        if hex.len() % 2 != 0 {
            return None;
        }
        hex.as_bytes()
            .chunks(2)
            .map(|pair| {
                let pair = std::str::from_utf8(pair).ok()?;
                u8::from_str_radix(pair, 16).ok()
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Why a token failed verification.
///
/// Both variants render the same message so callers cannot leak which check
/// tripped; the distinction exists for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Invalid signature")]
    LengthMismatch,
    #[error("Invalid signature")]
    Mismatch,
}

/// Verify a submitted token against the expected signature.
///
/// Lengths are compared first and a mismatch is rejected before any byte
/// comparison. The digest comparison itself is `Mac::verify_slice`, which
/// runs in constant time.
pub fn verify(
    token: &str,
    child_id: &str,
    facility_id: &str,
    secret: &str,
) -> Result<(), SignatureError> {
    if token.len() != TOKEN_HEX_LENGTH {
        return Err(SignatureError::LengthMismatch);
    }
    let submitted = hex::decode(token).ok_or(SignatureError::Mismatch)?;
    keyed_mac(child_id, facility_id, secret)
        .verify_slice(&submitted)
        .map_err(|_| SignatureError::Mismatch)
}

// ---------------------------------------------------------------------------
// Facility binding
// ---------------------------------------------------------------------------

/// Outcome of reconciling a caller-supplied facility id with the child's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacilityBinding {
    /// Verify the signature against this facility.
    Verified { facility_id: EntityId },
    /// The caller named a facility the child does not belong to.
    Mismatched {
        supplied: EntityId,
        actual: EntityId,
    },
}

impl FacilityBinding {
    /// With no supplied facility the child's own facility is used.
    pub fn resolve(supplied: Option<EntityId>, actual: EntityId) -> Self {
        match supplied {
            Some(supplied) if supplied != actual => Self::Mismatched { supplied, actual },
            _ => Self::Verified {
                facility_id: actual,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-qr-secret";
    const CHILD: &str = "7d0f2a52-5a0c-4c39-9f0e-0b7f3e4e2b11";
    const FACILITY: &str = "0b3a7f6e-8a61-4f43-9d3c-6a6f3f1c2d9e";

    #[test]
    fn signature_is_64_lowercase_hex() {
        let token = sign(CHILD, FACILITY, SECRET);
        assert_eq!(token.len(), TOKEN_HEX_LENGTH);
        assert!(normalize_token(&token).is_some());
    }

    #[test]
    fn signature_depends_on_every_input() {
        let base = sign(CHILD, FACILITY, SECRET);
        assert_ne!(base, sign(FACILITY, CHILD, SECRET));
        assert_ne!(base, sign(CHILD, FACILITY, "other-secret"));
        assert_eq!(base, sign(CHILD, FACILITY, SECRET));
    }

    #[test]
    fn valid_token_verifies() {
        let token = sign(CHILD, FACILITY, SECRET);
        assert_eq!(verify(&token, CHILD, FACILITY, SECRET), Ok(()));
    }

    #[test]
    fn any_single_flipped_character_fails() {
        let token = sign(CHILD, FACILITY, SECRET);
        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'0' { b'1' } else { b'0' };
            let forged = String::from_utf8(bytes).unwrap();
            assert_eq!(
                verify(&forged, CHILD, FACILITY, SECRET),
                Err(SignatureError::Mismatch),
                "flipping position {i} must fail"
            );
        }
    }

    #[test]
    fn wrong_length_fails_before_comparison() {
        let token = sign(CHILD, FACILITY, SECRET);
        assert_eq!(
            verify(&token[..63], CHILD, FACILITY, SECRET),
            Err(SignatureError::LengthMismatch)
        );
        assert_eq!(
            verify(&format!("{token}0"), CHILD, FACILITY, SECRET),
            Err(SignatureError::LengthMismatch)
        );
    }

    #[test]
    fn failures_render_identically() {
        assert_eq!(
            SignatureError::LengthMismatch.to_string(),
            SignatureError::Mismatch.to_string()
        );
    }

    #[test]
    fn normalize_trims_and_rejects_malformed() {
        let token = sign(CHILD, FACILITY, SECRET);
        assert_eq!(normalize_token(&format!("  {token}\n")), Some(token.as_str()));
        assert!(normalize_token(&token.to_uppercase()).is_none());
        assert!(normalize_token(&token[..10]).is_none());
        assert!(normalize_token(&format!("{}zz", &token[..62])).is_none());
        assert!(normalize_token("").is_none());
    }

    #[test]
    fn non_hex_token_of_right_length_fails() {
        let token = sign(CHILD, FACILITY, SECRET);
        let forged = format!("{}zz", &token[..62]);
        assert_eq!(
            verify(&forged, CHILD, FACILITY, SECRET),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn hex_round_trips_digest_bytes() {
        let token = sign(CHILD, FACILITY, SECRET);
        let bytes = hex::decode(&token).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(hex::encode(&bytes), token);
        assert!(hex::decode("abc").is_none());
    }

    #[test]
    fn facility_binding_variants() {
        let a = uuid::Uuid::new_v4();
        let b = uuid::Uuid::new_v4();
        assert_eq!(
            FacilityBinding::resolve(None, a),
            FacilityBinding::Verified { facility_id: a }
        );
        assert_eq!(
            FacilityBinding::resolve(Some(a), a),
            FacilityBinding::Verified { facility_id: a }
        );
        assert_eq!(
            FacilityBinding::resolve(Some(b), a),
            FacilityBinding::Mismatched {
                supplied: b,
                actual: a
            }
        );
    }
}
