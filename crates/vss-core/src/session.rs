//! Deterministic session binding.
//!
//! A session ID fingerprints a protocol run: the dealer's key, the agreed
//! verifier set, the commitment vector, and the threshold. Every message in a
//! run carries it, so responses and justifications cannot be replayed across
//! runs. The HKDF context ties the envelope key derivation to the same
//! dealer/verifier-set pair and doubles as AEAD associated data.

use k256::ProjectivePoint;
use sha2::{Digest, Sha256};

use crate::suite;

/// Derive the session ID for a protocol run.
///
/// `Sha256(dealer || verifiers[0..n] || commitments[0..t] || t_le32)` over
/// canonical point encodings. Pure function of its inputs: all participants
/// derive the same ID, and any reordering of the inputs changes it.
pub fn session_id(
    dealer: &ProjectivePoint,
    verifiers: &[ProjectivePoint],
    commitments: &[ProjectivePoint],
    threshold: u32,
) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(suite::point_to_bytes(dealer));
    for verifier in verifiers {
        hasher.update(suite::point_to_bytes(verifier));
    }
    for commitment in commitments {
        hasher.update(suite::point_to_bytes(commitment));
    }
    hasher.update(threshold.to_le_bytes());
    hasher.finalize().to_vec()
}

/// Key-derivation context for deal envelopes: the dealer's key followed by
/// the full verifier set, in canonical encoding.
pub fn hkdf_context(dealer: &ProjectivePoint, verifiers: &[ProjectivePoint]) -> Vec<u8> {
    let mut context = suite::point_to_bytes(dealer);
    for verifier in verifiers {
        context.extend_from_slice(&suite::point_to_bytes(verifier));
    }
    context
}
