//! Schnorr signatures over the suite group.
//!
//! Classic key-prefixed Schnorr: the challenge binds the nonce commitment,
//! the signer's public key, and the message. Signatures are the concatenation
//! of the compressed nonce point and the response scalar.

use crate::{Error, Result, suite};
use k256::{ProjectivePoint, Scalar};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

/// Length of a serialized signature: compressed point followed by a scalar
pub const SIGNATURE_LEN: usize = suite::POINT_LEN + suite::SCALAR_LEN;

fn challenge(nonce_point: &[u8], public: &[u8], msg: &[u8]) -> Scalar {
    let mut hasher = Sha256::new();
    hasher.update(nonce_point);
    hasher.update(public);
    hasher.update(msg);
    suite::hash_to_scalar(hasher.finalize().into())
}

/// Sign `msg` with the given private scalar.
///
/// Draws a fresh nonce `k`, commits to it as `R = g^k`, derives the challenge
/// `e = H(R || pub || msg)`, and responds with `s = k + e * x`.
pub fn sign<R: CryptoRng + RngCore>(rng: &mut R, private: &Scalar, msg: &[u8]) -> Vec<u8> {
    let k = suite::random_scalar(rng);
    let nonce_point = suite::point_to_bytes(&(ProjectivePoint::GENERATOR * k));
    let public = suite::point_to_bytes(&suite::public_key(private));

    let e = challenge(&nonce_point, &public, msg);
    let s = k + e * *private;

    let mut signature = nonce_point;
    signature.extend_from_slice(&suite::scalar_to_bytes(&s));
    signature
}

/// Verify a signature over `msg` against the signer's public key.
///
/// Checks `g^s == R + pub^e` for the challenge recomputed from the signature's
/// nonce commitment. All parse failures surface as `BadSignature` so callers
/// cannot distinguish malformed from forged input.
pub fn verify(public: &ProjectivePoint, msg: &[u8], signature: &[u8]) -> Result<()> {
    if signature.len() != SIGNATURE_LEN {
        return Err(Error::BadSignature);
    }
    let (nonce_bytes, s_bytes) = signature.split_at(suite::POINT_LEN);
    let nonce_point = suite::point_from_bytes(nonce_bytes).map_err(|_| Error::BadSignature)?;
    let s = suite::scalar_from_bytes(s_bytes).map_err(|_| Error::BadSignature)?;

    let public_bytes = suite::point_to_bytes(public);
    let e = challenge(nonce_bytes, &public_bytes, msg);

    let lhs = ProjectivePoint::GENERATOR * s;
    let rhs = nonce_point + *public * e;
    if suite::points_ct_eq(&lhs, &rhs) {
        Ok(())
    } else {
        Err(Error::BadSignature)
    }
}
