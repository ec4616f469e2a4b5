//! Sealed deal envelopes.
//!
//! A deal travels to its verifier encrypted under a key only the two of them
//! can derive: the dealer signs a fresh ephemeral DH key with its long-term
//! key, combines the ephemeral secret with the recipient's public key, and
//! feeds the shared point through HKDF into a ChaCha20-Poly1305 key. The
//! nonce is all-zero: every envelope key is derived from a fresh ephemeral
//! secret, so no key is ever used twice. The HKDF context doubles as AEAD
//! associated data, binding the ciphertext to the dealer/verifier-set pair.

use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use hkdf::Hkdf;
use k256::{ProjectivePoint, Scalar};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::messages::{Deal, EncryptedDeal, NONCE_LEN};
use crate::{Error, Result, schnorr, suite};

const KEY_LEN: usize = 32;

fn derive_key(shared: &ProjectivePoint, context: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let ikm = suite::point_to_bytes(shared);
    let hk = Hkdf::<Sha256>::new(None, &ikm);
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    hk.expand(context, &mut key[..])
        .map_err(|_| Error::AeadFailure)?;
    Ok(key)
}

/// Seal a deal for `recipient`, signing the ephemeral key with the dealer's
/// long-term secret.
pub fn seal_deal<R: CryptoRng + RngCore>(
    rng: &mut R,
    longterm: &Scalar,
    recipient: &ProjectivePoint,
    context: &[u8],
    deal: &Deal,
) -> Result<EncryptedDeal> {
    let ephemeral = suite::random_scalar(rng);
    let dh_key = suite::point_to_bytes(&suite::public_key(&ephemeral));
    let signature = schnorr::sign(rng, longterm, &dh_key);

    let shared = *recipient * ephemeral;
    let key = derive_key(&shared, context)?;

    let nonce = [0u8; NONCE_LEN];
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]))
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: &deal.to_bytes(),
                aad: context,
            },
        )
        .map_err(|_| Error::AeadFailure)?;

    Ok(EncryptedDeal {
        dh_key,
        signature,
        nonce,
        cipher,
    })
}

/// Open an envelope addressed to the holder of `longterm`.
///
/// The dealer's signature over the ephemeral key is checked first; nothing
/// else is attempted on an envelope that fails it.
pub fn open_deal(
    envelope: &EncryptedDeal,
    longterm: &Scalar,
    dealer: &ProjectivePoint,
    context: &[u8],
) -> Result<Deal> {
    schnorr::verify(dealer, &envelope.dh_key, &envelope.signature)?;

    let dh_point = suite::point_from_bytes(&envelope.dh_key)?;
    let shared = dh_point * *longterm;
    let key = derive_key(&shared, context)?;

    let plaintext = ChaCha20Poly1305::new(Key::from_slice(&key[..]))
        .decrypt(
            Nonce::from_slice(&envelope.nonce),
            Payload {
                msg: &envelope.cipher,
                aad: context,
            },
        )
        .map_err(|_| Error::AeadFailure)?;

    Deal::from_bytes(&plaintext)
}
