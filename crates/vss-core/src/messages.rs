//! Protocol messages.
//!
//! Four records cross the wire: the `Deal` a dealer addresses to one
//! verifier, its sealed form `EncryptedDeal`, the `Response` every verifier
//! broadcasts, and the `Justification` a dealer publishes to answer a
//! complaint. All derive serde for host transport; the deal additionally has
//! a canonical length-tagged binary encoding, which is what gets sealed into
//! envelopes and hashed into justifications, so it must be byte-identical
//! across implementations.

use crate::poly::SecretShare;
use crate::{Error, Result, suite};
use k256::ProjectivePoint;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Response status issued against a deal found invalid
pub const STATUS_COMPLAINT: bool = false;
/// Response status issued for a deal that verified
pub const STATUS_APPROVAL: bool = true;

/// AEAD nonce length used by deal envelopes
pub const NONCE_LEN: usize = 12;

/// The verifiable share package a dealer addresses to a single verifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    /// Session this deal belongs to
    pub session_id: Vec<u8>,
    /// The recipient's private share of the secret polynomial
    pub share: SecretShare,
    /// Number of shares required to reconstruct the secret
    pub threshold: u32,
    /// Public commitments to the secret polynomial coefficients
    #[serde(with = "crate::suite::point_vec_serde")]
    pub commitments: Vec<ProjectivePoint>,
}

impl Deal {
    /// Canonical binary encoding: every variable-length field is tagged with
    /// a little-endian u32 length, integers are little-endian.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            self.session_id.len() + suite::SCALAR_LEN + self.commitments.len() * suite::POINT_LEN + 32,
        );
        put_tagged(&mut out, &self.session_id);
        out.extend_from_slice(&self.share.index.to_le_bytes());
        out.extend_from_slice(&suite::scalar_to_bytes(&self.share.value));
        out.extend_from_slice(&self.threshold.to_le_bytes());
        out.extend_from_slice(&(self.commitments.len() as u32).to_le_bytes());
        for commitment in &self.commitments {
            put_tagged(&mut out, &suite::point_to_bytes(commitment));
        }
        out
    }

    /// Decode a deal from its canonical encoding
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);

        let session_id = reader.tagged()?.to_vec();
        let index = reader.u32_le()?;
        let value = suite::scalar_from_bytes(reader.take(suite::SCALAR_LEN)?)?;
        let threshold = reader.u32_le()?;

        let count = reader.u32_le()?;
        let mut commitments = Vec::new();
        for _ in 0..count {
            commitments.push(suite::point_from_bytes(reader.tagged()?)?);
        }
        reader.finish()?;

        Ok(Self {
            session_id,
            share: SecretShare { index, value },
            threshold,
            commitments,
        })
    }
}

/// A deal sealed for its recipient.
///
/// Only the addressed verifier can open it; everyone can check it came from
/// the dealer via the signature over the ephemeral key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedDeal {
    /// Ephemeral Diffie-Hellman public key, canonical encoding
    pub dh_key: Vec<u8>,
    /// Dealer's signature over `dh_key`
    pub signature: Vec<u8>,
    /// AEAD nonce; all-zero, since every envelope key is fresh
    pub nonce: [u8; NONCE_LEN],
    /// AEAD ciphertext of the deal's canonical encoding
    pub cipher: Vec<u8>,
}

/// A verifier's broadcast verdict on the deal it received
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Session this response belongs to
    pub session_id: Vec<u8>,
    /// Index of the issuing verifier
    pub index: u32,
    /// `STATUS_APPROVAL` or `STATUS_COMPLAINT`
    pub status: bool,
    /// Issuer's signature over [`Response::hash`]
    pub signature: Vec<u8>,
}

impl Response {
    /// Canonical hash covered by the response signature:
    /// `Sha256("response" || session_id || index_le32 || status_byte)`
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"response");
        hasher.update(&self.session_id);
        hasher.update(self.index.to_le_bytes());
        hasher.update([u8::from(self.status)]);
        hasher.finalize().into()
    }
}

/// The dealer's public answer to a complaint: the disputed deal in the clear
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Justification {
    /// Session this justification belongs to
    pub session_id: Vec<u8>,
    /// Index of the complaining verifier
    pub index: u32,
    /// The deal originally addressed to that verifier
    pub deal: Deal,
    /// Dealer's signature over [`Justification::hash`]
    pub signature: Vec<u8>,
}

impl Justification {
    /// Canonical hash covered by the justification signature:
    /// `Sha256("justification" || session_id || index_le32 || deal_bytes)`
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"justification");
        hasher.update(&self.session_id);
        hasher.update(self.index.to_le_bytes());
        hasher.update(self.deal.to_bytes());
        hasher.finalize().into()
    }
}

fn put_tagged(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(bytes);
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| Error::Deserialization("truncated deal encoding".into()))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32_le(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn tagged(&mut self) -> Result<&'a [u8]> {
        let len = self.u32_le()? as usize;
        self.take(len)
    }

    fn finish(&self) -> Result<()> {
        if self.pos == self.buf.len() {
            Ok(())
        } else {
            Err(Error::Deserialization("trailing bytes in deal encoding".into()))
        }
    }
}
