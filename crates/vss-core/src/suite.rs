//! Cryptographic suite for the protocol: the secp256k1 group, SHA-256, and
//! canonical marshalling of group elements.
//!
//! Every byte string that enters a hash, a signature, or the wire is produced
//! by the helpers in this module, so all participants agree bit-for-bit on
//! encodings. Equality checks that feed protocol decisions go through the
//! constant-time helpers rather than `PartialEq`.

use crate::{Error, Result};
use k256::{
    AffinePoint, EncodedPoint, ProjectivePoint, Scalar,
    elliptic_curve::{
        Field, PrimeField,
        bigint::U256,
        ops::Reduce,
        sec1::{FromEncodedPoint, ToEncodedPoint},
    },
};
use rand::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;

/// Length of a compressed SEC1 point encoding
pub const POINT_LEN: usize = 33;

/// Length of a canonical scalar encoding
pub const SCALAR_LEN: usize = 32;

/// Draw a uniformly random scalar
pub fn random_scalar<R: CryptoRng + RngCore>(rng: &mut R) -> Scalar {
    Scalar::random(rng)
}

/// Public key for a long-term or ephemeral secret scalar
pub fn public_key(private: &Scalar) -> ProjectivePoint {
    ProjectivePoint::GENERATOR * *private
}

/// Canonical compressed encoding of a point
pub fn point_to_bytes(point: &ProjectivePoint) -> Vec<u8> {
    point.to_affine().to_encoded_point(true).as_bytes().to_vec()
}

/// Decode a point from its SEC1 encoding
pub fn point_from_bytes(bytes: &[u8]) -> Result<ProjectivePoint> {
    let encoded = EncodedPoint::from_bytes(bytes).map_err(|_| Error::MalformedPoint)?;
    let affine: AffinePoint = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or(Error::MalformedPoint)?;
    Ok(ProjectivePoint::from(affine))
}

/// Canonical big-endian encoding of a scalar
pub fn scalar_to_bytes(scalar: &Scalar) -> [u8; SCALAR_LEN] {
    scalar.to_bytes().into()
}

/// Decode a scalar, rejecting non-canonical encodings
pub fn scalar_from_bytes(bytes: &[u8]) -> Result<Scalar> {
    let array: [u8; SCALAR_LEN] = bytes.try_into().map_err(|_| Error::MalformedScalar)?;
    Option::<Scalar>::from(Scalar::from_repr(array.into())).ok_or(Error::MalformedScalar)
}

/// Map a 32-byte digest onto a scalar by modular reduction
pub fn hash_to_scalar(digest: [u8; 32]) -> Scalar {
    <Scalar as Reduce<U256>>::reduce_bytes(&digest.into())
}

/// Constant-time byte equality; unequal lengths compare as unequal
pub fn bytes_ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// Constant-time point equality over canonical encodings
pub fn points_ct_eq(a: &ProjectivePoint, b: &ProjectivePoint) -> bool {
    bytes_ct_eq(&point_to_bytes(a), &point_to_bytes(b))
}

/// Serde adapter for a single scalar
pub mod scalar_serde {
    use super::{Scalar, scalar_from_bytes, scalar_to_bytes};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(scalar: &Scalar, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&scalar_to_bytes(scalar))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Scalar, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        scalar_from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for a single point
pub mod point_serde {
    use super::{ProjectivePoint, point_from_bytes, point_to_bytes};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(point: &ProjectivePoint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&point_to_bytes(point))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<ProjectivePoint, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        point_from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for a vector of points
pub mod point_vec_serde {
    use super::{ProjectivePoint, point_from_bytes, point_to_bytes};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(points: &[ProjectivePoint], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(points.iter().map(|p| point_to_bytes(p)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<ProjectivePoint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Vec<Vec<u8>> = Vec::deserialize(deserializer)?;
        raw.iter()
            .map(|bytes| point_from_bytes(bytes).map_err(serde::de::Error::custom))
            .collect()
    }
}
