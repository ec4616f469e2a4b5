//! Error types for the VSS protocol

use thiserror::Error;

/// Result type alias for VSS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the VSS protocol
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    // ============ Configuration Errors ============
    /// Threshold outside the valid `[2, n]` range
    #[error("invalid threshold {t} for {n} verifiers")]
    InvalidThreshold { t: u32, n: usize },

    /// Own public key missing from the verifier set
    #[error("public key not found in the verifier set")]
    NotInVerifierSet,

    // ============ Input Errors ============
    /// No verifier exists at the requested index
    #[error("no verifier at index {0}")]
    InvalidIndex(u32),

    /// Message carries a verifier index outside the agreed set
    #[error("verifier index {0} out of bounds")]
    IndexOutOfBounds(u32),

    /// Deal addressed to a different verifier
    #[error("deal addressed to index {got}, expected {expected}")]
    WrongIndex { expected: u32, got: u32 },

    /// Session ID differs from the one bound to this run
    #[error("session ID does not match this protocol run")]
    MismatchedSession,

    /// Threshold differs from the one bound to this run
    #[error("incompatible threshold: expected {expected}, got {got}")]
    IncompatibleThreshold { expected: u32, got: u32 },

    /// A response was already recorded for this verifier index
    #[error("duplicate response from verifier index {0}")]
    DuplicateResponse(u32),

    // ============ Cryptographic Errors ============
    /// Schnorr signature verification failed
    #[error("signature verification failed")]
    BadSignature,

    /// Authenticated decryption of an encrypted deal failed
    #[error("authenticated decryption failed")]
    AeadFailure,

    /// Bytes do not decode to a valid group point
    #[error("malformed group point")]
    MalformedPoint,

    /// Bytes do not decode to a canonical scalar
    #[error("malformed scalar")]
    MalformedScalar,

    /// Secret share does not match the public commitment polynomial
    #[error("share does not verify against the deal commitments")]
    ShareCommitmentMismatch,

    // ============ Protocol Errors ============
    /// A deal was already bound for this session
    #[error("a deal was already processed for this session")]
    AlreadyProcessed,

    /// Responses cannot be processed before a deal is bound
    #[error("cannot process a response before receiving a deal")]
    NoDealBeforeResponse,

    /// Justification received without a stored complaint
    #[error("no complaint recorded for justification at index {0}")]
    NoComplaintForJustification(u32),

    /// Justification received for an approved slot
    #[error("justification received for an approval at index {0}")]
    JustificationForApproval(u32),

    // ============ Recovery Errors ============
    /// Not enough distinct shares to interpolate the secret
    #[error("not enough shares to recover the secret: required {required}, got {actual}")]
    InsufficientShares { required: usize, actual: usize },

    // ============ Wire Errors ============
    /// Wire decoding failed
    #[error("deserialization error: {0}")]
    Deserialization(String),
}
