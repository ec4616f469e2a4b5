//! # vss-core
//!
//! Pedersen-style non-interactive verifiable secret sharing over secp256k1.
//!
//! A *dealer* splits a secret scalar into `n` shares such that any
//! `t` of them reconstruct it, and publishes commitments that let every
//! *verifier* check the share it received without learning anything about the
//! others. Misbehavior is publicly attributable: a verifier that receives a
//! bad share broadcasts a signed complaint, and the dealer must answer with a
//! justification that every participant re-verifies.
//!
//! ## Protocol flow
//!
//! 1. The dealer seals one [`messages::EncryptedDeal`] per verifier.
//! 2. Each verifier opens its envelope and broadcasts a signed
//!    [`messages::Response`] — approval or complaint — to all participants.
//! 3. The dealer answers complaints with a [`messages::Justification`]
//!    carrying the disputed deal in the clear.
//! 4. Every participant feeds responses and justifications into its
//!    aggregator until `deal_certified()` decides the run, or the host calls
//!    `set_timeout()` to finalize it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use vss_core::{Dealer, Verifier, minimum_t, suite};
//!
//! let t = minimum_t(public_keys.len()) as u32;
//! let mut dealer = Dealer::new(&mut rng, longterm, secret, &public_keys, t)?;
//! let envelopes = dealer.encrypted_deals(&mut rng)?;
//!
//! // Each verifier processes its envelope and broadcasts the response.
//! let response = verifier.process_encrypted_deal(&mut rng, &envelopes[i])?;
//!
//! // Everyone collects all responses; complaints trigger justifications.
//! if let Some(justification) = dealer.process_response(&mut rng, &response)? {
//!     verifier.process_justification(&justification)?;
//! }
//!
//! assert!(dealer.deal_certified());
//! ```
//!
//! ## Scope
//!
//! The crate is transport-agnostic and single-threaded per session: the host
//! delivers messages in any order it likes, one session at a time per
//! `Dealer`/`Verifier` instance. There is no retry, timing, or persistence
//! logic here.

pub mod aggregator;
pub mod dealer;
pub mod envelope;
pub mod error;
pub mod messages;
pub mod poly;
pub mod schnorr;
pub mod session;
pub mod suite;
pub mod verifier;

pub use aggregator::Aggregator;
pub use dealer::Dealer;
pub use error::{Error, Result};
pub use messages::{
    Deal, EncryptedDeal, Justification, Response, STATUS_APPROVAL, STATUS_COMPLAINT,
};
pub use poly::{SecretPolynomial, SecretShare};
pub use verifier::{Verifier, recover_secret};

/// The smallest reconstruction threshold for which the scheme's security
/// assumptions hold, `⌊(n + 1) / 2⌋`.
///
/// Lower thresholds are accepted by [`Dealer::new`] down to 2, but break the
/// security argument; higher thresholds only make reconstruction harder.
pub fn minimum_t(n: usize) -> usize {
    (n + 1) / 2
}
