//! The verifier role.
//!
//! A verifier opens the envelope addressed to it, checks its share against
//! the dealer's public commitments, and broadcasts a signed approval or
//! complaint. It then collects everyone else's responses and the dealer's
//! justifications in its own [`Aggregator`] until the deal is certified or
//! the host times the round out.

use k256::{ProjectivePoint, Scalar};
use rand::{CryptoRng, RngCore};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::aggregator::Aggregator;
use crate::messages::{
    Deal, EncryptedDeal, Justification, Response, STATUS_APPROVAL, STATUS_COMPLAINT,
};
use crate::poly::{SecretShare, recover_secret as recover_shares};
use crate::{Error, Result, envelope, schnorr, session, suite};

/// Receives a deal, validates it, and tracks the run toward certification
pub struct Verifier {
    longterm: Scalar,
    public_key: ProjectivePoint,
    dealer: ProjectivePoint,
    index: u32,
    verifiers: Vec<ProjectivePoint>,
    hkdf_context: Vec<u8>,
    aggregator: Aggregator,
}

impl Verifier {
    /// Set up a verifier from its long-term key, the dealer's public key,
    /// and the agreed verifier set.
    ///
    /// The set must contain this verifier's own public key; its position
    /// becomes the verifier's index for the whole run.
    pub fn new(
        longterm: Scalar,
        dealer: ProjectivePoint,
        verifiers: &[ProjectivePoint],
    ) -> Result<Self> {
        let public_key = suite::public_key(&longterm);
        let index = verifiers
            .iter()
            .position(|candidate| suite::points_ct_eq(candidate, &public_key))
            .ok_or(Error::NotInVerifierSet)? as u32;

        Ok(Self {
            longterm,
            public_key,
            dealer,
            index,
            verifiers: verifiers.to_vec(),
            hkdf_context: session::hkdf_context(&dealer, verifiers),
            aggregator: Aggregator::empty(verifiers.to_vec()),
        })
    }

    /// Open and validate the dealer's envelope, and produce the response to
    /// broadcast.
    ///
    /// A deal that decrypts and verifies yields a signed approval; a deal
    /// that decrypts but fails validation yields a signed complaint. An
    /// envelope that cannot be opened, a deal addressed to another index, or
    /// a replayed deal yields an error and no response.
    pub fn process_encrypted_deal<R: CryptoRng + RngCore>(
        &mut self,
        rng: &mut R,
        encrypted: &EncryptedDeal,
    ) -> Result<Response> {
        let deal = self.decrypt_deal(encrypted)?;
        if deal.share.index != self.index {
            return Err(Error::WrongIndex {
                expected: self.index,
                got: deal.share.index,
            });
        }

        // Recomputed from the deal's own commitments; a dealer that lies
        // about any session input produces a mismatch inside verify_deal.
        let session_id = session::session_id(
            &self.dealer,
            &self.verifiers,
            &deal.commitments,
            deal.threshold,
        );

        let status = match self.aggregator.verify_deal(&deal, true) {
            Ok(()) => STATUS_APPROVAL,
            Err(Error::AlreadyProcessed) => return Err(Error::AlreadyProcessed),
            Err(err) => {
                warn!(index = self.index, error = %err, "deal invalid, complaining");
                STATUS_COMPLAINT
            }
        };

        let mut response = Response {
            session_id,
            index: self.index,
            status,
            signature: Vec::new(),
        };
        response.signature = schnorr::sign(rng, &self.longterm, &response.hash());

        self.aggregator.add_response(response.clone())?;
        debug!(index = self.index, approval = status, "response issued");
        Ok(response)
    }

    fn decrypt_deal(&self, encrypted: &EncryptedDeal) -> Result<Deal> {
        envelope::open_deal(encrypted, &self.longterm, &self.dealer, &self.hkdf_context)
    }

    /// Record another verifier's response.
    ///
    /// Refused until this verifier has processed its own deal, since
    /// responses can only be checked against a bound session.
    pub fn process_response(&mut self, response: &Response) -> Result<()> {
        if self.aggregator.deal().is_none() {
            return Err(Error::NoDealBeforeResponse);
        }
        self.aggregator.verify_response(response)
    }

    /// Process a dealer justification for a recorded complaint
    pub fn process_justification(&mut self, justification: &Justification) -> Result<()> {
        self.aggregator.verify_justification(justification)
    }

    /// The deal this verifier holds, once the run certified it.
    ///
    /// `None` before certification, so an uncertified share cannot leak into
    /// reconstruction by accident.
    pub fn deal(&self) -> Option<&Deal> {
        if !self.enough_approvals() || !self.deal_certified() {
            return None;
        }
        self.aggregator.deal()
    }

    /// Commitments of the bound deal, if one was received
    pub fn commitments(&self) -> Option<&[ProjectivePoint]> {
        self.aggregator.deal().map(|deal| &deal.commitments[..])
    }

    /// This verifier's long-term key pair
    pub fn key(&self) -> (&Scalar, &ProjectivePoint) {
        (&self.longterm, &self.public_key)
    }

    /// This verifier's index in the agreed verifier set
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Session ID bound by the received deal, if any
    pub fn session_id(&self) -> Option<&[u8]> {
        self.aggregator.session_id()
    }

    /// Finalize the round after a timeout: every verifier that has not
    /// responded is recorded as complaining.
    pub fn set_timeout(&mut self) {
        self.aggregator.clean_verifiers();
    }

    /// Pin the expected threshold before the deal arrives
    pub fn set_threshold(&mut self, threshold: u32) {
        self.aggregator.set_threshold(threshold);
    }

    /// True once at least `t` approvals are recorded
    pub fn enough_approvals(&self) -> bool {
        self.aggregator.enough_approvals()
    }

    /// True once the deal is certified (see [`Aggregator::deal_certified`])
    pub fn deal_certified(&self) -> bool {
        self.aggregator.deal_certified()
    }

    /// Responses recorded so far, keyed by verifier index
    pub fn responses(&self) -> &BTreeMap<u32, Response> {
        self.aggregator.responses()
    }

    /// Record a response without checking its signature.
    ///
    /// UNSAFE escape hatch for DKG layers that authenticate responses
    /// through their own channel. Everything reachable from the default
    /// surface verifies signatures; callers of this method take over that
    /// responsibility entirely.
    pub fn unsafe_set_response_dkg(&mut self, index: u32, approval: bool) -> Result<()> {
        let response = Response {
            session_id: self.aggregator.session_id().unwrap_or_default().to_vec(),
            index,
            status: approval,
            signature: Vec::new(),
        };
        self.aggregator.add_response(response)
    }
}

/// Recover the dealer's secret from at least `threshold` certified deals.
///
/// All deals must come from the same session; mixing sessions is an error
/// rather than a garbage result.
pub fn recover_secret(deals: &[Deal], threshold: u32) -> Result<Scalar> {
    if deals.is_empty() {
        return Err(Error::InsufficientShares {
            required: threshold as usize,
            actual: 0,
        });
    }
    let shares: Vec<SecretShare> = deals
        .iter()
        .map(|deal| {
            if suite::bytes_ct_eq(&deal.session_id, &deals[0].session_id) {
                Ok(deal.share.clone())
            } else {
                Err(Error::MismatchedSession)
            }
        })
        .collect::<Result<_>>()?;
    recover_shares(&shares, threshold)
}
