//! The dealer role.
//!
//! A dealer samples the secret polynomial, publishes commitments to its
//! coefficients, seals one deal per verifier, and answers complaints with
//! public justifications. It runs its own [`Aggregator`] over the responses
//! it receives, so it can decide certification like any verifier.

use k256::{ProjectivePoint, Scalar};
use rand::{CryptoRng, RngCore};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::aggregator::{Aggregator, valid_t};
use crate::messages::{Deal, EncryptedDeal, Justification, Response, STATUS_APPROVAL};
use crate::poly::SecretPolynomial;
use crate::{Error, Result, envelope, schnorr, session, suite};

/// Distributes shares of a secret and answers complaints about them
pub struct Dealer {
    longterm: Scalar,
    public_key: ProjectivePoint,
    secret: Scalar,
    secret_poly: SecretPolynomial,
    commitments: Vec<ProjectivePoint>,
    verifiers: Vec<ProjectivePoint>,
    hkdf_context: Vec<u8>,
    threshold: u32,
    session_id: Vec<u8>,
    deals: Vec<Deal>,
    aggregator: Aggregator,
}

impl Dealer {
    /// Set up a dealer sharing `secret` among `verifiers` with reconstruction
    /// threshold `threshold`.
    ///
    /// Thresholds below [`crate::minimum_t`] are accepted but break the
    /// scheme's security assumptions; thresholds outside `[2, n]` are
    /// refused.
    pub fn new<R: CryptoRng + RngCore>(
        rng: &mut R,
        longterm: Scalar,
        secret: Scalar,
        verifiers: &[ProjectivePoint],
        threshold: u32,
    ) -> Result<Self> {
        if !valid_t(threshold, verifiers.len()) {
            return Err(Error::InvalidThreshold {
                t: threshold,
                n: verifiers.len(),
            });
        }

        let secret_poly = SecretPolynomial::new(rng, threshold, &secret);
        let public_key = suite::public_key(&longterm);
        let commitments = secret_poly.commitment();
        let session_id = session::session_id(&public_key, verifiers, &commitments, threshold);

        let deals: Vec<Deal> = (0..verifiers.len() as u32)
            .map(|index| Deal {
                session_id: session_id.clone(),
                share: secret_poly.eval(index),
                threshold,
                commitments: commitments.clone(),
            })
            .collect();

        let aggregator = Aggregator::new(
            verifiers.to_vec(),
            commitments.clone(),
            threshold,
            session_id.clone(),
        );

        info!(
            session_id = %hex::encode(&session_id),
            verifiers = verifiers.len(),
            threshold,
            "dealer initialized"
        );

        Ok(Self {
            longterm,
            public_key,
            secret,
            secret_poly,
            commitments,
            verifiers: verifiers.to_vec(),
            hkdf_context: session::hkdf_context(&public_key, verifiers),
            threshold,
            session_id,
            deals,
            aggregator,
        })
    }

    /// The cleartext deal destined for verifier `index`.
    ///
    /// For tests and layers that establish confidentiality elsewhere; the
    /// transport form is [`Dealer::encrypted_deal`].
    pub fn plaintext_deal(&self, index: u32) -> Result<&Deal> {
        self.deals
            .get(index as usize)
            .ok_or(Error::InvalidIndex(index))
    }

    /// Seal the deal for verifier `index` under a fresh ephemeral key
    pub fn encrypted_deal<R: CryptoRng + RngCore>(
        &self,
        rng: &mut R,
        index: u32,
    ) -> Result<EncryptedDeal> {
        let recipient = self
            .verifiers
            .get(index as usize)
            .ok_or(Error::InvalidIndex(index))?;
        envelope::seal_deal(
            rng,
            &self.longterm,
            recipient,
            &self.hkdf_context,
            &self.deals[index as usize],
        )
    }

    /// Seal one deal per verifier, in verifier order
    pub fn encrypted_deals<R: CryptoRng + RngCore>(&self, rng: &mut R) -> Result<Vec<EncryptedDeal>> {
        (0..self.verifiers.len() as u32)
            .map(|index| self.encrypted_deal(rng, index))
            .collect()
    }

    /// Process a verifier's response.
    ///
    /// An approval is recorded and needs no reply. A valid complaint is
    /// recorded and answered with a [`Justification`] that must be broadcast
    /// to every participant. Invalid responses are dropped with an error.
    pub fn process_response<R: CryptoRng + RngCore>(
        &mut self,
        rng: &mut R,
        response: &Response,
    ) -> Result<Option<Justification>> {
        self.aggregator.verify_response(response)?;

        if response.status == STATUS_APPROVAL {
            debug!(index = response.index, "approval recorded");
            return Ok(None);
        }

        info!(index = response.index, "complaint received, publishing justification");
        let mut justification = Justification {
            session_id: self.session_id.clone(),
            // The index was bounds-checked by response verification.
            index: response.index,
            deal: self.deals[response.index as usize].clone(),
            signature: Vec::new(),
        };
        justification.signature = schnorr::sign(rng, &self.longterm, &justification.hash());
        Ok(Some(justification))
    }

    /// Public commitment `g^secret` to the shared secret.
    ///
    /// Only available once the deal is certified; `None` before that.
    pub fn secret_commit(&self) -> Option<ProjectivePoint> {
        if !self.enough_approvals() || !self.deal_certified() {
            return None;
        }
        Some(ProjectivePoint::GENERATOR * self.secret)
    }

    /// Commitments to the secret polynomial coefficients
    pub fn commitments(&self) -> &[ProjectivePoint] {
        &self.commitments
    }

    /// The dealer's long-term key pair
    pub fn key(&self) -> (&Scalar, &ProjectivePoint) {
        (&self.longterm, &self.public_key)
    }

    /// Session ID of this protocol run
    pub fn session_id(&self) -> &[u8] {
        &self.session_id
    }

    /// The secret polynomial behind the deals.
    ///
    /// Needed by share-refresh layers. This is secret material: it MUST NOT
    /// leave the dealer's trust boundary.
    pub fn secret_polynomial(&self) -> &SecretPolynomial {
        &self.secret_poly
    }

    /// Finalize the round after a timeout: every verifier that has not
    /// responded is recorded as complaining.
    pub fn set_timeout(&mut self) {
        self.aggregator.clean_verifiers();
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
}
