//! Response aggregation and deal certification.
//!
//! Both roles embed an [`Aggregator`]: the dealer constructs one already
//! bound to its own session, a verifier starts from an empty one and binds
//! it to the first deal it validates. The aggregator owns the response
//! table (at most one response per verifier index), processes
//! justifications, and decides the [`Aggregator::deal_certified`] predicate.

use std::collections::BTreeMap;

use k256::ProjectivePoint;
use tracing::{debug, warn};

use crate::messages::{Deal, Justification, Response, STATUS_APPROVAL, STATUS_COMPLAINT};
use crate::poly::eval_commitments;
use crate::{Error, Result, schnorr, suite};

/// A threshold is valid when at least two shares are needed and every
/// verifier can hold one.
pub(crate) fn valid_t(t: u32, n: usize) -> bool {
    t >= 2 && t as usize <= n
}

/// Collects responses and justifications for one protocol run
#[derive(Debug, Clone)]
pub struct Aggregator {
    verifiers: Vec<ProjectivePoint>,
    commitments: Vec<ProjectivePoint>,
    responses: BTreeMap<u32, Response>,
    session_id: Option<Vec<u8>>,
    deal: Option<Deal>,
    threshold: Option<u32>,
    bad_dealer: bool,
}

impl Aggregator {
    /// Aggregator for the dealer side, bound to the session at construction
    pub(crate) fn new(
        verifiers: Vec<ProjectivePoint>,
        commitments: Vec<ProjectivePoint>,
        threshold: u32,
        session_id: Vec<u8>,
    ) -> Self {
        Self {
            verifiers,
            commitments,
            responses: BTreeMap::new(),
            session_id: Some(session_id),
            deal: None,
            threshold: Some(threshold),
            bad_dealer: false,
        }
    }

    /// Aggregator for the verifier side; binds to the first deal it sees
    pub(crate) fn empty(verifiers: Vec<ProjectivePoint>) -> Self {
        Self {
            verifiers,
            commitments: Vec::new(),
            responses: BTreeMap::new(),
            session_id: None,
            deal: None,
            threshold: None,
            bad_dealer: false,
        }
    }

    /// Validate a deal against this run, binding the run to it if none is
    /// bound yet.
    ///
    /// With `inclusion` set, a second deal is refused with
    /// [`Error::AlreadyProcessed`] — callers use that to distinguish replay
    /// from an invalid deal. Re-verification of a justification's deal passes
    /// `inclusion = false`.
    pub fn verify_deal(&mut self, deal: &Deal, inclusion: bool) -> Result<()> {
        if self.deal.is_some() && inclusion {
            return Err(Error::AlreadyProcessed);
        }
        if self.deal.is_none() {
            debug!(
                session_id = %hex::encode(&deal.session_id),
                threshold = deal.threshold,
                "binding aggregator to deal"
            );
            self.commitments = deal.commitments.clone();
            self.session_id = Some(deal.session_id.clone());
            // A threshold pinned via set_threshold is not overwritten; the
            // deal must agree with it instead.
            if self.threshold.is_none() {
                self.threshold = Some(deal.threshold);
            }
            self.deal = Some(deal.clone());
        }

        if !valid_t(deal.threshold, self.verifiers.len()) {
            return Err(Error::InvalidThreshold {
                t: deal.threshold,
                n: self.verifiers.len(),
            });
        }
        if let Some(threshold) = self.threshold {
            if deal.threshold != threshold {
                return Err(Error::IncompatibleThreshold {
                    expected: threshold,
                    got: deal.threshold,
                });
            }
        }
        if let Some(session_id) = &self.session_id {
            if !suite::bytes_ct_eq(session_id, &deal.session_id) {
                return Err(Error::MismatchedSession);
            }
        }

        let share = &deal.share;
        if share.index as usize >= self.verifiers.len() {
            return Err(Error::IndexOutOfBounds(share.index));
        }

        let share_image = ProjectivePoint::GENERATOR * share.value;
        let committed = eval_commitments(&deal.commitments, share.index);
        if !suite::points_ct_eq(&share_image, &committed) {
            return Err(Error::ShareCommitmentMismatch);
        }
        Ok(())
    }

    /// Validate and store a response.
    ///
    /// Public so that layers above the two roles (e.g. a DKG) can feed
    /// responses straight into the aggregator.
    pub fn process_response(&mut self, response: &Response) -> Result<()> {
        self.verify_response(response)
    }

    pub(crate) fn verify_response(&mut self, response: &Response) -> Result<()> {
        if let Some(session_id) = &self.session_id {
            if !suite::bytes_ct_eq(session_id, &response.session_id) {
                return Err(Error::MismatchedSession);
            }
        }

        let public = self
            .verifiers
            .get(response.index as usize)
            .ok_or(Error::IndexOutOfBounds(response.index))?;
        schnorr::verify(public, &response.hash(), &response.signature)?;

        self.add_response(response.clone())
    }

    /// Process a justification for a stored complaint.
    ///
    /// The embedded deal is re-verified against this run; success upgrades
    /// the complaint to an approval, failure latches the dealer as bad.
    pub(crate) fn verify_justification(&mut self, justification: &Justification) -> Result<()> {
        if justification.index as usize >= self.verifiers.len() {
            return Err(Error::IndexOutOfBounds(justification.index));
        }
        match self.responses.get(&justification.index) {
            None => {
                return Err(Error::NoComplaintForJustification(justification.index));
            }
            Some(response) if response.status == STATUS_APPROVAL => {
                return Err(Error::JustificationForApproval(justification.index));
            }
            Some(_) => {}
        }

        if let Err(err) = self.verify_deal(&justification.deal, false) {
            warn!(
                index = justification.index,
                error = %err,
                "justification carries an invalid deal, flagging dealer"
            );
            self.bad_dealer = true;
            return Err(err);
        }

        if let Some(response) = self.responses.get_mut(&justification.index) {
            response.status = STATUS_APPROVAL;
        }
        debug!(index = justification.index, "complaint upgraded to approval");
        Ok(())
    }

    pub(crate) fn add_response(&mut self, response: Response) -> Result<()> {
        if response.index as usize >= self.verifiers.len() {
            return Err(Error::IndexOutOfBounds(response.index));
        }
        if self.responses.contains_key(&response.index) {
            return Err(Error::DuplicateResponse(response.index));
        }
        self.responses.insert(response.index, response);
        Ok(())
    }

    /// Synthesize an unsigned complaint for every verifier that has not
    /// responded. Called on timeout to finalize the round; the synthetic
    /// responses never enter signature-checked paths.
    pub(crate) fn clean_verifiers(&mut self) {
        let session_id = self.session_id.clone().unwrap_or_default();
        for index in 0..self.verifiers.len() as u32 {
            if !self.responses.contains_key(&index) {
                debug!(index, "no response before timeout, recording complaint");
                self.responses.insert(
                    index,
                    Response {
                        session_id: session_id.clone(),
                        index,
                        status: STATUS_COMPLAINT,
                        signature: Vec::new(),
                    },
                );
            }
        }
    }

    /// Pin the expected threshold before any deal arrives.
    ///
    /// Lets a verifier that knows the threshold out-of-band cross-check the
    /// dealer; without it, the first deal's threshold is taken as truth.
    pub fn set_threshold(&mut self, threshold: u32) {
        self.threshold = Some(threshold);
    }

    /// True once at least `t` approvals are stored
    pub fn enough_approvals(&self) -> bool {
        let approvals = self
            .responses
            .values()
            .filter(|response| response.status == STATUS_APPROVAL)
            .count();
        match self.threshold {
            Some(threshold) => approvals >= threshold as usize,
            None => false,
        }
    }

    /// The certification predicate: enough approvals, a verdict from every
    /// verifier, no more than `t` complaints, and no detected dealer fault.
    pub fn deal_certified(&self) -> bool {
        let mut absent = 0usize;
        let mut complaints = 0usize;
        for index in 0..self.verifiers.len() as u32 {
            match self.responses.get(&index) {
                None => absent += 1,
                Some(response) if response.status == STATUS_COMPLAINT => complaints += 1,
                Some(_) => {}
            }
        }

        let threshold = match self.threshold {
            Some(threshold) => threshold as usize,
            None => return false,
        };
        let faulted = absent > 0 || self.bad_dealer || complaints > threshold;
        self.enough_approvals() && !faulted
    }

    /// All responses stored so far, keyed by verifier index
    pub fn responses(&self) -> &BTreeMap<u32, Response> {
        &self.responses
    }

    /// True once a justification failed re-verification
    pub fn bad_dealer(&self) -> bool {
        self.bad_dealer
    }

    pub(crate) fn session_id(&self) -> Option<&[u8]> {
        self.session_id.as_deref()
    }

    pub(crate) fn deal(&self) -> Option<&Deal> {
        self.deal.as_ref()
    }

    pub(crate) fn commitments(&self) -> &[ProjectivePoint] {
        &self.commitments
    }
}
