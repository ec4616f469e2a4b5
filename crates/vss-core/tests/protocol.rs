//! End-to-end protocol tests: full rounds between a dealer and a set of
//! verifiers, with complaints, justifications, timeouts, replay attempts,
//! and secret recovery.

use k256::{ProjectivePoint, Scalar};
use rand::{SeedableRng, rngs::StdRng};
use vss_core::{
    Dealer, Error, Justification, Response, STATUS_APPROVAL, STATUS_COMPLAINT, Verifier, envelope,
    minimum_t, recover_secret, schnorr, session, suite,
};

struct Round {
    rng: StdRng,
    dealer_secret: Scalar,
    dealer_public: ProjectivePoint,
    verifier_secrets: Vec<Scalar>,
    verifier_publics: Vec<ProjectivePoint>,
    secret: Scalar,
    dealer: Dealer,
    verifiers: Vec<Verifier>,
}

fn setup(seed: u64, n: usize, t: u32) -> Round {
    let mut rng = StdRng::seed_from_u64(seed);
    let dealer_secret = suite::random_scalar(&mut rng);
    let dealer_public = suite::public_key(&dealer_secret);
    let verifier_secrets: Vec<Scalar> = (0..n).map(|_| suite::random_scalar(&mut rng)).collect();
    let verifier_publics: Vec<ProjectivePoint> =
        verifier_secrets.iter().map(suite::public_key).collect();
    let secret = suite::random_scalar(&mut rng);

    let dealer = Dealer::new(&mut rng, dealer_secret, secret, &verifier_publics, t).unwrap();
    let verifiers: Vec<Verifier> = verifier_secrets
        .iter()
        .map(|longterm| Verifier::new(*longterm, dealer_public, &verifier_publics).unwrap())
        .collect();

    Round {
        rng,
        dealer_secret,
        dealer_public,
        verifier_secrets,
        verifier_publics,
        secret,
        dealer,
        verifiers,
    }
}

/// Deliver a response to the dealer and every verifier except its issuer,
/// collecting any justification the dealer emits.
fn broadcast(round: &mut Round, response: &Response) -> Option<Justification> {
    for verifier in &mut round.verifiers {
        if verifier.index() != response.index {
            verifier.process_response(response).unwrap();
        }
    }
    round
        .dealer
        .process_response(&mut round.rng, response)
        .unwrap()
}

#[test]
fn test_all_honest_round_certifies() {
    let mut round = setup(100, 7, 4);

    let envelopes = round.dealer.encrypted_deals(&mut round.rng).unwrap();
    assert_eq!(envelopes.len(), 7);

    let responses: Vec<Response> = (0..7)
        .map(|i| {
            round.verifiers[i]
                .process_encrypted_deal(&mut round.rng, &envelopes[i])
                .unwrap()
        })
        .collect();

    for response in &responses {
        assert_eq!(response.status, STATUS_APPROVAL);
        assert!(broadcast(&mut round, response).is_none());
    }

    assert!(round.dealer.enough_approvals());
    assert!(round.dealer.deal_certified());
    assert_eq!(
        round.dealer.secret_commit(),
        Some(ProjectivePoint::GENERATOR * round.secret)
    );

    for verifier in &round.verifiers {
        assert!(verifier.enough_approvals());
        assert!(verifier.deal_certified());
        assert!(verifier.deal().is_some());
    }
}

#[test]
fn test_forced_complaint_is_justified_and_upgraded() {
    let mut round = setup(101, 7, 4);
    let envelopes = round.dealer.encrypted_deals(&mut round.rng).unwrap();

    // Everyone processes their own deal; verifier 2 validates it too, but
    // broadcasts a complaint instead of its approval.
    let mut responses = Vec::new();
    for i in 0..7 {
        let response = round.verifiers[i]
            .process_encrypted_deal(&mut round.rng, &envelopes[i])
            .unwrap();
        if i != 2 {
            responses.push(response);
        }
    }

    // Verifier 2 complains against a valid deal.
    let mut complaint = Response {
        session_id: round.dealer.session_id().to_vec(),
        index: 2,
        status: STATUS_COMPLAINT,
        signature: Vec::new(),
    };
    complaint.signature = schnorr::sign(
        &mut round.rng,
        &round.verifier_secrets[2],
        &complaint.hash(),
    );

    for response in &responses {
        assert!(broadcast(&mut round, response).is_none());
    }
    let justification = broadcast(&mut round, &complaint).expect("complaint must be answered");
    assert_eq!(justification.index, 2);

    for i in [0usize, 1, 3, 4, 5, 6] {
        round.verifiers[i]
            .process_justification(&justification)
            .unwrap();
        assert_eq!(round.verifiers[i].responses()[&2].status, STATUS_APPROVAL);
    }

    assert!(round.dealer.deal_certified());
    assert!(round.verifiers[0].deal_certified());
    assert!(round.dealer.secret_commit().is_some());
}

#[test]
fn test_silent_minority_finalized_by_timeout() {
    let mut round = setup(102, 5, 3);
    let envelopes = round.dealer.encrypted_deals(&mut round.rng).unwrap();

    // Verifiers 3 and 4 never respond.
    let responses: Vec<Response> = (0..3)
        .map(|i| {
            round.verifiers[i]
                .process_encrypted_deal(&mut round.rng, &envelopes[i])
                .unwrap()
        })
        .collect();

    for response in &responses {
        for i in 0..3 {
            if round.verifiers[i].index() != response.index {
                round.verifiers[i].process_response(response).unwrap();
            }
        }
        round
            .dealer
            .process_response(&mut round.rng, response)
            .unwrap();
    }

    // Two verdicts are still missing.
    assert!(round.dealer.enough_approvals());
    assert!(!round.dealer.deal_certified());

    round.dealer.set_timeout();
    for i in 0..3 {
        round.verifiers[i].set_timeout();
    }

    // 3 approvals >= t, 2 synthetic complaints <= t, nobody absent.
    assert!(round.dealer.deal_certified());
    for i in 0..3 {
        assert!(round.verifiers[i].deal_certified());
        assert_eq!(round.verifiers[i].responses()[&3].status, STATUS_COMPLAINT);
        assert_eq!(round.verifiers[i].responses()[&4].status, STATUS_COMPLAINT);
    }
}

#[test]
fn test_dealer_rejects_degenerate_thresholds() {
    let mut rng = StdRng::seed_from_u64(103);
    let longterm = suite::random_scalar(&mut rng);
    let secret = suite::random_scalar(&mut rng);
    let publics: Vec<ProjectivePoint> = (0..5)
        .map(|_| suite::public_key(&suite::random_scalar(&mut rng)))
        .collect();

    assert_eq!(
        Dealer::new(&mut rng, longterm, secret, &publics, 1).err(),
        Some(Error::InvalidThreshold { t: 1, n: 5 })
    );
    assert_eq!(
        Dealer::new(&mut rng, longterm, secret, &publics, 6).err(),
        Some(Error::InvalidThreshold { t: 6, n: 5 })
    );
}

#[test]
fn test_cross_session_response_rejected() {
    let mut round_a = setup(104, 5, 3);
    let mut round_b = setup(105, 5, 3);

    let envelopes_a = round_a.dealer.encrypted_deals(&mut round_a.rng).unwrap();
    let response_a = round_a.verifiers[0]
        .process_encrypted_deal(&mut round_a.rng, &envelopes_a[0])
        .unwrap();

    // A response signed under session A is replayed into session B.
    assert_eq!(
        round_b
            .dealer
            .process_response(&mut round_b.rng, &response_a)
            .err(),
        Some(Error::MismatchedSession)
    );
}

#[test]
fn test_tampered_deal_complaint_then_public_justification() {
    let mut round = setup(106, 7, 4);
    let envelopes = round.dealer.encrypted_deals(&mut round.rng).unwrap();

    // The dealer ships verifier 3 a share that does not match the
    // commitments, sealed and signed like a genuine envelope.
    let mut tampered = round.dealer.plaintext_deal(3).unwrap().clone();
    tampered.share.value += Scalar::ONE;
    let context = session::hkdf_context(&round.dealer_public, &round.verifier_publics);
    let forged = envelope::seal_deal(
        &mut round.rng,
        &round.dealer_secret,
        &round.verifier_publics[3],
        &context,
        &tampered,
    )
    .unwrap();

    let mut responses = Vec::new();
    for i in [0usize, 1, 2, 4, 5, 6] {
        responses.push(
            round.verifiers[i]
                .process_encrypted_deal(&mut round.rng, &envelopes[i])
                .unwrap(),
        );
    }
    let complaint = round.verifiers[3]
        .process_encrypted_deal(&mut round.rng, &forged)
        .unwrap();
    assert_eq!(complaint.status, STATUS_COMPLAINT);

    for response in &responses {
        assert!(broadcast(&mut round, response).is_none());
    }
    // The dealer answers with the *original* deal, which verifies publicly.
    let justification = broadcast(&mut round, &complaint).expect("complaint must be answered");

    for verifier in &mut round.verifiers {
        verifier.process_justification(&justification).unwrap();
    }

    // Certification tracks what was justified publicly, even though
    // verifier 3 privately holds a share that does not verify.
    assert!(round.dealer.deal_certified());
    assert!(round.verifiers[0].deal_certified());

    // The honest majority can still reconstruct the secret without slot 3.
    let deals: Vec<_> = [0usize, 1, 2, 4]
        .iter()
        .map(|&i| round.dealer.plaintext_deal(i as u32).unwrap().clone())
        .collect();
    assert_eq!(recover_secret(&deals, 4).unwrap(), round.secret);
}

#[test]
fn test_session_id_deterministic_across_dealers() {
    // Identical randomness and inputs must produce byte-identical sessions.
    let round_a = setup(107, 5, 3);
    let round_b = setup(107, 5, 3);
    assert_eq!(round_a.dealer.session_id(), round_b.dealer.session_id());

    let round_c = setup(108, 5, 3);
    assert_ne!(round_a.dealer.session_id(), round_c.dealer.session_id());
}

#[test]
fn test_response_signature_binds_every_field() {
    let mut round = setup(109, 5, 3);
    let envelopes = round.dealer.encrypted_deals(&mut round.rng).unwrap();
    let response = round.verifiers[0]
        .process_encrypted_deal(&mut round.rng, &envelopes[0])
        .unwrap();

    let public = &round.verifier_publics[0];
    assert!(schnorr::verify(public, &response.hash(), &response.signature).is_ok());

    let mut forged = response.clone();
    forged.status = STATUS_COMPLAINT;
    assert!(schnorr::verify(public, &forged.hash(), &forged.signature).is_err());

    let mut forged = response.clone();
    forged.index = 1;
    assert!(schnorr::verify(public, &forged.hash(), &forged.signature).is_err());

    let mut forged = response.clone();
    forged.session_id[0] ^= 0x01;
    assert!(schnorr::verify(public, &forged.hash(), &forged.signature).is_err());
}

#[test]
fn test_second_response_from_same_index_rejected() {
    let mut round = setup(110, 5, 3);
    let envelopes = round.dealer.encrypted_deals(&mut round.rng).unwrap();

    let response_0 = round.verifiers[0]
        .process_encrypted_deal(&mut round.rng, &envelopes[0])
        .unwrap();
    let _response_1 = round.verifiers[1]
        .process_encrypted_deal(&mut round.rng, &envelopes[1])
        .unwrap();

    round.verifiers[1].process_response(&response_0).unwrap();
    assert_eq!(
        round.verifiers[1].process_response(&response_0),
        Err(Error::DuplicateResponse(0))
    );
}

#[test]
fn test_reconstruction_threshold_is_sharp() {
    let round = setup(111, 7, 4);

    let deals: Vec<_> = (0..4)
        .map(|i| round.dealer.plaintext_deal(i).unwrap().clone())
        .collect();
    assert_eq!(recover_secret(&deals, 4).unwrap(), round.secret);

    assert_eq!(
        recover_secret(&deals[..3], 4),
        Err(Error::InsufficientShares {
            required: 4,
            actual: 3
        })
    );
}

#[test]
fn test_bad_justification_latches_bad_dealer() {
    let mut round = setup(112, 5, 3);
    let envelopes = round.dealer.encrypted_deals(&mut round.rng).unwrap();

    let mut responses = Vec::new();
    for i in 0..5 {
        let response = round.verifiers[i]
            .process_encrypted_deal(&mut round.rng, &envelopes[i])
            .unwrap();
        if i != 2 {
            responses.push(response);
        }
    }
    // Verifier 2 complains against a valid deal.
    let mut complaint = Response {
        session_id: round.dealer.session_id().to_vec(),
        index: 2,
        status: STATUS_COMPLAINT,
        signature: Vec::new(),
    };
    complaint.signature = schnorr::sign(
        &mut round.rng,
        &round.verifier_secrets[2],
        &complaint.hash(),
    );

    for response in &responses {
        assert!(broadcast(&mut round, response).is_none());
    }
    broadcast(&mut round, &complaint);

    // A corrupted justification reaches verifier 0: its deal does not match
    // the commitments.
    let mut bad_deal = round.dealer.plaintext_deal(2).unwrap().clone();
    bad_deal.share.value += Scalar::ONE;
    let justification = Justification {
        session_id: round.dealer.session_id().to_vec(),
        index: 2,
        deal: bad_deal,
        signature: Vec::new(),
    };

    assert_eq!(
        round.verifiers[0].process_justification(&justification),
        Err(Error::ShareCommitmentMismatch)
    );

    // Four approvals and one complaint would certify, but the latch holds.
    assert!(round.verifiers[0].enough_approvals());
    assert!(!round.verifiers[0].deal_certified());
    assert!(round.verifiers[0].deal().is_none());
}

#[test]
fn test_honest_rounds_across_parameter_range() {
    for (seed, n, t) in [(120, 3, 2), (121, 4, 3), (122, 8, 4), (123, 13, 7)] {
        let mut round = setup(seed, n, t);
        let envelopes = round.dealer.encrypted_deals(&mut round.rng).unwrap();

        let responses: Vec<Response> = (0..n)
            .map(|i| {
                round.verifiers[i]
                    .process_encrypted_deal(&mut round.rng, &envelopes[i])
                    .unwrap()
            })
            .collect();
        for response in &responses {
            assert!(broadcast(&mut round, response).is_none());
        }

        assert!(round.dealer.deal_certified(), "n={} t={}", n, t);

        let deals: Vec<_> = round
            .verifiers
            .iter()
            .take(t as usize)
            .map(|verifier| verifier.deal().unwrap().clone())
            .collect();
        assert_eq!(recover_secret(&deals, t).unwrap(), round.secret);
    }
}

#[test]
fn test_minimum_t_round_with_unsafe_dkg_path() {
    let n = 4;
    let t = minimum_t(n) as u32;
    let mut round = setup(113, n, t);
    let envelopes = round.dealer.encrypted_deals(&mut round.rng).unwrap();

    round.verifiers[0]
        .process_encrypted_deal(&mut round.rng, &envelopes[0])
        .unwrap();

    // A DKG layer that authenticated the remaining verdicts out-of-band can
    // record them without signatures.
    for index in 1..n as u32 {
        round.verifiers[0]
            .unsafe_set_response_dkg(index, STATUS_APPROVAL)
            .unwrap();
    }
    assert!(round.verifiers[0].deal_certified());
    assert_eq!(
        round.verifiers[0]
            .unsafe_set_response_dkg(1, STATUS_APPROVAL)
            .err(),
        Some(Error::DuplicateResponse(1))
    );
}
