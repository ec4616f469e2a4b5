//! VSS CLI
//!
//! Command-line tool that simulates a full verifiable secret sharing round
//! in a single process: one dealer, `n` verifiers, responses crossed between
//! all participants, optional silent verifiers finalized by timeout, and a
//! recovery check against the dealt secret.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use k256::{ProjectivePoint, Scalar};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;
use vss_core::{Dealer, Response, Verifier, minimum_t, recover_secret, suite};

#[derive(Parser)]
#[command(name = "vss")]
#[command(about = "Verifiable secret sharing round simulator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full dealer/verifier round locally
    Simulate {
        /// Number of verifiers
        #[arg(short = 'n', long, default_value_t = 7)]
        verifiers: usize,

        /// Reconstruction threshold (defaults to the minimum safe value)
        #[arg(short, long)]
        threshold: Option<u32>,

        /// Number of verifiers that never respond (finalized by timeout)
        #[arg(long, default_value_t = 0)]
        silent: usize,

        /// Seed for deterministic runs
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Print the minimum safe threshold for a verifier count
    MinimumT {
        /// Number of verifiers
        #[arg(short = 'n', long)]
        verifiers: usize,
    },
}

fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            verifiers,
            threshold,
            silent,
            seed,
        } => simulate(verifiers, threshold, silent, seed),
        Commands::MinimumT { verifiers } => {
            println!("minimum threshold for {} verifiers: {}", verifiers, minimum_t(verifiers));
            Ok(())
        }
    }
}

fn simulate(n: usize, threshold: Option<u32>, silent: usize, seed: Option<u64>) -> Result<()> {
    if silent >= n {
        bail!("at least one verifier must respond (silent {} >= n {})", silent, n);
    }

    let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = StdRng::seed_from_u64(seed);
    let threshold = threshold.unwrap_or(minimum_t(n) as u32);
    info!(n, threshold, seed, "starting simulated round");

    // Long-term keys for everyone, and the secret to share.
    let dealer_secret = suite::random_scalar(&mut rng);
    let dealer_public = suite::public_key(&dealer_secret);
    let verifier_secrets: Vec<Scalar> = (0..n).map(|_| suite::random_scalar(&mut rng)).collect();
    let verifier_publics: Vec<ProjectivePoint> =
        verifier_secrets.iter().map(suite::public_key).collect();
    let secret = suite::random_scalar(&mut rng);

    let mut dealer = Dealer::new(&mut rng, dealer_secret, secret, &verifier_publics, threshold)?;
    let mut verifiers: Vec<Verifier> = verifier_secrets
        .iter()
        .map(|longterm| Verifier::new(*longterm, dealer_public, &verifier_publics))
        .collect::<vss_core::Result<_>>()?;
    info!(session_id = %hex::encode(dealer.session_id()), "session derived");

    // Deal distribution: the first `n - silent` verifiers answer.
    let envelopes = dealer.encrypted_deals(&mut rng)?;
    let active = n - silent;
    let mut responses: Vec<Response> = Vec::with_capacity(active);
    for (index, envelope) in envelopes.iter().enumerate().take(active) {
        let response = verifiers[index].process_encrypted_deal(&mut rng, envelope)?;
        info!(index, approval = response.status, "verifier responded");
        responses.push(response);
    }

    // Response broadcast to every active verifier and the dealer; a
    // complaint makes the dealer publish a justification for everyone.
    for response in &responses {
        for verifier in verifiers.iter_mut().take(active) {
            if verifier.index() != response.index {
                verifier.process_response(response)?;
            }
        }
        if let Some(justification) = dealer.process_response(&mut rng, response)? {
            info!(index = justification.index, "dealer justified a complaint");
            for verifier in verifiers.iter_mut().take(active) {
                if verifier.index() != justification.index {
                    verifier.process_justification(&justification)?;
                }
            }
        }
    }

    if silent > 0 {
        warn!(silent, "finalizing round by timeout");
        dealer.set_timeout();
        for verifier in verifiers.iter_mut().take(active) {
            verifier.set_timeout();
        }
    }

    let approvals = dealer
        .responses()
        .values()
        .filter(|response| response.status)
        .count();
    info!(
        approvals,
        complaints = dealer.responses().len() - approvals,
        enough_approvals = dealer.enough_approvals(),
        certified = dealer.deal_certified(),
        "round finished"
    );

    if !dealer.deal_certified() {
        bail!("deal was not certified");
    }

    let commit = dealer
        .secret_commit()
        .expect("certified deal must expose the secret commitment");
    info!(
        secret_commit = %hex::encode(suite::point_to_bytes(&commit)),
        "secret commitment published"
    );

    // Recovery check: any `threshold` certified deals reconstruct the secret.
    let deals: Vec<_> = verifiers
        .iter()
        .take(active)
        .filter_map(|verifier| verifier.deal().cloned())
        .take(threshold as usize)
        .collect();
    let recovered = recover_secret(&deals, threshold)?;
    if recovered != secret {
        bail!("recovered secret does not match the dealt secret");
    }
    info!(shares = deals.len(), "secret recovered from certified deals");

    Ok(())
}
