//! Secret sharing polynomials.
//!
//! A dealer samples a secret polynomial `f` of degree `t - 1` with
//! `f(0) = secret`, hands verifier `i` the evaluation at `x = i + 1` (index 0
//! must not receive `f(0)` itself), and publishes `g^{a_j}` for every
//! coefficient. Anyone can then check a share against the published
//! commitments, and any `t` distinct shares recover the secret by Lagrange
//! interpolation at zero.

use crate::{Error, Result, suite};
use k256::{ProjectivePoint, Scalar, elliptic_curve::Field};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// An indexed evaluation of the secret polynomial
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretShare {
    /// Verifier index this share belongs to
    pub index: u32,
    /// Evaluation of the secret polynomial at `index + 1`
    #[serde(with = "crate::suite::scalar_serde")]
    pub value: Scalar,
}

impl fmt::Debug for SecretShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretShare")
            .field("index", &self.index)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// The dealer's secret polynomial
///
/// Coefficients are secret material; they are wiped when the polynomial is
/// dropped.
#[derive(Clone)]
pub struct SecretPolynomial {
    coefficients: Vec<Scalar>,
}

impl Zeroize for SecretPolynomial {
    fn zeroize(&mut self) {
        for coefficient in &mut self.coefficients {
            *coefficient = Scalar::ZERO;
        }
    }
}

impl Drop for SecretPolynomial {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl SecretPolynomial {
    /// Sample a polynomial of degree `threshold - 1` with `f(0) = secret`
    pub fn new<R: CryptoRng + RngCore>(rng: &mut R, threshold: u32, secret: &Scalar) -> Self {
        let mut coefficients = Vec::with_capacity(threshold as usize);
        coefficients.push(*secret);
        for _ in 1..threshold {
            coefficients.push(suite::random_scalar(rng));
        }
        Self { coefficients }
    }

    /// Number of shares required to reconstruct, i.e. the coefficient count
    pub fn threshold(&self) -> u32 {
        self.coefficients.len() as u32
    }

    /// The shared secret, `f(0)`
    pub fn secret(&self) -> &Scalar {
        &self.coefficients[0]
    }

    /// Evaluate the polynomial for verifier `index` at `x = index + 1`
    pub fn eval(&self, index: u32) -> SecretShare {
        let x = Scalar::from(u64::from(index) + 1);
        let mut value = Scalar::ZERO;
        let mut x_power = Scalar::ONE;

        for coefficient in &self.coefficients {
            value += *coefficient * x_power;
            x_power *= x;
        }

        SecretShare { index, value }
    }

    /// Public commitments `[g^{a_0}, ..., g^{a_{t-1}}]` to the coefficients
    pub fn commitment(&self) -> Vec<ProjectivePoint> {
        self.coefficients
            .iter()
            .map(|coefficient| ProjectivePoint::GENERATOR * *coefficient)
            .collect()
    }
}

impl fmt::Debug for SecretPolynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretPolynomial")
            .field("threshold", &self.threshold())
            .field("coefficients", &"[REDACTED]")
            .finish()
    }
}

/// Evaluate the public commitment polynomial for verifier `index`.
///
/// Returns `sum_j commitments[j] * x^j` at `x = index + 1`, the public image
/// of the share the verifier should hold.
pub fn eval_commitments(commitments: &[ProjectivePoint], index: u32) -> ProjectivePoint {
    let x = Scalar::from(u64::from(index) + 1);
    let mut value = ProjectivePoint::IDENTITY;
    let mut x_power = Scalar::ONE;

    for commitment in commitments {
        value += *commitment * x_power;
        x_power *= x;
    }

    value
}

/// Recover the secret from at least `threshold` distinct shares.
///
/// Shares are deduplicated by index; the first `threshold` distinct shares
/// are interpolated at zero.
pub fn recover_secret(shares: &[SecretShare], threshold: u32) -> Result<Scalar> {
    let mut distinct: Vec<&SecretShare> = Vec::with_capacity(threshold as usize);
    for share in shares {
        if distinct.len() == threshold as usize {
            break;
        }
        if !distinct.iter().any(|s| s.index == share.index) {
            distinct.push(share);
        }
    }

    if distinct.len() < threshold as usize {
        return Err(Error::InsufficientShares {
            required: threshold as usize,
            actual: distinct.len(),
        });
    }

    let abscissas: Vec<Scalar> = distinct
        .iter()
        .map(|share| Scalar::from(u64::from(share.index) + 1))
        .collect();

    let mut secret = Scalar::ZERO;
    for (i, share) in distinct.iter().enumerate() {
        let mut numerator = Scalar::ONE;
        let mut denominator = Scalar::ONE;
        for (j, x_j) in abscissas.iter().enumerate() {
            if i == j {
                continue;
            }
            numerator *= *x_j;
            denominator *= *x_j - abscissas[i];
        }
        // Distinct abscissas make the denominator nonzero.
        let inverse = Option::<Scalar>::from(denominator.invert()).ok_or(
            Error::InsufficientShares {
                required: threshold as usize,
                actual: distinct.len(),
            },
        )?;
        secret += share.value * numerator * inverse;
    }

    Ok(secret)
}
