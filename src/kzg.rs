//! The design philosophy underlying `blobshare` is operational, yet cryptographically strict.
//! Each module owns one stage of the pipeline that turns a payload into verifiable shares,
//! and the stages meet only through owned values and explicit result codes.
//!
//! KZG polynomial commitments over BN254.
//!
//! Polynomials are kept in coefficient form (lowest degree first).  A
//! commitment is the multi-scalar product of the coefficients with the
//! `[τ^i]G1` powers of the structured reference string; an opening at `z`
//! commits to the quotient `(p(X) - p(z)) / (X - z)` and is checked with one
//! pairing equation:
//!
//! ```text
//! e(C - [v]G1, G2) == e(π, [τ]G2 - [z]G2)
//! ```

use ark_bn254::{Bn254, Fr, G1Affine, G1Projective};
use ark_ec::pairing::Pairing;
use ark_ec::{AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::{One, Zero};

use crate::error::{engine_failure, EngineResult, ResultCode};
use crate::params::GlobalParameters;

/// Fails unless the SRS can commit to polynomials with `coefficients` terms.
pub(crate) fn ensure_capacity(params: &GlobalParameters, coefficients: usize) -> EngineResult<()> {
    if coefficients > params.capacity() {
        return engine_failure(
            ResultCode::InternalError,
            format!(
                "polynomial with {coefficients} coefficients exceeds the SRS capacity of {}",
                params.capacity()
            ),
        );
    }
    Ok(())
}

/// Commits to `coeffs`.  Callers check [`ensure_capacity`] first.
pub(crate) fn commit(params: &GlobalParameters, coeffs: &[Fr]) -> G1Affine {
    G1Projective::msm_unchecked(&params.g1_powers[..coeffs.len()], coeffs).into_affine()
}

/// Evaluates `coeffs` at `point` with Horner's rule.
pub(crate) fn evaluate(coeffs: &[Fr], point: Fr) -> Fr {
    coeffs
        .iter()
        .rev()
        .fold(Fr::zero(), |acc, coeff| acc * point + coeff)
}

/// Divides `coeffs` by `(X - point)`, returning the quotient and the
/// remainder (which equals the evaluation at `point`).
pub(crate) fn divide_by_linear(coeffs: &[Fr], point: Fr) -> (Vec<Fr>, Fr) {
    let mut quotient = vec![Fr::zero(); coeffs.len().saturating_sub(1)];
    let mut carry = Fr::zero();
    for i in (1..coeffs.len()).rev() {
        carry = coeffs[i] + carry * point;
        quotient[i - 1] = carry;
    }
    let remainder = coeffs.first().copied().unwrap_or_else(Fr::zero) + carry * point;
    (quotient, remainder)
}

/// Opens `coeffs` at `point`, returning the evaluation and the proof.
pub(crate) fn open(params: &GlobalParameters, coeffs: &[Fr], point: Fr) -> (Fr, G1Affine) {
    let (quotient, value) = divide_by_linear(coeffs, point);
    (value, commit(params, &quotient))
}

/// Checks that `proof` opens `commitment` to `value` at `point`.
pub(crate) fn verify_opening(
    params: &GlobalParameters,
    commitment: &G1Affine,
    point: Fr,
    value: Fr,
    proof: &G1Affine,
) -> bool {
    let lhs = (commitment.into_group() - G1Affine::generator() * value).into_affine();
    let shifted = (params.tau_g2.into_group() - params.g2 * point).into_affine();
    Bn254::pairing(lhs, params.g2) == Bn254::pairing(*proof, shifted)
}

/// Returns `[1, h, h^2, ..]` with `count` entries.
fn powers_of(h: Fr, count: usize) -> Vec<Fr> {
    let mut out = Vec::with_capacity(count);
    let mut current = Fr::one();
    for _ in 0..count {
        out.push(current);
        current *= h;
    }
    out
}

/// Computes `Σ h^i · values[i]`.
pub(crate) fn aggregate_scalars(values: &[Fr], h: Fr) -> Fr {
    values
        .iter()
        .zip(powers_of(h, values.len()))
        .fold(Fr::zero(), |acc, (value, weight)| acc + *value * weight)
}

/// Computes `Σ h^i · commitments[i]`.
pub(crate) fn aggregate_commitments(commitments: &[G1Affine], h: Fr) -> G1Affine {
    G1Projective::msm_unchecked(commitments, &powers_of(h, commitments.len())).into_affine()
}

/// Computes the coefficient-wise combination `Σ h^i · polys[i]`.
pub(crate) fn aggregate_polynomials(polys: &[Vec<Fr>], h: Fr) -> Vec<Fr> {
    let width = polys.iter().map(Vec::len).max().unwrap_or(0);
    let mut combined = vec![Fr::zero(); width];
    for (poly, weight) in polys.iter().zip(powers_of(h, polys.len())) {
        for (slot, coeff) in combined.iter_mut().zip(poly) {
            *slot += *coeff * weight;
        }
    }
    combined
}
