//! Reed-Solomon coding over the BN254 scalar field.
//!
//! A row of `k` data chunks is read as the coefficient vector of a polynomial
//! of degree `< k`.  Extending the row evaluates that polynomial on the first
//! `column_count` points of a radix-2 domain, which doubles the row when
//! `column_count = 2k`.  Any `k` of those evaluations recover the row.

use ark_bn254::Fr;
use ark_ff::{Field, One, Zero};
use ark_poly::{EvaluationDomain, Radix2EvaluationDomain};

use crate::error::{engine_failure, EngineResult, ResultCode};
use crate::kzg::{divide_by_linear, evaluate};

/// Data chunks per row for `column_count` extended columns.
pub(crate) fn data_columns(column_count: usize) -> usize {
    column_count.div_ceil(2)
}

/// Multiplicative domain whose first `size` powers are the evaluation points.
pub(crate) fn row_domain(size: usize) -> EngineResult<Radix2EvaluationDomain<Fr>> {
    match Radix2EvaluationDomain::<Fr>::new(size) {
        Some(domain) if size > 0 => Ok(domain),
        _ => engine_failure(
            ResultCode::InvalidInput,
            format!("no radix-2 evaluation domain of size {size}"),
        ),
    }
}

/// Evaluates the row polynomial on the first `column_count` domain points.
pub(crate) fn extend_row(
    coeffs: &[Fr],
    domain: &Radix2EvaluationDomain<Fr>,
    column_count: usize,
) -> Vec<Fr> {
    let mut evaluations = domain.fft(coeffs);
    evaluations.truncate(column_count);
    evaluations
}

/// Lagrange basis for the abscissae `xs`: entry `i` holds the coefficients
/// of the polynomial of degree `< xs.len()` that is one at `xs[i]` and zero
/// at every other abscissa.
///
/// The vanishing polynomial of all abscissae is built once and divided by
/// each `(X - x_i)` in turn, so the whole basis costs `O(n^2)`.
pub(crate) fn lagrange_basis(xs: &[Fr]) -> EngineResult<Vec<Vec<Fr>>> {
    let mut vanishing = vec![Fr::one()];
    for x in xs {
        vanishing.push(Fr::zero());
        for i in (1..vanishing.len()).rev() {
            let lower = vanishing[i - 1];
            vanishing[i] -= lower * x;
        }
    }
    // Built highest degree first.
    vanishing.reverse();

    let mut basis = Vec::with_capacity(xs.len());
    for x in xs {
        let (mut numerator, _) = divide_by_linear(&vanishing, *x);
        let Some(scale) = evaluate(&numerator, *x).inverse() else {
            return engine_failure(
                ResultCode::InvalidInput,
                "interpolation points must have distinct abscissae",
            );
        };
        numerator.iter_mut().for_each(|coeff| *coeff *= scale);
        basis.push(numerator);
    }
    Ok(basis)
}

/// Combines a Lagrange basis with the ordinates `ys`.
pub(crate) fn combine_basis(basis: &[Vec<Fr>], ys: &[Fr]) -> Vec<Fr> {
    let mut coeffs = vec![Fr::zero(); basis.len()];
    for (poly, y) in basis.iter().zip(ys) {
        for (slot, coeff) in coeffs.iter_mut().zip(poly) {
            *slot += *coeff * y;
        }
    }
    coeffs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(values: &[u64]) -> Vec<Fr> {
        values.iter().map(|v| Fr::from(*v)).collect()
    }

    fn interpolate(points: &[(Fr, Fr)]) -> EngineResult<Vec<Fr>> {
        let (xs, ys): (Vec<Fr>, Vec<Fr>) = points.iter().copied().unzip();
        Ok(combine_basis(&lagrange_basis(&xs)?, &ys))
    }

    #[test]
    fn test_data_columns() {
        assert_eq!(data_columns(1), 1);
        assert_eq!(data_columns(2), 1);
        assert_eq!(data_columns(7), 4);
        assert_eq!(data_columns(8), 4);
    }

    #[test]
    fn test_row_domain_rounds_up() {
        assert_eq!(row_domain(6).unwrap().size(), 8);
        assert_eq!(row_domain(8).unwrap().size(), 8);
        assert_eq!(row_domain(0).unwrap_err(), ResultCode::InvalidInput);
        assert!(crate::error::take_last_error().is_some());
    }

    #[test]
    fn test_extend_row_matches_evaluation() {
        let coeffs = poly(&[9, 8, 7]);
        let domain = row_domain(6).unwrap();
        let extended = extend_row(&coeffs, &domain, 6);
        assert_eq!(extended.len(), 6);
        for (c, value) in extended.iter().enumerate() {
            assert_eq!(*value, evaluate(&coeffs, domain.element(c)));
        }
    }

    #[test]
    fn test_interpolate_recovers_row_from_any_half() {
        let coeffs = poly(&[1, 2, 3, 4]);
        let domain = row_domain(8).unwrap();
        let extended = extend_row(&coeffs, &domain, 8);
        for subset in [[0usize, 1, 2, 3], [4, 5, 6, 7], [7, 0, 5, 2]] {
            let points: Vec<(Fr, Fr)> = subset
                .iter()
                .map(|c| (domain.element(*c), extended[*c]))
                .collect();
            assert_eq!(interpolate(&points).unwrap(), coeffs);
        }
    }

    #[test]
    fn test_basis_is_indicator() {
        let xs = poly(&[1, 5, 9]);
        let basis = lagrange_basis(&xs).unwrap();
        for (i, b) in basis.iter().enumerate() {
            for (j, x) in xs.iter().enumerate() {
                let expected = if i == j { Fr::one() } else { Fr::zero() };
                assert_eq!(evaluate(b, *x), expected);
            }
        }
    }

    #[test]
    fn test_interpolate_rejects_repeated_points() {
        let points = vec![(Fr::from(2u64), Fr::one()), (Fr::from(2u64), Fr::one())];
        assert_eq!(interpolate(&points), Err(ResultCode::InvalidInput));
        assert!(crate::error::take_last_error()
            .unwrap()
            .contains("distinct"));
    }
}
