//! The design philosophy underlying `blobshare` is operational, yet cryptographically strict.
//! Each module owns one stage of the pipeline that turns a payload into verifiable shares,
//! and the stages meet only through owned values and explicit result codes.
//!
//! Payload reconstruction from a subset of shares.
//!
//! Every row polynomial has degree `< k = ceil(c / 2)`, so any `k` shares
//! with distinct indices determine all rows.  The Lagrange basis depends only
//! on the share indices and is computed once for the whole payload.

use std::collections::BTreeSet;

use ark_bn254::Fr;
use ark_poly::EvaluationDomain;
#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;
use tracing::debug;

use crate::chunking::elements_to_bytes;
use crate::error::{engine_failure, DaError, EngineResult, ResultCode};
use crate::rs::{combine_basis, data_columns, lagrange_basis, row_domain};
use crate::share::{Share, ShareState};

/// Recovers the original payload from `shares`.
///
/// Shares may arrive in any order and may repeat; at least
/// `ceil(column_count / 2)` distinct indices of one encoding are required.
pub fn reconstruct(shares: &[Share]) -> Result<Vec<u8>, DaError> {
    const OPERATION: &str = "reconstruct";
    if shares.is_empty() {
        return Err(DaError::invalid_input(OPERATION, "no shares supplied"));
    }
    let mut states: Vec<&ShareState> = Vec::with_capacity(shares.len());
    for (position, share) in shares.iter().enumerate() {
        let Some(state) = share.handle.get() else {
            return Err(DaError::invalid_input(
                OPERATION,
                format!("share at position {position} is null"),
            ));
        };
        if let Some(first) = states.first() {
            if first.commitments != state.commitments {
                return Err(DaError::invalid_input(
                    OPERATION,
                    format!("share at position {position} belongs to a different encoding"),
                ));
            }
        }
        if state.index >= state.commitments.column_count
            || state.column.len() != state.commitments.row_commitments.len()
        {
            return Err(DaError::invalid_input(
                OPERATION,
                format!("share at position {position} is malformed"),
            ));
        }
        states.push(state);
    }
    let data = decode_shares(&states).map_err(|code| DaError::from_code(OPERATION, code))?;
    debug!(shares = shares.len(), bytes = data.len(), "reconstructed payload");
    Ok(data)
}

fn decode_shares(states: &[&ShareState]) -> EngineResult<Vec<u8>> {
    let commitments = &states[0].commitments;
    let k = data_columns(commitments.column_count);

    let mut seen = BTreeSet::new();
    let selected: Vec<&ShareState> = states
        .iter()
        .copied()
        .filter(|state| seen.insert(state.index))
        .take(k)
        .collect();
    if selected.len() < k {
        return engine_failure(
            ResultCode::InvalidInput,
            format!(
                "insufficient shares: {} distinct indices supplied, {k} required",
                selected.len()
            ),
        );
    }

    let domain = row_domain(commitments.column_count)?;
    let xs: Vec<Fr> = selected.iter().map(|state| domain.element(state.index)).collect();
    let basis = lagrange_basis(&xs)?;

    let row_count = commitments.row_commitments.len();
    let recover_row = |r: usize| -> Vec<Fr> {
        let ys: Vec<Fr> = selected.iter().map(|state| state.column[r]).collect();
        combine_basis(&basis, &ys)
    };
    #[cfg(not(target_arch = "wasm32"))]
    let rows: Vec<Vec<Fr>> = (0..row_count).into_par_iter().map(recover_row).collect();
    #[cfg(target_arch = "wasm32")]
    let rows: Vec<Vec<Fr>> = (0..row_count).map(recover_row).collect();

    let mut elements: Vec<Fr> = rows.into_iter().flatten().collect();
    elements.truncate(commitments.chunk_count);
    let data = elements_to_bytes(&elements)?;
    if data.is_empty() {
        return engine_failure(ResultCode::InvalidInput, "reconstructed length is 0");
    }
    Ok(data)
}
