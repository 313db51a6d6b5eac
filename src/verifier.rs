//! Share verification.
//!
//! A share for column `c` carries the evaluations `y_r = p_r(z)` of every
//! row polynomial at `z = ω^c` and one proof for the folded polynomial
//! `Σ h^r p_r`.  The verifier rebuilds `h` from the row commitments, the
//! share index and the evaluations it was handed, folds commitments and
//! evaluations with the same weights and checks a single KZG opening.
//!
//! The row domain size must equal the column count the share was encoded
//! with.  Any other size is rejected before the pairing check.

use std::sync::Arc;

use ark_poly::EvaluationDomain;
use tracing::debug;

use crate::error::{set_last_error, DaError, EngineResult};
use crate::handle::{owned_resource, Handle};
use crate::kzg;
use crate::params::{global_parameters, GlobalParameters};
use crate::rs::row_domain;
use crate::share::{column_challenge, Share, ShareState};

#[derive(Debug)]
pub(crate) struct VerifierState {
    params: Arc<GlobalParameters>,
}

impl VerifierState {
    fn check(&self, share: &ShareState, row_domain_size: usize) -> EngineResult<bool> {
        let commitments = &share.commitments;
        if share.column.len() != commitments.row_commitments.len() {
            return Ok(false);
        }
        if row_domain_size != commitments.column_count || share.index >= row_domain_size {
            return Ok(false);
        }
        let domain = row_domain(row_domain_size)?;
        let point = domain.element(share.index);
        let h = column_challenge(&commitments.transcript()?, share.index, &share.column);
        let combined = kzg::aggregate_commitments(&commitments.row_commitments, h);
        let value = kzg::aggregate_scalars(&share.column, h);
        Ok(kzg::verify_opening(
            &self.params,
            &combined,
            point,
            value,
            &share.proof,
        ))
    }
}

/// Stateless share verifier.  One instance may verify any number of shares
/// from any number of threads.
pub struct Verifier {
    handle: Handle<VerifierState>,
}

owned_resource!(Verifier, "verifier");

impl Verifier {
    /// Creates a verifier bound to the current engine parameters.
    pub fn new() -> Result<Self, DaError> {
        let params =
            global_parameters().map_err(|code| DaError::from_code("create_verifier", code))?;
        Ok(Self {
            handle: Handle::new("verifier", VerifierState { params }),
        })
    }

    /// Checks `share` against its commitments, using the `row_domain_size`-th
    /// roots of unity as evaluation points.
    ///
    /// Returns `Ok(false)` for an inconsistent share and leaves a description
    /// in the last-error channel ([`crate::take_last_error`]).
    pub fn verify(&self, share: &Share, row_domain_size: usize) -> Result<bool, DaError> {
        const OPERATION: &str = "verify";
        let verifier = self.handle.require(OPERATION)?;
        let state = share.state(OPERATION)?;
        if row_domain_size == 0 {
            return Err(DaError::invalid_input(
                OPERATION,
                "row domain size must be greater than 0",
            ));
        }
        let valid = verifier
            .check(state, row_domain_size)
            .map_err(|code| DaError::from_code(OPERATION, code))?;
        if !valid {
            set_last_error(format!(
                "Share verification failed (share_idx: {}, rows_domain_size: {row_domain_size})",
                state.index
            ));
        }
        debug!(index = state.index, row_domain_size, valid, "verified share");
        Ok(valid)
    }
}
