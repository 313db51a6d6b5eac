//! The design philosophy underlying `blobshare` is operational, yet cryptographically strict.
//! Each module owns one stage of the pipeline that turns a payload into verifiable shares,
//! and the stages meet only through owned values and explicit result codes.
//!
//! Payload encoding.
//!
//! An [`Encoder`] is fixed to a column count `c`.  Encoding a payload of `n`
//! chunks lays them out in rows of `k = ceil(c / 2)` coefficients, extends
//! each row to `c` evaluations, commits to every row polynomial and proves
//! each column with a single aggregated opening: the row polynomials are
//! folded with powers of a per-column Fiat–Shamir challenge `h_c` and the
//! fold is opened at the column's evaluation point.  `h_c` absorbs the row
//! commitments, the column index and the column's evaluations.

use std::sync::Arc;

use ark_bn254::{Fr, G1Affine};
use ark_ff::Zero;
use ark_poly::{EvaluationDomain, Radix2EvaluationDomain};
#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;
use tracing::debug;

use crate::chunking::{bytes_to_elements, check_payload};
use crate::error::DaError;
use crate::handle::{owned_resource, Handle};
use crate::kzg;
use crate::params::{global_parameters, GlobalParameters, MAX_COLUMN_COUNT};
use crate::rs::{data_columns, extend_row, row_domain};
use crate::share::{column_challenge, CommitmentSet, Commitments, Share, ShareState};

#[derive(Debug)]
pub(crate) struct EncoderState {
    params: Arc<GlobalParameters>,
    column_count: usize,
    data_columns: usize,
    domain: Radix2EvaluationDomain<Fr>,
}

/// Stateful encoder for one column count.  Reusable for any number of
/// payloads and safe to share between threads.
pub struct Encoder {
    handle: Handle<EncoderState>,
}

owned_resource!(Encoder, "encoder");

impl Encoder {
    /// Creates an encoder producing `column_count` shares per payload.
    ///
    /// Fails with [`DaError::InvalidInput`] for a zero column count or one
    /// above the engine capacity, and with [`DaError::Internal`] when the
    /// engine has not been initialised.
    pub fn new(column_count: usize) -> Result<Self, DaError> {
        const OPERATION: &str = "create_encoder";
        if column_count == 0 {
            return Err(DaError::invalid_input(
                OPERATION,
                "column count must be greater than 0",
            ));
        }
        if column_count > MAX_COLUMN_COUNT {
            return Err(DaError::invalid_input(
                OPERATION,
                format!("column count {column_count} exceeds the maximum of {MAX_COLUMN_COUNT}"),
            ));
        }
        let params = global_parameters().map_err(|code| DaError::from_code(OPERATION, code))?;
        if column_count > params.max_column_count() {
            return Err(DaError::invalid_input(
                OPERATION,
                format!(
                    "column count {column_count} exceeds the engine capacity of {}",
                    params.max_column_count()
                ),
            ));
        }
        let data_columns = data_columns(column_count);
        kzg::ensure_capacity(&params, data_columns)
            .map_err(|code| DaError::from_code(OPERATION, code))?;
        let domain = row_domain(column_count).map_err(|code| DaError::from_code(OPERATION, code))?;
        debug!(column_count, data_columns, "created encoder");
        Ok(Self {
            handle: Handle::new(
                "encoder",
                EncoderState {
                    params,
                    column_count,
                    data_columns,
                    domain,
                },
            ),
        })
    }

    /// Column count the encoder was created with; `0` when null.
    pub fn column_count(&self) -> usize {
        self.handle.get().map_or(0, |state| state.column_count)
    }

    /// Encodes `payload`, which must be a non-empty multiple of
    /// [`crate::CHUNK_SIZE`] bytes.
    pub fn encode(&self, payload: &[u8]) -> Result<EncodedPayload, DaError> {
        const OPERATION: &str = "encode";
        let state = self.handle.require(OPERATION)?;
        let chunk_count = check_payload(OPERATION, payload)?;
        let k = state.data_columns;
        let column_count = state.column_count;

        let chunked_rows: Vec<Vec<Fr>> = bytes_to_elements(payload)
            .chunks(k)
            .map(|row| {
                let mut row = row.to_vec();
                row.resize(k, Fr::zero());
                row
            })
            .collect();

        let extended_rows = parallel_map(chunked_rows.len(), |r| {
            extend_row(&chunked_rows[r], &state.domain, column_count)
        });
        let row_commitments = parallel_map(chunked_rows.len(), |r| {
            kzg::commit(&state.params, &chunked_rows[r])
        });

        let commitments = CommitmentSet {
            row_commitments,
            chunk_count,
            column_count,
        };
        let transcript = commitments
            .transcript()
            .map_err(|code| DaError::from_code(OPERATION, code))?;
        let column_proofs = parallel_map(column_count, |c| {
            let column: Vec<Fr> = extended_rows.iter().map(|row| row[c]).collect();
            let h = column_challenge(&transcript, c, &column);
            let combined = kzg::aggregate_polynomials(&chunked_rows, h);
            kzg::open(&state.params, &combined, state.domain.element(c)).1
        });

        debug!(
            column_count,
            chunk_count,
            rows = chunked_rows.len(),
            "encoded payload"
        );
        Ok(EncodedPayload {
            handle: Handle::new(
                "encoded payload",
                EncodedState {
                    data: payload.to_vec(),
                    column_count,
                    chunk_count,
                    chunked_rows,
                    extended_rows,
                    commitments,
                    column_proofs,
                },
            ),
        })
    }
}

fn parallel_map<T, F>(count: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    #[cfg(not(target_arch = "wasm32"))]
    {
        if count > 1 && rayon::current_num_threads() > 1 {
            return (0..count).into_par_iter().map(f).collect();
        }
    }
    (0..count).map(f).collect()
}

#[derive(Debug)]
pub(crate) struct EncodedState {
    data: Vec<u8>,
    column_count: usize,
    chunk_count: usize,
    chunked_rows: Vec<Vec<Fr>>,
    extended_rows: Vec<Vec<Fr>>,
    commitments: CommitmentSet,
    column_proofs: Vec<G1Affine>,
}

/// Outcome of [`EncodedPayload::copy_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataRetrieval {
    /// The data was copied; holds the number of bytes written.
    Copied(usize),
    /// The buffer was too small; holds the number of bytes required.
    NeedsCapacity(usize),
}

/// Result of one [`Encoder::encode`] call.
pub struct EncodedPayload {
    handle: Handle<EncodedState>,
}

owned_resource!(EncodedPayload, "encoded payload");

impl EncodedPayload {
    /// Copies the original payload into `out` when it is large enough.
    ///
    /// A short buffer is not an error: the required size is reported through
    /// [`DataRetrieval::NeedsCapacity`] so the caller can allocate and retry.
    pub fn copy_data(&self, out: &mut [u8]) -> Result<DataRetrieval, DaError> {
        let state = self.handle.require("copy_data")?;
        let len = state.data.len();
        if out.len() < len {
            return Ok(DataRetrieval::NeedsCapacity(len));
        }
        out[..len].copy_from_slice(&state.data);
        Ok(DataRetrieval::Copied(len))
    }

    /// Returns a copy of the original payload.
    pub fn get_data(&self) -> Result<Vec<u8>, DaError> {
        const OPERATION: &str = "get_data";
        let needed = match self.copy_data(&mut [])? {
            DataRetrieval::NeedsCapacity(len) | DataRetrieval::Copied(len) => len,
        };
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(needed).map_err(|err| {
            DaError::allocation(OPERATION, format!("cannot allocate {needed} bytes: {err}"))
        })?;
        buffer.resize(needed, 0);
        match self.copy_data(&mut buffer)? {
            DataRetrieval::Copied(len) => {
                buffer.truncate(len);
                Ok(buffer)
            }
            DataRetrieval::NeedsCapacity(len) => Err(DaError::internal(
                OPERATION,
                format!("payload length changed between queries ({needed} -> {len})"),
            )),
        }
    }

    /// Number of shares, equal to the column count; `0` when null.
    pub fn share_count(&self) -> usize {
        self.handle.get().map_or(0, |state| state.column_count)
    }

    /// Number of rows the payload was laid out in; `0` when null.
    pub fn row_count(&self) -> usize {
        self.handle.get().map_or(0, |state| state.chunked_rows.len())
    }

    /// Number of payload chunks; `0` when null.
    pub fn chunk_count(&self) -> usize {
        self.handle.get().map_or(0, |state| state.chunk_count)
    }

    /// Extracts the share for column `index` as an independent owned value.
    pub fn get_share(&self, index: usize) -> Result<Share, DaError> {
        const OPERATION: &str = "get_share";
        let state = self.handle.require(OPERATION)?;
        if index >= state.column_count {
            return Err(DaError::invalid_input(
                OPERATION,
                format!(
                    "Share index {index} is out of bounds. Valid range: 0..{}",
                    state.column_count
                ),
            ));
        }
        let column = state.extended_rows.iter().map(|row| row[index]).collect();
        Ok(Share::new(ShareState {
            index,
            column,
            proof: state.column_proofs[index],
            commitments: state.commitments.clone(),
        }))
    }

    /// Owned copy of the row commitments.
    pub fn commitments(&self) -> Result<Commitments, DaError> {
        let state = self.handle.require("encoded_commitments")?;
        Ok(Commitments::new(state.commitments.clone()))
    }
}
