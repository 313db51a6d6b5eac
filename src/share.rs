//! Shares and commitment sets.

use ark_bn254::{Fr, G1Affine};
use ark_serialize::CanonicalSerialize;

use crate::error::{engine_failure, DaError, EngineResult, ResultCode};
use crate::handle::{owned_resource, Handle};
use crate::transcript::Transcript;

const AGGREGATION_DOMAIN: &[u8] = b"blobshare:v1:column-aggregation";

/// Row commitments plus the dimensions they were produced for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommitmentSet {
    pub(crate) row_commitments: Vec<G1Affine>,
    pub(crate) chunk_count: usize,
    pub(crate) column_count: usize,
}

impl CommitmentSet {
    /// Transcript over the dimensions and every row commitment.  Column
    /// challenges extend a clone of it.
    pub(crate) fn transcript(&self) -> EngineResult<Transcript> {
        let mut transcript = Transcript::new(AGGREGATION_DOMAIN);
        transcript.append_u64(self.column_count as u64);
        transcript.append_u64(self.chunk_count as u64);
        transcript.append_u64(self.row_commitments.len() as u64);
        for commitment in &self.row_commitments {
            transcript.append_point(commitment)?;
        }
        Ok(transcript)
    }
}

/// Challenge `h` that weights row `r` by `h^r` in the opening of column
/// `index`.  It absorbs the column's evaluations, so they are fixed before
/// the weights are known.
pub(crate) fn column_challenge(base: &Transcript, index: usize, column: &[Fr]) -> Fr {
    let mut transcript = base.clone();
    transcript.append_u64(index as u64);
    transcript.append_u64(column.len() as u64);
    for value in column {
        transcript.append_scalar(value);
    }
    transcript.challenge()
}

#[derive(Debug, Clone)]
pub(crate) struct ShareState {
    pub(crate) index: usize,
    /// One extended evaluation per row.
    pub(crate) column: Vec<Fr>,
    pub(crate) proof: G1Affine,
    pub(crate) commitments: CommitmentSet,
}

/// One extended column of an encoded payload with its opening proof.
pub struct Share {
    pub(crate) handle: Handle<ShareState>,
}

owned_resource!(Share, "share");

impl Share {
    pub(crate) fn new(state: ShareState) -> Self {
        Self {
            handle: Handle::new("share", state),
        }
    }

    /// Column index of the share, or `0` for a null share.
    pub fn index(&self) -> usize {
        self.handle.get().map_or(0, |state| state.index)
    }

    /// Returns an owned copy of the commitments the share was produced with.
    pub fn commitments(&self) -> Result<Commitments, DaError> {
        let state = self.state("share_commitments")?;
        Ok(Commitments::new(state.commitments.clone()))
    }

    pub(crate) fn state(&self, operation: &'static str) -> Result<&ShareState, DaError> {
        self.handle.require(operation)
    }
}

/// Owned commitment set, releasable independently of the share it came from.
pub struct Commitments {
    handle: Handle<CommitmentSet>,
}

owned_resource!(Commitments, "commitments");

impl Commitments {
    pub(crate) fn new(set: CommitmentSet) -> Self {
        Self {
            handle: Handle::new("commitments", set),
        }
    }

    /// Number of row commitments; `0` when null.
    pub fn row_count(&self) -> usize {
        self.handle.get().map_or(0, |set| set.row_commitments.len())
    }

    /// Number of payload chunks covered; `0` when null.
    pub fn chunk_count(&self) -> usize {
        self.handle.get().map_or(0, |set| set.chunk_count)
    }

    /// Extended column count of the encoding; `0` when null.
    pub fn column_count(&self) -> usize {
        self.handle.get().map_or(0, |set| set.column_count)
    }

    /// Row commitments as compressed G1 points.
    pub fn row_commitment_bytes(&self) -> Result<Vec<Vec<u8>>, DaError> {
        const OPERATION: &str = "row_commitment_bytes";
        let set = self.handle.require(OPERATION)?;
        set.row_commitments
            .iter()
            .map(|point| compress(point).map_err(|code| DaError::from_code(OPERATION, code)))
            .collect()
    }
}

fn compress(point: &G1Affine) -> EngineResult<Vec<u8>> {
    let mut out = Vec::with_capacity(point.compressed_size());
    match point.serialize_compressed(&mut out) {
        Ok(()) => Ok(out),
        Err(err) => engine_failure(
            ResultCode::InternalError,
            format!("cannot serialize commitment: {err}"),
        ),
    }
}
