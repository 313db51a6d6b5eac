#![deny(missing_docs)]

//! The design philosophy underlying `blobshare` is operational, yet cryptographically strict.
//! Each module owns one stage of the pipeline that turns a payload into verifiable shares,
//! and the stages meet only through owned values and explicit result codes.
//!
//! This crate aims to keep the data-availability path small enough to audit in one sitting
//! while remaining fast enough to sit in front of a real network or storage layer.
//! # blobshare
//!
//! **blobshare** erasure-codes opaque payloads into shares that can be
//! checked one at a time and recombined from any half of them.
//!
//! ## Features
//!
//! * **Chunking**: payloads are split into 31-byte chunks, each of which fits
//!   a BN254 scalar without reduction ([`CHUNK_SIZE`], [`validate_payload`],
//!   [`pad_to_chunk_size`]).
//! * **Rate-1/2 Reed-Solomon extension**: chunks are laid out in rows of
//!   `ceil(c / 2)` polynomial coefficients and every row is evaluated on `c`
//!   roots of unity, one per share ([`Encoder`]).
//! * **KZG commitments**: every row polynomial is committed to, and every
//!   column carries one aggregated opening proof covering all rows.
//! * **Verification** of a single share against the row commitments without
//!   the payload ([`Verifier`]).
//! * **Reconstruction** from any `ceil(c / 2)` distinct shares
//!   ([`reconstruct`]).
//! * **Wire format** for payload summaries and share indices ([`codec`]).
//!
//! ## Usage
//!
//! ```rust
//! use blobshare::{init_with, reconstruct, Encoder, EngineConfig, Verifier, CHUNK_SIZE};
//!
//! init_with(EngineConfig { max_column_count: 8, ..EngineConfig::default() }).unwrap();
//!
//! let payload = vec![7u8; 4 * CHUNK_SIZE];
//! let encoded = Encoder::new(4).unwrap().encode(&payload).unwrap();
//! let verifier = Verifier::new().unwrap();
//!
//! let shares: Vec<_> = (0..encoded.share_count())
//!     .map(|i| encoded.get_share(i).unwrap())
//!     .collect();
//! assert!(shares.iter().all(|s| verifier.verify(s, 4).unwrap()));
//! assert_eq!(reconstruct(&shares[2..]).unwrap(), payload);
//! ```
//!
//! The engine is process-wide state: call [`init`] (or [`init_with`]) before
//! creating encoders or verifiers and [`cleanup`] once they are no longer
//! needed.  The structured reference string is derived from a public seed,
//! so commitments bind honest encoders only.

mod handle;

mod chunking;
pub mod codec;
mod encoder;
mod error;
mod kzg;
mod params;
mod reconstruct;
mod rs;
mod share;
mod transcript;
mod verifier;

pub use chunking::{max_chunk_size, pad_to_chunk_size, validate_payload, CHUNK_SIZE};
pub use codec::{CodecError, PayloadSummary};
pub use encoder::{DataRetrieval, EncodedPayload, Encoder};
pub use error::{take_last_error, DaError, ResultCode};
pub use params::{
    cleanup, init, init_with, is_initialized, EngineConfig, DEFAULT_MAX_COLUMN_COUNT,
    MAX_COLUMN_COUNT,
};
pub use reconstruct::reconstruct;
pub use share::{Commitments, Share};
pub use verifier::Verifier;
