//! Lightweight Fiat–Shamir transcript over the BN254 scalar field.
//!
//! The [`Transcript`] type records labelled byte strings and derives
//! deterministic challenges using a domain-separated BLAKE2b-512 expander.
//! Challenges are produced by hashing the accumulated transcript together
//! with a monotonic counter and reducing the wide digest into the field.

use ark_bn254::{Fr, G1Affine};
use ark_ff::{BigInteger, PrimeField};
use ark_serialize::CanonicalSerialize;
use blake2::{Blake2b512, Digest};

use crate::error::{engine_failure, EngineResult, ResultCode};

const CHALLENGE_DOMAIN: &[u8] = b"BLOBSHARE_CHALLENGE";

/// Stateful helper that derives challenges from a recorded transcript.
#[derive(Debug, Clone)]
pub(crate) struct Transcript {
    domain_tag: &'static [u8],
    bytes: Vec<u8>,
    counter: u64,
}

impl Transcript {
    /// Creates an empty transcript associated with the given domain tag.
    pub(crate) fn new(domain_tag: &'static [u8]) -> Self {
        Self {
            domain_tag,
            bytes: Vec::new(),
            counter: 0,
        }
    }

    /// Appends a length-prefixed byte string.
    pub(crate) fn append_bytes(&mut self, value: &[u8]) {
        self.bytes
            .extend_from_slice(&(value.len() as u64).to_le_bytes());
        self.bytes.extend_from_slice(value);
    }

    /// Appends a single `u64` word.
    pub(crate) fn append_u64(&mut self, value: u64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Appends a scalar as its 32-byte little-endian representation.
    pub(crate) fn append_scalar(&mut self, value: &Fr) {
        self.append_bytes(&value.into_bigint().to_bytes_le());
    }

    /// Appends a G1 point in compressed form.
    pub(crate) fn append_point(&mut self, point: &G1Affine) -> EngineResult<()> {
        let mut encoded = Vec::with_capacity(point.compressed_size());
        if let Err(err) = point.serialize_compressed(&mut encoded) {
            return engine_failure(
                ResultCode::InternalError,
                format!("cannot serialize commitment: {err}"),
            );
        }
        self.append_bytes(&encoded);
        Ok(())
    }

    /// Derives the next challenge using the Fiat–Shamir transform.
    ///
    /// Each invocation mixes the current transcript with a strictly
    /// increasing counter, absorbs the resulting challenge into the
    /// transcript, and returns it to the caller.
    pub(crate) fn challenge(&mut self) -> Fr {
        let mut hasher = Blake2b512::new();
        hasher.update(CHALLENGE_DOMAIN);
        hasher.update((self.domain_tag.len() as u64).to_le_bytes());
        hasher.update(self.domain_tag);
        hasher.update((self.bytes.len() as u64).to_le_bytes());
        hasher.update(&self.bytes);
        hasher.update(self.counter.to_le_bytes());
        let challenge = Fr::from_le_bytes_mod_order(&hasher.finalize());
        self.append_scalar(&challenge);
        self.counter = self.counter.wrapping_add(1);
        challenge
    }
}

#[cfg(test)]
mod tests {
    use super::Transcript;

    #[test]
    fn test_challenges_are_deterministic() {
        let mut a = Transcript::new(b"test");
        let mut b = Transcript::new(b"test");
        a.append_u64(7);
        b.append_u64(7);
        assert_eq!(a.challenge(), b.challenge());
        assert_eq!(a.challenge(), b.challenge());
    }

    #[test]
    fn test_successive_challenges_differ() {
        let mut t = Transcript::new(b"test");
        t.append_bytes(b"payload");
        let first = t.challenge();
        let second = t.challenge();
        assert_ne!(first, second);
    }

    #[test]
    fn test_domain_separation() {
        let mut a = Transcript::new(b"alpha");
        let mut b = Transcript::new(b"beta");
        a.append_u64(1);
        b.append_u64(1);
        assert_ne!(a.challenge(), b.challenge());
    }

    #[test]
    fn test_scalars_bind_the_challenge() {
        let mut a = Transcript::new(b"test");
        let mut b = a.clone();
        a.append_scalar(&ark_bn254::Fr::from(1u64));
        b.append_scalar(&ark_bn254::Fr::from(2u64));
        assert_ne!(a.challenge(), b.challenge());
    }

    #[test]
    fn test_length_prefix_disambiguates() {
        let mut a = Transcript::new(b"test");
        a.append_bytes(b"ab");
        a.append_bytes(b"c");
        let mut b = Transcript::new(b"test");
        b.append_bytes(b"a");
        b.append_bytes(b"bc");
        assert_ne!(a.challenge(), b.challenge());
    }
}
