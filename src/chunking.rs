//! Chunking policy: the atomic unit of payload data.
//!
//! A chunk is the largest byte string that always fits one BN254 scalar
//! without reduction.  Payloads handed to the encoder must be a non-empty
//! whole number of chunks; [`pad_to_chunk_size`] is provided for callers
//! whose data does not already line up.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};

use crate::error::{engine_failure, DaError, EngineResult, ResultCode};

/// Bytes per chunk.  The BN254 scalar modulus is just under 2^254, so 31
/// bytes (248 bits) always encode to a distinct field element.
pub const CHUNK_SIZE: usize = 31;

/// Returns the maximum number of payload bytes carried by one field element.
pub fn max_chunk_size() -> usize {
    CHUNK_SIZE
}

/// Checks the chunking rule and returns the number of chunks in `payload`.
pub fn validate_payload(payload: &[u8]) -> Result<usize, DaError> {
    check_payload("validate_payload", payload)
}

pub(crate) fn check_payload(operation: &'static str, payload: &[u8]) -> Result<usize, DaError> {
    if payload.is_empty() {
        return Err(DaError::invalid_input(
            operation,
            format!("data length must be greater than 0, got 0 (chunk_size: {CHUNK_SIZE})"),
        ));
    }
    if payload.len() % CHUNK_SIZE != 0 {
        return Err(DaError::invalid_input(
            operation,
            format!(
                "data length {} is not a multiple of the chunk size {CHUNK_SIZE}",
                payload.len()
            ),
        ));
    }
    Ok(payload.len() / CHUNK_SIZE)
}

/// Zero-pads `data` up to the next multiple of [`CHUNK_SIZE`].
///
/// Data that is already aligned is returned unchanged.  Empty input is
/// rejected because the encoder rejects empty payloads as well.
pub fn pad_to_chunk_size(data: &[u8]) -> Result<Vec<u8>, DaError> {
    if data.is_empty() {
        return Err(DaError::invalid_input(
            "pad_to_chunk_size",
            format!("data length must be greater than 0, got 0 (chunk_size: {CHUNK_SIZE})"),
        ));
    }
    let padded_len = data.len().div_ceil(CHUNK_SIZE) * CHUNK_SIZE;
    let mut padded = Vec::new();
    padded.try_reserve_exact(padded_len).map_err(|err| {
        DaError::allocation(
            "pad_to_chunk_size",
            format!("cannot allocate {padded_len} bytes: {err}"),
        )
    })?;
    padded.extend_from_slice(data);
    padded.resize(padded_len, 0);
    Ok(padded)
}

/// Maps each chunk of an already validated payload to a scalar.
pub(crate) fn bytes_to_elements(payload: &[u8]) -> Vec<Fr> {
    payload
        .chunks(CHUNK_SIZE)
        .map(Fr::from_le_bytes_mod_order)
        .collect()
}

/// Inverse of [`bytes_to_elements`].  Fails if an element does not fit in a
/// chunk, which only happens for data that was never produced by encoding.
pub(crate) fn elements_to_bytes(elements: &[Fr]) -> EngineResult<Vec<u8>> {
    let mut out = Vec::with_capacity(elements.len() * CHUNK_SIZE);
    for (position, element) in elements.iter().enumerate() {
        let bytes = element.into_bigint().to_bytes_le();
        if bytes[CHUNK_SIZE..].iter().any(|byte| *byte != 0) {
            return engine_failure(
                ResultCode::InternalError,
                format!("element {position} exceeds the {CHUNK_SIZE}-byte chunk width"),
            );
        }
        out.extend_from_slice(&bytes[..CHUNK_SIZE]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        (1..=len).map(|i| (i % 256) as u8).collect()
    }

    #[test]
    fn test_validate_accepts_whole_chunks() {
        assert_eq!(validate_payload(&sample(CHUNK_SIZE)).unwrap(), 1);
        assert_eq!(validate_payload(&sample(CHUNK_SIZE * 10)).unwrap(), 10);
    }

    #[test]
    fn test_validate_rejects_empty_and_partial() {
        let empty = validate_payload(&[]).unwrap_err();
        assert!(empty.is_invalid_input());

        let partial = validate_payload(&sample(CHUNK_SIZE + 1)).unwrap_err();
        let detail = partial.detail().unwrap();
        assert!(detail.contains("32"), "{detail}");
        assert!(detail.contains("31"), "{detail}");
    }

    #[test]
    fn test_pad_to_chunk_size() {
        let data = sample(40);
        let padded = pad_to_chunk_size(&data).unwrap();
        assert_eq!(padded.len(), 2 * CHUNK_SIZE);
        assert_eq!(&padded[..40], data.as_slice());
        assert!(padded[40..].iter().all(|b| *b == 0));

        let aligned = sample(CHUNK_SIZE);
        assert_eq!(pad_to_chunk_size(&aligned).unwrap(), aligned);
        assert!(pad_to_chunk_size(&[]).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_elements_round_trip() {
        let mut data = sample(CHUNK_SIZE * 3);
        data[..CHUNK_SIZE].fill(0xff);
        let elements = bytes_to_elements(&data);
        assert_eq!(elements.len(), 3);
        assert_eq!(elements_to_bytes(&elements).unwrap(), data);
    }

    #[test]
    fn test_oversized_element_rejected() {
        let wide = -Fr::from(1u64);
        assert_eq!(elements_to_bytes(&[wide]), Err(ResultCode::InternalError));
        assert!(crate::error::take_last_error().is_some());
    }
}
