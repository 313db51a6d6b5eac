//! Binary wire format for moving payload summaries, share indices and
//! primitive values across a process boundary.
//!
//! Every value travels inside an envelope: an 8-byte little-endian length
//! followed by exactly that many payload bytes.  Integers are written as
//! fixed-width little-endian words.  An encoded payload is summarised as
//!
//! ```text
//! envelope( [u32 LE data length][data][u32 LE share count] )
//! ```
//!
//! and a share as `envelope([u16 LE index])`.  Share columns and proofs are
//! not carried by this format.  Decoding checks every declared length
//! against the bytes actually present and rejects trailing data.

use thiserror::Error;

use crate::encoder::EncodedPayload;
use crate::error::DaError;
use crate::share::Share;

/// Malformed input at the serialization boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The buffer ended before a fixed-width field.
    #[error("insufficient bytes: needed {needed}, available {available}")]
    InsufficientBytes {
        /// Bytes the field requires.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },
    /// A length prefix points past the end of the buffer.
    #[error("declared length {declared} exceeds the {available} available bytes")]
    LengthOverflow {
        /// Length announced by the prefix.
        declared: u64,
        /// Bytes left in the buffer.
        available: usize,
    },
    /// Bytes remained after the value was decoded.
    #[error("{0} trailing bytes after the encoded value")]
    TrailingBytes(usize),
    /// A value does not fit the type it is read into or written as.
    #[error("value {value} does not fit in {target}")]
    OutOfRange {
        /// Offending value.
        value: u64,
        /// Name of the target type.
        target: &'static str,
    },
}

/// Fixed-width little-endian primitive.
pub trait WireValue: Sized {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Appends the little-endian representation to `out`.
    fn write_le(&self, out: &mut Vec<u8>);

    /// Decodes from exactly [`Self::WIDTH`] bytes.
    fn read_le(bytes: &[u8]) -> Result<Self, CodecError>;
}

macro_rules! impl_wire_value {
    ($($ty:ty),*) => {
        $(
            impl WireValue for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn write_le(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Result<Self, CodecError> {
                    let raw: [u8; std::mem::size_of::<$ty>()] =
                        bytes.try_into().map_err(|_| CodecError::InsufficientBytes {
                            needed: Self::WIDTH,
                            available: bytes.len(),
                        })?;
                    Ok(<$ty>::from_le_bytes(raw))
                }
            }
        )*
    };
}

impl_wire_value!(u16, u32, u64);

/// `usize` travels as a `u64` so the format does not depend on the platform.
impl WireValue for usize {
    const WIDTH: usize = 8;

    fn write_le(&self, out: &mut Vec<u8>) {
        (*self as u64).write_le(out);
    }

    fn read_le(bytes: &[u8]) -> Result<Self, CodecError> {
        let value = u64::read_le(bytes)?;
        usize::try_from(value).map_err(|_| CodecError::OutOfRange {
            value,
            target: "usize",
        })
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if len > self.bytes.len() {
            return Err(CodecError::InsufficientBytes {
                needed: len,
                available: self.bytes.len(),
            });
        }
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    fn read<T: WireValue>(&mut self) -> Result<T, CodecError> {
        T::read_le(self.take(T::WIDTH)?)
    }

    /// Reads a length prefix of type `T` and returns that many bytes.
    fn read_prefixed<T: WireValue + Into<u64>>(&mut self) -> Result<&'a [u8], CodecError> {
        let declared: u64 = self.read::<T>()?.into();
        let available = self.bytes.len();
        match usize::try_from(declared) {
            Ok(len) if len <= available => self.take(len),
            _ => Err(CodecError::LengthOverflow {
                declared,
                available,
            }),
        }
    }

    fn finish(self) -> Result<(), CodecError> {
        match self.bytes.len() {
            0 => Ok(()),
            extra => Err(CodecError::TrailingBytes(extra)),
        }
    }
}

/// Prefixes `payload` with its length as a little-endian `u64`.
pub fn wrap_envelope(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + payload.len());
    (payload.len() as u64).write_le(&mut out);
    out.extend_from_slice(payload);
    out
}

/// Returns the payload of a single envelope spanning all of `bytes`.
pub fn open_envelope(bytes: &[u8]) -> Result<&[u8], CodecError> {
    let mut reader = Reader::new(bytes);
    let payload = reader.read_prefixed::<u64>()?;
    reader.finish()?;
    Ok(payload)
}

/// Encodes a primitive as an enveloped little-endian word.
pub fn serialize_value<T: WireValue>(value: &T) -> Vec<u8> {
    let mut inner = Vec::with_capacity(T::WIDTH);
    value.write_le(&mut inner);
    wrap_envelope(&inner)
}

/// Inverse of [`serialize_value`].
pub fn deserialize_value<T: WireValue>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut reader = Reader::new(open_envelope(bytes)?);
    let value = reader.read::<T>()?;
    reader.finish()?;
    Ok(value)
}

/// Encodes the index of `share`.
pub fn serialize_share_index(share: &Share) -> Result<Vec<u8>, DaError> {
    let index = share.state("serialize_share")?.index;
    let index = u16::try_from(index).map_err(|_| CodecError::OutOfRange {
        value: index as u64,
        target: "u16",
    })?;
    Ok(serialize_value(&index))
}

/// Decodes a share index written by [`serialize_share_index`].
pub fn deserialize_share_index(bytes: &[u8]) -> Result<u16, CodecError> {
    deserialize_value(bytes)
}

/// Transportable summary of an encoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSummary {
    /// Original payload bytes.
    pub data: Vec<u8>,
    /// Number of shares the payload was encoded into.
    pub share_count: u32,
}

/// Encodes a payload summary.
pub fn serialize_payload_summary(summary: &PayloadSummary) -> Result<Vec<u8>, CodecError> {
    let len = u32::try_from(summary.data.len()).map_err(|_| CodecError::OutOfRange {
        value: summary.data.len() as u64,
        target: "u32",
    })?;
    let mut inner = Vec::with_capacity(8 + summary.data.len());
    len.write_le(&mut inner);
    inner.extend_from_slice(&summary.data);
    summary.share_count.write_le(&mut inner);
    Ok(wrap_envelope(&inner))
}

/// Decodes a payload summary, checking the declared data length.
pub fn deserialize_payload_summary(bytes: &[u8]) -> Result<PayloadSummary, CodecError> {
    let mut reader = Reader::new(open_envelope(bytes)?);
    let data = reader.read_prefixed::<u32>()?.to_vec();
    let share_count = reader.read::<u32>()?;
    reader.finish()?;
    Ok(PayloadSummary { data, share_count })
}

/// Encodes the summary of a live encoded payload.
pub fn serialize_encoded_payload(payload: &EncodedPayload) -> Result<Vec<u8>, DaError> {
    let share_count = payload.share_count();
    let summary = PayloadSummary {
        data: payload.get_data()?,
        share_count: u32::try_from(share_count).map_err(|_| CodecError::OutOfRange {
            value: share_count as u64,
            target: "u32",
        })?,
    };
    serialize_payload_summary(&summary).map_err(DaError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_layout() {
        let bytes = serialize_value(&0x0102u16);
        assert_eq!(bytes, vec![2, 0, 0, 0, 0, 0, 0, 0, 0x02, 0x01]);
        assert_eq!(deserialize_value::<u16>(&bytes).unwrap(), 0x0102);
    }

    #[test]
    fn test_share_index_boundaries() {
        for index in [0u16, 1, 255, 256, u16::MAX] {
            let bytes = serialize_value(&index);
            assert_eq!(deserialize_share_index(&bytes).unwrap(), index);
        }
    }

    #[test]
    fn test_summary_layout() {
        let summary = PayloadSummary {
            data: vec![0xaa, 0xbb],
            share_count: 4,
        };
        let bytes = serialize_payload_summary(&summary).unwrap();
        assert_eq!(&bytes[..8], &10u64.to_le_bytes());
        assert_eq!(&bytes[8..12], &2u32.to_le_bytes());
        assert_eq!(&bytes[12..14], &[0xaa, 0xbb]);
        assert_eq!(&bytes[14..], &4u32.to_le_bytes());
        assert_eq!(deserialize_payload_summary(&bytes).unwrap(), summary);
    }

    #[test]
    fn test_short_buffers_are_rejected() {
        assert_eq!(
            open_envelope(&[1, 0, 0]),
            Err(CodecError::InsufficientBytes {
                needed: 8,
                available: 3
            })
        );
        let mut bytes = serialize_value(&7u32);
        bytes.pop();
        assert!(matches!(
            deserialize_value::<u32>(&bytes),
            Err(CodecError::LengthOverflow { declared: 4, available: 3 })
        ));
    }

    #[test]
    fn test_inner_length_is_checked() {
        // Envelope claims 6 bytes; inner data length claims 100.
        let mut inner = Vec::new();
        100u32.write_le(&mut inner);
        inner.extend_from_slice(&[1, 2]);
        let bytes = wrap_envelope(&inner);
        assert_eq!(
            deserialize_payload_summary(&bytes),
            Err(CodecError::LengthOverflow {
                declared: 100,
                available: 2
            })
        );
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let mut bytes = serialize_value(&9u64);
        bytes.push(0);
        assert_eq!(
            deserialize_value::<u64>(&bytes),
            Err(CodecError::TrailingBytes(1))
        );
        let wide = wrap_envelope(&[0u8; 4]);
        assert_eq!(
            deserialize_value::<u16>(&wide),
            Err(CodecError::TrailingBytes(2))
        );
    }

    #[test]
    fn test_usize_travels_as_u64() {
        let bytes = serialize_value(&300usize);
        assert_eq!(bytes.len(), 16);
        assert_eq!(deserialize_value::<u64>(&bytes).unwrap(), 300);
        assert_eq!(deserialize_value::<usize>(&bytes).unwrap(), 300);
    }
}
