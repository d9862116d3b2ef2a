//! Numeric codec (spec C1, §4.1): encode/decode a single point and walk a
//! row's concatenated `(qualifier, value)` pairs.

pub mod qualifier;
pub mod rollup;
pub mod value;

use crate::error::CodecError;
use crate::timestamp::TimeStamp;
use crate::types::Numeric;
use qualifier::{DecodedQualifier, Flags};

/// Minimal integer length (in bytes) that can hold `v`.
fn min_int_len(v: i64) -> usize {
    if v >= i8::MIN as i64 && v <= i8::MAX as i64 {
        1
    } else if v >= i16::MIN as i64 && v <= i16::MAX as i64 {
        2
    } else if v >= i32::MIN as i64 && v <= i32::MAX as i64 {
        4
    } else {
        8
    }
}

/// Encode a single `(timestamp, value)` point relative to `base`, appending
/// the qualifier and value bytes to `out` (spec §4.1).
pub fn encode_point(
    base: &TimeStamp,
    t: &TimeStamp,
    value: &Numeric,
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    let offset_ns = (t.epoch_sec - base.epoch_sec) * 1_000_000_000 + t.nanos as i64
        - base.nanos as i64;
    let (is_float, len) = match value {
        Numeric::Long(v) => (false, min_int_len(*v)),
        Numeric::Double(_) => (true, 8),
    };
    let flags = Flags {
        is_float,
        value_len: len,
    };
    qualifier::encode(offset_ns, flags, out)?;
    value::encode(value, len, out);
    tracing::trace!(offset_ns, len, is_float, "encoded point");
    Ok(())
}

/// One decoded point plus the byte width (qualifier + value) it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPoint {
    pub offset_ns: i64,
    pub value: Numeric,
    pub width: usize,
}

/// Decode the point beginning at `data[offset..]`.
pub fn decode_point(data: &[u8], offset: usize) -> Result<DecodedPoint, CodecError> {
    let DecodedQualifier {
        offset_ns,
        flags,
        qualifier_width,
        ..
    } = qualifier::decode(data, offset).map_err(|e| {
        tracing::warn!(offset, error = %e, "malformed qualifier");
        e
    })?;
    let value = value::decode(data, offset + qualifier_width, flags.value_len, flags.is_float)?;
    tracing::trace!(offset, offset_ns, width = qualifier_width + flags.value_len, "decoded point");
    Ok(DecodedPoint {
        offset_ns,
        value,
        width: qualifier_width + flags.value_len,
    })
}

/// Decode every point in `data`, in order. Used by tests and by
/// [`crate::storage::span`] when walking a row forward.
pub fn decode_all(data: &[u8]) -> Result<Vec<DecodedPoint>, CodecError> {
    let mut out = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        let point = decode_point(data, offset)?;
        offset += point.width;
        out.push(point);
    }
    Ok(out)
}
