//! Value serialization: big-endian signed integers of length 1/2/4/8 bytes,
//! or IEEE-754 floats of length 4/8 bytes (spec §4.1).

use crate::error::CodecError;
use crate::types::Numeric;
use byteorder::{BigEndian, ByteOrder};

/// Serialize `value` as `len` big-endian bytes, appending to `out`.
///
/// `len` must be one of 1, 2, 4, 8 for integers or 4, 8 for floats; this is
/// enforced by construction via [`Flags`](super::qualifier::Flags) at the
/// call site, not re-validated here.
pub fn encode(value: &Numeric, len: usize, out: &mut Vec<u8>) {
    match value {
        Numeric::Long(v) => match len {
            1 => out.push(*v as i8 as u8),
            2 => {
                let mut buf = [0u8; 2];
                BigEndian::write_i16(&mut buf, *v as i16);
                out.extend_from_slice(&buf);
            }
            4 => {
                let mut buf = [0u8; 4];
                BigEndian::write_i32(&mut buf, *v as i32);
                out.extend_from_slice(&buf);
            }
            _ => {
                let mut buf = [0u8; 8];
                BigEndian::write_i64(&mut buf, *v);
                out.extend_from_slice(&buf);
            }
        },
        Numeric::Double(v) => {
            if len == 4 {
                let mut buf = [0u8; 4];
                BigEndian::write_f32(&mut buf, *v as f32);
                out.extend_from_slice(&buf);
            } else {
                let mut buf = [0u8; 8];
                BigEndian::write_f64(&mut buf, *v);
                out.extend_from_slice(&buf);
            }
        }
    }
}

/// Decode a value of `len` bytes at `data[offset..]`, interpreting it as an
/// integer or float per `is_float`.
pub fn decode(
    data: &[u8],
    offset: usize,
    len: usize,
    is_float: bool,
) -> Result<Numeric, CodecError> {
    if data.len() < offset + len {
        return Err(CodecError::Truncated {
            offset,
            needed: len,
            available: data.len().saturating_sub(offset),
        });
    }
    let slice = &data[offset..offset + len];
    if is_float {
        match len {
            4 => Ok(Numeric::Double(BigEndian::read_f32(slice) as f64)),
            8 => Ok(Numeric::Double(BigEndian::read_f64(slice))),
            _ => Err(CodecError::ValueLengthMismatch {
                offset,
                expected: 4,
                actual: len,
            }),
        }
    } else {
        let v = match len {
            1 => slice[0] as i8 as i64,
            2 => BigEndian::read_i16(slice) as i64,
            4 => BigEndian::read_i32(slice) as i64,
            8 => BigEndian::read_i64(slice),
            other => {
                return Err(CodecError::ValueLengthMismatch {
                    offset,
                    expected: 8,
                    actual: other,
                })
            }
        };
        Ok(Numeric::Long(v))
    }
}
