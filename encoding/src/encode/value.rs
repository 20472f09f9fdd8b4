//! Serialization of primitive values, with the even-length padding the
//! format mandates.

use crate::encode::basic::LittleEndianBasicEncoder;
use crate::encode::{EncodeTextSnafu, Result, WriteValueDataSnafu};
use crate::text::TextCodec;
use dcmkit_core::{PrimitiveValue, VR};
use snafu::ResultExt;
use std::io::Write;

/// Serialize the given value under the given VR, returning the number
/// of bytes written.
///
/// Values of odd byte length receive one trailing padding byte: a space
/// for textual representations, a NUL for UIDs and byte data. The
/// number returned therefore always comes out even and matches
/// [`PrimitiveValue::byte_len`] for values in the default repertoire.
pub fn write_value<W, T>(to: &mut W, vr: VR, value: &PrimitiveValue, text: &T) -> Result<usize>
where
    W: ?Sized + Write,
    T: TextCodec,
{
    let basic = LittleEndianBasicEncoder;
    match value {
        PrimitiveValue::Empty => Ok(0),
        PrimitiveValue::U8(v) => {
            to.write_all(v).context(WriteValueDataSnafu)?;
            pad_if_odd(to, v.len(), 0)
        }
        PrimitiveValue::I16(v) => {
            for x in v {
                basic.encode_ss(&mut *to, *x).context(WriteValueDataSnafu)?;
            }
            Ok(v.len() * 2)
        }
        PrimitiveValue::U16(v) => {
            for x in v {
                basic.encode_us(&mut *to, *x).context(WriteValueDataSnafu)?;
            }
            Ok(v.len() * 2)
        }
        PrimitiveValue::I32(v) => {
            for x in v {
                basic.encode_sl(&mut *to, *x).context(WriteValueDataSnafu)?;
            }
            Ok(v.len() * 4)
        }
        PrimitiveValue::U32(v) => {
            for x in v {
                basic.encode_ul(&mut *to, *x).context(WriteValueDataSnafu)?;
            }
            Ok(v.len() * 4)
        }
        PrimitiveValue::F32(v) => {
            for x in v {
                basic.encode_fl(&mut *to, *x).context(WriteValueDataSnafu)?;
            }
            Ok(v.len() * 4)
        }
        PrimitiveValue::F64(v) => {
            for x in v {
                basic.encode_fd(&mut *to, *x).context(WriteValueDataSnafu)?;
            }
            Ok(v.len() * 8)
        }
        PrimitiveValue::Tags(v) => {
            for t in v {
                basic.encode_tag(&mut *to, *t).context(WriteValueDataSnafu)?;
            }
            Ok(v.len() * 4)
        }
        PrimitiveValue::Str(s) => {
            let bytes = text.encode(s).context(EncodeTextSnafu)?;
            to.write_all(&bytes).context(WriteValueDataSnafu)?;
            pad_if_odd(to, bytes.len(), text_padding(vr))
        }
        PrimitiveValue::Strs(parts) => {
            let mut written = 0;
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    to.write_all(b"\\").context(WriteValueDataSnafu)?;
                    written += 1;
                }
                let bytes = text.encode(part).context(EncodeTextSnafu)?;
                to.write_all(&bytes).context(WriteValueDataSnafu)?;
                written += bytes.len();
            }
            pad_if_odd(to, written, text_padding(vr))
        }
    }
}

fn pad_if_odd<W>(to: &mut W, written: usize, pad: u8) -> Result<usize>
where
    W: ?Sized + Write,
{
    if written & 1 == 1 {
        to.write_all(&[pad]).context(WriteValueDataSnafu)?;
        Ok(written + 1)
    } else {
        Ok(written)
    }
}

// UI values are padded with NUL, all other textual values with space
fn text_padding(vr: VR) -> u8 {
    if vr == VR::UI {
        0
    } else {
        b' '
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::DefaultCharacterSetCodec;
    use smallvec::smallvec;

    #[test]
    fn odd_ui_values_pad_with_nul() {
        let mut out = Vec::new();
        let value = PrimitiveValue::Strs(smallvec!["1.2.840.10008.1.2.1".to_owned()]);
        let n = write_value(&mut out, VR::UI, &value, &DefaultCharacterSetCodec).unwrap();
        assert_eq!(n, 20);
        assert_eq!(out, b"1.2.840.10008.1.2.1\0");
        assert_eq!(n, value.byte_len());
    }

    #[test]
    fn odd_text_values_pad_with_space() {
        let mut out = Vec::new();
        let value = PrimitiveValue::from("MR5");
        let n = write_value(&mut out, VR::CS, &value, &DefaultCharacterSetCodec).unwrap();
        assert_eq!(n, 4);
        assert_eq!(out, b"MR5 ");
    }

    #[test]
    fn multi_valued_strings_join_with_backslash() {
        let mut out = Vec::new();
        let value = PrimitiveValue::Strs(smallvec!["DERIVED".to_owned(), "PRIMARY".to_owned()]);
        let n = write_value(&mut out, VR::CS, &value, &DefaultCharacterSetCodec).unwrap();
        assert_eq!(n, 16);
        assert_eq!(out, b"DERIVED\\PRIMARY ");
    }

    #[test]
    fn binary_values_write_little_endian() {
        let mut out = Vec::new();
        let value = PrimitiveValue::from(vec![512u16, 1]);
        let n = write_value(&mut out, VR::US, &value, &DefaultCharacterSetCodec).unwrap();
        assert_eq!(n, 4);
        assert_eq!(out, vec![0x00, 0x02, 0x01, 0x00]);
    }

    #[test]
    fn odd_byte_data_pads_with_nul() {
        let mut out = Vec::new();
        let value = PrimitiveValue::from(vec![0xABu8, 0xCD, 0xEF]);
        let n = write_value(&mut out, VR::OB, &value, &DefaultCharacterSetCodec).unwrap();
        assert_eq!(n, 4);
        assert_eq!(out, vec![0xAB, 0xCD, 0xEF, 0x00]);
    }
}
