//! Materialization of primitive values from a stream, given a decoded
//! element header.

use crate::decode::basic::LittleEndianBasicDecoder;
use crate::text::{TextCodec, TextCodecError};
use dcmkit_core::value::C;
use dcmkit_core::{DataElementHeader, PrimitiveValue, Tag, VR};
use smallvec::smallvec;
use snafu::{ensure, OptionExt, ResultExt, Snafu};
use std::io::Read;

/// An error raised while reading an element's value bytes.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// Failed to fetch the value bytes from the source.
    #[snafu(display("failed to read {} value bytes of element {}", len, tag))]
    ReadValueData {
        tag: Tag,
        len: u32,
        source: std::io::Error,
    },

    /// The header declares an undefined length, which cannot be
    /// materialized directly.
    #[snafu(display("undefined length in element {} cannot be read as a primitive value", tag))]
    UndefinedLength { tag: Tag },

    /// The declared length is not a multiple of the VR's element width.
    #[snafu(display(
        "length {} of element {} is inconsistent with VR {}",
        len, tag, vr
    ))]
    InvalidLength { tag: Tag, len: u32, vr: VR },

    /// The value's text could not be decoded.
    #[snafu(display("failed to decode text of element {}", tag))]
    DecodeText { tag: Tag, source: TextCodecError },
}

/// Result alias for value reading.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Read the value of the given element header from the source,
/// materializing it according to the header's value representation.
///
/// The full declared length is consumed from the source. Trailing
/// padding of textual values is stripped. The header's length must be
/// defined; delimited content is the caller's concern.
pub fn read_value<S, T>(
    source: &mut S,
    header: &DataElementHeader,
    text: &T,
) -> Result<PrimitiveValue>
where
    S: ?Sized + Read,
    T: TextCodec,
{
    let tag = header.tag;
    let len = header.len.get().context(UndefinedLengthSnafu { tag })? as usize;
    if len == 0 {
        return Ok(PrimitiveValue::Empty);
    }

    let basic = LittleEndianBasicDecoder;
    match header.vr {
        VR::AT => {
            check_width(tag, header.vr, len, 4)?;
            collect(source, tag, len, len / 4, |s| basic.decode_tag(s)).map(PrimitiveValue::Tags)
        }
        VR::FL | VR::OF => {
            check_width(tag, header.vr, len, 4)?;
            collect(source, tag, len, len / 4, |s| basic.decode_fl(s)).map(PrimitiveValue::F32)
        }
        VR::FD | VR::OD => {
            check_width(tag, header.vr, len, 8)?;
            collect(source, tag, len, len / 8, |s| basic.decode_fd(s)).map(PrimitiveValue::F64)
        }
        VR::SS => {
            check_width(tag, header.vr, len, 2)?;
            collect(source, tag, len, len / 2, |s| basic.decode_ss(s)).map(PrimitiveValue::I16)
        }
        VR::US | VR::OW => {
            check_width(tag, header.vr, len, 2)?;
            collect(source, tag, len, len / 2, |s| basic.decode_us(s)).map(PrimitiveValue::U16)
        }
        VR::SL => {
            check_width(tag, header.vr, len, 4)?;
            collect(source, tag, len, len / 4, |s| basic.decode_sl(s)).map(PrimitiveValue::I32)
        }
        VR::UL | VR::OL => {
            check_width(tag, header.vr, len, 4)?;
            collect(source, tag, len, len / 4, |s| basic.decode_ul(s)).map(PrimitiveValue::U32)
        }
        vr if vr.is_multi_text() => {
            let buf = read_exactly(source, tag, len)?;
            let parts: Result<C<String>> = buf
                .split(|b| *b == b'\\')
                .map(|part| {
                    text.decode(part)
                        .map(|s| s.trim_end_matches([' ', '\0']).to_owned())
                        .context(DecodeTextSnafu { tag })
                })
                .collect();
            Ok(PrimitiveValue::Strs(parts?))
        }
        VR::LT | VR::ST | VR::UT | VR::UR => {
            let buf = read_exactly(source, tag, len)?;
            let s = text.decode(&buf).context(DecodeTextSnafu { tag })?;
            Ok(PrimitiveValue::Str(
                s.trim_end_matches([' ', '\0']).to_owned(),
            ))
        }
        // OB, UN and opaque content: keep the raw bytes
        _ => {
            let buf = read_exactly(source, tag, len)?;
            Ok(PrimitiveValue::U8(C::from_vec(buf)))
        }
    }
}

fn check_width(tag: Tag, vr: VR, len: usize, width: usize) -> Result<()> {
    ensure!(
        len % width == 0,
        InvalidLengthSnafu {
            tag,
            len: len as u32,
            vr,
        }
    );
    Ok(())
}

fn read_exactly<S>(source: &mut S, tag: Tag, len: usize) -> Result<Vec<u8>>
where
    S: ?Sized + Read,
{
    let mut buf = vec![0u8; len];
    source.read_exact(&mut buf).context(ReadValueDataSnafu {
        tag,
        len: len as u32,
    })?;
    Ok(buf)
}

fn collect<S, T>(
    source: &mut S,
    tag: Tag,
    len: usize,
    n: usize,
    mut decode_one: impl FnMut(&mut S) -> std::io::Result<T>,
) -> Result<C<T>>
where
    S: ?Sized + Read,
{
    let mut out: C<T> = smallvec![];
    out.reserve(n);
    for _ in 0..n {
        out.push(decode_one(source).context(ReadValueDataSnafu {
            tag,
            len: len as u32,
        })?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::DefaultCharacterSetCodec;
    use dcmkit_core::Length;
    use std::io::Cursor;

    fn header(tag: Tag, vr: VR, len: u32) -> DataElementHeader {
        DataElementHeader::new(tag, vr, Length(len))
    }

    #[test]
    fn read_multi_valued_text() {
        let mut cursor = Cursor::new(&b"DERIVED\\PRIMARY "[..]);
        let v = read_value(
            &mut cursor,
            &header(Tag(0x0008, 0x0008), VR::CS, 16),
            &DefaultCharacterSetCodec,
        )
        .unwrap();
        assert_eq!(
            v.strings().unwrap(),
            &["DERIVED".to_owned(), "PRIMARY".to_owned()]
        );
    }

    #[test]
    fn read_binary_floats() {
        let mut bytes = Vec::new();
        for v in [0.5f32, -1.5, 2.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let mut cursor = Cursor::new(bytes);
        let v = read_value(
            &mut cursor,
            &header(Tag(0x0010, 0x9431), VR::FL, 12),
            &DefaultCharacterSetCodec,
        )
        .unwrap();
        assert_eq!(v.float32_slice().unwrap(), &[0.5, -1.5, 2.0]);
    }

    #[test]
    fn length_must_match_the_element_width() {
        let mut cursor = Cursor::new(vec![0u8; 5]);
        let err = read_value(
            &mut cursor,
            &header(Tag(0x0028, 0x0010), VR::US, 5),
            &DefaultCharacterSetCodec,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidLength { .. }));
    }

    #[test]
    fn truncated_value_is_an_error() {
        let mut cursor = Cursor::new(&b"ab"[..]);
        let err = read_value(
            &mut cursor,
            &header(Tag(0x0010, 0x0020), VR::LO, 8),
            &DefaultCharacterSetCodec,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ReadValueData { .. }));
    }

    #[test]
    fn ui_padding_is_stripped() {
        let mut cursor = Cursor::new(&b"1.2.840.10008.1.2.1\0"[..]);
        let v = read_value(
            &mut cursor,
            &header(Tag(0x0002, 0x0010), VR::UI, 20),
            &DefaultCharacterSetCodec,
        )
        .unwrap();
        assert_eq!(v.to_str(), "1.2.840.10008.1.2.1");
    }
}
