//! Explicit VR Little Endian transfer syntax implementation.

use crate::encode::{Encode, Result, WriteHeaderSnafu, WriteTagSnafu};
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmkit_core::{DataElementHeader, Tag};
use snafu::ResultExt;
use std::io::Write;

/// A data element header encoder for the Explicit VR Little Endian
/// transfer syntax.
#[derive(Debug, Default, Clone)]
pub struct ExplicitVRLittleEndianEncoder;

impl Encode for ExplicitVRLittleEndianEncoder {
    fn encode_tag<W>(&self, to: &mut W, tag: Tag) -> Result<()>
    where
        W: ?Sized + Write,
    {
        let mut buf = [0u8; 4];
        LittleEndian::write_u16(&mut buf[0..2], tag.group());
        LittleEndian::write_u16(&mut buf[2..4], tag.element());
        to.write_all(&buf).context(WriteTagSnafu)
    }

    fn encode_element_header<W>(&self, to: &mut W, header: &DataElementHeader) -> Result<usize>
    where
        W: ?Sized + Write,
    {
        let vr_bytes = header.vr.to_bytes();
        if header.vr.has_short_length_form() {
            let mut buf = [0u8; 8];
            LittleEndian::write_u16(&mut buf[0..2], header.tag.group());
            LittleEndian::write_u16(&mut buf[2..4], header.tag.element());
            buf[4] = vr_bytes[0];
            buf[5] = vr_bytes[1];
            LittleEndian::write_u16(&mut buf[6..8], header.len.0 as u16);
            to.write_all(&buf).context(WriteHeaderSnafu)?;
            Ok(8)
        } else {
            let mut buf = [0u8; 12];
            LittleEndian::write_u16(&mut buf[0..2], header.tag.group());
            LittleEndian::write_u16(&mut buf[2..4], header.tag.element());
            buf[4] = vr_bytes[0];
            buf[5] = vr_bytes[1];
            // buf[6..8] is the reserved field, kept zeroed
            LittleEndian::write_u32(&mut buf[8..12], header.len.0);
            to.write_all(&buf).context(WriteHeaderSnafu)?;
            Ok(12)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ExplicitVRLittleEndianEncoder;
    use crate::encode::Encode;
    use dcmkit_core::{DataElementHeader, Length, Tag, VR};

    #[test]
    fn short_form_header() {
        let enc = ExplicitVRLittleEndianEncoder;
        let mut out = Vec::new();
        let n = enc
            .encode_element_header(
                &mut out,
                &DataElementHeader::new(Tag(0x0028, 0x0010), VR::US, Length(2)),
            )
            .unwrap();
        assert_eq!(n, 8);
        assert_eq!(
            out,
            vec![0x28, 0x00, 0x10, 0x00, b'U', b'S', 0x02, 0x00]
        );
    }

    #[test]
    fn long_form_header() {
        let enc = ExplicitVRLittleEndianEncoder;
        let mut out = Vec::new();
        let n = enc
            .encode_element_header(
                &mut out,
                &DataElementHeader::new(Tag(0x7FE0, 0x0010), VR::OW, Length(4)),
            )
            .unwrap();
        assert_eq!(n, 12);
        assert_eq!(
            out,
            vec![
                0xE0, 0x7F, 0x10, 0x00, b'O', b'W', 0x00, 0x00, 0x04, 0x00, 0x00, 0x00
            ]
        );
    }
}
