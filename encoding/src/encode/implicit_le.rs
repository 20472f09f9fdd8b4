//! Implicit VR Little Endian transfer syntax implementation.

use crate::encode::{Encode, Result, WriteHeaderSnafu, WriteTagSnafu};
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmkit_core::{DataElementHeader, Tag};
use snafu::ResultExt;
use std::io::Write;

/// A data element header encoder for the Implicit VR Little Endian
/// transfer syntax. The value representation is not written.
#[derive(Debug, Default, Clone)]
pub struct ImplicitVRLittleEndianEncoder;

impl Encode for ImplicitVRLittleEndianEncoder {
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
        let mut buf = [0u8; 8];
        LittleEndian::write_u16(&mut buf[0..2], header.tag.group());
        LittleEndian::write_u16(&mut buf[2..4], header.tag.element());
        LittleEndian::write_u32(&mut buf[4..8], header.len.0);
        to.write_all(&buf).context(WriteHeaderSnafu)?;
        Ok(8)
    }
}

#[cfg(test)]
mod tests {
    use super::ImplicitVRLittleEndianEncoder;
    use crate::encode::Encode;
    use dcmkit_core::{DataElementHeader, Length, Tag, VR};

    #[test]
    fn header_is_tag_plus_length() {
        let enc = ImplicitVRLittleEndianEncoder;
        let mut out = Vec::new();
        let n = enc
            .encode_element_header(
                &mut out,
                &DataElementHeader::new(Tag(0x0010, 0x0010), VR::PN, Length(8)),
            )
            .unwrap();
        assert_eq!(n, 8);
        assert_eq!(
            out,
            vec![0x10, 0x00, 0x10, 0x00, 0x08, 0x00, 0x00, 0x00]
        );
    }
}
