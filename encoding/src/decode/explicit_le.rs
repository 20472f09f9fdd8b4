//! Explicit VR Little Endian transfer syntax implementation.

use crate::decode::{
    read_tag_or_eof, Decode, ReadLengthSnafu, ReadReservedSnafu, ReadTagSnafu, ReadVrSnafu, Result,
};
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmkit_core::{DataElementHeader, Length, Tag, VR};
use snafu::ResultExt;
use std::io::Read;

/// A data element header decoder for the Explicit VR Little Endian
/// transfer syntax.
#[derive(Debug, Default, Clone)]
pub struct ExplicitVRLittleEndianDecoder;

impl Decode for ExplicitVRLittleEndianDecoder {
    fn decode_header<S>(&self, source: &mut S) -> Result<Option<(DataElementHeader, usize)>>
    where
        S: ?Sized + Read,
    {
        let tag = match read_tag_or_eof(source)? {
            None => return Ok(None),
            Some(tag) => tag,
        };

        let mut buf = [0u8; 4];
        if tag.group() == 0xFFFE {
            // item and delimitation headers carry no VR or reserved field
            source.read_exact(&mut buf).context(ReadLengthSnafu)?;
            let len = LittleEndian::read_u32(&buf);
            return Ok(Some((
                DataElementHeader::new(tag, VR::UN, Length(len)),
                8, // tag + len
            )));
        }

        source.read_exact(&mut buf[0..2]).context(ReadVrSnafu)?;
        let vr = VR::from_binary([buf[0], buf[1]]).unwrap_or(VR::UN);

        // PS3.5 7.1.2: short-form VRs carry a 16-bit length right after
        // the VR field; all others have two reserved bytes followed by a
        // 32-bit length.
        let (len, bytes_read) = if vr.has_short_length_form() {
            source.read_exact(&mut buf[0..2]).context(ReadLengthSnafu)?;
            (u32::from(LittleEndian::read_u16(&buf[0..2])), 8)
        } else {
            source
                .read_exact(&mut buf[0..2])
                .context(ReadReservedSnafu)?;
            source.read_exact(&mut buf).context(ReadLengthSnafu)?;
            (LittleEndian::read_u32(&buf), 12)
        };

        Ok(Some((
            DataElementHeader::new(tag, vr, Length(len)),
            bytes_read,
        )))
    }

    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadTagSnafu)?;
        Ok(Tag(
            LittleEndian::read_u16(&buf[0..2]),
            LittleEndian::read_u16(&buf[2..4]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::ExplicitVRLittleEndianDecoder;
    use crate::decode::Decode;
    use dcmkit_core::{Length, Tag, VR};
    use std::io::Cursor;

    // manually crafted data elements
    #[rustfmt::skip]
    const RAW: &[u8] = &[
        0x02, 0x00, 0x02, 0x00,     // (0002,0002) Media Storage SOP Class UID
            b'U', b'I',             // VR: UI
            0x1A, 0x00,             // Length: 26 bytes
                b'1', b'.', b'2', b'.', b'8', b'4', b'0', b'.', b'1', b'0', b'0', b'0', b'8', b'.',
                b'5', b'.', b'1', b'.', b'4', b'.', b'1', b'.', b'1', b'.', b'1',
                0x00,               // padding to even length
        0x28, 0x00, 0x10, 0x00,     // (0028,0010) Rows
            b'U', b'S',             // VR: US
            0x02, 0x00,             // Length: 2 bytes
                0x00, 0x02,         // 512
        0xE0, 0x7F, 0x10, 0x00,     // (7FE0,0010) Pixel Data
            b'O', b'W',             // VR: OW
            0x00, 0x00,             // reserved
            0x04, 0x00, 0x00, 0x00, // Length: 4 bytes
                0x01, 0x00, 0x02, 0x00,
    ];

    #[test]
    fn decode_headers() {
        let dec = ExplicitVRLittleEndianDecoder;
        let mut cursor = Cursor::new(RAW);

        let (header, n) = dec.decode_header(&mut cursor).unwrap().unwrap();
        assert_eq!(n, 8);
        assert_eq!(header.tag, Tag(0x0002, 0x0002));
        assert_eq!(header.vr, VR::UI);
        assert_eq!(header.len, Length(26));
        std::io::copy(&mut std::io::Read::take(&mut cursor, 26), &mut std::io::sink()).unwrap();

        let (header, n) = dec.decode_header(&mut cursor).unwrap().unwrap();
        assert_eq!(n, 8);
        assert_eq!(header.tag, Tag(0x0028, 0x0010));
        assert_eq!(header.vr, VR::US);
        assert_eq!(header.len, Length(2));
        std::io::copy(&mut std::io::Read::take(&mut cursor, 2), &mut std::io::sink()).unwrap();

        // long form: reserved bytes and a 32-bit length
        let (header, n) = dec.decode_header(&mut cursor).unwrap().unwrap();
        assert_eq!(n, 12);
        assert_eq!(header.tag, Tag(0x7FE0, 0x0010));
        assert_eq!(header.vr, VR::OW);
        assert_eq!(header.len, Length(4));
    }

    #[test]
    fn clean_eof_yields_none() {
        let dec = ExplicitVRLittleEndianDecoder;
        let mut cursor = Cursor::new(&[][..]);
        assert!(dec.decode_header(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn truncated_header_is_an_error() {
        let dec = ExplicitVRLittleEndianDecoder;
        // two bytes of a tag, then nothing
        let mut cursor = Cursor::new(&[0x08, 0x00][..]);
        assert!(dec.decode_header(&mut cursor).is_err());
        // a full tag but no VR
        let mut cursor = Cursor::new(&[0x08, 0x00, 0x60, 0x00][..]);
        assert!(dec.decode_header(&mut cursor).is_err());
    }
}
