//! Implicit VR Little Endian transfer syntax implementation.

use crate::decode::{read_tag_or_eof, Decode, ReadLengthSnafu, ReadTagSnafu, Result};
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmkit_core::{DataDictionary, DataElementHeader, Length, StandardDictionary, Tag, VR};
use snafu::ResultExt;
use std::fmt;
use std::io::Read;

/// A data element header decoder for the Implicit VR Little Endian
/// transfer syntax.
///
/// Headers in this syntax carry no value representation, so the decoder
/// holds a data dictionary to resolve each tag's registered VR.
/// Unregistered attributes decode as `UN`.
pub struct ImplicitVRLittleEndianDecoder<D = StandardDictionary> {
    dict: D,
}

impl<D> fmt::Debug for ImplicitVRLittleEndianDecoder<D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ImplicitVRLittleEndianDecoder")
            .field("dict", &"«omitted»")
            .finish()
    }
}

impl ImplicitVRLittleEndianDecoder<StandardDictionary> {
    /// Retrieve this decoder using the standard data dictionary.
    pub fn new() -> Self {
        ImplicitVRLittleEndianDecoder {
            dict: StandardDictionary,
        }
    }
}

impl Default for ImplicitVRLittleEndianDecoder<StandardDictionary> {
    fn default() -> Self {
        ImplicitVRLittleEndianDecoder::new()
    }
}

impl<D> ImplicitVRLittleEndianDecoder<D>
where
    D: DataDictionary,
{
    /// Retrieve this decoder using a custom data dictionary.
    pub fn with_dict(dictionary: D) -> Self {
        ImplicitVRLittleEndianDecoder { dict: dictionary }
    }
}

impl<D> Decode for ImplicitVRLittleEndianDecoder<D>
where
    D: DataDictionary,
{
    fn decode_header<S>(&self, source: &mut S) -> Result<Option<(DataElementHeader, usize)>>
    where
        S: ?Sized + Read,
    {
        let tag = match read_tag_or_eof(source)? {
            None => return Ok(None),
            Some(tag) => tag,
        };

        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadLengthSnafu)?;
        let len = LittleEndian::read_u32(&buf);

        // VR resolution is done with the help of the data dictionary.
        // Pixel Data (7FE0,0010) and Overlay Data (60xx,3000) must
        // resolve to OW in this syntax.
        let vr = if tag == Tag(0x7FE0, 0x0010) || (tag.0 >> 8 == 0x60 && tag.1 == 0x3000) {
            VR::OW
        } else {
            self.dict.by_tag(tag).map(|entry| entry.vr).unwrap_or(VR::UN)
        };

        Ok(Some((DataElementHeader::new(tag, vr, Length(len)), 8)))
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
    use super::ImplicitVRLittleEndianDecoder;
    use crate::decode::Decode;
    use dcmkit_core::{Length, Tag, VR};
    use std::io::Cursor;

    #[rustfmt::skip]
    const RAW: &[u8] = &[
        0x10, 0x00, 0x10, 0x00,     // (0010,0010) Patient Name
            0x08, 0x00, 0x00, 0x00, // Length: 8
                b'D', b'o', b'e', b'^', b'J', b'o', b'h', b'n',
        0x09, 0x00, 0x01, 0x10,     // (0009,1001) private attribute
            0x02, 0x00, 0x00, 0x00, // Length: 2
                0x12, 0x34,
        0xE0, 0x7F, 0x10, 0x00,     // (7FE0,0010) Pixel Data
            0x04, 0x00, 0x00, 0x00, // Length: 4
                0x01, 0x00, 0x02, 0x00,
    ];

    #[test]
    fn vr_resolution_through_the_dictionary() {
        let dec = ImplicitVRLittleEndianDecoder::new();
        let mut cursor = Cursor::new(RAW);

        let (header, n) = dec.decode_header(&mut cursor).unwrap().unwrap();
        assert_eq!(n, 8);
        assert_eq!(header.tag, Tag(0x0010, 0x0010));
        assert_eq!(header.vr, VR::PN);
        assert_eq!(header.len, Length(8));
        std::io::copy(&mut std::io::Read::take(&mut cursor, 8), &mut std::io::sink()).unwrap();

        // not in the dictionary: UN
        let (header, _) = dec.decode_header(&mut cursor).unwrap().unwrap();
        assert_eq!(header.tag, Tag(0x0009, 0x1001));
        assert_eq!(header.vr, VR::UN);
        std::io::copy(&mut std::io::Read::take(&mut cursor, 2), &mut std::io::sink()).unwrap();

        // pixel data resolves to OW in this syntax
        let (header, _) = dec.decode_header(&mut cursor).unwrap().unwrap();
        assert_eq!(header.tag, Tag(0x7FE0, 0x0010));
        assert_eq!(header.vr, VR::OW);
    }
}
