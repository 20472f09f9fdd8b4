//! Decoders for element headers and values.

pub mod basic;
pub mod explicit_le;
pub mod implicit_le;
pub mod value;

use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmkit_core::{DataElementHeader, Tag};
use snafu::{ResultExt, Snafu};
use std::io::Read;

/// An error raised while decoding an element header.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read the header's tag bytes.
    #[snafu(display("failed to read element tag"))]
    ReadTag { source: std::io::Error },

    /// The stream ended in the middle of a tag.
    #[snafu(display("truncated element header: got {} bytes of a tag", read))]
    TruncatedTag { read: usize },

    /// Failed to read the header's value representation bytes.
    #[snafu(display("failed to read value representation"))]
    ReadVr { source: std::io::Error },

    /// Failed to read the header's value length bytes.
    #[snafu(display("failed to read element length"))]
    ReadLength { source: std::io::Error },

    /// Failed to read the reserved bytes preceding a 32-bit length.
    #[snafu(display("failed to read reserved length bytes"))]
    ReadReserved { source: std::io::Error },
}

/// Result alias for header decoding.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A decoder of data element headers under one transfer syntax.
pub trait Decode {
    /// Decode the next data element header from the source.
    ///
    /// Returns the header plus the number of bytes consumed, or `None`
    /// when the source is cleanly exhausted at an element boundary.
    /// A stream ending part-way through a header is an error.
    fn decode_header<S>(&self, source: &mut S) -> Result<Option<(DataElementHeader, usize)>>
    where
        S: ?Sized + Read;

    /// Decode a single attribute tag from the source.
    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read;
}

/// Read the four tag bytes, distinguishing a cleanly exhausted source
/// (`None`) from a tag cut short by the end of the stream (error).
pub(crate) fn read_tag_or_eof<S>(source: &mut S) -> Result<Option<Tag>>
where
    S: ?Sized + Read,
{
    let mut buf = [0u8; 4];
    let mut read = 0;
    while read < buf.len() {
        match source.read(&mut buf[read..]) {
            Ok(0) if read == 0 => return Ok(None),
            Ok(0) => return TruncatedTagSnafu { read }.fail(),
            Ok(n) => read += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context(ReadTagSnafu),
        }
    }
    Ok(Some(Tag(
        LittleEndian::read_u16(&buf[0..2]),
        LittleEndian::read_u16(&buf[2..4]),
    )))
}
