//! Encoders for element headers and values.

pub mod basic;
pub mod explicit_le;
pub mod implicit_le;
pub mod value;

use dcmkit_core::{DataElementHeader, Tag};
use snafu::Snafu;
use std::io::Write;

/// An error raised while encoding an element header or value.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// Failed to write an attribute tag.
    #[snafu(display("failed to write element tag"))]
    WriteTag { source: std::io::Error },

    /// Failed to write an element header.
    #[snafu(display("failed to write element header"))]
    WriteHeader { source: std::io::Error },

    /// Failed to write an element's value bytes.
    #[snafu(display("failed to write value data"))]
    WriteValueData { source: std::io::Error },

    /// The value's text could not be encoded under the repertoire.
    #[snafu(display("failed to encode text value"))]
    EncodeText {
        source: crate::text::TextCodecError,
    },
}

/// Result alias for encoding operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An encoder of data element headers under one transfer syntax.
pub trait Encode {
    /// Encode the given attribute tag to the destination.
    fn encode_tag<W>(&self, to: &mut W, tag: Tag) -> Result<()>
    where
        W: ?Sized + Write;

    /// Encode the given element header to the destination,
    /// returning the number of bytes written.
    ///
    /// The header's length must be defined; this toolkit always writes
    /// defined-length values.
    fn encode_element_header<W>(&self, to: &mut W, header: &DataElementHeader) -> Result<usize>
    where
        W: ?Sized + Write;
}
