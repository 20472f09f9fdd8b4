#![crate_type = "lib"]
#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_qualifications, unused_import_braces)]

//! Encoding and decoding primitives for DICOM streams.
//!
//! This crate translates between the in-memory model of `dcmkit-core`
//! and serialized element streams:
//!
//! - [`decode`] reads element headers and values under the two supported
//!   transfer syntaxes;
//! - [`encode`] writes them back, including the even-length padding the
//!   format mandates;
//! - [`text`] holds the character repertoire codec;
//! - [`transfer_syntax`] enumerates the supported syntaxes and maps
//!   them from their UIDs.

pub mod decode;
pub mod encode;
pub mod text;
pub mod transfer_syntax;

pub use decode::explicit_le::ExplicitVRLittleEndianDecoder;
pub use decode::implicit_le::ImplicitVRLittleEndianDecoder;
pub use decode::Decode;
pub use encode::explicit_le::ExplicitVRLittleEndianEncoder;
pub use encode::implicit_le::ImplicitVRLittleEndianEncoder;
pub use encode::Encode;
pub use text::{DefaultCharacterSetCodec, TextCodec};
pub use transfer_syntax::TransferSyntax;
