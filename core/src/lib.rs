#![crate_type = "lib"]
#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    missing_docs,
    unused_qualifications,
    unused_import_braces
)]

//! Core data structures for DICOM data sets.
//!
//! This crate holds the pure in-memory model shared by the rest of the
//! dcmkit workspace:
//!
//! - [`header`] defines the attribute [`Tag`], the value length type,
//!   the value representation enumeration and the data element header.
//! - [`value`] defines [`PrimitiveValue`], the tagged union over every
//!   value kind this toolkit stores, with its accessors and conversions.
//! - [`element`] defines [`DataElement`], a tag + VR + value triple with
//!   the invariants that keep the three consistent.
//! - [`dataset`] defines [`DataSet`], the ordered tag → element mapping
//!   of one record, and [`TagSet`], the skip-set input of partial reads.
//! - [`dictionary`] defines the data dictionary trait and a compact
//!   built-in table of standard attributes.
//!
//! There is no I/O here; the encoding and object crates build on top.

pub mod dataset;
pub mod dictionary;
pub mod element;
pub mod header;
pub mod value;

pub use dataset::{DataSet, TagNotFound, TagSet};
pub use dictionary::{DataDictionary, DictionaryEntry, StandardDictionary};
pub use element::{DataElement, InvalidValueError};
pub use header::{DataElementHeader, Length, Tag, VR};
pub use value::PrimitiveValue;

// re-export: the `C` small-vector alias appears in public signatures of `value`
pub use smallvec;
