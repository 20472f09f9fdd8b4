#![crate_type = "lib"]
#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_qualifications, unused_import_braces)]

//! Reading, querying and writing DICOM files.
//!
//! This crate ties the dcmkit data model and codecs together into the
//! file-level API:
//!
//! - [`DicomFile`] pairs a file meta table with one data set, the unit
//!   of every read and write;
//! - [`meta`] parses and serializes the file meta group;
//! - [`read`] holds the [`Reader`] state machine with its partial
//!   "read up to tag" mode, plus the [`open_file`]/[`ReadOptions`]
//!   convenience layer;
//! - [`write`] holds the [`Writer`];
//! - [`filter`] renders element values as display strings.
//!
//! # Example
//!
//! ```no_run
//! use dcmkit_object::{Reader, StringFilter};
//! use dcmkit_core::{Tag, TagSet};
//!
//! let mut reader = Reader::new();
//! reader.set_file_name("image.dcm");
//!
//! // fetch the descriptive attributes without decoding the bulk payload
//! let pixel_data = Tag(0x7FE0, 0x0010);
//! let mut skip = TagSet::new();
//! skip.insert(pixel_data);
//! reader.read_up_to(pixel_data, &skip)?;
//!
//! let file = reader.file()?;
//! let filter = StringFilter::new(file);
//! for elem in file.dataset().iter() {
//!     println!("{} {}", elem.tag(), filter.to_string(elem));
//! }
//! # Ok::<(), dcmkit_object::Error>(())
//! ```

pub mod filter;
pub mod meta;
pub mod read;
pub mod write;

pub use filter::StringFilter;
pub use meta::{FileMetaTable, FileMetaTableBuilder};
pub use read::{from_reader, open_file, ReadOptions, ReadPreamble, Reader, ReaderState};
pub use write::Writer;

use dcmkit_core::{DataSet, InvalidValueError, Tag};
use snafu::{ResultExt, Snafu};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

/// The main error type for reading and writing DICOM files.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// No file name was configured before the operation.
    #[snafu(display("no file name was set"))]
    MissingFileName,

    /// No file object was handed to the writer.
    #[snafu(display("no file was set to be written"))]
    MissingFile,

    /// The reader has not completed a read, so there is no file to get.
    #[snafu(display("no file available: the reader has not completed a read"))]
    FileNotReady,

    /// Could not open the source file.
    #[snafu(display("could not open file '{}'", filename.display()))]
    OpenFile {
        filename: PathBuf,
        source: std::io::Error,
    },

    /// Could not create the destination file.
    #[snafu(display("could not create file '{}'", filename.display()))]
    CreateFile {
        filename: PathBuf,
        source: std::io::Error,
    },

    /// Could not read the 128-byte file preamble.
    #[snafu(display("could not read file preamble"))]
    ReadPreambleBytes { source: std::io::Error },

    /// Could not write the 128-byte file preamble.
    #[snafu(display("could not write file preamble"))]
    WritePreambleBytes { source: std::io::Error },

    /// The file meta group could not be parsed.
    #[snafu(display("could not parse file meta group"))]
    ParseMetaDataSet { source: meta::Error },

    /// The file meta group could not be written.
    #[snafu(display("could not write file meta group"))]
    WriteMetaDataSet { source: meta::Error },

    /// A file meta group could not be built for the data set.
    #[snafu(display("could not build file meta group"))]
    BuildMetaTable { source: meta::Error },

    /// The meta group names a transfer syntax this toolkit cannot handle.
    #[snafu(display("unsupported transfer syntax `{}`", uid))]
    UnsupportedTransferSyntax { uid: String },

    /// A data element header could not be decoded.
    #[snafu(display("could not decode data element header"))]
    DecodeElementHeader {
        source: dcmkit_encoding::decode::Error,
    },

    /// A data element value could not be decoded.
    #[snafu(display("could not decode data element value"))]
    DecodeValue {
        source: dcmkit_encoding::decode::value::Error,
    },

    /// A value could not be skipped over.
    #[snafu(display("could not skip {} value bytes of element {}", len, tag))]
    SkipValueData {
        tag: Tag,
        len: u32,
        source: std::io::Error,
    },

    /// The stream ended while the current element still expected bytes.
    #[snafu(display("premature end of stream while reading element {}", tag))]
    PrematureEnd { tag: Tag },

    /// Delimited content held something other than an item where an
    /// item was expected.
    #[snafu(display("unexpected tag {} inside delimited content of element {}", found, tag))]
    UnexpectedItemTag { tag: Tag, found: Tag },

    /// An element's VR/value pairing is invalid for serialization.
    #[snafu(display("data element {} cannot be serialized", tag))]
    InvalidElement {
        tag: Tag,
        source: InvalidValueError,
    },

    /// A data element header could not be encoded.
    #[snafu(display("could not encode header of element {}", tag))]
    EncodeElementHeader {
        tag: Tag,
        source: dcmkit_encoding::encode::Error,
    },

    /// A data element value could not be encoded.
    #[snafu(display("could not encode value of element {}", tag))]
    EncodeValue {
        tag: Tag,
        source: dcmkit_encoding::encode::Error,
    },

    /// A data element's value bytes could not be written out.
    #[snafu(display("could not write value data of element {}", tag))]
    WriteValueData {
        tag: Tag,
        source: std::io::Error,
    },

    /// The output stream could not be flushed.
    #[snafu(display("could not flush the output stream"))]
    FlushOutput { source: std::io::Error },
}

/// Result alias for file-level operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A DICOM file fully resident in memory: one file meta table plus one
/// data set, the unit of every read and write operation.
#[derive(Debug, Clone, PartialEq)]
pub struct DicomFile {
    meta: FileMetaTable,
    dataset: DataSet,
}

impl DicomFile {
    /// Create a file object from its two parts.
    pub fn new(meta: FileMetaTable, dataset: DataSet) -> Self {
        DicomFile { meta, dataset }
    }

    /// Encapsulate a bare data set with a meta group built from the
    /// given builder.
    ///
    /// When the data set carries _SOP Instance UID_, its value fills
    /// the builder's media storage SOP instance UID; the media storage
    /// SOP class UID and transfer syntax must still be provided.
    pub fn with_meta(dataset: DataSet, mut meta: FileMetaTableBuilder) -> Result<Self> {
        if let Ok(elem) = dataset.element(Tag(0x0008, 0x0018)) {
            meta = meta.media_storage_sop_instance_uid(elem.to_str().into_owned());
        }
        let meta = meta.build().context(BuildMetaTableSnafu)?;
        Ok(DicomFile { meta, dataset })
    }

    /// Retrieve the file meta table.
    pub fn meta(&self) -> &FileMetaTable {
        &self.meta
    }

    /// Retrieve the file meta table for mutation.
    pub fn meta_mut(&mut self) -> &mut FileMetaTable {
        &mut self.meta
    }

    /// Retrieve the file's data set.
    pub fn dataset(&self) -> &DataSet {
        &self.dataset
    }

    /// Retrieve the file's data set for mutation.
    pub fn dataset_mut(&mut self) -> &mut DataSet {
        &mut self.dataset
    }

    /// Deconstruct the file into its meta table and data set.
    pub fn into_parts(self) -> (FileMetaTable, DataSet) {
        (self.meta, self.dataset)
    }

    /// Write the file to the given destination without the 128-byte
    /// preamble, pairing with [`from_reader`].
    pub fn write_to<W>(&self, mut to: W) -> Result<()>
    where
        W: IoWrite,
    {
        write::write_file(self, &mut to, false)
    }

    /// Write the file, preamble included, to the file system,
    /// pairing with [`open_file`].
    pub fn write_to_file<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let out = std::fs::File::create(path).with_context(|_| CreateFileSnafu {
            filename: path.to_owned(),
        })?;
        let mut out = std::io::BufWriter::new(out);
        write::write_file(self, &mut out, true)?;
        out.flush().context(FlushOutputSnafu)
    }
}
