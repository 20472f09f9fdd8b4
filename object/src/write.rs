//! Writing of [`DicomFile`] objects back to a byte stream.

use crate::{
    CreateFileSnafu, DicomFile, EncodeElementHeaderSnafu, EncodeValueSnafu, FlushOutputSnafu,
    InvalidElementSnafu, MissingFileNameSnafu, MissingFileSnafu, Result,
    UnsupportedTransferSyntaxSnafu, WriteMetaDataSetSnafu, WritePreambleBytesSnafu,
    WriteValueDataSnafu,
};
use dcmkit_core::{DataElementHeader, DataSet, Length};
use dcmkit_encoding::encode::value::write_value;
use dcmkit_encoding::encode::Encode;
use dcmkit_encoding::{
    DefaultCharacterSetCodec, ExplicitVRLittleEndianEncoder, ImplicitVRLittleEndianEncoder,
    TransferSyntax,
};
use snafu::{OptionExt, ResultExt};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A writer of DICOM files: hand it a file object and a destination
/// path, then run the blocking [`write`](Self::write) call.
///
/// The serialized form is the 128-byte preamble, the magic code, the
/// meta group, and the data set in ascending tag order under the
/// transfer syntax named by the meta table.
#[derive(Debug, Default)]
pub struct Writer {
    file: Option<DicomFile>,
    file_name: Option<PathBuf>,
}

impl Writer {
    /// Create a writer with nothing configured.
    pub fn new() -> Self {
        Writer::default()
    }

    /// Hand the file object to be written.
    pub fn set_file(&mut self, file: DicomFile) {
        self.file = Some(file);
    }

    /// Configure the destination path.
    pub fn set_file_name<P: AsRef<Path>>(&mut self, path: P) {
        self.file_name = Some(path.as_ref().to_owned());
    }

    /// Serialize the configured file to the configured path.
    ///
    /// Blocks until the whole file is written or an error occurs.
    /// Calling without a file or path first is API misuse and reported
    /// as an error.
    pub fn write(&self) -> Result<()> {
        let file = self.file.as_ref().context(MissingFileSnafu)?;
        let path = self.file_name.as_ref().context(MissingFileNameSnafu)?;
        let out = fs::File::create(path).with_context(|_| CreateFileSnafu {
            filename: path.clone(),
        })?;
        let mut out = BufWriter::new(out);
        write_file(file, &mut out, true)?;
        out.flush().context(FlushOutputSnafu)
    }
}

/// Serialize a whole file object: optional preamble, magic code, meta
/// group, then the data set.
pub(crate) fn write_file<W>(file: &DicomFile, to: &mut W, with_preamble: bool) -> Result<()>
where
    W: ?Sized + Write,
{
    if with_preamble {
        to.write_all(&[0u8; 128]).context(WritePreambleBytesSnafu)?;
    }
    file.meta().write_to(to).context(WriteMetaDataSetSnafu)?;

    let ts = TransferSyntax::from_uid(&file.meta().transfer_syntax).with_context(|| {
        UnsupportedTransferSyntaxSnafu {
            uid: file.meta().transfer_syntax.clone(),
        }
    })?;
    match ts {
        TransferSyntax::ImplicitVRLittleEndian => {
            write_data_set(to, &ImplicitVRLittleEndianEncoder, file.dataset())
        }
        TransferSyntax::ExplicitVRLittleEndian => {
            write_data_set(to, &ExplicitVRLittleEndianEncoder, file.dataset())
        }
    }
}

/// Serialize a data set in ascending tag order.
///
/// Every element is validated against the VR/value compatibility table
/// before any of its bytes go out, and its length field is derived from
/// the actually encoded value.
fn write_data_set<W, E>(to: &mut W, encoder: &E, dataset: &DataSet) -> Result<()>
where
    W: ?Sized + Write,
    E: Encode,
{
    let text = DefaultCharacterSetCodec;
    for elem in dataset.iter() {
        let tag = elem.tag();
        elem.validate().context(InvalidElementSnafu { tag })?;

        let mut buf = Vec::new();
        write_value(&mut buf, elem.vr(), elem.value(), &text)
            .context(EncodeValueSnafu { tag })?;
        let header = DataElementHeader::new(tag, elem.vr(), Length(buf.len() as u32));
        encoder
            .encode_element_header(to, &header)
            .context(EncodeElementHeaderSnafu { tag })?;
        to.write_all(&buf).context(WriteValueDataSnafu { tag })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use dcmkit_core::{DataElement, Tag, VR};

    #[test]
    fn writer_demands_file_and_path() {
        let writer = Writer::new();
        assert!(matches!(writer.write(), Err(Error::MissingFile)));
    }

    #[test]
    fn invalid_elements_are_rejected_before_writing() {
        let mut dataset = DataSet::new();
        // floats under a text-mandating VR
        dataset.put(DataElement::new(
            Tag(0x0028, 0x0030),
            VR::DS,
            vec![0.5f32, 0.5],
        ));
        let mut out = Vec::new();
        let err = write_data_set(&mut out, &ExplicitVRLittleEndianEncoder, &dataset).unwrap_err();
        assert!(matches!(err, Error::InvalidElement { .. }));
    }

    #[test]
    fn elements_are_written_in_ascending_tag_order() {
        let mut dataset = DataSet::new();
        dataset.put(DataElement::new(Tag(0x0028, 0x0010), VR::US, vec![4u16]));
        dataset.put(DataElement::new(Tag(0x0008, 0x0060), VR::CS, "CT"));
        let mut out = Vec::new();
        write_data_set(&mut out, &ExplicitVRLittleEndianEncoder, &dataset).unwrap();
        #[rustfmt::skip]
        let expected: &[u8] = &[
            0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00, b'C', b'T',
            0x28, 0x00, 0x10, 0x00, b'U', b'S', 0x02, 0x00, 0x04, 0x00,
        ];
        assert_eq!(out, expected);
    }
}
