//! Parsing and serialization of the file meta information group.

use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmkit_core::{DataElementHeader, Length, PrimitiveValue, Tag, VR};
use dcmkit_encoding::decode::Decode;
use dcmkit_encoding::encode::value::write_value;
use dcmkit_encoding::encode::Encode;
use dcmkit_encoding::text::TextCodecError;
use dcmkit_encoding::{
    DefaultCharacterSetCodec, ExplicitVRLittleEndianDecoder, ExplicitVRLittleEndianEncoder,
    TextCodec,
};
use snafu::{ensure, OptionExt, ResultExt, Snafu};
use std::io::{Read, Write};

const DICM_MAGIC_CODE: [u8; 4] = [b'D', b'I', b'C', b'M'];

/// The implementation class UID written into meta tables built by this
/// toolkit.
pub const IMPLEMENTATION_CLASS_UID: &str = "2.25.137731698791289109304998381223358594";

/// The implementation version name written into meta tables built by
/// this toolkit.
pub const IMPLEMENTATION_VERSION_NAME: &str = "DCMKIT_01";

/// An error raised while parsing or serializing a file meta group.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The `DICM` magic code could not be read.
    #[snafu(display("could not read magic code"))]
    ReadMagicCode { source: std::io::Error },

    /// The magic code did not match, so this is not a DICOM file.
    #[snafu(display("invalid DICOM file (bad magic code)"))]
    NotDicom,

    /// A meta group element header could not be decoded.
    #[snafu(display("could not decode meta group element"))]
    DecodeElement {
        source: dcmkit_encoding::decode::Error,
    },

    /// The stream ended inside the meta group.
    #[snafu(display("premature end of stream in file meta group"))]
    UnexpectedEndOfMeta,

    /// A meta element's value bytes could not be read.
    #[snafu(display("could not read meta element value"))]
    ReadValueData { source: std::io::Error },

    /// A meta element's text could not be decoded.
    #[snafu(display("could not decode meta element text"))]
    DecodeText { source: TextCodecError },

    /// An element of an unexpected group appeared inside the meta group.
    #[snafu(display("unexpected data element {} in file meta group", tag))]
    UnexpectedTag { tag: Tag },

    /// An element carried a length other than the one its definition
    /// requires.
    #[snafu(display("unexpected length {} for meta element {}", length, tag))]
    UnexpectedDataValueLength { tag: Tag, length: Length },

    /// A meta element declared an undefined length.
    #[snafu(display("undefined length for meta element {}", tag))]
    UndefinedValueLength { tag: Tag },

    /// A mandatory meta element is missing.
    #[snafu(display("missing mandatory meta element `{}`", alias))]
    MissingElement { alias: &'static str },

    /// A meta element could not be encoded.
    #[snafu(display("could not encode meta group element"))]
    EncodeElement {
        source: dcmkit_encoding::encode::Error,
    },

    /// The magic code or a value could not be written out.
    #[snafu(display("could not write meta group data"))]
    WriteData { source: std::io::Error },
}

/// Result alias for meta group operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The file meta information table: the group-0002 attributes
/// describing how the main data set is encoded.
///
/// String fields are kept without their trailing padding; it is
/// restored when the table is serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetaTable {
    /// File Meta Information Group Length
    pub information_group_length: u32,
    /// File Meta Information Version
    pub information_version: [u8; 2],
    /// Media Storage SOP Class UID
    pub media_storage_sop_class_uid: String,
    /// Media Storage SOP Instance UID
    pub media_storage_sop_instance_uid: String,
    /// Transfer Syntax UID
    pub transfer_syntax: String,
    /// Implementation Class UID
    pub implementation_class_uid: String,
    /// Implementation Version Name
    pub implementation_version_name: Option<String>,
    /// Source Application Entity Title
    pub source_application_entity_title: Option<String>,
}

impl FileMetaTable {
    /// Parse a file meta table from the given source, starting at the
    /// `DICM` magic code (the preamble, when present, must already have
    /// been consumed).
    pub fn from_reader<R: Read>(mut source: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        source.read_exact(&mut magic).context(ReadMagicCodeSnafu)?;
        ensure!(magic == DICM_MAGIC_CODE, NotDicomSnafu);

        let decoder = ExplicitVRLittleEndianDecoder;
        let text = DefaultCharacterSetCodec;
        let mut builder = FileMetaTableBuilder::new();

        // the group length element always comes first and drives how
        // many bytes of meta group remain
        let (header, _) = decoder
            .decode_header(&mut source)
            .context(DecodeElementSnafu)?
            .context(UnexpectedEndOfMetaSnafu)?;
        ensure!(
            header.tag == Tag(0x0002, 0x0000),
            UnexpectedTagSnafu { tag: header.tag }
        );
        ensure!(
            header.len == Length(4),
            UnexpectedDataValueLengthSnafu {
                tag: header.tag,
                length: header.len,
            }
        );
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadValueDataSnafu)?;
        let group_length = LittleEndian::read_u32(&buf);
        builder = builder.group_length(group_length);

        let mut remaining = group_length;
        while remaining > 0 {
            let (header, header_len) = decoder
                .decode_header(&mut source)
                .context(DecodeElementSnafu)?
                .context(UnexpectedEndOfMetaSnafu)?;
            let elem_len = header.len.get().context(UndefinedValueLengthSnafu {
                tag: header.tag,
            })?;

            builder = match header.tag {
                Tag(0x0002, 0x0001) => {
                    ensure!(
                        header.len == Length(2),
                        UnexpectedDataValueLengthSnafu {
                            tag: header.tag,
                            length: header.len,
                        }
                    );
                    let mut version = [0u8; 2];
                    source.read_exact(&mut version).context(ReadValueDataSnafu)?;
                    builder.information_version(version)
                }
                Tag(0x0002, 0x0002) => builder
                    .media_storage_sop_class_uid(read_str_value(&mut source, &text, elem_len)?),
                Tag(0x0002, 0x0003) => builder
                    .media_storage_sop_instance_uid(read_str_value(&mut source, &text, elem_len)?),
                Tag(0x0002, 0x0010) => {
                    builder.transfer_syntax(read_str_value(&mut source, &text, elem_len)?)
                }
                Tag(0x0002, 0x0012) => {
                    builder.implementation_class_uid(read_str_value(&mut source, &text, elem_len)?)
                }
                Tag(0x0002, 0x0013) => builder
                    .implementation_version_name(read_str_value(&mut source, &text, elem_len)?),
                Tag(0x0002, 0x0016) => builder
                    .source_application_entity_title(read_str_value(&mut source, &text, elem_len)?),
                Tag(0x0002, _) => {
                    tracing::warn!(
                        "ignoring unsupported file meta element {} ({} bytes)",
                        header.tag,
                        elem_len
                    );
                    let mut ignored = vec![0u8; elem_len as usize];
                    source.read_exact(&mut ignored).context(ReadValueDataSnafu)?;
                    builder
                }
                tag => return UnexpectedTagSnafu { tag }.fail(),
            };
            remaining = remaining.saturating_sub(header_len as u32 + elem_len);
        }

        builder.build()
    }

    /// Serialize the table to the given destination, starting with the
    /// `DICM` magic code. The group length is recomputed from the
    /// current field contents.
    pub fn write_to<W: Write + ?Sized>(&self, to: &mut W) -> Result<()> {
        to.write_all(&DICM_MAGIC_CODE).context(WriteDataSnafu)?;

        let encoder = ExplicitVRLittleEndianEncoder;
        let text = DefaultCharacterSetCodec;
        let group_length = self.calculate_group_length();

        write_element(
            to,
            &encoder,
            &text,
            Tag(0x0002, 0x0000),
            VR::UL,
            PrimitiveValue::from(group_length),
        )?;
        write_element(
            to,
            &encoder,
            &text,
            Tag(0x0002, 0x0001),
            VR::OB,
            PrimitiveValue::from(self.information_version.to_vec()),
        )?;
        write_element(
            to,
            &encoder,
            &text,
            Tag(0x0002, 0x0002),
            VR::UI,
            PrimitiveValue::from(self.media_storage_sop_class_uid.clone()),
        )?;
        write_element(
            to,
            &encoder,
            &text,
            Tag(0x0002, 0x0003),
            VR::UI,
            PrimitiveValue::from(self.media_storage_sop_instance_uid.clone()),
        )?;
        write_element(
            to,
            &encoder,
            &text,
            Tag(0x0002, 0x0010),
            VR::UI,
            PrimitiveValue::from(self.transfer_syntax.clone()),
        )?;
        write_element(
            to,
            &encoder,
            &text,
            Tag(0x0002, 0x0012),
            VR::UI,
            PrimitiveValue::from(self.implementation_class_uid.clone()),
        )?;
        if let Some(name) = &self.implementation_version_name {
            write_element(
                to,
                &encoder,
                &text,
                Tag(0x0002, 0x0013),
                VR::SH,
                PrimitiveValue::from(name.clone()),
            )?;
        }
        if let Some(title) = &self.source_application_entity_title {
            write_element(
                to,
                &encoder,
                &text,
                Tag(0x0002, 0x0016),
                VR::AE,
                PrimitiveValue::from(title.clone()),
            )?;
        }
        Ok(())
    }

    /// The number of meta group bytes following the group length
    /// element, as its value must declare.
    pub fn calculate_group_length(&self) -> u32 {
        fn str_element_len(s: &str) -> u32 {
            let l = s.len() as u32;
            8 + l + (l & 1)
        }
        let mut len = 14 // information version: 12-byte OB header + 2
            + str_element_len(&self.media_storage_sop_class_uid)
            + str_element_len(&self.media_storage_sop_instance_uid)
            + str_element_len(&self.transfer_syntax)
            + str_element_len(&self.implementation_class_uid);
        if let Some(name) = &self.implementation_version_name {
            len += str_element_len(name);
        }
        if let Some(title) = &self.source_application_entity_title {
            len += str_element_len(title);
        }
        len
    }
}

fn read_str_value<S, T>(source: &mut S, text: &T, len: u32) -> Result<String>
where
    S: Read,
    T: TextCodec,
{
    let mut buf = vec![0u8; len as usize];
    source.read_exact(&mut buf).context(ReadValueDataSnafu)?;
    let s = text.decode(&buf).context(DecodeTextSnafu)?;
    Ok(s.trim_end_matches([' ', '\0']).to_owned())
}

fn write_element<W, E, T>(
    to: &mut W,
    encoder: &E,
    text: &T,
    tag: Tag,
    vr: VR,
    value: PrimitiveValue,
) -> Result<()>
where
    W: ?Sized + Write,
    E: Encode,
    T: TextCodec,
{
    let mut buf = Vec::new();
    write_value(&mut buf, vr, &value, text).context(EncodeElementSnafu)?;
    encoder
        .encode_element_header(to, &DataElementHeader::new(tag, vr, Length(buf.len() as u32)))
        .context(EncodeElementSnafu)?;
    to.write_all(&buf).context(WriteDataSnafu)
}

/// A builder for a [`FileMetaTable`].
///
/// The media storage SOP class and instance UIDs and the transfer
/// syntax are mandatory; the implementation identification defaults to
/// this toolkit's and the group length is always recomputed.
#[derive(Debug, Default, Clone)]
pub struct FileMetaTableBuilder {
    group_length: Option<u32>,
    information_version: Option<[u8; 2]>,
    media_storage_sop_class_uid: Option<String>,
    media_storage_sop_instance_uid: Option<String>,
    transfer_syntax: Option<String>,
    implementation_class_uid: Option<String>,
    implementation_version_name: Option<String>,
    source_application_entity_title: Option<String>,
}

impl FileMetaTableBuilder {
    /// Create a new, empty builder.
    pub fn new() -> Self {
        FileMetaTableBuilder::default()
    }

    /// Define the parsed group length (informational; the built table
    /// recomputes it from its contents).
    pub fn group_length(mut self, value: u32) -> Self {
        self.group_length = Some(value);
        self
    }

    /// Define the meta information version.
    pub fn information_version(mut self, value: [u8; 2]) -> Self {
        self.information_version = Some(value);
        self
    }

    /// Define the media storage SOP class UID.
    pub fn media_storage_sop_class_uid<T: Into<String>>(mut self, value: T) -> Self {
        self.media_storage_sop_class_uid = Some(value.into());
        self
    }

    /// Define the media storage SOP instance UID.
    pub fn media_storage_sop_instance_uid<T: Into<String>>(mut self, value: T) -> Self {
        self.media_storage_sop_instance_uid = Some(value.into());
        self
    }

    /// Define the transfer syntax UID.
    pub fn transfer_syntax<T: Into<String>>(mut self, value: T) -> Self {
        self.transfer_syntax = Some(value.into());
        self
    }

    /// Define the implementation class UID.
    pub fn implementation_class_uid<T: Into<String>>(mut self, value: T) -> Self {
        self.implementation_class_uid = Some(value.into());
        self
    }

    /// Define the implementation version name.
    pub fn implementation_version_name<T: Into<String>>(mut self, value: T) -> Self {
        self.implementation_version_name = Some(value.into());
        self
    }

    /// Define the source application entity title.
    pub fn source_application_entity_title<T: Into<String>>(mut self, value: T) -> Self {
        self.source_application_entity_title = Some(value.into());
        self
    }

    /// Build the meta table, failing on missing mandatory attributes.
    pub fn build(self) -> Result<FileMetaTable> {
        let media_storage_sop_class_uid =
            self.media_storage_sop_class_uid.context(MissingElementSnafu {
                alias: "MediaStorageSOPClassUID",
            })?;
        let media_storage_sop_instance_uid =
            self.media_storage_sop_instance_uid
                .context(MissingElementSnafu {
                    alias: "MediaStorageSOPInstanceUID",
                })?;
        let transfer_syntax = self.transfer_syntax.context(MissingElementSnafu {
            alias: "TransferSyntaxUID",
        })?;
        // when no implementation is identified, claim this toolkit's
        let (implementation_class_uid, implementation_version_name) =
            match self.implementation_class_uid {
                Some(uid) => (uid, self.implementation_version_name),
                None => (
                    IMPLEMENTATION_CLASS_UID.to_owned(),
                    self.implementation_version_name
                        .or_else(|| Some(IMPLEMENTATION_VERSION_NAME.to_owned())),
                ),
            };
        let mut table = FileMetaTable {
            information_group_length: 0,
            information_version: self.information_version.unwrap_or([0, 1]),
            media_storage_sop_class_uid,
            media_storage_sop_instance_uid,
            transfer_syntax,
            implementation_class_uid,
            implementation_version_name,
            source_application_entity_title: self.source_application_entity_title,
        };
        table.information_group_length = table.calculate_group_length();
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    // a hand-crafted meta group in Explicit VR Little Endian
    #[rustfmt::skip]
    const RAW: &[u8] = &[
        b'D', b'I', b'C', b'M',
        0x02, 0x00, 0x00, 0x00, b'U', b'L', 0x04, 0x00, // (0002,0000) UL 4
            0x6A, 0x00, 0x00, 0x00,                     // group length: 106
        0x02, 0x00, 0x01, 0x00, b'O', b'B',             // (0002,0001) OB
            0x00, 0x00, 0x02, 0x00, 0x00, 0x00,         // reserved + length 2
            0x00, 0x01,
        0x02, 0x00, 0x02, 0x00, b'U', b'I', 0x1A, 0x00, // (0002,0002) UI 26
            b'1', b'.', b'2', b'.', b'8', b'4', b'0', b'.', b'1', b'0', b'0', b'0', b'8', b'.',
            b'5', b'.', b'1', b'.', b'4', b'.', b'1', b'.', b'1', b'.', b'1', 0x00,
        0x02, 0x00, 0x03, 0x00, b'U', b'I', 0x08, 0x00, // (0002,0003) UI 8
            b'1', b'.', b'2', b'.', b'3', b'.', b'4', 0x00,
        0x02, 0x00, 0x10, 0x00, b'U', b'I', 0x14, 0x00, // (0002,0010) UI 20
            b'1', b'.', b'2', b'.', b'8', b'4', b'0', b'.', b'1', b'0', b'0', b'0', b'8', b'.',
            b'1', b'.', b'2', b'.', b'1', 0x00,
        0x02, 0x00, 0x12, 0x00, b'U', b'I', 0x06, 0x00, // (0002,0012) UI 6
            b'1', b'.', b'2', b'.', b'3', 0x00,
    ];

    #[test]
    fn parse_meta_table() {
        let table = FileMetaTable::from_reader(Cursor::new(RAW)).unwrap();
        assert_eq!(table.information_group_length, 106);
        assert_eq!(table.information_version, [0, 1]);
        assert_eq!(
            table.media_storage_sop_class_uid,
            "1.2.840.10008.5.1.4.1.1.1"
        );
        assert_eq!(table.media_storage_sop_instance_uid, "1.2.3.4");
        assert_eq!(table.transfer_syntax, "1.2.840.10008.1.2.1");
        assert_eq!(table.implementation_class_uid, "1.2.3");
    }

    #[test]
    fn missing_magic_code_is_not_dicom() {
        let err = FileMetaTable::from_reader(Cursor::new(&b"DICX\x02\x00\x00\x00"[..]))
            .unwrap_err();
        assert!(matches!(err, Error::NotDicom));
    }

    #[test]
    fn builder_requires_the_mandatory_attributes() {
        let err = FileMetaTableBuilder::new()
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
            .media_storage_sop_instance_uid("1.2.3.4")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingElement {
                alias: "TransferSyntaxUID"
            }
        ));
    }

    #[test]
    fn write_and_reparse_round_trip() {
        let table = FileMetaTableBuilder::new()
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
            .media_storage_sop_instance_uid("1.2.3.4")
            .transfer_syntax("1.2.840.10008.1.2.1")
            .build()
            .unwrap();

        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        let reparsed = FileMetaTable::from_reader(Cursor::new(&out)).unwrap();
        assert_eq!(reparsed, table);
    }
}
