//! Reading of DICOM files into [`DicomFile`] objects.
//!
//! Two surfaces are provided over the same internals:
//! the [`Reader`] state machine, which separates configuration
//! (`set_file_name`) from the blocking read calls and gates access to
//! the produced file on a completed read; and the [`open_file`] /
//! [`ReadOptions`] convenience layer for one-shot use.
//!
//! Partial reads exist so that the descriptive prefix of a very large
//! file can be fetched without paying for the bulk payload behind it:
//! scanning stops at the first element whose tag is not below the stop
//! tag, and elements named in the skip-set are consumed from the stream
//! without being decoded into the data set.

use crate::{
    DecodeElementHeaderSnafu, DecodeValueSnafu, DicomFile, Error, FileNotReadySnafu,
    MissingFileNameSnafu, OpenFileSnafu, ParseMetaDataSetSnafu, PrematureEndSnafu,
    ReadPreambleBytesSnafu, Result, SkipValueDataSnafu, UnexpectedItemTagSnafu,
    UnsupportedTransferSyntaxSnafu,
};
use crate::meta::FileMetaTable;
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmkit_core::value::C;
use dcmkit_core::{DataElement, DataElementHeader, DataSet, Length, PrimitiveValue, Tag, TagSet, VR};
use dcmkit_encoding::decode::value::read_value;
use dcmkit_encoding::decode::Decode;
use dcmkit_encoding::{
    DefaultCharacterSetCodec, ExplicitVRLittleEndianDecoder, ImplicitVRLittleEndianDecoder,
    TransferSyntax,
};
use snafu::{ensure, OptionExt, ResultExt};
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

const SEQUENCE_DELIMITER: Tag = Tag(0xFFFE, 0xE0DD);
const ITEM: Tag = Tag(0xFFFE, 0xE000);
const ITEM_DELIMITER: Tag = Tag(0xFFFE, 0xE00D);

/// The observable states of a [`Reader`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// No read has been attempted yet.
    #[default]
    Initial,
    /// A partial read stopped at the configured tag; the file holds the
    /// prefix read so far.
    Stopped,
    /// A read ran to the end of the stream.
    Complete,
    /// The last read failed; any partially built file was discarded.
    Failed,
}

/// A reader of DICOM files, driven as a small state machine:
/// configure the source, run a (full or partial) read, then collect the
/// produced file.
///
/// The produced file is only available after a read has finished in
/// [`Stopped`](ReaderState::Stopped) or
/// [`Complete`](ReaderState::Complete); asking for it earlier is API
/// misuse and reported as an error. A failed read discards any
/// partially built file.
#[derive(Debug, Default)]
pub struct Reader {
    file_name: Option<PathBuf>,
    state: ReaderState,
    file: Option<DicomFile>,
}

impl Reader {
    /// Create a reader with no source configured.
    pub fn new() -> Self {
        Reader::default()
    }

    /// Configure the path of the file to read.
    pub fn set_file_name<P: AsRef<Path>>(&mut self, path: P) {
        self.file_name = Some(path.as_ref().to_owned());
    }

    /// The reader's current state.
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Read the configured file in full.
    ///
    /// Blocks until the whole data set is decoded or an error occurs.
    pub fn read(&mut self) -> Result<()> {
        self.run(None, &TagSet::new())
    }

    /// Read the configured file up to the given stop tag, skipping the
    /// elements named in `skip`.
    ///
    /// Scanning stops at the first element whose tag is greater than or
    /// equal to `stop_tag`; that element's value and everything after
    /// it are left unread. Elements in the skip-set are consumed from
    /// the stream but not stored. The stop tag does not have to be
    /// present: a stream ending cleanly before it is a successful,
    /// complete read.
    pub fn read_up_to(&mut self, stop_tag: Tag, skip: &TagSet) -> Result<()> {
        self.run(Some(stop_tag), skip)
    }

    /// Access the file produced by the last successful read.
    pub fn file(&self) -> Result<&DicomFile> {
        match self.state {
            ReaderState::Stopped | ReaderState::Complete => {
                self.file.as_ref().context(FileNotReadySnafu)
            }
            _ => FileNotReadySnafu.fail(),
        }
    }

    /// Consume the reader, taking the file produced by the last
    /// successful read.
    pub fn into_file(self) -> Result<DicomFile> {
        match self.state {
            ReaderState::Stopped | ReaderState::Complete => {
                self.file.context(FileNotReadySnafu)
            }
            _ => FileNotReadySnafu.fail(),
        }
    }

    fn run(&mut self, read_until: Option<Tag>, skip: &TagSet) -> Result<()> {
        let path = self.file_name.clone().context(MissingFileNameSnafu)?;
        // pessimistic: any early return below leaves the reader failed
        self.state = ReaderState::Failed;
        self.file = None;

        let file = fs::File::open(&path).with_context(|_| OpenFileSnafu {
            filename: path.clone(),
        })?;
        let mut source = BufReader::new(file);
        skip_preamble(&mut source)?;
        let (file, state) = read_components(&mut source, read_until, skip)?;

        self.file = Some(file);
        self.state = state;
        Ok(())
    }
}

/// Whether to expect the 128-byte preamble before the magic code.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub enum ReadPreamble {
    /// Expect the preamble when opening a file by path,
    /// and none when reading from an arbitrary byte source.
    #[default]
    Auto,
    /// Never expect a preamble.
    Never,
    /// Always expect a preamble.
    Always,
}

/// A builder for opening DICOM files with additional options.
///
/// # Example
///
/// ```no_run
/// # use dcmkit_object::ReadOptions;
/// use dcmkit_core::Tag;
///
/// let file = ReadOptions::new()
///     .read_until(Tag(0x7FE0, 0x0010))
///     .open_file("path/to/file.dcm")?;
/// # Ok::<(), dcmkit_object::Error>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct ReadOptions {
    read_until: Option<Tag>,
    skip: TagSet,
    read_preamble: ReadPreamble,
}

impl ReadOptions {
    /// Create the default set of options:
    /// read everything, skip nothing.
    pub fn new() -> Self {
        ReadOptions::default()
    }

    /// Set the operation to read only up to the given tag.
    ///
    /// Reading stops at the first element whose tag is greater than or
    /// equal to `tag`; an element with the exact tag is excluded from
    /// the output.
    pub fn read_until(mut self, tag: Tag) -> Self {
        self.read_until = Some(tag);
        self
    }

    /// Set the operation to read all elements to the end.
    ///
    /// This is the default behavior.
    pub fn read_all(mut self) -> Self {
        self.read_until = None;
        self
    }

    /// Add tags whose elements are consumed from the stream without
    /// being stored in the data set.
    pub fn skip<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = Tag>,
    {
        self.skip.extend(tags);
        self
    }

    /// Set whether to expect the 128-byte file preamble.
    pub fn read_preamble(mut self, option: ReadPreamble) -> Self {
        self.read_preamble = option;
        self
    }

    /// Open and read the file at the given path.
    pub fn open_file<P: AsRef<Path>>(self, path: P) -> Result<DicomFile> {
        let path = path.as_ref();
        let file = fs::File::open(path).with_context(|_| OpenFileSnafu {
            filename: path.to_owned(),
        })?;
        let mut source = BufReader::new(file);
        if matches!(self.read_preamble, ReadPreamble::Auto | ReadPreamble::Always) {
            skip_preamble(&mut source)?;
        }
        let (file, _) = read_components(&mut source, self.read_until, &self.skip)?;
        Ok(file)
    }

    /// Read a file object from an arbitrary byte source, which is
    /// expected to start at the magic code unless configured otherwise.
    pub fn from_reader<R: Read>(self, source: R) -> Result<DicomFile> {
        let mut source = BufReader::new(source);
        if self.read_preamble == ReadPreamble::Always {
            skip_preamble(&mut source)?;
        }
        let (file, _) = read_components(&mut source, self.read_until, &self.skip)?;
        Ok(file)
    }
}

/// Read a DICOM file from the file system
/// (128-byte preamble, magic code, meta group, data set).
pub fn open_file<P: AsRef<Path>>(path: P) -> Result<DicomFile> {
    ReadOptions::new().open_file(path)
}

/// Read a DICOM file from a byte source, starting at the magic code.
pub fn from_reader<R: Read>(source: R) -> Result<DicomFile> {
    ReadOptions::new().from_reader(source)
}

fn skip_preamble<S: Read>(source: &mut S) -> Result<()> {
    let mut preamble = [0u8; 128];
    source
        .read_exact(&mut preamble)
        .context(ReadPreambleBytesSnafu)
}

/// Read the meta group and the (possibly bounded) data set behind it.
fn read_components<S: Read>(
    source: &mut S,
    read_until: Option<Tag>,
    skip: &TagSet,
) -> Result<(DicomFile, ReaderState)> {
    let meta = FileMetaTable::from_reader(&mut *source).context(ParseMetaDataSetSnafu)?;
    let ts = TransferSyntax::from_uid(&meta.transfer_syntax).with_context(|| {
        UnsupportedTransferSyntaxSnafu {
            uid: meta.transfer_syntax.clone(),
        }
    })?;

    let (dataset, state) = match ts {
        TransferSyntax::ImplicitVRLittleEndian => read_data_set(
            source,
            &ImplicitVRLittleEndianDecoder::default(),
            read_until,
            skip,
        )?,
        TransferSyntax::ExplicitVRLittleEndian => {
            read_data_set(source, &ExplicitVRLittleEndianDecoder, read_until, skip)?
        }
    };

    Ok((DicomFile::new(meta, dataset), state))
}

/// The element scanning loop shared by full and partial reads.
fn read_data_set<S, D>(
    source: &mut S,
    decoder: &D,
    read_until: Option<Tag>,
    skip: &TagSet,
) -> Result<(DataSet, ReaderState)>
where
    S: ?Sized + Read,
    D: Decode,
{
    let text = DefaultCharacterSetCodec;
    let mut dataset = DataSet::new();
    let mut last_tag: Option<Tag> = None;

    loop {
        let header = match decoder
            .decode_header(source)
            .context(DecodeElementHeaderSnafu)?
        {
            // clean end of stream: read as much as was available
            None => return Ok((dataset, ReaderState::Complete)),
            Some((header, _)) => header,
        };

        // the stop check comes before the skip check: a tag in both
        // sets stops the read with its value left unconsumed
        if let Some(stop_tag) = read_until {
            if header.tag >= stop_tag {
                tracing::debug!("stopping read at element {}", header.tag);
                return Ok((dataset, ReaderState::Stopped));
            }
        }

        if let Some(prev) = last_tag {
            if header.tag < prev {
                tracing::warn!(
                    "data element {} out of ascending tag order (after {})",
                    header.tag,
                    prev
                );
            }
        }
        last_tag = Some(header.tag);

        if skip.contains(&header.tag) {
            skip_value(source, decoder, &header)?;
            continue;
        }

        let elem = read_element(source, decoder, &header, &text)?;
        dataset.put(elem);
    }
}

/// Materialize one element, given its decoded header.
///
/// Nested content (sequence VRs and undefined lengths) is kept as an
/// opaque byte value with a defined length, per the flat data model.
fn read_element<S, D>(
    source: &mut S,
    decoder: &D,
    header: &DataElementHeader,
    text: &DefaultCharacterSetCodec,
) -> Result<DataElement>
where
    S: ?Sized + Read,
    D: Decode,
{
    if header.len.is_undefined() {
        let mut content = Vec::new();
        {
            let mut capture = CaptureReader {
                from: source,
                captured: &mut content,
            };
            consume_delimited(&mut capture, decoder, header.tag)?;
        }
        // drop the trailing sequence delimiter from the capture
        content.truncate(content.len().saturating_sub(8));
        let len = Length(content.len() as u32);
        return Ok(DataElement::new_with_len(
            header.tag,
            VR::UN,
            len,
            PrimitiveValue::U8(C::from_vec(content)),
        ));
    }

    if header.vr == VR::SQ {
        let opaque = DataElementHeader::new(header.tag, VR::UN, header.len);
        let value = read_value(source, &opaque, text).context(DecodeValueSnafu)?;
        return Ok(DataElement::new_with_len(
            header.tag,
            VR::UN,
            header.len,
            value,
        ));
    }

    let value = read_value(source, header, text).context(DecodeValueSnafu)?;
    Ok(DataElement::new_with_len(
        header.tag,
        header.vr,
        header.len,
        value,
    ))
}

/// Consume an element's value without materializing it.
fn skip_value<S, D>(source: &mut S, decoder: &D, header: &DataElementHeader) -> Result<()>
where
    S: ?Sized + Read,
    D: Decode,
{
    match header.len.get() {
        Some(len) => copy_exact(source, header.tag, u64::from(len)),
        None => consume_delimited(source, decoder, header.tag),
    }
}

/// Consume the delimited content of an undefined-length value, up to
/// and including its sequence delimiter.
fn consume_delimited<S, D>(source: &mut S, decoder: &D, tag: Tag) -> Result<()>
where
    S: ?Sized + Read,
    D: Decode,
{
    loop {
        let (head_tag, len) = read_delimited_head(source, tag)?;
        match head_tag {
            SEQUENCE_DELIMITER => {
                if len != 0 {
                    tracing::warn!(
                        "sequence delimiter of element {} declares length {}",
                        tag,
                        len
                    );
                }
                return Ok(());
            }
            ITEM => {
                if len == 0xFFFF_FFFF {
                    consume_delimited_item(source, decoder, tag)?;
                } else {
                    copy_exact(source, tag, u64::from(len))?;
                }
            }
            found => return UnexpectedItemTagSnafu { tag, found }.fail(),
        }
    }
}

/// Consume the elements of an undefined-length item, up to and
/// including its item delimiter.
fn consume_delimited_item<S, D>(source: &mut S, decoder: &D, tag: Tag) -> Result<()>
where
    S: ?Sized + Read,
    D: Decode,
{
    loop {
        let header = decoder
            .decode_header(source)
            .context(DecodeElementHeaderSnafu)?
            .context(PrematureEndSnafu { tag })?
            .0;
        match header.tag {
            ITEM_DELIMITER => return Ok(()),
            ITEM | SEQUENCE_DELIMITER => {
                return UnexpectedItemTagSnafu {
                    tag,
                    found: header.tag,
                }
                .fail()
            }
            _ => match header.len.get() {
                Some(len) => copy_exact(source, tag, u64::from(len))?,
                None => consume_delimited(source, decoder, tag)?,
            },
        }
    }
}

/// Read an item or delimiter head: tag plus 32-bit length,
/// identical in both supported transfer syntaxes.
fn read_delimited_head<S>(source: &mut S, tag: Tag) -> Result<(Tag, u32)>
where
    S: ?Sized + Read,
{
    let mut buf = [0u8; 8];
    source
        .read_exact(&mut buf)
        .map_err(|_| Error::PrematureEnd { tag })?;
    Ok((
        Tag(
            LittleEndian::read_u16(&buf[0..2]),
            LittleEndian::read_u16(&buf[2..4]),
        ),
        LittleEndian::read_u32(&buf[4..8]),
    ))
}

/// Consume exactly `len` bytes from the source.
fn copy_exact<S>(source: &mut S, tag: Tag, len: u64) -> Result<()>
where
    S: ?Sized + Read,
{
    let copied = std::io::copy(&mut (&mut *source).take(len), &mut std::io::sink())
        .context(SkipValueDataSnafu {
            tag,
            len: len as u32,
        })?;
    ensure!(copied == len, PrematureEndSnafu { tag });
    Ok(())
}

/// A pass-through reader that appends everything it reads to a buffer,
/// so delimited content can be captured verbatim while being parsed.
struct CaptureReader<'a, S: ?Sized> {
    from: &'a mut S,
    captured: &'a mut Vec<u8>,
}

impl<S: ?Sized + Read> Read for CaptureReader<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.from.read(buf)?;
        self.captured.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}
