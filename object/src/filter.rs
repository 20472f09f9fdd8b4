//! Rendering of data element values as display strings.

use crate::DicomFile;
use dcmkit_core::{
    DataDictionary, DataElement, PrimitiveValue, StandardDictionary, Tag, TagNotFound, VR,
};
use dcmkit_encoding::{DefaultCharacterSetCodec, TextCodec};
use std::fmt::Write as _;

// byte values longer than this render as an elided hex dump
const MAX_RAW_DUMP: usize = 16;

/// A read-only view over a [`DicomFile`] that renders element values as
/// human-readable strings.
///
/// Rendering is a pure function of the element's current state: a value
/// mutated after the filter was created renders in its new form, never
/// a cached one. When an element's VR is unknown (`UN`, as produced by
/// Implicit VR streams for unregistered attributes), the dictionary VR
/// registered for the tag, if any, disambiguates the rendering.
#[derive(Debug)]
pub struct StringFilter<'a> {
    file: &'a DicomFile,
    dict: StandardDictionary,
}

impl<'a> StringFilter<'a> {
    /// Create a string filter over the given file.
    pub fn new(file: &'a DicomFile) -> Self {
        StringFilter {
            file,
            dict: StandardDictionary,
        }
    }

    /// Render the given element's value as a display string.
    ///
    /// Multi-valued content joins its components with backslash;
    /// opaque byte content renders as a (possibly elided) hex dump.
    pub fn to_string(&self, elem: &DataElement) -> String {
        let vr = self.effective_vr(elem);
        match elem.value() {
            PrimitiveValue::U8(bytes) => self.render_bytes(bytes, vr),
            value => value.to_str().into_owned(),
        }
    }

    /// Render the value of the element with the given tag from the
    /// file's data set.
    pub fn tag_to_string(&self, tag: Tag) -> Result<String, TagNotFound> {
        let elem = self.file.dataset().element(tag)?;
        Ok(self.to_string(elem))
    }

    /// The dictionary keyword of the given tag, or `"?"` when the
    /// attribute is not registered.
    pub fn keyword_of(&self, tag: Tag) -> &'static str {
        self.dict.by_tag(tag).map(|e| e.keyword).unwrap_or("?")
    }

    // the element's VR, falling back to the dictionary when unknown
    fn effective_vr(&self, elem: &DataElement) -> VR {
        match elem.vr() {
            VR::UN => self
                .dict
                .by_tag(elem.tag())
                .map(|e| e.vr)
                .unwrap_or(VR::UN),
            vr => vr,
        }
    }

    /// Reinterpret raw bytes under the effective VR, or fall back to a
    /// hex dump for truly opaque content.
    fn render_bytes(&self, bytes: &[u8], vr: VR) -> String {
        if vr.is_text() {
            if let Ok(text) = DefaultCharacterSetCodec.decode(bytes) {
                return text.trim_end_matches([' ', '\0']).to_owned();
            }
        }
        let rendered = match vr {
            VR::US | VR::OW => {
                join_chunks(bytes, 2, |c| u16::from_le_bytes([c[0], c[1]]).to_string())
            }
            VR::SS => join_chunks(bytes, 2, |c| i16::from_le_bytes([c[0], c[1]]).to_string()),
            VR::UL | VR::OL => join_chunks(bytes, 4, |c| {
                u32::from_le_bytes([c[0], c[1], c[2], c[3]]).to_string()
            }),
            VR::SL => join_chunks(bytes, 4, |c| {
                i32::from_le_bytes([c[0], c[1], c[2], c[3]]).to_string()
            }),
            VR::FL | VR::OF => join_chunks(bytes, 4, |c| {
                f32::from_le_bytes([c[0], c[1], c[2], c[3]]).to_string()
            }),
            VR::FD | VR::OD => join_chunks(bytes, 8, |c| {
                f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]).to_string()
            }),
            _ => None,
        };
        rendered.unwrap_or_else(|| hex_dump(bytes))
    }
}

/// Render fixed-width chunks joined with backslash,
/// or `None` when the byte count does not divide evenly.
fn join_chunks(
    bytes: &[u8],
    width: usize,
    render: impl Fn(&[u8]) -> String,
) -> Option<String> {
    if bytes.len() % width != 0 {
        return None;
    }
    let mut out = String::new();
    for (i, chunk) in bytes.chunks_exact(width).enumerate() {
        if i > 0 {
            out.push('\\');
        }
        out.push_str(&render(chunk));
    }
    Some(out)
}

fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for b in bytes.iter().take(MAX_RAW_DUMP) {
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(out, "{:02X}", b);
    }
    if bytes.len() > MAX_RAW_DUMP {
        let _ = write!(out, " ... ({} bytes)", bytes.len());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::FileMetaTableBuilder;
    use dcmkit_core::DataSet;

    fn empty_file() -> DicomFile {
        let meta = FileMetaTableBuilder::new()
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
            .media_storage_sop_instance_uid("1.2.3.4")
            .transfer_syntax("1.2.840.10008.1.2.1")
            .build()
            .unwrap();
        DicomFile::new(meta, DataSet::new())
    }

    #[test]
    fn renders_text_and_numbers() {
        let file = empty_file();
        let filter = StringFilter::new(&file);

        let elem = DataElement::new(Tag(0x0008, 0x0060), VR::CS, "MR");
        assert_eq!(filter.to_string(&elem), "MR");

        let elem = DataElement::new(Tag(0x0028, 0x0010), VR::US, vec![512u16]);
        assert_eq!(filter.to_string(&elem), "512");

        let elem = DataElement::new(
            Tag(0x0020, 0x0037),
            VR::DS,
            vec!["1".to_owned(), "0".to_owned(), "0".to_owned()],
        );
        assert_eq!(filter.to_string(&elem), "1\\0\\0");
    }

    #[test]
    fn rendering_reflects_mutation() {
        let file = empty_file();
        let filter = StringFilter::new(&file);

        let mut elem = DataElement::new(Tag(0x0010, 0x9431), VR::FL, vec![1.5f32]);
        assert_eq!(filter.to_string(&elem), "1.5");
        elem.set_array(vec![2.5f32, 3.5], 2).unwrap();
        assert_eq!(filter.to_string(&elem), "2.5\\3.5");
    }

    #[test]
    fn unknown_vr_disambiguates_through_the_dictionary() {
        let file = empty_file();
        let filter = StringFilter::new(&file);

        // (0028,0010) Rows is registered as US: raw bytes from an
        // unknown-VR stream render as a number
        let elem = DataElement::new(Tag(0x0028, 0x0010), VR::UN, vec![0x00u8, 0x02]);
        assert_eq!(filter.to_string(&elem), "512");

        // unregistered attributes stay as a hex dump
        let elem = DataElement::new(Tag(0x0009, 0x0001), VR::UN, vec![0xCAu8, 0xFE]);
        assert_eq!(filter.to_string(&elem), "CA FE");
    }

    #[test]
    fn long_byte_content_is_elided() {
        let file = empty_file();
        let filter = StringFilter::new(&file);
        let elem = DataElement::new(Tag(0x0009, 0x0001), VR::UN, vec![0u8; 100]);
        let rendered = filter.to_string(&elem);
        assert!(rendered.ends_with("... (100 bytes)"));
    }

    #[test]
    fn tag_lookup_misses_are_reported() {
        let file = empty_file();
        let filter = StringFilter::new(&file);
        assert!(filter.tag_to_string(Tag(0x0010, 0x0010)).is_err());
        assert_eq!(filter.keyword_of(Tag(0x0010, 0x0010)), "PatientName");
        assert_eq!(filter.keyword_of(Tag(0x0009, 0x0001)), "?");
    }
}
