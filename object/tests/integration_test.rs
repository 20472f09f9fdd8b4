use dcmkit_core::{DataElement, DataSet, Tag, TagSet, VR};
use dcmkit_object::{
    from_reader, open_file, DicomFile, Error, FileMetaTableBuilder, ReadOptions, Reader,
    ReaderState, StringFilter, Writer,
};

const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

/// Build a small but representative file object in memory.
fn sample_file(transfer_syntax: &str) -> DicomFile {
    let meta = FileMetaTableBuilder::new()
        .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
        .media_storage_sop_instance_uid("1.2.3.4.5.6")
        .transfer_syntax(transfer_syntax)
        .build()
        .unwrap();

    let mut dataset = DataSet::new();
    dataset.put(DataElement::new(
        Tag(0x0008, 0x0008),
        VR::CS,
        vec!["DERIVED".to_owned(), "PRIMARY".to_owned()],
    ));
    dataset.put(DataElement::new(Tag(0x0008, 0x0060), VR::CS, "MR"));
    dataset.put(DataElement::new(
        Tag(0x0010, 0x0010),
        VR::PN,
        "Doe^John",
    ));
    dataset.put(DataElement::new(
        Tag(0x0020, 0x0037),
        VR::DS,
        vec![
            "1".to_owned(),
            "0".to_owned(),
            "0".to_owned(),
            "0".to_owned(),
            "1".to_owned(),
            "0".to_owned(),
        ],
    ));
    dataset.put(DataElement::new(Tag(0x0028, 0x0010), VR::US, vec![2u16]));
    dataset.put(DataElement::new(Tag(0x0028, 0x0011), VR::US, vec![2u16]));
    dataset.put(DataElement::new(
        PIXEL_DATA,
        VR::OW,
        vec![100u16, 200, 300, 400],
    ));

    DicomFile::new(meta, dataset)
}

#[test]
fn file_round_trip_through_a_byte_stream() {
    let original = sample_file("1.2.840.10008.1.2.1");

    let mut encoded = Vec::new();
    original.write_to(&mut encoded).unwrap();
    let decoded = from_reader(encoded.as_slice()).unwrap();
    assert_eq!(decoded, original);

    // a second round trip is exact as well
    let mut encoded_again = Vec::new();
    decoded.write_to(&mut encoded_again).unwrap();
    assert_eq!(encoded_again, encoded);
}

#[test]
fn file_round_trip_through_the_file_system() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.dcm");

    let original = sample_file("1.2.840.10008.1.2.1");
    let mut writer = Writer::new();
    writer.set_file(original.clone());
    writer.set_file_name(&path);
    writer.write().unwrap();

    let decoded = open_file(&path).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn implicit_vr_round_trip_preserves_registered_attributes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("implicit.dcm");

    let original = sample_file("1.2.840.10008.1.2");
    original.write_to_file(&path).unwrap();

    let decoded = open_file(&path).unwrap();
    // every attribute of the sample is registered, so the VRs resolve
    // through the dictionary and the values come back identical
    for elem in original.dataset().iter() {
        let got = decoded.dataset().element(elem.tag()).unwrap();
        assert_eq!(got.value(), elem.value(), "mismatch at {}", elem.tag());
    }
}

#[test]
fn reader_stops_at_pixel_data_without_decoding_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stop.dcm");
    sample_file("1.2.840.10008.1.2.1")
        .write_to_file(&path)
        .unwrap();

    let mut skip = TagSet::new();
    skip.insert(PIXEL_DATA);

    let mut reader = Reader::new();
    reader.set_file_name(&path);
    reader.read_up_to(PIXEL_DATA, &skip).unwrap();
    assert_eq!(reader.state(), ReaderState::Stopped);

    let file = reader.file().unwrap();
    assert!(!file.dataset().contains(PIXEL_DATA));
    assert!(file.dataset().contains(Tag(0x0028, 0x0011)));
    assert_eq!(
        file.dataset()
            .element(Tag(0x0010, 0x0010))
            .unwrap()
            .to_str(),
        "Doe^John"
    );
}

#[test]
fn reader_completes_when_the_stop_tag_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.dcm");
    sample_file("1.2.840.10008.1.2.1")
        .write_to_file(&path)
        .unwrap();

    let mut reader = Reader::new();
    reader.set_file_name(&path);
    // beyond every tag in the file: the read runs to the end
    reader
        .read_up_to(Tag(0xFFFC, 0xFFFC), &TagSet::new())
        .unwrap();
    assert_eq!(reader.state(), ReaderState::Complete);
    assert!(reader.file().unwrap().dataset().contains(PIXEL_DATA));
}

#[test]
fn skip_set_elements_are_bypassed_mid_stream() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("skip.dcm");
    sample_file("1.2.840.10008.1.2.1")
        .write_to_file(&path)
        .unwrap();

    let skipped = Tag(0x0020, 0x0037);
    let file = ReadOptions::new().skip([skipped]).open_file(&path).unwrap();
    assert!(!file.dataset().contains(skipped));
    // everything around the skipped element is intact
    assert!(file.dataset().contains(Tag(0x0010, 0x0010)));
    assert!(file.dataset().contains(PIXEL_DATA));
}

#[test]
fn mutated_arrays_show_through_the_string_filter() {
    let mut file = sample_file("1.2.840.10008.1.2.1");

    let filter = StringFilter::new(&file);
    assert_eq!(
        filter.tag_to_string(Tag(0x0020, 0x0037)).unwrap(),
        "1\\0\\0\\0\\1\\0"
    );

    // fetch, mutate, put back
    let mut elem = file.dataset().element(Tag(0x0020, 0x0037)).unwrap().clone();
    elem.set_vr(VR::FD);
    elem.set_array(vec![0.0f64, 1.0, 0.0, 1.0, 0.0, 0.0], 6)
        .unwrap();
    file.dataset_mut().put(elem);

    let filter = StringFilter::new(&file);
    assert_eq!(
        filter.tag_to_string(Tag(0x0020, 0x0037)).unwrap(),
        "0\\1\\0\\1\\0\\0"
    );
}

#[test]
fn truncated_files_fail_to_read() {
    let mut encoded = Vec::new();
    sample_file("1.2.840.10008.1.2.1")
        .write_to(&mut encoded)
        .unwrap();
    // cut into the pixel data value
    encoded.truncate(encoded.len() - 3);

    let err = from_reader(encoded.as_slice()).unwrap_err();
    assert!(matches!(err, Error::DecodeValue { .. }));
}

#[test]
fn with_meta_fills_the_instance_uid_from_the_data_set() {
    let mut dataset = DataSet::new();
    dataset.put(DataElement::new(
        Tag(0x0008, 0x0018),
        VR::UI,
        "1.2.3.4.777",
    ));
    let file = DicomFile::with_meta(
        dataset,
        FileMetaTableBuilder::new()
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
            .transfer_syntax("1.2.840.10008.1.2.1"),
    )
    .unwrap();
    assert_eq!(file.meta().media_storage_sop_instance_uid, "1.2.3.4.777");
}

#[test]
fn unsupported_transfer_syntaxes_are_rejected() {
    // JPEG baseline, which this toolkit does not decode
    let file = sample_file("1.2.840.10008.1.2.4.50");
    let mut encoded = Vec::new();
    let err = file.write_to(&mut encoded).unwrap_err();
    assert!(matches!(err, Error::UnsupportedTransferSyntax { .. }));
}
