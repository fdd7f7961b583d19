mod common;

use aurora::formats::gda::identify_type;
use aurora::prelude::*;
use common::id_label_gda;
use pretty_assertions::assert_eq;

#[test]
fn test_merged_table_row_addressing() {
    let files = [
        id_label_gda(&[(1, "one"), (2, "two")]),
        id_label_gda(&[]),
        id_label_gda(&[(3, "three"), (4, "four"), (5, "five")]),
    ];

    let mut table = GdaFile::load(files[0].clone()).unwrap();
    table.add(files[1].clone()).unwrap_err(); // empty file infers Empty column types
    table.add(files[2].clone()).unwrap();

    assert_eq!(table.file_count(), 2);
    assert_eq!(table.row_count(), 5);

    let labels: Vec<String> = (0..table.row_count())
        .map(|row| table.get_string(row, "Label", "").unwrap())
        .collect();
    assert_eq!(labels, vec!["one", "two", "three", "four", "five"]);
    assert!(table.get_row(5).is_none());
    assert_eq!(table.find_row(4).unwrap(), 3);
}

#[test]
fn test_identify_type_uses_first_row() {
    let data = id_label_gda(&[(1, "one")]);
    let gff = Gff4File::load(data, *b"G2DA").unwrap();
    let top = gff.top_level();
    let columns = top.get_list(&field_label(10000)).unwrap();
    let rows = top.get_list(&field_label(10001)).unwrap();

    let types: Vec<_> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| identify_type(column, rows, i).unwrap())
        .collect();
    assert_eq!(types, vec![GdaColumnType::Int, GdaColumnType::String]);
}

#[test]
fn test_wrong_container_type_rejected() {
    let tlk = common::gff_tlk(&[(0, "x")]);
    let err = GdaFile::load(tlk).unwrap_err();
    assert!(matches!(err.root_cause(), Error::GffTypeMismatch { .. }));
}
