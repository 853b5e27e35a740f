//! End-to-end conversion: XLSX on disk in, one-page PDF on disk out.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod fixtures;

use std::fs;
use std::path::Path;

use fixtures::{SheetBuilder, StyleBuilder, XlsxBuilder};
use xlpage::convert::{convert_file, convert_file_with_fallback, RenderOptions};
use xlpage::page_setup::{Orientation, PageConfig, PageSize};
use xlpage::parser::SheetSelector;
use xlpage::{RenderOutcome, Rendered};

fn write_input(dir: &Path, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, data).unwrap();
    path
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Inflate the page's single content stream.
fn content_stream(pdf: &[u8]) -> String {
    let start = find(pdf, b"stream\n").unwrap() + b"stream\n".len();
    let end = start + find(&pdf[start..], b"\nendstream").unwrap();
    let raw = miniz_oxide::inflate::decompress_to_vec_zlib(&pdf[start..end]).unwrap();
    String::from_utf8_lossy(&raw).into_owned()
}

#[test]
fn converts_the_active_sheet() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "report.xlsx", &fixtures::merged_header_xlsx());
    let output = tmp.path().join("out/report.pdf");

    let outcome = convert_file(&input, &output, &RenderOptions::default());
    assert_eq!(outcome, RenderOutcome::Rendered(Rendered::Primary));

    let pdf = fs::read(&output).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
    assert!(find(&pdf, b"/Count 1").is_some());
    assert!(find(&pdf, b"/Helvetica-Bold").is_some());
    assert!(find(&pdf, b"/WinAnsiEncoding").is_some());

    let content = content_stream(&pdf);
    assert!(content.contains("(Quarterly report) Tj"));
    assert!(content.contains("(1250.5) Tj"));
    assert!(!content.contains("(covered)"));
    // yellow header fill
    assert!(content.contains("1 1 0 rg"));
}

#[test]
fn page_size_follows_the_options() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "in.xlsx", &fixtures::xlsx_with_text("x"));
    let output = tmp.path().join("letter.pdf");
    let options = RenderOptions {
        page: PageConfig::new(PageSize::Letter, Orientation::Landscape, 10.0),
        ..RenderOptions::default()
    };

    assert!(convert_file(&input, &output, &options).is_success());
    let pdf = fs::read(&output).unwrap();
    assert!(find(&pdf, b"/MediaBox [0 0 792 612]").is_some());
}

#[test]
fn renders_a_named_sheet() {
    let tmp = tempfile::tempdir().unwrap();
    let data = XlsxBuilder::new()
        .sheet(SheetBuilder::new("Cover").cell("A1", "cover page", None))
        .sheet(SheetBuilder::new("Numbers").cell(
            "B2",
            "Grand total",
            Some(StyleBuilder::new().bold()),
        ))
        .build();
    let input = write_input(tmp.path(), "book.xlsx", &data);
    let output = tmp.path().join("numbers.pdf");
    let options = RenderOptions {
        sheet: SheetSelector::Name("Numbers".into()),
        ..RenderOptions::default()
    };

    assert!(convert_file(&input, &output, &options).is_success());
    let content = content_stream(&fs::read(&output).unwrap());
    assert!(content.contains("(Grand total) Tj"));
    assert!(!content.contains("cover page"));
}

#[test]
fn missing_sheet_fails_without_output() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "book.xlsx", &fixtures::xlsx_with_text("x"));
    let output = tmp.path().join("none.pdf");
    let options = RenderOptions {
        sheet: SheetSelector::Name("Nope".into()),
        ..RenderOptions::default()
    };

    let outcome = convert_file_with_fallback(&input, &output, &options);
    assert!(outcome.error().unwrap().contains("Nope"));
    assert!(!output.exists());
}

#[test]
fn empty_sheet_falls_back_to_a_blank_grid() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "blank.xlsx", &fixtures::minimal_xlsx());
    let output = tmp.path().join("blank.pdf");

    let strict = convert_file(&input, &output, &RenderOptions::default());
    assert!(!strict.is_success());
    assert!(!output.exists());

    match convert_file_with_fallback(&input, &output, &RenderOptions::default()) {
        RenderOutcome::Rendered(Rendered::Fallback { primary_error }) => {
            assert!(primary_error.contains("Sheet1"));
        }
        other => panic!("expected the plain grid, got {other:?}"),
    }
    let pdf = fs::read(&output).unwrap();
    // A4 landscape
    assert!(find(&pdf, b"/MediaBox [0 0 841.").is_some());
}

#[test]
fn output_is_byte_identical_across_runs() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "in.xlsx", &fixtures::merged_header_xlsx());
    let first = tmp.path().join("a.pdf");
    let second = tmp.path().join("b.pdf");

    assert!(convert_file(&input, &first, &RenderOptions::default()).is_success());
    assert!(convert_file(&input, &second, &RenderOptions::default()).is_success());
    assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
}

#[test]
fn non_latin_text_is_replaced_not_dropped() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_input(tmp.path(), "in.xlsx", &fixtures::xlsx_with_text("Café 東京"));
    let output = tmp.path().join("out.pdf");

    assert!(convert_file(&input, &output, &RenderOptions::default()).is_success());
    let pdf = fs::read(&output).unwrap();
    let start = find(&pdf, b"stream\n").unwrap() + b"stream\n".len();
    let end = start + find(&pdf[start..], b"\nendstream").unwrap();
    let raw = miniz_oxide::inflate::decompress_to_vec_zlib(&pdf[start..end]).unwrap();
    // é is 0xE9 in WinAnsi; each CJK character becomes '?'
    let literal = find(&raw, b"(Caf\xE9 ??) Tj").is_some();
    let hex = String::from_utf8_lossy(&raw)
        .to_lowercase()
        .contains("<436166e9203f3f> tj");
    assert!(literal || hex);
}
