use std::fs::File;
use std::io::Write;

use station_config::load_sample_trace;
use tempfile::tempdir;

#[test]
fn loads_raw_samples_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trace.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "raw").unwrap();
    writeln!(f, "8388608").unwrap();
    writeln!(f, "8406408").unwrap();
    writeln!(f, "-12").unwrap();

    let samples = load_sample_trace(&path).unwrap();
    assert_eq!(samples, vec![8_388_608, 8_406_408, -12]);
}

#[test]
fn header_must_be_raw() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trace.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "raw,grams").unwrap();
    writeln!(f, "100,0.0").unwrap();

    let err = load_sample_trace(&path).unwrap_err();
    assert!(format!("{err}").contains("header 'raw'"));
}

#[test]
fn non_numeric_row_reports_line() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trace.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "raw").unwrap();
    writeln!(f, "100").unwrap();
    writeln!(f, "abc").unwrap();

    let err = load_sample_trace(&path).unwrap_err();
    assert!(format!("{err}").contains("invalid CSV row 3"));
}

#[test]
fn empty_trace_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trace.csv");
    let mut f = File::create(&path).unwrap();
    writeln!(f, "raw").unwrap();

    let err = load_sample_trace(&path).unwrap_err();
    assert!(format!("{err}").contains("no samples"));
}

#[test]
fn missing_file_errors() {
    let dir = tempdir().unwrap();
    let err = load_sample_trace(&dir.path().join("nope.csv")).unwrap_err();
    assert!(format!("{err}").contains("open sample trace"));
}
