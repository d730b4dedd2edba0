// tests/integration.rs
// Integration tests for ISF Reader

use std::fs;
use std::path::Path;

use proptest::prelude::*;
use tempfile::tempdir;

use isf_reader::{
    parse_curve, read_single, read_with_companions, IsfError, IsfFile, RawSamples, ReadOptions,
};

/// Write an ISF file the way a TDS 2000 series scope does: 16-bit big-endian
/// signed samples, quoted free-text tags, CR/LF terminated.
fn create_test_isf_file(path: &Path, samples: &[i16], x_zero: &str) {
    let payload: Vec<u8> = samples.iter().flat_map(|s| s.to_be_bytes()).collect();
    let len = payload.len().to_string();

    let header = format!(
        ":WFMPRE:BYT_NR 2;BIT_NR 16;ENCDG BINARY;BN_FMT RI;BYT_OR MSB;\
         WFID \"Ch1, DC coupling, 2.0E0 V/div, 1.0E-3 s/div, {n} points, Sample mode\";\
         NR_PT {n};PT_FMT Y;XUNIT \"s\";XINCR 4.0E-6;XZERO {x_zero};PT_OFF 0;\
         YUNIT \"V\";YMULT 3.125E-4;YOFF 0.0E0;YZERO 0.0E0;:CURVE #{digits}{len}",
        n = samples.len(),
        x_zero = x_zero,
        digits = len.len(),
        len = len,
    );

    let mut bytes = header.into_bytes();
    bytes.extend_from_slice(&payload);
    bytes.extend_from_slice(b"\r\n");
    fs::write(path, bytes).expect("Failed to create test file");
}

fn sine(n: usize, amplitude: f64) -> Vec<i16> {
    (0..n)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            (amplitude * phase.sin()) as i16
        })
        .collect()
}

#[test]
fn test_load_scope_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("T0000CH1.ISF");
    let samples = sine(2500, 20_000.0);
    create_test_isf_file(&path, &samples, "-5.0E-3");

    let isf = parse_curve(&path).expect("Failed to load ISF file");
    let header = &isf.file_header;

    assert_eq!(header.encoding, "BINARY");
    assert_eq!(header.byte_width, 2);
    assert_eq!(header.num_points, 2500);
    assert_eq!(header.curve.declared_len, 5000);
    assert_eq!(header.curve.raw, b"#45000".to_vec());
    assert_eq!(header.x_unit(), Some("s"));
    assert!(header.waveform_id().unwrap().starts_with("Ch1, DC coupling"));

    let expected: Vec<i64> = samples.iter().map(|&s| s as i64).collect();
    assert_eq!(isf.file_content.raw, RawSamples::Signed(expected));

    for (raw, value) in samples.iter().zip(isf.data()) {
        assert_eq!(*value, *raw as f64 * 3.125E-4);
    }

    let times = isf.get_time_values();
    assert_eq!(times.len(), 2500);
    assert_eq!(times[0], -5.0E-3);
    assert_eq!(times[2499], 2499.0 * 4.0E-6 + -5.0E-3);
}

#[test]
fn test_documented_example() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("example.isf");

    let mut bytes = b"BYT_NR 2;ENCDG BINARY;BYT_OR LSB;BN_FMT RI;NR_PT 4;\
        YMULT 1.0;YZERO 0.0;XINCR 1.0;XZERO 0.0;:CURVE #18"
        .to_vec();
    for v in [-1i16, 0, 1, 1000] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    fs::write(&path, bytes).unwrap();

    let isf = parse_curve(&path).unwrap();
    assert_eq!(isf.data(), &[-1.0, 0.0, 1.0, 1000.0]);
}

#[test]
fn test_stack_channels() {
    let dir = tempdir().unwrap();
    create_test_isf_file(&dir.path().join("T0000CH1.ISF"), &sine(100, 1000.0), "0.0E0");
    create_test_isf_file(&dir.path().join("T0000CH2.ISF"), &sine(100, 2000.0), "0.0E0");
    create_test_isf_file(&dir.path().join("T0000CH3.ISF"), &sine(100, 3000.0), "1.0E-3");

    let stack = read_with_companions(dir.path().join("T0000CH1.ISF"), &ReadOptions::default())
        .expect("Failed to stack channels");
    assert_eq!(stack.shape(), (3, 100));

    let csv_file = dir.path().join("stack.csv");
    stack.write_csv(&csv_file).expect("Failed to write CSV");

    let content = fs::read_to_string(&csv_file).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 101);
    assert_eq!(lines[0], "Time,T0000CH1,T0000CH2");

    let single = read_single(dir.path().join("T0000CH3.ISF")).unwrap();
    assert_eq!(single.shape(), (2, 100));
    assert_eq!(single.time()[0], 1.0E-3);
}

#[test]
fn test_error_handling() {
    let dir = tempdir().unwrap();

    // Non-existent file
    let result = parse_curve(dir.path().join("non_existent.isf"));
    assert!(matches!(result, Err(IsfError::Io(_))));

    // Wrong extension
    let result = parse_curve(dir.path().join("capture.wfm"));
    assert!(matches!(result, Err(IsfError::InvalidExtension(_))));

    // Text that never reaches :CURVE
    let bad_file = dir.path().join("bad.isf");
    fs::write(&bad_file, b"This is not an ISF file").unwrap();
    assert!(matches!(parse_curve(&bad_file), Err(IsfError::MalformedHeader(_))));

    // Sample block cut short
    let short_file = dir.path().join("short.isf");
    create_test_isf_file(&short_file, &[1, 2, 3, 4], "0.0E0");
    let mut bytes = fs::read(&short_file).unwrap();
    bytes.truncate(bytes.len() - 5);
    fs::write(&short_file, bytes).unwrap();
    assert!(matches!(
        parse_curve(&short_file),
        Err(IsfError::TruncatedData {
            expected: 4,
            actual: 2
        })
    ));
}

proptest! {
    #[test]
    fn prop_raw_roundtrip(values in proptest::collection::vec(any::<i16>(), 1..200)) {
        let mut bytes = format!(
            "BYT_NR 2;ENCDG BINARY;BYT_OR MSB;BN_FMT RI;NR_PT {};YMULT 2.0;YZERO 1.0;\
             XINCR 1.0;XZERO 0.0;:CURVE #{}{}",
            values.len(),
            (values.len() * 2).to_string().len(),
            values.len() * 2
        )
        .into_bytes();
        for v in &values {
            bytes.extend_from_slice(&v.to_be_bytes());
        }

        let isf = IsfFile::from_reader(&mut std::io::Cursor::new(bytes)).unwrap();

        let expected: Vec<i64> = values.iter().map(|&v| v as i64).collect();
        prop_assert_eq!(&isf.file_content.raw, &RawSamples::Signed(expected));
        for (v, physical) in values.iter().zip(isf.data()) {
            prop_assert_eq!(*physical, 2.0 * *v as f64 + 1.0);
        }
    }
}
