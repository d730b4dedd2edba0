// ISFReader Module
// Single-file loading: extension check, header, curve, time axis, CSV export.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use log::info;

use crate::curve::{decode_curve, Calibration, IsfContent};
use crate::error::{IsfError, Result};
use crate::header::IsfHeader;

/// File extension accepted by [`parse_curve`], compared case-insensitively.
pub const ISF_EXTENSION: &str = "isf";

/// Fail with `InvalidExtension` unless `path` ends in `.isf`.
pub fn check_extension(path: &Path) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if ext.eq_ignore_ascii_case(ISF_EXTENSION) {
        Ok(())
    } else {
        Err(IsfError::InvalidExtension(ext.to_string()))
    }
}

/// One parsed ISF file.
#[derive(Clone, Debug)]
pub struct IsfFile {
    pub file_path: String,
    pub file_header: IsfHeader,
    pub file_content: IsfContent,
}

impl IsfFile {
    /// Load an `.isf` file from the given path.
    pub fn load<P: AsRef<Path>>(input_file: P) -> Result<Self> {
        let path = input_file.as_ref();
        check_extension(path)?;

        let mut reader = BufReader::new(File::open(path)?);
        let mut isf = Self::from_reader(&mut reader)?;
        isf.file_path = path.to_string_lossy().to_string();

        info!(
            "loaded {}: {} samples, {} bytes each",
            isf.file_path, isf.file_header.num_points, isf.file_header.byte_width
        );
        Ok(isf)
    }

    /// Parse from any seekable source positioned at the start of the file.
    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let file_header = IsfHeader::read_from(reader.by_ref())?;
        let file_content = decode_curve(reader, &file_header)?;

        Ok(IsfFile {
            file_path: String::new(),
            file_header,
            file_content,
        })
    }

    /// Calibrated samples.
    pub fn data(&self) -> &[f64] {
        &self.file_content.data
    }

    /// `index * XINCR + XZERO` for every sample.
    pub fn get_time_values(&self) -> Vec<f64> {
        Calibration::time(&self.file_header).axis(self.file_content.data.len())
    }

    /// True when XINCR, XZERO and NR_PT agree.
    pub fn same_time_domain(&self, other: &IsfFile) -> bool {
        let (a, b) = (&self.file_header, &other.file_header);
        a.x_incr == b.x_incr && a.x_zero == b.x_zero && a.num_points == b.num_points
    }

    /// Write time and value columns to a CSV file.
    pub fn write_csv<P: AsRef<Path>>(&self, output_file: P) -> Result<()> {
        let file = File::create(output_file)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "Time,Value")?;
        for (t, v) in self.get_time_values().iter().zip(self.data()) {
            writeln!(writer, "{},{}", t, v)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Read one `.isf` file: header tags plus calibrated data.
pub fn parse_curve<P: AsRef<Path>>(path: P) -> Result<IsfFile> {
    IsfFile::load(path)
}
