// Multi-channel stacking
//
// Tektronix scopes save each channel to its own file (T0000CH1.isf,
// T0000CH2.isf, ...). Stacking collects the siblings of one file and
// returns the time axis followed by one row per channel.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{IsfError, Result};
use crate::isf_tools::{check_extension, parse_curve, IsfFile};

/// How [`read_with_companions`] finds its files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadOptions {
    /// Look for sibling channel files next to the named one.
    pub discover: bool,
    /// Companion names share the stem up to this separator.
    pub separator: String,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            discover: true,
            separator: "_".to_string(),
        }
    }
}

impl ReadOptions {
    /// Only the named file, no discovery.
    pub fn single() -> Self {
        ReadOptions {
            discover: false,
            ..Default::default()
        }
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

/// Time axis plus one calibrated row per channel, all of equal length.
#[derive(Clone, Debug)]
pub struct IsfStack {
    time: Vec<f64>,
    channels: Vec<Vec<f64>>,
    sources: Vec<PathBuf>,
}

impl IsfStack {
    /// Stack parsed files on the time domain of the first one.
    ///
    /// Files whose XINCR, XZERO or NR_PT differ from the first are left out.
    pub fn from_files(files: Vec<IsfFile>) -> Result<Self> {
        let mut files = files.into_iter();
        let first = files.next().ok_or(IsfError::NoFiles)?;

        let time = first.get_time_values();
        let mut channels = Vec::new();
        let mut sources = Vec::new();

        for isf in files {
            if first.same_time_domain(&isf) {
                channels.push(isf.file_content.data);
                sources.push(PathBuf::from(isf.file_path));
            } else {
                warn!(
                    "excluding {}: time domain differs from {}",
                    isf.file_path, first.file_path
                );
            }
        }

        channels.insert(0, first.file_content.data);
        sources.insert(0, PathBuf::from(first.file_path));

        Ok(IsfStack {
            time,
            channels,
            sources,
        })
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    /// File each channel row came from.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// `(rows, samples)`, where rows counts the time axis.
    pub fn shape(&self) -> (usize, usize) {
        (1 + self.channels.len(), self.time.len())
    }

    /// Time row first, then each channel.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        std::iter::once(self.time.as_slice()).chain(self.channels.iter().map(Vec::as_slice))
    }

    /// Write one column per row: `Time`, then each source file's stem.
    pub fn write_csv<P: AsRef<Path>>(&self, output_file: P) -> Result<()> {
        let file = File::create(output_file)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "Time")?;
        for source in &self.sources {
            let name = source
                .file_stem()
                .map(|s| s.to_string_lossy())
                .unwrap_or_default();
            write!(writer, ",{}", name)?;
        }
        writeln!(writer)?;

        for (sample, t) in self.time.iter().enumerate() {
            write!(writer, "{}", t)?;
            for channel in &self.channels {
                write!(writer, ",{}", channel[sample])?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Shared name prefix: the stem up to the first separator, minus its last
/// character (the channel number in names like `T0000CH1`).
pub fn companion_prefix<'a>(stem: &'a str, separator: &str) -> &'a str {
    let segment = if separator.is_empty() {
        stem
    } else {
        stem.split(separator).next().unwrap_or(stem)
    };

    match segment.char_indices().last() {
        Some((idx, _)) => &segment[..idx],
        None => segment,
    }
}

/// Every `.isf` file next to `primary` sharing its prefix, sorted by name.
/// `primary` itself is always included.
pub fn discover_companions(primary: &Path, separator: &str) -> Result<Vec<PathBuf>> {
    let dir = match primary.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let stem = primary
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let prefix = companion_prefix(stem, separator);

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if name.starts_with(prefix) && check_extension(Path::new(name)).is_ok() {
                names.push(name.to_string());
            }
        }
    }

    if let Some(primary_name) = primary.file_name().and_then(|n| n.to_str()) {
        if !names.iter().any(|n| n == primary_name) {
            names.push(primary_name.to_string());
        }
    }
    names.sort();

    debug!(
        "companions of {} (prefix '{}'): {:?}",
        primary.display(),
        prefix,
        names
    );

    Ok(names.into_iter().map(|name| dir.join(name)).collect())
}

/// Read one file into a two-row stack (time, data).
pub fn read_single<P: AsRef<Path>>(path: P) -> Result<IsfStack> {
    read_with_companions(path, &ReadOptions::single())
}

/// Read `path` and, if enabled, its companion channel files into one stack.
pub fn read_with_companions<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<IsfStack> {
    let path = path.as_ref();
    check_extension(path)?;

    let files = if options.discover {
        discover_companions(path, &options.separator)?
    } else {
        vec![path.to_path_buf()]
    };

    let parsed = files.iter().map(parse_curve).collect::<Result<Vec<_>>>()?;
    IsfStack::from_files(parsed)
}
