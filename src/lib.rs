// src/lib.rs
// ISF Reader Library - Public API

//! # ISF Reader
//!
//! A Rust library for reading Tektronix ISF (Internal Signal Format) waveform files.
//!
//! An ISF file is a text header of `TAG VALUE;` pairs followed by `:CURVE`
//! and a binary block of fixed-width integer samples. The reader decodes the
//! block with the byte order, signedness and width the header declares, and
//! calibrates each sample as `raw * YMULT + YZERO`.
//!
//! ## Features
//!
//! - Quote-aware header tokenizer with typed access to the required tags
//! - 1, 2, 4 and 8 byte samples, signed or unsigned, either byte order
//! - Time axis from `XINCR` / `XZERO`
//! - Stacking of companion channel files (`T0000CH1.isf`, `T0000CH2.isf`, ...)
//! - CSV export
//!
//! ## Example
//!
//! ```no_run
//! use isf_reader::{parse_curve, read_with_companions, ReadOptions};
//!
//! let isf = parse_curve("T0000CH1.isf").expect("Failed to load file");
//! println!("Samples: {}", isf.file_header.num_points);
//! println!("First sample: {} V", isf.data()[0]);
//!
//! // Time axis plus every channel saved alongside
//! let stack = read_with_companions("T0000CH1.isf", &ReadOptions::default())
//!     .expect("Failed to stack channels");
//! let (rows, samples) = stack.shape();
//! println!("{} rows x {} samples", rows, samples);
//!
//! stack.write_csv("output.csv").expect("Failed to write CSV");
//! ```

pub mod companions;
pub mod curve;
pub mod error;
pub mod header;
mod isf_tools;

#[cfg(test)]
mod test_support;

pub use companions::{read_single, read_with_companions, IsfStack, ReadOptions};
pub use curve::{ByteOrder, Calibration, ElementCodec, IsfContent, RawSamples, Signedness};
pub use error::{IsfError, Result};
pub use header::{HeaderTokenizer, IsfHeader, CURVE_TAG};
pub use isf_tools::{check_extension, parse_curve, IsfFile, ISF_EXTENSION};
