// ISF curve decoder
//
// Turns the binary block after `:CURVE` into raw integers and calibrated
// values, driven by BYT_OR, BN_FMT, BYT_NR, NR_PT, YMULT and YZERO.

use std::io::{Read, Seek, SeekFrom};

use log::debug;

use crate::error::{IsfError, Result};
use crate::header::IsfHeader;

/// Largest buffer reserved ahead of reading the sample block.
const MAX_PREALLOC: usize = 8 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    /// `MSB` is big-endian, anything else little-endian.
    pub fn from_tag(value: &str) -> Self {
        if value == "MSB" {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signedness {
    Signed,
    Unsigned,
}

impl Signedness {
    /// `RI` is signed, anything else (normally `RP`) unsigned.
    pub fn from_tag(value: &str) -> Self {
        if value == "RI" {
            Signedness::Signed
        } else {
            Signedness::Unsigned
        }
    }
}

/// Fixed-width integer layout of one sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementCodec {
    order: ByteOrder,
    signedness: Signedness,
    width: usize,
}

impl ElementCodec {
    pub fn new(order: ByteOrder, signedness: Signedness, width: usize) -> Result<Self> {
        match width {
            1 | 2 | 4 | 8 => Ok(ElementCodec {
                order,
                signedness,
                width,
            }),
            other => Err(IsfError::UnsupportedWidth(other)),
        }
    }

    pub fn for_header(header: &IsfHeader) -> Result<Self> {
        Self::new(
            ByteOrder::from_tag(&header.byte_order),
            Signedness::from_tag(&header.binary_format),
            header.byte_width,
        )
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn signedness(&self) -> Signedness {
        self.signedness
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Assemble `bytes` (exactly `width` long) into an unsigned value.
    fn assemble(&self, bytes: &[u8]) -> u64 {
        let fold = |acc: u64, &b: &u8| (acc << 8) | b as u64;
        match self.order {
            ByteOrder::BigEndian => bytes.iter().fold(0, fold),
            ByteOrder::LittleEndian => bytes.iter().rev().fold(0, fold),
        }
    }

    pub fn decode_unsigned(&self, bytes: &[u8]) -> u64 {
        self.assemble(bytes)
    }

    pub fn decode_signed(&self, bytes: &[u8]) -> i64 {
        let shift = 64 - 8 * self.width as u32;
        ((self.assemble(bytes) << shift) as i64) >> shift
    }

    /// Split a block into samples. A trailing partial sample is dropped.
    pub fn decode_all(&self, block: &[u8]) -> RawSamples {
        let chunks = block.chunks_exact(self.width);
        match self.signedness {
            Signedness::Signed => RawSamples::Signed(chunks.map(|c| self.decode_signed(c)).collect()),
            Signedness::Unsigned => {
                RawSamples::Unsigned(chunks.map(|c| self.decode_unsigned(c)).collect())
            }
        }
    }
}

/// Uncalibrated sample values as stored in the file.
#[derive(Clone, Debug, PartialEq)]
pub enum RawSamples {
    Signed(Vec<i64>),
    Unsigned(Vec<u64>),
}

impl Default for RawSamples {
    fn default() -> Self {
        RawSamples::Signed(Vec::new())
    }
}

impl RawSamples {
    pub fn len(&self) -> usize {
        match self {
            RawSamples::Signed(v) => v.len(),
            RawSamples::Unsigned(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            RawSamples::Signed(v) => v.iter().map(|&x| x as f64).collect(),
            RawSamples::Unsigned(v) => v.iter().map(|&x| x as f64).collect(),
        }
    }
}

/// `physical = raw * slope + offset`, used for both axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Calibration {
    pub slope: f64,
    pub offset: f64,
}

impl Calibration {
    pub fn amplitude(header: &IsfHeader) -> Self {
        Calibration {
            slope: header.y_mult,
            offset: header.y_zero,
        }
    }

    pub fn time(header: &IsfHeader) -> Self {
        Calibration {
            slope: header.x_incr,
            offset: header.x_zero,
        }
    }

    pub fn apply(&self, raw: f64) -> f64 {
        raw * self.slope + self.offset
    }

    /// `apply(i)` for every index in `0..count`.
    pub fn axis(&self, count: usize) -> Vec<f64> {
        (0..count).map(|i| self.apply(i as f64)).collect()
    }
}

/// Decoded curve: raw integers and their calibrated values.
#[derive(Clone, Debug, Default)]
pub struct IsfContent {
    pub raw: RawSamples,
    pub data: Vec<f64>,
}

/// Seek to `header.data_offset` and decode exactly `NR_PT` samples.
pub fn decode_curve<R: Read + Seek>(reader: &mut R, header: &IsfHeader) -> Result<IsfContent> {
    let codec = ElementCodec::for_header(header)?;

    let expected = header.expected_data_len().ok_or_else(|| IsfError::InvalidTagValue {
        tag: "NR_PT".to_string(),
        value: header.num_points.to_string(),
    })?;
    if header.curve.declared_len != expected {
        return Err(IsfError::DataLengthMismatch {
            declared: header.curve.declared_len,
            expected,
        });
    }

    reader.seek(SeekFrom::Start(header.data_offset))?;

    // read_to_end grows past the reservation as bytes arrive
    let mut block = Vec::with_capacity(expected.min(MAX_PREALLOC));
    reader.by_ref().take(expected as u64).read_to_end(&mut block)?;

    if block.len() < expected {
        return Err(IsfError::TruncatedData {
            expected: header.num_points,
            actual: block.len() / codec.width(),
        });
    }

    let raw = codec.decode_all(&block);
    let calibration = Calibration::amplitude(header);
    let data = raw.to_f64().into_iter().map(|r| calibration.apply(r)).collect();

    debug!(
        "decoded {} samples ({:?}, {:?}, {} bytes each)",
        raw.len(),
        codec.order(),
        codec.signedness(),
        codec.width()
    );

    Ok(IsfContent { raw, data })
}
