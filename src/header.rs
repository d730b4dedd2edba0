// ISF header tokenizer
//
// An ISF file opens with `TAG VALUE;` pairs and ends its text part at the
// `:CURVE` tag, whose value is an IEEE 488.2 definite-length block prefix
// (`#`, one digit n, then n digits of byte count) rather than text.

use std::io::{self, Read};
use std::str::FromStr;

use log::debug;

use crate::error::{IsfError, Result};

/// Tag that ends the text header and introduces the binary sample block.
pub const CURVE_TAG: &str = ":CURVE";

/// Scanner states. Tags end at a space, values at a semicolon, and a
/// semicolon inside double quotes belongs to the value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanState {
    Tag,
    Value,
    QuotedValue,
}

impl ScanState {
    fn describe(self) -> &'static str {
        match self {
            ScanState::Tag => "tag name",
            ScanState::Value => "tag value",
            ScanState::QuotedValue => "quoted tag value",
        }
    }
}

/// The `#<n><length>` record stored as the value of `:CURVE`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurvePrefix {
    /// Marker, digit count and length digits exactly as read.
    pub raw: Vec<u8>,
    /// Byte length of the sample block that follows.
    pub declared_len: usize,
}

/// Tokenizer output: every tag in file order plus the sentinel record.
#[derive(Clone, Debug)]
pub struct RawHeader {
    pub tags: Vec<(String, String)>,
    pub curve: CurvePrefix,
    /// Offset of the first sample byte.
    pub data_offset: u64,
}

/// Byte-at-a-time header scanner over any reader.
///
/// The reader is never read past the end of the curve prefix, so the
/// reported offset is exact even for unbuffered sources.
pub struct HeaderTokenizer<R> {
    reader: R,
    position: u64,
}

impl<R: Read> HeaderTokenizer<R> {
    pub fn new(reader: R) -> Self {
        HeaderTokenizer { reader, position: 0 }
    }

    /// Read tag/value pairs until `:CURVE` has been consumed.
    pub fn tokenize(mut self) -> Result<RawHeader> {
        let mut tags: Vec<(String, String)> = Vec::new();

        loop {
            let name = self.read_token(ScanState::Tag)?;

            if name == CURVE_TAG {
                let curve = self.read_curve_prefix()?;
                debug!(
                    "{} declares {} data bytes at offset {}",
                    CURVE_TAG, curve.declared_len, self.position
                );
                return Ok(RawHeader {
                    tags,
                    curve,
                    data_offset: self.position,
                });
            }

            let value = self.read_token(ScanState::Value)?;

            if tags.iter().any(|(existing, _)| *existing == name) {
                return Err(IsfError::MalformedHeader(format!(
                    "duplicate tag '{}' at byte {}",
                    name, self.position
                )));
            }

            debug!("tag {} = {}", name, value);
            tags.push((name, value));
        }
    }

    fn read_token(&mut self, start: ScanState) -> Result<String> {
        let mut token = Vec::new();
        let mut state = start;

        loop {
            let byte = self.next_byte(state.describe())?;

            // Separators left over from the previous pair
            if state == ScanState::Tag && token.is_empty() && byte.is_ascii_whitespace() {
                continue;
            }

            state = match (state, byte) {
                (ScanState::Tag, b' ') | (ScanState::Value, b';') => break,
                (ScanState::Value, b'"') => ScanState::QuotedValue,
                (ScanState::QuotedValue, b'"') => ScanState::Value,
                (current, _) => current,
            };
            token.push(byte);
        }

        Ok(String::from_utf8_lossy(&token).trim().to_string())
    }

    fn read_curve_prefix(&mut self) -> Result<CurvePrefix> {
        let mut lead = [0u8; 2];
        self.read_raw(&mut lead)?;

        if lead[0] != b'#' {
            return Err(IsfError::MalformedHeader(format!(
                "{} block must start with '#', found 0x{:02x}",
                CURVE_TAG, lead[0]
            )));
        }

        let digits = match lead[1] {
            b'1'..=b'9' => (lead[1] - b'0') as usize,
            other => {
                return Err(IsfError::MalformedHeader(format!(
                    "{} block has invalid digit count '{}'",
                    CURVE_TAG,
                    other.escape_ascii()
                )))
            }
        };

        let mut length = vec![0u8; digits];
        self.read_raw(&mut length)?;

        let declared_len = std::str::from_utf8(&length)
            .ok()
            .filter(|text| text.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|text| text.parse::<usize>().ok())
            .ok_or_else(|| {
                IsfError::MalformedHeader(format!(
                    "{} block length '{}' is not a decimal number",
                    CURVE_TAG,
                    length.escape_ascii()
                ))
            })?;

        let mut raw = lead.to_vec();
        raw.extend_from_slice(&length);

        Ok(CurvePrefix { raw, declared_len })
    }

    fn next_byte(&mut self, context: &str) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read_exact_or_malformed(&mut byte, context)?;
        Ok(byte[0])
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> Result<()> {
        self.read_exact_or_malformed(buf, "curve block prefix")
    }

    fn read_exact_or_malformed(&mut self, buf: &mut [u8], context: &str) -> Result<()> {
        match self.reader.read_exact(buf) {
            Ok(()) => {
                self.position += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(IsfError::MalformedHeader(format!(
                    "unexpected end of file after byte {} while reading {}",
                    self.position, context
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Strip one pair of enclosing double quotes, if present.
pub fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

/// Last `:`-separated segment, so `:WFMPRE:BYT_NR` answers to `BYT_NR`.
fn leaf_name(tag: &str) -> &str {
    tag.rsplit(':').next().unwrap_or(tag)
}

fn find_tag<'a>(tags: &'a [(String, String)], name: &str) -> Option<&'a str> {
    tags.iter()
        .find(|(tag, _)| tag == name)
        .or_else(|| tags.iter().find(|(tag, _)| leaf_name(tag) == name))
        .map(|(_, value)| value.as_str())
}

fn required<'a>(tags: &'a [(String, String)], name: &str) -> Result<&'a str> {
    find_tag(tags, name).ok_or_else(|| IsfError::MissingTag(name.to_string()))
}

fn parse_required<T: FromStr>(tags: &[(String, String)], name: &str) -> Result<T> {
    let value = required(tags, name)?;
    value.parse::<T>().map_err(|_| IsfError::InvalidTagValue {
        tag: name.to_string(),
        value: value.to_string(),
    })
}

/// Typed view of an ISF header.
///
/// The fields the decoder and the stacking code rely on are parsed up front;
/// every tag, recognised or not, stays available through [`IsfHeader::get`].
#[derive(Clone, Debug)]
pub struct IsfHeader {
    tags: Vec<(String, String)>,
    pub curve: CurvePrefix,
    pub data_offset: u64,
    pub encoding: String,
    pub byte_order: String,
    pub binary_format: String,
    pub byte_width: usize,
    pub num_points: usize,
    pub y_mult: f64,
    pub y_zero: f64,
    pub x_incr: f64,
    pub x_zero: f64,
}

impl IsfHeader {
    /// Tokenize a header straight from a reader positioned at byte 0.
    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        Self::from_raw(HeaderTokenizer::new(reader).tokenize()?)
    }

    pub fn from_raw(raw: RawHeader) -> Result<Self> {
        let RawHeader {
            tags,
            curve,
            data_offset,
        } = raw;

        let encoding = required(&tags, "ENCDG")?.to_string();
        if encoding != "BINARY" {
            return Err(IsfError::UnsupportedEncoding(encoding));
        }

        let byte_order = required(&tags, "BYT_OR")?.to_string();
        let binary_format = required(&tags, "BN_FMT")?.to_string();
        let byte_width = parse_required(&tags, "BYT_NR")?;
        let num_points = parse_required(&tags, "NR_PT")?;
        let y_mult = parse_required(&tags, "YMULT")?;
        let y_zero = parse_required(&tags, "YZERO")?;
        let x_incr = parse_required(&tags, "XINCR")?;
        let x_zero = parse_required(&tags, "XZERO")?;

        Ok(IsfHeader {
            tags,
            curve,
            data_offset,
            encoding,
            byte_order,
            binary_format,
            byte_width,
            num_points,
            y_mult,
            y_zero,
            x_incr,
            x_zero,
        })
    }

    /// All tags in file order, `:CURVE` excluded.
    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    /// Look a tag up by full name or by its last `:` segment.
    pub fn get(&self, name: &str) -> Option<&str> {
        find_tag(&self.tags, name)
    }

    pub fn x_unit(&self) -> Option<&str> {
        self.get("XUNIT").map(unquote)
    }

    pub fn y_unit(&self) -> Option<&str> {
        self.get("YUNIT").map(unquote)
    }

    pub fn waveform_id(&self) -> Option<&str> {
        self.get("WFID").map(unquote)
    }

    /// Byte length of the sample block implied by `NR_PT` and the width.
    pub fn expected_data_len(&self) -> Option<usize> {
        self.num_points.checked_mul(self.byte_width)
    }
}
