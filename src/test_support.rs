// Synthetic ISF files for unit tests

use std::fs;
use std::path::Path;

/// Builds ISF bytes from a tag list and a raw payload.
///
/// Starts from the tag set a TDS scope writes for a 16-bit little-endian
/// signed capture with no samples.
pub(crate) struct IsfBuilder {
    tags: Vec<(String, String)>,
    payload: Vec<u8>,
    declared_len: Option<usize>,
}

impl IsfBuilder {
    pub fn new() -> Self {
        let tags = [
            (":WFMPRE:BYT_NR", "2"),
            ("BIT_NR", "16"),
            ("ENCDG", "BINARY"),
            ("BN_FMT", "RI"),
            ("BYT_OR", "LSB"),
            ("WFID", "\"Ch1, DC coupling; 2.0V/div\""),
            ("NR_PT", "0"),
            ("PT_FMT", "Y"),
            ("XUNIT", "\"s\""),
            ("XINCR", "1.0E-6"),
            ("XZERO", "0.0E+0"),
            ("PT_OFF", "0"),
            ("YUNIT", "\"V\""),
            ("YMULT", "1.0"),
            ("YOFF", "0.0E+0"),
            ("YZERO", "0.0"),
        ];

        IsfBuilder {
            tags: tags
                .iter()
                .map(|(t, v)| (t.to_string(), v.to_string()))
                .collect(),
            payload: Vec::new(),
            declared_len: None,
        }
    }

    /// Set a tag, replacing an existing one with the same name.
    pub fn tag(mut self, name: &str, value: &str) -> Self {
        match self.tags.iter_mut().find(|(t, _)| t == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.tags.push((name.to_string(), value.to_string())),
        }
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.tags.retain(|(t, _)| t != name);
        self
    }

    /// Append a tag even if the name is already present.
    pub fn duplicate(mut self, name: &str, value: &str) -> Self {
        self.tags.push((name.to_string(), value.to_string()));
        self
    }

    /// Insert a tag at `index` in file order, duplicates allowed.
    pub fn insert(mut self, index: usize, name: &str, value: &str) -> Self {
        let index = index.min(self.tags.len());
        self.tags.insert(index, (name.to_string(), value.to_string()));
        self
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn payload(mut self, bytes: &[u8]) -> Self {
        self.payload = bytes.to_vec();
        self
    }

    /// Override the byte count written after `:CURVE`.
    pub fn declared_len(mut self, len: usize) -> Self {
        self.declared_len = Some(len);
        self
    }

    pub fn samples_i16_le(self, values: &[i16]) -> Self {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.tag(":WFMPRE:BYT_NR", "2")
            .tag("NR_PT", &values.len().to_string())
            .payload(&bytes)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, value) in &self.tags {
            out.extend_from_slice(format!("{} {};", name, value).as_bytes());
        }

        let len = self.declared_len.unwrap_or(self.payload.len()).to_string();
        out.extend_from_slice(format!(":CURVE #{}{}", len.len(), len).as_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    pub fn write_to(&self, path: &Path) {
        fs::write(path, self.build()).unwrap();
    }
}
