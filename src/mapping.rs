//! Mapping file parser: behavioral column names -> genomic field names.
//!
//! One mapping per line: `behavioral_file:CAGE > genomic_file:track`.
//! Each side may carry a `namespace:` prefix, which is ignored.

use crate::error::{Result, TrackError};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Column name correspondence between input files and genomic fields.
/// Preserves mapping order from the input file.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    /// Behavioral column -> genomic field
    fields: FxHashMap<String, String>,
    /// Behavioral columns in file order
    order: Vec<String>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a mapping from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse a mapping from any readable source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let reader = BufReader::new(reader);
        let mut mapping = Self::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let (behavioral, genomic) = line.split_once('>').ok_or_else(|| TrackError::Parse {
                line: line_num + 1,
                message: format!("Mapping line needs 'column > field', got '{}'", line),
            })?;
            let behavioral = strip_namespace(behavioral);
            let genomic = strip_namespace(genomic);
            if behavioral.is_empty() || genomic.is_empty() {
                return Err(TrackError::Parse {
                    line: line_num + 1,
                    message: format!("Empty name in mapping line '{}'", line),
                });
            }

            mapping.insert(behavioral, genomic);
        }

        Ok(mapping)
    }

    /// Parse a mapping from a string.
    pub fn parse(content: &str) -> Result<Self> {
        Self::from_reader(content.as_bytes())
    }

    /// Add or replace one correspondence.
    pub fn insert(&mut self, behavioral: &str, genomic: &str) {
        if self
            .fields
            .insert(behavioral.to_string(), genomic.to_string())
            .is_none()
        {
            self.order.push(behavioral.to_string());
        }
    }

    /// Genomic field for a behavioral column.
    #[inline]
    pub fn get(&self, behavioral: &str) -> Option<&str> {
        self.fields.get(behavioral).map(String::as_str)
    }

    /// Translate a list of behavioral columns. Every column must be mapped.
    pub fn translate<S: AsRef<str>>(&self, columns: &[S]) -> Result<Vec<String>> {
        columns
            .iter()
            .map(|c| {
                self.get(c.as_ref()).map(str::to_string).ok_or_else(|| {
                    TrackError::Configuration(format!(
                        "field '{}' is not present in the mapping [{}]",
                        c.as_ref(),
                        self.order.join(", ")
                    ))
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn strip_namespace(s: &str) -> &str {
    let s = s.trim();
    match s.split_once(':') {
        Some((_, name)) => name.trim(),
        None => s,
    }
}
