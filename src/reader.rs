//! Delimited behavioral file reader.
//!
//! Reads a header-led (or field-list described) delimited text file, maps
//! its columns to genomic field names and produces a [`Dataset`].
//! Coordinates become integers, `dataValue` becomes a float, every other
//! column is kept as text.

use crate::config::event_end;
use crate::error::{Result, TrackError};
use crate::mapping::Mapping;
use crate::record::{Dataset, Field, IntervalRecord, Schema, CHROM_END, CHROM_START, DATA_TYPES, DATA_VALUE};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

/// Category assigned when the input has no `dataTypes` column.
pub const DEFAULT_DATA_TYPE: &str = "a";

/// Reader configuration.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Column delimiter
    pub delimiter: u8,
    /// First line holds column names
    pub header: bool,
    /// Behavioral columns to read; mandatory without header, where they name
    /// the leading columns in order
    pub fields: Option<Vec<String>>,
    /// Factor applied to `chromStart`/`chromEnd` before truncating to integers
    pub multiply_t: f64,
    /// Infer `chromEnd` from the next record's `chromStart`
    pub intervals: bool,
    /// Make coordinates relative to the smallest `chromStart`
    pub relative_coord: bool,
    /// Category used when `dataTypes` is absent
    pub default_data_type: String,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            header: true,
            fields: None,
            multiply_t: 1.0,
            intervals: false,
            relative_coord: false,
            default_data_type: DEFAULT_DATA_TYPE.to_string(),
        }
    }
}

/// Role of a column while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Time,
    Value,
    Text,
}

/// A delimited behavioral file reader.
pub struct BehaviorReader<R: Read> {
    reader: BufReader<R>,
    options: ReadOptions,
    line_number: usize,
    buffer: String,
}

impl BehaviorReader<File> {
    /// Open a behavioral file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P, options: ReadOptions) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file, options))
    }
}

impl<R: Read> BehaviorReader<R> {
    pub fn new(reader: R, options: ReadOptions) -> Self {
        Self {
            reader: BufReader::new(reader),
            options,
            line_number: 0,
            buffer: String::with_capacity(1024),
        }
    }

    /// Read the next non-empty line, without its line terminator.
    fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buffer.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }
            return Ok(Some(line.to_string()));
        }
    }

    /// Read the whole file into a dataset.
    ///
    /// Without a mapping, column names are used as field names unchanged.
    pub fn read_dataset(mut self, mapping: Option<&Mapping>) -> Result<Dataset> {
        let delimiter = self.options.delimiter;

        // Column names and their positions in the file
        let (columns, positions) = if self.options.header {
            let header = self.next_line()?.ok_or_else(|| TrackError::Parse {
                line: 1,
                message: "Empty file, expected a header line".to_string(),
            })?;
            let mut names: Vec<String> = split_fields(&header, delimiter)
                .into_iter()
                .map(|s| s.trim().to_string())
                .collect();
            if let Some(first) = names.first_mut() {
                *first = first.trim_start_matches('#').trim().to_string();
            }
            match &self.options.fields {
                Some(fields) => {
                    let mut positions = Vec::with_capacity(fields.len());
                    for f in fields {
                        let pos = names.iter().position(|n| n == f).ok_or_else(|| {
                            TrackError::Configuration(format!(
                                "input field '{}' is not present in file header [{}]",
                                f,
                                names.join(", ")
                            ))
                        })?;
                        positions.push(pos);
                    }
                    (fields.clone(), positions)
                }
                None => {
                    let positions = (0..names.len()).collect();
                    (names, positions)
                }
            }
        } else {
            let fields = self.options.fields.clone().ok_or_else(|| {
                TrackError::Configuration(
                    "file has no header, an ordered list of column names must be set".to_string(),
                )
            })?;
            warn!(
                "As the file has no header, columns are taken in the order given: {}",
                fields.join(", ")
            );
            let positions = (0..fields.len()).collect();
            (fields, positions)
        };

        let names = match mapping {
            Some(m) => m.translate(&columns)?,
            None => columns,
        };
        let mut schema = Schema::new(names)?;

        if self.options.intervals {
            if schema.contains(CHROM_END) {
                return Err(TrackError::Configuration(format!(
                    "intervals can not be inferred as '{}' already exists",
                    CHROM_END
                )));
            }
            schema.require(CHROM_START)?;
            info!("Intervals inferred from timepoints");
        }

        let kinds: Vec<Kind> = schema
            .names()
            .iter()
            .map(|n| match n.as_str() {
                CHROM_START | CHROM_END => Kind::Time,
                DATA_VALUE => Kind::Value,
                _ => Kind::Text,
            })
            .collect();
        let i_start = schema.index_of(CHROM_START);
        let i_end = schema.index_of(CHROM_END);
        let width = positions.iter().copied().max().map_or(0, |m| m + 1);

        let mut records = Vec::new();
        while let Some(line) = self.next_line()? {
            let raw = split_fields(&line, delimiter);
            if raw.len() < width {
                return Err(TrackError::Parse {
                    line: self.line_number,
                    message: format!("Expected at least {} fields, got {}", width, raw.len()),
                });
            }

            let mut fields = Vec::with_capacity(kinds.len() + 2);
            for (&pos, (&kind, name)) in positions.iter().zip(kinds.iter().zip(schema.names())) {
                fields.push(self.parse_field(raw[pos], kind, name)?);
            }
            let mut record = IntervalRecord::new(fields);

            if let (Some(s), Some(e)) = (i_start, i_end) {
                self.check_interval(&mut record, s, e)?;
            }
            records.push(record);
        }

        if self.options.intervals {
            if let Some(s) = i_start {
                schema = schema.with_field(CHROM_END)?;
                infer_ends(&mut records, s);
            }
        }

        if !schema.contains(DATA_TYPES) {
            schema = schema.with_field(DATA_TYPES)?;
            for rec in &mut records {
                rec.push(Field::Text(self.options.default_data_type.clone()));
            }
        }

        if self.options.relative_coord {
            make_relative(&mut records, &schema);
        }

        Dataset::new(schema, records)
    }

    fn parse_field(&self, raw: &str, kind: Kind, name: &str) -> Result<Field> {
        let raw = raw.trim();
        match kind {
            Kind::Time => {
                let v: f64 = raw.parse().map_err(|_| TrackError::Parse {
                    line: self.line_number,
                    message: format!("Invalid {}: '{}'", name, raw),
                })?;
                Ok(Field::Int((v * self.options.multiply_t) as i64))
            }
            Kind::Value => raw.parse().map(Field::Float).map_err(|_| TrackError::Parse {
                line: self.line_number,
                message: format!("Invalid {}: '{}'", name, raw),
            }),
            Kind::Text => Ok(Field::Text(raw.to_string())),
        }
    }

    /// Widen instantaneous events and reject intervals with start >= end.
    fn check_interval(&self, record: &mut IntervalRecord, i_start: usize, i_end: usize) -> Result<()> {
        let (start, end) = match (record.get(i_start), record.get(i_end)) {
            (Field::Int(s), Field::Int(e)) => (*s, *e),
            _ => return Ok(()),
        };
        let end = event_end(start, end);
        if start >= end {
            return Err(TrackError::Parse {
                line: self.line_number,
                message: format!(
                    "Start ({}) must be lower than end ({}), enable point events for zero-length records",
                    start, end
                ),
            });
        }
        *record.get_mut(i_end) = Field::Int(end);
        Ok(())
    }
}

/// Split a line on a single-byte delimiter.
fn split_fields(line: &str, delimiter: u8) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut fields = Vec::with_capacity(8);
    let mut from = 0;
    for pos in memchr::memchr_iter(delimiter, bytes) {
        fields.push(&line[from..pos]);
        from = pos + 1;
    }
    fields.push(&line[from..]);
    fields
}

/// Append a `chromEnd` to every record: the next record's start, at least
/// one unit past its own start. The last record ends one unit after it starts.
fn infer_ends(records: &mut [IntervalRecord], i_start: usize) {
    let starts: Vec<i64> = records
        .iter()
        .map(|r| match r.get(i_start) {
            Field::Int(s) => *s,
            _ => 0,
        })
        .collect();
    for (i, rec) in records.iter_mut().enumerate() {
        let start = starts[i];
        let end = starts.get(i + 1).map_or(start + 1, |&next| next.max(start + 1));
        rec.push(Field::Int(end));
    }
}

/// Shift `chromStart` and `chromEnd` so the smallest start becomes 0.
fn make_relative(records: &mut [IntervalRecord], schema: &Schema) {
    let time_fields: Vec<usize> = [CHROM_START, CHROM_END]
        .iter()
        .filter_map(|f| schema.index_of(f))
        .collect();
    let Some(i_start) = schema.index_of(CHROM_START) else {
        return;
    };
    let min = records
        .iter()
        .filter_map(|r| match r.get(i_start) {
            Field::Int(s) => Some(*s),
            _ => None,
        })
        .min();
    let Some(min) = min else {
        return;
    };
    info!("Relative coordinates set, first timepoint {} becomes 0", min);

    for rec in records.iter_mut() {
        for &i in &time_fields {
            if let Field::Int(v) = rec.get_mut(i) {
                *v -= min;
            }
        }
    }
}

/// Read a behavioral file into a dataset.
pub fn read_dataset<P: AsRef<Path>>(
    path: P,
    mapping: Option<&Mapping>,
    options: ReadOptions,
) -> Result<Dataset> {
    BehaviorReader::from_path(path, options)?.read_dataset(mapping)
}

/// Parse a dataset from a string (useful for testing).
pub fn parse_dataset(content: &str, mapping: Option<&Mapping>, options: ReadOptions) -> Result<Dataset> {
    BehaviorReader::new(content.as_bytes(), options).read_dataset(mapping)
}
