//! Core record types for behavioral interval data.
//!
//! A [`Dataset`] is an ordered list of [`IntervalRecord`]s sharing one
//! [`Schema`]. The schema maps field names to column indices once, so the
//! conversion code resolves the mandatory fields a single time and then
//! uses direct index access per row.

use crate::error::{Result, TrackError};
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::fmt;

/// Track (lane) identifier field.
pub const TRACK: &str = "track";
/// Interval start field (inclusive).
pub const CHROM_START: &str = "chromStart";
/// Interval end field (exclusive).
pub const CHROM_END: &str = "chromEnd";
/// Category label field.
pub const DATA_TYPES: &str = "dataTypes";
/// Numeric measurement field.
pub const DATA_VALUE: &str = "dataValue";

/// A single scalar value of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Text(String),
    Int(i64),
    Float(f64),
}

impl Field {
    /// Interpret the field as a non-negative coordinate.
    #[inline]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Field::Int(v) => u64::try_from(*v).ok(),
            Field::Float(v) if v.fract() == 0.0 && *v >= 0.0 => Some(*v as u64),
            Field::Float(_) => None,
            Field::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Interpret the field as a numeric value.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Field::Int(v) => Some(*v as f64),
            Field::Float(v) => Some(*v),
            Field::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Textual form used when the field acts as a key (track id, category).
    ///
    /// Integer and string ids compare equal when their text matches.
    pub fn label(&self) -> Cow<'_, str> {
        match self {
            Field::Text(s) => Cow::Borrowed(s.as_str()),
            Field::Int(v) => Cow::Owned(itoa::Buffer::new().format(*v).to_string()),
            Field::Float(v) => Cow::Owned(v.to_string()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Text(s) => write!(f, "{}", s),
            Field::Int(v) => write!(f, "{}", v),
            Field::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::Text(s.to_string())
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::Text(s)
    }
}

impl From<i64> for Field {
    fn from(v: i64) -> Self {
        Field::Int(v)
    }
}

impl From<f64> for Field {
    fn from(v: f64) -> Self {
        Field::Float(v)
    }
}

/// Ordered field names shared by every record of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    names: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl Schema {
    /// Build a schema from ordered field names. Names must be unique.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut index = FxHashMap::default();
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(TrackError::Schema(format!("duplicated field '{}'", name)));
            }
        }
        Ok(Self { names, index })
    }

    /// Number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Field names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Column index of a field, if present.
    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Column index of a mandatory field.
    pub fn require(&self, name: &str) -> Result<usize> {
        self.index_of(name).ok_or_else(|| {
            TrackError::Schema(format!(
                "mandatory field '{}' not in schema [{}]",
                name,
                self.names.join(", ")
            ))
        })
    }

    /// Return a copy of this schema with one more trailing field.
    pub fn with_field(&self, name: &str) -> Result<Self> {
        Schema::new(self.names.iter().cloned().chain(std::iter::once(name.to_string())))
    }
}

/// Start, end and value of one record, extracted for windowing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: u64,
    pub end: u64,
    pub value: f64,
}

impl Span {
    #[inline]
    pub fn new(start: u64, end: u64, value: f64) -> Self {
        Self { start, end, value }
    }

    /// Duration of the span.
    #[inline]
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Indices of the five fields the encoders rely on, resolved once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreFields {
    pub track: usize,
    pub start: usize,
    pub end: usize,
    pub data_types: usize,
    pub data_value: usize,
}

impl CoreFields {
    /// Resolve every mandatory field, failing on the first one missing.
    pub fn resolve(schema: &Schema) -> Result<Self> {
        Ok(Self {
            track: schema.require(TRACK)?,
            start: schema.require(CHROM_START)?,
            end: schema.require(CHROM_END)?,
            data_types: schema.require(DATA_TYPES)?,
            data_value: schema.require(DATA_VALUE)?,
        })
    }

    /// Extract the typed interval of a record.
    pub fn span(&self, record: &IntervalRecord) -> Result<Span> {
        span_at(record, self.start, self.end, self.data_value)
    }
}

/// Indices needed to window a group: no category is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanFields {
    pub track: usize,
    pub start: usize,
    pub end: usize,
    pub data_value: usize,
}

impl SpanFields {
    pub fn resolve(schema: &Schema) -> Result<Self> {
        Ok(Self {
            track: schema.require(TRACK)?,
            start: schema.require(CHROM_START)?,
            end: schema.require(CHROM_END)?,
            data_value: schema.require(DATA_VALUE)?,
        })
    }

    pub fn span(&self, record: &IntervalRecord) -> Result<Span> {
        span_at(record, self.start, self.end, self.data_value)
    }
}

fn span_at(record: &IntervalRecord, start: usize, end: usize, value: usize) -> Result<Span> {
    let s = record.get(start).as_u64().ok_or_else(|| {
        TrackError::Schema(format!("{} '{}' is not a coordinate", CHROM_START, record.get(start)))
    })?;
    let e = record.get(end).as_u64().ok_or_else(|| {
        TrackError::Schema(format!("{} '{}' is not a coordinate", CHROM_END, record.get(end)))
    })?;
    let v = record.get(value).as_f64().ok_or_else(|| {
        TrackError::Schema(format!("{} '{}' is not numeric", DATA_VALUE, record.get(value)))
    })?;
    if s >= e {
        return Err(TrackError::Schema(format!(
            "interval start ({}) must be lower than end ({})",
            s, e
        )));
    }
    Ok(Span::new(s, e, v))
}

/// One input row: an ordered tuple of scalar fields.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalRecord {
    fields: Vec<Field>,
}

impl IntervalRecord {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Field at a resolved column index.
    ///
    /// Indices come from the dataset schema, which every record matches.
    #[inline]
    pub fn get(&self, index: usize) -> &Field {
        &self.fields[index]
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut Field {
        &mut self.fields[index]
    }

    /// Key form of a field (track id or category).
    #[inline]
    pub fn label(&self, index: usize) -> Cow<'_, str> {
        self.fields[index].label()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for IntervalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str("\t")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}

/// A fully materialized dataset: one schema, many records.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Schema,
    records: Vec<IntervalRecord>,
}

impl Dataset {
    /// Build a dataset, checking that every record has the schema's arity.
    pub fn new(schema: Schema, records: Vec<IntervalRecord>) -> Result<Self> {
        if let Some((i, rec)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != schema.len())
        {
            return Err(TrackError::Schema(format!(
                "record {} has {} fields, schema has {}",
                i + 1,
                rec.len(),
                schema.len()
            )));
        }
        Ok(Self { schema, records })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[IntervalRecord] {
        &self.records
    }

    pub fn into_parts(self) -> (Schema, Vec<IntervalRecord>) {
        (self.schema, self.records)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Minimum start and maximum end over all records.
    pub fn extent(&self) -> Result<Option<(u64, u64)>> {
        let start = self.schema.require(CHROM_START)?;
        let end = self.schema.require(CHROM_END)?;
        let mut extent: Option<(u64, u64)> = None;
        for rec in &self.records {
            let (s, e) = match (rec.get(start).as_u64(), rec.get(end).as_u64()) {
                (Some(s), Some(e)) => (s, e),
                _ => continue,
            };
            extent = Some(match extent {
                Some((lo, hi)) => (lo.min(s), hi.max(e)),
                None => (s, e),
            });
        }
        Ok(extent)
    }

    /// Minimum and maximum of the `dataValue` field.
    pub fn value_range(&self) -> Result<Option<(f64, f64)>> {
        let idx = self.schema.require(DATA_VALUE)?;
        let mut range: Option<(f64, f64)> = None;
        for v in self.records.iter().filter_map(|r| r.get(idx).as_f64()) {
            range = Some(match range {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
        Ok(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new([TRACK, CHROM_START, CHROM_END, DATA_TYPES, DATA_VALUE]).unwrap()
    }

    fn rec(track: &str, s: i64, e: i64, dt: &str, v: f64) -> IntervalRecord {
        IntervalRecord::new(vec![track.into(), s.into(), e.into(), dt.into(), v.into()])
    }

    #[test]
    fn test_schema_lookup() {
        let schema = schema();
        assert_eq!(schema.len(), 5);
        assert_eq!(schema.index_of(CHROM_END), Some(2));
        assert!(schema.index_of("nature").is_none());
        assert!(matches!(schema.require("nature"), Err(TrackError::Schema(_))));
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        assert!(Schema::new(["track", "track"]).is_err());
    }

    #[test]
    fn test_field_labels() {
        assert_eq!(Field::Int(1).label(), "1");
        assert_eq!(Field::from("1").label(), "1");
        assert_eq!(Field::Int(-3).as_u64(), None);
        assert_eq!(Field::from("42").as_u64(), Some(42));
        assert_eq!(Field::Int(2).as_f64(), Some(2.0));
    }

    #[test]
    fn test_core_span() {
        let schema = schema();
        let core = CoreFields::resolve(&schema).unwrap();
        let span = core.span(&rec("1", 10, 20, "food", 0.5)).unwrap();
        assert_eq!(span, Span::new(10, 20, 0.5));
        assert_eq!(span.len(), 10);

        // start must be lower than end
        assert!(core.span(&rec("1", 20, 20, "food", 0.5)).is_err());
    }

    #[test]
    fn test_core_fields_missing() {
        let schema = Schema::new([TRACK, CHROM_START, CHROM_END, DATA_VALUE]).unwrap();
        assert!(CoreFields::resolve(&schema).is_err());
        assert!(SpanFields::resolve(&schema).is_ok());
    }

    #[test]
    fn test_dataset_arity() {
        let bad = IntervalRecord::new(vec!["1".into(), 0.into()]);
        assert!(Dataset::new(schema(), vec![rec("1", 0, 1, "a", 1.0), bad]).is_err());
    }

    #[test]
    fn test_dataset_extent_and_range() {
        let ds = Dataset::new(
            schema(),
            vec![rec("1", 30, 40, "a", 2.0), rec("2", 5, 12, "b", -1.0)],
        )
        .unwrap();
        assert_eq!(ds.extent().unwrap(), Some((5, 40)));
        assert_eq!(ds.value_range().unwrap(), Some((-1.0, 2.0)));
    }

    #[test]
    fn test_record_display() {
        assert_eq!(rec("1", 0, 10, "food", 0.5).to_string(), "1\t0\t10\tfood\t0.5");
    }
}
