//! BED encoding: one colored BED row per record.

use crate::color::{ColorTable, SHADES};
use crate::config::DEFAULT_CHROM;
use crate::error::{Result, TrackError};
use crate::record::{CoreFields, IntervalRecord, Schema};
use std::fmt;

/// One BED9 output row.
#[derive(Debug, Clone, PartialEq)]
pub struct BedRow {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    /// Category label of the record
    pub name: String,
    pub score: f64,
    pub strand: char,
    pub thick_start: u64,
    pub thick_end: u64,
    /// `r,g,b` shade
    pub item_rgb: &'static str,
}

impl fmt::Display for BedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.chrom,
            self.start,
            self.end,
            self.name,
            self.score,
            self.strand,
            self.thick_start,
            self.thick_end,
            self.item_rgb
        )
    }
}

/// Value buckets used to pick a gradient shade.
///
/// `[lo, hi]` is cut into nine equal-width buckets. A degenerate range
/// collapses to two buckets at `lo` and `hi`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueBuckets {
    bounds: Vec<f64>,
}

impl ValueBuckets {
    pub fn new(lo: f64, hi: f64) -> Self {
        let step = (hi - lo) / SHADES as f64;
        let bounds = if step == 0.0 {
            vec![lo, hi]
        } else {
            (0..SHADES).map(|i| lo + i as f64 * step).collect()
        };
        Self { bounds }
    }

    /// Lower bound of every bucket.
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Index of the highest bucket bound not above `value`, clamped to `[0, 8]`.
    #[inline]
    pub fn index(&self, value: f64) -> usize {
        self.bounds
            .iter()
            .rposition(|b| *b <= value)
            .unwrap_or(0)
            .min(SHADES - 1)
    }
}

/// BED encoder configuration.
#[derive(Debug, Clone)]
pub struct BedEncoder {
    /// Chromosome name written in every row
    pub chrom: String,
}

impl Default for BedEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BedEncoder {
    pub fn new() -> Self {
        Self {
            chrom: DEFAULT_CHROM.to_string(),
        }
    }

    /// Encode a single-track group.
    ///
    /// Fails with a precondition error when the records span more than one
    /// track id. Merged tracks are encoded through the conversion entry point.
    pub fn encode(
        &self,
        schema: &Schema,
        records: &[IntervalRecord],
        value_range: (f64, f64),
        colors: &ColorTable,
    ) -> Result<Vec<BedRow>> {
        let core = CoreFields::resolve(schema)?;
        let mut tracks = records.iter().map(|r| r.label(core.track));
        if let Some(first) = tracks.next() {
            if let Some(other) = tracks.find(|t| *t != first) {
                return Err(TrackError::Precondition(format!(
                    "group holds more than one track ('{}', '{}'), only single tracks can be converted to bed",
                    first, other
                )));
            }
        }
        self.encode_group(schema, records, value_range, colors)
    }

    /// Encode a group without the single-track check.
    pub(crate) fn encode_group(
        &self,
        schema: &Schema,
        records: &[IntervalRecord],
        value_range: (f64, f64),
        colors: &ColorTable,
    ) -> Result<Vec<BedRow>> {
        let core = CoreFields::resolve(schema)?;
        let buckets = ValueBuckets::new(value_range.0, value_range.1);

        let mut rows = Vec::with_capacity(records.len());
        for rec in records {
            let span = core.span(rec)?;
            let data_type = rec.label(core.data_types);
            let gradient = colors.get(&data_type).ok_or_else(|| {
                TrackError::Configuration(format!(
                    "no color gradient assigned to data type '{}'",
                    data_type
                ))
            })?;

            rows.push(BedRow {
                chrom: self.chrom.clone(),
                start: span.start,
                end: span.end,
                name: data_type.into_owned(),
                score: span.value,
                strand: '+',
                thick_start: span.start,
                thick_end: span.end,
                item_rgb: gradient.shade(buckets.index(span.value)),
            });
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorAssigner, Gradient};
    use crate::record::{Field, CHROM_END, CHROM_START, DATA_TYPES, DATA_VALUE, TRACK};
    use std::collections::BTreeSet;

    fn schema() -> Schema {
        Schema::new([TRACK, CHROM_START, CHROM_END, DATA_TYPES, DATA_VALUE]).unwrap()
    }

    fn rec(track: &str, s: i64, e: i64, dt: &str, v: f64) -> IntervalRecord {
        IntervalRecord::new(vec![track.into(), Field::Int(s), Field::Int(e), dt.into(), Field::Float(v)])
    }

    fn colors(types: &[&str]) -> ColorTable {
        let set: BTreeSet<String> = types.iter().map(|s| s.to_string()).collect();
        ColorAssigner::new().assign(&set).unwrap()
    }

    #[test]
    fn test_bucket_index() {
        let buckets = ValueBuckets::new(0.0, 9.0);
        assert_eq!(buckets.bounds().len(), 9);
        assert_eq!(buckets.index(4.5), 4);
        assert_eq!(buckets.index(0.0), 0);
        assert_eq!(buckets.index(-3.0), 0);
        assert_eq!(buckets.index(9.0), 8);
        assert_eq!(buckets.index(100.0), 8);
    }

    #[test]
    fn test_degenerate_range() {
        let buckets = ValueBuckets::new(5.0, 5.0);
        assert_eq!(buckets.bounds(), &[5.0, 5.0]);
        assert_eq!(buckets.index(4.0), 0);
        assert_eq!(buckets.index(5.0), 1);
    }

    #[test]
    fn test_encode_rows() {
        let rows = BedEncoder::new()
            .encode(
                &schema(),
                &[rec("1", 10, 20, "food", 4.5), rec("1", 30, 35, "rest", 9.0)],
                (0.0, 9.0),
                &colors(&["food", "rest"]),
            )
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].chrom, "chr1");
        assert_eq!(rows[0].name, "food");
        assert_eq!(rows[0].strand, '+');
        assert_eq!((rows[0].thick_start, rows[0].thick_end), (10, 20));
        assert_eq!(rows[0].item_rgb, Gradient::Black.shade(4));
        assert_eq!(rows[1].item_rgb, Gradient::Blue.shade(8));
        assert_eq!(
            rows[0].to_string(),
            "chr1\t10\t20\tfood\t4.5\t+\t10\t20\t113,113,113"
        );
    }

    #[test]
    fn test_missing_field() {
        let schema = Schema::new([TRACK, CHROM_START, CHROM_END, DATA_VALUE]).unwrap();
        let err = BedEncoder::new()
            .encode(&schema, &[], (0.0, 1.0), &ColorTable::default())
            .unwrap_err();
        assert!(matches!(err, TrackError::Schema(_)));
    }

    #[test]
    fn test_multi_track_precondition() {
        let records = [rec("1", 0, 5, "food", 1.0), rec("2", 0, 5, "food", 1.0)];
        let table = colors(&["food"]);
        let encoder = BedEncoder::new();

        let err = encoder
            .encode(&schema(), &records, (0.0, 1.0), &table)
            .unwrap_err();
        assert!(matches!(err, TrackError::Precondition(_)));
        assert_eq!(
            encoder
                .encode_group(&schema(), &records, (0.0, 1.0), &table)
                .unwrap()
                .len(),
            2
        );
    }
}
