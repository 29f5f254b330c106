//! Encoded track containers handed to the writer.

use crate::color::Gradient;
use crate::commands::bed::BedRow;
use crate::commands::bedgraph::BedGraphWindows;
use crate::error::{Result, TrackError};
use crate::record::{IntervalRecord, Schema};
use std::fmt;
use std::str::FromStr;

/// Output format of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    #[default]
    Bed,
    BedGraph,
    /// Raw records, every schema field, no encoding
    Txt,
}

impl OutputFormat {
    /// File extension, dot included.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Bed => ".bed",
            OutputFormat::BedGraph => ".bedGraph",
            OutputFormat::Txt => ".txt",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Bed => "bed",
            OutputFormat::BedGraph => "bedGraph",
            OutputFormat::Txt => "txt",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bed" => Ok(OutputFormat::Bed),
            "bedGraph" | "bedgraph" => Ok(OutputFormat::BedGraph),
            "txt" => Ok(OutputFormat::Txt),
            _ => Err(TrackError::Configuration(format!(
                "mode '{}' not available, possible modes are bed, bedGraph, txt",
                s
            ))),
        }
    }
}

/// Encoded rows of one track.
#[derive(Debug, Clone)]
pub enum TrackData {
    Bed(Vec<BedRow>),
    BedGraph(BedGraphWindows),
    Txt {
        schema: Schema,
        records: Vec<IntervalRecord>,
    },
}

/// One `(track, category)` group, encoded, with its display metadata.
#[derive(Debug, Clone)]
pub struct TrackContainer {
    pub track: String,
    pub data_type: String,
    /// Gradient used for BedGraph header colors
    pub color: Option<Gradient>,
    /// Value range used to pick BED shades
    pub range_values: Option<(f64, f64)>,
    /// Number of original tracks merged into this one
    pub source_count: usize,
    pub data: TrackData,
}

impl TrackContainer {
    pub fn new(track: impl Into<String>, data_type: impl Into<String>, data: TrackData) -> Self {
        Self {
            track: track.into(),
            data_type: data_type.into(),
            color: None,
            range_values: None,
            source_count: 1,
            data,
        }
    }

    pub fn format(&self) -> OutputFormat {
        match self.data {
            TrackData::Bed(_) => OutputFormat::Bed,
            TrackData::BedGraph(_) => OutputFormat::BedGraph,
            TrackData::Txt { .. } => OutputFormat::Txt,
        }
    }

    /// Divide every window value by the number of merged source tracks.
    ///
    /// Only BedGraph data is affected.
    pub fn win_mean(mut self) -> Self {
        if self.source_count > 1 {
            let factor = 1.0 / self.source_count as f64;
            self.data = match self.data {
                TrackData::BedGraph(windows) => TrackData::BedGraph(windows.scaled(factor)),
                other => other,
            };
        }
        self
    }

    /// Default file name: `tr_<track>_dt_<category><ext>`.
    pub fn file_name(&self) -> String {
        format!(
            "tr_{}_dt_{}{}",
            self.track,
            self.data_type,
            self.format().extension()
        )
    }
}
