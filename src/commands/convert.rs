//! Conversion entry point: dataset -> encoded track containers.
//!
//! Runs the grouping pipeline (filter tracks, filter categories, merge
//! tracks, merge categories), assigns colors, then encodes every group
//! with the encoder selected by the output format.

use crate::color::{ColorAssigner, ColorTable};
use crate::commands::bed::BedEncoder;
use crate::commands::bedgraph::{BedGraphWindower, TrailingWindows};
use crate::commands::group::{DataTypesAction, Grouping, GroupingEngine};
use crate::config::{DEFAULT_CHROM, DEFAULT_WINDOW};
use crate::error::{Result, TrackError};
use crate::record::Dataset;
use crate::registry::TrackRegistry;
use crate::track::{OutputFormat, TrackContainer, TrackData};
use std::collections::BTreeMap;
use tracing::debug;

/// Conversion result: containers keyed by `(track, category)`.
#[derive(Debug)]
pub struct Conversion {
    pub tracks: BTreeMap<(String, String), TrackContainer>,
    /// Registry after every filter and merge
    pub registry: TrackRegistry,
}

impl Conversion {
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, track: &str, data_type: &str) -> Option<&TrackContainer> {
        self.tracks.get(&(track.to_string(), data_type.to_string()))
    }

    pub fn into_containers(self) -> impl Iterator<Item = TrackContainer> {
        self.tracks.into_values()
    }
}

/// Convert command configuration.
#[derive(Debug, Clone)]
pub struct ConvertCommand {
    /// Output format
    pub format: OutputFormat,
    /// Tracks to keep (all when `None`)
    pub tracks: Option<Vec<String>>,
    /// Categories to keep (all when `None`)
    pub data_types: Option<Vec<String>>,
    /// Tracks to merge into one synthetic track
    pub tracks_merge: Option<Vec<String>>,
    /// What to do with the categories of each track
    pub data_types_action: DataTypesAction,
    /// BedGraph window width
    pub window: u64,
    /// Value range for BED shades (dataset value range when `None`)
    pub range_color: Option<(f64, f64)>,
    /// Category -> color name pins
    pub color_restrictions: Option<BTreeMap<String, String>>,
    /// Chromosome name written in every row
    pub chrom: String,
    /// Trailing window policy for BedGraph
    pub trailing: TrailingWindows,
    /// Average BedGraph windows of merged tracks over their source count
    pub mean_merged: bool,
}

impl Default for ConvertCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvertCommand {
    pub fn new() -> Self {
        Self {
            format: OutputFormat::Bed,
            tracks: None,
            data_types: None,
            tracks_merge: None,
            data_types_action: DataTypesAction::OnePerChannel,
            window: DEFAULT_WINDOW,
            range_color: None,
            color_restrictions: None,
            chrom: DEFAULT_CHROM.to_string(),
            trailing: TrailingWindows::LastData,
            mean_merged: false,
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some((lo, hi)) = self.range_color {
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Err(TrackError::Configuration(format!(
                    "range color must be two finite values with min <= max, got ({}, {})",
                    lo, hi
                )));
            }
        }
        if self.format == OutputFormat::BedGraph && self.window == 0 {
            return Err(TrackError::Configuration(
                "window width must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Run the grouping pipeline only.
    pub fn group(&self, dataset: &Dataset) -> Result<Grouping> {
        let engine = GroupingEngine::new(self.format);
        let grouping = engine.split(dataset)?;
        let grouping = engine.filter_tracks(grouping, self.tracks.as_deref())?;
        let grouping = engine.filter_categories(grouping, self.data_types.as_deref())?;
        let grouping = engine.merge_tracks(grouping, self.tracks_merge.as_deref().unwrap_or(&[]))?;
        engine.merge_categories(grouping, self.data_types_action)
    }

    /// Convert a dataset into one container per `(track, category)` group.
    pub fn run(&self, dataset: &Dataset) -> Result<Conversion> {
        self.validate()?;
        let grouping = self.group(dataset)?;

        let colors = match self.format {
            OutputFormat::Txt => ColorTable::default(),
            _ => ColorAssigner::with_restrictions(
                self.color_restrictions.clone().unwrap_or_default(),
            )
            .assign(grouping.registry.data_types())?,
        };

        let range_values = match (self.format, self.range_color) {
            (OutputFormat::Bed, Some(range)) => Some(range),
            (OutputFormat::Bed, None) => Some(dataset.value_range()?.unwrap_or((0.0, 0.0))),
            (_, range) => range,
        };

        let encoder = BedEncoder {
            chrom: self.chrom.clone(),
        };
        let windower = BedGraphWindower {
            window: self.window,
            chrom: self.chrom.clone(),
            trailing: self.resolve_trailing(dataset)?,
        };

        let Grouping {
            schema,
            groups,
            registry,
        } = grouping;

        let mut tracks = BTreeMap::new();
        for (track, by_type) in groups {
            for (data_type, records) in by_type {
                debug!(
                    "Converting track '{}' data type '{}' ({} records)",
                    track,
                    data_type,
                    records.len()
                );
                let data = match self.format {
                    OutputFormat::Bed => TrackData::Bed(encoder.encode_group(
                        &schema,
                        &records,
                        range_values.unwrap_or((0.0, 0.0)),
                        &colors,
                    )?),
                    OutputFormat::BedGraph => {
                        TrackData::BedGraph(windower.window_group(&schema, &records)?)
                    }
                    OutputFormat::Txt => TrackData::Txt {
                        schema: schema.clone(),
                        records,
                    },
                };

                let mut container = TrackContainer::new(track.clone(), data_type.clone(), data);
                container.range_values = range_values;
                container.source_count = registry.source_count(&track);
                if self.format == OutputFormat::BedGraph {
                    container.color = colors.get(&data_type);
                    if self.mean_merged {
                        container = container.win_mean();
                    }
                }
                tracks.insert((track.clone(), data_type), container);
            }
        }

        Ok(Conversion { tracks, registry })
    }

    fn resolve_trailing(&self, dataset: &Dataset) -> Result<TrailingWindows> {
        Ok(match self.trailing {
            TrailingWindows::DatasetEnd if self.format == OutputFormat::BedGraph => {
                match dataset.extent()? {
                    Some((_, end)) => TrailingWindows::Until(end),
                    None => TrailingWindows::LastData,
                }
            }
            other => other,
        })
    }
}
