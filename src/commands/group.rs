//! Grouping engine: split, filter and merge records by track and category.
//!
//! The pipeline order is fixed: filter tracks -> filter categories ->
//! merge tracks -> merge categories. Every step takes a [`Grouping`] by
//! value and returns it updated, registry included.

use crate::error::{Result, TrackError};
use crate::record::{Dataset, IntervalRecord, Schema, DATA_TYPES, TRACK};
use crate::registry::TrackRegistry;
use crate::track::OutputFormat;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Track id -> category -> records.
pub type TrackGroups = BTreeMap<String, BTreeMap<String, Vec<IntervalRecord>>>;

/// What to do with the categories of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataTypesAction {
    /// Keep one group per category
    #[default]
    OnePerChannel,
    /// Collapse every category of a track into a single group
    All,
}

impl FromStr for DataTypesAction {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "one_per_channel" => Ok(DataTypesAction::OnePerChannel),
            "all" => Ok(DataTypesAction::All),
            _ => Err(TrackError::Configuration(format!(
                "data types action '{}' not allowed, possible values are all, one_per_channel",
                s
            ))),
        }
    }
}

impl fmt::Display for DataTypesAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataTypesAction::OnePerChannel => write!(f, "one_per_channel"),
            DataTypesAction::All => write!(f, "all"),
        }
    }
}

/// Grouped records plus the registry they were derived with.
#[derive(Debug, Clone)]
pub struct Grouping {
    pub schema: Schema,
    pub groups: TrackGroups,
    pub registry: TrackRegistry,
}

impl Grouping {
    /// Records of one `(track, category)` group.
    pub fn get(&self, track: &str, data_type: &str) -> Option<&[IntervalRecord]> {
        self.groups
            .get(track)
            .and_then(|m| m.get(data_type))
            .map(Vec::as_slice)
    }

    /// Number of `(track, category)` groups.
    pub fn group_count(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    /// Total number of records across all groups.
    pub fn record_count(&self) -> usize {
        self.groups
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Iterate `(track, category, records)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &[IntervalRecord])> {
        self.groups.iter().flat_map(|(track, m)| {
            m.iter()
                .map(move |(dt, recs)| (track.as_str(), dt.as_str(), recs.as_slice()))
        })
    }
}

/// Splits, filters and merges record groups.
#[derive(Debug, Clone)]
pub struct GroupingEngine {
    /// Output format the groups are prepared for
    pub format: OutputFormat,
}

impl Default for GroupingEngine {
    fn default() -> Self {
        Self::new(OutputFormat::Bed)
    }
}

impl GroupingEngine {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Partition all records by `(track, category)`.
    ///
    /// Record order inside a group follows input order.
    pub fn split(&self, dataset: &Dataset) -> Result<Grouping> {
        let schema = dataset.schema();
        let i_track = schema.require(TRACK)?;
        let i_types = schema.require(DATA_TYPES)?;

        let mut groups = TrackGroups::new();
        for rec in dataset.records() {
            groups
                .entry(rec.label(i_track).into_owned())
                .or_default()
                .entry(rec.label(i_types).into_owned())
                .or_default()
                .push(rec.clone());
        }

        Ok(Grouping {
            schema: schema.clone(),
            groups,
            registry: TrackRegistry::from_dataset(dataset)?,
        })
    }

    /// Keep only the listed tracks. `None` or an empty list keeps everything.
    pub fn filter_tracks(&self, mut grouping: Grouping, keep: Option<&[String]>) -> Result<Grouping> {
        let keep = match keep {
            Some(k) if !k.is_empty() => k,
            _ => return Ok(grouping),
        };
        grouping.registry.check_tracks(keep)?;

        let removed: Vec<String> = grouping
            .registry
            .tracks()
            .iter()
            .filter(|t| !keep.contains(*t))
            .cloned()
            .collect();
        for track in &removed {
            grouping.groups.remove(track);
            grouping.registry.remove_track(track);
        }
        info!("Removed tracks are: {}", removed.join(" "));

        Ok(grouping)
    }

    /// Keep only the listed categories. `None` or an empty list keeps everything.
    pub fn filter_categories(
        &self,
        mut grouping: Grouping,
        keep: Option<&[String]>,
    ) -> Result<Grouping> {
        let keep = match keep {
            Some(k) if !k.is_empty() => k,
            _ => return Ok(grouping),
        };
        grouping.registry.check_data_types(keep)?;

        let removed: Vec<String> = grouping
            .registry
            .data_types()
            .iter()
            .filter(|dt| !keep.contains(*dt))
            .cloned()
            .collect();
        for data_type in &removed {
            for by_type in grouping.groups.values_mut() {
                by_type.remove(data_type);
            }
            grouping.registry.remove_data_type(data_type);
        }
        let emptied: Vec<String> = grouping
            .groups
            .iter()
            .filter(|(_, by_type)| by_type.is_empty())
            .map(|(track, _)| track.clone())
            .collect();
        for track in &emptied {
            grouping.groups.remove(track);
            grouping.registry.remove_track(track);
        }
        info!("Removed data types are: {}", removed.join(" "));
        if !emptied.is_empty() {
            info!("Tracks left without data: {}", emptied.join(" "));
        }

        Ok(grouping)
    }

    /// Merge the listed tracks into one synthetic track.
    ///
    /// The synthetic id is the ids joined by `_`, in the given order.
    /// Records of matching categories are concatenated. Tracks not listed
    /// are left untouched.
    pub fn merge_tracks(&self, mut grouping: Grouping, track_ids: &[String]) -> Result<Grouping> {
        if track_ids.is_empty() {
            return Ok(grouping);
        }
        grouping.registry.check_tracks(track_ids)?;

        let mut ids: Vec<String> = Vec::with_capacity(track_ids.len());
        for id in track_ids {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        let synthetic = ids.join("_");
        if !ids.contains(&synthetic) && grouping.registry.has_track(&synthetic) {
            return Err(TrackError::InvalidSelection(format!(
                "merged track id '{}' collides with an existing track",
                synthetic
            )));
        }
        info!("Tracks that will be merged are: {}", ids.join(" "));

        let mut merged: BTreeMap<String, Vec<IntervalRecord>> = BTreeMap::new();
        for id in &ids {
            match grouping.groups.remove(id) {
                Some(by_type) => {
                    for (data_type, records) in by_type {
                        merged.entry(data_type).or_default().extend(records);
                    }
                }
                None => warn!("Track '{}' has no records left to merge", id),
            }
        }
        if !merged.is_empty() {
            grouping.groups.insert(synthetic.clone(), merged);
        }
        grouping.registry.merge_tracks(&synthetic, &ids);

        Ok(grouping)
    }

    /// Apply the data types action to every track.
    ///
    /// With [`DataTypesAction::All`] each track keeps a single group keyed
    /// by its category names joined by `_`. The registry category set is
    /// replaced by these labels only for BedGraph output: BED rows keep
    /// their original category for per-category coloring.
    pub fn merge_categories(&self, mut grouping: Grouping, action: DataTypesAction) -> Result<Grouping> {
        if action == DataTypesAction::OnePerChannel {
            return Ok(grouping);
        }

        let mut new_types = BTreeSet::new();
        let groups = std::mem::take(&mut grouping.groups);
        for (track, by_type) in groups {
            let label = by_type.keys().map(String::as_str).collect::<Vec<_>>().join("_");
            let records: Vec<IntervalRecord> = by_type.into_values().flatten().collect();
            new_types.insert(label.clone());

            let mut joined = BTreeMap::new();
            joined.insert(label, records);
            grouping.groups.insert(track, joined);
        }

        if self.format == OutputFormat::BedGraph {
            grouping.registry.set_data_types(new_types);
        }

        Ok(grouping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Field, CHROM_END, CHROM_START, DATA_VALUE};

    fn dataset() -> Dataset {
        let schema = Schema::new([TRACK, CHROM_START, CHROM_END, DATA_TYPES, DATA_VALUE]).unwrap();
        let rows: [(i64, i64, i64, &str, f64); 6] = [
            (1, 0, 10, "food", 1.0),
            (1, 10, 20, "rest", 2.0),
            (2, 0, 5, "food", 3.0),
            (2, 5, 15, "food", 4.0),
            (3, 0, 30, "rest", 5.0),
            (1, 20, 25, "food", 6.0),
        ];
        let records = rows
            .iter()
            .map(|&(t, s, e, dt, v)| {
                IntervalRecord::new(vec![
                    Field::Int(t),
                    Field::Int(s),
                    Field::Int(e),
                    dt.into(),
                    Field::Float(v),
                ])
            })
            .collect();
        Dataset::new(schema, records).unwrap()
    }

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_completeness() {
        let engine = GroupingEngine::default();
        let grouping = engine.split(&dataset()).unwrap();

        assert_eq!(grouping.record_count(), 6);
        assert_eq!(grouping.group_count(), 4);
        assert_eq!(grouping.get("1", "food").unwrap().len(), 2);
        assert_eq!(grouping.get("2", "food").unwrap().len(), 2);
        assert!(grouping.get("2", "rest").is_none());
        assert_eq!(grouping.registry.tracks().len(), 3);
    }

    #[test]
    fn test_filter_tracks() {
        let engine = GroupingEngine::default();
        let grouping = engine.split(&dataset()).unwrap();
        let grouping = engine.filter_tracks(grouping, Some(ids(&["1", "3"]).as_slice())).unwrap();

        assert!(grouping.groups.get("2").is_none());
        assert!(!grouping.registry.has_track("2"));
        assert_eq!(grouping.groups.len(), 2);
    }

    #[test]
    fn test_filter_none_is_noop() {
        let engine = GroupingEngine::default();
        let grouping = engine.split(&dataset()).unwrap();
        let grouping = engine.filter_tracks(grouping, None).unwrap();
        let grouping = engine.filter_categories(grouping, Some(&[][..])).unwrap();
        assert_eq!(grouping.group_count(), 4);
    }

    #[test]
    fn test_filter_unknown_track() {
        let engine = GroupingEngine::default();
        let grouping = engine.split(&dataset()).unwrap();
        let err = engine.filter_tracks(grouping, Some(ids(&["7"]).as_slice())).unwrap_err();
        assert!(matches!(err, TrackError::InvalidSelection(_)));
    }

    #[test]
    fn test_filter_categories_drops_empty_tracks() {
        let engine = GroupingEngine::default();
        let grouping = engine.split(&dataset()).unwrap();
        let grouping = engine
            .filter_categories(grouping, Some(ids(&["food"]).as_slice()))
            .unwrap();

        assert!(grouping.groups.get("3").is_none());
        assert!(!grouping.registry.has_track("3"));
        assert!(!grouping.registry.has_data_type("rest"));
        assert_eq!(grouping.record_count(), 4);
    }

    #[test]
    fn test_merge_rejects_track_emptied_by_category_filter() {
        let engine = GroupingEngine::default();
        let grouping = engine.split(&dataset()).unwrap();
        let grouping = engine
            .filter_categories(grouping, Some(ids(&["food"]).as_slice()))
            .unwrap();

        let err = engine.merge_tracks(grouping, &ids(&["1", "3"])).unwrap_err();
        assert!(matches!(err, TrackError::InvalidSelection(_)));
    }

    #[test]
    fn test_merge_tracks() {
        let engine = GroupingEngine::default();
        let grouping = engine.split(&dataset()).unwrap();
        let grouping = engine.merge_tracks(grouping, &ids(&["1", "2"])).unwrap();

        assert_eq!(grouping.get("1_2", "food").unwrap().len(), 4);
        assert_eq!(grouping.get("1_2", "rest").unwrap().len(), 1);
        assert!(grouping.groups.get("1").is_none());
        assert!(grouping.groups.get("3").is_some());
        assert!(grouping.registry.has_track("1_2"));
        assert!(!grouping.registry.has_track("1"));
        assert_eq!(grouping.record_count(), 6);
    }

    #[test]
    fn test_merge_single_track_is_relabel() {
        let engine = GroupingEngine::default();
        let before = engine.split(&dataset()).unwrap();
        let after = engine.merge_tracks(before.clone(), &ids(&["1", "1"])).unwrap();
        assert_eq!(before.groups, after.groups);
    }

    #[test]
    fn test_merge_unknown_track() {
        let engine = GroupingEngine::default();
        let grouping = engine.split(&dataset()).unwrap();
        let err = engine.merge_tracks(grouping, &ids(&["1", "9"])).unwrap_err();
        assert!(matches!(err, TrackError::InvalidSelection(_)));
    }

    #[test]
    fn test_merge_categories_bedgraph() {
        let engine = GroupingEngine::new(OutputFormat::BedGraph);
        let grouping = engine.split(&dataset()).unwrap();
        let grouping = engine.merge_categories(grouping, DataTypesAction::All).unwrap();

        assert_eq!(grouping.get("1", "food_rest").unwrap().len(), 3);
        assert_eq!(grouping.get("2", "food").unwrap().len(), 2);
        let types: Vec<&str> = grouping.registry.data_types().iter().map(String::as_str).collect();
        assert_eq!(types, vec!["food", "food_rest", "rest"]);
    }

    #[test]
    fn test_merge_categories_bed_keeps_types() {
        let engine = GroupingEngine::new(OutputFormat::Bed);
        let grouping = engine.split(&dataset()).unwrap();
        let grouping = engine.merge_categories(grouping, DataTypesAction::All).unwrap();

        assert!(grouping.get("1", "food_rest").is_some());
        let types: Vec<&str> = grouping.registry.data_types().iter().map(String::as_str).collect();
        assert_eq!(types, vec!["food", "rest"]);
    }

    #[test]
    fn test_category_merge_sees_track_merge() {
        let engine = GroupingEngine::new(OutputFormat::BedGraph);
        let grouping = engine.split(&dataset()).unwrap();
        let grouping = engine.merge_tracks(grouping, &ids(&["2", "3"])).unwrap();
        let grouping = engine.merge_categories(grouping, DataTypesAction::All).unwrap();

        assert_eq!(grouping.get("2_3", "food_rest").unwrap().len(), 3);
    }

    #[test]
    fn test_data_types_action_parse() {
        assert_eq!("all".parse::<DataTypesAction>().unwrap(), DataTypesAction::All);
        assert!("none".parse::<DataTypesAction>().is_err());
    }
}
