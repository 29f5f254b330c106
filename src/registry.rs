//! Track and category registry for one conversion session.

use crate::error::{Result, TrackError};
use crate::record::{Dataset, DATA_TYPES, TRACK};
use std::collections::{BTreeMap, BTreeSet};

/// Known track ids and category labels of the current dataset.
///
/// Built once from the input, passed through the grouping pipeline by
/// value and returned updated by every filter or merge step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackRegistry {
    tracks: BTreeSet<String>,
    data_types: BTreeSet<String>,
    /// Synthetic track id -> original ids it was built from
    merged: BTreeMap<String, Vec<String>>,
}

impl TrackRegistry {
    pub fn new<T, D>(tracks: T, data_types: D) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            tracks: tracks.into_iter().map(Into::into).collect(),
            data_types: data_types.into_iter().map(Into::into).collect(),
            merged: BTreeMap::new(),
        }
    }

    /// Collect every track id and category label of a dataset.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let i_track = dataset.schema().require(TRACK)?;
        let i_types = dataset.schema().require(DATA_TYPES)?;
        let mut registry = Self::default();
        for rec in dataset.records() {
            registry.tracks.insert(rec.label(i_track).into_owned());
            registry.data_types.insert(rec.label(i_types).into_owned());
        }
        Ok(registry)
    }

    /// Registered track ids, lexicographically ordered.
    pub fn tracks(&self) -> &BTreeSet<String> {
        &self.tracks
    }

    /// Registered category labels, lexicographically ordered.
    pub fn data_types(&self) -> &BTreeSet<String> {
        &self.data_types
    }

    #[inline]
    pub fn has_track(&self, track: &str) -> bool {
        self.tracks.contains(track)
    }

    #[inline]
    pub fn has_data_type(&self, data_type: &str) -> bool {
        self.data_types.contains(data_type)
    }

    /// Fail unless every id is a registered track.
    pub fn check_tracks<S: AsRef<str>>(&self, ids: &[S]) -> Result<()> {
        let unknown: Vec<&str> = ids
            .iter()
            .map(AsRef::as_ref)
            .filter(|id| !self.has_track(id))
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(TrackError::InvalidSelection(format!(
                "tracks '{}' are not in the track list '{}'",
                unknown.join("', '"),
                join(&self.tracks)
            )))
        }
    }

    /// Fail unless every label is a registered category.
    pub fn check_data_types<S: AsRef<str>>(&self, labels: &[S]) -> Result<()> {
        let unknown: Vec<&str> = labels
            .iter()
            .map(AsRef::as_ref)
            .filter(|dt| !self.has_data_type(dt))
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(TrackError::InvalidSelection(format!(
                "data types '{}' are not in the data type list '{}'",
                unknown.join("', '"),
                join(&self.data_types)
            )))
        }
    }

    pub fn remove_track(&mut self, track: &str) -> bool {
        self.merged.remove(track);
        self.tracks.remove(track)
    }

    pub fn remove_data_type(&mut self, data_type: &str) -> bool {
        self.data_types.remove(data_type)
    }

    /// Replace the given ids with one synthetic track id.
    pub fn merge_tracks(&mut self, synthetic: &str, ids: &[String]) {
        let mut members = Vec::with_capacity(ids.len());
        for id in ids {
            self.tracks.remove(id);
            match self.merged.remove(id) {
                Some(inner) => members.extend(inner),
                None => members.push(id.clone()),
            }
        }
        self.tracks.insert(synthetic.to_string());
        self.merged.insert(synthetic.to_string(), members);
    }

    /// Replace the whole category set.
    pub fn set_data_types(&mut self, data_types: BTreeSet<String>) {
        self.data_types = data_types;
    }

    /// Number of original tracks behind an id (1 for an unmerged track).
    pub fn source_count(&self, track: &str) -> usize {
        self.merged.get(track).map_or(1, Vec::len)
    }

    /// Original ids behind a synthetic track, if it is one.
    pub fn sources(&self, track: &str) -> Option<&[String]> {
        self.merged.get(track).map(Vec::as_slice)
    }
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join("', '")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tracks() {
        let reg = TrackRegistry::new(["1", "2", "3"], ["food"]);
        assert!(reg.check_tracks(&["1", "3"]).is_ok());
        let err = reg.check_tracks(&["1", "9"]).unwrap_err();
        assert!(matches!(err, TrackError::InvalidSelection(_)));
        assert!(err.to_string().contains("'9'"));
    }

    #[test]
    fn test_merge_replaces_ids() {
        let mut reg = TrackRegistry::new(["1", "2", "3"], ["food"]);
        reg.merge_tracks("1_2", &["1".to_string(), "2".to_string()]);

        let tracks: Vec<&str> = reg.tracks().iter().map(String::as_str).collect();
        assert_eq!(tracks, vec!["1_2", "3"]);
        assert_eq!(reg.source_count("1_2"), 2);
        assert_eq!(reg.source_count("3"), 1);
        assert_eq!(reg.sources("1_2").unwrap(), ["1", "2"]);
    }

    #[test]
    fn test_remove() {
        let mut reg = TrackRegistry::new(["1", "2"], ["food", "rest"]);
        assert!(reg.remove_track("2"));
        assert!(!reg.remove_track("2"));
        assert!(reg.remove_data_type("rest"));
        assert_eq!(reg.tracks().len(), 1);
        assert_eq!(reg.data_types().len(), 1);
    }
}
