//! Track selection helpers: track actions and numeric id ranges.

use crate::error::{Result, TrackError};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// How to derive the set of tracks to merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackAction {
    /// No merge, one output per track
    #[default]
    SplitAll,
    /// Merge every track
    JoinAll,
    /// Merge tracks with an odd numeric id
    JoinOdd,
    /// Merge tracks with an even numeric id
    JoinEven,
}

impl FromStr for TrackAction {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "split_all" => Ok(TrackAction::SplitAll),
            "join_all" => Ok(TrackAction::JoinAll),
            "join_odd" => Ok(TrackAction::JoinOdd),
            "join_even" => Ok(TrackAction::JoinEven),
            _ => Err(TrackError::Configuration(format!(
                "track action '{}' not allowed, possible values are split_all, join_all, join_odd, join_even",
                s
            ))),
        }
    }
}

impl fmt::Display for TrackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrackAction::SplitAll => "split_all",
            TrackAction::JoinAll => "join_all",
            TrackAction::JoinOdd => "join_odd",
            TrackAction::JoinEven => "join_even",
        };
        f.write_str(name)
    }
}

impl TrackAction {
    /// Tracks to merge under this action, in ascending id order.
    ///
    /// Odd/even actions need numeric track ids. An empty result means no
    /// merge applies.
    pub fn tracks_to_merge(self, tracks: &BTreeSet<String>) -> Result<Vec<String>> {
        let parity = match self {
            TrackAction::SplitAll => return Ok(Vec::new()),
            TrackAction::JoinAll => {
                return Ok(sort_numeric(tracks.iter().cloned().collect()));
            }
            TrackAction::JoinOdd => 1,
            TrackAction::JoinEven => 0,
        };

        let mut selected = Vec::new();
        for track in tracks {
            let id: i64 = track.parse().map_err(|_| {
                TrackError::InvalidSelection(format!(
                    "track action '{}' needs numeric track ids, got '{}'",
                    self, track
                ))
            })?;
            if id.rem_euclid(2) == parity {
                selected.push(track.clone());
            }
        }
        let selected = sort_numeric(selected);

        if selected.is_empty() {
            warn!(
                "No track action applied as track action '{}' can not be applied to tracks '{}'",
                self,
                tracks.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
            );
        } else {
            info!("Tracks to merge are: {}", selected.join(","));
        }
        Ok(selected)
    }
}

/// Numeric ids first in numeric order, then the rest lexicographically.
fn sort_numeric(mut ids: Vec<String>) -> Vec<String> {
    ids.sort_by(|a, b| match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    });
    ids
}

/// Parse a numeric range `"1-4"` (or a single number `"2"`) into track ids.
pub fn parse_num_range(s: &str) -> Result<Vec<String>> {
    let invalid = || {
        TrackError::Configuration(format!(
            "'{}' is not a range of numbers, expected '0-5' or '2'",
            s
        ))
    };
    let (start, end) = match s.split_once('-') {
        Some((a, b)) => (a, b),
        None => (s, s),
    };
    let start: u64 = start.trim().parse().map_err(|_| invalid())?;
    let end: u64 = end.trim().parse().map_err(|_| invalid())?;
    if start > end {
        return Err(invalid());
    }
    Ok((start..=end).map(|n| n.to_string()).collect())
}
