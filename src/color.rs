//! Category color gradients.
//!
//! Each category label is bound to one of four fixed 9-shade gradients.
//! BED rows pick a shade by value bucket, BedGraph headers use shades 7 and 8.

use crate::error::{Result, TrackError};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Number of shades in a gradient.
pub const SHADES: usize = 9;

const BLACK: [&str; SHADES] = [
    "226,226,226",
    "198,198,198",
    "170,170,170",
    "141,141,141",
    "113,113,113",
    "85,85,85",
    "56,56,56",
    "28,28,28",
    "0,0,0",
];

const BLUE: [&str; SHADES] = [
    "229,229,254",
    "203,203,254",
    "178,178,254",
    "152,152,254",
    "127,127,254",
    "102,102,254",
    "76,76,173",
    "51,51,162",
    "0,0,128",
];

const RED: [&str; SHADES] = [
    "254,172,182",
    "254,153,162",
    "254,134,142",
    "254,115,121",
    "254,96,101",
    "254,77,81",
    "254,57,61",
    "254,38,40",
    "254,19,20",
];

const GREEN: [&str; SHADES] = [
    "203,254,203",
    "178,254,178",
    "152,254,152",
    "127,254,127",
    "102,254,102",
    "76,254,76",
    "51,254,51",
    "0,254,0",
    "25,115,25",
];

/// One of the four fixed color ramps, lightest shade first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gradient {
    Black,
    Blue,
    Red,
    Green,
}

impl Gradient {
    /// Every gradient, in draw order.
    pub const ALL: [Gradient; 4] = [
        Gradient::Black,
        Gradient::Blue,
        Gradient::Red,
        Gradient::Green,
    ];

    /// The nine `r,g,b` shades of this gradient.
    #[inline]
    pub fn shades(self) -> &'static [&'static str; SHADES] {
        match self {
            Gradient::Black => &BLACK,
            Gradient::Blue => &BLUE,
            Gradient::Red => &RED,
            Gradient::Green => &GREEN,
        }
    }

    /// Shade at a bucket index, clamped to the last shade.
    #[inline]
    pub fn shade(self, index: usize) -> &'static str {
        self.shades()[index.min(SHADES - 1)]
    }

    pub fn name(self) -> &'static str {
        match self {
            Gradient::Black => "black",
            Gradient::Blue => "blue",
            Gradient::Red => "red",
            Gradient::Green => "green",
        }
    }
}

impl fmt::Display for Gradient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Gradient {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "black" => Ok(Gradient::Black),
            "blue" => Ok(Gradient::Blue),
            "red" => Ok(Gradient::Red),
            "green" => Ok(Gradient::Green),
            _ => Err(TrackError::Configuration(format!(
                "color '{}' is not available, possible colors are black, blue, red, green",
                s
            ))),
        }
    }
}

/// Category label -> gradient. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorTable {
    colors: BTreeMap<String, Gradient>,
}

impl ColorTable {
    #[inline]
    pub fn get(&self, data_type: &str) -> Option<Gradient> {
        self.colors.get(data_type).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Gradient)> {
        self.colors.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Binds categories to gradients, honoring user pins.
#[derive(Debug, Clone, Default)]
pub struct ColorAssigner {
    /// Category -> color name pinned by the user
    pub restrictions: BTreeMap<String, String>,
}

impl ColorAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_restrictions(restrictions: BTreeMap<String, String>) -> Self {
        Self { restrictions }
    }

    /// Assign a gradient to every category.
    ///
    /// Pinned categories are colored first. The rest draw, in the
    /// lexicographic order of `data_types`, from the gradients not yet used
    /// in the current pass; once all four are drawn the pool refills.
    pub fn assign(&self, data_types: &BTreeSet<String>) -> Result<ColorTable> {
        let mut table = ColorTable::default();
        let mut pinned: Vec<Gradient> = Vec::with_capacity(self.restrictions.len());

        for (data_type, color) in &self.restrictions {
            let gradient: Gradient = color.parse()?;
            if !data_types.contains(data_type) {
                return Err(TrackError::Configuration(format!(
                    "data type '{}' set in color restrictions is not present in the data types '{}'",
                    data_type,
                    data_types.iter().map(String::as_str).collect::<Vec<_>>().join("', '")
                )));
            }
            table.colors.insert(data_type.clone(), gradient);
            pinned.push(gradient);
        }

        // Pinned gradients are skipped during the first pass only.
        let mut pool: Vec<Gradient> = Gradient::ALL
            .iter()
            .copied()
            .filter(|g| !pinned.contains(g))
            .collect();
        pool.reverse();

        for data_type in data_types {
            if table.colors.contains_key(data_type) {
                debug!("Data type color gradient already set '{}'", data_type);
                continue;
            }
            let gradient = match pool.pop() {
                Some(g) => g,
                None => {
                    pool = Gradient::ALL.iter().rev().copied().collect();
                    // ALL is non-empty, the refilled pool always yields
                    pool.pop().unwrap_or(Gradient::Black)
                }
            };
            table.colors.insert(data_type.clone(), gradient);
        }

        Ok(table)
    }
}
