//! Track conversion commands.

pub mod bed;
pub mod bedgraph;
pub mod convert;
pub mod group;

pub use bed::{BedEncoder, BedRow, ValueBuckets};
pub use bedgraph::{BedGraphRow, BedGraphWindower, BedGraphWindows, TrailingWindows};
pub use convert::{Conversion, ConvertCommand};
pub use group::{DataTypesAction, Grouping, GroupingEngine, TrackGroups};
