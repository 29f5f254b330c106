// Clippy allows for the whole crate
#![allow(clippy::type_complexity)]

//! behtracks: behavioral data to genome browser tracks
//!
//! Turns timestamped behavioral measurements (feeding bouts, activity
//! counts) into BED and BedGraph tracks, treating time as a genomic
//! coordinate on a single pseudo-chromosome.
//!
//! # Example
//!
//! ```rust,no_run
//! use behtracks::{read_dataset, ConvertCommand, Mapping, OutputFormat, ReadOptions};
//! use behtracks::writer::{save_track, WriteOptions};
//!
//! let mapping = Mapping::from_file("mapping.txt").unwrap();
//! let dataset = read_dataset("feeding.csv", Some(&mapping), ReadOptions::default()).unwrap();
//!
//! let mut cmd = ConvertCommand::new();
//! cmd.format = OutputFormat::BedGraph;
//! cmd.window = 300;
//! for container in cmd.run(&dataset).unwrap().into_containers() {
//!     save_track(container, ".", None, WriteOptions::default()).unwrap();
//! }
//! ```

pub mod color;
pub mod commands;
pub mod config;
pub mod error;
pub mod mapping;
pub mod reader;
pub mod record;
pub mod registry;
pub mod selection;
pub mod track;
pub mod writer;

// Re-export commonly used types
pub use color::{ColorAssigner, ColorTable, Gradient};
pub use commands::{ConvertCommand, Conversion};
pub use error::{Result, TrackError};
pub use mapping::Mapping;
pub use reader::{parse_dataset, read_dataset, BehaviorReader, ReadOptions};
pub use record::{Dataset, Field, IntervalRecord, Schema, Span};
pub use registry::TrackRegistry;
pub use track::{OutputFormat, TrackContainer, TrackData};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::color::{ColorAssigner, Gradient};
    pub use crate::commands::{
        BedEncoder, BedGraphWindower, ConvertCommand, DataTypesAction, GroupingEngine,
        TrailingWindows,
    };
    pub use crate::mapping::Mapping;
    pub use crate::reader::{read_dataset, ReadOptions};
    pub use crate::record::{Dataset, Field, IntervalRecord, Schema};
    pub use crate::selection::TrackAction;
    pub use crate::track::{OutputFormat, TrackContainer, TrackData};
    pub use crate::writer::{save_track, TrackWriter, WriteOptions};
}
