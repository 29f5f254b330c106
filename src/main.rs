//! behtracks: behavioral data to genome browser tracks
//!
//! Usage: behtracks -i <INPUT> [-m <MAPPING>] [OPTIONS]

use clap::Parser;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use behtracks::commands::{ConvertCommand, DataTypesAction, TrailingWindows};
use behtracks::config::{self, DEFAULT_CHROM, DEFAULT_WINDOW};
use behtracks::error::{Result, TrackError};
use behtracks::reader::{read_dataset, ReadOptions};
use behtracks::registry::TrackRegistry;
use behtracks::selection::{parse_num_range, TrackAction};
use behtracks::track::OutputFormat;
use behtracks::writer::{save_track, write_chrom, WriteOptions};
use behtracks::Mapping;

#[derive(Parser)]
#[command(name = "behtracks")]
#[command(version)]
#[command(about = "Convert behavioral measurements into BED and BedGraph tracks", long_about = None)]
struct Cli {
    /// Input behavioral file
    #[arg(short, long)]
    input: PathBuf,

    /// Mapping file: behavioral column names to genomic fields
    #[arg(short, long)]
    mapping: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Output format: bed, bedGraph or txt
    #[arg(short = 'f', long, default_value = "bed")]
    format: String,

    /// Tracks to keep
    #[arg(short, long, num_args = 1..)]
    tracks: Option<Vec<String>>,

    /// Data types to keep
    #[arg(long = "data-types", num_args = 1..)]
    data_types: Option<Vec<String>>,

    /// Tracks to merge into a single track
    #[arg(short = 'l', long = "list", num_args = 1..)]
    merge: Option<Vec<String>>,

    /// Numeric range of tracks to merge, e.g. 1-4
    #[arg(short, long)]
    range: Option<String>,

    /// Track action: split_all, join_all, join_odd, join_even
    #[arg(short = 'a', long = "track-actions", default_value = "split_all")]
    track_actions: String,

    /// Data types action: one_per_channel, all
    #[arg(short = 'd', long = "data-types-actions", default_value = "one_per_channel")]
    data_types_actions: String,

    /// BedGraph window width
    #[arg(short = 'w', long = "window-size", default_value_t = DEFAULT_WINDOW)]
    window: u64,

    /// Value range used to pick BED shades
    #[arg(long = "range-color", num_args = 2, value_names = ["MIN", "MAX"], allow_negative_numbers = true)]
    range_color: Option<Vec<f64>>,

    /// Pin a data type to a color (black, blue, red, green)
    #[arg(long = "color", value_name = "DATA_TYPE=COLOR")]
    colors: Vec<String>,

    /// Chromosome name written in every row
    #[arg(long, default_value = DEFAULT_CHROM)]
    chrom: String,

    /// Treat zero-length records as 1-unit point events
    #[arg(long)]
    point_events: bool,

    /// Make coordinates relative to the first time point
    #[arg(short = 'e', long = "relative-coord")]
    relative_coord: bool,

    /// Infer record ends from the next record start
    #[arg(short = 'n', long)]
    intervals: bool,

    /// Factor applied to time coordinates
    #[arg(long = "multiply-factor", default_value_t = 1.0)]
    multiply_factor: f64,

    /// Input column delimiter
    #[arg(long, default_value_t = '\t')]
    delimiter: char,

    /// Input file has no header line; use --fields to name columns
    #[arg(long)]
    no_header: bool,

    /// Input columns to read
    #[arg(short = 's', long, num_args = 1..)]
    fields: Option<Vec<String>>,

    /// Emit empty BedGraph windows up to the end of the dataset
    #[arg(long)]
    pad_to_end: bool,

    /// Average BedGraph windows of merged tracks
    #[arg(long)]
    mean: bool,

    /// Do not write the track header line
    #[arg(long)]
    no_track_line: bool,

    /// Write data type labels in the BED name column
    #[arg(long)]
    bed_label: bool,

    /// Also write a `<chrom>.fa` pseudo-chromosome sized to the data
    #[arg(long)]
    write_chrom: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Must be set before any parsing occurs
    if cli.point_events {
        config::set_point_events(true);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if !cli.delimiter.is_ascii() {
        return Err(TrackError::Configuration(format!(
            "delimiter must be a single ASCII character, got '{}'",
            cli.delimiter
        )));
    }
    let format: OutputFormat = cli.format.parse()?;
    let track_action: TrackAction = cli.track_actions.parse()?;
    let data_types_action: DataTypesAction = cli.data_types_actions.parse()?;

    let mapping = cli.mapping.as_ref().map(Mapping::from_file).transpose()?;
    let options = ReadOptions {
        delimiter: cli.delimiter as u8,
        header: !cli.no_header,
        fields: cli.fields.clone(),
        multiply_t: cli.multiply_factor,
        intervals: cli.intervals,
        relative_coord: cli.relative_coord,
        ..ReadOptions::default()
    };
    let dataset = read_dataset(&cli.input, mapping.as_ref(), options)?;
    info!(
        "Read {} records from {}",
        dataset.len(),
        cli.input.display()
    );

    let tracks_merge = if let Some(merge) = cli.merge {
        Some(merge)
    } else if let Some(range) = &cli.range {
        Some(parse_num_range(range)?)
    } else {
        // Track actions work on the selected tracks
        let registry = TrackRegistry::from_dataset(&dataset)?;
        let candidates: BTreeSet<String> = match &cli.tracks {
            Some(keep) => {
                registry.check_tracks(keep.as_slice())?;
                keep.iter().cloned().collect()
            }
            None => registry.tracks().clone(),
        };
        let merge = track_action.tracks_to_merge(&candidates)?;
        (!merge.is_empty()).then_some(merge)
    };

    let range_color = match cli.range_color.as_deref() {
        Some(&[lo, hi]) => Some((lo, hi)),
        Some(_) => {
            return Err(TrackError::Configuration(
                "range color needs exactly two values".to_string(),
            ))
        }
        None => None,
    };

    let mut cmd = ConvertCommand::new();
    cmd.format = format;
    cmd.tracks = cli.tracks;
    cmd.data_types = cli.data_types;
    cmd.tracks_merge = tracks_merge;
    cmd.data_types_action = data_types_action;
    cmd.window = cli.window;
    cmd.range_color = range_color;
    cmd.color_restrictions = parse_color_pins(&cli.colors)?;
    cmd.chrom = cli.chrom;
    cmd.mean_merged = cli.mean;
    if cli.pad_to_end {
        cmd.trailing = TrailingWindows::DatasetEnd;
    }
    if cli.mean && format != OutputFormat::BedGraph {
        warn!("--mean only applies to bedGraph output, ignored");
    }

    let chrom = cmd.chrom.clone();
    let conversion = cmd.run(&dataset)?;
    if conversion.is_empty() {
        warn!("No track left to write after filtering");
    }

    fs::create_dir_all(&cli.output)?;
    let write_options = WriteOptions {
        track_line: !cli.no_track_line,
        bed_label: cli.bed_label,
    };
    for container in conversion.into_containers() {
        save_track(container, &cli.output, None, write_options)?;
    }
    if cli.write_chrom {
        write_chrom(&dataset, &cli.output, &chrom)?;
    }

    Ok(())
}

/// Parse `data_type=color` pairs.
fn parse_color_pins(pins: &[String]) -> Result<Option<BTreeMap<String, String>>> {
    if pins.is_empty() {
        return Ok(None);
    }
    let mut restrictions = BTreeMap::new();
    for pin in pins {
        let (data_type, color) = pin.split_once('=').ok_or_else(|| {
            TrackError::Configuration(format!(
                "color pin must look like data_type=color, got '{}'",
                pin
            ))
        })?;
        restrictions.insert(data_type.trim().to_string(), color.trim().to_string());
    }
    Ok(Some(restrictions))
}
