//! End-to-end conversion: behavioral file + mapping -> track files on disk.

use behtracks::color::Gradient;
use behtracks::commands::{ConvertCommand, DataTypesAction};
use behtracks::config;
use behtracks::mapping::Mapping;
use behtracks::reader::{read_dataset, ReadOptions};
use behtracks::registry::TrackRegistry;
use behtracks::selection::TrackAction;
use behtracks::track::OutputFormat;
use behtracks::writer::{save_track, write_chrom, WriteOptions};
use behtracks::TrackError;
use serial_test::serial;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MAPPING: &str = "\
behavioral_file:CAGE > genomic_file:track
behavioral_file:StartT > genomic_file:chromStart
behavioral_file:EndT > genomic_file:chromEnd
behavioral_file:Nature > genomic_file:dataTypes
behavioral_file:Value > genomic_file:dataValue
";

const FEEDING: &str = "\
CAGE,StartT,EndT,Nature,Value
1,0,50,food,10
1,50,150,food,20
2,0,100,water,4
2,120,130,food,1
";

fn setup(dir: &TempDir) -> (PathBuf, PathBuf) {
    let input = dir.path().join("feeding.csv");
    let mapping = dir.path().join("mapping.txt");
    fs::write(&input, FEEDING).unwrap();
    fs::write(&mapping, MAPPING).unwrap();
    (input, mapping)
}

fn read(input: &Path, mapping: &Path) -> behtracks::Dataset {
    let mapping = Mapping::from_file(mapping).unwrap();
    let options = ReadOptions {
        delimiter: b',',
        ..ReadOptions::default()
    };
    read_dataset(input, Some(&mapping), options).unwrap()
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
#[serial]
fn test_bed_files() {
    config::set_point_events(false);
    let dir = TempDir::new().unwrap();
    let (input, mapping) = setup(&dir);
    let dataset = read(&input, &mapping);

    let conversion = ConvertCommand::new().run(&dataset).unwrap();
    let mut written: Vec<String> = conversion
        .into_containers()
        .map(|c| save_track(c, dir.path(), None, WriteOptions::default()).unwrap())
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(
        written,
        vec!["tr_1_dt_food.bed", "tr_2_dt_food.bed", "tr_2_dt_water.bed"]
    );

    let food = lines(&dir.path().join("tr_1_dt_food.bed"));
    assert_eq!(food.len(), 3);
    assert!(food[0].starts_with("track type=bed name=\"1_food\""));
    // value range of the dataset is [1, 20]: 20 lands in the darkest shade
    assert_eq!(
        food[2],
        format!("chr1\t50\t150\t\"\"\t20.0\t+\t50\t150\t{}", Gradient::Black.shade(8))
    );
}

#[test]
#[serial]
fn test_bedgraph_join_all_mean() {
    config::set_point_events(false);
    let dir = TempDir::new().unwrap();
    let (input, mapping) = setup(&dir);
    let dataset = read(&input, &mapping);

    let registry = TrackRegistry::from_dataset(&dataset).unwrap();
    let merge = TrackAction::JoinAll.tracks_to_merge(registry.tracks()).unwrap();

    let mut cmd = ConvertCommand::new();
    cmd.format = OutputFormat::BedGraph;
    cmd.window = 100;
    cmd.tracks_merge = Some(merge);
    cmd.mean_merged = true;
    let conversion = cmd.run(&dataset).unwrap();
    assert_eq!(conversion.len(), 2);

    for container in conversion.into_containers() {
        save_track(container, dir.path(), None, WriteOptions::default()).unwrap();
    }

    let food = lines(&dir.path().join("tr_1_2_dt_food.bedGraph"));
    assert!(food[0].contains(&format!("color={}", Gradient::Black.shade(7))));
    assert_eq!(&food[1..], &["chr1\t0\t100\t10.0", "chr1\t100\t200\t5.5"]);

    let water = lines(&dir.path().join("tr_1_2_dt_water.bedGraph"));
    assert!(water[0].contains(&format!("color={}", Gradient::Blue.shade(7))));
    assert_eq!(&water[1..], &["chr1\t0\t100\t2.0"]);
}

#[test]
#[serial]
fn test_bedgraph_all_data_types_no_header() {
    config::set_point_events(false);
    let dir = TempDir::new().unwrap();
    let (input, mapping) = setup(&dir);
    let dataset = read(&input, &mapping);

    let mut cmd = ConvertCommand::new();
    cmd.format = OutputFormat::BedGraph;
    cmd.window = 100;
    cmd.tracks = Some(vec!["2".to_string()]);
    cmd.data_types_action = DataTypesAction::All;
    let conversion = cmd.run(&dataset).unwrap();
    assert_eq!(conversion.len(), 1);

    let options = WriteOptions {
        track_line: false,
        ..WriteOptions::default()
    };
    for container in conversion.into_containers() {
        save_track(container, dir.path(), Some("cage2"), options).unwrap();
    }
    assert_eq!(
        lines(&dir.path().join("cage2.bedGraph")),
        vec!["chr1\t0\t100\t4.0", "chr1\t100\t200\t1.0"]
    );
}

#[test]
#[serial]
fn test_unknown_selection_fails() {
    config::set_point_events(false);
    let dir = TempDir::new().unwrap();
    let (input, mapping) = setup(&dir);
    let dataset = read(&input, &mapping);

    let mut cmd = ConvertCommand::new();
    cmd.data_types = Some(vec!["sleep".to_string()]);
    assert!(matches!(
        cmd.run(&dataset),
        Err(TrackError::InvalidSelection(_))
    ));
}

#[test]
#[serial]
fn test_unmapped_column_fails() {
    config::set_point_events(false);
    let dir = TempDir::new().unwrap();
    let (input, _) = setup(&dir);
    let partial = Mapping::parse("CAGE > track\n").unwrap();
    let options = ReadOptions {
        delimiter: b',',
        ..ReadOptions::default()
    };
    assert!(matches!(
        read_dataset(&input, Some(&partial), options),
        Err(TrackError::Configuration(_))
    ));
}

#[test]
#[serial]
fn test_chrom_file_covers_tracks() {
    config::set_point_events(false);
    let dir = TempDir::new().unwrap();
    let (input, mapping) = setup(&dir);
    let dataset = read(&input, &mapping);

    let path = write_chrom(&dataset, dir.path(), "chr1").unwrap();
    let content = lines(&path);
    assert_eq!(content[0], ">chr1");
    assert_eq!(content[1], "N".repeat(150));
}
