//! Zero-length records: rejected by default, 1-unit events in point-event mode.
//!
//! Note: Tests are run serially to avoid global config race conditions.

use behtracks::commands::ConvertCommand;
use behtracks::config;
use behtracks::reader::{parse_dataset, ReadOptions};
use behtracks::track::{OutputFormat, TrackData};
use behtracks::TrackError;
use serial_test::serial;

const LICKS: &str = "\
track\tchromStart\tchromEnd\tdataTypes\tdataValue
1\t10\t10\tlick\t1
1\t12\t12\tlick\t1
1\t25\t30\tlick\t2
";

/// Reset config to default state before each test
fn reset_config() {
    config::set_point_events(false);
}

#[test]
#[serial]
fn test_strict_mode_rejects_zero_length() {
    reset_config();

    let err = parse_dataset(LICKS, None, ReadOptions::default()).unwrap_err();
    assert!(matches!(err, TrackError::Parse { line: 2, .. }));
}

#[test]
#[serial]
fn test_point_events_become_unit_intervals() {
    reset_config();
    config::set_point_events(true);

    let dataset = parse_dataset(LICKS, None, ReadOptions::default()).unwrap();
    let mut cmd = ConvertCommand::new();
    cmd.format = OutputFormat::BedGraph;
    cmd.window = 10;
    let mut conversion = cmd.run(&dataset).unwrap();

    let licks = conversion
        .tracks
        .remove(&("1".to_string(), "lick".to_string()))
        .unwrap();
    let rows: Vec<(u64, u64, f64)> = match licks.data {
        TrackData::BedGraph(w) => w.map(|r| (r.start, r.end, r.value)).collect(),
        _ => panic!("expected bedGraph data"),
    };
    assert_eq!(rows, vec![(10, 20, 2.0), (20, 30, 2.0)]);

    reset_config();
}

#[test]
#[serial]
fn test_point_events_keep_regular_intervals() {
    reset_config();
    config::set_point_events(true);

    let dataset = parse_dataset(LICKS, None, ReadOptions::default()).unwrap();
    let conversion = ConvertCommand::new().run(&dataset).unwrap();
    match &conversion.get("1", "lick").unwrap().data {
        TrackData::Bed(rows) => {
            let spans: Vec<(u64, u64)> = rows.iter().map(|r| (r.start, r.end)).collect();
            assert_eq!(spans, vec![(10, 11), (12, 13), (25, 30)]);
        }
        _ => panic!("expected bed data"),
    }

    reset_config();
}
