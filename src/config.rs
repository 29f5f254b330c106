//! Process-wide settings for reading behavioral files.
//!
//! Set from the command line before the input is read. The conversion
//! commands carry their own settings in their command structs.

use std::sync::atomic::{AtomicBool, Ordering};

/// Default chromosome name written in every output row.
pub const DEFAULT_CHROM: &str = "chr1";

/// Default BedGraph window width, in time units.
pub const DEFAULT_WINDOW: u64 = 300;

/// Whether instantaneous recordings (a lick, a beam break) are accepted.
///
/// Such events are logged with the same start and end time. Tracks need a
/// non-empty interval, so the reader gives each one a single time unit.
static POINT_EVENTS: AtomicBool = AtomicBool::new(false);

/// Accept or reject instantaneous events while reading.
#[inline]
pub fn set_point_events(enabled: bool) {
    POINT_EVENTS.store(enabled, Ordering::Release);
}

#[inline]
pub fn is_point_events() -> bool {
    POINT_EVENTS.load(Ordering::Acquire)
}

/// End time of a recording once instantaneous events are widened.
///
/// Coordinates are taken after the time factor is applied, so an event at
/// `t` covers `[t, t + 1)` in output units.
///
/// ```
/// use behtracks::config;
///
/// config::set_point_events(true);
/// // a lick logged at t = 120
/// assert_eq!(config::event_end(120, 120), 121);
/// // a feeding bout keeps its own end
/// assert_eq!(config::event_end(120, 180), 180);
/// config::set_point_events(false);
/// ```
#[inline]
pub fn event_end(start: i64, end: i64) -> i64 {
    if start == end && is_point_events() {
        end.saturating_add(1)
    } else {
        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_instantaneous_events_left_alone_by_default() {
        set_point_events(false);
        assert_eq!(event_end(30, 30), 30);
        assert_eq!(event_end(30, 45), 45);
    }

    #[test]
    #[serial]
    fn test_instantaneous_events_widened() {
        set_point_events(true);
        assert_eq!(event_end(30, 30), 31);
        // before relative coordinates, times can be negative
        assert_eq!(event_end(-5, -5), -4);
        assert_eq!(event_end(i64::MAX, i64::MAX), i64::MAX);
        set_point_events(false);
    }
}
