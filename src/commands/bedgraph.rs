//! BedGraph windowing: aggregate irregular intervals into fixed-width windows.
//!
//! Intervals are swept once in ascending start order. An interval that fits
//! inside the current window adds its whole value to it; an interval that
//! crosses window boundaries spreads its value over every window it touches,
//! proportionally to the duration of each intersection. Shares destined to
//! windows not reached yet are parked in a carry map keyed by window start.
//!
//! Every input value ends up in exactly one emitted window share, so the sum
//! of emitted values equals the sum of input values (up to rounding).

use crate::config::{DEFAULT_CHROM, DEFAULT_WINDOW};
use crate::error::{Result, TrackError};
use crate::record::{IntervalRecord, Schema, Span, SpanFields};
use rustc_hash::FxHashMap;
use std::fmt;

/// How far past the data the windows are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingWindows {
    /// Stop at the last window touched by an interval
    #[default]
    LastData,
    /// Keep emitting zero windows up to the window holding the dataset's last end
    DatasetEnd,
    /// Keep emitting zero windows up to the window holding `end - 1`
    Until(u64),
}

/// One BedGraph output row.
#[derive(Debug, Clone, PartialEq)]
pub struct BedGraphRow {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub value: f64,
}

impl fmt::Display for BedGraphRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}\t{}", self.chrom, self.start, self.end, self.value)
    }
}

/// BedGraph windower configuration.
#[derive(Debug, Clone)]
pub struct BedGraphWindower {
    /// Window width, in time units
    pub window: u64,
    /// Chromosome name written in every row
    pub chrom: String,
    /// Trailing window policy; `DatasetEnd` behaves like `LastData` here,
    /// the conversion entry point resolves it to `Until`
    pub trailing: TrailingWindows,
}

impl Default for BedGraphWindower {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl BedGraphWindower {
    pub fn new(window: u64) -> Self {
        Self {
            window,
            chrom: DEFAULT_CHROM.to_string(),
            trailing: TrailingWindows::LastData,
        }
    }

    /// Window a single-track group.
    ///
    /// Fails with a precondition error when the records span more than one
    /// track id. Merged tracks are windowed through the conversion entry point.
    pub fn window(&self, schema: &Schema, records: &[IntervalRecord]) -> Result<BedGraphWindows> {
        let fields = SpanFields::resolve(schema)?;
        let mut tracks = records.iter().map(|r| r.label(fields.track));
        if let Some(first) = tracks.next() {
            if let Some(other) = tracks.find(|t| *t != first) {
                return Err(TrackError::Precondition(format!(
                    "group holds more than one track ('{}', '{}'), only single tracks can be converted to bedGraph",
                    first, other
                )));
            }
        }
        self.window_group(schema, records)
    }

    /// Window a group without the single-track check.
    pub(crate) fn window_group(
        &self,
        schema: &Schema,
        records: &[IntervalRecord],
    ) -> Result<BedGraphWindows> {
        let fields = SpanFields::resolve(schema)?;
        let spans = records
            .iter()
            .map(|r| fields.span(r))
            .collect::<Result<Vec<_>>>()?;
        self.window_spans(spans)
    }

    /// Window raw spans. Spans need not be sorted.
    pub fn window_spans(&self, mut spans: Vec<Span>) -> Result<BedGraphWindows> {
        if self.window == 0 {
            return Err(TrackError::Configuration(
                "window width must be greater than 0".to_string(),
            ));
        }
        if let Some(bad) = spans.iter().find(|s| s.is_empty()) {
            return Err(TrackError::Schema(format!(
                "interval start ({}) must be lower than end ({})",
                bad.start, bad.end
            )));
        }
        // Stable: equal starts keep input order
        spans.sort_by_key(|s| s.start);

        // The sweep moves one window past the last emitted one
        if let Some(max_end) = spans.iter().map(|s| s.end).max() {
            let end = match self.trailing {
                TrailingWindows::Until(until) => max_end.max(until),
                _ => max_end,
            };
            let last_lo = (end - 1) / self.window * self.window;
            if self
                .window
                .checked_mul(2)
                .and_then(|w| last_lo.checked_add(w))
                .is_none()
            {
                return Err(TrackError::Configuration(format!(
                    "window width {} is too large for intervals ending at {}",
                    self.window, end
                )));
            }
        }
        Ok(BedGraphWindows::new(
            spans,
            self.window,
            self.chrom.clone(),
            self.trailing,
        ))
    }
}

/// Lazy, forward-only sequence of windows for one group.
///
/// Each window is emitted exactly once, in ascending order. Re-iterating
/// requires windowing the group again.
#[derive(Debug, Clone)]
pub struct BedGraphWindows {
    spans: Vec<Span>,
    pos: usize,
    width: u64,
    chrom: String,
    /// Current window bounds
    lo: u64,
    hi: u64,
    /// Value accumulated for the current window
    partial: f64,
    /// Window start -> value apportioned ahead of time
    carry: FxHashMap<u64, f64>,
    /// Start of the last window to emit
    last_lo: u64,
    /// Multiplier applied to emitted values
    scale: f64,
    done: bool,
}

impl BedGraphWindows {
    fn new(spans: Vec<Span>, width: u64, chrom: String, trailing: TrailingWindows) -> Self {
        let floor = |p: u64| (p / width) * width;
        let lo = spans.first().map_or(0, |s| floor(s.start));

        let mut last_lo = spans.iter().map(|s| floor(s.end - 1)).max().unwrap_or(lo);
        if let TrailingWindows::Until(end) = trailing {
            if end > lo {
                last_lo = last_lo.max(floor(end - 1));
            }
        }

        Self {
            done: spans.is_empty(),
            spans,
            pos: 0,
            width,
            chrom,
            lo,
            hi: lo + width,
            partial: 0.0,
            carry: FxHashMap::default(),
            last_lo,
            scale: 1.0,
        }
    }

    /// Multiply every emitted value by `factor`.
    pub fn scaled(mut self, factor: f64) -> Self {
        self.scale *= factor;
        self
    }

    /// Window width.
    pub fn width(&self) -> u64 {
        self.width
    }

    /// Add one interval to the accumulator.
    #[inline]
    fn absorb(&mut self, span: Span) {
        if span.end <= self.hi {
            self.partial += span.value;
            return;
        }

        // Spread over every window the span touches, proportionally to the
        // intersected duration. The last window takes the remainder.
        let mut remaining = span.value;
        let mut from = span.start;
        let mut w_lo = self.lo;
        let mut w_hi = self.hi;
        loop {
            if span.end <= w_hi {
                self.add_share(w_lo, remaining);
                break;
            }
            let share = remaining * (w_hi - from) as f64 / (span.end - from) as f64;
            self.add_share(w_lo, share);
            remaining -= share;
            from = w_hi;
            w_lo = w_hi;
            w_hi += self.width;
        }
    }

    #[inline]
    fn add_share(&mut self, window_lo: u64, value: f64) {
        if window_lo == self.lo {
            self.partial += value;
        } else {
            *self.carry.entry(window_lo).or_insert(0.0) += value;
        }
    }

    /// Emit the current window and move to the next one.
    #[inline]
    fn close_window(&mut self) -> BedGraphRow {
        let value = self.partial + self.carry.remove(&self.lo).unwrap_or(0.0);
        let row = BedGraphRow {
            chrom: self.chrom.clone(),
            start: self.lo,
            end: self.hi,
            value: value * self.scale,
        };
        self.partial = 0.0;
        self.lo = self.hi;
        self.hi += self.width;
        row
    }
}

impl Iterator for BedGraphWindows {
    type Item = BedGraphRow;

    fn next(&mut self) -> Option<BedGraphRow> {
        loop {
            if self.done {
                return None;
            }
            match self.spans.get(self.pos).copied() {
                Some(span) if span.start >= self.hi => return Some(self.close_window()),
                Some(span) => {
                    self.absorb(span);
                    self.pos += 1;
                }
                None if self.lo <= self.last_lo => return Some(self.close_window()),
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}
