//! Running session statistics for the status display.
//!
//! Maxima are derived from the raw message stream independently of the
//! sample buffer; row and overrun counters are fed by the emission loop.
//! Everything is monotone and only resets when a new tracker is built.

use n2k_common::N2kMessage;
use parking_lot::Mutex;
use serde::Serialize;

use crate::mapper::{PGN_DISTANCE_LOG, PGN_SPEED, PGN_WATER_DEPTH};

/// Read-only statistics snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub max_speed: f64,
    pub max_depth: f64,
    /// Largest cumulative distance-log reading seen.
    pub total_distance: f64,
    /// Data rows written by the emission loop.
    pub messages_logged: u64,
    /// Ticks whose work overran the sampling period.
    pub timing_errors: u64,
}

/// Thread-safe statistics accumulator.
#[derive(Debug, Default)]
pub struct StatsTracker {
    inner: Mutex<Statistics>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update maxima from one decoded message.
    pub fn update(&self, msg: &N2kMessage) {
        let field = match msg.group_id {
            PGN_SPEED => "speed_water_referenced",
            PGN_WATER_DEPTH => "depth",
            PGN_DISTANCE_LOG => "log",
            _ => return,
        };
        let Some(value) = msg.number(field) else {
            return;
        };

        let mut stats = self.inner.lock();
        let slot = match msg.group_id {
            PGN_SPEED => &mut stats.max_speed,
            PGN_WATER_DEPTH => &mut stats.max_depth,
            _ => &mut stats.total_distance,
        };
        if value > *slot {
            *slot = value;
        }
    }

    /// Count one written data row.
    pub fn record_row(&self) {
        self.inner.lock().messages_logged += 1;
    }

    /// Count one overrun tick; returns the new total.
    pub fn record_timing_error(&self) -> u64 {
        let mut stats = self.inner.lock();
        stats.timing_errors += 1;
        stats.timing_errors
    }

    pub fn snapshot(&self) -> Statistics {
        *self.inner.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maxima_only_grow() {
        let stats = StatsTracker::new();
        for v in [3.0, 9.5, 4.0] {
            stats.update(&N2kMessage::new(PGN_SPEED).with_field("speed_water_referenced", v));
        }
        stats.update(&N2kMessage::new(PGN_WATER_DEPTH).with_field("depth", 15.3));
        stats.update(&N2kMessage::new(PGN_WATER_DEPTH).with_field("depth", 2.0));

        let snap = stats.snapshot();
        assert_eq!(snap.max_speed, 9.5);
        assert_eq!(snap.max_depth, 15.3);
    }

    #[test]
    fn test_ignores_non_numeric_and_other_fields() {
        let stats = StatsTracker::new();
        stats.update(&N2kMessage::new(PGN_SPEED).with_field("speed_water_referenced", "fast"));
        stats.update(&N2kMessage::new(PGN_SPEED).with_field("speed_ground_referenced", 30.0));
        stats.update(&N2kMessage::new(127250).with_field("heading", 359.0));
        assert_eq!(stats.snapshot(), Statistics::default());
    }

    #[test]
    fn test_distance_log() {
        let stats = StatsTracker::new();
        stats.update(
            &N2kMessage::new(PGN_DISTANCE_LOG)
                .with_field("log", 12_000.0)
                .with_field("trip_log", 50.0),
        );
        assert_eq!(stats.snapshot().total_distance, 12_000.0);
    }

    #[test]
    fn test_counters() {
        let stats = StatsTracker::new();
        stats.record_row();
        stats.record_row();
        assert_eq!(stats.record_timing_error(), 1);
        assert_eq!(stats.record_timing_error(), 2);
        let snap = stats.snapshot();
        assert_eq!(snap.messages_logged, 2);
        assert_eq!(snap.timing_errors, 2);
    }
}
