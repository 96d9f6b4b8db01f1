//! Latest-value sample buffer.
//!
//! Holds one [`Row`] that ingestion threads update field by field and the
//! emission loop copies out once per tick. Mapping happens before the lock
//! is taken, so the critical section is a handful of slot writes on the
//! update side and a single clone on the snapshot side.

use n2k_common::schema::{COLUMN_COUNT, UTC_INDEX};
use n2k_common::{N2kMessage, Row, Value};
use parking_lot::Mutex;

use crate::mapper::PgnMapper;

struct BufferState {
    row: Row,
    /// Columns last written by a primary (non-fallback) source.
    primary: [bool; COLUMN_COUNT],
}

/// Mutex-guarded mapping from column to last observed value.
pub struct SampleBuffer {
    mapper: PgnMapper,
    state: Mutex<BufferState>,
}

impl SampleBuffer {
    pub fn new(boat_id: &str, mapper: PgnMapper) -> Self {
        Self {
            mapper,
            state: Mutex::new(BufferState {
                row: Row::empty(boat_id, None),
                primary: [false; COLUMN_COUNT],
            }),
        }
    }

    /// Apply one decoded message, overwriting only the columns it maps to.
    ///
    /// Returns the number of columns written. Unmapped groups, unmapped
    /// fields, and unusable values leave the buffer untouched.
    pub fn apply_message(&self, msg: &N2kMessage) -> usize {
        let assignments = self.mapper.map(msg);
        if assignments.is_empty() {
            return 0;
        }

        let mut state = self.state.lock();
        let mut written = 0;
        for assignment in assignments {
            if assignment.fallback && state.primary[assignment.column] {
                continue;
            }
            if state.row.set_index(assignment.column, assignment.value) {
                state.primary[assignment.column] |= !assignment.fallback;
                written += 1;
            }
        }
        written
    }

    /// Copy of the current row with the timestamp column set to `timestamp`.
    pub fn snapshot(&self, timestamp: f64) -> Row {
        let mut row = self.state.lock().row.clone();
        row.set_index(UTC_INDEX, Value::Number(timestamp));
        row
    }

    /// Current value of one column.
    pub fn value(&self, column: &str) -> Option<Value> {
        self.state.lock().row.get(column).cloned()
    }
}
