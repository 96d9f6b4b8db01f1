//! Fixed-schema row model.
//!
//! A [`Row`] always holds exactly one [`Value`] per schema column, stored in
//! schema order, so serializing it can never reorder, add, or drop columns.

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::schema::{column_index, BOAT_INDEX, COLUMN_COUNT, DEFAULT_BOAT_ID, UTC_INDEX};
use crate::time::now_serial;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No observation yet; serialized as an empty field.
    #[default]
    Empty,
    /// Numeric observation, serialized in plain decimal.
    Number(f64),
    /// Text observation, serialized verbatim.
    Text(String),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Field text as written to the CSV file (before any quoting).
    pub fn to_field(&self) -> Cow<'_, str> {
        match self {
            Value::Empty => Cow::Borrowed(""),
            // f64 Display never switches to exponent notation
            Value::Number(n) => Cow::Owned(n.to_string()),
            Value::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// One sample of every schema column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Create a row with only the identity and timestamp columns filled.
    ///
    /// When `timestamp` is `None` the current time is used.
    pub fn empty(boat_id: &str, timestamp: Option<f64>) -> Self {
        let mut values = vec![Value::Empty; COLUMN_COUNT];
        values[BOAT_INDEX] = Value::Text(boat_id.to_string());
        values[UTC_INDEX] = Value::Number(timestamp.unwrap_or_else(now_serial));
        Self { values }
    }

    /// Value of a column by name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        column_index(column).map(|i| &self.values[i])
    }

    /// Set a column by name.
    pub fn set(&mut self, column: &str, value: Value) -> Result<()> {
        let index = column_index(column).ok_or_else(|| Error::UnknownColumn(column.to_string()))?;
        self.values[index] = value;
        Ok(())
    }

    /// Set a column by position. Returns `false` when out of range.
    pub fn set_index(&mut self, index: usize, value: Value) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn timestamp(&self) -> Option<f64> {
        self.values[UTC_INDEX].as_f64()
    }

    /// Values in schema order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Field texts in schema order, ready for a CSV writer.
    pub fn fields(&self) -> impl Iterator<Item = Cow<'_, str>> {
        self.values.iter().map(Value::to_field)
    }

    /// Number of non-empty columns, identity and timestamp included.
    pub fn filled_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_empty()).count()
    }
}

impl Default for Row {
    fn default() -> Self {
        Self::empty(DEFAULT_BOAT_ID, None)
    }
}
