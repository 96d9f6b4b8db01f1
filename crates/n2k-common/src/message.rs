//! Decoded NMEA 2000 messages and the ingestion boundary.
//!
//! Decoders hand messages over in several shapes: already-typed structs,
//! loosely-typed JSON objects, or frame objects that expose accessors.
//! [`InboundMessage`] names every accepted shape, and
//! [`InboundMessage::normalize`] is the single place that turns any of them
//! into the canonical [`N2kMessage`] consumed by the buffer and statistics.

use std::fmt;

use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};

/// Keys accepted as the group identifier in mapping-shaped messages.
const GROUP_ID_KEYS: [&str; 3] = ["group_id", "PGN", "pgn"];

/// Keys accepted as the unit in mapping-shaped fields.
const UNIT_KEYS: [&str; 2] = ["unit", "unit_of_measurement"];

/// Value carried by one decoded field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl FieldValue {
    /// Finite numeric value, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Non-empty text value, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<&JsonValue> for FieldValue {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Number(n) => n.as_f64().map_or(FieldValue::Missing, FieldValue::Number),
            JsonValue::String(s) => FieldValue::Text(s.clone()),
            _ => FieldValue::Missing,
        }
    }
}

/// One decoded field: `{id, value, unit}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub id: String,
    pub value: FieldValue,
    pub unit: Option<String>,
}

impl Field {
    pub fn new(id: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            unit: None,
        }
    }
}

/// Canonical decoded message.
#[derive(Debug, Clone, PartialEq)]
pub struct N2kMessage {
    /// Parameter group number.
    pub group_id: u32,
    pub fields: Vec<Field>,
}

impl N2kMessage {
    pub fn new(group_id: u32) -> Self {
        Self {
            group_id,
            fields: Vec::new(),
        }
    }

    /// Builder-style field append.
    pub fn with_field(mut self, id: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push(Field::new(id, value));
        self
    }

    /// First field with the given id.
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Finite numeric value of the first field with the given id.
    pub fn number(&self, id: &str) -> Option<f64> {
        self.field(id).and_then(|f| f.value.as_number())
    }
}

/// Accessor-style decoder output.
pub trait DecodedFrame: Send {
    /// Parameter group number, if the frame carries one.
    fn group_id(&self) -> Option<u32>;

    /// Decoded fields in frame order.
    fn fields(&self) -> Vec<Field>;
}

/// Every message shape accepted at the ingestion boundary.
pub enum InboundMessage {
    /// Already canonical.
    Canonical(N2kMessage),
    /// JSON object with a `PGN`/`pgn`/`group_id` key and a `fields` array.
    Mapping(Map<String, JsonValue>),
    /// Decoder frame exposing accessors.
    Frame(Box<dyn DecodedFrame>),
}

impl InboundMessage {
    /// Parse one JSON document (e.g. a JSON-lines record).
    pub fn from_json_str(text: &str) -> Result<Self> {
        match serde_json::from_str::<JsonValue>(text)? {
            JsonValue::Object(map) => Ok(InboundMessage::Mapping(map)),
            _ => Err(Error::NotAnObject),
        }
    }

    /// Convert to the canonical message shape.
    ///
    /// Fails only when no group identifier can be recovered. Fields without
    /// a string id are dropped; unusable values become [`FieldValue::Missing`].
    pub fn normalize(self) -> Result<N2kMessage> {
        match self {
            InboundMessage::Canonical(msg) => Ok(msg),
            InboundMessage::Mapping(map) => normalize_mapping(&map),
            InboundMessage::Frame(frame) => {
                let group_id = frame.group_id().ok_or(Error::MissingGroupId)?;
                Ok(N2kMessage {
                    group_id,
                    fields: frame.fields(),
                })
            }
        }
    }
}

impl From<N2kMessage> for InboundMessage {
    fn from(msg: N2kMessage) -> Self {
        InboundMessage::Canonical(msg)
    }
}

impl fmt::Debug for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canonical(msg) => f.debug_tuple("Canonical").field(msg).finish(),
            Self::Mapping(map) => f.debug_tuple("Mapping").field(map).finish(),
            Self::Frame(frame) => f
                .debug_struct("Frame")
                .field("group_id", &frame.group_id())
                .finish_non_exhaustive(),
        }
    }
}

fn normalize_mapping(map: &Map<String, JsonValue>) -> Result<N2kMessage> {
    let group_id = GROUP_ID_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(json_group_id))
        .ok_or(Error::MissingGroupId)?;

    let fields = map
        .get("fields")
        .and_then(JsonValue::as_array)
        .map(|items| items.iter().filter_map(json_field).collect())
        .unwrap_or_default();

    Ok(N2kMessage { group_id, fields })
}

fn json_group_id(value: &JsonValue) -> Option<u32> {
    match value {
        JsonValue::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_field(value: &JsonValue) -> Option<Field> {
    let obj = value.as_object()?;
    let id = obj.get("id")?.as_str()?;
    if id.is_empty() {
        return None;
    }
    let unit = UNIT_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(JsonValue::as_str))
        .filter(|u| !u.is_empty())
        .map(str::to_string);
    Some(Field {
        id: id.to_string(),
        value: obj.get("value").map(FieldValue::from).unwrap_or_default(),
        unit,
    })
}
