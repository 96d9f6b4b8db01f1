//! PGN → CSV column mapping.
//!
//! Translates decoded messages into column assignments. Most fields map
//! one-to-one through [`DIRECT_FIELDS`]; a few parameter groups need a second
//! field to choose the target column (temperature source, wind reference,
//! engine instance, fluid type) and are handled by composite rules.
//!
//! The mapper is pure and total: anything it does not recognize, including
//! values of the wrong type, simply produces no assignment.

use n2k_common::schema::column_index;
use n2k_common::{Field, FieldValue, N2kMessage, Value};

// ── PGN numbers ─────────────────────────────────────────────────────────

pub const PGN_RUDDER: u32 = 127245;
pub const PGN_VESSEL_HEADING: u32 = 127250;
pub const PGN_RATE_OF_TURN: u32 = 127251;
pub const PGN_ATTITUDE: u32 = 127257;
pub const PGN_ENGINE_RAPID: u32 = 127488;
pub const PGN_ENGINE_DYNAMIC: u32 = 127489;
pub const PGN_TRANSMISSION: u32 = 127493;
pub const PGN_FLUID_LEVEL: u32 = 127505;
pub const PGN_DC_STATUS: u32 = 127506;
pub const PGN_BATTERY_STATUS: u32 = 127508;
pub const PGN_SPEED: u32 = 128259;
pub const PGN_WATER_DEPTH: u32 = 128267;
pub const PGN_DISTANCE_LOG: u32 = 128275;
pub const PGN_POSITION_RAPID: u32 = 129025;
pub const PGN_COG_SOG_RAPID: u32 = 129026;
pub const PGN_GNSS_POSITION: u32 = 129029;
pub const PGN_GNSS_DOPS: u32 = 129539;
pub const PGN_WIND_DATA: u32 = 130306;
pub const PGN_ENVIRONMENTAL: u32 = 130310;
pub const PGN_TEMPERATURE: u32 = 130312;
pub const PGN_HUMIDITY: u32 = 130313;
pub const PGN_ACTUAL_PRESSURE: u32 = 130314;
pub const PGN_TEMPERATURE_EXTENDED: u32 = 130316;
pub const PGN_DIRECTION_DATA: u32 = 130577;

// ── Table ───────────────────────────────────────────────────────────────

/// Accepted value type for a mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Finite numbers only.
    Numeric,
    /// Numbers or non-empty strings (enumerated decoder output).
    Text,
}

/// `(pgn, field id, column, kind)` for fields that map one-to-one.
pub const DIRECT_FIELDS: &[(u32, &str, &str, ValueKind)] = &[
    (PGN_SPEED, "speed_water_referenced", "BSP", ValueKind::Numeric),
    (PGN_SPEED, "speed_ground_referenced", "SOG", ValueKind::Numeric),
    (PGN_WATER_DEPTH, "depth", "Depth", ValueKind::Numeric),
    (PGN_VESSEL_HEADING, "heading", "HDG", ValueKind::Numeric),
    (PGN_RATE_OF_TURN, "rate", "ROT", ValueKind::Numeric),
    (PGN_RUDDER, "position", "Rudder", ValueKind::Numeric),
    (PGN_ATTITUDE, "roll", "Heel", ValueKind::Numeric),
    (PGN_ATTITUDE, "pitch", "Trim", ValueKind::Numeric),
    (PGN_COG_SOG_RAPID, "cog", "COG", ValueKind::Numeric),
    (PGN_COG_SOG_RAPID, "sog", "SOG", ValueKind::Numeric),
    (PGN_POSITION_RAPID, "latitude", "Lat", ValueKind::Numeric),
    (PGN_POSITION_RAPID, "longitude", "Lon", ValueKind::Numeric),
    (PGN_GNSS_POSITION, "latitude", "Lat", ValueKind::Numeric),
    (PGN_GNSS_POSITION, "longitude", "Lon", ValueKind::Numeric),
    (PGN_GNSS_POSITION, "altitude", "Altitude", ValueKind::Numeric),
    (PGN_GNSS_POSITION, "number_of_svs", "GpsNum", ValueKind::Numeric),
    (PGN_GNSS_POSITION, "pdop", "PDOP", ValueKind::Numeric),
    (PGN_GNSS_POSITION, "geoidal_separation", "GeoSep", ValueKind::Numeric),
    (PGN_GNSS_POSITION, "age_of_dgnss_corrections", "GpsAge", ValueKind::Numeric),
    (PGN_GNSS_POSITION, "reference_station_id", "DiffStn", ValueKind::Numeric),
    (PGN_GNSS_POSITION, "method", "GpQual", ValueKind::Text),
    (PGN_GNSS_POSITION, "gnss_type", "GpsMode", ValueKind::Text),
    (PGN_GNSS_DOPS, "pdop", "PDOP", ValueKind::Numeric),
    (PGN_ENVIRONMENTAL, "water_temperature", "SeaTemp", ValueKind::Numeric),
    (PGN_ENVIRONMENTAL, "outside_ambient_air_temperature", "AirTemp", ValueKind::Numeric),
    (PGN_ENVIRONMENTAL, "atmospheric_pressure", "Baro", ValueKind::Numeric),
    (PGN_HUMIDITY, "actual_humidity", "RH", ValueKind::Numeric),
    (PGN_ACTUAL_PRESSURE, "pressure", "Baro", ValueKind::Numeric),
    (PGN_BATTERY_STATUS, "voltage", "Volts", ValueKind::Numeric),
    (PGN_BATTERY_STATUS, "current", "Amps", ValueKind::Numeric),
    (PGN_DC_STATUS, "state_of_charge", "Charge%", ValueKind::Numeric),
    (PGN_TRANSMISSION, "oil_pressure", "TranOilPres", ValueKind::Numeric),
    (PGN_TRANSMISSION, "oil_temperature", "TranOilTemp", ValueKind::Numeric),
    (PGN_DIRECTION_DATA, "set", "Set", ValueKind::Numeric),
    (PGN_DIRECTION_DATA, "drift", "Drift", ValueKind::Numeric),
];

/// Engine-dynamic fields, recorded for the primary engine only.
const ENGINE_DYNAMIC_FIELDS: &[(&str, &str)] = &[
    ("oil_pressure", "EngOilPres"),
    ("temperature", "EngTemp"),
    ("oil_temperature", "EngOilTemp"),
];

/// One column write produced from a message.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnAssignment {
    /// Schema position.
    pub column: usize,
    pub value: Value,
    /// Written only while no primary source has filled the column.
    pub fallback: bool,
}

/// Optional mapping rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapperOptions {
    /// Also feed `speed_water_referenced` into `SOG` as a fallback.
    pub water_speed_as_sog: bool,
}

/// Stateless message → column translator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgnMapper {
    options: MapperOptions,
}

impl PgnMapper {
    pub fn new(options: MapperOptions) -> Self {
        Self { options }
    }

    /// Column assignments for a message, in field order.
    pub fn map(&self, msg: &N2kMessage) -> Vec<ColumnAssignment> {
        let mut out = Vec::new();

        for field in &msg.fields {
            for &(_, _, column, kind) in DIRECT_FIELDS
                .iter()
                .filter(|(pgn, id, _, _)| *pgn == msg.group_id && *id == field.id)
            {
                push(&mut out, column, extract(&field.value, kind), false);
            }
        }

        match msg.group_id {
            PGN_SPEED if self.options.water_speed_as_sog => {
                let speed = msg.number("speed_water_referenced").map(Value::Number);
                push(&mut out, "SOG", speed, true);
            }
            PGN_TEMPERATURE => map_temperature(msg, "actual_temperature", &mut out),
            PGN_TEMPERATURE_EXTENDED => map_temperature(msg, "temperature", &mut out),
            PGN_WIND_DATA => map_wind(msg, &mut out),
            PGN_ENGINE_RAPID => map_engine_speed(msg, &mut out),
            PGN_ENGINE_DYNAMIC if is_primary_engine(msg) => {
                for (id, column) in ENGINE_DYNAMIC_FIELDS {
                    push(&mut out, column, msg.number(id).map(Value::Number), false);
                }
            }
            PGN_FLUID_LEVEL => map_fluid_level(msg, &mut out),
            _ => {}
        }

        out
    }
}

fn push(out: &mut Vec<ColumnAssignment>, column: &str, value: Option<Value>, fallback: bool) {
    if let (Some(column), Some(value)) = (column_index(column), value) {
        out.push(ColumnAssignment {
            column,
            value,
            fallback,
        });
    }
}

fn extract(value: &FieldValue, kind: ValueKind) -> Option<Value> {
    match (kind, value) {
        (_, FieldValue::Number(_)) => value.as_number().map(Value::Number),
        (ValueKind::Text, FieldValue::Text(_)) => {
            value.as_text().map(|s| Value::Text(s.to_string()))
        }
        _ => None,
    }
}

/// Lower-cased text or integer code of a selector field.
enum Selector {
    Code(i64),
    Label(String),
}

fn selector(field: Option<&Field>) -> Option<Selector> {
    let value = &field?.value;
    if let Some(n) = value.as_number() {
        return (n.fract() == 0.0).then_some(Selector::Code(n as i64));
    }
    value.as_text().map(|s| Selector::Label(s.to_ascii_lowercase()))
}

fn map_temperature(msg: &N2kMessage, value_field: &str, out: &mut Vec<ColumnAssignment>) {
    let column = match selector(msg.field("source")) {
        Some(Selector::Code(0)) => "SeaTemp",
        Some(Selector::Code(1)) => "AirTemp",
        Some(Selector::Label(s)) if s.contains("sea") => "SeaTemp",
        Some(Selector::Label(s)) if s.contains("outside") || s.contains("air") => "AirTemp",
        _ => return,
    };
    push(out, column, msg.number(value_field).map(Value::Number), false);
}

fn map_wind(msg: &N2kMessage, out: &mut Vec<ColumnAssignment>) {
    // N2K wind reference: 0 true/north, 1 magnetic, 2 apparent, 3 true/boat, 4 true/water
    let (angle_column, speed_column) = match selector(msg.field("reference")) {
        Some(Selector::Code(2)) => ("AWA", "AWS"),
        Some(Selector::Code(3 | 4)) => ("TWA", "TWS"),
        Some(Selector::Code(0)) => ("TWD", "TWS"),
        Some(Selector::Label(s)) if s.starts_with("apparent") => ("AWA", "AWS"),
        Some(Selector::Label(s)) if s.contains("north") => ("TWD", "TWS"),
        Some(Selector::Label(s)) if s.contains("boat") || s.contains("water") => ("TWA", "TWS"),
        _ => return,
    };
    push(out, angle_column, msg.number("wind_angle").map(Value::Number), false);
    push(out, speed_column, msg.number("wind_speed").map(Value::Number), false);
}

fn engine_instance(msg: &N2kMessage) -> Option<i64> {
    match selector(msg.field("instance")) {
        None => Some(0),
        Some(Selector::Code(n)) => Some(n),
        Some(Selector::Label(s)) => match s.as_str() {
            "single engine or dual engine port" | "port" => Some(0),
            "dual engine starboard" | "starboard" => Some(1),
            _ => None,
        },
    }
}

fn is_primary_engine(msg: &N2kMessage) -> bool {
    engine_instance(msg) == Some(0)
}

fn map_engine_speed(msg: &N2kMessage, out: &mut Vec<ColumnAssignment>) {
    let column = match engine_instance(msg) {
        Some(0) => "RPM 1",
        Some(1) => "RPM 2",
        _ => return,
    };
    push(out, column, msg.number("speed").map(Value::Number), false);
}

fn map_fluid_level(msg: &N2kMessage, out: &mut Vec<ColumnAssignment>) {
    let is_fuel = match selector(msg.field("type")) {
        Some(Selector::Code(0)) => true,
        Some(Selector::Label(s)) => s == "fuel",
        _ => false,
    };
    if is_fuel {
        push(out, "FuelLevel", msg.number("level").map(Value::Number), false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use n2k_common::schema::COLUMN_NAMES;

    fn columns(assignments: &[ColumnAssignment]) -> Vec<&'static str> {
        assignments.iter().map(|a| COLUMN_NAMES[a.column]).collect()
    }

    #[test]
    fn test_table_columns_exist() {
        for (pgn, id, column, _) in DIRECT_FIELDS {
            assert!(column_index(column).is_some(), "{pgn}/{id} -> unknown column {column}");
        }
        for (id, column) in ENGINE_DYNAMIC_FIELDS {
            assert!(column_index(column).is_some(), "{id} -> unknown column {column}");
        }
    }

    #[test]
    fn test_core_fields() {
        let mapper = PgnMapper::default();
        let speed =
            mapper.map(&N2kMessage::new(PGN_SPEED).with_field("speed_water_referenced", 12.5));
        assert_eq!(columns(&speed), vec!["BSP"]);
        assert_eq!(speed[0].value, Value::Number(12.5));
        assert!(!speed[0].fallback);

        let depth = mapper.map(&N2kMessage::new(PGN_WATER_DEPTH).with_field("depth", 20.3));
        assert_eq!(columns(&depth), vec!["Depth"]);

        let heading = mapper.map(&N2kMessage::new(PGN_VESSEL_HEADING).with_field("heading", 45.0));
        assert_eq!(columns(&heading), vec!["HDG"]);
    }

    #[test]
    fn test_unknown_inputs_map_to_nothing() {
        let mapper = PgnMapper::default();
        assert!(mapper.map(&N2kMessage::new(99999).with_field("depth", 1.0)).is_empty());
        assert!(mapper.map(&N2kMessage::new(PGN_WATER_DEPTH).with_field("offset", 0.5)).is_empty());
        assert!(mapper.map(&N2kMessage::new(PGN_WATER_DEPTH)).is_empty());
    }

    #[test]
    fn test_type_mismatch_maps_to_nothing() {
        let mapper = PgnMapper::default();
        let msg = N2kMessage::new(PGN_WATER_DEPTH).with_field("depth", "deep");
        assert!(mapper.map(&msg).is_empty());
        let msg = N2kMessage::new(PGN_WATER_DEPTH).with_field("depth", f64::NAN);
        assert!(mapper.map(&msg).is_empty());
        let msg = N2kMessage::new(PGN_WATER_DEPTH).with_field("depth", FieldValue::Missing);
        assert!(mapper.map(&msg).is_empty());
    }

    #[test]
    fn test_text_fields_accept_strings() {
        let mapper = PgnMapper::default();
        let msg = N2kMessage::new(PGN_GNSS_POSITION)
            .with_field("method", "GNSS fix")
            .with_field("gnss_type", "GPS+GLONASS")
            .with_field("number_of_svs", 11.0);
        let out = mapper.map(&msg);
        assert_eq!(columns(&out), vec!["GpQual", "GpsMode", "GpsNum"]);
        assert_eq!(out[0].value, Value::Text("GNSS fix".into()));
    }

    #[test]
    fn test_temperature_source_selects_column() {
        let mapper = PgnMapper::default();
        let sea = N2kMessage::new(PGN_TEMPERATURE)
            .with_field("source", "Sea Temperature")
            .with_field("actual_temperature", 291.2);
        assert_eq!(columns(&mapper.map(&sea)), vec!["SeaTemp"]);

        let air = N2kMessage::new(PGN_TEMPERATURE_EXTENDED)
            .with_field("source", 1.0)
            .with_field("temperature", 288.0);
        assert_eq!(columns(&mapper.map(&air)), vec!["AirTemp"]);

        let engine_room = N2kMessage::new(PGN_TEMPERATURE)
            .with_field("source", "Engine Room Temperature")
            .with_field("actual_temperature", 320.0);
        assert!(mapper.map(&engine_room).is_empty());

        let no_source = N2kMessage::new(PGN_TEMPERATURE).with_field("actual_temperature", 290.0);
        assert!(mapper.map(&no_source).is_empty());
    }

    #[test]
    fn test_wind_reference_selects_columns() {
        let mapper = PgnMapper::default();
        let apparent = N2kMessage::new(PGN_WIND_DATA)
            .with_field("wind_speed", 7.1)
            .with_field("wind_angle", 0.6)
            .with_field("reference", "Apparent");
        assert_eq!(columns(&mapper.map(&apparent)), vec!["AWA", "AWS"]);

        let true_boat = N2kMessage::new(PGN_WIND_DATA)
            .with_field("wind_speed", 5.0)
            .with_field("wind_angle", 0.9)
            .with_field("reference", 3.0);
        assert_eq!(columns(&mapper.map(&true_boat)), vec!["TWA", "TWS"]);

        let north = N2kMessage::new(PGN_WIND_DATA)
            .with_field("wind_angle", 4.0)
            .with_field("reference", "True (ground referenced to North)");
        assert_eq!(columns(&mapper.map(&north)), vec!["TWD"]);
    }

    #[test]
    fn test_engine_instances() {
        let mapper = PgnMapper::default();
        let port = N2kMessage::new(PGN_ENGINE_RAPID)
            .with_field("instance", 0.0)
            .with_field("speed", 1800.0);
        assert_eq!(columns(&mapper.map(&port)), vec!["RPM 1"]);
        let stbd = N2kMessage::new(PGN_ENGINE_RAPID)
            .with_field("instance", "Dual Engine Starboard")
            .with_field("speed", 1750.0);
        assert_eq!(columns(&mapper.map(&stbd)), vec!["RPM 2"]);
        let third = N2kMessage::new(PGN_ENGINE_RAPID)
            .with_field("instance", 2.0)
            .with_field("speed", 900.0);
        assert!(mapper.map(&third).is_empty());

        let dynamic = N2kMessage::new(PGN_ENGINE_DYNAMIC)
            .with_field("oil_pressure", 350.0)
            .with_field("temperature", 355.0);
        assert_eq!(columns(&mapper.map(&dynamic)), vec!["EngOilPres", "EngTemp"]);
        let dynamic_stbd = dynamic.clone().with_field("instance", 1.0);
        assert!(mapper.map(&dynamic_stbd).is_empty());
    }

    #[test]
    fn test_fluid_level_fuel_only() {
        let mapper = PgnMapper::default();
        let fuel = N2kMessage::new(PGN_FLUID_LEVEL)
            .with_field("type", "Fuel")
            .with_field("level", 62.0);
        assert_eq!(columns(&mapper.map(&fuel)), vec!["FuelLevel"]);
        let water = N2kMessage::new(PGN_FLUID_LEVEL)
            .with_field("type", "Water")
            .with_field("level", 40.0);
        assert!(mapper.map(&water).is_empty());
    }

    #[test]
    fn test_water_speed_fallback_is_opt_in() {
        let msg = N2kMessage::new(PGN_SPEED).with_field("speed_water_referenced", 6.0);
        assert_eq!(columns(&PgnMapper::default().map(&msg)), vec!["BSP"]);

        let mapper = PgnMapper::new(MapperOptions { water_speed_as_sog: true });
        let out = mapper.map(&msg);
        assert_eq!(columns(&out), vec!["BSP", "SOG"]);
        assert!(out[1].fallback);

        let with_ground = msg.with_field("speed_ground_referenced", 6.4);
        let out = mapper.map(&with_ground);
        assert_eq!(columns(&out), vec!["BSP", "SOG", "SOG"]);
        assert!(!out[1].fallback);
        assert!(out[2].fallback);
    }
}
