//! Fixed CSV column layout and format versioning.
//!
//! Column order is the wire format: downstream analysis tools index columns
//! by position, so the list below must never change without bumping
//! [`FORMAT_VERSION`].

use std::collections::HashMap;
use std::sync::LazyLock;

/// Number of columns in every header and data row.
pub const COLUMN_COUNT: usize = 181;

/// Format version tag written as the second line of every log file.
pub const FORMAT_VERSION: &str = "!v11.10.18";

/// Prefix every version line must start with.
pub const VERSION_MARKER: &str = "!v";

/// Boat identifier written to the first column when none is configured.
pub const DEFAULT_BOAT_ID: &str = "0";

/// Identity column (position 0).
pub const BOAT_COLUMN: &str = "Boat";

/// Timestamp column (position 1), holding a serial day number.
pub const UTC_COLUMN: &str = "Utc";

/// Position of [`BOAT_COLUMN`].
pub const BOAT_INDEX: usize = 0;

/// Position of [`UTC_COLUMN`].
pub const UTC_INDEX: usize = 1;

/// Column names in file order, ten per line.
#[rustfmt::skip]
pub const COLUMN_NAMES: [&str; COLUMN_COUNT] = [
    "Boat", "Utc", "BSP", "AWA", "AWS", "TWA", "TWS", "TWD", "RudderFwd", "Leeway",
    "Set", "Drift", "HDG", "AirTemp", "SeaTemp", "Baro", "Depth", "Heel", "Trim", "Rudder",
    "Tab", "Forestay", "Downhaul", "MastAng", "FStayLen", "MastButt", "Load S", "Load P", "Rake", "Volts",
    "ROT", "GpQual", "PDOP", "GpsNum", "GpsAge", "Altitude", "GeoSep", "GpsMode", "Lat", "Lon",
    "COG", "SOG", "DiffStn", "Error", "RunnerS", "RunnerP", "Vang", "Trav", "Main", "KeelAng",
    "KeelHt", "Board", "EngOilPres", "RPM 1", "RPM 2", "Board P", "Board S", "DistToLn", "RchTmToLn", "RchDtToLn",
    "GPS time", "TWD+90", "TWD-90", "Downhaul2", "Mk Lat", "Mk Lon", "Port lat", "Port lon", "Stbd lat", "Stbd lon",
    "HPE", "RH", "Lead P", "Lead S", "BackStay", "User 0", "User 1", "User 2", "User 3", "User 4",
    "User 5", "User 6", "User 7", "User 8", "User 9", "User 10", "User 11", "User 12", "User 13", "User 14",
    "User 15", "User 16", "User 17", "User 18", "User 19", "User 20", "User 21", "User 22", "User 23", "User 24",
    "User 25", "User 26", "User 27", "User 28", "User 29", "User 30", "User 31", "TmToGun", "TmToLn", "Burn",
    "BelowLn", "GunBlwLn", "WvSigHt", "WvSigPd", "WvMaxHt", "WvMaxPd", "Slam", "Heave", "MWA", "MWS",
    "Boom", "Twist", "TackLossT", "TackLossD", "TrimRate", "HeelRate", "DeflectorP", "RudderP", "RudderS", "RudderToe",
    "BspTr", "FStayInner", "DeflectorS", "Bobstay", "Outhaul", "D0 P", "D0 S", "D1 P", "D1 S", "V0 P",
    "V0 S", "V1 P", "V1 S", "BoomAng", "Cunningham", "FStayInHal", "JibFurl", "JibH", "MastCant", "J1",
    "J2", "J3", "J4", "Foil P", "Foil S", "Reacher", "Blade", "Staysail", "Solent", "Tack",
    "TackP", "TackS", "DeflectU", "DeflectL", "WinchP", "WinchS", "SpinP", "SpinS", "MainH", "Mast2",
    "DepthAft", "Burn%", "GunBspTarg%", "GunBspPol%", "EngTemp", "EngOilTemp", "TranOilTemp", "TranOilPres", "FuelLevel", "Amps",
    "Charge%",
];

static COLUMN_POSITIONS: LazyLock<HashMap<&'static str, usize>> = LazyLock::new(|| {
    COLUMN_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, i))
        .collect()
});

/// Position of a column by exact name.
pub fn column_index(name: &str) -> Option<usize> {
    COLUMN_POSITIONS.get(name).copied()
}

/// Check whether a line is a well-formed version tag.
pub fn is_version_line(line: &str) -> bool {
    line.starts_with(VERSION_MARKER)
}
