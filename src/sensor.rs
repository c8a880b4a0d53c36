//! The fixed sensor registry.

use std::fmt;

/// The closed set of sensors exported by the bridge.
///
/// Each sensor mirrors one status file the MiSTer process maintains. The set
/// is fixed at compile time, so resolving a watched file name can never fall
/// through to an unknown sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sensor {
    /// Name of the currently loaded core (`CORENAME`).
    CoreName,
    /// Path of the currently running game (`ACTIVEGAME`).
    ActiveGame,
    /// File name of the loaded RBF bitstream (`RBFNAME`).
    RbfName,
}

impl Sensor {
    /// All sensors, in snapshot and discovery order.
    pub const ALL: [Sensor; 3] = [Sensor::CoreName, Sensor::ActiveGame, Sensor::RbfName];

    /// Stable identifier used in topics and unique IDs.
    pub fn id(&self) -> &'static str {
        match self {
            Sensor::CoreName => "corename",
            Sensor::ActiveGame => "activegame",
            Sensor::RbfName => "rbfname",
        }
    }

    /// Base name of the status file backing this sensor.
    pub fn file_name(&self) -> &'static str {
        match self {
            Sensor::CoreName => "CORENAME",
            Sensor::ActiveGame => "ACTIVEGAME",
            Sensor::RbfName => "RBFNAME",
        }
    }

    /// Human-readable name used in discovery records.
    pub fn display_name(&self) -> &'static str {
        match self {
            Sensor::CoreName => "Core Name",
            Sensor::ActiveGame => "Active Game",
            Sensor::RbfName => "RBF Name",
        }
    }

    /// Resolve a status file base name back to its sensor.
    ///
    /// Returns `None` for file names outside the watched set.
    pub fn from_file_name(name: &str) -> Option<Sensor> {
        Sensor::ALL.into_iter().find(|s| s.file_name() == name)
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
