//! Travel modes
//!
//! Vehicle-specific encoded values are named after the mode they belong to
//! (`car_access`, `bike_average_speed`, `foot_priority`), so a custom model written
//! for one mode reads naturally: `car_access && road_class == MOTORWAY`.

use serde::{Deserialize, Serialize};

/// Mode enumeration matching the encoded value name prefixes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Car = 0,
    Bike = 1,
    Foot = 2,
}

impl Mode {
    pub fn all() -> &'static [Mode] {
        &[Mode::Car, Mode::Bike, Mode::Foot]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Car => "car",
            Mode::Bike => "bike",
            Mode::Foot => "foot",
        }
    }

    pub fn from_u8(v: u8) -> Option<Mode> {
        match v {
            0 => Some(Mode::Car),
            1 => Some(Mode::Bike),
            2 => Some(Mode::Foot),
            _ => None,
        }
    }

    /// Name of the directional access boolean for this mode
    pub fn access_key(&self) -> &'static str {
        match self {
            Mode::Car => "car_access",
            Mode::Bike => "bike_access",
            Mode::Foot => "foot_access",
        }
    }

    /// Name of the directional average speed decimal for this mode
    pub fn average_speed_key(&self) -> &'static str {
        match self {
            Mode::Car => "car_average_speed",
            Mode::Bike => "bike_average_speed",
            Mode::Foot => "foot_average_speed",
        }
    }

    /// Name of the priority decimal for this mode
    pub fn priority_key(&self) -> &'static str {
        match self {
            Mode::Car => "car_priority",
            Mode::Bike => "bike_priority",
            Mode::Foot => "foot_priority",
        }
    }

    /// OSM access keys from most to least specific
    ///
    /// The first key present on a way decides access for this mode.
    pub fn access_hierarchy(&self) -> &'static [&'static str] {
        match self {
            Mode::Car => &["motorcar", "motor_vehicle", "vehicle", "access"],
            Mode::Bike => &["bicycle", "vehicle", "access"],
            Mode::Foot => &["foot", "access"],
        }
    }

    /// Whether `oneway` tagging restricts this mode
    pub fn respects_oneway(&self) -> bool {
        !matches!(self, Mode::Foot)
    }
}
