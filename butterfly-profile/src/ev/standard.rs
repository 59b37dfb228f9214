//! Built-in encoded values
//!
//! Declared in a fixed order so two registries built from the same mode list have
//! identical layouts.

use super::classes::{RoadAccess, RoadClass, RouteNetwork, Surface, Toll};
use super::{EvDescriptor, EvError, EvHandle, Registry};
use crate::mode::Mode;

pub const ROAD_CLASS: &str = "road_class";
pub const ROAD_CLASS_LINK: &str = "road_class_link";
pub const ROAD_ACCESS: &str = "road_access";
pub const SURFACE: &str = "surface";
pub const MAX_SPEED: &str = "max_speed";
pub const HIKE_RATING: &str = "hike_rating";
pub const CONSTRUCTION_RESTRICTION: &str = "construction_restriction";
pub const TOLL: &str = "toll";
pub const FOOT_NETWORK: &str = "foot_network";

/// Handles of the per-mode values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeValues {
    pub mode: Mode,
    /// Directional boolean
    pub access: EvHandle,
    /// Directional decimal, km/h
    pub average_speed: EvHandle,
    /// Decimal in `0.0..=1.5`
    pub priority: EvHandle,
}

/// Handles of every built-in edge value
#[derive(Debug, Clone, PartialEq)]
pub struct StandardValues {
    pub road_class: EvHandle,
    pub road_class_link: EvHandle,
    pub road_access: EvHandle,
    pub surface: EvHandle,
    /// Directional decimal, km/h, `+inf` when unrestricted or unknown
    pub max_speed: EvHandle,
    pub hike_rating: EvHandle,
    pub construction_restriction: EvHandle,
    pub toll: EvHandle,
    pub foot_network: EvHandle,
    pub modes: Vec<ModeValues>,
}

impl StandardValues {
    /// Declare the built-in values for `modes` on an open registry
    pub fn declare(registry: &mut Registry, modes: &[Mode]) -> Result<Self, EvError> {
        let road_class = registry.declare(EvDescriptor::enumeration(ROAD_CLASS, RoadClass::names()))?;
        let road_class_link = registry.declare(EvDescriptor::boolean(ROAD_CLASS_LINK))?;
        let road_access = registry.declare(EvDescriptor::enumeration(ROAD_ACCESS, RoadAccess::names()))?;
        let surface = registry.declare(EvDescriptor::enumeration(SURFACE, Surface::names()))?;
        let max_speed = registry.declare(
            EvDescriptor::decimal(MAX_SPEED, 7, 2.0)
                .directional()
                .max_is_infinity(),
        )?;
        let hike_rating = registry.declare(EvDescriptor::int(HIKE_RATING, 3))?;
        let construction_restriction = registry.declare(EvDescriptor::boolean(CONSTRUCTION_RESTRICTION))?;
        let toll = registry.declare(EvDescriptor::enumeration(TOLL, Toll::names()))?;
        let foot_network = registry.declare(EvDescriptor::enumeration(FOOT_NETWORK, RouteNetwork::names()))?;

        let mut mode_values = Vec::with_capacity(modes.len());
        for &mode in modes {
            let (speed_bits, speed_factor) = match mode {
                Mode::Car => (5, 5.0),
                Mode::Bike => (5, 1.0),
                Mode::Foot => (4, 0.5),
            };
            mode_values.push(ModeValues {
                mode,
                access: registry.declare(EvDescriptor::boolean(mode.access_key()).directional())?,
                average_speed: registry.declare(
                    EvDescriptor::decimal(mode.average_speed_key(), speed_bits, speed_factor).directional(),
                )?,
                priority: registry.declare(EvDescriptor::decimal(mode.priority_key(), 4, 0.1))?,
            });
        }

        Ok(Self {
            road_class,
            road_class_link,
            road_access,
            surface,
            max_speed,
            hike_rating,
            construction_restriction,
            toll,
            foot_network,
            modes: mode_values,
        })
    }

    pub fn mode(&self, mode: Mode) -> Option<&ModeValues> {
        self.modes.iter().find(|m| m.mode == mode)
    }
}

/// Values the relation resolver writes into relation flags
///
/// The relation flags blob is produced outside this crate; this declaration is the
/// contract for how the pipeline decodes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelationValues {
    pub foot_network: EvHandle,
}

impl RelationValues {
    pub fn declare(registry: &mut Registry) -> Result<Self, EvError> {
        Ok(Self {
            foot_network: registry.declare(EvDescriptor::enumeration(FOOT_NETWORK, RouteNetwork::names()))?,
        })
    }
}
