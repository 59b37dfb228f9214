//! Per-mode average speed
//!
//! Derived from values already in the flags (road class, link, surface, speed limit),
//! so this parser must run after those writers.

use super::ParseContext;
use crate::ev::{Direction, EvHandle, RoadClass, StandardValues, Surface};
use crate::mode::Mode;

/// Share of the legal limit a car is assumed to average
const CAR_LIMIT_SHARE: f64 = 0.9;

/// Typical speed in km/h for a road class
pub fn base_speed(mode: Mode, class: RoadClass, link: bool) -> f64 {
    match mode {
        Mode::Car => match (class, link) {
            (RoadClass::Motorway, false) => 110.0,
            (RoadClass::Motorway, true) => 60.0,
            (RoadClass::Trunk, false) => 90.0,
            (RoadClass::Trunk, true) => 50.0,
            (RoadClass::Primary, false) => 70.0,
            (RoadClass::Primary, true) => 40.0,
            (RoadClass::Secondary, false) => 60.0,
            (RoadClass::Secondary, true) => 40.0,
            (RoadClass::Tertiary, false) => 50.0,
            (RoadClass::Tertiary, true) => 30.0,
            (RoadClass::Unclassified, _) => 50.0,
            (RoadClass::Residential, _) => 30.0,
            (RoadClass::Service | RoadClass::Road, _) => 20.0,
            (RoadClass::Track, _) => 15.0,
            (RoadClass::LivingStreet, _) => 10.0,
            _ => 5.0,
        },
        Mode::Bike => match class {
            RoadClass::Cycleway => 20.0,
            RoadClass::Residential
            | RoadClass::Unclassified
            | RoadClass::Tertiary
            | RoadClass::Secondary
            | RoadClass::Primary
            | RoadClass::Trunk
            | RoadClass::Motorway => 18.0,
            RoadClass::Path | RoadClass::Footway | RoadClass::Service | RoadClass::LivingStreet => 15.0,
            RoadClass::Track | RoadClass::Road => 12.0,
            RoadClass::Steps => 2.0,
            _ => 6.0,
        },
        Mode::Foot => match class {
            RoadClass::Footway
            | RoadClass::Pedestrian
            | RoadClass::Steps
            | RoadClass::Residential
            | RoadClass::LivingStreet
            | RoadClass::Unclassified => 5.0,
            RoadClass::Track => 4.0,
            _ => 4.5,
        },
    }
}

/// Fixed ferry speed in km/h
pub fn ferry_speed(mode: Mode) -> f64 {
    match mode {
        Mode::Car => 20.0,
        Mode::Bike => 10.0,
        Mode::Foot => 5.0,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AverageSpeedParser {
    pub(crate) mode: Mode,
    pub(crate) road_class: EvHandle,
    pub(crate) road_class_link: EvHandle,
    pub(crate) max_speed: EvHandle,
    pub(crate) surface: EvHandle,
    pub(crate) average_speed: EvHandle,
}

impl AverageSpeedParser {
    pub fn new(mode: Mode, values: &StandardValues, average_speed: EvHandle) -> Self {
        Self {
            mode,
            road_class: values.road_class,
            road_class_link: values.road_class_link,
            max_speed: values.max_speed,
            surface: values.surface,
            average_speed,
        }
    }

    pub(crate) fn reads(&self) -> Vec<EvHandle> {
        vec![self.road_class, self.road_class_link, self.max_speed, self.surface]
    }

    fn speed(&self, flags: &[u32], direction: Direction) -> f64 {
        let class = RoadClass::from_index(self.road_class.get_enum(flags, direction)).unwrap_or(RoadClass::Other);
        let link = self.road_class_link.get_bool(flags, direction);
        let mut speed = base_speed(self.mode, class, link);

        let surface = Surface::from_index(self.surface.get_enum(flags, direction)).unwrap_or(Surface::Missing);
        if surface.is_unpaved() {
            speed = match self.mode {
                Mode::Car => speed.min(30.0),
                Mode::Bike => speed.min(12.0),
                Mode::Foot => speed,
            };
        }

        if self.mode == Mode::Car {
            let limit = self.max_speed.get_decimal(flags, direction);
            if limit.is_finite() {
                speed = speed.min(limit * CAR_LIMIT_SHARE);
            }
        }
        speed
    }

    pub(crate) fn handle(&self, ctx: &ParseContext<'_>, flags: &mut [u32]) {
        let ferry = ctx.way.get_str("route") == Some("ferry");
        for direction in Direction::BOTH {
            let speed = if ferry {
                ferry_speed(self.mode)
            } else if ctx.way.get_str("highway").is_some() {
                self.speed(flags, direction)
            } else {
                continue;
            };
            let speed = speed.min(self.average_speed.max_decimal());
            ctx.check(
                self.mode.average_speed_key(),
                self.average_speed.set_decimal(flags, direction, speed),
            );
        }
    }
}
