//! Per-mode priority
//!
//! A preference in `0.0..=1.5` (stored in steps of 0.1): above 1 the mode prefers the
//! way, below 1 it avoids it. Custom models usually start from this value.

use super::ParseContext;
use crate::ev::{Direction, EvHandle, RoadClass, StandardValues, Toll};
use crate::mode::Mode;

/// Preference for a road class
pub fn class_priority(mode: Mode, class: RoadClass) -> f64 {
    match mode {
        Mode::Car => match class {
            RoadClass::Motorway | RoadClass::Trunk | RoadClass::Primary => 1.0,
            RoadClass::Secondary | RoadClass::Tertiary => 0.9,
            RoadClass::Unclassified | RoadClass::Residential => 0.8,
            RoadClass::Service | RoadClass::LivingStreet | RoadClass::Road => 0.5,
            RoadClass::Track => 0.3,
            _ => 0.5,
        },
        Mode::Bike => match class {
            RoadClass::Cycleway => 1.3,
            RoadClass::Path => 1.1,
            RoadClass::Track | RoadClass::Residential | RoadClass::LivingStreet | RoadClass::Unclassified => 1.0,
            RoadClass::Service | RoadClass::Tertiary => 0.9,
            RoadClass::Secondary | RoadClass::Other | RoadClass::Road => 0.8,
            RoadClass::Primary => 0.7,
            RoadClass::Footway | RoadClass::Pedestrian => 0.6,
            RoadClass::Trunk | RoadClass::Motorway => 0.5,
            RoadClass::Steps => 0.3,
            _ => 0.8,
        },
        Mode::Foot => match class {
            RoadClass::Footway | RoadClass::Pedestrian | RoadClass::Path => 1.2,
            RoadClass::Track | RoadClass::LivingStreet => 1.1,
            RoadClass::Residential | RoadClass::Service | RoadClass::Unclassified => 1.0,
            RoadClass::Steps => 0.9,
            RoadClass::Cycleway | RoadClass::Tertiary => 0.8,
            RoadClass::Secondary => 0.7,
            RoadClass::Primary => 0.6,
            RoadClass::Trunk | RoadClass::Motorway => 0.3,
            _ => 0.9,
        },
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PriorityParser {
    pub(crate) mode: Mode,
    pub(crate) road_class: EvHandle,
    pub(crate) hike_rating: EvHandle,
    pub(crate) toll: EvHandle,
    pub(crate) priority: EvHandle,
}

impl PriorityParser {
    pub fn new(mode: Mode, values: &StandardValues, priority: EvHandle) -> Self {
        Self {
            mode,
            road_class: values.road_class,
            hike_rating: values.hike_rating,
            toll: values.toll,
            priority,
        }
    }

    pub(crate) fn reads(&self) -> Vec<EvHandle> {
        match self.mode {
            Mode::Car => vec![self.road_class, self.toll],
            Mode::Bike => vec![self.road_class],
            Mode::Foot => vec![self.road_class, self.hike_rating],
        }
    }

    fn priority(&self, flags: &[u32]) -> f64 {
        let class = RoadClass::from_index(self.road_class.get_enum(flags, Direction::Forward))
            .unwrap_or(RoadClass::Other);
        let priority = class_priority(self.mode, class);
        match self.mode {
            Mode::Car => {
                let toll = Toll::from_index(self.toll.get_enum(flags, Direction::Forward));
                if toll == Some(Toll::All) {
                    priority - 0.2
                } else {
                    priority
                }
            }
            Mode::Foot => match self.hike_rating.get_int(flags, Direction::Forward) {
                0..=2 => priority,
                3 => priority.min(0.8),
                _ => priority.min(0.5),
            },
            Mode::Bike => priority,
        }
    }

    pub(crate) fn handle(&self, ctx: &ParseContext<'_>, flags: &mut [u32]) {
        if ctx.way.get_str("highway").is_none() && ctx.way.get_str("route").is_none() {
            return;
        }
        let priority = self.priority(flags).clamp(0.0, self.priority.max_decimal());
        ctx.check(
            self.mode.priority_key(),
            self.priority.set_decimal(flags, Direction::Forward, priority),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::null_sink;
    use crate::ev::Registry;
    use crate::parsers::{HikeRatingParser, RoadClassParser, TollParser};
    use crate::tags::WayTags;

    fn priority(mode: Mode, way: &WayTags) -> f64 {
        let mut registry = Registry::new(4);
        let values = StandardValues::declare(&mut registry, Mode::all()).unwrap();
        let handle = values.mode(mode).unwrap().priority;
        let sink = null_sink();
        let ctx = ParseContext {
            edge_id: 0,
            way,
            relation_flags: &[],
            sink: &sink,
        };
        let mut flags = vec![0u32; 4];
        RoadClassParser::new(values.road_class).handle(&ctx, &mut flags);
        HikeRatingParser::new(values.hike_rating).handle(&ctx, &mut flags);
        TollParser::new(values.toll).handle(&ctx, &mut flags);
        PriorityParser::new(mode, &values, handle).handle(&ctx, &mut flags);
        handle.get_decimal(&flags, Direction::Forward)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn test_class_priority() {
        let cycleway = WayTags::new(1).with_tag("highway", "cycleway");
        assert_close(priority(Mode::Bike, &cycleway), 1.3);
        assert_close(priority(Mode::Foot, &cycleway), 0.8);
    }

    #[test]
    fn test_hike_rating_lowers_foot_priority() {
        let easy = WayTags::new(1)
            .with_tag("highway", "path")
            .with_tag("sac_scale", "hiking");
        assert_close(priority(Mode::Foot, &easy), 1.2);

        let alpine = WayTags::new(1)
            .with_tag("highway", "path")
            .with_tag("sac_scale", "alpine_hiking");
        assert_close(priority(Mode::Foot, &alpine), 0.5);
    }

    #[test]
    fn test_toll_lowers_car_priority() {
        let toll = WayTags::new(1)
            .with_tag("highway", "motorway")
            .with_tag("toll", "yes");
        assert_close(priority(Mode::Car, &toll), 0.8);
    }

    #[test]
    fn test_untagged_way_keeps_zero() {
        assert_eq!(priority(Mode::Car, &WayTags::new(1)), 0.0);
    }
}
