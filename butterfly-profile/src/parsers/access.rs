//! Per-mode access with oneway handling
//!
//! Highway defaults per mode, overridden by the most specific access key present
//! (`motorcar` > `motor_vehicle` > `vehicle` > `access` for cars). Barriers on the
//! way's nodes block both directions when they deny the mode.

use super::{is_yes, ParseContext};
use crate::ev::{Direction, EvHandle};
use crate::mode::Mode;
use crate::tags::{TagMap, WayTags};

/// Values that deny access
const DENIED: [&str; 5] = ["no", "private", "restricted", "military", "emergency"];

/// Values that explicitly allow access
const ALLOWED: [&str; 6] = ["yes", "designated", "permissive", "destination", "customers", "delivery"];

/// Barriers that stop cars unless the node says otherwise
const CAR_BARRIERS: [&str; 5] = ["bollard", "block", "jersey_barrier", "cycle_barrier", "kissing_gate"];

/// Whether `mode` may use `highway` when nothing else is tagged
pub fn default_access(mode: Mode, highway: &str) -> bool {
    match mode {
        Mode::Car => matches!(
            highway,
            "motorway"
                | "motorway_link"
                | "trunk"
                | "trunk_link"
                | "primary"
                | "primary_link"
                | "secondary"
                | "secondary_link"
                | "tertiary"
                | "tertiary_link"
                | "unclassified"
                | "residential"
                | "service"
                | "living_street"
                | "road"
        ),
        Mode::Bike => matches!(
            highway,
            "cycleway"
                | "path"
                | "footway"
                | "residential"
                | "unclassified"
                | "tertiary"
                | "tertiary_link"
                | "secondary"
                | "secondary_link"
                | "primary"
                | "primary_link"
                | "service"
                | "living_street"
                | "track"
                | "road"
        ),
        Mode::Foot => matches!(
            highway,
            "footway"
                | "pedestrian"
                | "steps"
                | "path"
                | "cycleway"
                | "residential"
                | "living_street"
                | "unclassified"
                | "tertiary"
                | "tertiary_link"
                | "secondary"
                | "secondary_link"
                | "primary"
                | "primary_link"
                | "service"
                | "track"
                | "bridleway"
                | "platform"
                | "corridor"
                | "road"
        ),
    }
}

fn is_denied(mode: Mode, value: &str) -> bool {
    DENIED.contains(&value) || (mode == Mode::Bike && value == "dismount")
}

/// Directions a oneway tag leaves open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Oneway {
    Both,
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy)]
pub struct VehicleAccessParser {
    pub(crate) mode: Mode,
    pub(crate) access: EvHandle,
}

impl VehicleAccessParser {
    pub fn new(mode: Mode, access: EvHandle) -> Self {
        Self { mode, access }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn is_accessible(&self, way: &WayTags) -> bool {
        let explicit = way.first_present(self.mode.access_hierarchy());
        if way.get_str("route") == Some("ferry") {
            return explicit.map_or(true, |v| !is_denied(self.mode, v));
        }
        let Some(highway) = way.get_str("highway") else {
            return false;
        };
        match explicit {
            Some(value) if is_denied(self.mode, value) => false,
            Some(value) if ALLOWED.contains(&value) => true,
            _ => default_access(self.mode, highway),
        }
    }

    fn oneway(&self, way: &WayTags) -> Oneway {
        if !self.mode.respects_oneway() {
            return Oneway::Both;
        }
        if self.mode == Mode::Bike {
            match way.get_str("oneway:bicycle") {
                Some("no") => return Oneway::Both,
                Some(v) if is_yes(v) => return Oneway::Forward,
                Some("-1") => return Oneway::Backward,
                _ => {}
            }
        }
        match way.get_str("oneway") {
            Some(v) if is_yes(v) => Oneway::Forward,
            Some("-1") | Some("reverse") => Oneway::Backward,
            Some("no") => Oneway::Both,
            _ => {
                let implied = way.has_tag("junction", "roundabout")
                    || (self.mode == Mode::Car && way.has_any_value("highway", &["motorway", "motorway_link"]));
                if implied {
                    Oneway::Forward
                } else {
                    Oneway::Both
                }
            }
        }
    }

    /// A barrier node that denies this mode
    fn blocks(&self, node: &TagMap) -> bool {
        let Some(barrier) = node.get("barrier") else {
            return false;
        };
        let explicit = self
            .mode
            .access_hierarchy()
            .iter()
            .find_map(|key| node.get(*key))
            .map(String::as_str);
        match explicit {
            Some(value) if is_denied(self.mode, value) => true,
            Some(_) => false,
            None => self.mode == Mode::Car && CAR_BARRIERS.contains(&barrier.as_str()),
        }
    }

    pub(crate) fn handle(&self, ctx: &ParseContext<'_>, flags: &mut [u32]) {
        let way = ctx.way;
        if !self.is_accessible(way) {
            return;
        }
        if way.node_tags().is_some_and(|nodes| nodes.iter().any(|n| self.blocks(n))) {
            return;
        }

        let (forward, backward) = match self.oneway(way) {
            Oneway::Both => (true, true),
            Oneway::Forward => (true, false),
            Oneway::Backward => (false, true),
        };
        ctx.check(self.mode.access_key(), self.access.set_bool(flags, Direction::Forward, forward));
        ctx.check(self.mode.access_key(), self.access.set_bool(flags, Direction::Backward, backward));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::null_sink;
    use crate::ev::{Registry, StandardValues};
    use crate::tags::tag_map;

    fn run(mode: Mode, way: &WayTags) -> (bool, bool) {
        let mut registry = Registry::new(4);
        let values = StandardValues::declare(&mut registry, Mode::all()).unwrap();
        let access = values.mode(mode).unwrap().access;
        let sink = null_sink();
        let ctx = ParseContext {
            edge_id: 0,
            way,
            relation_flags: &[],
            sink: &sink,
        };
        let mut flags = vec![0u32; 4];
        VehicleAccessParser::new(mode, access).handle(&ctx, &mut flags);
        (
            access.get_bool(&flags, Direction::Forward),
            access.get_bool(&flags, Direction::Backward),
        )
    }

    fn way(tags: &[(&str, &str)]) -> WayTags {
        let mut way = WayTags::new(1);
        for (k, v) in tags {
            way.set_tag(*k, *v);
        }
        way
    }

    #[test]
    fn test_highway_defaults() {
        assert_eq!(run(Mode::Car, &way(&[("highway", "residential")])), (true, true));
        assert_eq!(run(Mode::Car, &way(&[("highway", "footway")])), (false, false));
        assert_eq!(run(Mode::Foot, &way(&[("highway", "motorway")])), (false, false));
        assert_eq!(run(Mode::Bike, &way(&[("highway", "cycleway")])), (true, true));
        assert_eq!(run(Mode::Car, &way(&[])), (false, false));
    }

    #[test]
    fn test_specific_key_beats_general() {
        let track = way(&[("highway", "track"), ("access", "no"), ("motor_vehicle", "yes")]);
        assert_eq!(run(Mode::Car, &track), (true, true));
        assert_eq!(run(Mode::Foot, &track), (false, false));

        let dismount = way(&[("highway", "footway"), ("bicycle", "dismount")]);
        assert_eq!(run(Mode::Bike, &dismount), (false, false));
    }

    #[test]
    fn test_oneway() {
        let oneway = way(&[("highway", "primary"), ("oneway", "yes")]);
        assert_eq!(run(Mode::Car, &oneway), (true, false));
        assert_eq!(run(Mode::Foot, &oneway), (true, true));

        let reverse = way(&[("highway", "primary"), ("oneway", "-1")]);
        assert_eq!(run(Mode::Car, &reverse), (false, true));

        let motorway = way(&[("highway", "motorway")]);
        assert_eq!(run(Mode::Car, &motorway), (true, false));

        let contraflow = way(&[("highway", "residential"), ("oneway", "yes"), ("oneway:bicycle", "no")]);
        assert_eq!(run(Mode::Bike, &contraflow), (true, true));
        assert_eq!(run(Mode::Car, &contraflow), (true, false));
    }

    #[test]
    fn test_barrier_nodes() {
        let mut gated = way(&[("highway", "service")]);
        gated.set_node_tags(vec![TagMap::new(), tag_map([("barrier", "bollard")])]);
        assert_eq!(run(Mode::Car, &gated), (false, false));
        assert_eq!(run(Mode::Foot, &gated), (true, true));

        let mut open_gate = way(&[("highway", "service")]);
        open_gate.set_node_tags(vec![tag_map([("barrier", "bollard"), ("motor_vehicle", "yes")])]);
        assert_eq!(run(Mode::Car, &open_gate), (true, true));

        let mut closed = way(&[("highway", "footway")]);
        closed.set_node_tags(vec![tag_map([("barrier", "gate"), ("access", "private")])]);
        assert_eq!(run(Mode::Foot, &closed), (false, false));
    }

    #[test]
    fn test_ferry() {
        let ferry = way(&[("route", "ferry")]);
        assert_eq!(run(Mode::Car, &ferry), (true, true));
        let no_cars = way(&[("route", "ferry"), ("motor_vehicle", "no")]);
        assert_eq!(run(Mode::Car, &no_cars), (false, false));
    }
}
