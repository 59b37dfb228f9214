//! Mode-independent way attributes

use super::{is_yes, ParseContext};
use crate::diagnostics::DiagnosticKind;
use crate::ev::{Direction, EvHandle, RoadAccess, RoadClass, RouteNetwork, Surface, Toll};

/// Kilometres per mile
const MPH_TO_KMH: f64 = 1.609_344;
/// Kilometres per nautical mile
const KNOTS_TO_KMH: f64 = 1.852;

#[derive(Debug, Clone, Copy)]
pub struct RoadClassParser {
    pub(crate) road_class: EvHandle,
}

impl RoadClassParser {
    pub fn new(road_class: EvHandle) -> Self {
        Self { road_class }
    }

    pub(crate) fn handle(&self, ctx: &ParseContext<'_>, flags: &mut [u32]) {
        let Some(highway) = ctx.way.get_str("highway") else {
            return;
        };
        let class = RoadClass::from_highway(highway);
        ctx.check("highway", self.road_class.set_enum(flags, Direction::Forward, class.index()));
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RoadClassLinkParser {
    pub(crate) road_class_link: EvHandle,
}

impl RoadClassLinkParser {
    pub fn new(road_class_link: EvHandle) -> Self {
        Self { road_class_link }
    }

    pub(crate) fn handle(&self, ctx: &ParseContext<'_>, flags: &mut [u32]) {
        let is_link = ctx.way.get_str("highway").is_some_and(|h| h.ends_with("_link"));
        if is_link {
            ctx.check("highway", self.road_class_link.set_bool(flags, Direction::Forward, true));
        }
    }
}

/// Keys considered for the general `road_access` value
const ROAD_ACCESS_KEYS: [&str; 4] = ["access", "vehicle", "motor_vehicle", "motorcar"];

#[derive(Debug, Clone, Copy)]
pub struct RoadAccessParser {
    pub(crate) road_access: EvHandle,
}

impl RoadAccessParser {
    pub fn new(road_access: EvHandle) -> Self {
        Self { road_access }
    }

    pub(crate) fn handle(&self, ctx: &ParseContext<'_>, flags: &mut [u32]) {
        // Most restrictive recognised value wins
        let access = ROAD_ACCESS_KEYS
            .iter()
            .filter_map(|key| ctx.way.get_str(key))
            .flat_map(|value| value.split(';'))
            .filter_map(RoadAccess::from_tag)
            .max();
        if let Some(access) = access {
            ctx.check("access", self.road_access.set_enum(flags, Direction::Forward, access.index()));
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SurfaceParser {
    pub(crate) surface: EvHandle,
}

impl SurfaceParser {
    pub fn new(surface: EvHandle) -> Self {
        Self { surface }
    }

    pub(crate) fn handle(&self, ctx: &ParseContext<'_>, flags: &mut [u32]) {
        if let Some(value) = ctx.way.get_str("surface") {
            let surface = Surface::from_tag(value);
            ctx.check("surface", self.surface.set_enum(flags, Direction::Forward, surface.index()));
        }
    }
}

/// Speed limit in km/h
///
/// `Ok(None)` means "no limit"; `Err` carries the unparsable value.
pub fn parse_max_speed(value: &str) -> Result<Option<f64>, String> {
    let value = value.trim();
    match value {
        "none" | "signals" | "variable" => return Ok(None),
        "walk" => return Ok(Some(6.0)),
        _ => {}
    }

    let (number, factor) = if let Some(n) = value.strip_suffix("mph") {
        (n.trim(), MPH_TO_KMH)
    } else if let Some(n) = value.strip_suffix("knots") {
        (n.trim(), KNOTS_TO_KMH)
    } else if let Some(n) = value.strip_suffix("km/h") {
        (n.trim(), 1.0)
    } else {
        (value, 1.0)
    };

    match number.parse::<f64>() {
        Ok(speed) if speed.is_finite() && speed > 0.0 => Ok(Some(speed * factor)),
        _ => Err(value.to_string()),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MaxSpeedParser {
    pub(crate) max_speed: EvHandle,
}

impl MaxSpeedParser {
    pub fn new(max_speed: EvHandle) -> Self {
        Self { max_speed }
    }

    pub(crate) fn handle(&self, ctx: &ParseContext<'_>, flags: &mut [u32]) {
        let both = ctx.way.get_str("maxspeed");
        for (direction, key) in [
            (Direction::Forward, "maxspeed:forward"),
            (Direction::Backward, "maxspeed:backward"),
        ] {
            let value = ctx.way.get_str(key).or(both);
            let speed = match value.map(parse_max_speed) {
                None | Some(Ok(None)) => f64::INFINITY,
                Some(Ok(Some(speed))) => speed,
                Some(Err(raw)) => {
                    ctx.report(DiagnosticKind::MalformedTag, format!("unparsable {key}='{raw}'"));
                    f64::INFINITY
                }
            };
            // Beyond the storable range a limit is as good as none
            let speed = if speed > self.max_speed.max_decimal() {
                f64::INFINITY
            } else {
                speed
            };
            ctx.check(key, self.max_speed.set_decimal(flags, direction, speed));
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HikeRatingParser {
    pub(crate) hike_rating: EvHandle,
}

impl HikeRatingParser {
    pub fn new(hike_rating: EvHandle) -> Self {
        Self { hike_rating }
    }

    /// `sac_scale` grade, 1 (hiking) to 6 (difficult alpine)
    pub fn rating(sac_scale: &str) -> Option<u32> {
        match sac_scale {
            "hiking" => Some(1),
            "mountain_hiking" => Some(2),
            "demanding_mountain_hiking" => Some(3),
            "alpine_hiking" => Some(4),
            "demanding_alpine_hiking" => Some(5),
            "difficult_alpine_hiking" => Some(6),
            _ => None,
        }
    }

    pub(crate) fn handle(&self, ctx: &ParseContext<'_>, flags: &mut [u32]) {
        let Some(sac_scale) = ctx.way.get_str("sac_scale") else {
            return;
        };
        match Self::rating(sac_scale) {
            Some(rating) => ctx.check("sac_scale", self.hike_rating.set_int(flags, Direction::Forward, rating)),
            None => ctx.report(DiagnosticKind::MalformedTag, format!("unknown sac_scale='{sac_scale}'")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TollParser {
    pub(crate) toll: EvHandle,
}

impl TollParser {
    pub fn new(toll: EvHandle) -> Self {
        Self { toll }
    }

    pub(crate) fn handle(&self, ctx: &ParseContext<'_>, flags: &mut [u32]) {
        let way = ctx.way;
        let toll = match way.get_str("toll") {
            Some(v) if is_yes(v) => Toll::All,
            Some("no") => Toll::No,
            _ if way.get_str("toll:hgv").is_some_and(is_yes) || way.get_str("toll:N3").is_some_and(is_yes) => {
                Toll::Hgv
            }
            _ => Toll::Missing,
        };
        if toll != Toll::Missing {
            ctx.check("toll", self.toll.set_enum(flags, Direction::Forward, toll.index()));
        }
    }
}

/// Copies the hiking route network from the relation flags
#[derive(Debug, Clone, Copy)]
pub struct FootNetworkParser {
    /// Handle into the relation registry
    pub(crate) relation_network: EvHandle,
    pub(crate) foot_network: EvHandle,
}

impl FootNetworkParser {
    pub fn new(relation_network: EvHandle, foot_network: EvHandle) -> Self {
        Self {
            relation_network,
            foot_network,
        }
    }

    pub(crate) fn handle(&self, ctx: &ParseContext<'_>, flags: &mut [u32]) {
        if !self.relation_network.fits(ctx.relation_flags) {
            return;
        }
        let index = self.relation_network.get_enum(ctx.relation_flags, Direction::Forward);
        if RouteNetwork::from_index(index).is_some_and(|n| n != RouteNetwork::Missing) {
            ctx.check("network", self.foot_network.set_enum(flags, Direction::Forward, index));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CollectingSink, SharedSink};
    use crate::ev::{Registry, RelationValues, StandardValues};
    use crate::mode::Mode;
    use crate::tags::WayTags;
    use std::sync::Arc;

    struct Fixture {
        values: StandardValues,
        flags: Vec<u32>,
        collecting: Arc<CollectingSink>,
        sink: SharedSink,
    }

    impl Fixture {
        fn new() -> Self {
            let mut registry = Registry::new(4);
            let values = StandardValues::declare(&mut registry, &[Mode::Foot]).unwrap();
            let collecting = Arc::new(CollectingSink::new());
            Self {
                values,
                flags: vec![0; 4],
                sink: collecting.clone(),
                collecting,
            }
        }

        fn ctx<'a>(&'a self, way: &'a WayTags) -> ParseContext<'a> {
            ParseContext {
                edge_id: 9,
                way,
                relation_flags: &[],
                sink: &self.sink,
            }
        }
    }

    #[test]
    fn test_road_class_and_link() {
        let fx = Fixture::new();
        let way = WayTags::new(1).with_tag("highway", "primary_link");
        let (class, link) = (fx.values.road_class, fx.values.road_class_link);
        let ctx = fx.ctx(&way);
        let mut flags = fx.flags.clone();
        RoadClassParser::new(class).handle(&ctx, &mut flags);
        RoadClassLinkParser::new(link).handle(&ctx, &mut flags);

        assert_eq!(class.get_enum(&flags, Direction::Forward), RoadClass::Primary.index());
        assert!(link.get_bool(&flags, Direction::Forward));
    }

    #[test]
    fn test_most_restrictive_access_wins() {
        let fx = Fixture::new();
        let way = WayTags::new(1)
            .with_tag("access", "destination")
            .with_tag("motor_vehicle", "private")
            .with_tag("vehicle", "unknown_value");
        let mut flags = fx.flags.clone();
        RoadAccessParser::new(fx.values.road_access).handle(&fx.ctx(&way), &mut flags);
        assert_eq!(
            fx.values.road_access.get_enum(&flags, Direction::Forward),
            RoadAccess::Private.index()
        );
    }

    #[test]
    fn test_parse_max_speed() {
        assert_eq!(parse_max_speed("50"), Ok(Some(50.0)));
        assert_eq!(parse_max_speed("none"), Ok(None));
        let mph = parse_max_speed("30 mph").unwrap().unwrap();
        assert!((mph - 48.28).abs() < 0.01);
        assert!(parse_max_speed("fast").is_err());
        assert!(parse_max_speed("-5").is_err());
    }

    #[test]
    fn test_directional_max_speed() {
        let fx = Fixture::new();
        let way = WayTags::new(1)
            .with_tag("maxspeed", "50")
            .with_tag("maxspeed:backward", "30");
        let mut flags = fx.flags.clone();
        MaxSpeedParser::new(fx.values.max_speed).handle(&fx.ctx(&way), &mut flags);
        assert_eq!(fx.values.max_speed.get_decimal(&flags, Direction::Forward), 50.0);
        assert_eq!(fx.values.max_speed.get_decimal(&flags, Direction::Backward), 30.0);
    }

    #[test]
    fn test_malformed_max_speed_is_unlimited() {
        let fx = Fixture::new();
        let way = WayTags::new(1).with_tag("maxspeed", "fast");
        let mut flags = fx.flags.clone();
        MaxSpeedParser::new(fx.values.max_speed).handle(&fx.ctx(&way), &mut flags);
        assert!(fx.values.max_speed.get_decimal(&flags, Direction::Forward).is_infinite());
        // one report per direction
        assert_eq!(fx.collecting.count(DiagnosticKind::MalformedTag), 2);
        assert_eq!(fx.collecting.snapshot()[0].edge_id, Some(9));
    }

    #[test]
    fn test_hike_rating() {
        let fx = Fixture::new();
        let mut flags = fx.flags.clone();
        let way = WayTags::new(1).with_tag("sac_scale", "alpine_hiking");
        HikeRatingParser::new(fx.values.hike_rating).handle(&fx.ctx(&way), &mut flags);
        assert_eq!(fx.values.hike_rating.get_int(&flags, Direction::Forward), 4);

        let unknown = WayTags::new(2).with_tag("sac_scale", "T9");
        let mut flags = fx.flags.clone();
        HikeRatingParser::new(fx.values.hike_rating).handle(&fx.ctx(&unknown), &mut flags);
        assert_eq!(fx.values.hike_rating.get_int(&flags, Direction::Forward), 0);
        assert_eq!(fx.collecting.count(DiagnosticKind::MalformedTag), 1);
    }

    #[test]
    fn test_toll() {
        let fx = Fixture::new();
        for (tags, expected) in [
            (vec![("toll", "yes")], Toll::All),
            (vec![("toll", "no")], Toll::No),
            (vec![("toll:hgv", "yes")], Toll::Hgv),
            (vec![("highway", "primary")], Toll::Missing),
        ] {
            let mut way = WayTags::new(1);
            for (k, v) in tags {
                way.set_tag(k, v);
            }
            let mut flags = fx.flags.clone();
            TollParser::new(fx.values.toll).handle(&fx.ctx(&way), &mut flags);
            assert_eq!(fx.values.toll.get_enum(&flags, Direction::Forward), expected.index());
        }
    }

    #[test]
    fn test_foot_network_from_relation_flags() {
        let fx = Fixture::new();
        let mut relation_registry = Registry::new(1);
        let relation = RelationValues::declare(&mut relation_registry).unwrap();
        let mut relation_flags = vec![0u32; 1];
        relation
            .foot_network
            .set_enum(&mut relation_flags, Direction::Forward, RouteNetwork::Regional.index())
            .unwrap();

        let way = WayTags::new(1);
        let ctx = ParseContext {
            edge_id: 0,
            way: &way,
            relation_flags: &relation_flags,
            sink: &fx.sink,
        };
        let mut flags = fx.flags.clone();
        let parser = FootNetworkParser::new(relation.foot_network, fx.values.foot_network);
        parser.handle(&ctx, &mut flags);
        assert_eq!(
            fx.values.foot_network.get_enum(&flags, Direction::Forward),
            RouteNetwork::Regional.index()
        );

        // no relation flags at all
        let mut untouched = fx.flags.clone();
        parser.handle(&fx.ctx(&way), &mut untouched);
        assert_eq!(untouched, fx.flags);
    }
}
