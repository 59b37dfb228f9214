//! Per-edge evaluation of a compiled model
//!
//! Walks the flat rule lists against one edge's flags. Nothing here allocates or looks
//! up names, so a single `CompiledModel` can be shared across search threads.

use super::compile::{Base, Branch, CompiledModel, Effect, Predicate, Rule};
use crate::ev::Direction;

/// Result of evaluating one edge in one direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeValues {
    /// km/h, never negative
    pub speed: f64,
    /// `0.0..=1.0`; zero means not traversable
    pub priority: f64,
    /// Extra weight per km, never negative
    pub distance_influence: f64,
}

impl EdgeValues {
    pub fn is_traversable(&self) -> bool {
        self.speed > 0.0 && self.priority > 0.0
    }
}

impl Predicate {
    #[inline]
    fn matches(&self, flags: &[u32], direction: Direction) -> bool {
        match self {
            Predicate::Const(value) => *value,
            Predicate::Bool { handle, expected } => handle.get_bool(flags, direction) == *expected,
            Predicate::Number { handle, op, value } => op.apply(handle.get_f64(flags, direction), *value),
            Predicate::NumberIn { handle, values } => {
                let actual = handle.get_f64(flags, direction);
                values.iter().any(|v| *v == actual)
            }
            Predicate::EnumIn { handle, table } => table
                .get(handle.get_enum(flags, direction) as usize)
                .copied()
                .unwrap_or(false),
            Predicate::Not(inner) => !inner.matches(flags, direction),
            Predicate::And(terms) => terms.iter().all(|t| t.matches(flags, direction)),
            Predicate::Or(terms) => terms.iter().any(|t| t.matches(flags, direction)),
        }
    }
}

impl Effect {
    #[inline]
    fn apply(self, value: f64) -> f64 {
        match self {
            Effect::Multiply(factor) => value * factor,
            Effect::Limit(max) => value.min(max),
            Effect::AtLeast(min) => value.max(min),
            Effect::Set(v) => v,
            Effect::Add(v) => value + v,
        }
    }
}

impl Base {
    #[inline]
    fn value(&self, flags: &[u32], direction: Direction) -> f64 {
        match self {
            Base::Const(value) => *value,
            Base::Attribute(handle) => handle.get_f64(flags, direction),
        }
    }
}

/// Apply `rules` in order to `value`
///
/// An `if` opens a block; `else_if` and `else` only run while nothing in the block has
/// matched yet.
fn run(rules: &[Rule], mut value: f64, flags: &[u32], direction: Direction) -> f64 {
    let mut block_matched = false;
    for rule in rules {
        let applies = match rule.branch {
            Branch::If => {
                block_matched = rule.predicate.matches(flags, direction);
                block_matched
            }
            Branch::ElseIf if block_matched => false,
            Branch::ElseIf => {
                block_matched = rule.predicate.matches(flags, direction);
                block_matched
            }
            Branch::Else => !std::mem::replace(&mut block_matched, true),
        };
        if applies {
            value = rule.effect.apply(value);
        }
    }
    value
}

impl CompiledModel {
    /// Speed, priority and distance influence of one edge in `direction`
    ///
    /// # Panics
    ///
    /// If `flags` is shorter than [`CompiledModel::words_per_edge`].
    pub fn evaluate(&self, flags: &[u32], direction: Direction) -> EdgeValues {
        debug_assert!(flags.len() >= self.words_per_edge);

        let speed = run(&self.speed, self.base_speed.value(flags, direction), flags, direction);
        let priority = run(&self.priority, self.base_priority.value(flags, direction), flags, direction);
        let distance_influence = run(&self.distance, self.distance_base, flags, direction);

        EdgeValues {
            speed: speed.max(0.0),
            priority: priority.clamp(0.0, 1.0),
            distance_influence: distance_influence.max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::custom::{compile, BaseValue, CustomModel, DistanceInfluence, Statement};
    use crate::ev::{Direction, Registry, RoadAccess, RoadClass, StandardValues, Surface};
    use crate::mode::Mode;

    struct Fixture {
        registry: Registry,
        values: StandardValues,
        flags: Vec<u32>,
    }

    fn fixture() -> Fixture {
        let mut registry = Registry::new(4);
        let values = StandardValues::declare(&mut registry, Mode::all()).unwrap();
        registry.finalize();
        Fixture {
            registry,
            values,
            flags: vec![0; 4],
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn test_rules_apply_in_order() {
        let mut fx = fixture();
        fx.values
            .road_class
            .set_enum(&mut fx.flags, Direction::Forward, RoadClass::Track.index())
            .unwrap();

        let model = CustomModel::new()
            .with_base_speed(BaseValue::Number(20.0))
            .add_speed(Statement::if_("road_class == TRACK").multiply_by(0.5))
            .add_speed(Statement::if_("true").limit_to(8.0))
            .add_speed(Statement::if_("true").at_least(9.0));
        let compiled = compile(&model, &fx.registry).unwrap();
        assert_close(compiled.evaluate(&fx.flags, Direction::Forward).speed, 9.0);
    }

    #[test]
    fn test_else_chain_takes_first_match() {
        let mut fx = fixture();
        let model = CustomModel::new()
            .with_base_speed(BaseValue::Number(10.0))
            .add_priority(Statement::if_("surface == GRAVEL").multiply_by(0.5))
            .add_priority(Statement::else_if("surface in [GRAVEL, DIRT]").multiply_by(0.6))
            .add_priority(Statement::else_().multiply_by(0.9));
        let compiled = compile(&model, &fx.registry).unwrap();

        let priority = |fx: &Fixture| compiled.evaluate(&fx.flags, Direction::Forward).priority;
        assert_close(priority(&fx), 0.9);

        fx.values
            .surface
            .set_enum(&mut fx.flags, Direction::Forward, Surface::Gravel.index())
            .unwrap();
        assert_close(priority(&fx), 0.5);

        fx.values
            .surface
            .set_enum(&mut fx.flags, Direction::Forward, Surface::Dirt.index())
            .unwrap();
        assert_close(priority(&fx), 0.6);
    }

    #[test]
    fn test_attribute_bases_and_clamping() {
        let mut fx = fixture();
        let foot = fx.values.mode(Mode::Foot).unwrap();
        foot.average_speed.set_decimal(&mut fx.flags, Direction::Forward, 5.0).unwrap();
        foot.priority.set_decimal(&mut fx.flags, Direction::Forward, 1.2).unwrap();

        let model = CustomModel::new()
            .with_base_speed(BaseValue::Attribute("foot_average_speed".into()))
            .with_base_priority(BaseValue::Attribute("foot_priority".into()))
            .add_speed(Statement::if_("road_access == NO").set_to(0.0));
        let compiled = compile(&model, &fx.registry).unwrap();

        let values = compiled.evaluate(&fx.flags, Direction::Forward);
        assert_close(values.speed, 5.0);
        assert_close(values.priority, 1.0);
        assert_eq!(values.distance_influence, 0.0);
        assert!(values.is_traversable());

        fx.values
            .road_access
            .set_enum(&mut fx.flags, Direction::Forward, RoadAccess::No.index())
            .unwrap();
        assert!(!compiled.evaluate(&fx.flags, Direction::Forward).is_traversable());
    }

    #[test]
    fn test_distance_influence_rules() {
        let mut fx = fixture();
        fx.values
            .road_class
            .set_enum(&mut fx.flags, Direction::Forward, RoadClass::Motorway.index())
            .unwrap();
        let model = CustomModel::new()
            .with_base_speed(BaseValue::Number(100.0))
            .with_distance_influence(DistanceInfluence::Rules(vec![
                Statement::if_("true").set_to(70.0),
                Statement::if_("road_class == MOTORWAY").add(30.0),
                Statement::if_("road_class == TRACK").add(-200.0),
            ]));
        let compiled = compile(&model, &fx.registry).unwrap();
        assert_close(compiled.evaluate(&fx.flags, Direction::Forward).distance_influence, 100.0);

        fx.values
            .road_class
            .set_enum(&mut fx.flags, Direction::Forward, RoadClass::Track.index())
            .unwrap();
        assert_eq!(compiled.evaluate(&fx.flags, Direction::Forward).distance_influence, 0.0);
    }

    #[test]
    fn test_direction_selects_directional_ranges() {
        let mut fx = fixture();
        let car = fx.values.mode(Mode::Car).unwrap();
        car.access.set_bool(&mut fx.flags, Direction::Forward, true).unwrap();

        let model = CustomModel::new()
            .with_base_speed(BaseValue::Number(50.0))
            .add_priority(Statement::if_("!car_access").multiply_by(0.0));
        let compiled = compile(&model, &fx.registry).unwrap();
        assert_eq!(compiled.evaluate(&fx.flags, Direction::Forward).priority, 1.0);
        assert_eq!(compiled.evaluate(&fx.flags, Direction::Backward).priority, 0.0);
    }

    #[test]
    fn test_numeric_conditions() {
        let mut fx = fixture();
        fx.values.hike_rating.set_int(&mut fx.flags, Direction::Forward, 4).unwrap();
        fx.values
            .max_speed
            .set_decimal(&mut fx.flags, Direction::Forward, f64::INFINITY)
            .unwrap();
        let model = CustomModel::new()
            .with_base_speed(BaseValue::Number(6.0))
            .add_speed(Statement::if_("hike_rating in [4, 5]").multiply_by(0.5))
            .add_speed(Statement::if_("max_speed > 130").multiply_by(2.0));
        let compiled = compile(&model, &fx.registry).unwrap();
        assert_close(compiled.evaluate(&fx.flags, Direction::Forward).speed, 6.0);
    }
}
