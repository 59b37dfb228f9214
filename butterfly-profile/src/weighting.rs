//! Edge weighting for the search layer
//!
//! Turns a compiled model's [`EdgeValues`] into a cost and a travel time:
//!
//! ```text
//! time_s = distance_m / (speed_kmh / 3.6)
//! weight = time_s / priority + distance_m * distance_influence / 1000
//! ```
//!
//! A blocked edge is not an error; it is reported as [`EdgeCost::BLOCKED`] with
//! infinite weight and time.

use crate::custom::{CompiledModel, EdgeValues};
use crate::ev::{Direction, EdgeFlagsStore, EvHandle};
use std::sync::Arc;

/// Cost of traversing one edge in one direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCost {
    pub weight: f64,
    pub time_s: f64,
}

impl EdgeCost {
    pub const BLOCKED: EdgeCost = EdgeCost {
        weight: f64::INFINITY,
        time_s: f64::INFINITY,
    };

    pub fn is_traversable(&self) -> bool {
        self.weight.is_finite()
    }
}

/// Weighting driven by a compiled custom model
#[derive(Debug, Clone)]
pub struct CustomWeighting {
    model: Arc<CompiledModel>,
    /// Directional access gate, checked before the model runs
    access: Option<EvHandle>,
}

impl CustomWeighting {
    pub fn new(model: Arc<CompiledModel>) -> Self {
        Self { model, access: None }
    }

    /// Block every direction whose `access` bit is unset
    pub fn with_access(mut self, access: EvHandle) -> Self {
        self.access = Some(access);
        self
    }

    pub fn model(&self) -> &CompiledModel {
        &self.model
    }

    pub fn edge_values(&self, flags: &[u32], direction: Direction) -> EdgeValues {
        self.model.evaluate(flags, direction)
    }

    /// Weight and time of an edge of `distance_m` meters
    #[inline]
    pub fn calc_edge(&self, flags: &[u32], distance_m: f64, direction: Direction) -> EdgeCost {
        if let Some(access) = self.access {
            if !access.get_bool(flags, direction) {
                return EdgeCost::BLOCKED;
            }
        }
        let values = self.model.evaluate(flags, direction);
        if !values.is_traversable() {
            return EdgeCost::BLOCKED;
        }

        let time_s = distance_m / (values.speed / 3.6);
        let weight = time_s / values.priority + distance_m * values.distance_influence / 1000.0;
        EdgeCost { weight, time_s }
    }
}

/// Cost lookup the path search depends on
pub trait EdgeWeighting: Send + Sync {
    fn cost(&self, edge_id: u32, direction: Direction) -> EdgeCost;
}

/// [`EdgeWeighting`] over an in-memory flags store and per-edge distances
pub struct StoreWeighting<'a> {
    weighting: CustomWeighting,
    store: &'a EdgeFlagsStore,
    distances_m: &'a [f64],
}

impl<'a> StoreWeighting<'a> {
    /// `distances_m` holds one length per edge of `store`
    pub fn new(weighting: CustomWeighting, store: &'a EdgeFlagsStore, distances_m: &'a [f64]) -> Self {
        debug_assert_eq!(store.len(), distances_m.len());
        Self {
            weighting,
            store,
            distances_m,
        }
    }
}

impl EdgeWeighting for StoreWeighting<'_> {
    fn cost(&self, edge_id: u32, direction: Direction) -> EdgeCost {
        match self.distances_m.get(edge_id as usize) {
            Some(&distance) if (edge_id as usize) < self.store.len() => {
                self.weighting.calc_edge(self.store.edge(edge_id), distance, direction)
            }
            _ => EdgeCost::BLOCKED,
        }
    }
}
