//! Tag parser pipeline
//!
//! Turns the raw tags of one way into encoded edge values. Parsers run in pipeline
//! order for every edge; a parser may read values written by earlier parsers in the
//! same pass, never later ones. `Pipeline::push` enforces that ordering.
//!
//! Parsers never fail on input data. Unknown or malformed tags resolve to the value's
//! default and are reported to the diagnostics sink.

pub mod access;
pub mod construction;
pub mod priority;
pub mod road;
pub mod speed;

pub use access::VehicleAccessParser;
pub use construction::{ConstructionRestrictionParser, CONDITIONAL_KEYS};
pub use priority::PriorityParser;
pub use road::{
    FootNetworkParser, HikeRatingParser, MaxSpeedParser, RoadAccessParser, RoadClassLinkParser,
    RoadClassParser, SurfaceParser, TollParser,
};
pub use speed::AverageSpeedParser;

use crate::conditional::DateRangeEvaluator;
use crate::diagnostics::{Diagnostic, DiagnosticKind, SharedSink};
use crate::ev::{EdgeFlagsStore, EvError, EvHandle, Registry, RelationValues, StandardValues};
use crate::tags::WayTags;
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;

/// Per-edge inputs shared by every parser of one pass
pub struct ParseContext<'a> {
    pub edge_id: u32,
    pub way: &'a WayTags,
    /// Flags produced by the relation resolver; empty when the way is in no relation
    pub relation_flags: &'a [u32],
    pub sink: &'a SharedSink,
}

impl ParseContext<'_> {
    pub fn report(&self, kind: DiagnosticKind, message: impl Into<String>) {
        self.sink
            .report(Diagnostic::new(kind, message).for_edge(Some(self.edge_id)));
    }

    /// Turn a failed write into a diagnostic; the value keeps its previous bits
    pub fn check(&self, key: &str, result: Result<(), EvError>) {
        if let Err(err) = result {
            self.report(DiagnosticKind::MalformedTag, format!("{key}: {err}"));
        }
    }
}

/// The closed set of parsers
#[derive(Debug, Clone)]
pub enum TagParser {
    RoadClass(RoadClassParser),
    RoadClassLink(RoadClassLinkParser),
    RoadAccess(RoadAccessParser),
    Surface(SurfaceParser),
    MaxSpeed(MaxSpeedParser),
    HikeRating(HikeRatingParser),
    ConstructionRestriction(ConstructionRestrictionParser),
    Toll(TollParser),
    VehicleAccess(VehicleAccessParser),
    AverageSpeed(AverageSpeedParser),
    Priority(PriorityParser),
    FootNetwork(FootNetworkParser),
}

impl TagParser {
    pub fn name(&self) -> &'static str {
        match self {
            TagParser::RoadClass(_) => "road_class",
            TagParser::RoadClassLink(_) => "road_class_link",
            TagParser::RoadAccess(_) => "road_access",
            TagParser::Surface(_) => "surface",
            TagParser::MaxSpeed(_) => "max_speed",
            TagParser::HikeRating(_) => "hike_rating",
            TagParser::ConstructionRestriction(_) => "construction_restriction",
            TagParser::Toll(_) => "toll",
            TagParser::VehicleAccess(_) => "vehicle_access",
            TagParser::AverageSpeed(_) => "average_speed",
            TagParser::Priority(_) => "priority",
            TagParser::FootNetwork(_) => "foot_network",
        }
    }

    /// Edge values this parser writes
    pub fn writes(&self) -> Vec<EvHandle> {
        match self {
            TagParser::RoadClass(p) => vec![p.road_class],
            TagParser::RoadClassLink(p) => vec![p.road_class_link],
            TagParser::RoadAccess(p) => vec![p.road_access],
            TagParser::Surface(p) => vec![p.surface],
            TagParser::MaxSpeed(p) => vec![p.max_speed],
            TagParser::HikeRating(p) => vec![p.hike_rating],
            TagParser::ConstructionRestriction(p) => vec![p.restricted],
            TagParser::Toll(p) => vec![p.toll],
            TagParser::VehicleAccess(p) => vec![p.access],
            TagParser::AverageSpeed(p) => vec![p.average_speed],
            TagParser::Priority(p) => vec![p.priority],
            TagParser::FootNetwork(p) => vec![p.foot_network],
        }
    }

    /// Edge values this parser reads from the flags (relation flags excluded)
    pub fn reads(&self) -> Vec<EvHandle> {
        match self {
            TagParser::AverageSpeed(p) => p.reads(),
            TagParser::Priority(p) => p.reads(),
            _ => Vec::new(),
        }
    }

    pub fn handle_way_tags(&self, ctx: &ParseContext<'_>, flags: &mut [u32]) {
        match self {
            TagParser::RoadClass(p) => p.handle(ctx, flags),
            TagParser::RoadClassLink(p) => p.handle(ctx, flags),
            TagParser::RoadAccess(p) => p.handle(ctx, flags),
            TagParser::Surface(p) => p.handle(ctx, flags),
            TagParser::MaxSpeed(p) => p.handle(ctx, flags),
            TagParser::HikeRating(p) => p.handle(ctx, flags),
            TagParser::ConstructionRestriction(p) => p.handle(ctx, flags),
            TagParser::Toll(p) => p.handle(ctx, flags),
            TagParser::VehicleAccess(p) => p.handle(ctx, flags),
            TagParser::AverageSpeed(p) => p.handle(ctx, flags),
            TagParser::Priority(p) => p.handle(ctx, flags),
            TagParser::FootNetwork(p) => p.handle(ctx, flags),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("parser '{parser}' reads '{attribute}' which no earlier parser writes")]
    OrderViolation { parser: String, attribute: String },

    #[error("'{attribute}' is written by both '{first}' and '{second}'")]
    DuplicateWriter {
        attribute: String,
        first: String,
        second: String,
    },

    #[error("flags have {actual} words, the registry needs {expected}")]
    FlagsWidth { expected: usize, actual: usize },

    #[error("{ways} ways for {edges} edges")]
    EdgeCountMismatch { ways: usize, edges: usize },
}

/// Ordered parser table
#[derive(Clone)]
pub struct Pipeline {
    registry: Arc<Registry>,
    parsers: Vec<TagParser>,
    sink: SharedSink,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("parsers", &self.parsers.iter().map(|p| p.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(registry: Arc<Registry>, sink: SharedSink) -> Self {
        Self {
            registry,
            parsers: Vec::new(),
            sink,
        }
    }

    /// Built-in parsers in dependency order
    ///
    /// Without `relation_values` the foot network parser is left out.
    pub fn standard(
        registry: Arc<Registry>,
        values: &StandardValues,
        relation_values: Option<RelationValues>,
        evaluator: DateRangeEvaluator,
        sink: SharedSink,
    ) -> Result<Self, PipelineError> {
        let mut pipeline = Self::new(registry, sink);
        pipeline.push(TagParser::RoadClass(RoadClassParser::new(values.road_class)))?;
        pipeline.push(TagParser::RoadClassLink(RoadClassLinkParser::new(values.road_class_link)))?;
        pipeline.push(TagParser::RoadAccess(RoadAccessParser::new(values.road_access)))?;
        pipeline.push(TagParser::Surface(SurfaceParser::new(values.surface)))?;
        pipeline.push(TagParser::MaxSpeed(MaxSpeedParser::new(values.max_speed)))?;
        pipeline.push(TagParser::HikeRating(HikeRatingParser::new(values.hike_rating)))?;
        pipeline.push(TagParser::ConstructionRestriction(ConstructionRestrictionParser::new(
            values.construction_restriction,
            evaluator,
        )))?;
        pipeline.push(TagParser::Toll(TollParser::new(values.toll)))?;
        for mode_values in &values.modes {
            pipeline.push(TagParser::VehicleAccess(VehicleAccessParser::new(
                mode_values.mode,
                mode_values.access,
            )))?;
        }
        for mode_values in &values.modes {
            pipeline.push(TagParser::AverageSpeed(AverageSpeedParser::new(
                mode_values.mode,
                values,
                mode_values.average_speed,
            )))?;
        }
        for mode_values in &values.modes {
            pipeline.push(TagParser::Priority(PriorityParser::new(
                mode_values.mode,
                values,
                mode_values.priority,
            )))?;
        }
        if let Some(relation) = relation_values {
            pipeline.push(TagParser::FootNetwork(FootNetworkParser::new(
                relation.foot_network,
                values.foot_network,
            )))?;
        }
        Ok(pipeline)
    }

    /// Append a parser, checking that everything it reads is already written
    pub fn push(&mut self, parser: TagParser) -> Result<(), PipelineError> {
        for read in parser.reads() {
            if !self.parsers.iter().any(|p| p.writes().iter().any(|w| w.id() == read.id())) {
                return Err(PipelineError::OrderViolation {
                    parser: parser.name().to_string(),
                    attribute: self.registry.name_of(&read).to_string(),
                });
            }
        }
        for write in parser.writes() {
            if let Some(first) = self
                .parsers
                .iter()
                .find(|p| p.writes().iter().any(|w| w.id() == write.id()))
            {
                return Err(PipelineError::DuplicateWriter {
                    attribute: self.registry.name_of(&write).to_string(),
                    first: first.name().to_string(),
                    second: parser.name().to_string(),
                });
            }
        }
        tracing::debug!(parser = parser.name(), position = self.parsers.len(), "pipeline parser added");
        self.parsers.push(parser);
        Ok(())
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn parsers(&self) -> &[TagParser] {
        &self.parsers
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Run every parser, in order, for one edge
    pub fn handle_way_tags(
        &self,
        edge_id: u32,
        flags: &mut [u32],
        way: &WayTags,
        relation_flags: &[u32],
    ) -> Result<(), PipelineError> {
        let expected = self.registry.words_per_edge();
        if flags.len() < expected {
            return Err(PipelineError::FlagsWidth {
                expected,
                actual: flags.len(),
            });
        }
        let ctx = ParseContext {
            edge_id,
            way,
            relation_flags,
            sink: &self.sink,
        };
        for parser in &self.parsers {
            parser.handle_way_tags(&ctx, flags);
        }
        Ok(())
    }

    /// Run the pipeline over every edge of `store` in parallel
    ///
    /// `ways[i]` belongs to edge `i`; `relations`, if given, holds the relation flags
    /// of each edge.
    pub fn handle_edges_par(
        &self,
        store: &mut EdgeFlagsStore,
        ways: &[WayTags],
        relations: Option<&EdgeFlagsStore>,
    ) -> Result<(), PipelineError> {
        if ways.len() != store.len() {
            return Err(PipelineError::EdgeCountMismatch {
                ways: ways.len(),
                edges: store.len(),
            });
        }
        if let Some(relations) = relations {
            if relations.len() != store.len() {
                return Err(PipelineError::EdgeCountMismatch {
                    ways: ways.len(),
                    edges: relations.len(),
                });
            }
        }
        let expected = self.registry.words_per_edge();
        if store.words_per_edge() < expected {
            return Err(PipelineError::FlagsWidth {
                expected,
                actual: store.words_per_edge(),
            });
        }

        let words = store.words_per_edge();
        store
            .as_mut_slice()
            .par_chunks_mut(words)
            .zip(ways.par_iter())
            .enumerate()
            .try_for_each(|(edge, (flags, way))| {
                let relation_flags = relations.map(|r| r.edge(edge as u32)).unwrap_or(&[]);
                self.handle_way_tags(edge as u32, flags, way, relation_flags)
            })?;

        tracing::info!(edges = ways.len(), parsers = self.parsers.len(), "tag pipeline finished");
        Ok(())
    }
}

/// Values accepted as "yes" in boolean-ish OSM tags
pub(crate) fn is_yes(value: &str) -> bool {
    matches!(value, "yes" | "true" | "1")
}
