//! Edge attributes and custom model weighting for butterfly-osm
//!
//! Import side: a [`Pipeline`] of tag parsers writes bit-packed encoded values into
//! each edge's flags. Query side: a [`CustomModel`] is compiled against the same
//! [`Registry`] and evaluated per edge by [`CustomWeighting`].
//!
//! ```no_run
//! use butterfly_profile::{CustomModel, Direction, Profile, ProfileConfig, TracingSink, WayTags};
//! use std::sync::Arc;
//!
//! # fn main() -> butterfly_profile::Result<()> {
//! let profile = Profile::build(ProfileConfig::default(), Arc::new(TracingSink))?;
//!
//! let mut flags = vec![0u32; profile.registry().words_per_edge()];
//! let way = WayTags::new(1).with_tag("highway", "track");
//! profile.pipeline().handle_way_tags(0, &mut flags, &way, &[])?;
//!
//! let model = CustomModel::from_json(r#"{
//!     "base_speed": "foot_average_speed",
//!     "priority": [{ "if": "road_class == TRACK", "multiply_by": 0.8 }]
//! }"#)?;
//! let weighting = profile.weighting(profile.compile(&model)?, None)?;
//! let cost = weighting.calc_edge(&flags, 120.0, Direction::Forward);
//! # Ok(())
//! # }
//! ```

pub mod conditional;
pub mod config;
pub mod custom;
pub mod diagnostics;
pub mod error;
pub mod ev;
pub mod mode;
pub mod parsers;
pub mod profile;
pub mod tags;
pub mod weighting;

pub use conditional::{ConditionalPolicy, DateRangeEvaluator};
pub use config::{ConfigError, ProfileConfig};
pub use custom::{
    compile, CompiledModel, CustomModel, CustomModelCompiler, EdgeValues, ModelValidationError,
};
pub use diagnostics::{
    CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, NullSink, SharedSink, TracingSink,
};
pub use error::{Error, Result};
pub use ev::{Direction, EdgeFlagsStore, EvDescriptor, EvError, EvHandle, Registry};
pub use mode::Mode;
pub use parsers::{Pipeline, PipelineError, TagParser};
pub use profile::Profile;
pub use tags::{TagValue, WayTags};
pub use weighting::{CustomWeighting, EdgeCost, EdgeWeighting, StoreWeighting};
