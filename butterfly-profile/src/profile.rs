//! Assembled routing profile
//!
//! Ties one configuration to its finalized registries, the standard parser pipeline and
//! the custom model compiler. Built once at import or server start and shared
//! read-only afterwards.

use crate::conditional::DateRangeEvaluator;
use crate::config::ProfileConfig;
use crate::custom::{CompiledModel, CustomModel, CustomModelCompiler};
use crate::diagnostics::SharedSink;
use crate::error::{Error, Result};
use crate::ev::{EdgeFlagsStore, Registry, RelationValues, StandardValues};
use crate::mode::Mode;
use crate::parsers::Pipeline;
use crate::weighting::CustomWeighting;
use std::path::Path;
use std::sync::Arc;

/// Words of relation flags per way
const RELATION_WORDS: usize = 1;

pub struct Profile {
    config: ProfileConfig,
    registry: Arc<Registry>,
    values: StandardValues,
    relation_registry: Arc<Registry>,
    relation_values: RelationValues,
    pipeline: Pipeline,
    sink: SharedSink,
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("config", &self.config)
            .field("encoded_values", &self.registry.len())
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl Profile {
    pub fn build(config: ProfileConfig, sink: SharedSink) -> Result<Self> {
        config.validate()?;
        let reference_date = config.reference_date()?;

        let mut registry = Registry::new(config.flags_words);
        let values = StandardValues::declare(&mut registry, &config.modes)?;
        registry.finalize();
        let registry = Arc::new(registry);

        let mut relation_registry = Registry::new(RELATION_WORDS);
        let relation_values = RelationValues::declare(&mut relation_registry)?;
        relation_registry.finalize();

        let evaluator = DateRangeEvaluator::new(reference_date, config.conditional_policy, sink.clone());
        let pipeline = Pipeline::standard(
            registry.clone(),
            &values,
            Some(relation_values),
            evaluator,
            sink.clone(),
        )?;

        tracing::info!(
            modes = config.modes.len(),
            encoded_values = registry.len(),
            used_bits = registry.used_bits(),
            parsers = pipeline.len(),
            %reference_date,
            "profile built"
        );

        Ok(Self {
            config,
            registry,
            values,
            relation_registry: Arc::new(relation_registry),
            relation_values,
            pipeline,
            sink,
        })
    }

    /// Build from a TOML config file
    pub fn load(path: impl AsRef<Path>, sink: SharedSink) -> Result<Self> {
        Self::build(ProfileConfig::load(path)?, sink)
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn values(&self) -> &StandardValues {
        &self.values
    }

    /// Layout of the relation flags blob handed to the pipeline
    pub fn relation_registry(&self) -> &Arc<Registry> {
        &self.relation_registry
    }

    pub fn relation_values(&self) -> &RelationValues {
        &self.relation_values
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Empty flags store sized for this profile
    pub fn new_store(&self, edges: usize) -> EdgeFlagsStore {
        EdgeFlagsStore::new(self.registry.words_per_edge(), edges)
    }

    pub fn new_relation_store(&self, ways: usize) -> EdgeFlagsStore {
        EdgeFlagsStore::new(self.relation_registry.words_per_edge(), ways)
    }

    pub fn compile(&self, model: &CustomModel) -> Result<Arc<CompiledModel>> {
        let compiled = CustomModelCompiler::new(&self.registry, self.sink.clone()).compile(model)?;
        tracing::info!(rules = compiled.rule_count(), "custom model ready");
        Ok(Arc::new(compiled))
    }

    /// Compile a JSON model file
    pub fn load_model(&self, path: impl AsRef<Path>) -> Result<Arc<CompiledModel>> {
        self.compile(&CustomModel::load(path)?)
    }

    /// Weighting for `model`, gated by `mode`'s access bits when a mode is given
    pub fn weighting(&self, model: Arc<CompiledModel>, mode: Option<Mode>) -> Result<CustomWeighting> {
        if !model.is_compatible(&self.registry) {
            return Err(Error::IncompatibleModel);
        }
        let weighting = CustomWeighting::new(model);
        Ok(match mode.and_then(|m| self.values.mode(m)) {
            Some(mode_values) => weighting.with_access(mode_values.access),
            None => weighting,
        })
    }
}
