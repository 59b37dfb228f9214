//! Custom models
//!
//! A custom model is a JSON document of base values plus ordered `if`/`else_if`/`else`
//! statements that adjust speed, priority and distance influence per edge:
//!
//! ```json
//! {
//!   "base_speed": "foot_average_speed",
//!   "priority": [
//!     { "if": "road_class == TRACK", "multiply_by": 0.8 },
//!     { "if": "road_access == PRIVATE", "set_to": 0 }
//!   ],
//!   "distance_influence": 70
//! }
//! ```
//!
//! Documents are compiled once against a registry ([`CustomModelCompiler`]) into an
//! immutable [`CompiledModel`]; evaluation never looks up names.

pub mod compile;
pub mod eval;
pub mod expr;

pub use compile::{
    compile, CompiledModel, CustomModelCompiler, IssueKind, ModelIssue, ModelValidationError, Section,
};
pub use eval::EdgeValues;
pub use expr::{CmpOp, Expr, Literal, SyntaxError};

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Base speed or priority: a constant or the name of a numeric encoded value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BaseValue {
    Number(f64),
    Attribute(String),
}

/// Either a constant (per km) or rules over a base of zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DistanceInfluence {
    Constant(f64),
    Rules(Vec<Statement>),
}

/// Effect operand; numeric strings are accepted (`"0.8"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectValue {
    Number(f64),
    Text(String),
}

impl From<f64> for EffectValue {
    fn from(value: f64) -> Self {
        EffectValue::Number(value)
    }
}

/// `"else": null` and `"else": ""` both mark an else branch
fn present<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(Some(value.unwrap_or_default()))
}

/// One rule of a statement list
///
/// Exactly one of `if`/`else_if`/`else` and exactly one effect must be set; the
/// compiler reports every statement that breaks this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Statement {
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub if_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub else_if: Option<String>,
    #[serde(rename = "else", default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub else_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiply_by: Option<EffectValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_to: Option<EffectValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_least: Option<EffectValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_to: Option<EffectValue>,
    /// Only valid in `distance_influence`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add: Option<EffectValue>,
}

impl Statement {
    pub fn if_(condition: impl Into<String>) -> Self {
        Self {
            if_: Some(condition.into()),
            ..Self::default()
        }
    }

    pub fn else_if(condition: impl Into<String>) -> Self {
        Self {
            else_if: Some(condition.into()),
            ..Self::default()
        }
    }

    pub fn else_() -> Self {
        Self {
            else_: Some(String::new()),
            ..Self::default()
        }
    }

    pub fn multiply_by(mut self, value: impl Into<EffectValue>) -> Self {
        self.multiply_by = Some(value.into());
        self
    }

    pub fn limit_to(mut self, value: impl Into<EffectValue>) -> Self {
        self.limit_to = Some(value.into());
        self
    }

    pub fn at_least(mut self, value: impl Into<EffectValue>) -> Self {
        self.at_least = Some(value.into());
        self
    }

    pub fn set_to(mut self, value: impl Into<EffectValue>) -> Self {
        self.set_to = Some(value.into());
        self
    }

    pub fn add(mut self, value: impl Into<EffectValue>) -> Self {
        self.add = Some(value.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("cannot read custom model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed custom model: {0}")]
    Json(#[from] serde_json::Error),
}

/// A custom model document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_speed: Option<BaseValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_priority: Option<BaseValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub speed: Vec<Statement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priority: Vec<Statement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_influence: Option<DistanceInfluence>,
}

impl CustomModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, ModelLoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ModelLoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_base_speed(mut self, base: BaseValue) -> Self {
        self.base_speed = Some(base);
        self
    }

    pub fn with_base_priority(mut self, base: BaseValue) -> Self {
        self.base_priority = Some(base);
        self
    }

    pub fn with_distance_influence(mut self, influence: DistanceInfluence) -> Self {
        self.distance_influence = Some(influence);
        self
    }

    pub fn add_speed(mut self, statement: Statement) -> Self {
        self.speed.push(statement);
        self
    }

    pub fn add_priority(mut self, statement: Statement) -> Self {
        self.priority.push(statement);
        self
    }

    /// Overlay `other` on top of this model
    ///
    /// Statements of `other` run after this model's; base values and a constant
    /// distance influence set in `other` replace ours. Distance rules are appended to
    /// ours, turning a constant into the base of the combined rule list.
    pub fn merge(&mut self, other: &CustomModel) {
        if let Some(base) = &other.base_speed {
            self.base_speed = Some(base.clone());
        }
        if let Some(base) = &other.base_priority {
            self.base_priority = Some(base.clone());
        }
        self.speed.extend(other.speed.iter().cloned());
        self.priority.extend(other.priority.iter().cloned());

        self.distance_influence = match (self.distance_influence.take(), &other.distance_influence) {
            (current, None) => current,
            (_, Some(DistanceInfluence::Constant(value))) => Some(DistanceInfluence::Constant(*value)),
            (None, Some(DistanceInfluence::Rules(rules))) => Some(DistanceInfluence::Rules(rules.clone())),
            (Some(DistanceInfluence::Rules(mut ours)), Some(DistanceInfluence::Rules(rules))) => {
                ours.extend(rules.iter().cloned());
                Some(DistanceInfluence::Rules(ours))
            }
            (Some(DistanceInfluence::Constant(base)), Some(DistanceInfluence::Rules(rules))) => {
                let mut combined = vec![Statement::if_("true").set_to(base)];
                combined.extend(rules.iter().cloned());
                Some(DistanceInfluence::Rules(combined))
            }
        };
    }
}
