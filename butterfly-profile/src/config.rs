//! Profile configuration
//!
//! ```toml
//! reference_date = "2024-03-15"
//! conditional_policy = "fail_open"
//! flags_words = 4
//! modes = ["car", "bike", "foot"]
//! ```
//!
//! Every key is optional. Without `reference_date` conditional restrictions are
//! evaluated against today's local date.

use crate::conditional::ConditionalPolicy;
use crate::mode::Mode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Date format of `reference_date`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid reference_date '{0}', expected yyyy-MM-dd")]
    InvalidDate(String),

    #[error("flags_words must be between 1 and {max}, got {actual}")]
    FlagsWords { actual: usize, max: usize },

    #[error("modes must not be empty")]
    NoModes,

    #[error("mode '{0}' is listed twice")]
    DuplicateMode(&'static str),
}

fn default_flags_words() -> usize {
    4
}

fn default_modes() -> Vec<Mode> {
    Mode::all().to_vec()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    /// `yyyy-MM-dd`; today when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<String>,
    #[serde(default)]
    pub conditional_policy: ConditionalPolicy,
    /// 32-bit words of flags per edge
    #[serde(default = "default_flags_words")]
    pub flags_words: usize,
    #[serde(default = "default_modes")]
    pub modes: Vec<Mode>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            reference_date: None,
            conditional_policy: ConditionalPolicy::default(),
            flags_words: default_flags_words(),
            modes: default_modes(),
        }
    }
}

impl ProfileConfig {
    /// Upper bound on `flags_words`
    pub const MAX_FLAGS_WORDS: usize = 64;

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ProfileConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), modes = config.modes.len(), "profile config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flags_words == 0 || self.flags_words > Self::MAX_FLAGS_WORDS {
            return Err(ConfigError::FlagsWords {
                actual: self.flags_words,
                max: Self::MAX_FLAGS_WORDS,
            });
        }
        if self.modes.is_empty() {
            return Err(ConfigError::NoModes);
        }
        for (i, mode) in self.modes.iter().enumerate() {
            if self.modes[..i].contains(mode) {
                return Err(ConfigError::DuplicateMode(mode.name()));
            }
        }
        self.parsed_reference_date()?;
        Ok(())
    }

    fn parsed_reference_date(&self) -> Result<Option<NaiveDate>, ConfigError> {
        self.reference_date
            .as_deref()
            .map(|text| {
                NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
                    .map_err(|_| ConfigError::InvalidDate(text.to_string()))
            })
            .transpose()
    }

    /// Configured reference date, or today's local date
    pub fn reference_date(&self) -> Result<NaiveDate, ConfigError> {
        Ok(self
            .parsed_reference_date()?
            .unwrap_or_else(|| chrono::Local::now().date_naive()))
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date.format(DATE_FORMAT).to_string());
        self
    }

    pub fn with_policy(mut self, policy: ConditionalPolicy) -> Self {
        self.conditional_policy = policy;
        self
    }

    pub fn with_modes(mut self, modes: &[Mode]) -> Self {
        self.modes = modes.to_vec();
        self
    }
}
