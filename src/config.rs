//! Segment definitions loaded from TOML
//!
//! # Example TOML
//! ```toml
//! policy = "first"
//!
//! [[segment]]
//! name = "Phase"
//! start = '^BEGIN (\w+)'
//! finish = '^END (\w+)'
//! ```

use crate::definition::RegexDefinition;
use crate::segmenter::{MatchPolicy, Segmenter};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One regex segment type as written in a config file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionSpec {
    /// Segment type name
    pub name: String,
    /// Start pattern, one capture group for the tag
    pub start: String,
    /// Finish pattern, one capture group for the tag
    pub finish: String,
}

impl DefinitionSpec {
    pub fn new(
        name: impl Into<String>,
        start: impl Into<String>,
        finish: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            start: start.into(),
            finish: finish.into(),
        }
    }

    /// Compile into a [`RegexDefinition`]
    pub fn compile(&self) -> Result<RegexDefinition> {
        RegexDefinition::new(self.name.as_str(), &self.start, &self.finish)
            .with_context(|| format!("Invalid definition for segment type '{}'", self.name))
    }
}

/// Everything needed to build a [`Segmenter`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TimerConfig {
    #[serde(default)]
    pub policy: MatchPolicy,

    #[serde(default, rename = "segment")]
    pub segments: Vec<DefinitionSpec>,
}

impl TimerConfig {
    /// Load a config file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is not valid TOML, or
    /// contains a definition whose patterns do not compile.
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))
    }

    /// Parse config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TimerConfig =
            toml::from_str(content).context("Failed to parse TOML segment definitions")?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every definition compiles
    pub fn validate(&self) -> Result<()> {
        for spec in &self.segments {
            spec.compile()?;
        }
        Ok(())
    }

    /// Build a segmenter holding every definition, in file order
    pub fn build_segmenter(&self) -> Result<Segmenter> {
        let mut segmenter = Segmenter::with_policy(self.policy);
        for spec in &self.segments {
            segmenter.add_definition(spec.compile()?);
        }
        Ok(segmenter)
    }
}
