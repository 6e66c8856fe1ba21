// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema engine configuration.
//!
//! Nothing is read implicitly: build a [`SchemaConfig`] in code, or load
//! one from YAML with the `config-loaders` feature, and hand it to
//! [`SchemaRegistry::with_config`](crate::SchemaRegistry::with_config)
//! or [`SchemaRegistry::init_global`](crate::SchemaRegistry::init_global).
//!
//! # Example YAML
//!
//! ```yaml
//! strategy: interpreted
//! recursion_limit: 64
//! layout:
//!   min_occupancy_percent: 50
//!   max_dense_span: 1024
//! ```

use crate::error::{Error, Result};
use crate::schema::{LayoutPolicy, MAX_DENSE_SLOTS};
use crate::wire::DEFAULT_RECURSION_LIMIT;

/// Which schema strategy a registry builds with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(rename_all = "snake_case"))]
pub enum Strategy {
    /// Packed key table interpreted on every call.
    Interpreted,
    /// Per-type specialized code (linked or compiled).
    #[default]
    Generated,
}

/// Registry-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(default, deny_unknown_fields))]
pub struct SchemaConfig {
    pub strategy: Strategy,
    pub layout: LayoutPolicy,
    /// Maximum embedded-message nesting when decoding.
    pub recursion_limit: u32,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            layout: LayoutPolicy::default(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

impl SchemaConfig {
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutPolicy) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.recursion_limit == 0 {
            return Err(Error::InvalidConfig(
                "recursion_limit must be at least 1".into(),
            ));
        }
        if self.layout.max_dense_span > MAX_DENSE_SLOTS {
            return Err(Error::InvalidConfig(format!(
                "layout.max_dense_span must be at most {MAX_DENSE_SLOTS}, got {}",
                self.layout.max_dense_span
            )));
        }
        Ok(())
    }

    /// Parse and validate a YAML document.
    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "config-loaders")]
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&yaml)
    }
}
