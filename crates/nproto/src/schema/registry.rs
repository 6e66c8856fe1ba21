// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide schema registry.
//!
//! Memoizes one schema per message type. Construction happens outside
//! the map lock, so two threads racing on the same type may both build;
//! the first insert wins and every caller gets that schema. Nested
//! message types resolve their own schemas through the same registry
//! while an outer one is being built, so no map guard is ever held
//! across a factory call.

use super::generated::GeneratedSchemaFactory;
use super::table::TableSchemaFactory;
use super::{Schema, SchemaFactory};
use crate::config::{SchemaConfig, Strategy};
use crate::error::Result;
use crate::message::Message;
use dashmap::DashMap;
use log::debug;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};

/// Registry hit/miss statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub hits: u64,
    pub misses: u64,
}

/// Memoizing schema cache keyed by message type.
pub struct SchemaRegistry {
    config: SchemaConfig,
    schemas: DashMap<TypeId, Box<dyn Any + Send + Sync>>,
    stats: RwLock<RegistryStats>,
}

static GLOBAL: OnceLock<SchemaRegistry> = OnceLock::new();

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::with_config(SchemaConfig::default())
    }

    /// A registry separate from the global one.
    ///
    /// Only top-level schemas come from here. Embedded messages are
    /// written and merged through [`schema_for`], so they always resolve
    /// against [`SchemaRegistry::global`] and its configuration.
    pub fn with_config(config: SchemaConfig) -> Self {
        Self {
            config,
            schemas: DashMap::new(),
            stats: RwLock::new(RegistryStats::default()),
        }
    }

    /// Lazily created registry used by [`schema_for`] and the
    /// [`Message`] convenience methods.
    pub fn global() -> &'static SchemaRegistry {
        GLOBAL.get_or_init(SchemaRegistry::new)
    }

    /// Install the global registry's configuration.
    ///
    /// Returns `false` if the global registry already exists.
    pub fn init_global(config: SchemaConfig) -> bool {
        GLOBAL.set(SchemaRegistry::with_config(config)).is_ok()
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    pub fn stats(&self) -> RegistryStats {
        *self.stats.read()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn contains<T: Message>(&self) -> bool {
        self.schemas.contains_key(&TypeId::of::<T>())
    }

    /// Cached schema for `T`, building it with the configured strategy on first use.
    pub fn get_or_create<T: Message>(&self) -> Result<Arc<dyn Schema<T>>> {
        let key = TypeId::of::<T>();
        if let Some(schema) = self.lookup::<T>(&key) {
            self.stats.write().hits += 1;
            return Ok(schema);
        }
        self.stats.write().misses += 1;

        let built = self.build::<T>()?;
        let entry = self
            .schemas
            .entry(key)
            .or_insert_with(|| Box::new(Arc::clone(&built)) as Box<dyn Any + Send + Sync>);
        let schema = entry
            .value()
            .downcast_ref::<Arc<dyn Schema<T>>>()
            .cloned()
            .unwrap_or(built);
        drop(entry);
        debug!(
            "[registry] cached schema for {} ({} types)",
            std::any::type_name::<T>(),
            self.schemas.len()
        );
        Ok(schema)
    }

    /// Drop the cached schema for `T`. Returns whether one was cached.
    pub fn evict<T: Message>(&self) -> bool {
        self.schemas.remove(&TypeId::of::<T>()).is_some()
    }

    pub fn clear(&self) {
        self.schemas.clear();
    }

    fn lookup<T: Message>(&self, key: &TypeId) -> Option<Arc<dyn Schema<T>>> {
        let entry = self.schemas.get(key)?;
        entry.value().downcast_ref::<Arc<dyn Schema<T>>>().cloned()
    }

    fn build<T: Message>(&self) -> Result<Arc<dyn Schema<T>>> {
        debug!(
            "[registry] building {:?} schema for {}",
            self.config.strategy,
            std::any::type_name::<T>()
        );
        match self.config.strategy {
            Strategy::Interpreted => TableSchemaFactory::new().create_schema::<T>(),
            Strategy::Generated => GeneratedSchemaFactory::new()
                .with_layout(self.config.layout)
                .create_schema::<T>(),
        }
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Schema for `T` from the global registry.
pub fn schema_for<T: Message>() -> Result<Arc<dyn Schema<T>>> {
    SchemaRegistry::global().get_or_create::<T>()
}
