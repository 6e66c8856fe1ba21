// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schemas: per-type write and merge logic over a [`Writer`] / [`Reader`].
//!
//! Two strategies produce a [`Schema`] from the same descriptors:
//!
//! - [`TableSchemaFactory`] interprets a packed key table on every call.
//! - [`GeneratedSchemaFactory`] specializes code per type, either linked
//!   in at compile time by `#[derive(Message)]` or compiled at runtime
//!   from a [`SchemaPlan`].
//!
//! Both are observably identical; only speed differs.

pub mod dispatch;
mod field;
mod generated;
mod layout;
mod registry;
mod table;

pub use dispatch::{field_processors, processor, FieldProcessor};
pub use field::{Field, FieldCache, Fields};
pub use generated::{
    schema_fingerprint, CodeLoadingBackend, CompiledSchema, CompilingBackend, ForwardingBackend,
    GeneratedSchemaFactory, LinkedBackend, LinkedSchema, SchemaPlan,
};
pub use layout::{BranchLayout, LayoutPolicy, MAX_DENSE_SLOTS};
pub use registry::{schema_for, SchemaRegistry};
pub use table::{TableSchema, TableSchemaFactory};

/// Typed ops shared by the dispatch table and derive-generated code.
pub use dispatch::ops;

use crate::descriptor::{FieldDescriptor, MessageDescriptor};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::wire::{Reader, Writer, MAX_FIELD_NUMBER};
use std::sync::Arc;

/// Serialization logic for one message type.
pub trait Schema<T>: Send + Sync {
    /// Write every declared field in declaration order.
    fn write_to(&self, message: &T, writer: &mut dyn Writer) -> Result<()>;

    /// Merge fields until the reader reports end of input.
    ///
    /// Unknown fields are skipped; scalars overwrite, lists append.
    fn merge_from(&self, message: &mut T, reader: &mut dyn Reader) -> Result<()>;

    /// Reflective view of the declared fields.
    fn fields(&self) -> Fields<T>;
}

/// Builds schemas for message types. Factories do not cache.
pub trait SchemaFactory: Send + Sync {
    fn create_schema<T: Message>(&self) -> Result<Arc<dyn Schema<T>>>;
}

/// Shared construction checks: concrete type, legal and unique field
/// numbers. Returns the field numbers sorted ascending.
pub(crate) fn validate_descriptor<T>(descriptor: &MessageDescriptor<T>) -> Result<Vec<u32>> {
    descriptor.ensure_concrete()?;
    validate_field_numbers(descriptor.fields())
}

pub(crate) fn validate_field_numbers<T>(fields: &[FieldDescriptor<T>]) -> Result<Vec<u32>> {
    let mut numbers = Vec::with_capacity(fields.len());
    for field in fields {
        let number = field.number();
        if number == 0 || number > MAX_FIELD_NUMBER {
            return Err(Error::InvalidFieldNumber(number));
        }
        numbers.push(number);
    }
    numbers.sort_unstable();
    if let Some(pair) = numbers.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(Error::DuplicateFieldNumber(pair[0]));
    }
    Ok(numbers)
}
