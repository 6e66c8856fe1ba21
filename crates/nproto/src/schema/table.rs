// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Table-interpreted schema.
//!
//! Each field is packed into one `u64` key, `(type_id << 32) | number`,
//! kept next to its accessor in declaration order. Every write resolves
//! the processor from the key; every read scans the table for the
//! incoming number.

use super::dispatch::processor_by_id;
use super::field::{FieldCache, Fields};
use super::{validate_descriptor, Schema, SchemaFactory};
use crate::descriptor::{Accessor, DeclaredDescriptors, DescriptorProvider, MessageDescriptor};
use crate::error::Result;
use crate::field_type::FieldType;
use crate::message::Message;
use crate::wire::{Reader, Writer, READ_DONE};
use log::{debug, trace};
use std::sync::Arc;

#[inline]
const fn pack_key(field_type: FieldType, number: u32) -> u64 {
    ((field_type.id() as u64) << 32) | number as u64
}

#[inline]
const fn key_number(key: u64) -> u32 {
    key as u32
}

#[inline]
const fn key_type_id(key: u64) -> u8 {
    (key >> 32) as u8
}

struct TableEntry<T> {
    key: u64,
    accessor: Accessor<T>,
}

/// Schema interpreting a packed key table on every call.
pub struct TableSchema<T> {
    descriptor: MessageDescriptor<T>,
    entries: Box<[TableEntry<T>]>,
    fields: FieldCache<T>,
}

impl<T> TableSchema<T> {
    /// Validate the descriptors and pack them into the key table.
    pub fn new(descriptor: MessageDescriptor<T>) -> Result<Self> {
        validate_descriptor(&descriptor)?;
        let entries = descriptor
            .fields()
            .iter()
            .map(|field| TableEntry {
                key: pack_key(field.field_type(), field.number()),
                accessor: field.accessor(),
            })
            .collect();
        Ok(Self {
            descriptor,
            entries,
            fields: FieldCache::new(),
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.descriptor.type_name()
    }

    /// Packed keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(|entry| entry.key)
    }

    /// Drop the cached field views; the next [`Schema::fields`] rebuilds them.
    pub fn invalidate_fields(&self) {
        self.fields.invalidate();
    }
}

impl<T> Schema<T> for TableSchema<T> {
    fn write_to(&self, message: &T, writer: &mut dyn Writer) -> Result<()> {
        for entry in self.entries.iter() {
            let processor = processor_by_id(key_type_id(entry.key))?;
            processor.write(key_number(entry.key), entry.accessor.get(message), writer)?;
        }
        Ok(())
    }

    fn merge_from(&self, message: &mut T, reader: &mut dyn Reader) -> Result<()> {
        loop {
            let number = reader.field_number()?;
            if number == READ_DONE {
                return Ok(());
            }
            match self.entries.iter().find(|entry| key_number(entry.key) == number) {
                Some(entry) => {
                    let processor = processor_by_id(key_type_id(entry.key))?;
                    processor.read(entry.accessor.get_mut(message), reader)?;
                }
                None => {
                    trace!(
                        "[schema] {}: skipping unknown field {}",
                        self.descriptor.type_name(),
                        number
                    );
                    if !reader.skip_field()? {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn fields(&self) -> Fields<T> {
        self.fields
            .get_or_build(|| Fields::from_descriptor(&self.descriptor))
    }
}

/// Factory for [`TableSchema`].
#[derive(Debug, Clone, Default)]
pub struct TableSchemaFactory<P = DeclaredDescriptors> {
    provider: P,
}

impl TableSchemaFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: DescriptorProvider> TableSchemaFactory<P> {
    pub fn with_provider(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: DescriptorProvider> SchemaFactory for TableSchemaFactory<P> {
    fn create_schema<T: Message>(&self) -> Result<Arc<dyn Schema<T>>> {
        let descriptor = self.provider.descriptor_for::<T>()?;
        let schema = TableSchema::new(descriptor)?;
        debug!(
            "[schema] built table schema for {} ({} fields)",
            schema.type_name(),
            schema.entries.len()
        );
        Ok(Arc::new(schema))
    }
}
