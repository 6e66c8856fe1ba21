// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # nproto - pluggable protobuf-style schema engine
//!
//! Encodes and decodes message types through a [`Schema`]: per-type logic
//! that writes every declared field to a [`Writer`] and merges fields
//! from a [`Reader`]. Two interchangeable strategies build schemas from
//! the same field descriptors.
//!
//! ## Quick Start
//!
//! ```rust
//! use nproto::{Enumeration, Message};
//!
//! #[derive(Debug, Clone, Copy, Default, PartialEq, Enumeration)]
//! enum Unit {
//!     #[default]
//!     Celsius = 0,
//!     Kelvin = 1,
//! }
//!
//! #[derive(Debug, Default, PartialEq, Message)]
//! struct Reading {
//!     #[proto(number = 1, kind = "sint32")]
//!     value: i32,
//!     #[proto(number = 2, kind = "enum")]
//!     unit: Unit,
//!     #[proto(number = 3, kind = "string")]
//!     station: String,
//! }
//!
//! fn main() -> nproto::Result<()> {
//!     let reading = Reading { value: -4, unit: Unit::Kelvin, station: "north".into() };
//!     let bytes = reading.encode_to_vec()?;
//!     assert_eq!(Reading::decode(&bytes)?, reading);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  Message / descriptors     #[derive(Message)], MessageDescriptor     |
//! +---------------------------------------------------------------------+
//! |  SchemaRegistry            one Arc<dyn Schema<T>> per type            |
//! +----------------------------------+----------------------------------+
//! |  TableSchemaFactory              |  GeneratedSchemaFactory          |
//! |  packed u64 key table,           |  SchemaPlan -> backend           |
//! |  interpreted per call            |  (linked | compiled)             |
//! +----------------------------------+----------------------------------+
//! |  Field dispatch table      one typed write/read per field kind       |
//! +---------------------------------------------------------------------+
//! |  Writer / Reader           BufferWriter, SliceReader (protobuf)      |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Features
//!
//! - `config-loaders`: load [`SchemaConfig`] from YAML.

extern crate self as nproto;

pub mod config;
pub mod descriptor;
pub mod error;
pub mod field_type;
pub mod message;
pub mod schema;
pub mod wire;

pub use config::{SchemaConfig, Strategy};
pub use descriptor::{
    Accessor, DeclaredDescriptors, DescriptorProvider, FieldDescriptor, FieldMut, FieldRef,
    MessageDescriptor,
};
pub use error::{Error, LoadError, Result};
pub use field_type::{FieldType, StorageKind};
pub use message::{
    BoxedMessageField, EnumField, ErasedMessage, Message, MessageField, ProtoEnum,
    RepeatedEnumField, RepeatedMessageField,
};
pub use schema::{
    schema_for, BranchLayout, CodeLoadingBackend, CompiledSchema, CompilingBackend, Field,
    Fields, ForwardingBackend, GeneratedSchemaFactory, LayoutPolicy, LinkedBackend, LinkedSchema,
    Schema, SchemaFactory, SchemaPlan, SchemaRegistry, TableSchema, TableSchemaFactory,
    MAX_DENSE_SLOTS,
};
pub use wire::{BufferWriter, Reader, SliceReader, WireType, Writer, READ_DONE};

/// Derive macros (`#[derive(Message)]`, `#[derive(Enumeration)]`).
pub use nproto_codegen::{Enumeration, Message};
