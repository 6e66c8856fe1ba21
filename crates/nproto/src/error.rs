// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for schema construction, field access and wire I/O.

use crate::field_type::{FieldType, StorageKind};
use crate::wire::{WireType, MAX_FIELD_NUMBER};
use thiserror::Error;

/// Errors raised by schema factories, field views and the wire codec.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Schema Construction Errors (fatal, surfaced by create_schema)
    // ========================================================================
    /// Two descriptors of one message type share a field number.
    #[error("duplicate field number: {0}")]
    DuplicateFieldNumber(u32),
    /// Field number outside `1..=MAX_FIELD_NUMBER`.
    #[error("invalid field number {0} (expected 1..={max})", max = MAX_FIELD_NUMBER)]
    InvalidFieldNumber(u32),
    /// The descriptor provider marked the type as abstract.
    #[error("the root type can be neither abstract nor uninstantiable: \"{0}\"")]
    AbstractMessageType(&'static str),
    /// The code loading backend could not materialize the generated schema.
    #[error("code loading failed: {0}")]
    CodeLoading(#[from] LoadError),
    /// Packed table entry carries a type id outside the taxonomy.
    #[error("unsupported field type id: {0}")]
    UnsupportedFieldType(u8),
    /// Configuration rejected while loading or validating.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Field Access Errors
    // ========================================================================
    /// A field view was read as a storage kind it does not hold.
    #[error("incorrect storage kind: requested {expected:?}, field holds {actual:?}")]
    IncorrectType {
        expected: StorageKind,
        actual: StorageKind,
    },
    /// An accessor produced storage inconsistent with its declared field type.
    #[error("accessor for {field_type} field produced {found} storage")]
    AccessorMismatch {
        field_type: FieldType,
        found: &'static str,
    },

    // ========================================================================
    // Wire Errors
    // ========================================================================
    /// Input ended in the middle of a value.
    #[error("unexpected end of input at offset {offset}")]
    Truncated { offset: usize },
    /// Varint longer than 10 bytes.
    #[error("malformed varint at offset {offset}")]
    MalformedVarint { offset: usize },
    /// Tag with field number 0, out of range, or a stray end-group.
    #[error("invalid tag {tag:#x} at offset {offset}")]
    InvalidTag { tag: u64, offset: usize },
    /// Wire type 6 or 7.
    #[error("unsupported wire type {0}")]
    UnsupportedWireType(u8),
    /// Field arrived with a wire type its declared kind cannot decode.
    #[error("field {field_number}: expected wire type {expected:?}, found {actual:?}")]
    WireTypeMismatch {
        field_number: u32,
        expected: WireType,
        actual: WireType,
    },
    /// String field payload is not UTF-8.
    #[error("invalid UTF-8 in string field {field_number}")]
    InvalidUtf8 { field_number: u32 },
    /// Length prefix runs past the end of the input.
    #[error("length {length} at offset {offset} exceeds remaining input")]
    LengthOverflow { length: u64, offset: usize },
    /// Embedded messages nested deeper than the configured limit.
    #[error("message nesting exceeds recursion limit of {limit}")]
    RecursionLimitExceeded { limit: u32 },
    /// A typed read was issued with no field positioned.
    #[error("no current field: field_number() must precede a read")]
    NoCurrentField,
}

/// Failure reported by a [`crate::schema::CodeLoadingBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// No generated code is linked into the binary for this type.
    #[error("no generated code is linked for {class_name}")]
    NotLinked { class_name: String },
    /// Linked code exists but under another name.
    #[error("linked code is named {found}, expected {expected}")]
    NameMismatch { expected: String, found: String },
    /// Linked code was generated from a different descriptor list.
    #[error(
        "linked code for {class_name} was generated from a different descriptor \
         (fingerprint {found:#010x}, expected {expected:#010x})"
    )]
    FingerprintMismatch {
        class_name: String,
        expected: u32,
        found: u32,
    },
}

pub type Result<T> = core::result::Result<T, Error>;
