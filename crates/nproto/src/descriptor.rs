// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field and message descriptors.
//!
//! A [`FieldDescriptor`] binds a field number and [`FieldType`] to an
//! [`Accessor`]: two plain function pointers that borrow the field's
//! storage out of a message value. Schemas never touch message memory
//! any other way.

use crate::error::{Error, Result};
use crate::field_type::{FieldType, StorageKind};
use crate::message::{
    BoxedMessageField, EnumField, Message, MessageField, RepeatedEnumField, RepeatedMessageField,
};
use std::fmt;

/// Shared borrow of one field's storage.
#[derive(Clone, Copy)]
pub enum FieldRef<'a> {
    I32(&'a i32),
    U32(&'a u32),
    I64(&'a i64),
    U64(&'a u64),
    F32(&'a f32),
    F64(&'a f64),
    Bool(&'a bool),
    String(&'a str),
    Bytes(&'a [u8]),
    Enum(&'a dyn EnumField),
    Message(&'a dyn MessageField),
    BoxedMessage(&'a dyn BoxedMessageField),
    I32List(&'a [i32]),
    U32List(&'a [u32]),
    I64List(&'a [i64]),
    U64List(&'a [u64]),
    F32List(&'a [f32]),
    F64List(&'a [f64]),
    BoolList(&'a [bool]),
    StringList(&'a [String]),
    BytesList(&'a [Vec<u8>]),
    EnumList(&'a dyn RepeatedEnumField),
    MessageList(&'a dyn RepeatedMessageField),
}

/// Exclusive borrow of one field's storage.
pub enum FieldMut<'a> {
    I32(&'a mut i32),
    U32(&'a mut u32),
    I64(&'a mut i64),
    U64(&'a mut u64),
    F32(&'a mut f32),
    F64(&'a mut f64),
    Bool(&'a mut bool),
    String(&'a mut String),
    Bytes(&'a mut Vec<u8>),
    Enum(&'a mut dyn EnumField),
    Message(&'a mut dyn MessageField),
    BoxedMessage(&'a mut dyn BoxedMessageField),
    I32List(&'a mut Vec<i32>),
    U32List(&'a mut Vec<u32>),
    I64List(&'a mut Vec<i64>),
    U64List(&'a mut Vec<u64>),
    F32List(&'a mut Vec<f32>),
    F64List(&'a mut Vec<f64>),
    BoolList(&'a mut Vec<bool>),
    StringList(&'a mut Vec<String>),
    BytesList(&'a mut Vec<Vec<u8>>),
    EnumList(&'a mut dyn RepeatedEnumField),
    MessageList(&'a mut dyn RepeatedMessageField),
}

macro_rules! storage_names {
    ($ty:ident) => {
        impl $ty<'_> {
            /// Storage kind of the borrowed field.
            pub fn storage_kind(&self) -> StorageKind {
                match self {
                    Self::I32(_) => StorageKind::I32,
                    Self::U32(_) => StorageKind::U32,
                    Self::I64(_) => StorageKind::I64,
                    Self::U64(_) => StorageKind::U64,
                    Self::F32(_) => StorageKind::F32,
                    Self::F64(_) => StorageKind::F64,
                    Self::Bool(_) => StorageKind::Bool,
                    Self::String(_) => StorageKind::String,
                    Self::Bytes(_) => StorageKind::Bytes,
                    Self::Enum(_) => StorageKind::Enum,
                    Self::Message(_) | Self::BoxedMessage(_) => StorageKind::Message,
                    _ => StorageKind::List,
                }
            }

            /// Variant name, used in accessor mismatch errors.
            pub fn kind_name(&self) -> &'static str {
                match self {
                    Self::I32(_) => "i32",
                    Self::U32(_) => "u32",
                    Self::I64(_) => "i64",
                    Self::U64(_) => "u64",
                    Self::F32(_) => "f32",
                    Self::F64(_) => "f64",
                    Self::Bool(_) => "bool",
                    Self::String(_) => "string",
                    Self::Bytes(_) => "bytes",
                    Self::Enum(_) => "enum",
                    Self::Message(_) => "message",
                    Self::BoxedMessage(_) => "boxed message",
                    Self::I32List(_) => "i32 list",
                    Self::U32List(_) => "u32 list",
                    Self::I64List(_) => "i64 list",
                    Self::U64List(_) => "u64 list",
                    Self::F32List(_) => "f32 list",
                    Self::F64List(_) => "f64 list",
                    Self::BoolList(_) => "bool list",
                    Self::StringList(_) => "string list",
                    Self::BytesList(_) => "bytes list",
                    Self::EnumList(_) => "enum list",
                    Self::MessageList(_) => "message list",
                }
            }
        }
    };
}

storage_names!(FieldRef);
storage_names!(FieldMut);

impl fmt::Debug for FieldRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I32(v) => write!(f, "I32({v})"),
            Self::U32(v) => write!(f, "U32({v})"),
            Self::I64(v) => write!(f, "I64({v})"),
            Self::U64(v) => write!(f, "U64({v})"),
            Self::F32(v) => write!(f, "F32({v})"),
            Self::F64(v) => write!(f, "F64({v})"),
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::String(v) => write!(f, "String({v:?})"),
            Self::Bytes(v) => write!(f, "Bytes({v:02x?})"),
            Self::Enum(v) => write!(f, "Enum({})", v.enum_number()),
            Self::Message(v) => match v.get() {
                Some(m) => write!(f, "Message({})", m.type_name()),
                None => f.write_str("Message(None)"),
            },
            Self::BoxedMessage(v) => match v.get() {
                Some(m) => write!(f, "BoxedMessage({})", m.type_name()),
                None => f.write_str("BoxedMessage(None)"),
            },
            Self::EnumList(v) => write!(f, "EnumList({:?})", v.enum_numbers()),
            Self::MessageList(v) => write!(f, "MessageList(len={})", v.len()),
            other => write!(f, "{}", other.kind_name()),
        }
    }
}

/// Borrows one field out of a message of type `T`.
pub struct Accessor<T> {
    get: for<'a> fn(&'a T) -> FieldRef<'a>,
    get_mut: for<'a> fn(&'a mut T) -> FieldMut<'a>,
}

impl<T> Accessor<T> {
    pub fn new(
        get: for<'a> fn(&'a T) -> FieldRef<'a>,
        get_mut: for<'a> fn(&'a mut T) -> FieldMut<'a>,
    ) -> Self {
        Self { get, get_mut }
    }

    #[inline]
    pub fn get<'a>(&self, message: &'a T) -> FieldRef<'a> {
        (self.get)(message)
    }

    #[inline]
    pub fn get_mut<'a>(&self, message: &'a mut T) -> FieldMut<'a> {
        (self.get_mut)(message)
    }
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Accessor<T> {}

impl<T> fmt::Debug for Accessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Accessor")
    }
}

/// Declaration of one field: number, kind, name and storage accessor.
pub struct FieldDescriptor<T> {
    number: u32,
    field_type: FieldType,
    name: &'static str,
    accessor: Accessor<T>,
}

impl<T> FieldDescriptor<T> {
    pub fn new(number: u32, field_type: FieldType, name: &'static str, accessor: Accessor<T>) -> Self {
        Self {
            number,
            field_type,
            name,
            accessor,
        }
    }

    #[inline]
    pub fn number(&self) -> u32 {
        self.number
    }

    #[inline]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn accessor(&self) -> Accessor<T> {
        self.accessor
    }
}

impl<T> Clone for FieldDescriptor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldDescriptor<T> {}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("number", &self.number)
            .field("field_type", &self.field_type)
            .field("name", &self.name)
            .finish()
    }
}

/// Ordered field declarations of a message type.
///
/// Order is significant: it is the order fields are written in.
pub struct MessageDescriptor<T> {
    type_name: &'static str,
    fields: Vec<FieldDescriptor<T>>,
    is_abstract: bool,
}

impl<T> MessageDescriptor<T> {
    pub fn new(type_name: &'static str, fields: Vec<FieldDescriptor<T>>) -> Self {
        Self {
            type_name,
            fields,
            is_abstract: false,
        }
    }

    /// Flag the type as abstract; every factory will refuse it.
    #[must_use]
    pub fn mark_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Fail with [`Error::AbstractMessageType`] if the type is abstract.
    pub fn ensure_concrete(&self) -> Result<()> {
        if self.is_abstract {
            return Err(Error::AbstractMessageType(self.type_name));
        }
        Ok(())
    }
}

impl<T> Clone for MessageDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            type_name: self.type_name,
            fields: self.fields.clone(),
            is_abstract: self.is_abstract,
        }
    }
}

impl<T> fmt::Debug for MessageDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDescriptor")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .field("is_abstract", &self.is_abstract)
            .finish()
    }
}

/// Supplies the ordered field descriptors of a message type.
pub trait DescriptorProvider: Send + Sync {
    fn descriptor_for<T: Message>(&self) -> Result<MessageDescriptor<T>>;
}

/// Provider returning the descriptors each type declares via [`Message::descriptor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredDescriptors;

impl DescriptorProvider for DeclaredDescriptors {
    fn descriptor_for<T: Message>(&self) -> Result<MessageDescriptor<T>> {
        Ok(T::descriptor())
    }
}
