// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message and enum traits, plus the object-safe slot traits through
//! which schemas reach enum and embedded-message storage.

use crate::descriptor::MessageDescriptor;
use crate::error::Result;
use crate::schema::{schema_for, LinkedSchema, SchemaRegistry};
use crate::wire::{BufferWriter, Reader, SliceReader, Writer};

/// A protobuf message type.
///
/// Usually implemented with `#[derive(Message)]`; a manual impl only
/// needs [`Message::descriptor`].
pub trait Message: Default + Send + Sync + 'static {
    /// Ordered field declarations of this type.
    fn descriptor() -> MessageDescriptor<Self>;

    /// Declared message name, as carried by the descriptor.
    fn message_name() -> &'static str {
        Self::descriptor().type_name()
    }

    /// Schema compiled into the binary for this type, if any.
    fn linked_schema() -> Option<LinkedSchema<Self>> {
        None
    }

    /// Encode with the registry schema into a fresh buffer.
    fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let schema = schema_for::<Self>()?;
        let mut writer = BufferWriter::new();
        schema.write_to(self, &mut writer)?;
        Ok(writer.into_bytes())
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut message = Self::default();
        message.merge_from_slice(bytes)?;
        Ok(message)
    }

    /// Merge encoded fields into `self`; scalars overwrite, lists append.
    fn merge_from_slice(&mut self, bytes: &[u8]) -> Result<()> {
        let schema = schema_for::<Self>()?;
        let limit = SchemaRegistry::global().config().recursion_limit;
        let mut reader = SliceReader::new(bytes).with_recursion_limit(limit);
        schema.merge_from(self, &mut reader)
    }
}

/// A protobuf enum mapped onto a Rust enum.
pub trait ProtoEnum: Copy + Default + Send + Sync + 'static {
    fn number(self) -> i32;

    /// `None` for numbers with no matching variant.
    fn from_number(number: i32) -> Option<Self>;
}

/// Type-erased message body, used for embedded messages.
pub trait ErasedMessage {
    fn type_name(&self) -> &'static str;

    /// Write every field of this message (without tag or length prefix).
    fn write_body(&self, writer: &mut dyn Writer) -> Result<()>;

    /// Merge fields from `reader` until it reports end of input.
    fn merge_body(&mut self, reader: &mut dyn Reader) -> Result<()>;
}

impl<M: Message> ErasedMessage for M {
    fn type_name(&self) -> &'static str {
        M::message_name()
    }

    fn write_body(&self, writer: &mut dyn Writer) -> Result<()> {
        schema_for::<M>()?.write_to(self, writer)
    }

    fn merge_body(&mut self, reader: &mut dyn Reader) -> Result<()> {
        schema_for::<M>()?.merge_from(self, reader)
    }
}

/// Storage slot of a singular enum field.
pub trait EnumField {
    fn enum_number(&self) -> i32;

    /// Returns `false` (leaving the slot unchanged) for unknown numbers.
    fn set_enum_number(&mut self, number: i32) -> bool;
}

impl<E: ProtoEnum> EnumField for E {
    fn enum_number(&self) -> i32 {
        self.number()
    }

    fn set_enum_number(&mut self, number: i32) -> bool {
        match E::from_number(number) {
            Some(value) => {
                *self = value;
                true
            }
            None => false,
        }
    }
}

/// Storage slot of a repeated enum field.
pub trait RepeatedEnumField {
    fn enum_numbers(&self) -> Vec<i32>;

    /// Returns `false` (appending nothing) for unknown numbers.
    fn push_enum_number(&mut self, number: i32) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: ProtoEnum> RepeatedEnumField for Vec<E> {
    fn enum_numbers(&self) -> Vec<i32> {
        self.iter().map(|e| e.number()).collect()
    }

    fn push_enum_number(&mut self, number: i32) -> bool {
        match E::from_number(number) {
            Some(value) => {
                self.push(value);
                true
            }
            None => false,
        }
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

/// Storage slot of a singular embedded message (absent when `None`).
pub trait MessageField {
    fn get(&self) -> Option<&dyn ErasedMessage>;

    /// The present message, inserting a default one first if absent.
    fn get_or_insert_default(&mut self) -> &mut dyn ErasedMessage;
}

impl<M: Message> MessageField for Option<M> {
    fn get(&self) -> Option<&dyn ErasedMessage> {
        self.as_ref().map(|m| m as &dyn ErasedMessage)
    }

    fn get_or_insert_default(&mut self) -> &mut dyn ErasedMessage {
        self.get_or_insert_with(M::default)
    }
}

/// Storage slot of a singular embedded message kept behind a `Box`,
/// which recursive message types need.
pub trait BoxedMessageField {
    fn get(&self) -> Option<&dyn ErasedMessage>;

    /// The present message, boxing a default one first if absent.
    fn get_or_insert_default(&mut self) -> &mut dyn ErasedMessage;
}

impl<M: Message> BoxedMessageField for Option<Box<M>> {
    fn get(&self) -> Option<&dyn ErasedMessage> {
        self.as_deref().map(|m| m as &dyn ErasedMessage)
    }

    fn get_or_insert_default(&mut self) -> &mut dyn ErasedMessage {
        &mut **self.get_or_insert_with(Box::default)
    }
}

/// Storage slot of a repeated embedded message.
pub trait RepeatedMessageField {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Option<&dyn ErasedMessage>;

    /// Append a default message and return it for merging.
    fn push_default(&mut self) -> &mut dyn ErasedMessage;
}

impl<M: Message> RepeatedMessageField for Vec<M> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, index: usize) -> Option<&dyn ErasedMessage> {
        self.as_slice().get(index).map(|m| m as &dyn ErasedMessage)
    }

    fn push_default(&mut self) -> &mut dyn ErasedMessage {
        self.push(M::default());
        let last = Vec::len(self) - 1;
        &mut self[last]
    }
}
