// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field dispatch table.
//!
//! [`ops`] holds one typed write and one typed read per field kind.
//! [`FieldProcessor`] wraps them behind an erased shape so the table
//! strategy can pick one by type id; generated code calls [`ops`]
//! directly. Either way every kind has exactly one implementation.

use crate::descriptor::{FieldMut, FieldRef};
use crate::error::{Error, Result};
use crate::field_type::FieldType;
use crate::wire::{Reader, Writer};
use std::sync::OnceLock;

/// Typed per-kind operations.
pub mod ops {
    use crate::error::Result;
    use crate::message::{
        BoxedMessageField, EnumField, MessageField, RepeatedEnumField, RepeatedMessageField,
    };
    use crate::wire::{Reader, Writer};
    use log::debug;

    macro_rules! scalar_ops {
        ($($write:ident / $read:ident : $type:ty;)*) => {$(
            #[inline]
            pub fn $write(field_number: u32, value: &$type, writer: &mut dyn Writer) -> Result<()> {
                writer.$write(field_number, *value)
            }

            #[inline]
            pub fn $read(value: &mut $type, reader: &mut dyn Reader) -> Result<()> {
                *value = reader.$read()?;
                Ok(())
            }
        )*};
    }

    macro_rules! packable_list_ops {
        ($($write:ident / $read:ident : $type:ty;)*) => {$(
            #[inline]
            pub fn $write(
                field_number: u32,
                values: &[$type],
                packed: bool,
                writer: &mut dyn Writer,
            ) -> Result<()> {
                writer.$write(field_number, values, packed)
            }

            #[inline]
            pub fn $read(values: &mut Vec<$type>, reader: &mut dyn Reader) -> Result<()> {
                reader.$read(values)
            }
        )*};
    }

    scalar_ops! {
        write_int32 / read_int32: i32;
        write_uint32 / read_uint32: u32;
        write_sint32 / read_sint32: i32;
        write_fixed32 / read_fixed32: u32;
        write_sfixed32 / read_sfixed32: i32;
        write_int64 / read_int64: i64;
        write_uint64 / read_uint64: u64;
        write_sint64 / read_sint64: i64;
        write_fixed64 / read_fixed64: u64;
        write_sfixed64 / read_sfixed64: i64;
        write_float / read_float: f32;
        write_double / read_double: f64;
        write_bool / read_bool: bool;
    }

    packable_list_ops! {
        write_int32_list / read_int32_list: i32;
        write_uint32_list / read_uint32_list: u32;
        write_sint32_list / read_sint32_list: i32;
        write_fixed32_list / read_fixed32_list: u32;
        write_sfixed32_list / read_sfixed32_list: i32;
        write_int64_list / read_int64_list: i64;
        write_uint64_list / read_uint64_list: u64;
        write_sint64_list / read_sint64_list: i64;
        write_fixed64_list / read_fixed64_list: u64;
        write_sfixed64_list / read_sfixed64_list: i64;
        write_float_list / read_float_list: f32;
        write_double_list / read_double_list: f64;
        write_bool_list / read_bool_list: bool;
    }

    #[inline]
    pub fn write_string(field_number: u32, value: &str, writer: &mut dyn Writer) -> Result<()> {
        writer.write_string(field_number, value)
    }

    #[inline]
    pub fn read_string(value: &mut String, reader: &mut dyn Reader) -> Result<()> {
        *value = reader.read_string()?;
        Ok(())
    }

    #[inline]
    pub fn write_bytes(field_number: u32, value: &[u8], writer: &mut dyn Writer) -> Result<()> {
        writer.write_bytes(field_number, value)
    }

    #[inline]
    pub fn read_bytes(value: &mut Vec<u8>, reader: &mut dyn Reader) -> Result<()> {
        *value = reader.read_bytes()?;
        Ok(())
    }

    #[inline]
    pub fn write_enum(field_number: u32, value: &dyn EnumField, writer: &mut dyn Writer) -> Result<()> {
        writer.write_enum(field_number, value.enum_number())
    }

    /// Numbers with no matching variant are dropped.
    pub fn read_enum(value: &mut dyn EnumField, reader: &mut dyn Reader) -> Result<()> {
        let number = reader.read_enum()?;
        if !value.set_enum_number(number) {
            debug!("[schema] dropping unknown enum number {}", number);
        }
        Ok(())
    }

    /// Absent messages write nothing.
    #[inline]
    pub fn write_message(
        field_number: u32,
        value: &dyn MessageField,
        writer: &mut dyn Writer,
    ) -> Result<()> {
        match value.get() {
            Some(message) => writer.write_message(field_number, message),
            None => Ok(()),
        }
    }

    /// Merges into the present message, inserting a default one first.
    #[inline]
    pub fn read_message(value: &mut dyn MessageField, reader: &mut dyn Reader) -> Result<()> {
        reader.read_message(value.get_or_insert_default())
    }

    #[inline]
    pub fn write_boxed_message(
        field_number: u32,
        value: &dyn BoxedMessageField,
        writer: &mut dyn Writer,
    ) -> Result<()> {
        match value.get() {
            Some(message) => writer.write_message(field_number, message),
            None => Ok(()),
        }
    }

    #[inline]
    pub fn read_boxed_message(
        value: &mut dyn BoxedMessageField,
        reader: &mut dyn Reader,
    ) -> Result<()> {
        reader.read_message(value.get_or_insert_default())
    }

    #[inline]
    pub fn write_string_list(
        field_number: u32,
        values: &[String],
        writer: &mut dyn Writer,
    ) -> Result<()> {
        writer.write_string_list(field_number, values)
    }

    #[inline]
    pub fn read_string_list(values: &mut Vec<String>, reader: &mut dyn Reader) -> Result<()> {
        reader.read_string_list(values)
    }

    #[inline]
    pub fn write_bytes_list(
        field_number: u32,
        values: &[Vec<u8>],
        writer: &mut dyn Writer,
    ) -> Result<()> {
        writer.write_bytes_list(field_number, values)
    }

    #[inline]
    pub fn read_bytes_list(values: &mut Vec<Vec<u8>>, reader: &mut dyn Reader) -> Result<()> {
        reader.read_bytes_list(values)
    }

    pub fn write_enum_list(
        field_number: u32,
        values: &dyn RepeatedEnumField,
        writer: &mut dyn Writer,
    ) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        writer.write_enum_list(field_number, &values.enum_numbers())
    }

    pub fn read_enum_list(values: &mut dyn RepeatedEnumField, reader: &mut dyn Reader) -> Result<()> {
        let mut numbers = Vec::new();
        reader.read_enum_list(&mut numbers)?;
        for number in numbers {
            if !values.push_enum_number(number) {
                debug!("[schema] dropping unknown enum number {}", number);
            }
        }
        Ok(())
    }

    #[inline]
    pub fn write_message_list(
        field_number: u32,
        values: &dyn RepeatedMessageField,
        writer: &mut dyn Writer,
    ) -> Result<()> {
        writer.write_message_list(field_number, values)
    }

    #[inline]
    pub fn read_message_list(
        values: &mut dyn RepeatedMessageField,
        reader: &mut dyn Reader,
    ) -> Result<()> {
        reader.read_message_list(values)
    }
}

pub type WriteOp = for<'a> fn(u32, FieldRef<'a>, &mut dyn Writer) -> Result<()>;
pub type ReadOp = for<'a> fn(FieldMut<'a>, &mut dyn Reader) -> Result<()>;

/// Erased write/read pair for one field kind.
#[derive(Clone, Copy)]
pub struct FieldProcessor {
    field_type: FieldType,
    write: WriteOp,
    read: ReadOp,
}

impl std::fmt::Debug for FieldProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldProcessor")
            .field("field_type", &self.field_type)
            .finish_non_exhaustive()
    }
}

fn accessor_mismatch(field_type: FieldType, found: &'static str) -> Error {
    Error::AccessorMismatch { field_type, found }
}

/// Build a processor; `$write` / `$read` receive the unwrapped storage.
macro_rules! processor {
    ($ft:ident, $variant:ident, $write:expr, $read:expr) => {
        FieldProcessor {
            field_type: FieldType::$ft,
            write: |number, value, writer| match value {
                FieldRef::$variant(v) => $write(number, v, writer),
                other => Err(accessor_mismatch(FieldType::$ft, other.kind_name())),
            },
            read: |value, reader| match value {
                FieldMut::$variant(v) => $read(v, reader),
                other => Err(accessor_mismatch(FieldType::$ft, other.kind_name())),
            },
        }
    };
}

/// Unpacked and packed processors for a packable list kind.
macro_rules! list_processor {
    ($ft:ident, $variant:ident, $write:path, $read:path, $packed:literal) => {
        processor!(
            $ft,
            $variant,
            |n, v, w| $write(n, v, $packed, w),
            $read
        )
    };
}

impl FieldProcessor {
    #[inline]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    #[inline]
    pub fn write(&self, field_number: u32, value: FieldRef<'_>, writer: &mut dyn Writer) -> Result<()> {
        (self.write)(field_number, value, writer)
    }

    #[inline]
    pub fn read(&self, value: FieldMut<'_>, reader: &mut dyn Reader) -> Result<()> {
        (self.read)(value, reader)
    }

    /// Embedded messages accept plain and boxed storage.
    fn message() -> Self {
        FieldProcessor {
            field_type: FieldType::Message,
            write: |number, value, writer| match value {
                FieldRef::Message(v) => ops::write_message(number, v, writer),
                FieldRef::BoxedMessage(v) => ops::write_boxed_message(number, v, writer),
                other => Err(accessor_mismatch(FieldType::Message, other.kind_name())),
            },
            read: |value, reader| match value {
                FieldMut::Message(v) => ops::read_message(v, reader),
                FieldMut::BoxedMessage(v) => ops::read_boxed_message(v, reader),
                other => Err(accessor_mismatch(FieldType::Message, other.kind_name())),
            },
        }
    }

    fn for_type(field_type: FieldType) -> Self {
        use FieldType as T;
        match field_type {
            T::Double => processor!(Double, F64, ops::write_double, ops::read_double),
            T::Float => processor!(Float, F32, ops::write_float, ops::read_float),
            T::Int64 => processor!(Int64, I64, ops::write_int64, ops::read_int64),
            T::UInt64 => processor!(UInt64, U64, ops::write_uint64, ops::read_uint64),
            T::Int32 => processor!(Int32, I32, ops::write_int32, ops::read_int32),
            T::Fixed64 => processor!(Fixed64, U64, ops::write_fixed64, ops::read_fixed64),
            T::Fixed32 => processor!(Fixed32, U32, ops::write_fixed32, ops::read_fixed32),
            T::Bool => processor!(Bool, Bool, ops::write_bool, ops::read_bool),
            T::String => processor!(String, String, ops::write_string, ops::read_string),
            T::Message => Self::message(),
            T::Bytes => processor!(Bytes, Bytes, ops::write_bytes, ops::read_bytes),
            T::UInt32 => processor!(UInt32, U32, ops::write_uint32, ops::read_uint32),
            T::Enum => processor!(Enum, Enum, ops::write_enum, ops::read_enum),
            T::SFixed32 => processor!(SFixed32, I32, ops::write_sfixed32, ops::read_sfixed32),
            T::SFixed64 => processor!(SFixed64, I64, ops::write_sfixed64, ops::read_sfixed64),
            T::SInt32 => processor!(SInt32, I32, ops::write_sint32, ops::read_sint32),
            T::SInt64 => processor!(SInt64, I64, ops::write_sint64, ops::read_sint64),

            T::DoubleList => list_processor!(DoubleList, F64List, ops::write_double_list, ops::read_double_list, false),
            T::FloatList => list_processor!(FloatList, F32List, ops::write_float_list, ops::read_float_list, false),
            T::Int64List => list_processor!(Int64List, I64List, ops::write_int64_list, ops::read_int64_list, false),
            T::UInt64List => list_processor!(UInt64List, U64List, ops::write_uint64_list, ops::read_uint64_list, false),
            T::Int32List => list_processor!(Int32List, I32List, ops::write_int32_list, ops::read_int32_list, false),
            T::Fixed64List => list_processor!(Fixed64List, U64List, ops::write_fixed64_list, ops::read_fixed64_list, false),
            T::Fixed32List => list_processor!(Fixed32List, U32List, ops::write_fixed32_list, ops::read_fixed32_list, false),
            T::BoolList => list_processor!(BoolList, BoolList, ops::write_bool_list, ops::read_bool_list, false),
            T::StringList => processor!(StringList, StringList, ops::write_string_list, ops::read_string_list),
            T::MessageList => processor!(MessageList, MessageList, ops::write_message_list, ops::read_message_list),
            T::BytesList => processor!(BytesList, BytesList, ops::write_bytes_list, ops::read_bytes_list),
            T::UInt32List => list_processor!(UInt32List, U32List, ops::write_uint32_list, ops::read_uint32_list, false),
            T::EnumList => processor!(EnumList, EnumList, ops::write_enum_list, ops::read_enum_list),
            T::SFixed32List => list_processor!(SFixed32List, I32List, ops::write_sfixed32_list, ops::read_sfixed32_list, false),
            T::SFixed64List => list_processor!(SFixed64List, I64List, ops::write_sfixed64_list, ops::read_sfixed64_list, false),
            T::SInt32List => list_processor!(SInt32List, I32List, ops::write_sint32_list, ops::read_sint32_list, false),
            T::SInt64List => list_processor!(SInt64List, I64List, ops::write_sint64_list, ops::read_sint64_list, false),

            T::PackedDoubleList => list_processor!(PackedDoubleList, F64List, ops::write_double_list, ops::read_double_list, true),
            T::PackedFloatList => list_processor!(PackedFloatList, F32List, ops::write_float_list, ops::read_float_list, true),
            T::PackedInt64List => list_processor!(PackedInt64List, I64List, ops::write_int64_list, ops::read_int64_list, true),
            T::PackedUInt64List => list_processor!(PackedUInt64List, U64List, ops::write_uint64_list, ops::read_uint64_list, true),
            T::PackedInt32List => list_processor!(PackedInt32List, I32List, ops::write_int32_list, ops::read_int32_list, true),
            T::PackedFixed64List => list_processor!(PackedFixed64List, U64List, ops::write_fixed64_list, ops::read_fixed64_list, true),
            T::PackedFixed32List => list_processor!(PackedFixed32List, U32List, ops::write_fixed32_list, ops::read_fixed32_list, true),
            T::PackedBoolList => list_processor!(PackedBoolList, BoolList, ops::write_bool_list, ops::read_bool_list, true),
            T::PackedUInt32List => list_processor!(PackedUInt32List, U32List, ops::write_uint32_list, ops::read_uint32_list, true),
            T::PackedSFixed32List => list_processor!(PackedSFixed32List, I32List, ops::write_sfixed32_list, ops::read_sfixed32_list, true),
            T::PackedSFixed64List => list_processor!(PackedSFixed64List, I64List, ops::write_sfixed64_list, ops::read_sfixed64_list, true),
            T::PackedSInt32List => list_processor!(PackedSInt32List, I32List, ops::write_sint32_list, ops::read_sint32_list, true),
            T::PackedSInt64List => list_processor!(PackedSInt64List, I64List, ops::write_sint64_list, ops::read_sint64_list, true),
        }
    }
}

static FIELD_PROCESSORS: OnceLock<Vec<FieldProcessor>> = OnceLock::new();

/// Processors for every kind, indexed by [`FieldType::ordinal`].
pub fn field_processors() -> &'static [FieldProcessor] {
    FIELD_PROCESSORS.get_or_init(|| {
        FieldType::ALL
            .iter()
            .map(|&field_type| FieldProcessor::for_type(field_type))
            .collect()
    })
}

#[inline]
pub fn processor(field_type: FieldType) -> &'static FieldProcessor {
    &field_processors()[field_type.ordinal()]
}

/// Processor for a raw type id, as stored in packed table keys.
pub fn processor_by_id(id: u8) -> Result<&'static FieldProcessor> {
    FieldType::from_id(id)
        .map(processor)
        .ok_or(Error::UnsupportedFieldType(id))
}
