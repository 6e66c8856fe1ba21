// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire capabilities and the reference protobuf codec.
//!
//! Schemas only see the [`Writer`] and [`Reader`] traits: one typed
//! method per field kind, list methods taking the packed flag. The
//! protobuf encoding itself lives in [`BufferWriter`] and [`SliceReader`].
//!
//! # Tag layout
//!
//! ```text
//! tag = (field_number << 3) | wire_type      (varint)
//! ```

mod reader;
mod writer;

pub use reader::SliceReader;
pub use writer::BufferWriter;

use crate::error::{Error, Result};
use crate::message::{ErasedMessage, RepeatedMessageField};

/// Returned by [`Reader::field_number`] once the input is exhausted.
pub const READ_DONE: u32 = u32::MAX;

/// Largest legal field number (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Default nesting limit for embedded messages.
pub const DEFAULT_RECURSION_LIMIT: u32 = 100;

/// Protobuf wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl WireType {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::LengthDelimited),
            3 => Ok(Self::StartGroup),
            4 => Ok(Self::EndGroup),
            5 => Ok(Self::Fixed32),
            other => Err(Error::UnsupportedWireType(other)),
        }
    }
}

#[inline]
pub const fn make_tag(field_number: u32, wire_type: WireType) -> u32 {
    (field_number << 3) | wire_type as u32
}

#[inline]
pub const fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

#[inline]
pub const fn zigzag_decode32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

#[inline]
pub const fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
pub const fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Typed field sink.
///
/// Whether default values are emitted is the writer's decision; schemas
/// hand over every field.
pub trait Writer {
    fn write_int32(&mut self, field_number: u32, value: i32) -> Result<()>;
    fn write_uint32(&mut self, field_number: u32, value: u32) -> Result<()>;
    fn write_sint32(&mut self, field_number: u32, value: i32) -> Result<()>;
    fn write_fixed32(&mut self, field_number: u32, value: u32) -> Result<()>;
    fn write_sfixed32(&mut self, field_number: u32, value: i32) -> Result<()>;
    fn write_int64(&mut self, field_number: u32, value: i64) -> Result<()>;
    fn write_uint64(&mut self, field_number: u32, value: u64) -> Result<()>;
    fn write_sint64(&mut self, field_number: u32, value: i64) -> Result<()>;
    fn write_fixed64(&mut self, field_number: u32, value: u64) -> Result<()>;
    fn write_sfixed64(&mut self, field_number: u32, value: i64) -> Result<()>;
    fn write_float(&mut self, field_number: u32, value: f32) -> Result<()>;
    fn write_double(&mut self, field_number: u32, value: f64) -> Result<()>;
    fn write_bool(&mut self, field_number: u32, value: bool) -> Result<()>;
    fn write_string(&mut self, field_number: u32, value: &str) -> Result<()>;
    fn write_bytes(&mut self, field_number: u32, value: &[u8]) -> Result<()>;
    fn write_enum(&mut self, field_number: u32, value: i32) -> Result<()>;
    fn write_message(&mut self, field_number: u32, value: &dyn ErasedMessage) -> Result<()>;

    fn write_int32_list(&mut self, field_number: u32, values: &[i32], packed: bool) -> Result<()>;
    fn write_uint32_list(&mut self, field_number: u32, values: &[u32], packed: bool) -> Result<()>;
    fn write_sint32_list(&mut self, field_number: u32, values: &[i32], packed: bool) -> Result<()>;
    fn write_fixed32_list(&mut self, field_number: u32, values: &[u32], packed: bool) -> Result<()>;
    fn write_sfixed32_list(&mut self, field_number: u32, values: &[i32], packed: bool)
        -> Result<()>;
    fn write_int64_list(&mut self, field_number: u32, values: &[i64], packed: bool) -> Result<()>;
    fn write_uint64_list(&mut self, field_number: u32, values: &[u64], packed: bool) -> Result<()>;
    fn write_sint64_list(&mut self, field_number: u32, values: &[i64], packed: bool) -> Result<()>;
    fn write_fixed64_list(&mut self, field_number: u32, values: &[u64], packed: bool) -> Result<()>;
    fn write_sfixed64_list(&mut self, field_number: u32, values: &[i64], packed: bool)
        -> Result<()>;
    fn write_float_list(&mut self, field_number: u32, values: &[f32], packed: bool) -> Result<()>;
    fn write_double_list(&mut self, field_number: u32, values: &[f64], packed: bool) -> Result<()>;
    fn write_bool_list(&mut self, field_number: u32, values: &[bool], packed: bool) -> Result<()>;
    fn write_string_list(&mut self, field_number: u32, values: &[String]) -> Result<()>;
    fn write_bytes_list(&mut self, field_number: u32, values: &[Vec<u8>]) -> Result<()>;
    /// Enum lists are always written unpacked.
    fn write_enum_list(&mut self, field_number: u32, values: &[i32]) -> Result<()>;
    fn write_message_list(
        &mut self,
        field_number: u32,
        values: &dyn RepeatedMessageField,
    ) -> Result<()>;
}

/// Typed field source.
///
/// Call [`Reader::field_number`] to position on the next field, then
/// exactly one typed read or [`Reader::skip_field`].
pub trait Reader {
    /// Number of the next field, or [`READ_DONE`] at end of input.
    fn field_number(&mut self) -> Result<u32>;

    /// Skip the current field. Returns `false` when nothing follows.
    fn skip_field(&mut self) -> Result<bool>;

    fn read_int32(&mut self) -> Result<i32>;
    fn read_uint32(&mut self) -> Result<u32>;
    fn read_sint32(&mut self) -> Result<i32>;
    fn read_fixed32(&mut self) -> Result<u32>;
    fn read_sfixed32(&mut self) -> Result<i32>;
    fn read_int64(&mut self) -> Result<i64>;
    fn read_uint64(&mut self) -> Result<u64>;
    fn read_sint64(&mut self) -> Result<i64>;
    fn read_fixed64(&mut self) -> Result<u64>;
    fn read_sfixed64(&mut self) -> Result<i64>;
    fn read_float(&mut self) -> Result<f32>;
    fn read_double(&mut self) -> Result<f64>;
    fn read_bool(&mut self) -> Result<bool>;
    fn read_string(&mut self) -> Result<String>;
    fn read_bytes(&mut self) -> Result<Vec<u8>>;
    fn read_enum(&mut self) -> Result<i32>;
    /// Merge the embedded message into `target`.
    fn read_message(&mut self, target: &mut dyn ErasedMessage) -> Result<()>;

    // List reads append; packed and unpacked framing are both accepted.
    fn read_int32_list(&mut self, target: &mut Vec<i32>) -> Result<()>;
    fn read_uint32_list(&mut self, target: &mut Vec<u32>) -> Result<()>;
    fn read_sint32_list(&mut self, target: &mut Vec<i32>) -> Result<()>;
    fn read_fixed32_list(&mut self, target: &mut Vec<u32>) -> Result<()>;
    fn read_sfixed32_list(&mut self, target: &mut Vec<i32>) -> Result<()>;
    fn read_int64_list(&mut self, target: &mut Vec<i64>) -> Result<()>;
    fn read_uint64_list(&mut self, target: &mut Vec<u64>) -> Result<()>;
    fn read_sint64_list(&mut self, target: &mut Vec<i64>) -> Result<()>;
    fn read_fixed64_list(&mut self, target: &mut Vec<u64>) -> Result<()>;
    fn read_sfixed64_list(&mut self, target: &mut Vec<i64>) -> Result<()>;
    fn read_float_list(&mut self, target: &mut Vec<f32>) -> Result<()>;
    fn read_double_list(&mut self, target: &mut Vec<f64>) -> Result<()>;
    fn read_bool_list(&mut self, target: &mut Vec<bool>) -> Result<()>;
    fn read_string_list(&mut self, target: &mut Vec<String>) -> Result<()>;
    fn read_bytes_list(&mut self, target: &mut Vec<Vec<u8>>) -> Result<()>;
    fn read_enum_list(&mut self, target: &mut Vec<i32>) -> Result<()>;
    fn read_message_list(&mut self, target: &mut dyn RepeatedMessageField) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zigzag() {
        assert_eq!(zigzag_encode32(0), 0);
        assert_eq!(zigzag_encode32(-1), 1);
        assert_eq!(zigzag_encode32(1), 2);
        assert_eq!(zigzag_encode32(i32::MIN), u32::MAX);
        assert_eq!(zigzag_encode64(-2), 3);
        for v in [0, 1, -1, 63, -64, i32::MAX, i32::MIN] {
            assert_eq!(zigzag_decode32(zigzag_encode32(v)), v);
        }
        for v in [0, -1, i64::MAX, i64::MIN] {
            assert_eq!(zigzag_decode64(zigzag_encode64(v)), v);
        }
    }

    #[test]
    fn test_make_tag() {
        assert_eq!(make_tag(1, WireType::Varint), 0x08);
        assert_eq!(make_tag(2, WireType::LengthDelimited), 0x12);
        assert_eq!(make_tag(3, WireType::Fixed32), 0x1D);
    }

    #[test]
    fn test_wire_type_from_u8() {
        assert_eq!(WireType::from_u8(5).ok(), Some(WireType::Fixed32));
        assert!(matches!(
            WireType::from_u8(6),
            Err(Error::UnsupportedWireType(6))
        ));
    }
}
