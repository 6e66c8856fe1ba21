// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Growable protobuf encoder.

use super::{make_tag, zigzag_encode32, zigzag_encode64, WireType, Writer};
use crate::error::Result;
use crate::message::{ErasedMessage, RepeatedMessageField};

/// Generate a scalar write method (proto3 presence: default values are
/// skipped unless `emit_defaults` is set).
macro_rules! impl_write_scalar {
    ($name:ident, $type:ty, $wire:ident, $is_default:expr, $put:expr) => {
        fn $name(&mut self, field_number: u32, value: $type) -> Result<()> {
            let is_default: fn($type) -> bool = $is_default;
            if !self.emit_defaults && is_default(value) {
                return Ok(());
            }
            self.put_tag(field_number, WireType::$wire);
            $put(self, value);
            Ok(())
        }
    };
}

/// Generate a packable list write method.
macro_rules! impl_write_list {
    ($name:ident, $type:ty, $wire:ident, $put:expr) => {
        fn $name(&mut self, field_number: u32, values: &[$type], packed: bool) -> Result<()> {
            self.put_list(field_number, values, packed, WireType::$wire, $put);
            Ok(())
        }
    };
}

/// Protobuf encoder writing into an owned buffer.
#[derive(Debug, Default, Clone)]
pub struct BufferWriter {
    buffer: Vec<u8>,
    emit_defaults: bool,
}

impl BufferWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            emit_defaults: false,
        }
    }

    /// Also write zero scalars and empty strings/bytes.
    #[must_use]
    pub fn emit_defaults(mut self, emit: bool) -> Self {
        self.emit_defaults = emit;
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn nested(&self) -> Self {
        Self {
            buffer: Vec::new(),
            emit_defaults: self.emit_defaults,
        }
    }

    fn put_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buffer.push((value as u8) | 0x80);
            value >>= 7;
        }
        self.buffer.push(value as u8);
    }

    fn put_tag(&mut self, field_number: u32, wire_type: WireType) {
        self.put_varint(u64::from(make_tag(field_number, wire_type)));
    }

    fn put_fixed32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    fn put_fixed64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    fn put_length_delimited(&mut self, field_number: u32, payload: &[u8]) {
        self.put_tag(field_number, WireType::LengthDelimited);
        self.put_varint(payload.len() as u64);
        self.buffer.extend_from_slice(payload);
    }

    fn put_list<V: Copy>(
        &mut self,
        field_number: u32,
        values: &[V],
        packed: bool,
        wire_type: WireType,
        put: fn(&mut Self, V),
    ) {
        if values.is_empty() {
            return;
        }
        if packed {
            let mut run = self.nested();
            for &value in values {
                put(&mut run, value);
            }
            self.put_length_delimited(field_number, &run.buffer);
        } else {
            for &value in values {
                self.put_tag(field_number, wire_type);
                put(self, value);
            }
        }
    }

    fn put_message(&mut self, field_number: u32, message: &dyn ErasedMessage) -> Result<()> {
        let mut body = self.nested();
        message.write_body(&mut body)?;
        self.put_length_delimited(field_number, &body.buffer);
        Ok(())
    }
}

// Value encoders shared by scalar and list methods.
fn put_int32(w: &mut BufferWriter, v: i32) {
    // Negative values are sign-extended to 10 bytes.
    w.put_varint(i64::from(v) as u64);
}
fn put_uint32(w: &mut BufferWriter, v: u32) {
    w.put_varint(u64::from(v));
}
fn put_sint32(w: &mut BufferWriter, v: i32) {
    w.put_varint(u64::from(zigzag_encode32(v)));
}
fn put_fixed32(w: &mut BufferWriter, v: u32) {
    w.put_fixed32(v);
}
fn put_sfixed32(w: &mut BufferWriter, v: i32) {
    w.put_fixed32(v as u32);
}
fn put_int64(w: &mut BufferWriter, v: i64) {
    w.put_varint(v as u64);
}
fn put_uint64(w: &mut BufferWriter, v: u64) {
    w.put_varint(v);
}
fn put_sint64(w: &mut BufferWriter, v: i64) {
    w.put_varint(zigzag_encode64(v));
}
fn put_fixed64(w: &mut BufferWriter, v: u64) {
    w.put_fixed64(v);
}
fn put_sfixed64(w: &mut BufferWriter, v: i64) {
    w.put_fixed64(v as u64);
}
fn put_float(w: &mut BufferWriter, v: f32) {
    w.put_fixed32(v.to_bits());
}
fn put_double(w: &mut BufferWriter, v: f64) {
    w.put_fixed64(v.to_bits());
}
fn put_bool(w: &mut BufferWriter, v: bool) {
    w.put_varint(u64::from(v));
}

impl Writer for BufferWriter {
    impl_write_scalar!(write_int32, i32, Varint, |v| v == 0, put_int32);
    impl_write_scalar!(write_uint32, u32, Varint, |v| v == 0, put_uint32);
    impl_write_scalar!(write_sint32, i32, Varint, |v| v == 0, put_sint32);
    impl_write_scalar!(write_fixed32, u32, Fixed32, |v| v == 0, put_fixed32);
    impl_write_scalar!(write_sfixed32, i32, Fixed32, |v| v == 0, put_sfixed32);
    impl_write_scalar!(write_int64, i64, Varint, |v| v == 0, put_int64);
    impl_write_scalar!(write_uint64, u64, Varint, |v| v == 0, put_uint64);
    impl_write_scalar!(write_sint64, i64, Varint, |v| v == 0, put_sint64);
    impl_write_scalar!(write_fixed64, u64, Fixed64, |v| v == 0, put_fixed64);
    impl_write_scalar!(write_sfixed64, i64, Fixed64, |v| v == 0, put_sfixed64);
    // -0.0 has non-zero bits and is written.
    impl_write_scalar!(write_float, f32, Fixed32, |v: f32| v.to_bits() == 0, put_float);
    impl_write_scalar!(write_double, f64, Fixed64, |v: f64| v.to_bits() == 0, put_double);
    impl_write_scalar!(write_bool, bool, Varint, |v: bool| !v, put_bool);
    impl_write_scalar!(write_enum, i32, Varint, |v| v == 0, put_int32);

    fn write_string(&mut self, field_number: u32, value: &str) -> Result<()> {
        self.write_bytes(field_number, value.as_bytes())
    }

    fn write_bytes(&mut self, field_number: u32, value: &[u8]) -> Result<()> {
        if !self.emit_defaults && value.is_empty() {
            return Ok(());
        }
        self.put_length_delimited(field_number, value);
        Ok(())
    }

    fn write_message(&mut self, field_number: u32, value: &dyn ErasedMessage) -> Result<()> {
        self.put_message(field_number, value)
    }

    impl_write_list!(write_int32_list, i32, Varint, put_int32);
    impl_write_list!(write_uint32_list, u32, Varint, put_uint32);
    impl_write_list!(write_sint32_list, i32, Varint, put_sint32);
    impl_write_list!(write_fixed32_list, u32, Fixed32, put_fixed32);
    impl_write_list!(write_sfixed32_list, i32, Fixed32, put_sfixed32);
    impl_write_list!(write_int64_list, i64, Varint, put_int64);
    impl_write_list!(write_uint64_list, u64, Varint, put_uint64);
    impl_write_list!(write_sint64_list, i64, Varint, put_sint64);
    impl_write_list!(write_fixed64_list, u64, Fixed64, put_fixed64);
    impl_write_list!(write_sfixed64_list, i64, Fixed64, put_sfixed64);
    impl_write_list!(write_float_list, f32, Fixed32, put_float);
    impl_write_list!(write_double_list, f64, Fixed64, put_double);
    impl_write_list!(write_bool_list, bool, Varint, put_bool);

    fn write_string_list(&mut self, field_number: u32, values: &[String]) -> Result<()> {
        for value in values {
            self.put_length_delimited(field_number, value.as_bytes());
        }
        Ok(())
    }

    fn write_bytes_list(&mut self, field_number: u32, values: &[Vec<u8>]) -> Result<()> {
        for value in values {
            self.put_length_delimited(field_number, value);
        }
        Ok(())
    }

    fn write_enum_list(&mut self, field_number: u32, values: &[i32]) -> Result<()> {
        self.put_list(field_number, values, false, WireType::Varint, put_int32);
        Ok(())
    }

    fn write_message_list(
        &mut self,
        field_number: u32,
        values: &dyn RepeatedMessageField,
    ) -> Result<()> {
        for index in 0..values.len() {
            if let Some(message) = values.get(index) {
                self.put_message(field_number, message)?;
            }
        }
        Ok(())
    }
}
