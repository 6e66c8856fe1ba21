// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked protobuf decoder over a borrowed slice.

use super::{
    zigzag_decode32, zigzag_decode64, Reader, WireType, DEFAULT_RECURSION_LIMIT,
    MAX_FIELD_NUMBER, READ_DONE,
};
use crate::error::{Error, Result};
use crate::message::{ErasedMessage, RepeatedMessageField};

/// Generate a singular read method: check the wire type, decode one value.
macro_rules! impl_read_scalar {
    ($name:ident, $type:ty, $wire:ident, $decode:expr) => {
        fn $name(&mut self) -> Result<$type> {
            self.expect(WireType::$wire)?;
            let decode: fn(&mut Self) -> Result<$type> = $decode;
            decode(self)
        }
    };
}

/// Generate a list read method accepting packed and unpacked framing.
macro_rules! impl_read_list {
    ($name:ident, $type:ty, $wire:ident, $decode:expr) => {
        fn $name(&mut self, target: &mut Vec<$type>) -> Result<()> {
            self.read_packable(target, WireType::$wire, $decode)
        }
    };
}

/// Protobuf decoder over `&[u8]`.
#[derive(Debug, Clone)]
pub struct SliceReader<'a> {
    buffer: &'a [u8],
    offset: usize,
    current: Option<(u32, WireType)>,
    depth: u32,
    recursion_limit: u32,
}

impl<'a> SliceReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            offset: 0,
            current: None,
            depth: 0,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    #[must_use]
    pub fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    /// Reader over an embedded payload, one level deeper.
    fn sub_reader(&self, payload: &'a [u8]) -> Result<Self> {
        if self.depth >= self.recursion_limit {
            return Err(Error::RecursionLimitExceeded {
                limit: self.recursion_limit,
            });
        }
        Ok(Self {
            buffer: payload,
            offset: 0,
            current: None,
            depth: self.depth + 1,
            recursion_limit: self.recursion_limit,
        })
    }

    fn read_varint(&mut self) -> Result<u64> {
        let start = self.offset;
        let mut value = 0u64;
        for shift in (0..64).step_by(7) {
            let Some(&byte) = self.buffer.get(self.offset) else {
                return Err(Error::Truncated { offset: self.offset });
            };
            self.offset += 1;
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Error::MalformedVarint { offset: start })
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::Truncated { offset: self.offset });
        }
        let slice = &self.buffer[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn read_raw_fixed32(&mut self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_raw_fixed64(&mut self) -> Result<u64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(bytes))
    }

    fn read_length_delimited(&mut self) -> Result<&'a [u8]> {
        let start = self.offset;
        let length = self.read_varint()?;
        if length > self.remaining() as u64 {
            return Err(Error::LengthOverflow {
                length,
                offset: start,
            });
        }
        self.take(length as usize)
    }

    fn read_tag(&mut self) -> Result<(u32, WireType)> {
        let start = self.offset;
        let tag = self.read_varint()?;
        let wire_type = WireType::from_u8((tag & 0x7) as u8)?;
        let number = tag >> 3;
        if number == 0 || number > u64::from(MAX_FIELD_NUMBER) {
            return Err(Error::InvalidTag { tag, offset: start });
        }
        Ok((number as u32, wire_type))
    }

    /// Field number of the positioned field, checking its wire type.
    fn expect(&self, expected: WireType) -> Result<u32> {
        let (field_number, actual) = self.current.ok_or(Error::NoCurrentField)?;
        if actual != expected {
            return Err(Error::WireTypeMismatch {
                field_number,
                expected,
                actual,
            });
        }
        Ok(field_number)
    }

    fn skip_value(&mut self, field_number: u32, wire_type: WireType, depth: u32) -> Result<()> {
        match wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed64 => {
                self.take(8)?;
            }
            WireType::Fixed32 => {
                self.take(4)?;
            }
            WireType::LengthDelimited => {
                self.read_length_delimited()?;
            }
            WireType::StartGroup => self.skip_group(field_number, depth)?,
            WireType::EndGroup => {
                return Err(Error::InvalidTag {
                    tag: u64::from(super::make_tag(field_number, wire_type)),
                    offset: self.offset,
                })
            }
        }
        Ok(())
    }

    fn skip_group(&mut self, group_number: u32, depth: u32) -> Result<()> {
        if self.depth + depth >= self.recursion_limit {
            return Err(Error::RecursionLimitExceeded {
                limit: self.recursion_limit,
            });
        }
        loop {
            if self.is_eof() {
                return Err(Error::Truncated { offset: self.offset });
            }
            let (number, wire_type) = self.read_tag()?;
            if wire_type == WireType::EndGroup {
                if number == group_number {
                    return Ok(());
                }
                return Err(Error::InvalidTag {
                    tag: u64::from(super::make_tag(number, wire_type)),
                    offset: self.offset,
                });
            }
            self.skip_value(number, wire_type, depth + 1)?;
        }
    }

    fn read_packable<V>(
        &mut self,
        target: &mut Vec<V>,
        element: WireType,
        decode: fn(&mut Self) -> Result<V>,
    ) -> Result<()> {
        let (field_number, actual) = self.current.ok_or(Error::NoCurrentField)?;
        if actual == element {
            target.push(decode(self)?);
            return Ok(());
        }
        if actual != WireType::LengthDelimited {
            return Err(Error::WireTypeMismatch {
                field_number,
                expected: element,
                actual,
            });
        }
        let run = self.read_length_delimited()?;
        let mut packed = SliceReader {
            buffer: run,
            offset: 0,
            current: None,
            depth: self.depth,
            recursion_limit: self.recursion_limit,
        };
        while !packed.is_eof() {
            target.push(decode(&mut packed)?);
        }
        Ok(())
    }

    fn read_utf8(&mut self, field_number: u32) -> Result<String> {
        let bytes = self.read_length_delimited()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| Error::InvalidUtf8 { field_number })
    }
}

// Raw value decoders (wire type already checked).
fn varint_i32(r: &mut SliceReader<'_>) -> Result<i32> {
    Ok(r.read_varint()? as i32)
}
fn varint_u32(r: &mut SliceReader<'_>) -> Result<u32> {
    Ok(r.read_varint()? as u32)
}
fn varint_sint32(r: &mut SliceReader<'_>) -> Result<i32> {
    Ok(zigzag_decode32(r.read_varint()? as u32))
}
fn varint_i64(r: &mut SliceReader<'_>) -> Result<i64> {
    Ok(r.read_varint()? as i64)
}
fn varint_u64(r: &mut SliceReader<'_>) -> Result<u64> {
    r.read_varint()
}
fn varint_sint64(r: &mut SliceReader<'_>) -> Result<i64> {
    Ok(zigzag_decode64(r.read_varint()?))
}
fn varint_bool(r: &mut SliceReader<'_>) -> Result<bool> {
    Ok(r.read_varint()? != 0)
}
fn fixed_u32(r: &mut SliceReader<'_>) -> Result<u32> {
    r.read_raw_fixed32()
}
fn fixed_i32(r: &mut SliceReader<'_>) -> Result<i32> {
    Ok(r.read_raw_fixed32()? as i32)
}
fn fixed_f32(r: &mut SliceReader<'_>) -> Result<f32> {
    Ok(f32::from_bits(r.read_raw_fixed32()?))
}
fn fixed_u64(r: &mut SliceReader<'_>) -> Result<u64> {
    r.read_raw_fixed64()
}
fn fixed_i64(r: &mut SliceReader<'_>) -> Result<i64> {
    Ok(r.read_raw_fixed64()? as i64)
}
fn fixed_f64(r: &mut SliceReader<'_>) -> Result<f64> {
    Ok(f64::from_bits(r.read_raw_fixed64()?))
}

impl Reader for SliceReader<'_> {
    fn field_number(&mut self) -> Result<u32> {
        if self.is_eof() {
            self.current = None;
            return Ok(READ_DONE);
        }
        let (number, wire_type) = self.read_tag()?;
        if wire_type == WireType::EndGroup {
            return Err(Error::InvalidTag {
                tag: u64::from(super::make_tag(number, wire_type)),
                offset: self.offset,
            });
        }
        self.current = Some((number, wire_type));
        Ok(number)
    }

    fn skip_field(&mut self) -> Result<bool> {
        let (number, wire_type) = self.current.take().ok_or(Error::NoCurrentField)?;
        log::trace!("[wire] skipping field {} ({:?})", number, wire_type);
        self.skip_value(number, wire_type, 0)?;
        Ok(!self.is_eof())
    }

    impl_read_scalar!(read_int32, i32, Varint, varint_i32);
    impl_read_scalar!(read_uint32, u32, Varint, varint_u32);
    impl_read_scalar!(read_sint32, i32, Varint, varint_sint32);
    impl_read_scalar!(read_fixed32, u32, Fixed32, fixed_u32);
    impl_read_scalar!(read_sfixed32, i32, Fixed32, fixed_i32);
    impl_read_scalar!(read_int64, i64, Varint, varint_i64);
    impl_read_scalar!(read_uint64, u64, Varint, varint_u64);
    impl_read_scalar!(read_sint64, i64, Varint, varint_sint64);
    impl_read_scalar!(read_fixed64, u64, Fixed64, fixed_u64);
    impl_read_scalar!(read_sfixed64, i64, Fixed64, fixed_i64);
    impl_read_scalar!(read_float, f32, Fixed32, fixed_f32);
    impl_read_scalar!(read_double, f64, Fixed64, fixed_f64);
    impl_read_scalar!(read_bool, bool, Varint, varint_bool);
    impl_read_scalar!(read_enum, i32, Varint, varint_i32);

    fn read_string(&mut self) -> Result<String> {
        let field_number = self.expect(WireType::LengthDelimited)?;
        self.read_utf8(field_number)
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>> {
        self.expect(WireType::LengthDelimited)?;
        Ok(self.read_length_delimited()?.to_vec())
    }

    fn read_message(&mut self, target: &mut dyn ErasedMessage) -> Result<()> {
        self.expect(WireType::LengthDelimited)?;
        let payload = self.read_length_delimited()?;
        let mut sub = self.sub_reader(payload)?;
        target.merge_body(&mut sub)
    }

    impl_read_list!(read_int32_list, i32, Varint, varint_i32);
    impl_read_list!(read_uint32_list, u32, Varint, varint_u32);
    impl_read_list!(read_sint32_list, i32, Varint, varint_sint32);
    impl_read_list!(read_fixed32_list, u32, Fixed32, fixed_u32);
    impl_read_list!(read_sfixed32_list, i32, Fixed32, fixed_i32);
    impl_read_list!(read_int64_list, i64, Varint, varint_i64);
    impl_read_list!(read_uint64_list, u64, Varint, varint_u64);
    impl_read_list!(read_sint64_list, i64, Varint, varint_sint64);
    impl_read_list!(read_fixed64_list, u64, Fixed64, fixed_u64);
    impl_read_list!(read_sfixed64_list, i64, Fixed64, fixed_i64);
    impl_read_list!(read_float_list, f32, Fixed32, fixed_f32);
    impl_read_list!(read_double_list, f64, Fixed64, fixed_f64);
    impl_read_list!(read_bool_list, bool, Varint, varint_bool);
    impl_read_list!(read_enum_list, i32, Varint, varint_i32);

    fn read_string_list(&mut self, target: &mut Vec<String>) -> Result<()> {
        let field_number = self.expect(WireType::LengthDelimited)?;
        target.push(self.read_utf8(field_number)?);
        Ok(())
    }

    fn read_bytes_list(&mut self, target: &mut Vec<Vec<u8>>) -> Result<()> {
        self.expect(WireType::LengthDelimited)?;
        target.push(self.read_length_delimited()?.to_vec());
        Ok(())
    }

    fn read_message_list(&mut self, target: &mut dyn RepeatedMessageField) -> Result<()> {
        self.expect(WireType::LengthDelimited)?;
        let payload = self.read_length_delimited()?;
        let mut sub = self.sub_reader(payload)?;
        target.push_default().merge_body(&mut sub)
    }
}
