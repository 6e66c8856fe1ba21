// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field type taxonomy.
//!
//! Every protobuf field kind the engine supports, each with a stable
//! numeric id. Ids `1..=17` are singular kinds, `18..=34` unpacked lists
//! and `35..=48` packed lists. Id 44 is reserved: enum lists are never
//! packed, so the packed slot that would mirror `EnumList` does not exist.

use crate::wire::WireType;
use std::fmt;

/// Rust-level storage kind backing a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Bool,
    String,
    Bytes,
    Enum,
    Message,
    List,
}

/// Protobuf field kind with its stable id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum FieldType {
    Double = 1,
    Float = 2,
    Int64 = 3,
    UInt64 = 4,
    Int32 = 5,
    Fixed64 = 6,
    Fixed32 = 7,
    Bool = 8,
    String = 9,
    Message = 10,
    Bytes = 11,
    UInt32 = 12,
    Enum = 13,
    SFixed32 = 14,
    SFixed64 = 15,
    SInt32 = 16,
    SInt64 = 17,
    DoubleList = 18,
    FloatList = 19,
    Int64List = 20,
    UInt64List = 21,
    Int32List = 22,
    Fixed64List = 23,
    Fixed32List = 24,
    BoolList = 25,
    StringList = 26,
    MessageList = 27,
    BytesList = 28,
    UInt32List = 29,
    EnumList = 30,
    SFixed32List = 31,
    SFixed64List = 32,
    SInt32List = 33,
    SInt64List = 34,
    PackedDoubleList = 35,
    PackedFloatList = 36,
    PackedInt64List = 37,
    PackedUInt64List = 38,
    PackedInt32List = 39,
    PackedFixed64List = 40,
    PackedFixed32List = 41,
    PackedBoolList = 42,
    PackedUInt32List = 43,
    PackedSFixed32List = 45,
    PackedSFixed64List = 46,
    PackedSInt32List = 47,
    PackedSInt64List = 48,
}

/// Id reserved for the packed enum list kind, which does not exist.
pub const RESERVED_PACKED_ENUM_LIST_ID: u8 = 44;

impl FieldType {
    /// All kinds in ascending id order.
    pub const ALL: [FieldType; 47] = [
        Self::Double,
        Self::Float,
        Self::Int64,
        Self::UInt64,
        Self::Int32,
        Self::Fixed64,
        Self::Fixed32,
        Self::Bool,
        Self::String,
        Self::Message,
        Self::Bytes,
        Self::UInt32,
        Self::Enum,
        Self::SFixed32,
        Self::SFixed64,
        Self::SInt32,
        Self::SInt64,
        Self::DoubleList,
        Self::FloatList,
        Self::Int64List,
        Self::UInt64List,
        Self::Int32List,
        Self::Fixed64List,
        Self::Fixed32List,
        Self::BoolList,
        Self::StringList,
        Self::MessageList,
        Self::BytesList,
        Self::UInt32List,
        Self::EnumList,
        Self::SFixed32List,
        Self::SFixed64List,
        Self::SInt32List,
        Self::SInt64List,
        Self::PackedDoubleList,
        Self::PackedFloatList,
        Self::PackedInt64List,
        Self::PackedUInt64List,
        Self::PackedInt32List,
        Self::PackedFixed64List,
        Self::PackedFixed32List,
        Self::PackedBoolList,
        Self::PackedUInt32List,
        Self::PackedSFixed32List,
        Self::PackedSFixed64List,
        Self::PackedSInt32List,
        Self::PackedSInt64List,
    ];

    #[inline]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Position in [`FieldType::ALL`].
    #[inline]
    pub const fn ordinal(self) -> usize {
        let id = self as usize;
        if id > RESERVED_PACKED_ENUM_LIST_ID as usize {
            id - 2
        } else {
            id - 1
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        if id == 0 || id == RESERVED_PACKED_ENUM_LIST_ID {
            return None;
        }
        let ordinal = if id > RESERVED_PACKED_ENUM_LIST_ID {
            usize::from(id) - 2
        } else {
            usize::from(id) - 1
        };
        Self::ALL.get(ordinal).copied()
    }

    /// Look up a kind by its snake-case name (`"packed_sint32_list"`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|ft| ft.name() == name)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Float => "float",
            Self::Int64 => "int64",
            Self::UInt64 => "uint64",
            Self::Int32 => "int32",
            Self::Fixed64 => "fixed64",
            Self::Fixed32 => "fixed32",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Message => "message",
            Self::Bytes => "bytes",
            Self::UInt32 => "uint32",
            Self::Enum => "enum",
            Self::SFixed32 => "sfixed32",
            Self::SFixed64 => "sfixed64",
            Self::SInt32 => "sint32",
            Self::SInt64 => "sint64",
            Self::DoubleList => "double_list",
            Self::FloatList => "float_list",
            Self::Int64List => "int64_list",
            Self::UInt64List => "uint64_list",
            Self::Int32List => "int32_list",
            Self::Fixed64List => "fixed64_list",
            Self::Fixed32List => "fixed32_list",
            Self::BoolList => "bool_list",
            Self::StringList => "string_list",
            Self::MessageList => "message_list",
            Self::BytesList => "bytes_list",
            Self::UInt32List => "uint32_list",
            Self::EnumList => "enum_list",
            Self::SFixed32List => "sfixed32_list",
            Self::SFixed64List => "sfixed64_list",
            Self::SInt32List => "sint32_list",
            Self::SInt64List => "sint64_list",
            Self::PackedDoubleList => "packed_double_list",
            Self::PackedFloatList => "packed_float_list",
            Self::PackedInt64List => "packed_int64_list",
            Self::PackedUInt64List => "packed_uint64_list",
            Self::PackedInt32List => "packed_int32_list",
            Self::PackedFixed64List => "packed_fixed64_list",
            Self::PackedFixed32List => "packed_fixed32_list",
            Self::PackedBoolList => "packed_bool_list",
            Self::PackedUInt32List => "packed_uint32_list",
            Self::PackedSFixed32List => "packed_sfixed32_list",
            Self::PackedSFixed64List => "packed_sfixed64_list",
            Self::PackedSInt32List => "packed_sint32_list",
            Self::PackedSInt64List => "packed_sint64_list",
        }
    }

    /// Singular kind of each element; identity for singular kinds.
    pub const fn element_type(self) -> FieldType {
        match self {
            Self::DoubleList | Self::PackedDoubleList => Self::Double,
            Self::FloatList | Self::PackedFloatList => Self::Float,
            Self::Int64List | Self::PackedInt64List => Self::Int64,
            Self::UInt64List | Self::PackedUInt64List => Self::UInt64,
            Self::Int32List | Self::PackedInt32List => Self::Int32,
            Self::Fixed64List | Self::PackedFixed64List => Self::Fixed64,
            Self::Fixed32List | Self::PackedFixed32List => Self::Fixed32,
            Self::BoolList | Self::PackedBoolList => Self::Bool,
            Self::StringList => Self::String,
            Self::MessageList => Self::Message,
            Self::BytesList => Self::Bytes,
            Self::UInt32List | Self::PackedUInt32List => Self::UInt32,
            Self::EnumList => Self::Enum,
            Self::SFixed32List | Self::PackedSFixed32List => Self::SFixed32,
            Self::SFixed64List | Self::PackedSFixed64List => Self::SFixed64,
            Self::SInt32List | Self::PackedSInt32List => Self::SInt32,
            Self::SInt64List | Self::PackedSInt64List => Self::SInt64,
            singular => singular,
        }
    }

    #[inline]
    pub const fn is_list(self) -> bool {
        self.id() >= Self::DoubleList.id()
    }

    #[inline]
    pub const fn is_packed(self) -> bool {
        self.id() >= Self::PackedDoubleList.id()
    }

    /// Storage kind of the field itself (`List` for every list kind).
    pub const fn storage_kind(self) -> StorageKind {
        if self.is_list() {
            StorageKind::List
        } else {
            self.element_kind()
        }
    }

    /// Storage kind of a single value (the element for lists).
    pub const fn element_kind(self) -> StorageKind {
        match self.element_type() {
            Self::Int32 | Self::SInt32 | Self::SFixed32 => StorageKind::I32,
            Self::UInt32 | Self::Fixed32 => StorageKind::U32,
            Self::Int64 | Self::SInt64 | Self::SFixed64 => StorageKind::I64,
            Self::UInt64 | Self::Fixed64 => StorageKind::U64,
            Self::Float => StorageKind::F32,
            Self::Double => StorageKind::F64,
            Self::Bool => StorageKind::Bool,
            Self::String => StorageKind::String,
            Self::Bytes => StorageKind::Bytes,
            Self::Enum => StorageKind::Enum,
            _ => StorageKind::Message,
        }
    }

    /// Wire type used for each tagged value of this kind.
    pub const fn wire_type(self) -> WireType {
        if self.is_packed() {
            return WireType::LengthDelimited;
        }
        match self.element_type() {
            Self::Double | Self::Fixed64 | Self::SFixed64 => WireType::Fixed64,
            Self::Float | Self::Fixed32 | Self::SFixed32 => WireType::Fixed32,
            Self::String | Self::Bytes | Self::Message => WireType::LengthDelimited,
            _ => WireType::Varint,
        }
    }

    /// Whether a list of this element kind may use packed framing.
    #[inline]
    pub const fn is_packable(self) -> bool {
        !matches!(
            self.element_type(),
            Self::String | Self::Bytes | Self::Message | Self::Enum
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
