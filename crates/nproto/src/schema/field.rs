// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reflective field views and the lazily rebuilt field cache.

use crate::descriptor::{Accessor, FieldDescriptor, FieldRef, MessageDescriptor};
use crate::error::{Error, Result};
use crate::field_type::{FieldType, StorageKind};
use crate::message::ErasedMessage;
use arc_swap::ArcSwapOption;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Generate a checked getter for a `Copy` storage kind.
macro_rules! checked_getter {
    ($name:ident, $type:ty, $kind:ident) => {
        pub fn $name(&self, message: &T) -> Result<$type> {
            self.check(StorageKind::$kind)?;
            match self.accessor.get(message) {
                FieldRef::$kind(v) => Ok(*v),
                other => Err(self.mismatch(other)),
            }
        }
    };
}

/// Read-only view of one declared field.
pub struct Field<T> {
    number: u32,
    field_type: FieldType,
    name: &'static str,
    accessor: Accessor<T>,
}

impl<T> Field<T> {
    pub fn from_descriptor(descriptor: &FieldDescriptor<T>) -> Self {
        Self {
            number: descriptor.number(),
            field_type: descriptor.field_type(),
            name: descriptor.name(),
            accessor: descriptor.accessor(),
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

    /// Borrow the raw storage.
    pub fn value<'a>(&self, message: &'a T) -> FieldRef<'a> {
        self.accessor.get(message)
    }

    fn check(&self, expected: StorageKind) -> Result<()> {
        let actual = self.field_type.storage_kind();
        if actual != expected {
            return Err(Error::IncorrectType { expected, actual });
        }
        Ok(())
    }

    fn mismatch(&self, found: FieldRef<'_>) -> Error {
        Error::AccessorMismatch {
            field_type: self.field_type,
            found: found.kind_name(),
        }
    }

    checked_getter!(i32_value, i32, I32);
    checked_getter!(u32_value, u32, U32);
    checked_getter!(i64_value, i64, I64);
    checked_getter!(u64_value, u64, U64);
    checked_getter!(f32_value, f32, F32);
    checked_getter!(f64_value, f64, F64);
    checked_getter!(bool_value, bool, Bool);

    pub fn string_value<'a>(&self, message: &'a T) -> Result<&'a str> {
        self.check(StorageKind::String)?;
        match self.accessor.get(message) {
            FieldRef::String(v) => Ok(v),
            other => Err(self.mismatch(other)),
        }
    }

    pub fn bytes_value<'a>(&self, message: &'a T) -> Result<&'a [u8]> {
        self.check(StorageKind::Bytes)?;
        match self.accessor.get(message) {
            FieldRef::Bytes(v) => Ok(v),
            other => Err(self.mismatch(other)),
        }
    }

    pub fn enum_number(&self, message: &T) -> Result<i32> {
        self.check(StorageKind::Enum)?;
        match self.accessor.get(message) {
            FieldRef::Enum(v) => Ok(v.enum_number()),
            other => Err(self.mismatch(other)),
        }
    }

    /// `Ok(None)` when the embedded message is absent.
    pub fn message_value<'a>(&self, message: &'a T) -> Result<Option<&'a dyn ErasedMessage>> {
        self.check(StorageKind::Message)?;
        match self.accessor.get(message) {
            FieldRef::Message(v) => Ok(v.get()),
            FieldRef::BoxedMessage(v) => Ok(v.get()),
            other => Err(self.mismatch(other)),
        }
    }

    pub fn list_value<'a>(&self, message: &'a T) -> Result<FieldRef<'a>> {
        self.check(StorageKind::List)?;
        Ok(self.accessor.get(message))
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("number", &self.number)
            .field("field_type", &self.field_type)
            .field("name", &self.name)
            .finish()
    }
}

/// Shared, immutable list of field views in declaration order.
pub struct Fields<T>(Arc<Vec<Field<T>>>);

impl<T> Fields<T> {
    pub fn from_descriptor(descriptor: &MessageDescriptor<T>) -> Self {
        Self(Arc::new(
            descriptor.fields().iter().map(Field::from_descriptor).collect(),
        ))
    }

    pub fn by_number(&self, number: u32) -> Option<&Field<T>> {
        self.0.iter().find(|field| field.number == number)
    }

    pub fn by_name(&self, name: &str) -> Option<&Field<T>> {
        self.0.iter().find(|field| field.name == name)
    }

    /// Whether both handles share one allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Deref for Fields<T> {
    type Target = [Field<T>];

    fn deref(&self) -> &[Field<T>] {
        &self.0
    }
}

impl<'a, T> IntoIterator for &'a Fields<T> {
    type Item = &'a Field<T>;
    type IntoIter = std::slice::Iter<'a, Field<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T> Clone for Fields<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Fields<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// Lazily built [`Fields`], dropped by [`FieldCache::invalidate`] and
/// rebuilt on the next access.
///
/// Concurrent first accesses may each build; all results are equal.
pub struct FieldCache<T> {
    cached: ArcSwapOption<Vec<Field<T>>>,
}

impl<T> FieldCache<T> {
    pub fn new() -> Self {
        Self {
            cached: ArcSwapOption::empty(),
        }
    }

    pub fn get_or_build(&self, build: impl FnOnce() -> Fields<T>) -> Fields<T> {
        if let Some(cached) = self.cached.load_full() {
            return Fields(cached);
        }
        let fields = build();
        self.cached.store(Some(Arc::clone(&fields.0)));
        fields
    }

    pub fn invalidate(&self) {
        self.cached.store(None);
    }

    pub fn is_populated(&self) -> bool {
        self.cached.load().is_some()
    }
}

impl<T> Default for FieldCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldMut;

    #[derive(Default)]
    struct Reading {
        celsius: f64,
        station: String,
        samples: Vec<u32>,
    }

    fn descriptor() -> MessageDescriptor<Reading> {
        MessageDescriptor::new(
            "Reading",
            vec![
                FieldDescriptor::new(
                    1,
                    FieldType::Double,
                    "celsius",
                    Accessor::<Reading>::new(
                        |m| FieldRef::F64(&m.celsius),
                        |m| FieldMut::F64(&mut m.celsius),
                    ),
                ),
                FieldDescriptor::new(
                    2,
                    FieldType::String,
                    "station",
                    Accessor::<Reading>::new(
                        |m| FieldRef::String(&m.station),
                        |m| FieldMut::String(&mut m.station),
                    ),
                ),
                FieldDescriptor::new(
                    3,
                    FieldType::PackedFixed32List,
                    "samples",
                    Accessor::<Reading>::new(
                        |m| FieldRef::U32List(&m.samples),
                        |m| FieldMut::U32List(&mut m.samples),
                    ),
                ),
            ],
        )
    }

    #[test]
    fn test_checked_getters() {
        let fields = Fields::from_descriptor(&descriptor());
        let reading = Reading {
            celsius: 21.5,
            station: "north".into(),
            samples: vec![4, 5],
        };
        assert_eq!(fields[0].f64_value(&reading).expect("f64 getter"), 21.5);
        assert_eq!(
            fields
                .by_name("station")
                .expect("station field")
                .string_value(&reading)
                .expect("string getter"),
            "north"
        );
        match fields[2].list_value(&reading).expect("list getter") {
            FieldRef::U32List(samples) => assert_eq!(samples, &[4, 5]),
            other => panic!("unexpected storage {other:?}"),
        }
    }

    #[test]
    fn test_getter_rejects_wrong_kind() {
        let fields = Fields::from_descriptor(&descriptor());
        let reading = Reading::default();
        let err = fields[0].i32_value(&reading).unwrap_err();
        assert!(matches!(
            err,
            Error::IncorrectType {
                expected: StorageKind::I32,
                actual: StorageKind::F64
            }
        ));
        assert!(fields[2].bytes_value(&reading).is_err());
    }

    #[test]
    fn test_cache_rebuilds_after_invalidate() {
        let cache = FieldCache::new();
        assert!(!cache.is_populated());
        let first = cache.get_or_build(|| Fields::from_descriptor(&descriptor()));
        let second = cache.get_or_build(|| panic!("cache should be populated"));
        assert!(first.ptr_eq(&second));

        cache.invalidate();
        assert!(!cache.is_populated());
        let third = cache.get_or_build(|| Fields::from_descriptor(&descriptor()));
        assert!(!first.ptr_eq(&third));
        assert_eq!(third.len(), 3);
        assert_eq!(third.by_number(3).map(Field::field_type), Some(FieldType::PackedFixed32List));
    }
}
