// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Schema construction: descriptor validation, code loading checks,
// registry behavior and decode limits.

#![allow(clippy::missing_panics_doc)]

mod common;

use common::{chain, decode, encode, everything, Everything, Node, Point, Scenario};
use nproto::{
    Accessor, CompilingBackend, DescriptorProvider, Error, FieldDescriptor, FieldMut, FieldRef,
    FieldType, GeneratedSchemaFactory, LinkedBackend, LoadError, Message, MessageDescriptor,
    SchemaConfig, SchemaFactory, SchemaRegistry, SliceReader, Strategy, TableSchemaFactory,
};

#[derive(Debug, Default)]
struct Clash {
    flag: bool,
    name: String,
}

impl Message for Clash {
    fn descriptor() -> MessageDescriptor<Self> {
        MessageDescriptor::new(
            "Clash",
            vec![
                FieldDescriptor::new(
                    5,
                    FieldType::Bool,
                    "flag",
                    Accessor::<Self>::new(|m| FieldRef::Bool(&m.flag), |m| FieldMut::Bool(&mut m.flag)),
                ),
                FieldDescriptor::new(
                    5,
                    FieldType::String,
                    "name",
                    Accessor::<Self>::new(
                        |m| FieldRef::String(&m.name),
                        |m| FieldMut::String(&mut m.name),
                    ),
                ),
            ],
        )
    }
}

#[derive(Debug, Default)]
struct Mislabeled {
    count: u32,
}

impl Message for Mislabeled {
    fn descriptor() -> MessageDescriptor<Self> {
        // Declared as a string, stored as u32.
        MessageDescriptor::new(
            "Mislabeled",
            vec![FieldDescriptor::new(
                1,
                FieldType::String,
                "count",
                Accessor::<Self>::new(|m| FieldRef::U32(&m.count), |m| FieldMut::U32(&mut m.count)),
            )],
        )
    }
}

/// Renames every type, so linked class names no longer match.
struct Renaming;

impl DescriptorProvider for Renaming {
    fn descriptor_for<T: Message>(&self) -> nproto::Result<MessageDescriptor<T>> {
        let declared = T::descriptor();
        Ok(MessageDescriptor::new("Renamed", declared.fields().to_vec()))
    }
}

/// Keeps only the first declared field, so fingerprints no longer match.
struct FirstFieldOnly;

impl DescriptorProvider for FirstFieldOnly {
    fn descriptor_for<T: Message>(&self) -> nproto::Result<MessageDescriptor<T>> {
        let declared = T::descriptor();
        let fields = declared.fields().iter().take(1).copied().collect();
        Ok(MessageDescriptor::new(declared.type_name(), fields))
    }
}

#[test]
fn test_duplicate_numbers_rejected_by_every_strategy() {
    assert!(matches!(
        TableSchemaFactory::new().create_schema::<Clash>(),
        Err(Error::DuplicateFieldNumber(5))
    ));
    assert!(matches!(
        GeneratedSchemaFactory::new().create_schema::<Clash>(),
        Err(Error::DuplicateFieldNumber(5))
    ));
    assert!(matches!(
        Clash::default().encode_to_vec(),
        Err(Error::DuplicateFieldNumber(5))
    ));
}

#[test]
fn test_accessor_mismatch_reported_on_write() {
    let schema = TableSchemaFactory::new()
        .create_schema::<Mislabeled>()
        .expect("Schema should build");
    let mut writer = nproto::BufferWriter::new();
    assert!(matches!(
        schema.write_to(&Mislabeled { count: 3 }, &mut writer),
        Err(Error::AccessorMismatch {
            field_type: FieldType::String,
            ..
        })
    ));
}

#[test]
fn test_linked_backend_checks_class_name() {
    let factory = GeneratedSchemaFactory::new()
        .with_backend(LinkedBackend)
        .with_provider(Renaming);
    match factory.create_schema::<Scenario>() {
        Err(Error::CodeLoading(LoadError::NameMismatch { expected, found })) => {
            assert_eq!(expected, "RenamedSchema");
            assert_eq!(found, "ScenarioSchema");
        }
        Err(other) => panic!("unexpected error {other:?}"),
        Ok(_) => panic!("renamed descriptor must not load linked code"),
    }
}

#[test]
fn test_linked_backend_checks_fingerprint() {
    let factory = GeneratedSchemaFactory::new()
        .with_backend(LinkedBackend)
        .with_provider(FirstFieldOnly);
    match factory.create_schema::<Scenario>() {
        Err(Error::CodeLoading(LoadError::FingerprintMismatch {
            class_name,
            expected,
            found,
        })) => {
            assert_eq!(class_name, "ScenarioSchema");
            assert_ne!(expected, found);
        }
        Err(other) => panic!("unexpected error {other:?}"),
        Ok(_) => panic!("stale linked code must not load"),
    }
}

#[test]
fn test_compiling_backend_follows_provider() {
    let schema = GeneratedSchemaFactory::new()
        .with_backend(CompilingBackend)
        .with_provider(FirstFieldOnly)
        .create_schema::<Scenario>()
        .expect("Schema should build");
    let value = Scenario {
        a: 7,
        b: "dropped".into(),
        c: vec![1],
    };
    assert_eq!(encode(schema.as_ref(), &value), vec![0x08, 0x07]);
    assert_eq!(schema.fields().len(), 1);
}

#[test]
fn test_linked_fingerprint_matches_runtime() {
    let plan = GeneratedSchemaFactory::new()
        .plan::<Scenario>()
        .expect("Plan should build");
    let linked = Scenario::linked_schema().expect("Derived types carry linked code");
    assert_eq!(linked.fingerprint(), plan.fingerprint());
    assert_eq!(linked.class_name(), plan.class_name());
    assert_eq!(linked.layout(), plan.layout());
}

#[test]
fn test_recursion_limit() {
    let bytes = chain(5).encode_to_vec().expect("Encode should succeed");
    for strategy in [Strategy::Interpreted, Strategy::Generated] {
        let registry = SchemaRegistry::with_config(SchemaConfig::default().with_strategy(strategy));
        let schema = registry.get_or_create::<Node>().expect("Schema should build");

        let mut within = Node::default();
        schema
            .merge_from(&mut within, &mut SliceReader::new(&bytes).with_recursion_limit(5))
            .expect("Five levels fit a limit of five");
        assert_eq!(within, chain(5));

        let mut beyond = Node::default();
        assert!(matches!(
            schema.merge_from(&mut beyond, &mut SliceReader::new(&bytes).with_recursion_limit(4)),
            Err(Error::RecursionLimitExceeded { limit: 4 })
        ));
    }
}

#[test]
fn test_registry_strategies_agree() {
    let value = Scenario {
        a: 7,
        b: "hi".into(),
        c: vec![1, 2, 3],
    };
    let interpreted =
        SchemaRegistry::with_config(SchemaConfig::default().with_strategy(Strategy::Interpreted));
    let generated = SchemaRegistry::new();
    let a = interpreted
        .get_or_create::<Scenario>()
        .expect("Schema should build");
    let b = generated
        .get_or_create::<Scenario>()
        .expect("Schema should build");
    assert_eq!(encode(a.as_ref(), &value), encode(b.as_ref(), &value));
    assert_eq!(interpreted.len(), 1);
    assert_eq!(generated.stats().misses, 1);
}

#[test]
fn test_isolated_registry_holds_top_level_only() {
    let registry =
        SchemaRegistry::with_config(SchemaConfig::default().with_strategy(Strategy::Interpreted));
    let schema = registry
        .get_or_create::<Everything>()
        .expect("Schema should build");
    let value = everything();
    let bytes = encode(schema.as_ref(), &value);
    assert_eq!(decode(schema.as_ref(), &bytes).expect("Decode should succeed"), value);

    // Point is embedded in Everything and resolves through the global registry.
    assert_eq!(registry.len(), 1);
    assert!(registry.contains::<Everything>());
    assert!(!registry.contains::<Point>());
    assert!(SchemaRegistry::global().contains::<Point>());
}
