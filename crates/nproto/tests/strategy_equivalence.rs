// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Every schema flavor must be observably identical: same bytes out, same
// values in, same handling of unknown and reordered fields.

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::float_cmp)]

mod common;

use common::{
    all_schemas, decode, encode, everything, field_runs, hex, Compact, Everything, Priority,
    Scattered, Scenario,
};
use nproto::{BranchLayout, Message};

fn assert_equivalent<T: Message + PartialEq + std::fmt::Debug>(value: &T) {
    let schemas = all_schemas::<T>();
    let (_, reference) = &schemas[0];
    let expected = encode(reference.as_ref(), value);
    for (flavor, schema) in &schemas {
        let bytes = encode(schema.as_ref(), value);
        assert_eq!(hex(&bytes), hex(&expected), "{flavor}: encoding differs");
        let decoded = decode(schema.as_ref(), &expected).expect("Decode should succeed");
        assert_eq!(&decoded, value, "{flavor}: decoded value differs");
    }
}

#[test]
fn test_every_kind_roundtrips_identically() {
    assert_equivalent(&everything());
    assert_equivalent(&Everything::default());
}

#[test]
fn test_dense_and_sparse_types() {
    assert_equivalent(&Compact {
        a: 9,
        b: "compact".into(),
        c: true,
        d: vec![1, 1 << 40],
        e: -77,
    });
    assert_equivalent(&Scattered {
        low: 300,
        mid: true,
        high: vec!["x".into(), "yz".into()],
    });
}

#[test]
fn test_derive_picks_layout() {
    let compact = Compact::linked_schema().expect("Derived types carry linked code");
    assert_eq!(compact.layout(), BranchLayout::Dense { lo: 1, span: 5 });
    assert_eq!(compact.class_name(), "CompactSchema");

    let scattered = Scattered::linked_schema().expect("Derived types carry linked code");
    assert_eq!(scattered.layout(), BranchLayout::Sparse);
}

#[test]
fn test_field_order_does_not_matter() {
    let value = everything();
    let bytes = everything().encode_to_vec().expect("Encode should succeed");
    let runs = field_runs(&bytes);
    assert_eq!(runs.len(), 26);

    let mut rng = fastrand::Rng::with_seed(0x6e70_726f);
    for round in 0..16 {
        let mut shuffled = runs.clone();
        rng.shuffle(&mut shuffled);
        let permuted: Vec<u8> = shuffled.into_iter().flat_map(|(_, run)| run).collect();
        for (flavor, schema) in all_schemas::<Everything>() {
            let decoded = decode(schema.as_ref(), &permuted).expect("Decode should succeed");
            assert_eq!(decoded, value, "round {round}/{flavor}");
        }
    }
}

#[test]
fn test_unknown_fields_are_skipped() {
    #[rustfmt::skip]
    let bytes = [
        0x98, 0x06, 0x01,                                     // 99: varint
        0x91, 0x03, 1, 2, 3, 4, 5, 6, 7, 8,                   // 50: fixed64
        0x9A, 0x03, 0x02, 0xAA, 0xBB,                         // 51: length-delimited
        0xA5, 0x03, 1, 2, 3, 4,                               // 52: fixed32
        0xAB, 0x03, 0x08, 0x05, 0xAC, 0x03,                   // 53: group
        0x12, 0x02, 0x68, 0x69,                               // 2: "hi"
    ];
    for (flavor, schema) in all_schemas::<Scenario>() {
        let decoded = decode(schema.as_ref(), &bytes).expect("Decode should succeed");
        assert_eq!(decoded.a, 0, "{flavor}");
        assert_eq!(decoded.b, "hi", "{flavor}");
        assert!(decoded.c.is_empty(), "{flavor}");
    }
}

#[test]
fn test_trailing_unknown_field() {
    let bytes = [0x08, 0x07, 0x98, 0x06, 0x01];
    for (flavor, schema) in all_schemas::<Scenario>() {
        let decoded = decode(schema.as_ref(), &bytes).expect("Decode should succeed");
        assert_eq!(decoded.a, 7, "{flavor}");
    }
}

#[test]
fn test_merge_overwrites_scalars_and_appends_lists() {
    let first = Scenario {
        a: 1,
        b: "first".into(),
        c: vec![1],
    };
    let second = Scenario {
        a: 2,
        b: String::new(),
        c: vec![2, 3],
    };
    let mut bytes = first.encode_to_vec().expect("Encode should succeed");
    bytes.extend(second.encode_to_vec().expect("Encode should succeed"));

    for (flavor, schema) in all_schemas::<Scenario>() {
        let merged = decode(schema.as_ref(), &bytes).expect("Decode should succeed");
        // The empty string was never written, so the first value stays.
        assert_eq!(merged.a, 2, "{flavor}");
        assert_eq!(merged.b, "first", "{flavor}");
        assert_eq!(merged.c, vec![1, 2, 3], "{flavor}");
    }
}

#[test]
fn test_packed_and_unpacked_lists_both_accepted() {
    // Field 3 unpacked, then packed; values append in wire order.
    let bytes = [0x18, 0x05, 0x18, 0x06, 0x1A, 0x02, 0x07, 0x08];
    for (flavor, schema) in all_schemas::<Scenario>() {
        let decoded = decode(schema.as_ref(), &bytes).expect("Decode should succeed");
        assert_eq!(decoded.c, vec![5, 6, 7, 8], "{flavor}");
    }
}

#[test]
fn test_unknown_enum_numbers_are_dropped() {
    // 13: enum 7 (unknown), 22: enum list [1, 9 (unknown), 5]
    let bytes = [0x68, 0x07, 0xB0, 0x01, 0x01, 0xB0, 0x01, 0x09, 0xB0, 0x01, 0x05];
    for (flavor, schema) in all_schemas::<Everything>() {
        let decoded = decode(schema.as_ref(), &bytes).expect("Decode should succeed");
        assert_eq!(decoded.priority, Priority::Low, "{flavor}");
        assert_eq!(
            decoded.history,
            vec![Priority::High, Priority::Critical],
            "{flavor}"
        );
    }
}

#[test]
fn test_nested_messages_merge() {
    // Point { x: 1 } then Point { y: 2 } at field 10 merge into one.
    let bytes = [0x52, 0x02, 0x08, 0x02, 0x52, 0x02, 0x10, 0x04];
    for (flavor, schema) in all_schemas::<Everything>() {
        let decoded = decode(schema.as_ref(), &bytes).expect("Decode should succeed");
        assert_eq!(
            decoded.origin,
            Some(common::Point { x: 1, y: 2 }),
            "{flavor}"
        );
    }
}

#[test]
fn test_wire_type_mismatch_is_an_error() {
    // Field 2 (string) sent as varint.
    let bytes = [0x10, 0x01];
    for (flavor, schema) in all_schemas::<Scenario>() {
        assert!(
            matches!(
                decode(schema.as_ref(), &bytes),
                Err(nproto::Error::WireTypeMismatch { field_number: 2, .. })
            ),
            "{flavor}"
        );
    }
}

#[test]
fn test_truncated_input_is_an_error() {
    let bytes = [0x12, 0x05, 0x68, 0x69];
    for (flavor, schema) in all_schemas::<Scenario>() {
        assert!(decode(schema.as_ref(), &bytes).is_err(), "{flavor}");
    }
}

#[test]
fn test_reflection_matches_descriptors() {
    let value = everything();
    for (flavor, schema) in all_schemas::<Everything>() {
        let fields = schema.fields();
        assert_eq!(fields.len(), 26, "{flavor}");
        assert!(fields.by_name("scratch").is_none(), "{flavor}");

        let text = fields.by_name("text").expect("text is declared");
        assert_eq!(text.number(), 9);
        assert_eq!(text.string_value(&value).expect("text is a string"), "héllo");
        assert!(text.i32_value(&value).is_err(), "{flavor}");

        let priority = fields.by_number(13).expect("13 is declared");
        assert_eq!(priority.enum_number(&value).expect("13 is an enum"), 5);

        let origin = fields.by_number(10).expect("10 is declared");
        let nested = origin
            .message_value(&value)
            .expect("10 is a message")
            .expect("origin is set");
        assert_eq!(nested.type_name(), "Point");

        let boxed = fields.by_number(26).expect("26 is declared");
        let nested = boxed
            .message_value(&value)
            .expect("26 is a boxed message")
            .expect("boxed is set");
        assert_eq!(nested.type_name(), "Point", "{flavor}");
    }
}
