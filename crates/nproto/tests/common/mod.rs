// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message types and helpers shared by the integration tests.

#![allow(dead_code)]

use nproto::{
    CompilingBackend, Enumeration, GeneratedSchemaFactory, LayoutPolicy, LinkedBackend, Message,
    Reader, Schema, SchemaFactory, SliceReader, TableSchemaFactory, READ_DONE,
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Enumeration)]
pub enum Priority {
    #[default]
    Low = 0,
    High = 1,
    Critical = 5,
}

#[derive(Debug, Clone, Default, PartialEq, Message)]
pub struct Point {
    #[proto(number = 1, kind = "sint32")]
    pub x: i32,
    #[proto(number = 2, kind = "sint32")]
    pub y: i32,
}

/// `a = 7, b = "hi", c = [1, 2, 3]` encodes to `08 07 12 02 68 69 1A 03 01 02 03`.
#[derive(Debug, Clone, Default, PartialEq, Message)]
pub struct Scenario {
    #[proto(number = 1)]
    pub a: i32,
    #[proto(number = 2)]
    pub b: String,
    #[proto(number = 3)]
    pub c: Vec<i32>,
}

/// One field of every storage shape.
#[derive(Debug, Clone, Default, PartialEq, Message)]
pub struct Everything {
    #[proto(number = 1)]
    pub double: f64,
    #[proto(number = 2)]
    pub float: f32,
    #[proto(number = 3)]
    pub int64: i64,
    #[proto(number = 4)]
    pub uint64: u64,
    #[proto(number = 5)]
    pub int32: i32,
    #[proto(number = 6, kind = "fixed64")]
    pub fixed64: u64,
    #[proto(number = 7, kind = "fixed32")]
    pub fixed32: u32,
    #[proto(number = 8)]
    pub flag: bool,
    #[proto(number = 9)]
    pub text: String,
    #[proto(number = 10)]
    pub origin: Option<Point>,
    #[proto(number = 11)]
    pub blob: Vec<u8>,
    #[proto(number = 12)]
    pub uint32: u32,
    #[proto(number = 13, kind = "enum")]
    pub priority: Priority,
    #[proto(number = 14, kind = "sfixed32")]
    pub sfixed32: i32,
    #[proto(number = 15, kind = "sfixed64")]
    pub sfixed64: i64,
    #[proto(number = 16, kind = "sint32")]
    pub sint32: i32,
    #[proto(number = 17, kind = "sint64")]
    pub sint64: i64,
    #[proto(number = 18, kind = "double_list")]
    pub doubles: Vec<f64>,
    #[proto(number = 19)]
    pub tags: Vec<String>,
    #[proto(number = 20, kind = "message_list")]
    pub path: Vec<Point>,
    #[proto(number = 21)]
    pub chunks: Vec<Vec<u8>>,
    #[proto(number = 22, kind = "enum_list")]
    pub history: Vec<Priority>,
    #[proto(number = 23, kind = "packed_sint64_list")]
    pub deltas: Vec<i64>,
    #[proto(number = 24, kind = "packed_fixed32_list")]
    pub ids: Vec<u32>,
    #[proto(number = 25)]
    pub flags: Vec<bool>,
    #[proto(number = 26)]
    pub boxed: Option<Box<Point>>,
    #[proto(skip)]
    pub scratch: u8,
}

pub fn everything() -> Everything {
    Everything {
        double: -2.5,
        float: 0.25,
        int64: -9_000_000_000,
        uint64: u64::MAX,
        int32: -1,
        fixed64: 0xDEAD_BEEF_0000_0001,
        fixed32: 42,
        flag: true,
        text: "héllo".into(),
        origin: Some(Point { x: -3, y: 4 }),
        blob: vec![0, 255, 7],
        uint32: 300,
        priority: Priority::Critical,
        sfixed32: -17,
        sfixed64: i64::MIN,
        sint32: i32::MIN,
        sint64: -1,
        doubles: vec![1.0, -0.0, f64::MAX],
        tags: vec!["a".into(), String::new(), "c".into()],
        path: vec![Point { x: 1, y: 1 }, Point::default(), Point { x: -9, y: 9 }],
        chunks: vec![vec![1, 2], Vec::new()],
        history: vec![Priority::High, Priority::Low, Priority::Critical],
        deltas: vec![-1, 0, 1, i64::MAX],
        ids: vec![7, 8, 9],
        flags: vec![true, false, true],
        boxed: Some(Box::new(Point { x: 10, y: -10 })),
        scratch: 0,
    }
}

/// Dense numbering: 1..=5.
#[derive(Debug, Clone, Default, PartialEq, Message)]
pub struct Compact {
    #[proto(number = 1)]
    pub a: u32,
    #[proto(number = 2)]
    pub b: String,
    #[proto(number = 3)]
    pub c: bool,
    #[proto(number = 4)]
    pub d: Vec<u64>,
    #[proto(number = 5, kind = "sint64")]
    pub e: i64,
}

/// Sparse numbering: 1, 1000, 5000.
#[derive(Debug, Clone, Default, PartialEq, Message)]
pub struct Scattered {
    #[proto(number = 1)]
    pub low: u64,
    #[proto(number = 1000)]
    pub mid: bool,
    #[proto(number = 5000)]
    pub high: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Message)]
pub struct Node {
    #[proto(number = 1)]
    pub value: i32,
    #[proto(number = 2)]
    pub child: Option<Box<Node>>,
}

/// Node with `depth` nested children below the root.
pub fn chain(depth: usize) -> Node {
    let mut node = Node {
        value: depth as i32,
        child: None,
    };
    for level in (0..depth).rev() {
        node = Node {
            value: level as i32,
            child: Some(Box::new(node)),
        };
    }
    node
}

/// Every schema flavor for `T`, labelled.
pub fn all_schemas<T: Message>() -> Vec<(&'static str, Arc<dyn Schema<T>>)> {
    let compiled = GeneratedSchemaFactory::new().with_backend(CompilingBackend);
    vec![
        (
            "table",
            TableSchemaFactory::new()
                .create_schema::<T>()
                .expect("Table schema should build"),
        ),
        (
            "compiled",
            compiled
                .create_schema::<T>()
                .expect("Compiled schema should build"),
        ),
        (
            "compiled-sparse",
            compiled
                .clone()
                .with_layout(LayoutPolicy::sparse_only())
                .create_schema::<T>()
                .expect("Compiled schema should build"),
        ),
        (
            "compiled-dense",
            compiled
                .with_layout(LayoutPolicy::dense_up_to(8192))
                .create_schema::<T>()
                .expect("Compiled schema should build"),
        ),
        (
            "linked",
            GeneratedSchemaFactory::new()
                .with_backend(LinkedBackend)
                .create_schema::<T>()
                .expect("Linked schema should load"),
        ),
    ]
}

pub fn encode<T>(schema: &dyn Schema<T>, message: &T) -> Vec<u8> {
    let mut writer = nproto::BufferWriter::new();
    schema
        .write_to(message, &mut writer)
        .expect("Write should succeed");
    writer.into_bytes()
}

pub fn decode<T: Default>(schema: &dyn Schema<T>, bytes: &[u8]) -> nproto::Result<T> {
    let mut message = T::default();
    schema.merge_from(&mut message, &mut SliceReader::new(bytes))?;
    Ok(message)
}

/// Split an encoding into runs of consecutive records sharing a field number.
pub fn field_runs(bytes: &[u8]) -> Vec<(u32, Vec<u8>)> {
    let mut reader = SliceReader::new(bytes);
    let mut runs: Vec<(u32, Vec<u8>)> = Vec::new();
    loop {
        let start = reader.offset();
        let number = reader.field_number().expect("Tag read should succeed");
        if number == READ_DONE {
            return runs;
        }
        reader.skip_field().expect("Skip should succeed");
        let record = &bytes[start..reader.offset()];
        match runs.last_mut() {
            Some((last, run)) if *last == number => run.extend_from_slice(record),
            _ => runs.push((number, record.to_vec())),
        }
    }
}

pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
