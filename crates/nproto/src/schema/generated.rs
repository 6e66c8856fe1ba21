// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generated-code schemas.
//!
//! [`GeneratedSchemaFactory`] validates the descriptors, picks a
//! [`BranchLayout`] and emits a [`SchemaPlan`]: the specialized code for
//! one message type, named `"<TypeName>Schema"`. A [`CodeLoadingBackend`]
//! turns the plan into a live schema:
//!
//! - [`LinkedBackend`] returns the code `#[derive(Message)]` compiled into
//!   the binary, after checking its name and fingerprint.
//! - [`CompilingBackend`] materializes the plan at runtime.
//! - [`ForwardingBackend`] (default) prefers linked code.
//!
//! The fingerprint is FNV-1a over `"<type>|<number>:<kind>|..."` in
//! declaration order; the layout is not part of it.

use super::dispatch::{processor, FieldProcessor};
use super::field::{FieldCache, Fields};
use super::layout::{BranchLayout, BranchTable, LayoutPolicy};
use super::{validate_descriptor, Schema, SchemaFactory};
use crate::descriptor::{Accessor, DeclaredDescriptors, DescriptorProvider, MessageDescriptor};
use crate::error::{LoadError, Result};
use crate::field_type::FieldType;
use crate::message::Message;
use crate::wire::{Reader, Writer, READ_DONE};
use log::{debug, trace};
use std::fmt;
use std::sync::Arc;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

fn fnv1a(hash: u32, bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(hash, |hash, &byte| (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME))
}

/// Fingerprint of a descriptor list, shared with `#[derive(Message)]`.
pub fn schema_fingerprint<I>(type_name: &str, fields: I) -> u32
where
    I: IntoIterator<Item = (u32, FieldType)>,
{
    let mut hash = fnv1a(FNV_OFFSET_BASIS, type_name.as_bytes());
    for (number, field_type) in fields {
        hash = fnv1a(hash, format!("|{}:{}", number, field_type.name()).as_bytes());
    }
    hash
}

struct Step<T> {
    number: u32,
    processor: &'static FieldProcessor,
    accessor: Accessor<T>,
}

/// Specialized code for one message type, ready for a backend.
pub struct SchemaPlan<T> {
    descriptor: MessageDescriptor<T>,
    steps: Vec<Step<T>>,
    layout: BranchLayout,
    fingerprint: u32,
}

impl<T> SchemaPlan<T> {
    /// Validate and specialize `descriptor` under `policy`.
    pub fn build(descriptor: MessageDescriptor<T>, policy: &LayoutPolicy) -> Result<Self> {
        let sorted_numbers = validate_descriptor(&descriptor)?;
        let layout = policy.choose(&sorted_numbers);
        let fingerprint = schema_fingerprint(
            descriptor.type_name(),
            descriptor
                .fields()
                .iter()
                .map(|field| (field.number(), field.field_type())),
        );
        let steps = descriptor
            .fields()
            .iter()
            .map(|field| Step {
                number: field.number(),
                processor: processor(field.field_type()),
                accessor: field.accessor(),
            })
            .collect();
        Ok(Self {
            descriptor,
            steps,
            layout,
            fingerprint,
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.descriptor.type_name()
    }

    /// Name the backend must load the code under.
    pub fn class_name(&self) -> String {
        format!("{}Schema", self.descriptor.type_name())
    }

    pub fn layout(&self) -> BranchLayout {
        self.layout
    }

    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<T> fmt::Debug for SchemaPlan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaPlan")
            .field("class_name", &self.class_name())
            .field("fields", &self.steps.len())
            .field("layout", &self.layout)
            .field("fingerprint", &format_args!("{:#010x}", self.fingerprint))
            .finish()
    }
}

/// Runtime-materialized [`SchemaPlan`].
pub struct CompiledSchema<T> {
    descriptor: MessageDescriptor<T>,
    steps: Box<[Step<T>]>,
    layout: BranchLayout,
    branches: BranchTable,
    fields: FieldCache<T>,
}

impl<T> CompiledSchema<T> {
    pub fn from_plan(plan: SchemaPlan<T>) -> Self {
        let entries: Vec<(u32, usize)> = plan
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| (step.number, index))
            .collect();
        Self {
            branches: BranchTable::build(plan.layout, &entries),
            descriptor: plan.descriptor,
            steps: plan.steps.into_boxed_slice(),
            layout: plan.layout,
            fields: FieldCache::new(),
        }
    }

    pub fn layout(&self) -> BranchLayout {
        self.layout
    }

    pub fn invalidate_fields(&self) {
        self.fields.invalidate();
    }
}

impl<T> Schema<T> for CompiledSchema<T> {
    fn write_to(&self, message: &T, writer: &mut dyn Writer) -> Result<()> {
        for step in self.steps.iter() {
            step.processor
                .write(step.number, step.accessor.get(message), writer)?;
        }
        Ok(())
    }

    fn merge_from(&self, message: &mut T, reader: &mut dyn Reader) -> Result<()> {
        loop {
            let number = reader.field_number()?;
            if number == READ_DONE {
                return Ok(());
            }
            match self.branches.lookup(number).and_then(|index| self.steps.get(index)) {
                Some(step) => step.processor.read(step.accessor.get_mut(message), reader)?,
                None => {
                    trace!(
                        "[schema] {}: skipping unknown field {}",
                        self.descriptor.type_name(),
                        number
                    );
                    if !reader.skip_field()? {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn fields(&self) -> Fields<T> {
        self.fields
            .get_or_build(|| Fields::from_descriptor(&self.descriptor))
    }
}

/// Schema compiled into the binary by `#[derive(Message)]`.
pub struct LinkedSchema<T> {
    class_name: &'static str,
    fingerprint: u32,
    layout: BranchLayout,
    schema: Arc<dyn Schema<T>>,
}

impl<T> LinkedSchema<T> {
    pub fn new(
        class_name: &'static str,
        fingerprint: u32,
        layout: BranchLayout,
        schema: Arc<dyn Schema<T>>,
    ) -> Self {
        Self {
            class_name,
            fingerprint,
            layout,
            schema,
        }
    }

    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    /// Layout the derive chose for its `merge_from`.
    pub fn layout(&self) -> BranchLayout {
        self.layout
    }

    pub fn into_schema(self) -> Arc<dyn Schema<T>> {
        self.schema
    }
}

impl<T> fmt::Debug for LinkedSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedSchema")
            .field("class_name", &self.class_name)
            .field("fingerprint", &format_args!("{:#010x}", self.fingerprint))
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

/// Turns a [`SchemaPlan`] into a live schema under a class name.
pub trait CodeLoadingBackend: Send + Sync {
    fn load<T: Message>(
        &self,
        class_name: &str,
        plan: SchemaPlan<T>,
    ) -> std::result::Result<Arc<dyn Schema<T>>, LoadError>;
}

/// Materializes plans at runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompilingBackend;

impl CodeLoadingBackend for CompilingBackend {
    fn load<T: Message>(
        &self,
        class_name: &str,
        plan: SchemaPlan<T>,
    ) -> std::result::Result<Arc<dyn Schema<T>>, LoadError> {
        debug!(
            "[schema] compiling {} ({} fields, {:?})",
            class_name,
            plan.len(),
            plan.layout()
        );
        Ok(Arc::new(CompiledSchema::from_plan(plan)))
    }
}

/// Resolves code linked in at compile time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedBackend;

impl CodeLoadingBackend for LinkedBackend {
    fn load<T: Message>(
        &self,
        class_name: &str,
        plan: SchemaPlan<T>,
    ) -> std::result::Result<Arc<dyn Schema<T>>, LoadError> {
        let linked = T::linked_schema().ok_or_else(|| LoadError::NotLinked {
            class_name: class_name.to_owned(),
        })?;
        if linked.class_name() != class_name {
            return Err(LoadError::NameMismatch {
                expected: class_name.to_owned(),
                found: linked.class_name().to_owned(),
            });
        }
        if linked.fingerprint() != plan.fingerprint() {
            return Err(LoadError::FingerprintMismatch {
                class_name: class_name.to_owned(),
                expected: plan.fingerprint(),
                found: linked.fingerprint(),
            });
        }
        debug!(
            "[schema] linked {} ({} fields, {:?})",
            class_name,
            plan.len(),
            linked.layout()
        );
        Ok(linked.into_schema())
    }
}

/// Linked code when present, runtime compilation otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardingBackend {
    linked: LinkedBackend,
    compiling: CompilingBackend,
}

impl CodeLoadingBackend for ForwardingBackend {
    fn load<T: Message>(
        &self,
        class_name: &str,
        plan: SchemaPlan<T>,
    ) -> std::result::Result<Arc<dyn Schema<T>>, LoadError> {
        if T::linked_schema().is_some() {
            return self.linked.load(class_name, plan);
        }
        debug!("[schema] no linked code for {}, compiling", class_name);
        self.compiling.load(class_name, plan)
    }
}

/// Factory producing specialized schemas through a [`CodeLoadingBackend`].
#[derive(Debug, Clone, Default)]
pub struct GeneratedSchemaFactory<B = ForwardingBackend, P = DeclaredDescriptors> {
    backend: B,
    provider: P,
    layout: LayoutPolicy,
}

impl GeneratedSchemaFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: CodeLoadingBackend, P: DescriptorProvider> GeneratedSchemaFactory<B, P> {
    pub fn with_backend<B2: CodeLoadingBackend>(self, backend: B2) -> GeneratedSchemaFactory<B2, P> {
        GeneratedSchemaFactory {
            backend,
            provider: self.provider,
            layout: self.layout,
        }
    }

    pub fn with_provider<P2: DescriptorProvider>(self, provider: P2) -> GeneratedSchemaFactory<B, P2> {
        GeneratedSchemaFactory {
            backend: self.backend,
            provider,
            layout: self.layout,
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutPolicy) -> Self {
        self.layout = layout;
        self
    }

    /// Validate and specialize without loading.
    pub fn plan<T: Message>(&self) -> Result<SchemaPlan<T>> {
        let descriptor = self.provider.descriptor_for::<T>()?;
        SchemaPlan::build(descriptor, &self.layout)
    }
}

impl<B: CodeLoadingBackend, P: DescriptorProvider> SchemaFactory for GeneratedSchemaFactory<B, P> {
    fn create_schema<T: Message>(&self) -> Result<Arc<dyn Schema<T>>> {
        let plan = self.plan::<T>()?;
        let class_name = plan.class_name();
        Ok(self.backend.load(&class_name, plan)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, FieldMut, FieldRef};
    use crate::error::Error;
    use crate::wire::{BufferWriter, SliceReader};

    #[derive(Debug, Default, PartialEq)]
    struct Sparse {
        low: u64,
        mid: bool,
        high: Vec<String>,
    }

    impl Message for Sparse {
        fn descriptor() -> MessageDescriptor<Self> {
            MessageDescriptor::new(
                "Sparse",
                vec![
                    FieldDescriptor::new(
                        1,
                        FieldType::UInt64,
                        "low",
                        Accessor::<Self>::new(|m| FieldRef::U64(&m.low), |m| FieldMut::U64(&mut m.low)),
                    ),
                    FieldDescriptor::new(
                        1000,
                        FieldType::Bool,
                        "mid",
                        Accessor::<Self>::new(|m| FieldRef::Bool(&m.mid), |m| FieldMut::Bool(&mut m.mid)),
                    ),
                    FieldDescriptor::new(
                        5000,
                        FieldType::StringList,
                        "high",
                        Accessor::<Self>::new(
                            |m| FieldRef::StringList(&m.high),
                            |m| FieldMut::StringList(&mut m.high),
                        ),
                    ),
                ],
            )
        }
    }

    #[derive(Default)]
    struct Abstract;

    impl Message for Abstract {
        fn descriptor() -> MessageDescriptor<Self> {
            MessageDescriptor::new("Abstract", Vec::new()).mark_abstract()
        }
    }

    fn sample() -> Sparse {
        Sparse {
            low: 300,
            mid: true,
            high: vec!["a".into(), "bc".into()],
        }
    }

    fn roundtrip(factory: &GeneratedSchemaFactory<CompilingBackend>) -> Sparse {
        let schema = factory
            .create_schema::<Sparse>()
            .expect("Schema should build");
        let mut writer = BufferWriter::new();
        schema
            .write_to(&sample(), &mut writer)
            .expect("Write should succeed");
        let mut decoded = Sparse::default();
        schema
            .merge_from(&mut decoded, &mut SliceReader::new(writer.as_bytes()))
            .expect("Merge should succeed");
        decoded
    }

    #[test]
    fn test_plan_naming_and_layout() {
        let plan = GeneratedSchemaFactory::new()
            .plan::<Sparse>()
            .expect("Plan should build");
        assert_eq!(plan.class_name(), "SparseSchema");
        assert_eq!(plan.layout(), BranchLayout::Sparse);
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn test_layouts_behave_identically() {
        let sparse = GeneratedSchemaFactory::new()
            .with_backend(CompilingBackend)
            .with_layout(LayoutPolicy::sparse_only());
        let dense = GeneratedSchemaFactory::new()
            .with_backend(CompilingBackend)
            .with_layout(LayoutPolicy::dense_up_to(8192));
        assert!(dense
            .plan::<Sparse>()
            .expect("Plan should build")
            .layout()
            .is_dense());
        assert_eq!(roundtrip(&sparse), sample());
        assert_eq!(roundtrip(&dense), sample());
    }

    #[test]
    fn test_fingerprint_ignores_layout() {
        let a = GeneratedSchemaFactory::new()
            .with_layout(LayoutPolicy::sparse_only())
            .plan::<Sparse>()
            .expect("Plan should build");
        let b = GeneratedSchemaFactory::new()
            .with_layout(LayoutPolicy::dense_up_to(8192))
            .plan::<Sparse>()
            .expect("Plan should build");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(
            a.fingerprint(),
            schema_fingerprint(
                "Sparse",
                [
                    (1, FieldType::UInt64),
                    (1000, FieldType::Bool),
                    (5000, FieldType::StringList)
                ]
            )
        );
        assert_ne!(
            a.fingerprint(),
            schema_fingerprint("Sparse", [(1, FieldType::UInt64)])
        );
    }

    #[test]
    fn test_linked_backend_requires_linked_code() {
        let factory = GeneratedSchemaFactory::new().with_backend(LinkedBackend);
        match factory.create_schema::<Sparse>() {
            Err(Error::CodeLoading(LoadError::NotLinked { class_name })) => {
                assert_eq!(class_name, "SparseSchema");
            }
            Err(other) => panic!("unexpected error {other:?}"),
            Ok(_) => panic!("manual impl has no linked code"),
        }
    }

    #[test]
    fn test_forwarding_backend_falls_back_to_compiling() {
        let schema = GeneratedSchemaFactory::new()
            .create_schema::<Sparse>()
            .expect("Schema should build");
        let names: Vec<&str> = schema.fields().iter().map(|field| field.name()).collect();
        assert_eq!(names, vec!["low", "mid", "high"]);
    }

    #[test]
    fn test_abstract_type_rejected() {
        assert!(matches!(
            GeneratedSchemaFactory::new().create_schema::<Abstract>(),
            Err(Error::AbstractMessageType("Abstract"))
        ));
    }
}
