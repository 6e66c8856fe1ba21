// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Derive macros for `nproto`.
//!
//! `#[derive(Message)]` emits the descriptor list, a `<Type>Schema` unit
//! struct with straight-line `write_to` / `merge_from`, and links that
//! schema in through `Message::linked_schema`. `#[derive(Enumeration)]`
//! maps a fieldless enum onto protobuf enum numbers.

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::Literal;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{
    parse_macro_input, Data, DeriveInput, Expr, ExprLit, ExprUnary, Fields, GenericArgument, Lit,
    LitInt, LitStr, PathArguments, Type, UnOp,
};

/// Largest legal field number (2^29 - 1).
const MAX_FIELD_NUMBER: u64 = (1 << 29) - 1;

// Layout defaults; kept equal to `nproto::LayoutPolicy::default()`.
const MIN_OCCUPANCY_PERCENT: u64 = 50;
const MAX_DENSE_SPAN: u64 = 1024;

/// Singular kinds: (name, `FieldType` variant, `FieldRef` variant).
const SCALAR_KINDS: [(&str, &str, &str); 17] = [
    ("double", "Double", "F64"),
    ("float", "Float", "F32"),
    ("int64", "Int64", "I64"),
    ("uint64", "UInt64", "U64"),
    ("int32", "Int32", "I32"),
    ("fixed64", "Fixed64", "U64"),
    ("fixed32", "Fixed32", "U32"),
    ("bool", "Bool", "Bool"),
    ("string", "String", "String"),
    ("message", "Message", "Message"),
    ("bytes", "Bytes", "Bytes"),
    ("uint32", "UInt32", "U32"),
    ("enum", "Enum", "Enum"),
    ("sfixed32", "SFixed32", "I32"),
    ("sfixed64", "SFixed64", "I64"),
    ("sint32", "SInt32", "I32"),
    ("sint64", "SInt64", "I64"),
];

/// How the typed op for a kind is called.
#[derive(Clone, Copy)]
enum OpShape {
    Singular,
    /// String, bytes, enum and message lists: never packed.
    List,
    /// Numeric lists: the op takes the packed flag.
    Packable(bool),
}

/// Resolved `kind = "..."` attribute.
struct ResolvedKind {
    name: String,
    field_type: syn::Ident,
    storage: syn::Ident,
    op: String,
    shape: OpShape,
}

fn scalar(base: &str) -> Option<(&'static str, &'static str, &'static str)> {
    SCALAR_KINDS.iter().copied().find(|(name, _, _)| *name == base)
}

fn is_packable(base: &str) -> bool {
    !matches!(base, "string" | "bytes" | "message" | "enum")
}

fn lookup_kind(kind: &str) -> Option<ResolvedKind> {
    let ident = |s: &str| syn::Ident::new(s, proc_macro2::Span::call_site());
    if let Some(base) = kind
        .strip_prefix("packed_")
        .and_then(|rest| rest.strip_suffix("_list"))
    {
        let (_, variant, storage) = scalar(base)?;
        if !is_packable(base) {
            return None;
        }
        return Some(ResolvedKind {
            name: kind.to_owned(),
            field_type: ident(&format!("Packed{variant}List")),
            storage: ident(&format!("{storage}List")),
            op: format!("{base}_list"),
            shape: OpShape::Packable(true),
        });
    }
    if let Some(base) = kind.strip_suffix("_list") {
        let (_, variant, storage) = scalar(base)?;
        let shape = if is_packable(base) {
            OpShape::Packable(false)
        } else {
            OpShape::List
        };
        return Some(ResolvedKind {
            name: kind.to_owned(),
            field_type: ident(&format!("{variant}List")),
            storage: ident(&format!("{storage}List")),
            op: format!("{base}_list"),
            shape,
        });
    }
    let (name, variant, storage) = scalar(kind)?;
    Some(ResolvedKind {
        name: name.to_owned(),
        field_type: ident(variant),
        storage: ident(storage),
        op: name.to_owned(),
        shape: OpShape::Singular,
    })
}

/// Last path segment of a type and its first generic argument, if any.
fn type_parts(ty: &Type) -> Option<(String, Option<&Type>)> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    let inner = match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        }),
        _ => None,
    };
    Some((segment.ident.to_string(), inner))
}

/// `Option<Box<_>>`, the storage of recursive embedded messages.
fn is_boxed_option(ty: &Type) -> bool {
    match type_parts(ty) {
        Some((outer, Some(inner))) if outer == "Option" => {
            matches!(type_parts(inner), Some((boxed, Some(_))) if boxed == "Box")
        }
        _ => false,
    }
}

/// Route a boxed message field through the boxed storage slot.
/// The kind name (and so the fingerprint) is unchanged.
fn resolve_storage(mut kind: ResolvedKind, ty: &Type) -> ResolvedKind {
    if kind.name == "message" && is_boxed_option(ty) {
        kind.storage = syn::Ident::new("BoxedMessage", kind.storage.span());
        kind.op = "boxed_message".to_owned();
    }
    kind
}

/// Default kind for common Rust field types when `kind` is omitted.
///
/// Numeric vectors default to packed (proto3). Enums and message lists
/// always need an explicit kind.
fn infer_kind(ty: &Type) -> Option<&'static str> {
    let (outer, inner) = type_parts(ty)?;
    let scalar_kind = |name: &str| match name {
        "i32" => Some("int32"),
        "i64" => Some("int64"),
        "u32" => Some("uint32"),
        "u64" => Some("uint64"),
        "f32" => Some("float"),
        "f64" => Some("double"),
        "bool" => Some("bool"),
        "String" => Some("string"),
        _ => None,
    };
    match outer.as_str() {
        "Option" => Some("message"),
        "Vec" => {
            let (element, element_inner) = type_parts(inner?)?;
            match element.as_str() {
                "u8" => Some("bytes"),
                "String" => Some("string_list"),
                "Vec" => match type_parts(element_inner?)?.0.as_str() {
                    "u8" => Some("bytes_list"),
                    _ => None,
                },
                "i32" => Some("packed_int32_list"),
                "i64" => Some("packed_int64_list"),
                "u32" => Some("packed_uint32_list"),
                "u64" => Some("packed_uint64_list"),
                "f32" => Some("packed_float_list"),
                "f64" => Some("packed_double_list"),
                "bool" => Some("packed_bool_list"),
                _ => None,
            }
        }
        other => scalar_kind(other),
    }
}

/// Compute FNV-1a hash (32-bit)
fn fnv1a(mut hash: u32, bytes: &[u8]) -> u32 {
    for &byte in bytes {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

/// Descriptor fingerprint; must match `nproto::schema::schema_fingerprint`.
fn fingerprint(type_name: &str, fields: &[FieldInfo]) -> u32 {
    let mut hash = fnv1a(2_166_136_261, type_name.as_bytes());
    for field in fields {
        hash = fnv1a(hash, format!("|{}:{}", field.number, field.kind.name).as_bytes());
    }
    hash
}

struct FieldInfo {
    ident: syn::Ident,
    number: u32,
    kind: ResolvedKind,
}

#[derive(Default)]
struct FieldAttrs {
    number: Option<(u64, proc_macro2::Span)>,
    kind: Option<LitStr>,
    skip: bool,
}

fn parse_field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("proto")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("number") {
                let lit: LitInt = meta.value()?.parse()?;
                attrs.number = Some((lit.base10_parse::<u64>()?, lit.span()));
            } else if meta.path.is_ident("kind") {
                attrs.kind = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("skip") {
                attrs.skip = true;
            } else {
                return Err(meta.error("expected `number = N`, `kind = \"...\"` or `skip`"));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

fn parse_type_name(input: &DeriveInput) -> syn::Result<String> {
    let mut type_name = input.ident.to_string();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("proto")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                type_name = lit.value();
                Ok(())
            } else {
                Err(meta.error("expected `name = \"...\"`"))
            }
        })?;
    }
    Ok(type_name)
}

fn collect_fields(input: &DeriveInput) -> syn::Result<Vec<FieldInfo>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            Fields::Unit => return Ok(Vec::new()),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Message requires named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Message can be derived for structs only; enums and unions have no field layout",
            ))
        }
    };

    let mut infos: Vec<FieldInfo> = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "Field must have a name"));
        };
        let attrs = parse_field_attrs(field)?;
        if attrs.skip {
            continue;
        }
        let Some((number, number_span)) = attrs.number else {
            return Err(syn::Error::new_spanned(
                field,
                "missing `#[proto(number = N)]` (or `#[proto(skip)]`)",
            ));
        };
        if number == 0 || number > MAX_FIELD_NUMBER {
            return Err(syn::Error::new(
                number_span,
                format!("invalid field number {number} (expected 1..={MAX_FIELD_NUMBER})"),
            ));
        }
        let number = number as u32;
        if infos.iter().any(|info| info.number == number) {
            return Err(syn::Error::new(
                number_span,
                format!("duplicate field number: {number}"),
            ));
        }
        let kind = match &attrs.kind {
            Some(lit) => lookup_kind(&lit.value()).ok_or_else(|| {
                syn::Error::new(
                    lit.span(),
                    format!(
                        "unknown field kind `{}`; expected a protobuf scalar name \
                         (e.g. `sint32`), `<scalar>_list` or `packed_<scalar>_list`",
                        lit.value()
                    ),
                )
            })?,
            None => infer_kind(&field.ty).and_then(lookup_kind).ok_or_else(|| {
                syn::Error::new(
                    field.ty.span(),
                    "cannot infer the field kind from this type; add `kind = \"...\"`",
                )
            })?,
        };
        infos.push(FieldInfo {
            ident,
            number,
            kind: resolve_storage(kind, &field.ty),
        });
    }
    Ok(infos)
}

/// Dense `Some((lo, span))` or sparse `None`, same rule as the runtime default policy.
fn choose_layout(fields: &[FieldInfo]) -> Option<(u32, u32)> {
    let lo = fields.iter().map(|f| f.number).min()?;
    let hi = fields.iter().map(|f| f.number).max()?;
    let span = u64::from(hi - lo) + 1;
    if span > MAX_DENSE_SPAN || (fields.len() as u64) * 100 < span * MIN_OCCUPANCY_PERCENT {
        return None;
    }
    Some((lo, span as u32))
}

/// `#[derive(Message)]`: descriptor list plus linked generated schema.
///
/// Field attributes: `#[proto(number = N, kind = "...")]`, with `kind`
/// optional for plain scalars, `String`, `Vec<u8>`, `Vec<String>`,
/// numeric vectors (packed), `Option<M>` and `Option<Box<M>>` (message). `#[proto(skip)]`
/// leaves a field out. Struct attribute: `#[proto(name = "...")]`
/// overrides the type name.
///
/// Example:
/// ```ignore
/// #[derive(Default, nproto::Message)]
/// struct Reading {
///     #[proto(number = 1, kind = "sint32")]
///     value: i32,
///     #[proto(number = 2)]
///     station: String,
///     #[proto(number = 3, kind = "message_list")]
///     history: Vec<Sample>,
/// }
/// ```
#[proc_macro_derive(Message, attributes(proto))]
#[allow(clippy::too_many_lines)]
pub fn derive_message(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(&input.generics, "Message cannot be derived for generic types")
            .to_compile_error()
            .into();
    }
    let type_name = match parse_type_name(&input) {
        Ok(type_name) => type_name,
        Err(err) => return err.to_compile_error().into(),
    };
    let fields = match collect_fields(&input) {
        Ok(fields) => fields,
        Err(err) => return err.to_compile_error().into(),
    };

    let name = &input.ident;
    let vis = &input.vis;
    let schema_ident = format_ident!("{}Schema", name);
    let class_name = format!("{type_name}Schema");
    let fingerprint = fingerprint(&type_name, &fields);
    let layout = choose_layout(&fields);

    let descriptors = fields.iter().map(|f| {
        let ident = &f.ident;
        let number = f.number;
        let field_type = &f.kind.field_type;
        let storage = &f.kind.storage;
        let field_name = ident.to_string();
        quote! {
            ::nproto::FieldDescriptor::new(
                #number,
                ::nproto::FieldType::#field_type,
                #field_name,
                ::nproto::Accessor::<Self>::new(
                    |m| ::nproto::FieldRef::#storage(&m.#ident),
                    |m| ::nproto::FieldMut::#storage(&mut m.#ident),
                ),
            )
        }
    });

    let writes = fields.iter().map(|f| {
        let ident = &f.ident;
        let number = f.number;
        let op = format_ident!("write_{}", f.kind.op);
        match f.kind.shape {
            OpShape::Singular | OpShape::List => quote! {
                ::nproto::schema::ops::#op(#number, &message.#ident, writer)?;
            },
            OpShape::Packable(packed) => quote! {
                ::nproto::schema::ops::#op(#number, &message.#ident, #packed, writer)?;
            },
        }
    });

    let read_call = |f: &FieldInfo| {
        let ident = &f.ident;
        let op = format_ident!("read_{}", f.kind.op);
        quote! { ::nproto::schema::ops::#op(&mut message.#ident, reader)? }
    };
    let skip = quote! {
        if !::nproto::Reader::skip_field(&mut *reader)? {
            return ::core::result::Result::Ok(());
        }
    };

    let dispatch = match layout {
        Some((lo, span)) => {
            let arms = (0..span).map(|slot| {
                let label = Literal::u32_suffixed(slot);
                match fields.iter().find(|f| f.number - lo == slot) {
                    Some(f) => {
                        let read = read_call(f);
                        quote! { #label => { #read; } }
                    }
                    None => quote! { #label => { #skip } },
                }
            });
            quote! {
                match field_number.wrapping_sub(#lo) {
                    #(#arms)*
                    _ => { #skip }
                }
            }
        }
        None => {
            let arms = fields.iter().map(|f| {
                let label = Literal::u32_suffixed(f.number);
                let read = read_call(f);
                quote! { #label => { #read; } }
            });
            quote! {
                match field_number {
                    #(#arms)*
                    _ => { #skip }
                }
            }
        }
    };

    let layout_tokens = match layout {
        Some((lo, span)) => quote! { ::nproto::BranchLayout::Dense { lo: #lo, span: #span } },
        None => quote! { ::nproto::BranchLayout::Sparse },
    };

    let schema_doc = format!("Generated schema for [`{name}`].");

    let expanded = quote! {
        #[doc = #schema_doc]
        #[derive(Debug, Clone, Copy, Default)]
        #vis struct #schema_ident;

        #[automatically_derived]
        #[allow(unused_variables, clippy::match_single_binding, clippy::needless_return)]
        impl ::nproto::Schema<#name> for #schema_ident {
            fn write_to(
                &self,
                message: &#name,
                writer: &mut dyn ::nproto::Writer,
            ) -> ::nproto::Result<()> {
                #(#writes)*
                ::core::result::Result::Ok(())
            }

            fn merge_from(
                &self,
                message: &mut #name,
                reader: &mut dyn ::nproto::Reader,
            ) -> ::nproto::Result<()> {
                loop {
                    let field_number = ::nproto::Reader::field_number(&mut *reader)?;
                    if field_number == ::nproto::READ_DONE {
                        return ::core::result::Result::Ok(());
                    }
                    #dispatch
                }
            }

            fn fields(&self) -> ::nproto::Fields<#name> {
                static FIELDS: ::std::sync::OnceLock<::nproto::Fields<#name>> =
                    ::std::sync::OnceLock::new();
                FIELDS
                    .get_or_init(|| {
                        ::nproto::Fields::from_descriptor(
                            &<#name as ::nproto::Message>::descriptor(),
                        )
                    })
                    .clone()
            }
        }

        #[automatically_derived]
        impl ::nproto::Message for #name {
            fn descriptor() -> ::nproto::MessageDescriptor<Self> {
                ::nproto::MessageDescriptor::new(#type_name, ::std::vec![#(#descriptors),*])
            }

            fn message_name() -> &'static str {
                #type_name
            }

            fn linked_schema() -> ::core::option::Option<::nproto::LinkedSchema<Self>> {
                static SCHEMA: ::std::sync::OnceLock<
                    ::std::sync::Arc<dyn ::nproto::Schema<#name>>,
                > = ::std::sync::OnceLock::new();
                let schema = SCHEMA.get_or_init(|| {
                    let schema: ::std::sync::Arc<dyn ::nproto::Schema<#name>> =
                        ::std::sync::Arc::new(#schema_ident);
                    schema
                });
                ::core::option::Option::Some(::nproto::LinkedSchema::new(
                    #class_name,
                    #fingerprint,
                    #layout_tokens,
                    ::std::sync::Arc::clone(schema),
                ))
            }
        }
    };

    TokenStream::from(expanded)
}

/// Integer discriminant of an enum variant (`3` or `-3`).
fn parse_discriminant(expr: &Expr) -> syn::Result<i64> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => lit.base10_parse::<i64>(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => parse_discriminant(expr).map(|value| -value),
        Expr::Group(group) => parse_discriminant(&group.expr),
        other => Err(syn::Error::new_spanned(
            other,
            "enum numbers must be integer literals",
        )),
    }
}

/// `#[derive(Enumeration)]`: `ProtoEnum` for a fieldless enum.
///
/// Variant numbers follow the discriminants (implicit ones count up from
/// the previous variant, starting at 0). The type must also implement
/// `Copy` and `Default`.
#[proc_macro_derive(Enumeration)]
pub fn derive_enumeration(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_enumeration(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_enumeration(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Enumeration can be derived for enums only",
        ));
    };
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Enumeration cannot be derived for generic enums",
        ));
    }
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Enumeration requires at least one variant",
        ));
    }

    let mut numbered: Vec<(&syn::Ident, i32)> = Vec::new();
    let mut next = 0i64;
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Enumeration variants cannot carry data",
            ));
        }
        let value = match &variant.discriminant {
            Some((_, expr)) => parse_discriminant(expr)?,
            None => next,
        };
        let number = i32::try_from(value).map_err(|_| {
            syn::Error::new_spanned(variant, format!("enum number {value} does not fit in i32"))
        })?;
        if let Some((other, _)) = numbered.iter().find(|(_, n)| *n == number) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("enum number {number} is already used by `{other}`"),
            ));
        }
        numbered.push((&variant.ident, number));
        next = value + 1;
    }

    let name = &input.ident;
    let to_number = numbered.iter().map(|(ident, number)| {
        quote! { Self::#ident => #number, }
    });
    let from_number = numbered.iter().map(|(ident, number)| {
        quote! { #number => ::core::option::Option::Some(Self::#ident), }
    });

    Ok(quote! {
        #[automatically_derived]
        impl ::nproto::ProtoEnum for #name {
            fn number(self) -> i32 {
                match self {
                    #(#to_number)*
                }
            }

            fn from_number(number: i32) -> ::core::option::Option<Self> {
                match number {
                    #(#from_number)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}
