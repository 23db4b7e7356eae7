/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Domain models, mapped once from the JSON models and read-only afterwards.

use std::fmt;

use proc_macro2::{Ident, Literal, TokenStream};
use quote::{format_ident, quote, ToTokens};

use crate::conv;
use crate::errors::BindgenError;
use crate::format_parser::{self, NativeStructureField};
use crate::models::json::{JsonClassApiType, JsonTypeMeta};
use crate::util::ident;

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Top-level

#[derive(Debug)]
pub struct ExtensionApi {
    pub godot_version: GodotApiVersion,
    pub builtins: Vec<BuiltinVariant>,
    pub classes: Vec<Class>,
    pub global_constants: Vec<Constant>,
    pub global_enums: Vec<Enum>,

    /// Enums scoped to builtin classes, flattened for the global module (builtin classes
    /// themselves are not generated).
    pub builtin_enums: Vec<Enum>,
    pub utility_functions: Vec<UtilityFunction>,
    pub native_structures: Vec<NativeStructure>,
    pub builtin_sizes: Vec<BuiltinSize>,
}

/// Godot API version (from the JSON; not runtime version).
#[derive(Clone, Debug)]
pub struct GodotApiVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,

    /// Full version string, e.g. `Godot Engine v4.2.stable.official`.
    pub version_string: String,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Builtins + classes

/// One entry of the `Variant.Type` enum, possibly backed by a builtin class in the dump.
#[derive(Debug)]
pub struct BuiltinVariant {
    /// Name in JSON type references: `"int"` or `"PackedVector2Array"`.
    pub godot_original_name: String,

    /// Enumerator name without `TYPE_` prefix: `"INT"` or `"PACKED_VECTOR2_ARRAY"`.
    pub godot_shout_name: String,

    pub variant_type_ord: i32,
}

impl BuiltinVariant {
    /// Returns an ident like `GDEXTENSION_VARIANT_TYPE_PACKED_VECTOR2_ARRAY`.
    pub fn sys_variant_type(&self) -> Ident {
        format_ident!("GDEXTENSION_VARIANT_TYPE_{}", self.godot_shout_name)
    }

    pub fn unsuffixed_ord_lit(&self) -> Literal {
        Literal::i32_unsuffixed(self.variant_type_ord)
    }
}

#[derive(Debug)]
pub struct BuiltinSize {
    pub builtin_original_name: String,
    pub build_configuration: String,
    pub size: usize,
}

#[derive(Debug)]
pub struct Class {
    pub name: TyName,
    pub mod_name: ModName,
    pub is_refcounted: bool,
    pub is_instantiable: bool,
    pub base_class: Option<TyName>,
    pub api_type: JsonClassApiType,
    pub constants: Vec<Constant>,
    pub enums: Vec<Enum>,
    pub methods: Vec<ClassMethod>,
    pub properties: Vec<Property>,
    pub signals: Vec<ClassSignal>,
}

impl Class {
    pub fn find_method(&self, godot_name: &str) -> Option<&ClassMethod> {
        self.methods.iter().find(|m| m.godot_name == godot_name)
    }
}

#[derive(Debug)]
pub struct NativeStructure {
    pub name: TyName,
    pub mod_name: ModName,
    pub format: String,
}

impl NativeStructure {
    /// Expands the raw format string into the ordered field list.
    ///
    /// Parsing is on demand and deterministic; the underlying iterator is restartable, so
    /// calling this repeatedly yields identical results.
    pub fn fields(&self) -> Result<Vec<NativeStructureField>, BindgenError> {
        format_parser::parse_native_structure_format(&self.name.godot_ty, &self.format)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Constants + enums

#[derive(Debug)]
pub struct Constant {
    pub name: String,
    pub value: ConstantValue,
}

#[derive(Debug)]
pub enum ConstantValue {
    I32(i32),
    I64(i64),
}

#[derive(Debug)]
pub struct Enum {
    pub name: Ident,
    pub godot_name: String,
    pub is_bitfield: bool,
    pub enumerators: Vec<Enumerator>,
}

impl Enum {
    /// Ordinal type of the enum: `u64` for bitfields (combinations may exceed `i32`), `i32`
    /// otherwise.
    pub fn ord_type(&self) -> Ident {
        if self.is_bitfield {
            ident("u64")
        } else {
            ident("i32")
        }
    }
}

#[derive(Debug)]
pub struct Enumerator {
    pub name: Ident,
    pub godot_name: String,
    pub value: EnumeratorValue,
}

#[derive(Debug)]
pub enum EnumeratorValue {
    Enum(i32),
    Bitfield(u64),
}

impl EnumeratorValue {
    pub fn unsuffixed_lit(&self) -> Literal {
        match self {
            EnumeratorValue::Enum(i) => Literal::i32_unsuffixed(*i),
            EnumeratorValue::Bitfield(i) => Literal::u64_unsuffixed(*i),
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Functions

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FnQualifier {
    Mut,    // &mut self
    Const,  // &self
    Static, // Self
}

impl FnQualifier {
    pub fn from_const_static(is_const: bool, is_static: bool) -> FnQualifier {
        if is_static {
            FnQualifier::Static
        } else if is_const {
            FnQualifier::Const
        } else {
            FnQualifier::Mut
        }
    }
}

#[derive(Debug)]
pub struct FnParam {
    pub name: Ident,
    pub type_: RustTy,

    /// Raw default-value expression from the dump, surfaced in docs.
    pub default_value: Option<String>,
}

#[derive(Debug)]
pub struct ClassMethod {
    pub name: String,
    pub godot_name: String,

    /// ABI identity for the method-bind lookup; `None` only for virtual methods.
    pub hash: Option<i64>,
    pub is_virtual: bool,
    pub is_vararg: bool,
    pub qualifier: FnQualifier,
    pub parameters: Vec<FnParam>,
    pub return_value: Option<RustTy>,
    pub surrounding_class: TyName,
}

impl fmt::Display for ClassMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class method `{}::{}`",
            self.surrounding_class.godot_ty, self.godot_name
        )
    }
}

#[derive(Debug)]
pub struct Property {
    pub name: String,
    pub type_: RustTy,
    pub getter: Option<String>,
    pub setter: Option<String>,

    /// Extra index argument passed to the accessors; `-1`/absent means not indexed.
    pub index: Option<i32>,
}

#[derive(Debug)]
pub struct ClassSignal {
    pub name: String,
    pub parameters: Vec<FnParam>,
}

#[derive(Debug)]
pub struct UtilityFunction {
    pub name: String,
    pub godot_name: String,
    pub hash: i64,
    pub is_vararg: bool,
    pub parameters: Vec<FnParam>,
    pub return_value: Option<RustTy>,
}

impl fmt::Display for UtilityFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "utility function `{}`", self.godot_name)
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Godot type (cache key)

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct GodotTy {
    pub ty: String,
    pub meta: Option<JsonTypeMeta>,
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Rust type

/// A resolved type: managed representation plus marshalling strategy.
///
/// Computed on demand by the resolver and memoized per [`GodotTy`] for one generation pass;
/// never persisted across runs.
#[derive(Clone, Debug)]
pub enum RustTy {
    /// Scalar passed by value: `bool`, `i32`, `f64`, ... with explicit width metadata, since
    /// the native ABI distinguishes widths the JSON leaves implicit.
    Primitive { ty: Ident, kind: Primitive },

    /// Builtin Variant-typed value (`Vector2`, `GString`, ...), carrying its Variant type tag.
    BuiltinVariant { ty: Ident, sys_variant_type: Ident },

    /// Packed array builtin; element type derived from the type-name suffix.
    PackedArray {
        ty: Ident,
        elem_ty: Ident,
        sys_variant_type: Ident,
    },

    /// `Array<i32>`; untyped arrays are mapped as `BuiltinVariant("VariantArray")`.
    TypedArray { tokens: TokenStream },

    /// Engine enum or bitfield, passed by ordinal value.
    EngineEnum {
        tokens: TokenStream,
        is_bitfield: bool,
    },

    /// `Gd<Node>`: reference semantics, the native side holds the authoritative instance and
    /// the managed side an opaque handle.
    EngineClass { tokens: TokenStream },

    /// Native structure passed by value with C layout.
    NativeStructure { ty: Ident },

    /// C-style raw pointer to a `RustTy`.
    RawPointer { inner: Box<RustTy>, is_const: bool },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Primitive {
    Bool,
    Int { bits: u8, signed: bool },
    Float { bits: u8 },
    Void,
}

impl RustTy {
    pub fn return_decl(&self) -> TokenStream {
        quote! { -> #self }
    }
}

impl ToTokens for RustTy {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        match self {
            RustTy::Primitive { ty, .. } => ty.to_tokens(tokens),
            RustTy::BuiltinVariant { ty, .. } => ty.to_tokens(tokens),
            RustTy::PackedArray { ty, .. } => ty.to_tokens(tokens),
            RustTy::TypedArray { tokens: path } => path.to_tokens(tokens),
            RustTy::EngineEnum { tokens: path, .. } => path.to_tokens(tokens),
            RustTy::EngineClass { tokens: path, .. } => path.to_tokens(tokens),
            RustTy::NativeStructure { ty } => ty.to_tokens(tokens),
            RustTy::RawPointer {
                inner,
                is_const: true,
            } => quote! { *const #inner }.to_tokens(tokens),
            RustTy::RawPointer {
                inner,
                is_const: false,
            } => quote! { *mut #inner }.to_tokens(tokens),
        }
    }
}

impl fmt::Display for RustTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_token_stream().to_string().replace(' ', ""))
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Naming conventions

/// Contains multiple naming conventions for types (classes, enums, native structures).
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct TyName {
    pub godot_ty: String,
    pub rust_ty: Ident,
}

impl TyName {
    pub fn from_godot(godot_ty: &str) -> Self {
        Self {
            godot_ty: godot_ty.to_owned(),
            rust_ty: ident(&conv::to_pascal_case(godot_ty)),
        }
    }
}

impl ToTokens for TyName {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.rust_ty.to_tokens(tokens)
    }
}

/// Naming conventions for modules.
#[derive(Clone, Debug)]
pub struct ModName {
    pub rust_mod: Ident,
}

impl ModName {
    pub fn from_godot(godot_ty: &str) -> Self {
        Self {
            rust_mod: ident(&conv::to_snake_case(godot_ty)),
        }
    }
}

impl ToTokens for ModName {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.rust_mod.to_tokens(tokens)
    }
}
