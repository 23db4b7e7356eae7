/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Type resolution (Godot -> Rust), including the marshalling strategy.
//!
//! Resolution is total over the known vocabulary and errors otherwise: a best-guess marshalling
//! kind either corrupts memory (wrong size/ownership) or fails at native call time without an
//! actionable diagnostic. The resolution order follows a fixed rule list; results are memoized
//! per `(type name, meta)` for the duration of the run.

use std::fmt;

use proc_macro2::Ident;
use quote::{format_ident, quote};

use crate::context::Context;
use crate::conv;
use crate::errors::BindgenError;
use crate::models::domain::{GodotTy, ModName, Primitive, RustTy, TyName};
use crate::models::json::JsonTypeMeta;
use crate::util::ident;

/// Resolution failure carrying only the type name; callers attach the offending member.
#[derive(Debug)]
pub struct TypeResolveError {
    ty: String,
}

impl TypeResolveError {
    fn new(ty: impl Into<String>) -> Self {
        Self { ty: ty.into() }
    }

    pub fn into_bindgen(self, member: impl fmt::Display) -> BindgenError {
        BindgenError::UnresolvedType {
            ty: self.ty,
            member: member.to_string(),
        }
    }
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Godot -> Rust types

/// Maps an input type from the Godot JSON to the corresponding Rust type.
///
/// Uses an internal cache (via `ctx`), as several types are ubiquitous. Resolving the same
/// `(type, meta)` pair twice within one run returns an identical result.
pub fn to_rust_type(
    ty: &str,
    meta: Option<&JsonTypeMeta>,
    ctx: &mut Context,
) -> Result<RustTy, TypeResolveError> {
    let full_ty = GodotTy {
        ty: ty.to_string(),
        meta: meta.copied(),
    };

    // Separate find + insert slightly slower, but much easier with lifetimes.
    if let Some(rust_ty) = ctx.find_rust_type(&full_ty) {
        Ok(rust_ty.clone())
    } else {
        let rust_ty = to_rust_type_uncached(&full_ty, ctx)?;
        ctx.insert_rust_type(full_ty, rust_ty.clone());
        Ok(rust_ty)
    }
}

fn to_rust_type_uncached(full_ty: &GodotTy, ctx: &mut Context) -> Result<RustTy, TypeResolveError> {
    let ty = full_ty.ty.as_str();
    let meta = full_ty.meta.as_ref();

    // 1. Exact primitive names; `meta` selects the bit width the JSON type leaves implicit.
    if is_primitive_name(ty) {
        return to_primitive(ty, meta).ok_or_else(|| {
            TypeResolveError::new(match meta {
                Some(meta) => format!("{ty} (meta {meta:?})"),
                None => ty.to_string(),
            })
        });
    }

    // `meta` only ever refines primitives; anything else is schema drift.
    if let Some(meta) = meta {
        return Err(TypeResolveError::new(format!("{ty} (meta {meta:?})")));
    }

    // 2. Builtin Variant types, carrying their Variant type tag. Packed arrays are dispatched
    //    on their name suffix so the element type travels with them.
    if ty == "Variant" {
        return Ok(RustTy::BuiltinVariant {
            ty: ident("Variant"),
            sys_variant_type: ident("GDEXTENSION_VARIANT_TYPE_NIL"),
        });
    }

    if let Some((shout_name, _ord)) = ctx.builtin_variant_tag(ty) {
        let sys_variant_type = format_ident!("GDEXTENSION_VARIANT_TYPE_{}", shout_name);

        if let Some(elem) = packed_array_elem(ty) {
            return Ok(RustTy::PackedArray {
                ty: ident(&conv::to_pascal_case(ty)),
                elem_ty: ident(elem),
                sys_variant_type,
            });
        }

        return Ok(RustTy::BuiltinVariant {
            ty: rustify_builtin(ty),
            sys_variant_type,
        });
    }

    // 3. Enums and bitfields. Native structure layouts spell scoped enums `Class::Enum`
    //    instead of `enum::Class.Enum`; both reach the same lookup.
    if let Some(bitfield) = ty.strip_prefix("bitfield::") {
        return to_enum_type(bitfield, true, ctx);
    }

    if let Some(qualified) = ty.strip_prefix("enum::") {
        return to_enum_type(qualified, false, ctx);
    }

    if let Some(elem_ty) = ty.strip_prefix("typedarray::") {
        let rust_elem_ty = to_rust_type(elem_ty, None, ctx)?;
        return Ok(RustTy::TypedArray {
            tokens: quote! { Array<#rust_elem_ty> },
        });
    }

    if ty.contains("::") && !ty.ends_with('*') {
        let with_dot = ty.replace("::", ".");
        return to_enum_type(&with_dot, false, ctx);
    }

    // 4. Engine classes: reference semantics behind an opaque handle.
    if ctx.is_engine_class(ty) {
        let inner_class = TyName::from_godot(ty).rust_ty;
        return Ok(RustTy::EngineClass {
            tokens: quote! { Gd<crate::classes::#inner_class> },
        });
    }

    // 5. Packed-array names not listed among the builtin classes; the Variant tag is derived
    //    from the name itself.
    if let Some(elem) = packed_array_elem(ty) {
        let shout_name = conv::to_shout_case(ty);
        return Ok(RustTy::PackedArray {
            ty: ident(&conv::to_pascal_case(ty)),
            elem_ty: ident(elem),
            sys_variant_type: format_ident!("GDEXTENSION_VARIANT_TYPE_{}", shout_name),
        });
    }

    // 6. Native structures, passed by value with C layout.
    if ctx.is_native_structure(ty) {
        return Ok(RustTy::NativeStructure {
            ty: TyName::from_godot(ty).rust_ty,
        });
    }

    // 7. Pointer types: strip `*`, see if const, then resolve the inner type.
    if let Some(stripped) = ty.strip_suffix('*') {
        let mut inner_ty = stripped.to_string();

        // `const` applies to the innermost pointer, if present.
        let is_const = inner_ty.starts_with("const ") && !inner_ty.trim_end().ends_with('*');
        if is_const {
            inner_ty = inner_ty.replace("const ", "");
        }

        // .trim() is necessary here, as Godot places a space between a type and the stars when
        // representing a double pointer. Example: "int*" but "int **".
        let inner = to_rust_type(inner_ty.trim(), None, ctx)?;
        return Ok(RustTy::RawPointer {
            inner: Box::new(inner),
            is_const,
        });
    }

    // 8. Everything else is an error, not a fallback.
    Err(TypeResolveError::new(ty))
}

/// Maps an input type to a Rust type with the same C representation. This is subtly different
/// from [`to_rust_type`]: `int`/`float` in native structures denote the C types, not the 64-bit
/// values used at the Variant level.
///
/// The returned flag is true if the field is an object pointer, which is mapped to an opaque
/// `*mut c_void` (the engine side owns the instance).
pub fn to_rust_type_abi(ty: &str, ctx: &mut Context) -> Result<(RustTy, bool), TypeResolveError> {
    let mut is_obj = false;
    let ty = match ty {
        "Object*" => {
            is_obj = true;
            RustTy::RawPointer {
                inner: Box::new(RustTy::Primitive {
                    ty: ident("c_void"),
                    kind: Primitive::Void,
                }),
                is_const: false,
            }
        }
        "int" => RustTy::Primitive {
            ty: ident("i32"),
            kind: Primitive::Int {
                bits: 32,
                signed: true,
            },
        },
        "float" => RustTy::Primitive {
            ty: ident("f32"),
            kind: Primitive::Float { bits: 32 },
        },
        "double" => RustTy::Primitive {
            ty: ident("f64"),
            kind: Primitive::Float { bits: 64 },
        },
        _ => to_rust_type(ty, None, ctx)?,
    };

    Ok((ty, is_obj))
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Implementation

fn is_primitive_name(ty: &str) -> bool {
    matches!(
        ty,
        "bool"
            | "int"
            | "float"
            | "double"
            | "void"
            | "int8_t"
            | "int16_t"
            | "int32_t"
            | "int64_t"
            | "uint8_t"
            | "uint16_t"
            | "uint32_t"
            | "uint64_t"
            | "real_t"
    )
}

fn to_primitive(ty: &str, meta: Option<&JsonTypeMeta>) -> Option<RustTy> {
    use JsonTypeMeta as M;

    let (name, kind) = match (ty, meta) {
        ("bool", None) => ("bool", Primitive::Bool),

        // Integers
        ("int", Some(M::Int64) | None) => ("i64", int_kind(64, true)),
        ("int", Some(M::Int32)) => ("i32", int_kind(32, true)),
        ("int", Some(M::Int16)) => ("i16", int_kind(16, true)),
        ("int", Some(M::Int8)) => ("i8", int_kind(8, true)),
        ("int", Some(M::UInt64)) => ("u64", int_kind(64, false)),
        ("int", Some(M::UInt32)) => ("u32", int_kind(32, false)),
        ("int", Some(M::UInt16)) => ("u16", int_kind(16, false)),
        ("int", Some(M::UInt8)) => ("u8", int_kind(8, false)),

        // Characters are transported as unsigned code units.
        ("int", Some(M::Char16)) => ("u16", int_kind(16, false)),
        ("int", Some(M::Char32)) => ("u32", int_kind(32, false)),

        // Floats (with single precision builds)
        ("float", Some(M::Double) | None) => ("f64", Primitive::Float { bits: 64 }),
        ("float", Some(M::Float)) => ("f32", Primitive::Float { bits: 32 }),

        // Doubles (with double precision builds)
        ("double", None) => ("f64", Primitive::Float { bits: 64 }),

        // Types needed for native structures mapping
        ("uint8_t", None) => ("u8", int_kind(8, false)),
        ("uint16_t", None) => ("u16", int_kind(16, false)),
        ("uint32_t", None) => ("u32", int_kind(32, false)),
        ("uint64_t", None) => ("u64", int_kind(64, false)),
        ("int8_t", None) => ("i8", int_kind(8, true)),
        ("int16_t", None) => ("i16", int_kind(16, true)),
        ("int32_t", None) => ("i32", int_kind(32, true)),
        ("int64_t", None) => ("i64", int_kind(64, true)),
        ("real_t", None) => ("f32", Primitive::Float { bits: 32 }),
        ("void", None) => ("c_void", Primitive::Void),

        _ => return None,
    };

    Some(RustTy::Primitive {
        ty: ident(name),
        kind,
    })
}

fn int_kind(bits: u8, signed: bool) -> Primitive {
    Primitive::Int { bits, signed }
}

/// Transforms a Godot builtin type name to its Rust spelling.
fn rustify_builtin(ty: &str) -> Ident {
    match ty {
        "String" => ident("GString"),
        "Array" => ident("VariantArray"),
        _ => TyName::from_godot(ty).rust_ty,
    }
}

fn packed_array_elem(ty: &str) -> Option<&'static str> {
    let elem = ty.strip_prefix("Packed")?.strip_suffix("Array")?;

    // Don't trigger on PackedScene ;P
    let rust_elem = match elem {
        "Byte" => "u8",
        "Int32" => "i32",
        "Int64" => "i64",
        "Float32" => "f32",
        "Float64" => "f64",
        "String" => "GString",
        "Vector2" => "Vector2",
        "Vector3" => "Vector3",
        "Vector4" => "Vector4",
        "Color" => "Color",
        _ => return None,
    };

    Some(rust_elem)
}

fn to_enum_type(
    qualified: &str,
    is_bitfield: bool,
    ctx: &Context,
) -> Result<RustTy, TypeResolveError> {
    // Global enum names may themselves contain a dot (`Variant.Type`), so the full name is
    // checked before splitting into surrounding type and enum.
    if ctx.has_global_enum(qualified) {
        let enum_ty = conv::make_enum_name(qualified);
        return Ok(RustTy::EngineEnum {
            tokens: quote! { crate::global::#enum_ty },
            is_bitfield,
        });
    }

    if let Some((surrounding, enum_)) = qualified.split_once('.') {
        if ctx.has_scoped_enum(surrounding, enum_) {
            if ctx.is_engine_class(surrounding) {
                let module = ModName::from_godot(surrounding);
                let enum_ty = conv::make_enum_name(enum_);

                return Ok(RustTy::EngineEnum {
                    tokens: quote! { crate::classes::#module::#enum_ty },
                    is_bitfield,
                });
            }

            // Builtin-scoped enums (e.g. `Vector3.Axis`) are emitted flattened into the global
            // module, since builtin classes themselves are not generated.
            let flat = format_ident!(
                "{}{}",
                conv::to_pascal_case(surrounding),
                conv::to_pascal_case(enum_)
            );
            return Ok(RustTy::EngineEnum {
                tokens: quote! { crate::global::#flat },
                is_bitfield,
            });
        }
    }

    let prefix = if is_bitfield { "bitfield" } else { "enum" };
    Err(TypeResolveError::new(format!("{prefix}::{qualified}")))
}
