/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Emission of native structures as `#[repr(C)]` value types.
//!
//! Field order and sizes come verbatim from the parsed layout; any deviation would desynchronize
//! the Rust struct from the native memory the engine writes through pointers.

use proc_macro2::TokenStream;
use quote::quote;

use crate::context::Context;
use crate::conv;
use crate::errors::BindgenError;
use crate::format_parser::NativeStructureField;
use crate::models::domain::{ExtensionApi, NativeStructure};
use crate::util::{self, safe_ident, GeneratedFile};

pub fn make_native_structure_files(
    api: &ExtensionApi,
    ctx: &mut Context,
) -> Result<Vec<GeneratedFile>, BindgenError> {
    let mut files = vec![];
    let mut module_decls = vec![];

    for structure in api.native_structures.iter() {
        let code = make_native_structure(structure, ctx)?;
        files.push(GeneratedFile::new(
            format!("native/{}.rs", structure.mod_name.rust_mod),
            code,
        ));

        let module_name = &structure.mod_name;
        let symbol = &structure.name.rust_ty;
        module_decls.push(quote! {
            pub mod #module_name;
            pub use #module_name::#symbol;
        });
    }

    let mod_contents = quote! {
        #( #module_decls )*
    };
    files.push(GeneratedFile::new("native/mod.rs", mod_contents));

    Ok(files)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Implementation

fn make_native_structure(
    structure: &NativeStructure,
    ctx: &mut Context,
) -> Result<TokenStream, BindgenError> {
    let class_name = &structure.name.rust_ty;

    let fields = structure.fields()?;
    let mut field_definitions = Vec::with_capacity(fields.len());
    for field in fields.iter() {
        field_definitions.push(make_native_structure_field(structure, field, ctx)?);
    }

    let imports = util::make_imports();
    let doc = format!(
        "Native structure `{}`; passed via pointer in APIs that are not exposed to GDScript.",
        structure.name.godot_ty
    );

    let tokens = quote! {
        #imports
        use std::ffi::c_void; // for opaque object pointer fields

        #[doc = #doc]
        #[derive(Clone, PartialEq, Debug)]
        #[repr(C)]
        pub struct #class_name {
            #( #field_definitions )*
        }
    };

    Ok(tokens)
}

fn make_native_structure_field(
    structure: &NativeStructure,
    field: &NativeStructureField,
    ctx: &mut Context,
) -> Result<TokenStream, BindgenError> {
    // The layout grammar writes pointers as `Object *`; the star belongs to the type.
    let normalized = field.field_type.replace(" *", "*");

    let (field_type, is_object_ptr) = conv::to_rust_type_abi(&normalized, ctx).map_err(|e| {
        e.into_bindgen(format!(
            "field `{}` of native structure `{}`",
            field.field_name, structure.name.godot_ty
        ))
    })?;

    let field_type = if let Some(size) = field.array_size {
        quote! { [#field_type; #size] }
    } else {
        quote! { #field_type }
    };

    let field_name = safe_ident(&conv::to_snake_case(&field.field_name));

    let mut docs = vec![];
    if is_object_ptr {
        // The engine owns the object; only an opaque pointer crosses the boundary.
        docs.push("Raw object pointer; the engine side holds the instance.".to_string());
    }
    if let Some(default) = &field.default_value {
        docs.push(format!("Engine-side default: `{default}`."));
    }

    Ok(quote! {
        #( #[doc = #docs] )*
        pub #field_name: #field_type,
    })
}
