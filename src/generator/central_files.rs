/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use proc_macro2::TokenStream;
use quote::quote;

use crate::conv;
use crate::generator::{constants, enums};
use crate::models::domain::{ExtensionApi, GodotApiVersion};
use crate::util::ident;

/// Variant type tags, builtin sizes and engine version, part of the generated `sys` module.
pub fn make_sys_central_code(api: &ExtensionApi) -> TokenStream {
    let tag_consts = api.builtins.iter().map(|builtin| {
        let name = builtin.sys_variant_type();
        let ord = builtin.unsuffixed_ord_lit();
        let doc = format!("Variant type tag for `{}`.", builtin.godot_original_name);
        quote! {
            #[doc = #doc]
            pub const #name: GDExtensionVariantType = #ord;
        }
    });

    // Sizes for the single-precision 64-bit configuration, which is what these bindings
    // target; used by layout checks in the runtime crate.
    let size_consts = api
        .builtin_sizes
        .iter()
        .filter(|size| size.build_configuration == "float_64")
        .map(|size| {
            let name = ident(&conv::to_shout_case(&size.builtin_original_name));
            let value = size.size;
            quote! {
                pub const #name: usize = #value;
            }
        });

    let version_code = make_version_code(&api.godot_version);

    quote! {
        pub const GDEXTENSION_VARIANT_TYPE_NIL: GDExtensionVariantType = 0;
        #( #tag_consts )*

        /// Byte sizes of the builtin types, as reported by the engine.
        pub mod builtin_sizes {
            #( #size_consts )*
        }

        #version_code
    }
}

fn make_version_code(version: &GodotApiVersion) -> TokenStream {
    let GodotApiVersion {
        major,
        minor,
        patch,
        version_string,
    } = version;

    quote! {
        /// Version of the engine this binding surface was generated against.
        pub const VERSION_MAJOR: u8 = #major;
        pub const VERSION_MINOR: u8 = #minor;
        pub const VERSION_PATCH: u8 = #patch;
        pub const VERSION_STRING: &str = #version_string;
    }
}

/// Global constants and enums, plus builtin-scoped enums flattened into the same module.
pub fn make_global_code(api: &ExtensionApi) -> TokenStream {
    let global_constants = constants::make_constants(&api.global_constants);
    let global_enums = enums::make_enums(&api.global_enums);
    let builtin_enums = enums::make_enums(&api.builtin_enums);

    quote! {
        #![doc = "Global constants and enums of the engine API."]

        #global_constants
        #global_enums
        #builtin_enums
    }
}

/// The `mod.rs` tying the generated tree together.
pub fn make_mod_code() -> TokenStream {
    quote! {
        pub mod classes;
        pub mod global;
        pub mod native;
        pub mod sys;
        pub mod tables;
        pub mod utilities;
    }
}
