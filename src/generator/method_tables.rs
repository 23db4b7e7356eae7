/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Method-bind tables: every native method pointer is looked up once, keyed by
//! `(class, method, hash)`, and kept immutable for the rest of the process lifetime.

use proc_macro2::{Ident, Literal, TokenStream};
use quote::{format_ident, quote};

use crate::models::domain::{Class, ClassMethod, ExtensionApi};
use crate::util::safe_ident;

/// Field name of a method bind in the generated table.
pub fn method_table_field(class: &Class, method: &ClassMethod) -> Ident {
    format_ident!("{}__{}", class.mod_name.rust_mod, method.godot_name)
}

pub fn make_method_table_file(api: &ExtensionApi) -> TokenStream {
    let mut method_decls = vec![];
    let mut method_inits = vec![];
    let mut class_count = 0usize;
    let mut method_count = 0usize;

    for class in api.classes.iter() {
        let class_name_str = class.name.godot_ty.as_str();
        let mut any = false;

        for method in class.methods.iter() {
            // Virtual methods are invoked by the engine, not through a method bind.
            let Some(hash) = method.hash else {
                continue;
            };

            let field = method_table_field(class, method);
            let method_name_str = method.godot_name.as_str();
            let hash_lit = Literal::i64_suffixed(hash);

            method_decls.push(quote! {
                pub #field: sys::ClassMethodBind,
            });

            // A bind that the engine no longer provides fails inside load_class_method with
            // the offending class/method/hash, before any call can go through it.
            method_inits.push(quote! {
                #field: sys::load_class_method(
                    fetch_fptr,
                    string_names,
                    #class_name_str,
                    #method_name_str,
                    #hash_lit,
                ),
            });

            method_count += 1;
            any = true;
        }

        if any {
            class_count += 1;
        }
    }

    let mut utility_decls = vec![];
    let mut utility_inits = vec![];

    for function in api.utility_functions.iter() {
        // Utility names like `typeof` collide with keywords.
        let field = safe_ident(&function.godot_name);
        let fn_name_str = function.godot_name.as_str();
        let hash_lit = Literal::i64_suffixed(function.hash);

        utility_decls.push(quote! {
            pub #field: sys::UtilityFunctionBind,
        });

        utility_inits.push(quote! {
            #field: sys::load_utility_function(get_utility_fn, string_names, #fn_name_str, #hash_lit),
        });
    }

    let utility_count = api.utility_functions.len();

    quote! {
        use crate::sys;

        pub struct ClassMethodTable {
            #( #method_decls )*
        }

        impl ClassMethodTable {
            pub const CLASS_COUNT: usize = #class_count;
            pub const METHOD_COUNT: usize = #method_count;

            /// Fetches all class method binds.
            ///
            /// # Safety
            /// The interface must be loaded and the engine's `ClassDB` fully registered.
            pub unsafe fn load(
                interface: &sys::GDExtensionInterface,
                string_names: &mut sys::StringCache,
            ) -> Self {
                let fetch_fptr = interface
                    .classdb_get_method_bind
                    .expect("classdb_get_method_bind absent");

                Self {
                    #( #method_inits )*
                }
            }
        }

        pub struct UtilityFunctionTable {
            #( #utility_decls )*
        }

        impl UtilityFunctionTable {
            pub const FUNCTION_COUNT: usize = #utility_count;

            /// Fetches all utility function pointers.
            ///
            /// # Safety
            /// The interface must be loaded.
            pub unsafe fn load(
                interface: &sys::GDExtensionInterface,
                string_names: &mut sys::StringCache,
            ) -> Self {
                let get_utility_fn = interface
                    .variant_get_ptr_utility_function
                    .expect("variant_get_ptr_utility_function absent");

                Self {
                    #( #utility_inits )*
                }
            }
        }

        static CLASS_METHODS: std::sync::OnceLock<ClassMethodTable> = std::sync::OnceLock::new();
        static UTILITY_FUNCTIONS: std::sync::OnceLock<UtilityFunctionTable> = std::sync::OnceLock::new();

        /// Loads all method tables. Later calls keep the first-loaded tables.
        ///
        /// # Safety
        /// See [`ClassMethodTable::load`].
        pub unsafe fn load_method_tables(
            interface: &sys::GDExtensionInterface,
            string_names: &mut sys::StringCache,
        ) {
            let _ = CLASS_METHODS.set(ClassMethodTable::load(interface, string_names));
            let _ = UTILITY_FUNCTIONS.set(UtilityFunctionTable::load(interface, string_names));
        }

        pub fn class_method_table() -> &'static ClassMethodTable {
            CLASS_METHODS.get().expect("method tables are not loaded")
        }

        pub fn utility_function_table() -> &'static UtilityFunctionTable {
            UTILITY_FUNCTIONS.get().expect("method tables are not loaded")
        }
    }
}
