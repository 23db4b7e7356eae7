/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use proc_macro2::TokenStream;
use quote::quote;

use crate::models::domain::{ExtensionApi, FnParam, RustTy, UtilityFunction};
use crate::util::{self, safe_ident};

pub fn make_utilities_code(api: &ExtensionApi) -> TokenStream {
    let utility_fns = api.utility_functions.iter().map(make_utility_function);

    let imports = util::make_imports();
    quote! {
        #![doc = "Global utility functions, called through cached function pointers."]

        #imports

        #( #utility_fns )*
    }
}

fn make_utility_function(function: &UtilityFunction) -> TokenStream {
    let rust_name = safe_ident(&function.name);
    let table_field = safe_ident(&function.godot_name);

    let mut fn_params = vec![];
    let mut param_types = vec![];
    let mut arg_names = vec![];
    for FnParam { name, type_, .. } in function.parameters.iter() {
        fn_params.push(quote! { #name: #type_ });
        param_types.push(quote! { #type_ });
        arg_names.push(quote! { #name });
    }

    if function.is_vararg {
        fn_params.push(quote! { varargs: &[Variant] });
    }

    let ret_ty = match &function.return_value {
        Some(ty) => quote! { #ty },
        None => quote! { () },
    };
    let return_decl = function
        .return_value
        .as_ref()
        .map(|ty| ty.return_decl())
        .unwrap_or_default();

    let call = if function.is_vararg {
        quote! {
            sys::call_utility_function_vararg::<CallParams, CallRet>(utility_fn, (#(#arg_names,)*), varargs)
        }
    } else {
        quote! {
            sys::call_utility_function::<CallParams, CallRet>(utility_fn, (#(#arg_names,)*))
        }
    };

    let doc = format!("Calls the engine utility function `{}`.", function.godot_name);

    let has_pointers = matches!(function.return_value, Some(RustTy::RawPointer { .. }))
        || function
            .parameters
            .iter()
            .any(|p| matches!(p.type_, RustTy::RawPointer { .. }));

    let inner = quote! {
        type CallParams = (#(#param_types,)*);
        type CallRet = #ret_ty;

        let utility_fn = crate::tables::utility_function_table().#table_field;
        #call
    };

    if has_pointers {
        quote! {
            #[doc = #doc]
            /// # Safety
            ///
            /// This function accepts raw pointers; the caller must uphold the pointee
            /// invariants the engine expects for it.
            pub unsafe fn #rust_name(#(#fn_params),*) #return_decl {
                #inner
            }
        }
    } else {
        quote! {
            #[doc = #doc]
            pub fn #rust_name(#(#fn_params),*) #return_decl {
                unsafe {
                    #inner
                }
            }
        }
    }
}
