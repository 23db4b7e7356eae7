/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Optional generated test file, exercising the generated surface itself: enum ordinals
//! round-trip through `from_ord`, and native structures are materialized C-layout types.

use proc_macro2::TokenStream;
use quote::quote;

use crate::models::domain::{Enum, ExtensionApi};

pub fn make_generated_tests(api: &ExtensionApi) -> TokenStream {
    let enum_checks: Vec<TokenStream> = api
        .global_enums
        .iter()
        .chain(api.builtin_enums.iter())
        .filter_map(make_enum_check)
        .collect();

    let structure_checks: Vec<TokenStream> = api
        .native_structures
        .iter()
        .map(|structure| {
            let ty = &structure.name.rust_ty;
            quote! {
                assert!(std::mem::size_of::<crate::native::#ty>() > 0);
            }
        })
        .collect();

    quote! {
        #[test]
        fn enum_ords_roundtrip() {
            #( #enum_checks )*
        }

        #[test]
        fn native_structures_are_materialized() {
            #( #structure_checks )*
        }
    }
}

fn make_enum_check(enum_: &Enum) -> Option<TokenStream> {
    let first = enum_.enumerators.first()?;

    let name = &enum_.name;
    let enumerator = &first.name;
    let ord = first.value.unsuffixed_lit();

    let check = if enum_.is_bitfield {
        quote! {
            assert_eq!(crate::global::#name::from_ord(#ord).ord(), #ord);
        }
    } else {
        quote! {
            assert_eq!(
                crate::global::#name::from_ord(#ord),
                Some(crate::global::#name::#enumerator)
            );
        }
    };

    Some(check)
}
