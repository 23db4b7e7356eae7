/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Functions for generating engine-provided enums.

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::quote;

use crate::models::domain::Enum;

pub fn make_enums(enums: &[Enum]) -> TokenStream {
    let definitions = enums.iter().map(make_enum_definition);

    quote! {
        #( #definitions )*
    }
}

/// Creates a definition for the given enum.
///
/// Engine enums are not exhaustive across engine versions, so they are declared as newtype
/// structs over their ordinal with associated constants, not as Rust enums.
pub fn make_enum_definition(enum_: &Enum) -> TokenStream {
    let name = &enum_.name;
    let ord_type = enum_.ord_type();
    let godot_name = &enum_.godot_name;

    let enum_doc = if enum_.is_bitfield {
        format!("Engine bitfield `{godot_name}`.")
    } else {
        format!("Engine enum `{godot_name}`.")
    };

    let enumerators = enum_.enumerators.iter().map(|enumerator| {
        let constant_name = &enumerator.name;
        let ord = enumerator.value.unsuffixed_lit();
        let doc = format!("Godot enumerator name: `{}`.", enumerator.godot_name);

        quote! {
            #[doc = #doc]
            pub const #constant_name: #name = #name { ord: #ord };
        }
    });

    let from_ord = make_from_ord(enum_);
    let bitwise_ops = enum_.is_bitfield.then(|| {
        quote! {
            impl std::ops::BitOr for #name {
                type Output = Self;

                fn bitor(self, rhs: Self) -> Self::Output {
                    Self { ord: self.ord | rhs.ord }
                }
            }

            impl std::ops::BitOrAssign for #name {
                fn bitor_assign(&mut self, rhs: Self) {
                    self.ord |= rhs.ord;
                }
            }
        }
    });

    quote! {
        #[doc = #enum_doc]
        #[repr(transparent)]
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
        pub struct #name {
            ord: #ord_type,
        }

        impl #name {
            #( #enumerators )*

            /// Ordinal value as passed over the GDExtension boundary.
            pub const fn ord(self) -> #ord_type {
                self.ord
            }

            #from_ord
        }

        #bitwise_ops
    }
}

fn make_from_ord(enum_: &Enum) -> TokenStream {
    let name = &enum_.name;
    let ord_type = enum_.ord_type();

    if enum_.is_bitfield {
        // Bitfields accept any combination of flags.
        return quote! {
            pub const fn from_ord(ord: #ord_type) -> Self {
                Self { ord }
            }
        };
    }

    // Several enums declare aliases with equal ordinals; the match pattern must list each
    // ordinal once.
    let mut seen = HashSet::new();
    let distinct_ords: Vec<_> = enum_
        .enumerators
        .iter()
        .map(|e| e.value.unsuffixed_lit())
        .filter(|lit| seen.insert(lit.to_string()))
        .collect();

    if distinct_ords.is_empty() {
        return quote! {
            pub fn from_ord(_ord: #ord_type) -> Option<Self> {
                None
            }
        };
    }

    quote! {
        /// Returns the enumerator for the given ordinal, or `None` if the engine reported a
        /// value unknown to this version of the bindings.
        pub fn from_ord(ord: #ord_type) -> Option<Self> {
            match ord {
                #( #distinct_ords )|* => Some(Self { ord }),
                _ => None,
            }
        }
    }
}
