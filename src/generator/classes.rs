/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Emission of engine class bindings.

use std::collections::HashSet;

use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};

use crate::context::Context;
use crate::errors::BindgenError;
use crate::generator::method_tables::method_table_field;
use crate::generator::{constants, enums};
use crate::models::domain::{
    Class, ClassMethod, ExtensionApi, FnParam, FnQualifier, Primitive, Property, RustTy,
};
use crate::models::json::JsonClassApiType;
use crate::util::{self, safe_ident, GeneratedFile};
use tracing::warn;

/// Produces one file per class, in topological order, plus the `classes/mod.rs` declaring the
/// modules in that same order.
pub fn make_class_files(
    api: &ExtensionApi,
    ctx: &Context,
) -> Result<Vec<GeneratedFile>, BindgenError> {
    let classes = topological_class_order(&api.classes)?;

    let mut files = vec![];
    let mut module_decls = vec![];
    for class in classes {
        let code = make_class(class, ctx);
        files.push(GeneratedFile::new(
            format!("classes/{}.rs", class.mod_name.rust_mod),
            code,
        ));

        let module_name = &class.mod_name;
        let class_name = &class.name;
        module_decls.push(quote! {
            pub mod #module_name;
            pub use #module_name::#class_name;
        });
    }

    let mod_contents = quote! {
        #( #module_decls )*
    };
    files.push(GeneratedFile::new("classes/mod.rs", mod_contents));

    Ok(files)
}

/// Orders classes so that every base precedes its derived classes.
///
/// Ties among siblings keep input order, making the output deterministic and diffable
/// run-to-run. Base-class existence was validated when the context was built, so the only way
/// to stall is an inheritance cycle.
pub fn topological_class_order(classes: &[Class]) -> Result<Vec<&Class>, BindgenError> {
    let mut emitted: HashSet<&str> = HashSet::new();
    let mut order: Vec<&Class> = Vec::with_capacity(classes.len());
    let mut remaining: Vec<&Class> = classes.iter().collect();

    while !remaining.is_empty() {
        let before = remaining.len();

        remaining.retain(|class| {
            let ready = class
                .base_class
                .as_ref()
                .map_or(true, |base| emitted.contains(base.godot_ty.as_str()));

            if ready {
                emitted.insert(class.name.godot_ty.as_str());
                order.push(*class);
            }
            !ready
        });

        if remaining.len() == before {
            let stuck: Vec<&str> = remaining
                .iter()
                .map(|c| c.name.godot_ty.as_str())
                .collect();
            return Err(BindgenError::SchemaDrift {
                message: format!("inheritance cycle among classes: {}", stuck.join(", ")),
            });
        }
    }

    Ok(order)
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Implementation

fn make_class(class: &Class, ctx: &Context) -> TokenStream {
    let class_name = &class.name.rust_ty;
    let godot_class_str = &class.name.godot_ty;

    let availability = match class.api_type {
        JsonClassApiType::Core | JsonClassApiType::Extension => "",
        JsonClassApiType::Editor | JsonClassApiType::EditorExtension => {
            " Only available in editor builds."
        }
    };
    let module_doc = format!("Bindings for the engine class `{godot_class_str}`.{availability}");

    let base_ty = match class.base_class.as_ref() {
        Some(base) => {
            let base_ident = &base.rust_ty;
            quote! { crate::classes::#base_ident }
        }
        None => quote! { () },
    };

    let constructor = make_constructor(class, ctx);
    let methods: Vec<TokenStream> = class
        .methods
        .iter()
        .map(|method| make_class_method_definition(class, method))
        .collect();

    let properties: Vec<TokenStream> = class
        .properties
        .iter()
        .map(|property| make_property_accessors(class, property))
        .collect();

    let signal_constants: Vec<TokenStream> = class
        .signals
        .iter()
        .map(|signal| {
            let const_name = format_ident!("SIGNAL_{}", signal.name.to_uppercase());
            let name_str = signal.name.as_str();
            let params = signal
                .parameters
                .iter()
                .map(|p| format!("{}: {}", p.name, p.type_))
                .collect::<Vec<_>>()
                .join(", ");
            let doc = format!("Signal `{}({params})`.", signal.name);

            quote! {
                #[doc = #doc]
                pub const #const_name: &'static str = #name_str;
            }
        })
        .collect();

    let class_constants = constants::make_constants(&class.constants);
    let class_enums = enums::make_enums(&class.enums);
    let deref_impl = make_deref_impl(class_name, &base_ty, class.base_class.is_some());

    // Upcasting is allowed along the whole inheritance chain, not just the direct base.
    let all_bases = ctx.inheritance_tree().collect_all_bases(&class.name);
    let inherits_impls = all_bases.iter().map(|base| {
        let base_ident = &base.rust_ty;
        quote! {
            impl crate::obj::Inherits<crate::classes::#base_ident> for #class_name {}
        }
    });

    let imports = util::make_imports();

    quote! {
        #![doc = #module_doc]

        #imports

        #[repr(C)]
        #[derive(Debug)]
        pub struct #class_name {
            object_ptr: sys::GDExtensionObjectPtr,
        }

        impl #class_name {
            #constructor
            #( #methods )*
            #( #properties )*
            #class_constants
            #( #signal_constants )*
        }

        impl crate::obj::GodotClass for #class_name {
            type Base = #base_ty;

            const CLASS_NAME: &'static str = #godot_class_str;
        }

        impl crate::obj::EngineClass for #class_name {
            fn as_object_ptr(&self) -> sys::GDExtensionObjectPtr {
                self.object_ptr
            }

            fn as_type_ptr(&self) -> sys::GDExtensionTypePtr {
                std::ptr::addr_of!(self.object_ptr) as sys::GDExtensionTypePtr
            }
        }

        #( #inherits_impls )*

        #deref_impl

        #class_enums
    }
}

fn make_constructor(class: &Class, ctx: &Context) -> TokenStream {
    let godot_class_str = &class.name.godot_ty;

    if ctx.is_singleton(godot_class_str) {
        // Note: this could check class.is_instantiable, but instead of failing, redirect the
        // user to the singleton accessor.
        quote! {
            /// Returns the engine-managed singleton instance.
            pub fn singleton() -> Gd<Self> {
                unsafe { sys::get_singleton::<Self>(#godot_class_str) }
            }
        }
    } else if class.is_instantiable && class.is_refcounted {
        quote! {
            /// Constructs a new reference-counted instance.
            pub fn new_gd() -> Gd<Self> {
                unsafe { sys::construct_engine_object::<Self>(#godot_class_str) }
            }
        }
    } else if class.is_instantiable {
        quote! {
            /// Constructs a new manually-managed instance; release it with [`Gd::free`] when
            /// no longer needed.
            pub fn new_alloc() -> Gd<Self> {
                unsafe { sys::construct_engine_object::<Self>(#godot_class_str) }
            }
        }
    } else {
        TokenStream::new()
    }
}

fn make_class_method_definition(class: &Class, method: &ClassMethod) -> TokenStream {
    // Virtual methods are callbacks from the engine; there is no method bind to cache.
    if method.is_virtual {
        return TokenStream::new();
    }

    let rust_name = safe_ident(&method.name);
    let table_field = method_table_field(class, method);

    let (receiver, object_ptr) = match method.qualifier {
        FnQualifier::Const => (Some(quote! { &self }), quote! { self.object_ptr }),
        FnQualifier::Mut => (Some(quote! { &mut self }), quote! { self.object_ptr }),
        FnQualifier::Static => (None, quote! { std::ptr::null_mut() }),
    };

    let mut fn_params: Vec<TokenStream> = receiver.into_iter().collect();
    let mut param_types = vec![];
    let mut arg_names = vec![];
    for FnParam { name, type_, .. } in method.parameters.iter() {
        fn_params.push(quote! { #name: #type_ });
        param_types.push(quote! { #type_ });
        arg_names.push(quote! { #name });
    }

    if method.is_vararg {
        fn_params.push(quote! { varargs: &[Variant] });
    }

    let ret_ty = match &method.return_value {
        Some(ty) => quote! { #ty },
        None => quote! { () },
    };
    let return_decl = method
        .return_value
        .as_ref()
        .map(|ty| ty.return_decl())
        .unwrap_or_default();

    let call = if method.is_vararg {
        quote! {
            sys::varcall::<CallParams, CallRet>(method_bind, #object_ptr, (#(#arg_names,)*), varargs)
        }
    } else {
        quote! {
            sys::ptrcall::<CallParams, CallRet>(method_bind, #object_ptr, (#(#arg_names,)*))
        }
    };

    let inner = quote! {
        type CallParams = (#(#param_types,)*);
        type CallRet = #ret_ty;

        let method_bind = crate::tables::class_method_table().#table_field;
        #call
    };

    let doc = make_method_doc(method);

    // Raw pointers in the signature make the whole method unsafe; the engine does not document
    // which invariants the pointee must uphold.
    if signature_has_pointers(method) {
        quote! {
            #[doc = #doc]
            /// # Safety
            ///
            /// This method accepts raw pointers; the caller must uphold the pointee invariants
            /// the engine expects for it.
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

fn make_method_doc(method: &ClassMethod) -> String {
    let mut doc = format!("Calls the engine method `{}`.", method.godot_name);

    let defaults: Vec<String> = method
        .parameters
        .iter()
        .filter_map(|p| {
            p.default_value
                .as_ref()
                .map(|v| format!("`{}` = `{v}`", p.name))
        })
        .collect();

    if !defaults.is_empty() {
        doc.push_str("\n\nEngine-side default values: ");
        doc.push_str(&defaults.join(", "));
        doc.push('.');
    }

    doc
}

fn signature_has_pointers(method: &ClassMethod) -> bool {
    let ret_is_pointer = matches!(method.return_value, Some(RustTy::RawPointer { .. }));

    ret_is_pointer
        || method
            .parameters
            .iter()
            .any(|p| matches!(p.type_, RustTy::RawPointer { .. }))
}

/// Emits a delegating accessor for a property, when its getter/setter can be expressed.
///
/// Most properties are backed by a same-named getter/setter pair that is already part of the
/// generated method surface; a wrapper is only emitted when it adds a distinct name. A property
/// whose accessor is not declared by the class itself (common for indexed properties backed by
/// shared accessors) is skipped with a diagnostic.
fn make_property_accessors(class: &Class, property: &Property) -> TokenStream {
    if !is_valid_ident(&property.name) {
        warn!(
            "property `{}::{}` has no identifier-compatible name; skipped",
            class.name.godot_ty, property.name
        );
        return TokenStream::new();
    }

    let getter = make_property_getter(class, property);
    let setter = make_property_setter(class, property);

    quote! {
        #getter
        #setter
    }
}

fn make_property_getter(class: &Class, property: &Property) -> TokenStream {
    let Some(getter_name) = property.getter.as_deref() else {
        return TokenStream::new();
    };

    // The getter being the property's own name means the method already covers the surface.
    if getter_name == property.name {
        return TokenStream::new();
    }

    let Some(getter) = class.find_method(getter_name) else {
        warn!(
            "property `{}::{}` references getter `{getter_name}`, which the class does not declare; skipped",
            class.name.godot_ty, property.name
        );
        return TokenStream::new();
    };

    if getter.qualifier != FnQualifier::Const {
        warn!(
            "property `{}::{}`: getter `{getter_name}` is not a const method; wrapper skipped",
            class.name.godot_ty, property.name
        );
        return TokenStream::new();
    }

    if !types_agree(getter.return_value.as_ref(), &property.type_) {
        warn!(
            "property `{}::{}`: getter `{getter_name}` returns a different type; wrapper skipped",
            class.name.godot_ty, property.name
        );
        return TokenStream::new();
    }

    let index_arg = match property_index_arg(property, &getter.parameters) {
        Ok(index_arg) => index_arg,
        Err(reason) => {
            warn!(
                "property `{}::{}`: {reason}; getter wrapper skipped",
                class.name.godot_ty, property.name
            );
            return TokenStream::new();
        }
    };

    let prop_ident = safe_ident(&property.name);
    let getter_ident = safe_ident(&getter.name);
    let return_decl = property.type_.return_decl();
    let doc = format!("Property `{}` (via `{getter_name}`).", property.name);

    quote! {
        #[doc = #doc]
        pub fn #prop_ident(&self) #return_decl {
            self.#getter_ident(#index_arg)
        }
    }
}

fn types_agree(method_ty: Option<&RustTy>, property_ty: &RustTy) -> bool {
    method_ty.map_or(false, |ty| ty.to_string() == property_ty.to_string())
}

fn make_property_setter(class: &Class, property: &Property) -> TokenStream {
    let Some(setter_name) = property.setter.as_deref() else {
        return TokenStream::new();
    };

    let wrapper_name = format!("set_{}", property.name);
    if setter_name == wrapper_name {
        return TokenStream::new();
    }

    let Some(setter) = class.find_method(setter_name) else {
        warn!(
            "property `{}::{}` references setter `{setter_name}`, which the class does not declare; skipped",
            class.name.godot_ty, property.name
        );
        return TokenStream::new();
    };

    if setter.qualifier != FnQualifier::Mut {
        warn!(
            "property `{}::{}`: setter `{setter_name}` does not take `&mut self`; wrapper skipped",
            class.name.godot_ty, property.name
        );
        return TokenStream::new();
    }

    // The value parameter comes last; an index property passes its index first.
    let expected = if property.index.is_some() { 2 } else { 1 };
    if setter.parameters.len() != expected {
        warn!(
            "property `{}::{}`: setter `{setter_name}` has an unexpected signature; wrapper skipped",
            class.name.godot_ty, property.name
        );
        return TokenStream::new();
    }

    let value_param = &setter.parameters[expected - 1];
    if !types_agree(Some(&value_param.type_), &property.type_) {
        warn!(
            "property `{}::{}`: setter `{setter_name}` takes a different type; wrapper skipped",
            class.name.godot_ty, property.name
        );
        return TokenStream::new();
    }

    let index_arg = match property_index_arg(property, &setter.parameters[..expected - 1]) {
        Ok(index_arg) => index_arg,
        Err(reason) => {
            warn!(
                "property `{}::{}`: {reason}; setter wrapper skipped",
                class.name.godot_ty, property.name
            );
            return TokenStream::new();
        }
    };

    let wrapper_ident = safe_ident(&wrapper_name);
    let setter_ident = safe_ident(&setter.name);
    let ty = &property.type_;
    let doc = format!("Sets property `{}` (via `{setter_name}`).", property.name);

    let args = if property.index.is_some() {
        quote! { #index_arg, value }
    } else {
        quote! { value }
    };

    quote! {
        #[doc = #doc]
        pub fn #wrapper_ident(&mut self, value: #ty) {
            self.#setter_ident(#args)
        }
    }
}

/// Builds the literal index argument for an indexed property, checking the accessor's index
/// parameter is an integer.
fn property_index_arg(
    property: &Property,
    index_params: &[FnParam],
) -> Result<TokenStream, String> {
    let Some(index) = property.index else {
        return if index_params.is_empty() {
            Ok(TokenStream::new())
        } else {
            Err("accessor takes parameters but the property is not indexed".to_string())
        };
    };

    let [index_param] = index_params else {
        return Err("indexed property accessor does not take exactly one index".to_string());
    };

    match &index_param.type_ {
        RustTy::Primitive { kind, .. } => {
            let lit = match kind {
                Primitive::Int {
                    bits: 64,
                    signed: true,
                } => Literal::i64_suffixed(index as i64),
                Primitive::Int {
                    bits: 32,
                    signed: true,
                } => Literal::i32_suffixed(index),
                _ => {
                    return Err("index parameter is not a signed integer".to_string());
                }
            };
            Ok(quote! { #lit })
        }
        RustTy::EngineEnum {
            tokens,
            is_bitfield: false,
        } => {
            let lit = Literal::i32_suffixed(index);
            Ok(quote! { #tokens::from_ord(#lit).expect("property index is a valid enumerator") })
        }
        RustTy::EngineEnum {
            tokens,
            is_bitfield: true,
        } => {
            let lit = Literal::i64_suffixed(index as i64);
            Ok(quote! { #tokens::from_ord(#lit as u64) })
        }
        other => Err(format!("index parameter has unsupported type `{other}`")),
    }
}

fn is_valid_ident(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn make_deref_impl(
    class_name: &proc_macro2::Ident,
    base_ty: &TokenStream,
    has_base: bool,
) -> TokenStream {
    if !has_base {
        return TokenStream::new();
    }

    quote! {
        impl std::ops::Deref for #class_name {
            type Target = #base_ty;

            fn deref(&self) -> &Self::Target {
                // SAFETY: same memory layout; both types wrap a single opaque object pointer.
                unsafe { std::mem::transmute::<&Self, &Self::Target>(self) }
            }
        }

        impl std::ops::DerefMut for #class_name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                // SAFETY: see Deref.
                unsafe { std::mem::transmute::<&mut Self, &mut Self::Target>(self) }
            }
        }
    }
}
