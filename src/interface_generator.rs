/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Extraction of the GDExtension interface function pointers from the C header, and emission of
//! the `GDExtensionInterface` struct.
//!
//! This is not a C parser. The interface header follows a rigid style (a doxygen comment with an
//! `@name` tag, followed by a function-pointer typedef), and only that subset is recognized.
//! Declarations that resemble an interface entry but do not match exactly are reported as
//! warnings rather than silently dropped; the pattern is best-effort, and visibility beats loss.

use proc_macro2::{Ident, Literal, TokenStream};
use quote::quote;
use regex::Regex;
use tracing::warn;

use crate::util::ident;

pub struct GodotFuncPtr {
    /// Proc-address name, e.g. `classdb_get_method_bind`.
    pub name: Ident,

    /// Typedef identifier, e.g. `GDExtensionInterfaceClassdbGetMethodBind`.
    pub func_ptr_ty: Ident,

    /// Raw C return type text.
    pub return_type: String,

    /// Raw C parameter list, as `(type text, name)` pairs.
    pub parameters: Vec<(String, String)>,

    /// Deprecation message, if the doc comment carries an `@deprecated` tag.
    pub deprecated: Option<String>,

    pub doc: String,
}

pub fn parse_function_pointers(header_code: &str) -> Vec<GodotFuncPtr> {
    // See https://docs.rs/regex/latest/regex for docs.
    let regex = Regex::new(
        r#"(?xms)
        # x: ignore whitespace and allow line comments (starting with `#`)
        # m: multi-line mode, ^ and $ match start and end of line
        # s: . matches newlines; would otherwise require (:?\n|\r\n|\r)
        ^
        # Start of comment           /**
        /\*\*
        # followed by any characters
        [^*].*?
        # Identifier                 @name variant_can_convert
        @name\s(?P<name>[a-z0-9_]+)
        (?P<doc>
            .+?
        )
        # End of comment             */
        \*/
        .+?
        # Return type:               typedef GDExtensionBool
        # or pointers with space:    typedef void *
        typedef\s(?P<ret>[^(]+?)
        # Function pointer:          (*GDExtensionInterfaceVariantCanConvert)
        \(\*(?P<type>[A-Za-z0-9_]+?)\)
        # Parameters:                (GDExtensionVariantType p_from, GDExtensionVariantType p_to);
        \s*\((?P<params>[^;]*?)\)\s*;
        # $ omitted, because there can be comments after `;`
    "#,
    )
    .expect("hardcoded regex is valid");

    let mut func_ptrs = vec![];
    for cap in regex.captures_iter(header_code) {
        let (Some(name), Some(funcptr_ty), Some(ret), Some(params), Some(doc)) = (
            cap.name("name"),
            cap.name("type"),
            cap.name("ret"),
            cap.name("params"),
            cap.name("doc"),
        ) else {
            // Skip unparseable ones, instead of breaking the run (could just be a /** */
            // comment around something else).
            continue;
        };

        let doc_text = doc.as_str();
        let parameters = match parse_parameter_list(params.as_str()) {
            Ok(parameters) => parameters,
            Err(parameter) => {
                warn!(
                    "interface function `{}`: cannot split parameter `{}`; declaration skipped",
                    name.as_str(),
                    parameter
                );
                continue;
            }
        };

        func_ptrs.push(GodotFuncPtr {
            name: ident(name.as_str()),
            func_ptr_ty: ident(funcptr_ty.as_str()),
            return_type: ret.as_str().trim().to_string(),
            parameters,
            deprecated: extract_deprecation(doc_text),
            doc: doc_text.replace("\n *", "\n").trim().to_string(),
        });
    }

    // Near-miss detection: a doc comment announcing a @name for which no typedef matched.
    let announce_regex =
        Regex::new(r"@name\s([a-z0-9_]+)").expect("hardcoded regex is valid");
    for cap in announce_regex.captures_iter(header_code) {
        let announced = &cap[1];
        if !func_ptrs.iter().any(|f| f.name == announced) {
            warn!(
                "header announces interface function `{announced}`, \
                 but no matching function-pointer typedef was recognized"
            );
        }
    }

    let mut seen = std::collections::HashSet::new();
    for func_ptr in func_ptrs.iter() {
        if !seen.insert(func_ptr.name.to_string()) {
            warn!("duplicate interface function `{}` in header", func_ptr.name);
        }
    }

    func_ptrs
}

/// Splits `GDExtensionVariantType p_from, GDExtensionVariantType p_to` into type/name pairs.
///
/// Returns the offending parameter text if one has no name token (the interface style always
/// names parameters; `void` stands for an empty list).
fn parse_parameter_list(params: &str) -> Result<Vec<(String, String)>, String> {
    let params = params.trim();
    if params.is_empty() || params == "void" {
        return Ok(vec![]);
    }

    let mut result = vec![];
    for param in params.split(',') {
        let param = param.trim();

        // The name is the last identifier; everything before it (plus trailing stars) is type.
        let name_start = param
            .rfind(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .map(|i| i + 1)
            .filter(|i| *i < param.len())
            .ok_or_else(|| param.to_string())?;

        let (ty, name) = param.split_at(name_start);
        let ty = ty.trim();
        if ty.is_empty() {
            return Err(param.to_string());
        }

        result.push((ty.to_string(), name.to_string()));
    }

    Ok(result)
}

fn extract_deprecation(doc: &str) -> Option<String> {
    for line in doc.lines() {
        if let Some(message) = line.trim_start_matches(" *").trim().strip_prefix("@deprecated ") {
            return Some(message.trim().to_string());
        }
    }
    None
}

// ----------------------------------------------------------------------------------------------------------------------------------------------
// Code generation

/// Emits the typedef aliases, the `GDExtensionInterface` struct and its loader.
pub fn make_interface_code(func_ptrs: &[GodotFuncPtr]) -> TokenStream {
    let mut alias_decls = vec![];
    let mut fptr_decls = vec![];
    let mut fptr_inits = vec![];

    for fptr in func_ptrs {
        let GodotFuncPtr {
            name,
            func_ptr_ty,
            return_type,
            parameters,
            deprecated,
            doc,
        } = fptr;

        let Some(ret) = c_type_to_rust(return_type, true) else {
            warn!(
                "interface function `{name}`: unrecognized return type `{return_type}`; \
                 declaration skipped"
            );
            continue;
        };

        let mut param_types = Vec::with_capacity(parameters.len());
        let mut unknown_param = None;
        for (c_ty, _param_name) in parameters {
            match c_type_to_rust(c_ty, false) {
                Some(ty) => param_types.push(ty),
                None => {
                    unknown_param = Some(c_ty.clone());
                    break;
                }
            }
        }

        if let Some(c_ty) = unknown_param {
            warn!(
                "interface function `{name}`: unrecognized parameter type `{c_ty}`; \
                 declaration skipped"
            );
            continue;
        }

        let deprecated_attr = deprecated.as_ref().map(|note| {
            quote! { #[deprecated = #note] }
        });

        alias_decls.push(quote! {
            pub type #func_ptr_ty =
                Option<unsafe extern "C" fn( #( #param_types ),* ) -> #ret>;
        });

        let name_str = Literal::byte_string(format!("{name}\0").as_bytes());

        fptr_decls.push(quote! {
            #[doc = #doc]
            #deprecated_attr
            pub #name: #func_ptr_ty,
        });

        // SAFETY: transmute relies on Option<F1> and Option<F2> having the same layout.
        fptr_inits.push(quote! {
            #name: std::mem::transmute::<GDExtensionInterfaceFunctionPtr, #func_ptr_ty>(
                get_proc_address(c_str(#name_str))
            ),
        });
    }

    // Do not derive Copy -- even though the struct is bitwise-copyable, this is rarely needed
    // and may point to an error.
    quote! {
        pub struct GDExtensionInterface {
            #( #fptr_decls )*
        }

        impl GDExtensionInterface {
            /// Loads every interface function through `get_proc_address`.
            ///
            /// # Safety
            /// `get_proc_address` must be the loader handed to the extension entry point.
            pub unsafe fn load(get_proc_address: GDExtensionInterfaceGetProcAddress) -> Self {
                let get_proc_address = get_proc_address.expect("invalid get_proc_address function pointer");

                Self {
                    #( #fptr_inits )*
                }
            }
        }

        fn c_str(s: &[u8]) -> *const std::os::raw::c_char {
            s.as_ptr() as *const std::os::raw::c_char
        }

        #( #alias_decls )*
    }
}

/// Emits the fixed typedefs of the interface header that are not function pointers.
///
/// These mappings mirror the header's own `typedef` vocabulary: handle types are opaque
/// pointers, `GDExtensionBool`/`GDExtensionInt` are fixed-width scalars, and the C enums travel
/// as `i32`.
pub fn make_sys_alias_code() -> TokenStream {
    quote! {
        use std::ffi::c_void;

        // Hand-written interop support of the runtime crate (method-bind loading, ptrcall and
        // varcall helpers, the string-name cache), re-exported so generated code reaches
        // everything through `sys::`.
        pub use crate::interop::*;

        pub type GDExtensionBool = u8;
        pub type GDExtensionInt = i64;
        pub type GDObjectInstanceID = u64;

        pub type GDExtensionVariantType = i32;
        pub type GDExtensionVariantOperator = i32;
        pub type GDExtensionCallErrorType = i32;
        pub type GDExtensionInitializationLevel = i32;

        pub type GDExtensionVariantPtr = *mut c_void;
        pub type GDExtensionConstVariantPtr = *const c_void;
        pub type GDExtensionUninitializedVariantPtr = *mut c_void;
        pub type GDExtensionStringNamePtr = *mut c_void;
        pub type GDExtensionConstStringNamePtr = *const c_void;
        pub type GDExtensionUninitializedStringNamePtr = *mut c_void;
        pub type GDExtensionStringPtr = *mut c_void;
        pub type GDExtensionConstStringPtr = *const c_void;
        pub type GDExtensionUninitializedStringPtr = *mut c_void;
        pub type GDExtensionObjectPtr = *mut c_void;
        pub type GDExtensionConstObjectPtr = *const c_void;
        pub type GDExtensionUninitializedObjectPtr = *mut c_void;
        pub type GDExtensionTypePtr = *mut c_void;
        pub type GDExtensionConstTypePtr = *const c_void;
        pub type GDExtensionUninitializedTypePtr = *mut c_void;
        pub type GDExtensionMethodBindPtr = *mut c_void;
        pub type GDExtensionRefPtr = *mut c_void;
        pub type GDExtensionConstRefPtr = *const c_void;
        pub type GDExtensionClassLibraryPtr = *mut c_void;
        pub type GDExtensionClassInstancePtr = *mut c_void;

        pub type GDExtensionInterfaceFunctionPtr = Option<unsafe extern "C" fn()>;
        pub type GDExtensionInterfaceGetProcAddress = Option<
            unsafe extern "C" fn(*const std::os::raw::c_char) -> GDExtensionInterfaceFunctionPtr,
        >;
    }
}

/// Maps a raw C type text to Rust tokens, or `None` if the vocabulary is unknown.
///
/// Pointer-to-unknown-struct types degrade to opaque `c_void` pointers; an unknown base type
/// that is not behind a pointer cannot be sized and is rejected.
fn c_type_to_rust(c_ty: &str, is_return: bool) -> Option<TokenStream> {
    let mut base = c_ty.trim();
    let mut pointer_depth = 0usize;

    while let Some(stripped) = base.strip_suffix('*') {
        pointer_depth += 1;
        base = stripped.trim_end();
    }

    let is_const = base.starts_with("const ");
    base = base.trim_start_matches("const ").trim();

    let base_tokens = match base {
        "void" if pointer_depth == 0 => {
            return if is_return { Some(quote! { () }) } else { None };
        }
        "void" => quote! { std::ffi::c_void },
        "char" => quote! { std::os::raw::c_char },
        "char16_t" => quote! { u16 },
        "char32_t" => quote! { u32 },
        "wchar_t" => quote! { u32 },
        "uint8_t" => quote! { u8 },
        "uint16_t" => quote! { u16 },
        "uint32_t" => quote! { u32 },
        "uint64_t" => quote! { u64 },
        "int8_t" => quote! { i8 },
        "int16_t" => quote! { i16 },
        "int32_t" => quote! { i32 },
        "int64_t" => quote! { i64 },
        "size_t" => quote! { usize },
        "int" => quote! { i32 },
        "float" => quote! { f32 },
        "double" => quote! { f64 },
        known if known.starts_with("GDExtension") || known == "GDObjectInstanceID" => {
            if is_known_sys_typedef(known) {
                let ident = ident(known);
                quote! { #ident }
            } else if pointer_depth > 0 {
                // Struct types like GDExtensionClassCreationInfo are only passed by pointer;
                // opaque is sufficient for loading the interface.
                pointer_depth -= 1;
                if is_const {
                    quote! { *const std::ffi::c_void }
                } else {
                    quote! { *mut std::ffi::c_void }
                }
            } else {
                return None;
            }
        }
        _ => return None,
    };

    let mut tokens = base_tokens;
    for level in 0..pointer_depth {
        // `const` binds to the innermost pointer level.
        if is_const && level == 0 {
            tokens = quote! { *const #tokens };
        } else {
            tokens = quote! { *mut #tokens };
        }
    }

    Some(tokens)
}

fn is_known_sys_typedef(name: &str) -> bool {
    matches!(
        name,
        "GDExtensionBool"
            | "GDExtensionInt"
            | "GDObjectInstanceID"
            | "GDExtensionVariantType"
            | "GDExtensionVariantOperator"
            | "GDExtensionCallErrorType"
            | "GDExtensionInitializationLevel"
            | "GDExtensionVariantPtr"
            | "GDExtensionConstVariantPtr"
            | "GDExtensionUninitializedVariantPtr"
            | "GDExtensionStringNamePtr"
            | "GDExtensionConstStringNamePtr"
            | "GDExtensionUninitializedStringNamePtr"
            | "GDExtensionStringPtr"
            | "GDExtensionConstStringPtr"
            | "GDExtensionUninitializedStringPtr"
            | "GDExtensionObjectPtr"
            | "GDExtensionConstObjectPtr"
            | "GDExtensionUninitializedObjectPtr"
            | "GDExtensionTypePtr"
            | "GDExtensionConstTypePtr"
            | "GDExtensionUninitializedTypePtr"
            | "GDExtensionMethodBindPtr"
            | "GDExtensionRefPtr"
            | "GDExtensionConstRefPtr"
            | "GDExtensionClassLibraryPtr"
            | "GDExtensionClassInstancePtr"
            | "GDExtensionInterfaceFunctionPtr"
            | "GDExtensionInterfaceGetProcAddress"
    )
}

#[test]
fn test_parse_function_pointers() {
    let header_code = r#"
/* INTERFACE: ClassDB */

/**
 * @name classdb_get_method_bind
 *
 * Gets a pointer to the MethodBind in ClassDB for the given class, method and hash.
 *
 * @param p_classname A pointer to a StringName with the class name.
 * @param p_methodname A pointer to a StringName with the method name.
 * @param p_hash A hash representing the method signature.
 *
 * @return A pointer to the MethodBind from ClassDB.
 */
typedef GDExtensionMethodBindPtr (*GDExtensionInterfaceClassdbGetMethodBind)(GDExtensionConstStringNamePtr p_classname, GDExtensionConstStringNamePtr p_methodname, GDExtensionInt p_hash);
        "#;

    let func_ptrs = parse_function_pointers(header_code);
    assert_eq!(func_ptrs.len(), 1);

    let func_ptr = &func_ptrs[0];
    assert_eq!(func_ptr.name.to_string(), "classdb_get_method_bind");
    assert_eq!(
        func_ptr.func_ptr_ty.to_string(),
        "GDExtensionInterfaceClassdbGetMethodBind"
    );
    assert_eq!(func_ptr.return_type, "GDExtensionMethodBindPtr");

    let params: Vec<(&str, &str)> = func_ptr
        .parameters
        .iter()
        .map(|(ty, name)| (ty.as_str(), name.as_str()))
        .collect();
    assert_eq!(
        params,
        vec![
            ("GDExtensionConstStringNamePtr", "p_classname"),
            ("GDExtensionConstStringNamePtr", "p_methodname"),
            ("GDExtensionInt", "p_hash"),
        ]
    );

    assert!(func_ptr.doc.contains("Gets a pointer to the MethodBind"));
    assert!(func_ptr.deprecated.is_none());
}

#[test]
fn test_parse_parameter_list_rejects_unnamed() {
    assert!(parse_parameter_list("GDExtensionInt").is_err());
    assert_eq!(parse_parameter_list("void").unwrap(), vec![]);
    assert_eq!(
        parse_parameter_list("const char *p_data, size_t p_size").unwrap(),
        vec![
            ("const char *".to_string(), "p_data".to_string()),
            ("size_t".to_string(), "p_size".to_string()),
        ]
    );
}
