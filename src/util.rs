/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::path::Path;

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use crate::errors::BindgenError;

pub fn ident(s: &str) -> Ident {
    format_ident!("{}", s)
}

#[rustfmt::skip]
pub fn safe_ident(s: &str) -> Ident {
    // See also: https://doc.rust-lang.org/reference/keywords.html
    match s {
        // Lexer
        | "as" | "break" | "const" | "continue" | "crate" | "else" | "enum" | "extern" | "false" | "fn" | "for" | "if"
        | "impl" | "in" | "let" | "loop" | "match" | "mod" | "move" | "mut" | "pub" | "ref" | "return" | "self" | "Self"
        | "static" | "struct" | "super" | "trait" | "true" | "type" | "unsafe" | "use" | "where" | "while"

        // Lexer 2018+
        | "async" | "await" | "dyn"

        // Reserved
        | "abstract" | "become" | "box" | "do" | "final" | "macro" | "override" | "priv" | "typeof" | "unsized" | "virtual" | "yield"

        // Reserved 2018+
        | "try"
           => format_ident!("{}_", s),

         _ => ident(s)
    }
}

pub fn option_as_slice<T>(option: &Option<Vec<T>>) -> &[T] {
    option.as_ref().map_or(&[], Vec::as_slice)
}

/// Imports preceding every generated file. The generated code compiles inside the runtime
/// crate, which provides the builtin value types, `Gd` and the interop helpers.
pub fn make_imports() -> TokenStream {
    quote! {
        use crate::builtin::*;
        use crate::obj::Gd;
        use crate::sys;
    }
}

/// One generated source file, staged before anything is written to disk.
pub struct GeneratedFile {
    /// Path relative to the output directory.
    pub path: std::path::PathBuf,
    pub tokens: TokenStream,
}

impl GeneratedFile {
    pub fn new(path: impl Into<std::path::PathBuf>, tokens: TokenStream) -> Self {
        Self {
            path: path.into(),
            tokens,
        }
    }
}

pub fn write_file(path: &Path, contents: String) -> Result<(), BindgenError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| BindgenError::WriteOutput {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    std::fs::write(path, contents).map_err(|source| BindgenError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a token stream as a source file.
pub fn submit(path: &Path, tokens: TokenStream) -> Result<(), BindgenError> {
    write_file(path, tokens.to_string())
}
