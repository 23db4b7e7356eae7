/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Error taxonomy of the generator.
//!
//! Everything except header-extraction ambiguities (which are logged as warnings) is fatal for
//! the whole run: generation is all-or-nothing, and a malformed input reproduces the identical
//! error on retry.

use std::path::PathBuf;

use thiserror::Error;

use crate::format_parser::LayoutError;

#[derive(Debug, Error)]
pub enum BindgenError {
    #[error("failed to read `{path}`: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write `{path}`: {source}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Strict deserialization failure; includes unknown properties (schema drift) and the
    /// contradictory/incomplete constant encodings rejected by the custom converter.
    #[error("malformed extension API dump: {source}")]
    ApiSchema {
        #[from]
        source: serde_json::Error,
    },

    /// The dump deserialized, but violates a shape assumption the generator depends on
    /// (e.g. the `Variant.Type` enum is absent).
    #[error("unexpected extension API dump shape: {message}")]
    SchemaDrift { message: String },

    #[error("native structure `{structure}`, field #{field_index}: {source}")]
    StructureLayout {
        structure: String,
        field_index: usize,
        #[source]
        source: LayoutError,
    },

    /// A type name that matches no resolution rule. Never downgraded to a best-guess mapping:
    /// a wrong marshalling kind corrupts memory or fails at native call time.
    #[error("cannot resolve type `{ty}` for {member}")]
    UnresolvedType { ty: String, member: String },

    #[error("class `{class}` inherits `{base}`, which is not present in the extension API dump")]
    MissingBaseClass { class: String, base: String },

    #[error("duplicate class `{class}` in extension API dump")]
    DuplicateClass { class: String },

    /// Non-virtual methods must carry the hash used for the method-bind lookup; its absence
    /// means the dump is from an engine this generator does not understand.
    #[error("non-virtual method `{class}::{method}` has no hash in the extension API dump")]
    MissingMethodHash { class: String, method: String },

    #[error(
        "no interface function declarations found in `{path}`; \
         expected the GDExtension interface header"
    )]
    EmptyInterfaceHeader { path: PathBuf },
}
