/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Offline generator for Rust bindings to the Godot GDExtension API.
//!
//! The pipeline runs once per invocation against a fixed snapshot of the extension API dump and
//! the interface header: deserialize strictly, map and validate the whole model, extract the
//! interface declarations, produce every output file in memory, and only then replace the
//! previous output directory. A failure anywhere leaves the old output untouched; partial
//! bindings are never written.

mod context;
mod conv;
mod errors;
mod format_parser;
mod generator;
mod interface_generator;
mod models;
mod util;

#[cfg(test)]
mod tests;

use std::fs;
use std::path::{Path, PathBuf};

use quote::quote;
use tracing::{debug, info};

use crate::context::Context;
use crate::generator::{
    central_files, classes, method_tables, native_structures, test_files, utility_functions,
};
use crate::models::domain::ExtensionApi;
use crate::models::json::load_extension_api;
use crate::util::GeneratedFile;

pub use crate::errors::BindgenError;

/// Inputs and outputs of one generation run.
pub struct GenerateOptions {
    /// Path to the extension API dump JSON file.
    pub extension_api: PathBuf,

    /// Path to the GDExtension interface header.
    pub extension_interface: PathBuf,

    /// Directory receiving the generated sources; deleted and rewritten on success.
    pub output_dir: PathBuf,

    /// Optional directory receiving a generated test file.
    pub test_output_dir: Option<PathBuf>,
}

pub fn generate(options: &GenerateOptions) -> Result<(), BindgenError> {
    let json = read_input(&options.extension_api)?;
    let json_api = load_extension_api(&json)?;
    info!(
        "parsed extension API dump for `{}`",
        json_api.header.version_full_name
    );

    let header_code = read_input(&options.extension_interface)?;

    let mut ctx = Context::build_from_api(&json_api)?;
    let api = ExtensionApi::from_json(&json_api, &mut ctx)?;

    let func_ptrs = interface_generator::parse_function_pointers(&header_code);
    if func_ptrs.is_empty() {
        return Err(BindgenError::EmptyInterfaceHeader {
            path: options.extension_interface.clone(),
        });
    }
    debug!(
        "extracted {} interface function declarations",
        func_ptrs.len()
    );

    // Produce everything before touching the output directory.
    let mut files = vec![
        GeneratedFile::new("mod.rs", central_files::make_mod_code()),
        GeneratedFile::new("sys.rs", make_sys_code(&api, &func_ptrs)),
        GeneratedFile::new("global.rs", central_files::make_global_code(&api)),
        GeneratedFile::new("tables.rs", method_tables::make_method_table_file(&api)),
        GeneratedFile::new("utilities.rs", utility_functions::make_utilities_code(&api)),
    ];
    files.extend(classes::make_class_files(&api, &ctx)?);
    files.extend(native_structures::make_native_structure_files(&api, &mut ctx)?);

    replace_output_dir(&options.output_dir, files)?;
    info!(
        "generated bindings for `{}` into `{}`",
        api.godot_version.version_string,
        options.output_dir.display()
    );

    if let Some(test_dir) = &options.test_output_dir {
        let tests = test_files::make_generated_tests(&api);
        util::submit(&test_dir.join("generated_tests.rs"), tests)?;
        info!("generated binding tests into `{}`", test_dir.display());
    }

    Ok(())
}

fn make_sys_code(
    api: &ExtensionApi,
    func_ptrs: &[interface_generator::GodotFuncPtr],
) -> proc_macro2::TokenStream {
    let aliases = interface_generator::make_sys_alias_code();
    let central = central_files::make_sys_central_code(api);
    let interface = interface_generator::make_interface_code(func_ptrs);

    quote! {
        #![doc = "Low-level interface: typedef aliases, Variant type tags and the function table."]

        #aliases
        #central
        #interface
    }
}

fn read_input(path: &Path) -> Result<String, BindgenError> {
    fs::read_to_string(path).map_err(|source| BindgenError::ReadInput {
        path: path.to_path_buf(),
        source,
    })
}

/// Deletes the previous output and writes the new files, so that members removed from the API
/// never linger from an earlier engine version.
fn replace_output_dir(output_dir: &Path, files: Vec<GeneratedFile>) -> Result<(), BindgenError> {
    if output_dir.exists() {
        fs::remove_dir_all(output_dir).map_err(|source| BindgenError::WriteOutput {
            path: output_dir.to_path_buf(),
            source,
        })?;
    }

    for GeneratedFile { path, tokens } in files {
        util::submit(&output_dir.join(path), tokens)?;
    }

    Ok(())
}
