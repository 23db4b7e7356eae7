/*
 * Copyright (c) godot-rust; Bromeon and contributors.
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! CLI entry point for godot-bindgen.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use godot_bindgen::{generate, GenerateOptions};

/// godot-bindgen — generate Rust bindings from Godot's extension API dump.
#[derive(Parser, Debug)]
#[command(name = "godot-bindgen", version, about)]
struct Cli {
    /// Path to the extension API dump JSON file.
    #[arg(long = "extension-api")]
    extension_api: PathBuf,

    /// Path to the extension interface header file.
    #[arg(long = "extension-interface")]
    extension_interface: PathBuf,

    /// Directory where the Rust bindings will be generated.
    #[arg(short, long, default_value = "generated")]
    output: PathBuf,

    /// Directory where the binding tests will be generated.
    #[arg(long = "test-output")]
    test_output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("godot_bindgen=info")),
        )
        .init();

    let cli = Cli::parse();

    generate(&GenerateOptions {
        extension_api: cli.extension_api,
        extension_interface: cli.extension_interface,
        output_dir: cli.output,
        test_output_dir: cli.test_output,
    })?;

    Ok(())
}
