// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Meshpath: interactive shortest-path selection and markup on meshes
//!
//! The user clicks control elements (vertices or faces) on a mesh; the
//! engine keeps one or more paths through them, fills each segment with the
//! host's shortest path, and on apply writes the union as a selection plus
//! edge markup. The host geometry kernel and renderer are reached only
//! through the traits in [`host`].

pub mod editing;
pub mod host;
pub mod model;
pub mod path;
pub mod script;
pub mod settings;

pub use editing::{InteractionAction, Session, SessionState};
pub use host::{EditContext, MeshHost, PathRenderer};
pub use model::{ElementId, ElementKind, ElementMode, ObjectId};
pub use path::{Path, PathFlags};

use anyhow::{Context, Result};
use script::Script;

/// Entry point for the `meshpath` script runner
pub fn run() -> Result<()> {
    // Initialize tracing subscriber (can be controlled via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("meshpath=info".parse().context("Bad log directive")?),
        )
        .init();

    let Some(script_path) = handle_command_line_args() else {
        return Ok(());
    };

    tracing::info!("Running script: {}", script_path.display());
    let outcome = Script::load(&script_path)?.run()?;
    for report in &outcome.reports {
        tracing::info!("{}", report);
    }
    let json = serde_json::to_string_pretty(&outcome).context("Failed to encode outcome")?;
    println!("{}", json);
    Ok(())
}

/// Script path from the command line, if one was given and exists
fn handle_command_line_args() -> Option<std::path::PathBuf> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() <= 1 {
        tracing::error!("Usage: meshpath path/to/script.toml");
        return None;
    }

    let script_path = std::path::PathBuf::from(&args[1]);
    if script_path.exists() {
        Some(script_path)
    } else {
        tracing::error!("Path does not exist: {}", script_path.display());
        tracing::error!("Usage: meshpath path/to/script.toml");
        None
    }
}
