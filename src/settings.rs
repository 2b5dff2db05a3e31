// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Session settings and configuration constants.
//!
//! Compile-time defaults live at the top of this file and are re-exported
//! through the small public modules below. Runtime preferences (undo depth,
//! distance metric, commit markup) are read from TOML into [`Preferences`];
//! any key missing from the file falls back to these defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// HISTORY SETTINGS
// ============================================================================
/// Undo steps kept when the host does not configure a depth
const DEFAULT_UNDO_STEPS: usize = 32;

/// Smallest usable history (the initial state plus one edit)
const MIN_UNDO_STEPS: usize = 2;

// ============================================================================
// ISLAND SETTINGS
// ============================================================================
/// Upper bound on select-linked / select-more growth passes per island
const ISLAND_GROWTH_PASS_LIMIT: usize = 4096;

/// Whether island growth stops at normal flips by default
const DELIMIT_BY_NORMAL: bool = true;

// ============================================================================
// PUBLIC API - Don't edit below this line unless you know what you're doing
// ============================================================================

/// Undo history settings
pub mod history {
    /// Default undo depth
    pub const DEFAULT_STEPS: usize = super::DEFAULT_UNDO_STEPS;

    /// Minimum undo depth
    pub const MIN_STEPS: usize = super::MIN_UNDO_STEPS;
}

/// Island resolver settings
pub mod island {
    /// Growth pass limit
    pub const GROWTH_PASS_LIMIT: usize = super::ISLAND_GROWTH_PASS_LIMIT;

    /// Default normal delimiting
    pub const DELIMIT_BY_NORMAL: bool = super::DELIMIT_BY_NORMAL;
}

// ============================================================================
// RUNTIME PREFERENCES
// ============================================================================

/// Errors raised while loading preferences
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read preferences from {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid preferences: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How the committed elements change the host selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectMark {
    #[default]
    Extend,
    Subtract,
    Invert,
    None,
}

/// How committed edges change a boolean edge attribute (seam, sharp)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMark {
    Set,
    Clear,
    Toggle,
    #[default]
    None,
}

/// Markup written to the mesh on apply
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkOptions {
    pub select: SelectMark,
    pub seam: EdgeMark,
    pub sharp: EdgeMark,
}

/// Runtime preferences for an editing session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Undo steps kept by the session history
    pub undo_steps: usize,

    /// Whether new paths measure distance in edge hops
    pub default_topology_distance: bool,

    /// Whether islands stop at normal flips
    pub delimit_by_normal: bool,

    pub mark: MarkOptions,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            undo_steps: history::DEFAULT_STEPS,
            default_topology_distance: false,
            delimit_by_normal: island::DELIMIT_BY_NORMAL,
            mark: MarkOptions::default(),
        }
    }
}

impl Preferences {
    /// Parse preferences from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let prefs: Preferences = toml::from_str(text)?;
        Ok(prefs.normalized())
    }

    /// Load preferences from a TOML file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Clamp values the engine cannot work with
    pub fn normalized(mut self) -> Self {
        if self.undo_steps < history::MIN_STEPS {
            tracing::warn!(
                "undo_steps = {} is too small, using {}",
                self.undo_steps,
                history::MIN_STEPS
            );
            self.undo_steps = history::MIN_STEPS;
        }
        self
    }
}
