// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Abstract actions the interaction layer dispatches

use serde::{Deserialize, Serialize};

/// What an input event asks the session to do
///
/// The host's keymap maps raw events to these; the session never sees
/// mouse buttons or keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionAction {
    /// Press on an element: extend, insert into, or switch paths
    AddControlPoint,

    /// Press with the new-path modifier: always start a new path
    AddNewPath,

    /// Remove the control element under the cursor
    RemoveControlPoint,

    /// Pointer moved while a control element is held
    DragControlPoint,

    /// Pointer released: resolve doubles, join paths, record history
    ReleasePath,

    ChangeDirection,
    ToggleClosed,
    ToggleTopologyDistance,
    Undo,
    Redo,

    /// Commit all paths to the mesh and end the session
    Apply,

    /// End the session without committing
    Cancel,
}

impl InteractionAction {
    /// Whether the action needs a resolved element under the cursor
    pub fn needs_element(self) -> bool {
        matches!(
            self,
            Self::AddControlPoint
                | Self::AddNewPath
                | Self::RemoveControlPoint
                | Self::DragControlPoint
        )
    }

    /// Whether a successful run of the action changes path structure
    pub fn mutates_paths(self) -> bool {
        !matches!(self, Self::Apply | Self::Cancel)
    }
}
