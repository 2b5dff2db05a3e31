// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Scripted sessions against the reference host
//!
//! A script describes a grid mesh, the session mode and preferences, and a
//! list of actions with element indices. Running it replays the actions
//! through a [`Session`] exactly as a host would deliver them.

use crate::editing::{CommitMap, InteractionAction, Report, Session, SessionState};
use crate::host::{EditContext, GraphMesh, RecordingRenderer};
use crate::model::{ElementId, ElementKind, ElementMode, ObjectId};
use crate::settings::Preferences;
use anyhow::{Context, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// SCRIPT FORMAT
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct GridSpec {
    pub cols: u32,
    pub rows: u32,
}

/// One input event
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub action: InteractionAction,
    /// Index of the element under the cursor, of the mode's control kind
    #[serde(default)]
    pub element: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub mode: ElementMode,
    pub grid: GridSpec,
    /// Element the session starts on
    pub start: u32,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// What a script run produced
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub state: &'static str,
    pub paths: usize,
    pub reports: Vec<Report>,
    /// Payload handed to the mesh, keyed by object index
    pub commit: CommitMap,
}

impl Script {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let script: Script = toml::from_str(text).context("Failed to parse script")?;
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script: {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Invalid script: {}", path.display()))
    }

    fn element(&self, object: ObjectId, index: u32) -> ElementId {
        match self.mode.control_kind() {
            ElementKind::Face => ElementId::face(object, index),
            _ => ElementId::vertex(object, index),
        }
    }

    /// Replay the script on a fresh grid
    ///
    /// The commit is the one written on apply, or what apply would write
    /// if the script leaves the session running.
    pub fn run(&self) -> Result<Outcome> {
        let mut mesh = GraphMesh::new();
        let object = mesh
            .add_grid(self.grid.cols, self.grid.rows, Vec3::ZERO)
            .context("Failed to build grid mesh")?;
        let mut renderer = RecordingRenderer::new();
        let mut ctx = EditContext::new(&mut mesh, &mut renderer);

        let start = self.element(object, self.start);
        let Some(mut session) =
            Session::begin(&mut ctx, self.mode, Some(start), self.preferences.clone())?
        else {
            anyhow::bail!("Session did not start on {}", start);
        };

        let mut commit = None;
        for (number, step) in self.steps.iter().enumerate() {
            let element = step.element.map(|index| self.element(object, index));
            if step.action == InteractionAction::Apply {
                commit = Some(session.flattened_commit(&*ctx.host));
            }
            let state = session.handle_action(&mut ctx, step.action, element);
            tracing::debug!("step {}: {:?} -> {:?}", number + 1, step.action, state);
            if state != SessionState::Running {
                if number + 1 < self.steps.len() {
                    tracing::warn!(
                        "Session ended at step {}, {} step(s) ignored",
                        number + 1,
                        self.steps.len() - number - 1
                    );
                }
                break;
            }
        }

        let commit = match (session.state(), commit) {
            (SessionState::ApplyRequested, Some(commit)) => commit,
            (SessionState::Running, _) => session.flattened_commit(&*ctx.host),
            _ => CommitMap::new(),
        };
        let state = match session.state() {
            SessionState::Running => "running",
            SessionState::Cancelled => "cancelled",
            SessionState::ApplyRequested => "applied",
        };

        Ok(Outcome {
            state,
            paths: session.paths().len(),
            reports: session.drain_reports(),
            commit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOOP: &str = r#"
        mode = "vertex_edge"
        start = 0

        [grid]
        cols = 5
        rows = 5

        [preferences.mark]
        seam = "set"

        [[steps]]
        action = "release_path"

        [[steps]]
        action = "add_control_point"
        element = 4

        [[steps]]
        action = "release_path"

        [[steps]]
        action = "add_control_point"
        element = 24

        [[steps]]
        action = "release_path"

        [[steps]]
        action = "toggle_closed"

        [[steps]]
        action = "apply"
    "#;

    #[test]
    fn closed_loop_script() {
        let outcome = Script::from_toml_str(LOOP).unwrap().run().unwrap();
        assert_eq!(outcome.state, "applied");
        assert_eq!(outcome.paths, 1);
        let commit = &outcome.commit[&ObjectId(0)];
        // 4 along the bottom, 4 up the side, and a closing fill back
        assert!(commit.select.len() >= 12);
        assert_eq!(commit.select, commit.markup);
    }

    #[test]
    fn undo_past_start_cancels() {
        let text = r#"
            start = 3
            steps = [
                { action = "release_path" },
                { action = "undo" },
                { action = "add_control_point", element = 7 },
            ]

            [grid]
            cols = 3
            rows = 3
        "#;
        let outcome = Script::from_toml_str(text).unwrap().run().unwrap();
        assert_eq!(outcome.state, "cancelled");
        assert!(outcome.commit.is_empty());
    }

    #[test]
    fn rejects_bad_action() {
        let text = r#"
            start = 0
            steps = [{ action = "explode" }]

            [grid]
            cols = 3
            rows = 3
        "#;
        assert!(Script::from_toml_str(text).is_err());
    }

    #[test]
    fn bad_start_is_an_error() {
        let text = r#"
            start = 40

            [grid]
            cols = 3
            rows = 3
        "#;
        assert!(Script::from_toml_str(text).unwrap().run().is_err());
    }

    #[test]
    fn outcome_serializes() {
        let outcome = Script::from_toml_str(LOOP).unwrap().run().unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["state"], "applied");
        assert!(json["commit"]["0"]["select"].is_array());
    }
}
