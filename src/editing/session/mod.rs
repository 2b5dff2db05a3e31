// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Edit session: one modal path-editing run from first click to apply.
//!
//! The session owns the path set and its history and maps each
//! [`InteractionAction`] onto a path-set operation. It is driven one event
//! at a time by the host; every call receives the host collaborators
//! through an [`EditContext`] and returns the resulting [`SessionState`].

mod shared;

pub use shared::{SharedSession, read_session, share_session, write_session};

use super::action::InteractionAction;
use super::commit::CommitMap;
use super::path_set::PathSet;
use super::report::Report;
use super::undo::UndoState;
use crate::host::{EditContext, MeshHost};
use crate::model::{ElementId, ElementKind, ElementMode};
use crate::path::Path;
use crate::settings::Preferences;
use thiserror::Error;

/// Where the session stands after an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    /// Ended without touching the mesh
    Cancelled,
    /// Ended after committing the paths to the mesh
    ApplyRequested,
}

/// Elements the session cannot work with
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("{element} is not a {expected:?} element")]
    WrongElementKind {
        element: ElementId,
        expected: ElementKind,
    },

    #[error("{element} is not part of the mesh")]
    UnknownElement { element: ElementId },
}

/// Path-set state recorded after each release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub active: usize,
    pub paths: Vec<Path>,
}

impl HistoryEntry {
    fn capture(path_set: &PathSet) -> Self {
        Self {
            active: path_set.active_index(),
            paths: path_set.snapshot(),
        }
    }
}

/// Check that `element` exists and has the control kind of `mode`
pub fn validate_element(
    host: &dyn MeshHost,
    mode: ElementMode,
    element: ElementId,
) -> Result<ElementId, SessionError> {
    let expected = mode.control_kind();
    if element.kind != expected {
        return Err(SessionError::WrongElementKind { element, expected });
    }
    if !host.contains(element) {
        return Err(SessionError::UnknownElement { element });
    }
    Ok(element)
}

#[derive(Debug)]
pub struct Session {
    prefs: Preferences,
    path_set: PathSet,
    history: UndoState<HistoryEntry>,
    state: SessionState,
    reports: Vec<Report>,
}

impl Session {
    /// Start a session on `initial`, or on the element under the cursor
    ///
    /// Returns `Ok(None)` when there is nothing to start on, which the
    /// host treats as a cancelled start. The first control point is held,
    /// so the host's next release records the first history entry.
    pub fn begin(
        ctx: &mut EditContext<'_>,
        mode: ElementMode,
        initial: Option<ElementId>,
        prefs: Preferences,
    ) -> Result<Option<Self>, SessionError> {
        let Some(element) = initial.or_else(|| ctx.host.element_under_cursor(mode)) else {
            tracing::debug!("[Session] nothing under the cursor, not starting");
            return Ok(None);
        };
        let element = validate_element(&*ctx.host, mode, element)?;

        let prefs = prefs.normalized();
        let mut path_set = PathSet::new(mode, &prefs);
        path_set.add_new_path(ctx, element);

        tracing::info!("Path session started at {} ({:?})", element, mode);
        Ok(Some(Self {
            history: UndoState::with_capacity(prefs.undo_steps),
            prefs,
            path_set,
            state: SessionState::Running,
            reports: Vec::new(),
        }))
    }

    // ===== Queries =====

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn mode(&self) -> ElementMode {
        self.path_set.mode()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn path_set(&self) -> &PathSet {
        &self.path_set
    }

    pub fn paths(&self) -> &[Path] {
        self.path_set.paths()
    }

    pub fn active_path(&self) -> Option<&Path> {
        self.path_set.active_path()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.undo_len()
    }

    /// What applying now would write to the mesh
    pub fn flattened_commit(&self, host: &dyn MeshHost) -> CommitMap {
        self.path_set.flatten_for_commit(host)
    }

    /// Take the reports queued since the last call
    pub fn drain_reports(&mut self) -> Vec<Report> {
        self.collect_reports();
        std::mem::take(&mut self.reports)
    }

    // ===== Dispatch =====

    /// Run one action
    ///
    /// `element` overrides the host's element under the cursor for actions
    /// that need one. Once the session has ended, further actions are
    /// ignored.
    pub fn handle_action(
        &mut self,
        ctx: &mut EditContext<'_>,
        action: InteractionAction,
        element: Option<ElementId>,
    ) -> SessionState {
        if self.state != SessionState::Running {
            tracing::debug!("[Session] {:?} ignored, session has ended", action);
            return self.state;
        }

        let target = if action.needs_element() {
            match self.resolve_element(ctx, element) {
                Some(target) => Some(target),
                None => return self.state,
            }
        } else {
            None
        };

        tracing::debug!("[Session] {:?} on {:?}", action, target);
        match (action, target) {
            (InteractionAction::AddControlPoint, Some(target)) => {
                self.path_set.add_control_point(ctx, target);
            }
            (InteractionAction::AddNewPath, Some(target)) => {
                self.path_set.add_new_path(ctx, target);
            }
            (InteractionAction::RemoveControlPoint, Some(target)) => {
                if !self.path_set.remove_control_point(ctx, target) {
                    tracing::debug!("[Session] {} is not a control element", target);
                }
            }
            (InteractionAction::DragControlPoint, Some(target)) => {
                self.path_set.drag_control_point(ctx, target);
            }
            (InteractionAction::ReleasePath, _) => self.release(ctx),
            (InteractionAction::ChangeDirection, _) => self.path_set.change_direction(ctx),
            (InteractionAction::ToggleClosed, _) => {
                self.path_set.toggle_closed(ctx);
            }
            (InteractionAction::ToggleTopologyDistance, _) => {
                self.path_set.toggle_topology_distance(ctx);
            }
            (InteractionAction::Undo, _) => self.undo(ctx),
            (InteractionAction::Redo, _) => self.redo(ctx),
            (InteractionAction::Apply, _) => self.apply(ctx),
            (InteractionAction::Cancel, _) => self.cancel(ctx),
            (_, None) => {}
        }

        if self.state == SessionState::Running
            && action.mutates_paths()
            && self.path_set.is_empty()
        {
            self.reports.push(Report::info("All paths removed"));
            self.cancel(ctx);
        }
        self.collect_reports();
        self.state
    }

    fn resolve_element(
        &mut self,
        ctx: &mut EditContext<'_>,
        element: Option<ElementId>,
    ) -> Option<ElementId> {
        let mode = self.mode();
        let element = element.or_else(|| ctx.host.element_under_cursor(mode))?;
        match validate_element(&*ctx.host, mode, element) {
            Ok(element) => Some(element),
            Err(err) => {
                self.reports.push(Report::warning(err.to_string()));
                None
            }
        }
    }

    fn collect_reports(&mut self) {
        self.reports.extend(self.path_set.drain_reports());
    }

    // ===== History =====

    fn release(&mut self, ctx: &mut EditContext<'_>) {
        self.path_set.release(ctx);
        self.history
            .add_undo_group(HistoryEntry::capture(&self.path_set));
        tracing::debug!("[Session] history has {} entries", self.history.undo_len());
    }

    fn undo(&mut self, ctx: &mut EditContext<'_>) {
        // Undoing past the first release ends the session
        let Some(entry) = self.history.undo().cloned() else {
            tracing::info!("Nothing left to undo, cancelling path session");
            self.cancel(ctx);
            return;
        };
        self.path_set.restore(ctx, entry.active, &entry.paths);
    }

    fn redo(&mut self, ctx: &mut EditContext<'_>) {
        let Some(entry) = self.history.redo().cloned() else {
            self.reports.push(Report::warning("Nothing to redo"));
            return;
        };
        self.path_set.restore(ctx, entry.active, &entry.paths);
    }

    // ===== Ending =====

    fn apply(&mut self, ctx: &mut EditContext<'_>) {
        let commit = self.path_set.flatten_for_commit(&*ctx.host);
        for (object, payload) in &commit {
            if !ctx.host.has_object(*object) {
                tracing::warn!("Object {} vanished before commit, skipping", object.0);
                continue;
            }
            ctx.host.commit_markup(*object, payload, &self.prefs.mark);
        }
        self.path_set.release_batches(ctx);
        self.state = SessionState::ApplyRequested;
        tracing::info!("Applied {} path(s) to {} object(s)", self.paths().len(), commit.len());
    }

    fn cancel(&mut self, ctx: &mut EditContext<'_>) {
        self.path_set.release_batches(ctx);
        self.state = SessionState::Cancelled;
        tracing::info!("Path session cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{GraphMesh, RecordingRenderer};
    use crate::model::ObjectId;
    use crate::settings::{EdgeMark, SelectMark};
    use glam::Vec3;
    use InteractionAction::*;

    struct Harness {
        mesh: GraphMesh,
        renderer: RecordingRenderer,
        object: ObjectId,
        session: Session,
    }

    impl Harness {
        fn start(mode: ElementMode, first: u32, prefs: Preferences) -> Self {
            let mut mesh = GraphMesh::new();
            let object = mesh.add_grid(6, 6, Vec3::ZERO).unwrap();
            let mut renderer = RecordingRenderer::new();
            let initial = match mode {
                ElementMode::VertexEdge => ElementId::vertex(object, first),
                ElementMode::Face => ElementId::face(object, first),
            };
            let session = {
                let mut ctx = EditContext::new(&mut mesh, &mut renderer);
                Session::begin(&mut ctx, mode, Some(initial), prefs)
                    .unwrap()
                    .unwrap()
            };
            Self {
                mesh,
                renderer,
                object,
                session,
            }
        }

        fn vertex_session(first: u32) -> Self {
            Self::start(ElementMode::VertexEdge, first, Preferences::default())
        }

        fn element(&self, index: u32) -> ElementId {
            match self.session.mode() {
                ElementMode::VertexEdge => ElementId::vertex(self.object, index),
                ElementMode::Face => ElementId::face(self.object, index),
            }
        }

        fn act(&mut self, action: InteractionAction) -> SessionState {
            let mut ctx = EditContext::new(&mut self.mesh, &mut self.renderer);
            self.session.handle_action(&mut ctx, action, None)
        }

        fn act_on(&mut self, action: InteractionAction, index: u32) -> SessionState {
            let element = self.element(index);
            let mut ctx = EditContext::new(&mut self.mesh, &mut self.renderer);
            self.session.handle_action(&mut ctx, action, Some(element))
        }

        /// Press, then release
        fn click(&mut self, index: u32) {
            self.act_on(AddControlPoint, index);
            self.act(ReleasePath);
        }

        fn controls(&self, path: usize) -> Vec<u32> {
            self.session.paths()[path]
                .control_elements()
                .iter()
                .map(|e| e.index)
                .collect()
        }

        fn messages(&mut self) -> Vec<String> {
            self.session
                .drain_reports()
                .into_iter()
                .map(|r| r.message)
                .collect()
        }
    }

    #[test]
    fn session_starts_with_one_point() {
        let h = Harness::vertex_session(0);
        assert_eq!(h.session.paths().len(), 1);
        assert_eq!(h.controls(0), vec![0]);
        assert_eq!(
            h.session.paths()[0].fill_elements(),
            &[Vec::<ElementId>::new()]
        );
        assert_eq!(h.session.state(), SessionState::Running);
    }

    #[test]
    fn second_click_fills_segment() {
        let mut h = Harness::vertex_session(0);
        h.act(ReleasePath);
        h.click(14);
        assert_eq!(h.controls(0), vec![0, 14]);
        assert!(!h.session.paths()[0].fill(0).unwrap().is_empty());

        // Directly adjacent points are joined by exactly one edge
        let mut h = Harness::vertex_session(0);
        h.act(ReleasePath);
        h.click(1);
        assert_eq!(h.session.paths()[0].fill(0).unwrap().len(), 1);
    }

    #[test]
    fn clicking_start_closes_loop() {
        let mut h = Harness::vertex_session(0);
        h.act(ReleasePath);
        h.click(14);
        h.messages();
        h.click(0);

        let path = &h.session.paths()[0];
        assert!(path.is_closed());
        assert_eq!(h.controls(0), vec![0, 14]);
        assert!(!path.fill(path.closing_slot()).unwrap().is_empty());
        assert_eq!(h.messages(), vec!["Closed active path".to_string()]);
    }

    #[test]
    fn shared_endpoint_joins_paths() {
        let mut h = Harness::vertex_session(0);
        h.act(ReleasePath);
        h.click(2);
        h.messages();

        // Second path starting on the first one's end point
        h.act_on(AddNewPath, 2);
        h.act_on(AddControlPoint, 14);
        assert_eq!(h.session.paths().len(), 2);
        h.act(ReleasePath);

        assert_eq!(h.session.paths().len(), 1);
        assert_eq!(h.controls(0), vec![0, 2, 14]);
        // Two segment fills plus the closing slot
        assert_eq!(h.session.paths()[0].fill_elements().len(), 3);
        assert!(h.messages().contains(&"Joined two paths".to_string()));
    }

    #[test]
    fn undo_with_single_entry_cancels() {
        let mut h = Harness::vertex_session(0);
        h.act(ReleasePath);
        assert_eq!(h.session.history_len(), 1);
        assert_eq!(h.act(Undo), SessionState::Cancelled);
        assert_eq!(h.renderer.live_count(), 0);
        // Later actions are ignored
        assert_eq!(h.act_on(AddControlPoint, 3), SessionState::Cancelled);
    }

    #[test]
    fn undo_redo_round_trip() {
        let mut h = Harness::vertex_session(0);
        h.act(ReleasePath);
        h.click(2);
        h.click(14);
        h.click(26);
        let after_last = h.session.paths().to_vec();
        assert_eq!(h.session.history_len(), 4);

        for _ in 0..3 {
            assert_eq!(h.act(Undo), SessionState::Running);
        }
        assert_eq!(h.controls(0), vec![0]);
        assert!(!h.session.can_undo());

        for _ in 0..3 {
            h.act(Redo);
        }
        assert_eq!(h.session.paths(), &after_last[..]);
        assert!(!h.session.can_redo());

        let referenced: usize = h
            .session
            .paths()
            .iter()
            .map(|p| p.render_handles().count())
            .sum();
        assert_eq!(h.renderer.live_count(), referenced);
    }

    #[test]
    fn redo_without_undo_warns() {
        let mut h = Harness::vertex_session(0);
        h.act(ReleasePath);
        assert_eq!(h.act(Redo), SessionState::Running);
        let reports = h.session.drain_reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_warning());
        assert_eq!(reports[0].message, "Nothing to redo");
    }

    #[test]
    fn new_edit_after_undo_drops_redo() {
        let mut h = Harness::vertex_session(0);
        h.act(ReleasePath);
        h.click(2);
        h.act(Undo);
        assert!(h.session.can_redo());
        h.click(12);
        assert!(!h.session.can_redo());
        assert_eq!(h.controls(0), vec![0, 12]);
    }

    #[test]
    fn drag_is_not_recorded_until_release() {
        let mut h = Harness::vertex_session(0);
        h.act(ReleasePath);
        h.act_on(AddControlPoint, 2);
        h.act_on(DragControlPoint, 3);
        h.act_on(DragControlPoint, 4);
        assert_eq!(h.session.history_len(), 1);
        h.act(ReleasePath);
        assert_eq!(h.session.history_len(), 2);
        assert_eq!(h.controls(0), vec![0, 4]);
    }

    #[test]
    fn removing_every_point_cancels() {
        let mut h = Harness::vertex_session(0);
        h.act(ReleasePath);
        h.click(2);
        assert_eq!(h.act_on(RemoveControlPoint, 2), SessionState::Running);
        assert_eq!(h.act_on(RemoveControlPoint, 0), SessionState::Cancelled);
        assert_eq!(h.renderer.live_count(), 0);
    }

    #[test]
    fn wrong_kind_is_reported_not_applied() {
        let mut h = Harness::vertex_session(0);
        h.act(ReleasePath);
        let face = ElementId::face(h.object, 0);
        let state = {
            let mut ctx = EditContext::new(&mut h.mesh, &mut h.renderer);
            h.session.handle_action(&mut ctx, AddControlPoint, Some(face))
        };
        assert_eq!(state, SessionState::Running);
        assert_eq!(h.controls(0), vec![0]);
        let reports = h.session.drain_reports();
        assert!(reports[0].is_warning());
    }

    #[test]
    fn begin_on_nothing_does_not_start() {
        let mut mesh = GraphMesh::new();
        mesh.add_grid(3, 3, Vec3::ZERO).unwrap();
        let mut renderer = RecordingRenderer::new();
        let mut ctx = EditContext::new(&mut mesh, &mut renderer);
        let session = Session::begin(
            &mut ctx,
            ElementMode::VertexEdge,
            None,
            Preferences::default(),
        )
        .unwrap();
        assert!(session.is_none());
    }

    #[test]
    fn begin_rejects_unknown_element() {
        let mut mesh = GraphMesh::new();
        let object = mesh.add_grid(3, 3, Vec3::ZERO).unwrap();
        let mut renderer = RecordingRenderer::new();
        let mut ctx = EditContext::new(&mut mesh, &mut renderer);
        let missing = ElementId::vertex(object, 99);
        let err = Session::begin(
            &mut ctx,
            ElementMode::VertexEdge,
            Some(missing),
            Preferences::default(),
        )
        .unwrap_err();
        assert_eq!(err, SessionError::UnknownElement { element: missing });
    }

    #[test]
    fn begin_uses_hovered_element() {
        let mut mesh = GraphMesh::new();
        let object = mesh.add_grid(3, 3, Vec3::ZERO).unwrap();
        mesh.hover(Some(ElementId::face(object, 2)));
        let mut renderer = RecordingRenderer::new();
        let mut ctx = EditContext::new(&mut mesh, &mut renderer);
        let session = Session::begin(&mut ctx, ElementMode::Face, None, Preferences::default())
            .unwrap()
            .unwrap();
        assert_eq!(
            session.active_path().unwrap().first(),
            Some(ElementId::face(object, 2))
        );
    }

    #[test]
    fn apply_commits_with_mark_options() {
        let mut prefs = Preferences::default();
        prefs.mark.seam = EdgeMark::Set;
        prefs.mark.select = SelectMark::Invert;
        let mut h = Harness::start(ElementMode::VertexEdge, 0, prefs);
        h.act(ReleasePath);
        h.click(3);

        let expected = h.session.flattened_commit(&h.mesh);
        assert_eq!(h.act(Apply), SessionState::ApplyRequested);

        let commits = h.mesh.commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].object, h.object);
        assert_eq!(commits[0].commit, expected[&h.object]);
        assert_eq!(commits[0].options.seam, EdgeMark::Set);
        assert_eq!(commits[0].options.select, SelectMark::Invert);
        assert_eq!(h.renderer.live_count(), 0);
    }

    #[test]
    fn cancel_commits_nothing() {
        let mut h = Harness::vertex_session(0);
        h.act(ReleasePath);
        h.click(3);
        assert_eq!(h.act(Cancel), SessionState::Cancelled);
        assert!(h.mesh.commits().is_empty());
        assert_eq!(h.renderer.live_count(), 0);
    }

    #[test]
    fn face_mode_session() {
        let mut h = Harness::start(ElementMode::Face, 0, Preferences::default());
        h.act(ReleasePath);
        h.click(4);
        let commit = h.session.flattened_commit(&h.mesh);
        assert_eq!(commit[&h.object].select, vec![0, 1, 2, 3, 4]);
        assert_eq!(h.act(Apply), SessionState::ApplyRequested);
    }

    #[test]
    fn topology_preference_applies_to_new_paths() {
        let prefs = Preferences {
            default_topology_distance: true,
            ..Preferences::default()
        };
        let h = Harness::start(ElementMode::VertexEdge, 0, prefs);
        assert!(h.session.active_path().unwrap().uses_topology_distance());
    }

    #[test]
    fn undo_depth_follows_preferences() {
        let prefs = Preferences {
            undo_steps: 3,
            ..Preferences::default()
        };
        let mut h = Harness::start(ElementMode::VertexEdge, 0, prefs);
        h.act(ReleasePath);
        for index in [1, 2, 3, 4] {
            h.click(index);
        }
        assert_eq!(h.session.history_len(), 3);
        h.act(Undo);
        h.act(Undo);
        assert_eq!(h.act(Undo), SessionState::Cancelled);
    }
}
