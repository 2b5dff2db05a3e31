// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Path-set manager: the authoritative list of paths for a session.
//!
//! Every edit the interaction layer performs lands here. The manager keeps
//! the active path pointer, resolves islands, recomputes fills after each
//! structural change, and enforces the cross-path rules: duplicate control
//! elements are resolved on release, and open paths on the same island that
//! meet at an endpoint are joined.

use super::fill::{rebuild_batches, refresh_control_batch, update_fills_around_index};
use super::island::IslandCache;
use super::report::Report;
use crate::host::EditContext;
use crate::model::{ElementId, ElementMode};
use crate::path::{Path, PathFlags};
use crate::settings::Preferences;

/// Control element held by the pointer between press and release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragState {
    /// Element currently under the held pointer
    pub held: ElementId,
    /// Index of `held` in each path, parallel to the path list
    pub indices: Vec<Option<usize>>,
}

/// All paths of one editing session
#[derive(Debug, Clone)]
pub struct PathSet {
    mode: ElementMode,
    paths: Vec<Path>,
    active: usize,
    islands: IslandCache,
    delimit_by_normal: bool,
    new_path_flags: PathFlags,
    drag: Option<DragState>,
    /// Set when closing a path, so the next new element starts a new path
    just_closed: bool,
    reports: Vec<Report>,
}

impl PathSet {
    pub fn new(mode: ElementMode, prefs: &Preferences) -> Self {
        let mut new_path_flags = PathFlags::empty();
        new_path_flags.set(PathFlags::TOPOLOGY, prefs.default_topology_distance);
        Self {
            mode,
            paths: Vec::new(),
            active: 0,
            islands: IslandCache::new(),
            delimit_by_normal: prefs.delimit_by_normal,
            new_path_flags,
            drag: None,
            just_closed: false,
            reports: Vec::new(),
        }
    }

    // ===== Queries =====

    pub fn mode(&self) -> ElementMode {
        self.mode
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_path(&self) -> Option<&Path> {
        self.paths.get(self.active)
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn islands(&self) -> &IslandCache {
        &self.islands
    }

    /// Take the reports queued since the last call
    pub fn drain_reports(&mut self) -> Vec<Report> {
        std::mem::take(&mut self.reports)
    }

    /// Path holding `element` as a control element, preferring the active one
    fn path_with_control(&self, element: ElementId) -> Option<usize> {
        if self
            .active_path()
            .is_some_and(|p| p.control_index(element).is_some())
        {
            return Some(self.active);
        }
        self.paths
            .iter()
            .position(|p| p.control_index(element).is_some())
    }

    fn island_of(&mut self, ctx: &mut EditContext<'_>, element: ElementId) -> usize {
        self.islands
            .resolve(ctx, self.mode, element, self.delimit_by_normal)
    }

    fn report(&mut self, report: Report) {
        self.reports.push(report);
    }

    fn arm_drag(&mut self, held: ElementId) {
        let indices = self.paths.iter().map(|p| p.control_index(held)).collect();
        self.drag = Some(DragState { held, indices });
    }

    // ===== Adding =====

    /// Start a new path at `element` and make it active
    pub fn add_new_path(&mut self, ctx: &mut EditContext<'_>, element: ElementId) -> usize {
        let island = self.island_of(ctx, element);
        let mut path = Path::new(element, island, self.new_path_flags);
        refresh_control_batch(ctx, &mut path);
        self.paths.push(path);
        self.active = self.paths.len() - 1;
        self.just_closed = false;
        self.arm_drag(element);
        tracing::debug!("[PathSet] new path {} at {}", self.active, element);
        self.active
    }

    /// Place a control point at `element`
    ///
    /// The target path is resolved first: a click on an existing control
    /// element or fill of any path makes that path active. A click on the
    /// first element of the open active path appends it again, which
    /// closes the path on release. A new element on another island, or
    /// right after a path was closed, starts a new path; anything else is
    /// appended to the active path.
    pub fn add_control_point(&mut self, ctx: &mut EditContext<'_>, element: ElementId) {
        if self.paths.is_empty() {
            self.add_new_path(ctx, element);
            return;
        }

        // Each pass either acts or switches to a path that holds the
        // element, so the second pass always acts.
        let mut drag_index = None;
        let mut inserted = false;
        for _ in 0..2 {
            let active = self.active;
            let path = &self.paths[active];

            if let Some(index) = path.control_index(element) {
                if index == 0 && !path.is_closed() && path.len() >= 2 {
                    let end = path.len();
                    self.insert_and_fill(ctx, active, end, element);
                    drag_index = Some(end);
                    inserted = true;
                    tracing::debug!("[PathSet] closing gesture on path {}", active);
                } else {
                    refresh_control_batch(ctx, &mut self.paths[active]);
                }
                break;
            }

            if let Some(slot) = path.fill_index(element, &*ctx.host) {
                self.insert_and_fill(ctx, active, slot + 1, element);
                inserted = true;
                break;
            }

            let owner = self.paths.iter().enumerate().position(|(i, p)| {
                i != active
                    && (p.control_index(element).is_some()
                        || p.fill_index(element, &*ctx.host).is_some())
            });
            if let Some(owner) = owner {
                tracing::debug!("[PathSet] switching active path {} -> {}", active, owner);
                self.active = owner;
                self.just_closed = false;
                continue;
            }

            let island = self.island_of(ctx, element);
            if self.just_closed || island != self.paths[active].island_index() {
                self.add_new_path(ctx, element);
                return;
            }

            let end = self.paths[active].len();
            self.insert_and_fill(ctx, active, end, element);
            inserted = true;
            break;
        }

        // Pressing an existing control keeps a just-closed path closed off
        if inserted {
            self.just_closed = false;
        }
        self.arm_drag(element);
        if let (Some(index), Some(drag)) = (drag_index, self.drag.as_mut())
            && let Some(slot) = drag.indices.get_mut(self.active)
        {
            *slot = Some(index);
        }
    }

    fn insert_and_fill(
        &mut self,
        ctx: &mut EditContext<'_>,
        path_index: usize,
        index: usize,
        element: ElementId,
    ) {
        let path = &mut self.paths[path_index];
        path.insert_control_element(index, element);
        update_fills_around_index(ctx, self.mode, path, index);
        refresh_control_batch(ctx, path);
    }

    // ===== Removing =====

    /// Remove `element` from whichever path holds it as a control element
    ///
    /// Returns `false` when no path holds it. A path left empty is deleted
    /// and the last remaining path becomes active.
    pub fn remove_control_point(&mut self, ctx: &mut EditContext<'_>, element: ElementId) -> bool {
        let Some(path_index) = self.path_with_control(element) else {
            return false;
        };
        self.active = path_index;
        self.drag = None;

        let path = &mut self.paths[path_index];
        let Some(index) = path.control_index(element) else {
            return false;
        };
        path.pop_control_element(index);

        if path.is_empty() {
            let mut removed = self.paths.remove(path_index);
            removed.release_all(ctx.renderer);
            self.active = self.paths.len().saturating_sub(1);
            tracing::debug!("[PathSet] path {} removed, {} left", path_index, self.paths.len());
        } else {
            update_fills_around_index(ctx, self.mode, path, index.saturating_sub(1));
            refresh_control_batch(ctx, path);
        }
        true
    }

    // ===== Dragging =====

    /// Move the held control element to `element` in every path that has it
    ///
    /// No-op without an armed drag or when `element` is on another island.
    pub fn drag_control_point(&mut self, ctx: &mut EditContext<'_>, element: ElementId) -> bool {
        let Some(drag) = self.drag.clone() else {
            return false;
        };
        if drag.held == element {
            return false;
        }
        let held_island = self.islands.lookup(drag.held);
        let island = self.island_of(ctx, element);
        if held_island != Some(island) {
            tracing::debug!("[PathSet] drag onto another island ignored");
            return false;
        }

        for (path_index, index) in drag.indices.iter().enumerate() {
            let (Some(index), Some(path)) = (*index, self.paths.get_mut(path_index)) else {
                continue;
            };
            if path.replace_control_element(index, element).is_none() {
                continue;
            }
            update_fills_around_index(ctx, self.mode, path, index);
            refresh_control_batch(ctx, path);
        }

        if let Some(drag) = self.drag.as_mut() {
            drag.held = element;
        }
        true
    }

    // ===== Path-wide toggles =====

    /// Flip direction of the active path
    pub fn change_direction(&mut self, ctx: &mut EditContext<'_>) {
        let Some(path) = self.paths.get_mut(self.active) else {
            return;
        };
        path.reverse();
        refresh_control_batch(ctx, path);
    }

    /// Open or close the active path
    ///
    /// Returns whether the path is closed afterwards.
    pub fn toggle_closed(&mut self, ctx: &mut EditContext<'_>) -> bool {
        let mode = self.mode;
        let Some(path) = self.paths.get_mut(self.active) else {
            return false;
        };
        if !path.is_closed() && path.len() < 2 {
            self.report(Report::warning("Path needs two control points to close"));
            return false;
        }

        if path.toggle_flag(PathFlags::CLOSED) {
            let last = path.len() - 1;
            update_fills_around_index(ctx, mode, path, last);
            if path.len() > 2 {
                self.just_closed = true;
            }
            true
        } else {
            let slot = path.closing_slot();
            path.clear_fill(slot);
            path.release_stale(ctx.renderer);
            while self.join_adjacent_paths(ctx) {}
            false
        }
    }

    /// Switch the active path between spatial and hop-count distance
    pub fn toggle_topology_distance(&mut self, ctx: &mut EditContext<'_>) -> bool {
        let mode = self.mode;
        let Some(path) = self.paths.get_mut(self.active) else {
            return false;
        };
        let enabled = path.toggle_flag(PathFlags::TOPOLOGY);
        // Even indices touch every forward slot and, via index 0, the
        // closing slot.
        for index in (0..path.len()).step_by(2) {
            update_fills_around_index(ctx, mode, path, index);
        }
        enabled
    }

    // ===== Consistency =====

    /// Resolve repeated control elements in the path at `path_index`
    ///
    /// - Repeats next to each other collapse into one.
    /// - The first element repeated at the end closes the path.
    /// - Any other repeat is dropped again: the later occurrence is
    ///   removed and the path keeps its earlier shape.
    ///
    /// Returns whether anything changed. Running it twice is the same as
    /// running it once.
    pub fn remove_doubles(&mut self, ctx: &mut EditContext<'_>, path_index: usize) -> bool {
        let mode = self.mode;
        let is_active = path_index == self.active;
        let mut changed = false;

        loop {
            let Some(path) = self.paths.get_mut(path_index) else {
                return changed;
            };
            let Some((i, j)) = first_repeat(path.control_elements()) else {
                return changed;
            };
            let n = path.len();
            changed = true;

            if j == i + 1 {
                path.pop_control_element(j);
                refresh_control_batch(ctx, path);
                self.report(Report::info("Merged adjacent control elements"));
            } else if i == 0 && j == n - 1 {
                let was_closed = path.is_closed();
                path.pop_control_element(j);
                path.set_flag(PathFlags::CLOSED, true);
                let last = path.len() - 1;
                update_fills_around_index(ctx, mode, path, last);
                refresh_control_batch(ctx, path);
                if !was_closed {
                    self.report(Report::info(if is_active {
                        "Closed active path"
                    } else {
                        "Closed path"
                    }));
                }
            } else {
                path.pop_control_element(j);
                update_fills_around_index(ctx, mode, path, j - 1);
                refresh_control_batch(ctx, path);
                self.report(Report::warning(
                    "Control element is already part of this path",
                ));
            }
        }
    }

    /// Join the open active path with the first open path it touches
    ///
    /// Returns whether a join happened; callers repeat until it returns
    /// `false`, since a join can expose another shared endpoint.
    pub fn join_adjacent_paths(&mut self, ctx: &mut EditContext<'_>) -> bool {
        let Some(active) = self.active_path() else {
            return false;
        };
        if active.is_closed() {
            return false;
        }
        let Some(other_index) = self.paths.iter().enumerate().position(|(i, p)| {
            i != self.active && !p.is_closed() && active.junction_with(p).is_some()
        }) else {
            return false;
        };

        let other = self.paths.remove(other_index);
        if other_index < self.active {
            self.active -= 1;
        }
        let mine = self.paths.remove(self.active);
        let mut merged = match mine.merge(other) {
            Ok(merged) => merged,
            Err((mine, other)) => {
                tracing::warn!("Paths stopped touching during join");
                self.paths.insert(self.active, mine);
                self.paths.push(other);
                return false;
            }
        };
        refresh_control_batch(ctx, &mut merged);
        self.paths.insert(self.active, merged);
        // Drag indices were parallel to the old path list
        self.drag = None;
        self.report(Report::info("Joined two paths"));
        true
    }

    /// Resolve doubles everywhere and join until nothing changes
    pub fn release(&mut self, ctx: &mut EditContext<'_>) {
        self.drag = None;
        loop {
            for index in 0..self.paths.len() {
                self.remove_doubles(ctx, index);
            }
            if !self.join_adjacent_paths(ctx) {
                break;
            }
        }
    }

    // ===== Snapshots =====

    /// Structural copy of every path, without render state
    pub fn snapshot(&self) -> Vec<Path> {
        self.paths.iter().map(Path::snapshot).collect()
    }

    /// Replace all paths with a snapshot and rebuild their batches
    pub fn restore(&mut self, ctx: &mut EditContext<'_>, active: usize, paths: &[Path]) {
        for path in &mut self.paths {
            path.release_all(ctx.renderer);
        }
        self.paths = paths.to_vec();
        for path in &mut self.paths {
            rebuild_batches(ctx, path);
        }
        self.active = active.min(self.paths.len().saturating_sub(1));
        self.drag = None;
        self.just_closed = false;
    }

    /// Release every render batch held by the paths
    pub fn release_batches(&mut self, ctx: &mut EditContext<'_>) {
        for path in &mut self.paths {
            path.release_all(ctx.renderer);
        }
    }
}

/// First `(i, j)` with `i < j` and equal elements, ordered by `j`
fn first_repeat(elements: &[ElementId]) -> Option<(usize, usize)> {
    elements.iter().enumerate().skip(1).find_map(|(j, e)| {
        elements[..j]
            .iter()
            .position(|other| other == e)
            .map(|i| (i, j))
    })
}
