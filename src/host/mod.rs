// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Collaborator seams: the host geometry kernel and the renderer.
//!
//! Everything the editing engine knows about the mesh goes through
//! [`MeshHost`]. The engine never inspects geometry itself; it selects
//! elements, asks the host to grow or connect the selection, and reads the
//! result back. Render batches are requested through [`PathRenderer`] and
//! stored on the paths as opaque [`RenderHandle`]s.

pub mod graph_mesh;
pub mod renderer;

pub use graph_mesh::GraphMesh;
pub use renderer::{RecordingRenderer, RenderHandle};

use crate::editing::commit::ObjectCommit;
use crate::model::{ElementId, ElementKind, ElementMode, ObjectId};
use crate::path::Path;
use crate::settings::MarkOptions;

/// Geometry and selection services supplied by the host
///
/// All calls are blocking. Selection calls mutate host-side selection
/// state; the engine always clears the selection after reading it back.
pub trait MeshHost {
    /// Whether `object` is part of the session
    fn has_object(&self, object: ObjectId) -> bool;

    /// Whether `element` exists on its object
    fn contains(&self, element: ElementId) -> bool;

    /// Element under the cursor, of the control kind for `mode`
    fn element_under_cursor(&mut self, mode: ElementMode) -> Option<ElementId>;

    /// Deselect everything on every object in the session
    fn clear_selection(&mut self);

    /// Select or deselect the given elements
    fn set_selection(&mut self, elements: &[ElementId], state: bool);

    /// Extend the selection to everything linked to `seed`
    ///
    /// With `delimit_normal` set, growth stops at edges whose adjacent
    /// faces disagree in normal direction.
    fn select_linked(&mut self, seed: ElementId, delimit_normal: bool);

    /// Grow the selection by one ring of elements of the mode's control kind
    fn select_more(&mut self, mode: ElementMode);

    /// Select the shortest path between the two selected control elements
    fn select_shortest_path(&mut self, mode: ElementMode, use_topology_distance: bool);

    /// Currently selected elements of `kind`, in path order where the host
    /// knows one
    fn selected_elements(&self, kind: ElementKind) -> Vec<ElementId>;

    /// The two vertices of an edge
    fn edge_vertices(&self, edge: ElementId) -> Option<[ElementId; 2]>;

    /// Edges incident to a vertex
    fn vertex_edges(&self, vertex: ElementId) -> Vec<ElementId>;

    /// Edges bounding a face
    fn face_edges(&self, face: ElementId) -> Vec<ElementId>;

    /// Write selection and markup for one object
    ///
    /// This is the only call that changes persistent mesh data.
    fn commit_markup(&mut self, object: ObjectId, commit: &ObjectCommit, options: &MarkOptions);
}

/// Builds and releases render batches for paths
pub trait PathRenderer {
    /// Batch drawing the control points of `path`
    fn build_control_point_batch(&mut self, path: &Path) -> RenderHandle;

    /// Batch drawing one fill
    fn build_fill_batch(&mut self, fill: &[ElementId]) -> RenderHandle;

    /// Release a batch that is no longer referenced
    fn invalidate(&mut self, handle: RenderHandle);
}

/// Collaborators handed to every engine operation
pub struct EditContext<'a> {
    pub host: &'a mut dyn MeshHost,
    pub renderer: &'a mut dyn PathRenderer,
}

impl<'a> EditContext<'a> {
    pub fn new(host: &'a mut dyn MeshHost, renderer: &'a mut dyn PathRenderer) -> Self {
        Self { host, renderer }
    }
}
