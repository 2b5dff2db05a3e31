// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! In-memory reference host built from polygon soups.
//!
//! `GraphMesh` stores one or more objects as vertex positions plus face
//! loops, derives the edge table, and answers the selection queries of
//! [`MeshHost`] with plain graph searches: Dijkstra over the vertex graph
//! (edge length or hop count) in vertex mode, and over the face adjacency
//! graph (centroid distance or hop count) in face mode. It backs the demo
//! binary and the engine tests.

use super::MeshHost;
use crate::editing::commit::ObjectCommit;
use crate::model::{ElementId, ElementKind, ElementMode, ObjectId};
use crate::settings::MarkOptions;
use glam::Vec3;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use thiserror::Error;

/// Errors raised while building a mesh object
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("face {face} references vertex {vertex}, but the object has {count} vertices")]
    VertexOutOfRange { face: usize, vertex: u32, count: usize },

    #[error("face {face} has fewer than three distinct vertices")]
    DegenerateFace { face: usize },

    #[error("grid needs at least 2x2 vertices, got {cols}x{rows}")]
    GridTooSmall { cols: u32, rows: u32 },
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// One mesh object with derived adjacency
#[derive(Debug, Clone)]
struct MeshObject {
    positions: Vec<Vec3>,
    edges: Vec<[u32; 2]>,
    faces: Vec<Vec<u32>>,
    edge_lookup: HashMap<(u32, u32), u32>,
    vertex_edges: Vec<Vec<u32>>,
    face_edges: Vec<Vec<u32>>,
    edge_faces: Vec<Vec<u32>>,
}

impl MeshObject {
    fn build(positions: Vec<Vec3>, faces: Vec<Vec<u32>>) -> Result<Self, MeshError> {
        let count = positions.len();
        let mut edges = Vec::new();
        let mut edge_lookup = HashMap::new();
        let mut vertex_edges = vec![Vec::new(); count];
        let mut face_edges = Vec::with_capacity(faces.len());
        let mut edge_faces: Vec<Vec<u32>> = Vec::new();

        for (face_index, face) in faces.iter().enumerate() {
            let distinct: HashSet<u32> = face.iter().copied().collect();
            if distinct.len() < 3 {
                return Err(MeshError::DegenerateFace { face: face_index });
            }
            if let Some(&vertex) = face.iter().find(|&&v| v as usize >= count) {
                return Err(MeshError::VertexOutOfRange {
                    face: face_index,
                    vertex,
                    count,
                });
            }

            let mut loop_edges = Vec::with_capacity(face.len());
            for (i, &a) in face.iter().enumerate() {
                let b = face[(i + 1) % face.len()];
                let key = (a.min(b), a.max(b));
                let edge = *edge_lookup.entry(key).or_insert_with(|| {
                    let index = edges.len() as u32;
                    edges.push([key.0, key.1]);
                    vertex_edges[key.0 as usize].push(index);
                    vertex_edges[key.1 as usize].push(index);
                    edge_faces.push(Vec::new());
                    index
                });
                edge_faces[edge as usize].push(face_index as u32);
                loop_edges.push(edge);
            }
            face_edges.push(loop_edges);
        }

        Ok(Self {
            positions,
            edges,
            faces,
            edge_lookup,
            vertex_edges,
            face_edges,
            edge_faces,
        })
    }

    fn other_vertex(&self, edge: u32, vertex: u32) -> u32 {
        let [a, b] = self.edges[edge as usize];
        if a == vertex { b } else { a }
    }

    fn face_centroid(&self, face: u32) -> Vec3 {
        let loop_ = &self.faces[face as usize];
        let sum: Vec3 = loop_.iter().map(|&v| self.positions[v as usize]).sum();
        sum / loop_.len() as f32
    }

    /// Newell normal of a face loop
    fn face_normal(&self, face: u32) -> Vec3 {
        let loop_ = &self.faces[face as usize];
        let mut normal = Vec3::ZERO;
        for (i, &a) in loop_.iter().enumerate() {
            let p = self.positions[a as usize];
            let q = self.positions[loop_[(i + 1) % loop_.len()] as usize];
            normal += Vec3::new(
                (p.y - q.y) * (p.z + q.z),
                (p.z - q.z) * (p.x + q.x),
                (p.x - q.x) * (p.y + q.y),
            );
        }
        normal.normalize_or_zero()
    }

    /// Faces sharing an edge with `face`
    fn face_neighbors(&self, face: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.face_edges[face as usize].iter().flat_map(move |&edge| {
            self.edge_faces[edge as usize]
                .iter()
                .filter(move |&&other| other != face)
                .map(move |&other| (edge, other))
        })
    }
}

/// Dijkstra frontier entry, ordered so `BinaryHeap` pops the cheapest
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frontier {
    cost: f32,
    node: u32,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest node sequence from `start` to `goal`, inclusive
///
/// `neighbors` yields `(link, next, weight)` triples; the returned vector
/// pairs every node after the first with the link used to reach it.
fn dijkstra<F, I>(start: u32, goal: u32, node_count: usize, neighbors: F) -> Option<Vec<(u32, Option<u32>)>>
where
    F: Fn(u32) -> I,
    I: Iterator<Item = (u32, u32, f32)>,
{
    if start as usize >= node_count || goal as usize >= node_count {
        return None;
    }
    let mut best = vec![f32::INFINITY; node_count];
    let mut previous: Vec<Option<(u32, u32)>> = vec![None; node_count];
    let mut heap = BinaryHeap::new();

    best[start as usize] = 0.0;
    heap.push(Frontier {
        cost: 0.0,
        node: start,
    });

    while let Some(Frontier { cost, node }) = heap.pop() {
        if node == goal {
            break;
        }
        if cost > best[node as usize] {
            continue;
        }
        for (link, next, weight) in neighbors(node) {
            let candidate = cost + weight;
            if candidate < best[next as usize] {
                best[next as usize] = candidate;
                previous[next as usize] = Some((node, link));
                heap.push(Frontier {
                    cost: candidate,
                    node: next,
                });
            }
        }
    }

    if !best[goal as usize].is_finite() {
        return None;
    }

    let mut sequence = Vec::new();
    let mut cursor = goal;
    while let Some((prev, link)) = previous[cursor as usize] {
        sequence.push((cursor, Some(link)));
        cursor = prev;
    }
    sequence.push((cursor, None));
    sequence.reverse();
    Some(sequence)
}

// ============================================================================
// GRAPH MESH
// ============================================================================

/// A record of one `commit_markup` call
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRecord {
    pub object: ObjectId,
    pub commit: ObjectCommit,
    pub options: MarkOptions,
}

/// Reference host over in-memory polygon meshes
#[derive(Debug, Clone, Default)]
pub struct GraphMesh {
    objects: Vec<MeshObject>,
    /// Selected elements in the order they were selected
    selection: Vec<ElementId>,
    /// Membership index over `selection`
    selected: HashSet<ElementId>,
    hovered: Option<ElementId>,
    /// Emulate kernels that return nothing for a path along a single edge
    skip_single_edge_paths: bool,
    commits: Vec<CommitRecord>,
}

impl GraphMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object from positions and face loops, deriving its edges
    pub fn add_object(&mut self, positions: Vec<Vec3>, faces: Vec<Vec<u32>>) -> Result<ObjectId, MeshError> {
        let object = MeshObject::build(positions, faces)?;
        self.objects.push(object);
        Ok(ObjectId(self.objects.len() as u32 - 1))
    }

    /// Add a flat grid of `cols` x `rows` vertices with quad faces
    ///
    /// Vertex `(x, y)` has index `y * cols + x` and sits at `offset + (x, y, 0)`.
    pub fn add_grid(&mut self, cols: u32, rows: u32, offset: Vec3) -> Result<ObjectId, MeshError> {
        if cols < 2 || rows < 2 {
            return Err(MeshError::GridTooSmall { cols, rows });
        }
        let positions = (0..rows)
            .flat_map(|y| (0..cols).map(move |x| offset + Vec3::new(x as f32, y as f32, 0.0)))
            .collect();
        let faces = (0..rows - 1)
            .flat_map(|y| {
                (0..cols - 1).map(move |x| {
                    let i = y * cols + x;
                    vec![i, i + 1, i + 1 + cols, i + cols]
                })
            })
            .collect();
        self.add_object(positions, faces)
    }

    /// Emulate a kernel that returns an empty path between adjacent vertices
    pub fn with_single_edge_paths_skipped(mut self, skip: bool) -> Self {
        self.skip_single_edge_paths = skip;
        self
    }

    /// Set the element reported under the cursor
    pub fn hover(&mut self, element: Option<ElementId>) {
        self.hovered = element;
    }

    /// Edge joining two vertices of the same object, if any
    pub fn edge_between(&self, a: ElementId, b: ElementId) -> Option<ElementId> {
        if a.object != b.object {
            return None;
        }
        let object = self.objects.get(a.object.0 as usize)?;
        let key = (a.index.min(b.index), a.index.max(b.index));
        object
            .edge_lookup
            .get(&key)
            .map(|&edge| ElementId::edge(a.object, edge))
    }

    /// Every `commit_markup` call received so far
    pub fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }

    pub fn selection(&self) -> &[ElementId] {
        &self.selection
    }

    fn object(&self, id: ObjectId) -> Option<&MeshObject> {
        self.objects.get(id.0 as usize)
    }

    fn select(&mut self, element: ElementId) {
        if self.selected.insert(element) {
            self.selection.push(element);
        }
    }

    fn selected_of(&self, kind: ElementKind) -> Vec<ElementId> {
        self.selection
            .iter()
            .filter(|e| e.kind == kind)
            .copied()
            .collect()
    }

    fn shortest_vertex_path(&mut self, a: ElementId, b: ElementId, topology: bool) {
        let Some(object) = self.object(a.object) else {
            return;
        };
        let route = dijkstra(a.index, b.index, object.positions.len(), |v| {
            object.vertex_edges[v as usize].iter().map(move |&edge| {
                let next = object.other_vertex(edge, v);
                let weight = if topology {
                    1.0
                } else {
                    object.positions[v as usize].distance(object.positions[next as usize])
                };
                (edge, next, weight)
            })
        });
        let Some(route) = route else {
            tracing::debug!("[GraphMesh] no vertex path between {} and {}", a, b);
            return;
        };
        if self.skip_single_edge_paths && route.len() == 2 {
            return;
        }

        let mut picked = Vec::with_capacity(route.len() * 2);
        for (vertex, link) in route {
            if let Some(edge) = link {
                picked.push(ElementId::edge(a.object, edge));
            }
            picked.push(ElementId::vertex(a.object, vertex));
        }
        for element in picked {
            self.select(element);
        }
    }

    fn shortest_face_path(&mut self, a: ElementId, b: ElementId, topology: bool) {
        let Some(object) = self.object(a.object) else {
            return;
        };
        let route = dijkstra(a.index, b.index, object.faces.len(), |f| {
            let here = object.face_centroid(f);
            object.face_neighbors(f).map(move |(edge, next)| {
                let weight = if topology {
                    1.0
                } else {
                    here.distance(object.face_centroid(next))
                };
                (edge, next, weight)
            })
        });
        let Some(route) = route else {
            tracing::debug!("[GraphMesh] no face path between {} and {}", a, b);
            return;
        };
        let faces: Vec<ElementId> = route
            .into_iter()
            .map(|(face, _)| ElementId::face(a.object, face))
            .collect();
        for face in faces {
            self.select(face);
        }
    }
}

impl MeshHost for GraphMesh {
    fn has_object(&self, object: ObjectId) -> bool {
        self.object(object).is_some()
    }

    fn contains(&self, element: ElementId) -> bool {
        let Some(object) = self.object(element.object) else {
            return false;
        };
        let count = match element.kind {
            ElementKind::Vertex => object.positions.len(),
            ElementKind::Edge => object.edges.len(),
            ElementKind::Face => object.faces.len(),
        };
        (element.index as usize) < count
    }

    fn element_under_cursor(&mut self, mode: ElementMode) -> Option<ElementId> {
        self.hovered.filter(|e| e.kind == mode.control_kind())
    }

    fn clear_selection(&mut self) {
        self.selection.clear();
        self.selected.clear();
    }

    fn set_selection(&mut self, elements: &[ElementId], state: bool) {
        if state {
            for &element in elements {
                self.select(element);
            }
        } else {
            let removed: HashSet<ElementId> = elements
                .iter()
                .copied()
                .filter(|e| self.selected.remove(e))
                .collect();
            if !removed.is_empty() {
                self.selection.retain(|e| !removed.contains(e));
            }
        }
    }

    fn select_linked(&mut self, seed: ElementId, delimit_normal: bool) {
        let Some(object) = self.object(seed.object) else {
            return;
        };
        let mut reached = Vec::new();
        let mut seen = HashSet::from([seed.index]);
        let mut stack = vec![seed.index];

        while let Some(node) = stack.pop() {
            reached.push(node);
            match seed.kind {
                ElementKind::Vertex => {
                    for &edge in &object.vertex_edges[node as usize] {
                        let next = object.other_vertex(edge, node);
                        if seen.insert(next) {
                            stack.push(next);
                        }
                    }
                }
                ElementKind::Face => {
                    let normal = object.face_normal(node);
                    for (_, next) in object.face_neighbors(node) {
                        if delimit_normal && normal.dot(object.face_normal(next)) < 0.0 {
                            continue;
                        }
                        if seen.insert(next) {
                            stack.push(next);
                        }
                    }
                }
                ElementKind::Edge => {}
            }
        }

        reached.sort_unstable();
        let object_id = seed.object;
        for index in reached {
            self.select(ElementId {
                object: object_id,
                kind: seed.kind,
                index,
            });
        }
    }

    fn select_more(&mut self, mode: ElementMode) {
        let kind = mode.control_kind();
        let mut grown = Vec::new();
        for element in self.selected_of(kind) {
            let Some(object) = self.object(element.object) else {
                continue;
            };
            match kind {
                ElementKind::Vertex => {
                    for &edge in &object.vertex_edges[element.index as usize] {
                        let next = object.other_vertex(edge, element.index);
                        grown.push(ElementId::vertex(element.object, next));
                    }
                }
                ElementKind::Face => {
                    for (_, next) in object.face_neighbors(element.index) {
                        grown.push(ElementId::face(element.object, next));
                    }
                }
                ElementKind::Edge => {}
            }
        }
        for element in grown {
            self.select(element);
        }
    }

    fn select_shortest_path(&mut self, mode: ElementMode, use_topology_distance: bool) {
        let ends = self.selected_of(mode.control_kind());
        let [a, b] = ends.as_slice() else {
            tracing::debug!(
                "[GraphMesh] shortest path needs two selected elements, got {}",
                ends.len()
            );
            return;
        };
        let (a, b) = (*a, *b);
        if a.object != b.object {
            return;
        }
        match mode {
            ElementMode::VertexEdge => self.shortest_vertex_path(a, b, use_topology_distance),
            ElementMode::Face => self.shortest_face_path(a, b, use_topology_distance),
        }
    }

    fn selected_elements(&self, kind: ElementKind) -> Vec<ElementId> {
        self.selected_of(kind)
    }

    fn edge_vertices(&self, edge: ElementId) -> Option<[ElementId; 2]> {
        if edge.kind != ElementKind::Edge {
            return None;
        }
        let [a, b] = *self.object(edge.object)?.edges.get(edge.index as usize)?;
        Some([
            ElementId::vertex(edge.object, a),
            ElementId::vertex(edge.object, b),
        ])
    }

    fn vertex_edges(&self, vertex: ElementId) -> Vec<ElementId> {
        self.object(vertex.object)
            .and_then(|object| object.vertex_edges.get(vertex.index as usize))
            .map(|edges| {
                edges
                    .iter()
                    .map(|&edge| ElementId::edge(vertex.object, edge))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn face_edges(&self, face: ElementId) -> Vec<ElementId> {
        self.object(face.object)
            .and_then(|object| object.face_edges.get(face.index as usize))
            .map(|edges| {
                edges
                    .iter()
                    .map(|&edge| ElementId::edge(face.object, edge))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn commit_markup(&mut self, object: ObjectId, commit: &ObjectCommit, options: &MarkOptions) {
        tracing::debug!(
            "[GraphMesh] commit on object {}: {} selected, {} marked",
            object.0,
            commit.select.len(),
            commit.markup.len()
        );
        self.commits.push(CommitRecord {
            object,
            commit: commit.clone(),
            options: options.clone(),
        });
    }
}
