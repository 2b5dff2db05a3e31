// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Identities for mesh elements as handed out by the host.
//!
//! An `ElementId` never carries geometry. Two ids are equal only when they
//! name the same element (object, kind and index), which is how control
//! points are matched against clicks, fills and other paths. The host owns
//! the mesh; these ids stay valid for the lifetime of one editing session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a mesh object taking part in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// The kind of mesh element an id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Vertex,
    Edge,
    Face,
}

/// A reference to one vertex, edge or face of a mesh object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId {
    pub object: ObjectId,
    pub kind: ElementKind,
    pub index: u32,
}

impl ElementId {
    pub fn vertex(object: ObjectId, index: u32) -> Self {
        Self {
            object,
            kind: ElementKind::Vertex,
            index,
        }
    }

    pub fn edge(object: ObjectId, index: u32) -> Self {
        Self {
            object,
            kind: ElementKind::Edge,
            index,
        }
    }

    pub fn face(object: ObjectId, index: u32) -> Self {
        Self {
            object,
            kind: ElementKind::Face,
            index,
        }
    }

    pub fn is_vertex(&self) -> bool {
        self.kind == ElementKind::Vertex
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            ElementKind::Vertex => "v",
            ElementKind::Edge => "e",
            ElementKind::Face => "f",
        };
        write!(f, "{}:{}{}", self.object.0, tag, self.index)
    }
}

/// Which elements the session operates on
///
/// Resolved once when the session begins and passed explicitly to the
/// island resolver, the fill engine and the commit flattening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementMode {
    /// Control points are vertices, fills are edges
    #[default]
    VertexEdge,
    /// Control points and fills are faces
    Face,
}

impl ElementMode {
    /// Element kind used for control points in this mode
    pub fn control_kind(self) -> ElementKind {
        match self {
            ElementMode::VertexEdge => ElementKind::Vertex,
            ElementMode::Face => ElementKind::Face,
        }
    }

    /// Element kind stored in fills in this mode
    pub fn fill_kind(self) -> ElementKind {
        match self {
            ElementMode::VertexEdge => ElementKind::Edge,
            ElementMode::Face => ElementKind::Face,
        }
    }
}
