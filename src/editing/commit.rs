// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Flattening paths into per-object index lists for the host commit

use super::path_set::PathSet;
use crate::host::MeshHost;
use crate::model::{ElementId, ElementMode, ObjectId};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Indices to select and to mark on one object
///
/// In vertex mode both lists hold edge indices. In face mode `select`
/// holds face indices and `markup` the edges bounding the selected region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectCommit {
    pub select: Vec<u32>,
    pub markup: Vec<u32>,
}

/// Commit payload for every object touched by the session
pub type CommitMap = BTreeMap<ObjectId, ObjectCommit>;

/// Insertion-ordered set of indices
#[derive(Debug, Default)]
struct OrderedIndices {
    order: Vec<u32>,
    seen: HashSet<u32>,
}

impl OrderedIndices {
    fn push(&mut self, index: u32) {
        if self.seen.insert(index) {
            self.order.push(index);
        }
    }
}

impl PathSet {
    /// Union of all paths, per object, in first-seen order
    pub fn flatten_for_commit(&self, host: &dyn MeshHost) -> CommitMap {
        let mut selected: BTreeMap<ObjectId, OrderedIndices> = BTreeMap::new();

        for path in self.paths() {
            let entry = selected.entry(path.object()).or_default();
            let controls = path.control_elements();
            for (slot, fill) in path.fill_elements().iter().enumerate() {
                if self.mode() == ElementMode::Face
                    && let Some(control) = controls.get(slot)
                {
                    entry.push(control.index);
                }
                for element in fill {
                    entry.push(element.index);
                }
            }
        }

        selected
            .into_iter()
            .map(|(object, indices)| {
                let select = indices.order;
                let markup = match self.mode() {
                    ElementMode::VertexEdge => select.clone(),
                    ElementMode::Face => region_boundary(host, object, &select),
                };
                (object, ObjectCommit { select, markup })
            })
            .collect()
    }
}

/// Edges used by exactly one face of `faces`
fn region_boundary(host: &dyn MeshHost, object: ObjectId, faces: &[u32]) -> Vec<u32> {
    let mut uses: HashMap<u32, usize> = HashMap::new();
    let mut order = Vec::new();
    for &face in faces {
        for edge in host.face_edges(ElementId::face(object, face)) {
            let count = uses.entry(edge.index).or_insert(0);
            if *count == 0 {
                order.push(edge.index);
            }
            *count += 1;
        }
    }
    order.retain(|edge| uses.get(edge) == Some(&1));
    order
}
