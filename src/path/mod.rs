// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Path abstraction for mesh paths: the editable representation.
//!
//! A `Path` is an ordered list of control elements (vertices or faces)
//! with one cached fill per segment. Slot `i` holds the fill between
//! control `i` and `i + 1`; the last slot is reserved for the closing fill
//! from the last control back to the first and stays empty while the path
//! is open. So `fill_elements.len() == max(control_elements.len(), 1)`
//! holds whenever the path is non-empty.
//!
//! Paths never change host state themselves. Fills are computed by
//! `editing::fill`; render handles that a mutation displaces are parked
//! on the path until the owner releases them through the renderer.

mod merge;

pub use merge::Junction;

use crate::host::{MeshHost, PathRenderer, RenderHandle};
use crate::model::{ElementId, ElementKind, ObjectId};
use bitflags::bitflags;

bitflags! {
    /// Per-path state bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PathFlags: u8 {
        /// A closing fill joins the last control element to the first
        const CLOSED   = 0b0000_0001;
        /// Direction was flipped an odd number of times (informational)
        const REVERSED = 0b0000_0010;
        /// Fills use hop count instead of spatial distance
        const TOPOLOGY = 0b0000_0100;
    }
}

/// Two adjacent control elements and the fill slot between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborPair {
    pub from: ElementId,
    pub to: ElementId,
    pub slot: usize,
}

/// A path of control elements on one mesh island
#[derive(Debug, Clone)]
pub struct Path {
    object: ObjectId,
    island_index: usize,
    flags: PathFlags,
    control_elements: Vec<ElementId>,
    fill_elements: Vec<Vec<ElementId>>,
    fill_batches: Vec<Option<RenderHandle>>,
    control_batch: Option<RenderHandle>,
    /// Handles displaced by mutations, waiting to be invalidated
    stale: Vec<RenderHandle>,
}

/// Logical equality: render state is ignored
impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.object == other.object
            && self.island_index == other.island_index
            && self.flags == other.flags
            && self.control_elements == other.control_elements
            && self.fill_elements == other.fill_elements
    }
}

impl Eq for Path {}

impl Path {
    /// Create a path seeded with one control element
    pub fn new(element: ElementId, island_index: usize, flags: PathFlags) -> Self {
        Self {
            object: element.object,
            island_index,
            flags,
            control_elements: vec![element],
            fill_elements: vec![Vec::new()],
            fill_batches: vec![None],
            control_batch: None,
            stale: Vec::new(),
        }
    }

    // ===== Accessors =====

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn island_index(&self) -> usize {
        self.island_index
    }

    pub fn flags(&self) -> PathFlags {
        self.flags
    }

    pub fn is_closed(&self) -> bool {
        self.flags.contains(PathFlags::CLOSED)
    }

    pub fn uses_topology_distance(&self) -> bool {
        self.flags.contains(PathFlags::TOPOLOGY)
    }

    pub fn control_elements(&self) -> &[ElementId] {
        &self.control_elements
    }

    pub fn fill_elements(&self) -> &[Vec<ElementId>] {
        &self.fill_elements
    }

    pub fn fill(&self, slot: usize) -> Option<&[ElementId]> {
        self.fill_elements.get(slot).map(Vec::as_slice)
    }

    /// Number of control elements
    pub fn len(&self) -> usize {
        self.control_elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.control_elements.is_empty()
    }

    pub fn first(&self) -> Option<ElementId> {
        self.control_elements.first().copied()
    }

    pub fn last(&self) -> Option<ElementId> {
        self.control_elements.last().copied()
    }

    /// Index of the closing fill slot
    pub fn closing_slot(&self) -> usize {
        self.fill_elements.len().saturating_sub(1)
    }

    pub fn control_batch(&self) -> Option<RenderHandle> {
        self.control_batch
    }

    pub fn fill_batch(&self, slot: usize) -> Option<RenderHandle> {
        self.fill_batches.get(slot).copied().flatten()
    }

    // ===== Flags =====

    pub fn set_flag(&mut self, flag: PathFlags, on: bool) {
        self.flags.set(flag, on);
    }

    /// Flip `flag`, returning whether it is now set
    pub fn toggle_flag(&mut self, flag: PathFlags) -> bool {
        self.flags.toggle(flag);
        self.flags.contains(flag)
    }

    // ===== Control elements =====

    /// Identity search in the control elements
    pub fn control_index(&self, element: ElementId) -> Option<usize> {
        self.control_elements.iter().position(|&e| e == element)
    }

    /// Fill slot containing `element`
    ///
    /// Fills in vertex mode hold edges while clicks resolve to vertices, so
    /// a vertex is matched against the endpoints of every fill edge.
    pub fn fill_index(&self, element: ElementId, host: &dyn MeshHost) -> Option<usize> {
        let check_endpoints = element.is_vertex();
        self.fill_elements.iter().position(|fill| {
            fill.iter().any(|&item| {
                item == element
                    || (check_endpoints
                        && item.kind == ElementKind::Edge
                        && host
                            .edge_vertices(item)
                            .is_some_and(|ends| ends.contains(&element)))
            })
        })
    }

    /// Insert a control element with an empty fill slot at `index`
    ///
    /// `index` past the end is clamped to an append.
    pub fn insert_control_element(&mut self, index: usize, element: ElementId) {
        debug_assert!(index <= self.control_elements.len());
        let index = index.min(self.control_elements.len());
        self.control_elements.insert(index, element);
        self.fill_elements.insert(index, Vec::new());
        self.fill_batches.insert(index, None);
        self.invalidate_control_batch();
    }

    /// Remove and return the control element at `index`
    ///
    /// Removing the first element drops the fill that followed it; any
    /// other removal drops the fill that led into it.
    pub fn pop_control_element(&mut self, index: usize) -> Option<ElementId> {
        if index >= self.control_elements.len() {
            return None;
        }
        let element = self.control_elements.remove(index);
        let slot = index.saturating_sub(1);
        self.fill_elements.remove(slot);
        if let Some(handle) = self.fill_batches.remove(slot) {
            self.stale.push(handle);
        }
        if self.control_elements.len() == 1 {
            // A lone point has nothing to close against
            self.clear_fill(0);
            self.flags.remove(PathFlags::CLOSED);
        }
        self.invalidate_control_batch();
        Some(element)
    }

    /// Replace the control element at `index`, keeping its fill slots
    pub fn replace_control_element(&mut self, index: usize, element: ElementId) -> Option<ElementId> {
        let slot = self.control_elements.get_mut(index)?;
        let previous = std::mem::replace(slot, element);
        self.invalidate_control_batch();
        Some(previous)
    }

    /// Reverse the traversal direction
    ///
    /// The closing slot is kept last so it still runs from the new last
    /// element back to the new first one.
    pub fn reverse(&mut self) {
        let (Some(mut closing), Some(closing_batch)) =
            (self.fill_elements.pop(), self.fill_batches.pop())
        else {
            return;
        };
        self.control_elements.reverse();
        self.fill_elements.reverse();
        self.fill_batches.reverse();
        for fill in &mut self.fill_elements {
            fill.reverse();
        }
        closing.reverse();
        self.fill_elements.push(closing);
        self.fill_batches.push(closing_batch);
        self.flags.toggle(PathFlags::REVERSED);
        self.invalidate_control_batch();
    }

    /// Neighbor relations whose fills depend on the control at `index`
    ///
    /// Interior points have two, endpoints of an open path one. Endpoints
    /// of a closed path additionally report the wrap-around pair from the
    /// last element to the first, stored in the closing slot.
    pub fn neighbor_pairs(&self, index: usize) -> Vec<NeighborPair> {
        let n = self.control_elements.len();
        let mut pairs = Vec::with_capacity(3);
        if n < 2 || index >= n {
            return pairs;
        }
        let c = &self.control_elements;
        if index > 0 {
            pairs.push(NeighborPair {
                from: c[index - 1],
                to: c[index],
                slot: index - 1,
            });
        }
        if index + 1 < n {
            pairs.push(NeighborPair {
                from: c[index],
                to: c[index + 1],
                slot: index,
            });
        }
        if self.is_closed() && (index == 0 || index == n - 1) {
            pairs.push(NeighborPair {
                from: c[n - 1],
                to: c[0],
                slot: self.closing_slot(),
            });
        }
        pairs
    }

    /// Whether either endpoint of `self` coincides with an endpoint of `other`
    pub fn touches(&self, other: &Path) -> bool {
        self.junction_with(other).is_some()
    }

    // ===== Fills and render state =====

    /// Store a fill and its batch in `slot`
    pub fn set_fill(&mut self, slot: usize, fill: Vec<ElementId>, batch: Option<RenderHandle>) {
        if slot >= self.fill_elements.len() {
            tracing::warn!(
                "Fill slot {} out of range ({} slots)",
                slot,
                self.fill_elements.len()
            );
            if let Some(handle) = batch {
                self.stale.push(handle);
            }
            return;
        }
        self.fill_elements[slot] = fill;
        if let Some(old) = std::mem::replace(&mut self.fill_batches[slot], batch) {
            self.stale.push(old);
        }
    }

    /// Empty a fill slot and drop its batch
    pub fn clear_fill(&mut self, slot: usize) {
        if let Some(fill) = self.fill_elements.get_mut(slot) {
            fill.clear();
        }
        if let Some(old) = self.fill_batches.get_mut(slot).and_then(Option::take) {
            self.stale.push(old);
        }
    }

    pub fn set_control_batch(&mut self, batch: RenderHandle) {
        if let Some(old) = self.control_batch.replace(batch) {
            self.stale.push(old);
        }
    }

    fn invalidate_control_batch(&mut self) {
        if let Some(old) = self.control_batch.take() {
            self.stale.push(old);
        }
    }

    /// Every handle currently referenced by this path
    pub fn render_handles(&self) -> impl Iterator<Item = RenderHandle> + '_ {
        self.control_batch
            .iter()
            .chain(self.fill_batches.iter().flatten())
            .copied()
    }

    /// Invalidate handles displaced by earlier mutations
    pub fn release_stale(&mut self, renderer: &mut dyn PathRenderer) {
        for handle in self.stale.drain(..) {
            renderer.invalidate(handle);
        }
    }

    /// Invalidate every handle, stale or live
    pub fn release_all(&mut self, renderer: &mut dyn PathRenderer) {
        self.invalidate_control_batch();
        for handle in self.fill_batches.iter_mut().filter_map(Option::take) {
            self.stale.push(handle);
        }
        self.release_stale(renderer);
    }

    /// Structural copy without any render state
    pub fn snapshot(&self) -> Path {
        Path {
            object: self.object,
            island_index: self.island_index,
            flags: self.flags,
            control_elements: self.control_elements.clone(),
            fill_elements: self.fill_elements.clone(),
            fill_batches: vec![None; self.fill_batches.len()],
            control_batch: None,
            stale: Vec::new(),
        }
    }
}
