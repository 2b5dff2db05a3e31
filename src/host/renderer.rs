// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Render handles and a renderer that only keeps books.
//!
//! Each `RenderHandle` is a monotonically increasing `u64` generated from a
//! global atomic counter, so handles are never reused within a process and
//! a stale handle can never alias a fresh batch.

use super::PathRenderer;
use crate::model::ElementId;
use crate::path::Path;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque reference to a batch owned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderHandle(u64);

static HANDLE_COUNTER: AtomicU64 = AtomicU64::new(1);

impl RenderHandle {
    /// Create a new unique handle
    pub fn next() -> Self {
        Self(HANDLE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// What a recorded batch was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchContents {
    ControlPoints(Vec<ElementId>),
    Fill(Vec<ElementId>),
}

/// Renderer that records live batches instead of drawing them
///
/// Used by the demo binary and the tests to check that every batch the
/// engine builds is eventually released.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    live: BTreeMap<RenderHandle, BatchContents>,
    built: usize,
    invalidated: usize,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches built and not yet invalidated
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Total number of batches ever built
    pub fn built_count(&self) -> usize {
        self.built
    }

    pub fn invalidated_count(&self) -> usize {
        self.invalidated
    }

    pub fn contents(&self, handle: RenderHandle) -> Option<&BatchContents> {
        self.live.get(&handle)
    }

    fn record(&mut self, contents: BatchContents) -> RenderHandle {
        let handle = RenderHandle::next();
        self.live.insert(handle, contents);
        self.built += 1;
        handle
    }
}

impl PathRenderer for RecordingRenderer {
    fn build_control_point_batch(&mut self, path: &Path) -> RenderHandle {
        self.record(BatchContents::ControlPoints(
            path.control_elements().to_vec(),
        ))
    }

    fn build_fill_batch(&mut self, fill: &[ElementId]) -> RenderHandle {
        self.record(BatchContents::Fill(fill.to_vec()))
    }

    fn invalidate(&mut self, handle: RenderHandle) {
        if self.live.remove(&handle).is_some() {
            self.invalidated += 1;
        } else {
            tracing::warn!("Invalidated unknown render handle {:?}", handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectId;

    #[test]
    fn handles_are_unique() {
        let a = RenderHandle::next();
        let b = RenderHandle::next();
        assert_ne!(a, b);
    }

    #[test]
    fn build_and_invalidate() {
        let mut renderer = RecordingRenderer::new();
        let fill = vec![ElementId::edge(ObjectId(0), 1)];
        let handle = renderer.build_fill_batch(&fill);

        assert_eq!(renderer.live_count(), 1);
        assert_eq!(
            renderer.contents(handle),
            Some(&BatchContents::Fill(fill.clone()))
        );

        renderer.invalidate(handle);
        assert_eq!(renderer.live_count(), 0);
        assert_eq!(renderer.built_count(), 1);
        assert_eq!(renderer.invalidated_count(), 1);
    }

    #[test]
    fn invalidating_twice_is_counted_once() {
        let mut renderer = RecordingRenderer::new();
        let handle = renderer.build_fill_batch(&[]);
        renderer.invalidate(handle);
        renderer.invalidate(handle);
        assert_eq!(renderer.invalidated_count(), 1);
    }
}
