// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Island resolver: which connected piece of mesh an element lives on.
//!
//! Islands are discovered lazily, the first time an element from them is
//! clicked, and cached for the rest of the session. Discovery asks the host
//! to select everything linked to the element, then alternates select-more
//! and select-linked until the selection stops growing, which copes with
//! kernels whose linked selection needs several passes around poles and
//! ngons.
//!
//! Select-more ignores face normals, so in face mode with normal delimiting
//! only select-linked grows the island.

use crate::host::EditContext;
use crate::model::{ElementId, ElementMode};
use crate::settings;
use std::collections::HashSet;

/// Memoized element-to-island mapping for one session
#[derive(Debug, Clone, Default)]
pub struct IslandCache {
    islands: Vec<HashSet<ElementId>>,
}

impl IslandCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of islands discovered so far
    pub fn len(&self) -> usize {
        self.islands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }

    /// Index of a cached island containing `element`
    pub fn lookup(&self, element: ElementId) -> Option<usize> {
        self.islands
            .iter()
            .position(|island| island.contains(&element))
    }

    /// Island index for `element`, discovering the island if needed
    pub fn resolve(
        &mut self,
        ctx: &mut EditContext<'_>,
        mode: ElementMode,
        element: ElementId,
        delimit_normal: bool,
    ) -> usize {
        if let Some(index) = self.lookup(element) {
            return index;
        }

        let kind = mode.control_kind();
        let grow_past_links = !(delimit_normal && mode == ElementMode::Face);
        let host = &mut *ctx.host;
        host.clear_selection();
        host.set_selection(&[element], true);
        host.select_linked(element, delimit_normal);

        let mut count = host.selected_elements(kind).len();
        let mut passes = 1;
        loop {
            if grow_past_links {
                host.select_more(mode);
            }
            host.select_linked(element, delimit_normal);
            let grown = host.selected_elements(kind).len();
            if grown == count {
                break;
            }
            count = grown;
            passes += 1;
            if passes >= settings::island::GROWTH_PASS_LIMIT {
                tracing::warn!(
                    "Island around {} still growing after {} passes",
                    element,
                    passes
                );
                break;
            }
        }

        let mut members: HashSet<ElementId> = host.selected_elements(kind).into_iter().collect();
        members.insert(element);
        host.clear_selection();

        tracing::debug!(
            "[IslandCache] island {} has {} elements ({} passes)",
            self.islands.len(),
            members.len(),
            passes
        );
        self.islands.push(members);
        self.islands.len() - 1
    }
}
