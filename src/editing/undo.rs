// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Bounded undo/redo stacks
//!
//! The top of the undo stack is always the current state, so a fresh
//! history holds one entry and has nothing to undo.

use crate::settings;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct UndoState<T> {
    undo_stack: VecDeque<T>,
    redo_stack: VecDeque<T>,
    capacity: usize,
}

impl<T> UndoState<T> {
    pub fn new() -> Self {
        Self::with_capacity(settings::history::DEFAULT_STEPS)
    }

    /// History keeping at most `capacity` entries per stack
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(settings::history::MIN_STEPS);
        Self {
            undo_stack: VecDeque::with_capacity(capacity),
            redo_stack: VecDeque::new(),
            capacity,
        }
    }

    /// Record a new current state
    ///
    /// Clears the redo stack; evicts the oldest entry when full.
    pub fn add_undo_group(&mut self, state: T) {
        self.redo_stack.clear();
        if self.undo_stack.len() == self.capacity {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(state);
    }

    /// Step back, returning the state that is now current
    ///
    /// Returns `None` when only the initial state is left.
    pub fn undo(&mut self) -> Option<&T> {
        if self.undo_stack.len() < 2 {
            return None;
        }
        let top = self.undo_stack.pop_back()?;
        if self.redo_stack.len() == self.capacity {
            self.redo_stack.pop_front();
        }
        self.redo_stack.push_back(top);
        self.undo_stack.back()
    }

    /// Step forward again, returning the state that is now current
    pub fn redo(&mut self) -> Option<&T> {
        let next = self.redo_stack.pop_back()?;
        if self.undo_stack.len() == self.capacity {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(next);
        self.undo_stack.back()
    }

    pub fn current(&self) -> Option<&T> {
        self.undo_stack.back()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T> Default for UndoState<T> {
    fn default() -> Self {
        Self::new()
    }
}
