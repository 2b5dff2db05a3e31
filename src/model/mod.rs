// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Mesh element identities and editing modes

pub mod element;

pub use element::{ElementId, ElementKind, ElementMode, ObjectId};
