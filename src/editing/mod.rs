// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Path editing engine and interaction

pub mod action;
pub mod commit;
pub mod fill;
pub mod island;
pub mod path_set;
pub mod report;
pub mod session;
pub mod undo;

pub use action::InteractionAction;
pub use commit::{CommitMap, ObjectCommit};
pub use island::IslandCache;
pub use path_set::{DragState, PathSet};
pub use report::{Report, ReportLevel};
pub use session::{
    HistoryEntry, Session, SessionError, SessionState, SharedSession, read_session,
    share_session, write_session,
};
pub use undo::UndoState;
