// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! One session shared by every viewport that edits it

use super::Session;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Session handle cloned into each viewport's modal loop
pub type SharedSession = Arc<RwLock<Session>>;

pub fn share_session(session: Session) -> SharedSession {
    Arc::new(RwLock::new(session))
}

/// Acquire a read lock on a shared session, recovering from poison.
///
/// If a viewport panicked while holding the lock, this recovers the
/// session instead of panicking again, so the other viewports keep
/// working on it.
pub fn read_session(session: &SharedSession) -> RwLockReadGuard<'_, Session> {
    session.read().unwrap_or_else(|poisoned| {
        tracing::warn!("Session RwLock was poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Acquire a write lock on a shared session, recovering from poison.
///
/// See [`read_session`] for details on poison recovery.
pub fn write_session(session: &SharedSession) -> RwLockWriteGuard<'_, Session> {
    session.write().unwrap_or_else(|poisoned| {
        tracing::warn!("Session RwLock was poisoned, recovering");
        poisoned.into_inner()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::InteractionAction;
    use crate::host::{EditContext, GraphMesh, RecordingRenderer};
    use crate::model::{ElementId, ElementMode};
    use crate::settings::Preferences;
    use glam::Vec3;

    #[test]
    fn two_handles_see_the_same_session() {
        let mut mesh = GraphMesh::new();
        let object = mesh.add_grid(4, 4, Vec3::ZERO).unwrap();
        let mut renderer = RecordingRenderer::new();
        let mut ctx = EditContext::new(&mut mesh, &mut renderer);
        let session = Session::begin(
            &mut ctx,
            ElementMode::VertexEdge,
            Some(ElementId::vertex(object, 0)),
            Preferences::default(),
        )
        .unwrap()
        .unwrap();

        let first = share_session(session);
        let second = Arc::clone(&first);
        write_session(&first).handle_action(
            &mut ctx,
            InteractionAction::AddControlPoint,
            Some(ElementId::vertex(object, 3)),
        );
        assert_eq!(read_session(&second).paths()[0].len(), 2);
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let mut mesh = GraphMesh::new();
        let object = mesh.add_grid(3, 3, Vec3::ZERO).unwrap();
        let mut renderer = RecordingRenderer::new();
        let mut ctx = EditContext::new(&mut mesh, &mut renderer);
        let session = Session::begin(
            &mut ctx,
            ElementMode::VertexEdge,
            Some(ElementId::vertex(object, 4)),
            Preferences::default(),
        )
        .unwrap()
        .unwrap();
        let shared = share_session(session);

        let poisoner = Arc::clone(&shared);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.write().unwrap();
            panic!("viewport crashed");
        })
        .join();

        assert!(shared.is_poisoned());
        assert_eq!(read_session(&shared).paths().len(), 1);
    }
}
