// Copyright 2025 the Meshpath Authors
// SPDX-License-Identifier: Apache-2.0

//! Segment fills: shortest paths between adjacent control elements

use crate::host::EditContext;
use crate::model::{ElementId, ElementMode};
use crate::path::Path;

/// Shortest-path fill from `from` to `to`, endpoints excluded
///
/// Some kernels return nothing for a path along a single edge; in vertex
/// mode that case falls back to the edge joining the two vertices.
pub fn compute_fill(
    ctx: &mut EditContext<'_>,
    mode: ElementMode,
    from: ElementId,
    to: ElementId,
    use_topology_distance: bool,
) -> Vec<ElementId> {
    if from == to {
        return Vec::new();
    }

    let host = &mut *ctx.host;
    host.clear_selection();
    host.set_selection(&[from, to], true);
    host.select_shortest_path(mode, use_topology_distance);
    let mut fill: Vec<ElementId> = host
        .selected_elements(mode.fill_kind())
        .into_iter()
        .filter(|&e| e != from && e != to)
        .collect();
    host.clear_selection();

    if fill.is_empty() && mode == ElementMode::VertexEdge {
        let joining = host.vertex_edges(from).into_iter().find(|&edge| {
            host.edge_vertices(edge)
                .is_some_and(|ends| ends.contains(&to))
        });
        if let Some(edge) = joining {
            tracing::debug!("[fill] {} -> {} via single edge {}", from, to, edge);
            fill.push(edge);
        }
    }

    if fill.is_empty() {
        tracing::debug!("[fill] host found no path from {} to {}", from, to);
    }
    fill
}

/// Recompute every fill that depends on the control element at `index`
pub fn update_fills_around_index(
    ctx: &mut EditContext<'_>,
    mode: ElementMode,
    path: &mut Path,
    index: usize,
) {
    let topology = path.uses_topology_distance();
    for pair in path.neighbor_pairs(index) {
        let fill = compute_fill(ctx, mode, pair.from, pair.to, topology);
        let batch = ctx.renderer.build_fill_batch(&fill);
        path.set_fill(pair.slot, fill, Some(batch));
    }
    path.release_stale(ctx.renderer);
}

/// Rebuild the control point batch of `path`
pub fn refresh_control_batch(ctx: &mut EditContext<'_>, path: &mut Path) {
    let batch = ctx.renderer.build_control_point_batch(path);
    path.set_control_batch(batch);
    path.release_stale(ctx.renderer);
}

/// Rebuild every batch of `path` from its structural state
pub fn rebuild_batches(ctx: &mut EditContext<'_>, path: &mut Path) {
    for slot in 0..path.fill_elements().len() {
        let fill = path.fill_elements()[slot].clone();
        let batch = ctx.renderer.build_fill_batch(&fill);
        path.set_fill(slot, fill, Some(batch));
    }
    refresh_control_batch(ctx, path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{GraphMesh, RecordingRenderer};
    use crate::model::ObjectId;
    use crate::path::PathFlags;
    use glam::Vec3;

    fn grid(skip_single_edge: bool) -> (GraphMesh, ObjectId) {
        let mut mesh = GraphMesh::new().with_single_edge_paths_skipped(skip_single_edge);
        let object = mesh.add_grid(5, 5, Vec3::ZERO).unwrap();
        (mesh, object)
    }

    #[test]
    fn fill_excludes_endpoints_in_face_mode() {
        let (mut mesh, object) = grid(false);
        let mut renderer = RecordingRenderer::new();
        let mut ctx = EditContext::new(&mut mesh, &mut renderer);
        let fill = compute_fill(
            &mut ctx,
            ElementMode::Face,
            ElementId::face(object, 0),
            ElementId::face(object, 3),
            true,
        );
        assert_eq!(
            fill,
            vec![ElementId::face(object, 1), ElementId::face(object, 2)]
        );
    }

    #[test]
    fn adjacent_vertices_fall_back_to_joining_edge() {
        let (mut mesh, object) = grid(true);
        let a = ElementId::vertex(object, 6);
        let b = ElementId::vertex(object, 7);
        let expected = mesh.edge_between(a, b).unwrap();
        let mut renderer = RecordingRenderer::new();
        let mut ctx = EditContext::new(&mut mesh, &mut renderer);

        let fill = compute_fill(&mut ctx, ElementMode::VertexEdge, a, b, false);
        assert_eq!(fill, vec![expected]);
    }

    #[test]
    fn identical_endpoints_give_empty_fill() {
        let (mut mesh, object) = grid(false);
        let mut renderer = RecordingRenderer::new();
        let mut ctx = EditContext::new(&mut mesh, &mut renderer);
        let v = ElementId::vertex(object, 3);
        assert!(compute_fill(&mut ctx, ElementMode::VertexEdge, v, v, false).is_empty());
    }

    #[test]
    fn update_fills_around_interior_point() {
        let (mut mesh, object) = grid(false);
        let mut renderer = RecordingRenderer::new();
        let mut path = Path::new(ElementId::vertex(object, 0), 0, PathFlags::empty());
        path.insert_control_element(1, ElementId::vertex(object, 2));
        path.insert_control_element(2, ElementId::vertex(object, 4));
        {
            let mut ctx = EditContext::new(&mut mesh, &mut renderer);
            update_fills_around_index(&mut ctx, ElementMode::VertexEdge, &mut path, 1);
        }

        assert_eq!(path.fill(0).unwrap().len(), 2);
        assert_eq!(path.fill(1).unwrap().len(), 2);
        assert!(path.fill(2).unwrap().is_empty());
        assert_eq!(renderer.live_count(), 2);
    }
}
