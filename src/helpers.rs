use crate::{EdgeId, FaceId, LoopId, Mesh, StarCycleNode, VertId};

/// WARNING: These functions can and will break invariants of the mesh,
/// use with extreme care.

/// Insert `edge_id` into the disk cycle of `vert_id`, which must be one of its
/// endpoints.
pub(crate) fn disk_append(edge_id: EdgeId, vert_id: VertId, mesh: &mut Mesh) {
    let first = mesh.verts_meta[vert_id.to_index()].edge_id;
    if first.is_absent() {
        mesh.verts_meta[vert_id.to_index()].edge_id = edge_id;
        *mesh.edges_meta[edge_id.to_index()].cycle_mut(vert_id) = StarCycleNode {
            prev_edge: edge_id,
            next_edge: edge_id,
        };
        return;
    }

    let last = mesh.edges_meta[first.to_index()].cycle(vert_id).prev_edge;
    *mesh.edges_meta[edge_id.to_index()].cycle_mut(vert_id) = StarCycleNode {
        prev_edge: last,
        next_edge: first,
    };
    mesh.edges_meta[first.to_index()].cycle_mut(vert_id).prev_edge = edge_id;
    mesh.edges_meta[last.to_index()].cycle_mut(vert_id).next_edge = edge_id;
}

/// Detach `edge_id` from the disk cycle of `vert_id`. The vertex keeps
/// pointing at a remaining edge, or at nothing if it becomes loose.
pub(crate) fn disk_remove(edge_id: EdgeId, vert_id: VertId, mesh: &mut Mesh) {
    let cycle = mesh.edges_meta[edge_id.to_index()].cycle(vert_id).clone();

    if cycle.next_edge == edge_id {
        mesh.verts_meta[vert_id.to_index()].edge_id = EdgeId::new_absent();
    } else {
        // Attach the prior and next pointers to each other, eliminating all
        // references to the current edge.
        mesh.edges_meta[cycle.prev_edge.to_index()]
            .cycle_mut(vert_id)
            .next_edge = cycle.next_edge;
        mesh.edges_meta[cycle.next_edge.to_index()]
            .cycle_mut(vert_id)
            .prev_edge = cycle.prev_edge;

        let vert = &mut mesh.verts_meta[vert_id.to_index()];
        if vert.edge_id == edge_id {
            vert.edge_id = cycle.next_edge;
        }
    }

    *mesh.edges_meta[edge_id.to_index()].cycle_mut(vert_id) = StarCycleNode {
        prev_edge: EdgeId::new_absent(),
        next_edge: EdgeId::new_absent(),
    };
}

/// Insert `loop_id` into the radial cycle of `edge_id`.
pub(crate) fn radial_append(edge_id: EdgeId, loop_id: LoopId, mesh: &mut Mesh) {
    mesh.loops_meta[loop_id.to_index()].edge_id = edge_id;

    let first = mesh.edges_meta[edge_id.to_index()].loop_id;
    if first.is_absent() {
        mesh.edges_meta[edge_id.to_index()].loop_id = loop_id;
        let l = &mut mesh.loops_meta[loop_id.to_index()];
        l.radial_next_id = loop_id;
        l.radial_prev_id = loop_id;
        return;
    }

    let last = mesh.loops_meta[first.to_index()].radial_prev_id;
    let l = &mut mesh.loops_meta[loop_id.to_index()];
    l.radial_prev_id = last;
    l.radial_next_id = first;
    mesh.loops_meta[first.to_index()].radial_prev_id = loop_id;
    mesh.loops_meta[last.to_index()].radial_next_id = loop_id;
}

/// Detach `loop_id` from the radial cycle of its edge.
pub(crate) fn radial_remove(loop_id: LoopId, mesh: &mut Mesh) {
    let l = &mesh.loops_meta[loop_id.to_index()];
    let (edge_id, next, prev) = (l.edge_id, l.radial_next_id, l.radial_prev_id);

    if next == loop_id {
        mesh.edges_meta[edge_id.to_index()].loop_id = LoopId::new_absent();
    } else {
        mesh.loops_meta[next.to_index()].radial_prev_id = prev;
        mesh.loops_meta[prev.to_index()].radial_next_id = next;

        let edge = &mut mesh.edges_meta[edge_id.to_index()];
        if edge.loop_id == loop_id {
            edge.loop_id = next;
        }
    }

    let l = &mut mesh.loops_meta[loop_id.to_index()];
    l.radial_next_id = LoopId::new_absent();
    l.radial_prev_id = LoopId::new_absent();
    l.edge_id = EdgeId::new_absent();
}

pub(crate) fn disable_vert_meta(vert_id: VertId, mesh: &mut Mesh) {
    let vert = &mut mesh.verts_meta[vert_id.to_index()];
    debug_assert!(vert.is_active);
    vert.is_active = false;
    vert.edge_id = EdgeId::new_absent();
    mesh.deleted_verts += 1;
}

pub(crate) fn disable_edge_meta(edge_id: EdgeId, mesh: &mut Mesh) {
    let edge = &mut mesh.edges_meta[edge_id.to_index()];
    debug_assert!(edge.is_active);

    // Break every single pointer in this edge.
    edge.is_active = false;
    edge.vert_ids = [VertId::new_absent(); 2];
    edge.loop_id = LoopId::new_absent();
    edge.v1_cycle = StarCycleNode {
        prev_edge: EdgeId::new_absent(),
        next_edge: EdgeId::new_absent(),
    };
    edge.v2_cycle = StarCycleNode {
        prev_edge: EdgeId::new_absent(),
        next_edge: EdgeId::new_absent(),
    };
    mesh.deleted_edges += 1;
}

pub(crate) fn disable_loop_meta(loop_id: LoopId, mesh: &mut Mesh) {
    let l = &mut mesh.loops_meta[loop_id.to_index()];
    debug_assert!(l.is_active);

    l.is_active = false;
    l.vert_id = VertId::new_absent();
    l.edge_id = EdgeId::new_absent();
    l.face_id = FaceId::new_absent();
    l.next_id = LoopId::new_absent();
    l.prev_id = LoopId::new_absent();
    l.radial_next_id = LoopId::new_absent();
    l.radial_prev_id = LoopId::new_absent();
    mesh.deleted_loops += 1;
}

pub(crate) fn disable_face_meta(face_id: FaceId, mesh: &mut Mesh) {
    let face = &mut mesh.faces_meta[face_id.to_index()];
    debug_assert!(face.is_active);

    face.is_active = false;
    face.loop_id = LoopId::new_absent();
    face.len = 0;
    mesh.deleted_faces += 1;
}
