// The functions defined here should remain functions, don't refactor them to
// methods, so they can be run against any mesh snapshot in tests and debug
// assertions alike.

use crate::{EdgeId, Endpoint, LoopId, Mesh, VertId};

#[derive(Debug, PartialEq, Eq)]
pub enum MeshCorrectness {
    Correct,
    MismatchingArrayLengths,
    InvalidVert(usize, VertCorrectness),
    InvalidEdge(usize, EdgeCorrectness),
    InvalidLoop(usize, LoopCorrectness),
    InvalidFace(usize, FaceCorrectness),
}

#[derive(Debug, PartialEq, Eq)]
pub enum VertCorrectness {
    IdAndIndexMismatch,
    EdgePointerOutOfRange,
    EdgeDoesNotTouchVertex,
}

#[derive(Debug, PartialEq, Eq)]
pub enum EdgeCorrectness {
    IdAndIndexMismatch,
    AbsentEndpoint(Endpoint),
    EdgeWithOnlyOnePoint,
    InactiveEndpoint(Endpoint),
    CycleIsBroken(Endpoint),
    LoopPointsToDifferentEdge(LoopId),
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoopCorrectness {
    IdAndIndexMismatch,
    FaceLoopChainIsBroken,
    RadialChainIsBroken,
    InactiveFace,
    EdgeDoesNotSpanCorner,
}

#[derive(Debug, PartialEq, Eq)]
pub enum FaceCorrectness {
    IdAndIndexMismatch,
    LoopPointsToDifferentFace,
    LengthMismatch { stored: usize, walked: usize },
}

/// If this returns `Correct` then it is safe to create handles to every
/// active element and walk every cycle.
pub fn is_correct(mesh: &Mesh) -> MeshCorrectness {
    if mesh.vert_data.len() != mesh.verts_meta.len()
        || mesh.edge_data.len() != mesh.edges_meta.len()
        || mesh.loop_data.len() != mesh.loops_meta.len()
        || mesh.face_data.len() != mesh.faces_meta.len()
    {
        return MeshCorrectness::MismatchingArrayLengths;
    }

    for (i, vert) in mesh.verts_meta.iter().enumerate() {
        if !vert.is_active {
            continue;
        }
        if vert.id.to_index() != i {
            return MeshCorrectness::InvalidVert(i, VertCorrectness::IdAndIndexMismatch);
        }
        if vert.edge_id.is_absent() {
            continue;
        }
        if vert.edge_id.to_index() >= mesh.edges_meta.len()
            || !mesh.edges_meta[vert.edge_id.to_index()].is_active
        {
            return MeshCorrectness::InvalidVert(i, VertCorrectness::EdgePointerOutOfRange);
        }
        if !mesh.edges_meta[vert.edge_id.to_index()].vert_ids.contains(&vert.id) {
            return MeshCorrectness::InvalidVert(i, VertCorrectness::EdgeDoesNotTouchVertex);
        }
    }

    for (i, edge) in mesh.edges_meta.iter().enumerate() {
        if !edge.is_active {
            continue;
        }
        if edge.id.to_index() != i {
            return MeshCorrectness::InvalidEdge(i, EdgeCorrectness::IdAndIndexMismatch);
        }
        for (endpoint, v) in [(Endpoint::V1, edge.vert_ids[0]), (Endpoint::V2, edge.vert_ids[1])] {
            if v.is_absent() {
                return MeshCorrectness::InvalidEdge(i, EdgeCorrectness::AbsentEndpoint(endpoint));
            }
            if !mesh.verts_meta[v.to_index()].is_active {
                return MeshCorrectness::InvalidEdge(i, EdgeCorrectness::InactiveEndpoint(endpoint));
            }
        }
        if edge.vert_ids[0] == edge.vert_ids[1] {
            return MeshCorrectness::InvalidEdge(i, EdgeCorrectness::EdgeWithOnlyOnePoint);
        }
        for (endpoint, v) in [(Endpoint::V1, edge.vert_ids[0]), (Endpoint::V2, edge.vert_ids[1])] {
            if !disk_cycle_contains(mesh, v, edge.id) {
                return MeshCorrectness::InvalidEdge(i, EdgeCorrectness::CycleIsBroken(endpoint));
            }
        }
        if !edge.loop_id.is_absent() {
            let l = &mesh.loops_meta[edge.loop_id.to_index()];
            if !l.is_active || l.edge_id != edge.id {
                return MeshCorrectness::InvalidEdge(
                    i,
                    EdgeCorrectness::LoopPointsToDifferentEdge(edge.loop_id),
                );
            }
        }
    }

    for (i, l) in mesh.loops_meta.iter().enumerate() {
        if !l.is_active {
            continue;
        }
        if l.id.to_index() != i {
            return MeshCorrectness::InvalidLoop(i, LoopCorrectness::IdAndIndexMismatch);
        }
        if l.next_id.is_absent()
            || l.prev_id.is_absent()
            || mesh.loops_meta[l.next_id.to_index()].prev_id != l.id
            || mesh.loops_meta[l.prev_id.to_index()].next_id != l.id
        {
            return MeshCorrectness::InvalidLoop(i, LoopCorrectness::FaceLoopChainIsBroken);
        }
        if l.radial_next_id.is_absent()
            || l.radial_prev_id.is_absent()
            || mesh.loops_meta[l.radial_next_id.to_index()].radial_prev_id != l.id
            || mesh.loops_meta[l.radial_prev_id.to_index()].radial_next_id != l.id
            || mesh.loops_meta[l.radial_next_id.to_index()].edge_id != l.edge_id
        {
            return MeshCorrectness::InvalidLoop(i, LoopCorrectness::RadialChainIsBroken);
        }
        if l.face_id.is_absent() || !mesh.faces_meta[l.face_id.to_index()].is_active {
            return MeshCorrectness::InvalidLoop(i, LoopCorrectness::InactiveFace);
        }

        let next_vert = mesh.loops_meta[l.next_id.to_index()].vert_id;
        if l.edge_id.is_absent() || !mesh.edge_handle(l.edge_id).connects(l.vert_id, next_vert) {
            return MeshCorrectness::InvalidLoop(i, LoopCorrectness::EdgeDoesNotSpanCorner);
        }
    }

    for (i, face) in mesh.faces_meta.iter().enumerate() {
        if !face.is_active {
            continue;
        }
        if face.id.to_index() != i {
            return MeshCorrectness::InvalidFace(i, FaceCorrectness::IdAndIndexMismatch);
        }
        if face.loop_id.is_absent() || mesh.loops_meta[face.loop_id.to_index()].face_id != face.id {
            return MeshCorrectness::InvalidFace(i, FaceCorrectness::LoopPointsToDifferentFace);
        }

        let handle = mesh.face_handle(face.id);
        let walked = handle.loops().take(face.len + 1).count();
        if walked != face.len || handle.loops().any(|l| l.face().id() != face.id) {
            return MeshCorrectness::InvalidFace(
                i,
                FaceCorrectness::LengthMismatch {
                    stored: face.len,
                    walked,
                },
            );
        }
    }

    MeshCorrectness::Correct
}

/// Walk the disk cycle of `vert` looking for `edge`, giving up after visiting
/// more edges than exist.
fn disk_cycle_contains(mesh: &Mesh, vert: VertId, edge: EdgeId) -> bool {
    let start = mesh.verts_meta[vert.to_index()].edge_id;
    if start.is_absent() {
        return false;
    }

    let mut current = start;
    for _ in 0..mesh.edges_meta.len() {
        if current == edge {
            return true;
        }
        let e = &mesh.edges_meta[current.to_index()];
        if !e.is_active || !e.vert_ids.contains(&vert) {
            return false;
        }
        current = e.cycle(vert).next_edge;
        if current.is_absent() || current == start {
            return false;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_meshes;
    use crate::FaceId;

    #[test]
    fn test_fixtures_are_correct() {
        assert_eq!(is_correct(&test_meshes::triangle()), MeshCorrectness::Correct);
        assert_eq!(is_correct(&test_meshes::grid(4, 3)), MeshCorrectness::Correct);
        assert_eq!(is_correct(&test_meshes::fan_of_three()), MeshCorrectness::Correct);
    }

    #[test]
    fn test_detects_broken_face_loop() {
        let mut mesh = test_meshes::square();
        mesh.faces_meta[0].len = 3;
        assert_eq!(
            is_correct(&mesh),
            MeshCorrectness::InvalidFace(0, FaceCorrectness::LengthMismatch { stored: 3, walked: 4 })
        );
    }

    #[test]
    fn test_detects_wrong_corner_edge() {
        let mut mesh = test_meshes::square();
        let l = mesh.face_handle(FaceId(0)).loop_().id();
        mesh.loops_meta[l.to_index()].vert_id = VertId(2);
        assert!(matches!(
            is_correct(&mesh),
            MeshCorrectness::InvalidLoop(_, LoopCorrectness::EdgeDoesNotSpanCorner)
        ));
    }
}
