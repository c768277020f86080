//! Destructive operations on the mesh: kill primitives, contextual deletion
//! and defragmentation.
use std::collections::{BTreeSet, HashMap};

use crate::elements::ElemId;
use crate::error::MeshError;
use crate::flags::OpFlags;
use crate::helpers::{
    disable_edge_meta, disable_face_meta, disable_loop_meta, disable_vert_meta, disk_remove,
    radial_remove,
};
use crate::{EdgeId, FaceId, LoopId, Mesh, VertId};

/// Helper macro to avoid redundancy when defragmenting mesh data.
macro_rules! compact_mesh_data {
    ($mesh:ident, $data:ident, $meta:ident) => {
        let keep: Vec<bool> = $mesh.$meta.iter().map(|m| m.is_active).collect();
        $mesh.$meta.retain(|m| m.is_active);
        $mesh.$data.compact(&keep);
        debug_assert!($mesh.$meta.iter().enumerate().all(|(i, m)| m.id.to_index() == i));
    };
}

/// What the contextual delete removes given the flagged input, mirroring the
/// delete operator's `context` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteContext {
    /// Flagged vertices with everything using them.
    Verts = 1,
    /// Flagged edges, then flagged vertices left loose.
    Edges = 2,
    /// Flagged faces only, edges and vertices stay.
    FacesOnly = 3,
    /// Flagged edges with their faces, vertices stay.
    EdgesFaces = 4,
    /// Flagged faces with the edges and vertices no kept face uses.
    Faces = 5,
    /// As `Faces`, but boundary edges and their vertices are kept.
    FacesKeepBoundary = 6,
    /// Exactly the flagged elements, in face, edge, vertex order.
    TaggedOnly = 7,
}

impl TryFrom<i32> for DeleteContext {
    type Error = MeshError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => DeleteContext::Verts,
            2 => DeleteContext::Edges,
            3 => DeleteContext::FacesOnly,
            4 => DeleteContext::EdgesFaces,
            5 => DeleteContext::Faces,
            6 => DeleteContext::FacesKeepBoundary,
            7 => DeleteContext::TaggedOnly,
            _ => {
                return Err(MeshError::InvalidEnumValue {
                    slot: "context".to_string(),
                    value,
                })
            }
        })
    }
}

/// Elements a contextual delete will kill, resolved against the flags at
/// planning time. Killing an element also kills everything that uses it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletePlan {
    pub faces: BTreeSet<FaceId>,
    pub edges: BTreeSet<EdgeId>,
    pub verts: BTreeSet<VertId>,
    /// Killed only if no edge uses them once everything above is gone.
    pub verts_if_loose: BTreeSet<VertId>,
}

impl DeletePlan {
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
            && self.edges.is_empty()
            && self.verts.is_empty()
            && self.verts_if_loose.is_empty()
    }

    fn edge_removed(&self, mesh: &Mesh, edge_id: EdgeId) -> bool {
        self.edges.contains(&edge_id)
            || mesh
                .edge_handle(edge_id)
                .vertex_ids()
                .iter()
                .any(|v| self.verts.contains(v))
    }

    /// True if executing the plan on `mesh` removes `elem`.
    pub fn will_remove(&self, mesh: &Mesh, elem: ElemId) -> bool {
        if !mesh.is_elem_active(elem) {
            return false;
        }

        match elem {
            ElemId::Vert(v) => {
                self.verts.contains(&v)
                    || (self.verts_if_loose.contains(&v)
                        && mesh
                            .vert_handle(v)
                            .star_edges()
                            .all(|e| self.edge_removed(mesh, e.id())))
            }
            ElemId::Edge(e) => self.edge_removed(mesh, e),
            ElemId::Loop(l) => {
                let face = mesh.loops_meta[l.to_index()].face_id;
                self.will_remove(mesh, ElemId::Face(face))
            }
            ElemId::Face(f) => {
                self.faces.contains(&f)
                    || mesh
                        .face_handle(f)
                        .edge_ids()
                        .any(|e| self.edge_removed(mesh, e))
            }
        }
    }
}

type FragmentationMaps = (
    HashMap<VertId, usize>,
    HashMap<EdgeId, usize>,
    HashMap<LoopId, usize>,
    HashMap<FaceId, usize>,
);

impl Mesh {
    /// Remove a face and its loops. Edges and vertices stay.
    pub fn kill_face(&mut self, face_id: FaceId) {
        let loops: Vec<LoopId> = self.face_handle(face_id).loops().map(|l| l.id()).collect();
        for loop_id in loops {
            radial_remove(loop_id, self);
            disable_loop_meta(loop_id, self);
        }
        disable_face_meta(face_id, self);

        self.select_history.retain(|e| *e != ElemId::Face(face_id));
        if self.active_face == Some(face_id) {
            self.active_face = None;
        }
    }

    /// Remove an edge together with every face using it.
    pub fn kill_edge(&mut self, edge_id: EdgeId) {
        let faces: Vec<FaceId> = self.edge_handle(edge_id).faces().collect();
        for face_id in faces {
            self.kill_face(face_id);
        }

        let [v1, v2] = self.edges_meta[edge_id.to_index()].vert_ids;
        disk_remove(edge_id, v1, self);
        disk_remove(edge_id, v2, self);
        disable_edge_meta(edge_id, self);

        self.select_history.retain(|e| *e != ElemId::Edge(edge_id));
    }

    /// Remove a vertex together with every edge and face using it.
    pub fn kill_vert(&mut self, vert_id: VertId) {
        let edges: Vec<EdgeId> = self.vert_handle(vert_id).star_edges().map(|e| e.id()).collect();
        for edge_id in edges {
            self.kill_edge(edge_id);
        }
        disable_vert_meta(vert_id, self);

        self.select_history.retain(|e| *e != ElemId::Vert(vert_id));
    }

    /// Resolve which elements a delete in `context` removes, given the
    /// elements carrying `flag`. The mesh is not modified.
    pub fn plan_delete(&self, flag: OpFlags, context: DeleteContext) -> DeletePlan {
        let mut verts: BTreeSet<VertId> = self
            .vert_ids()
            .filter(|v| self.oflag_test(*v, flag))
            .collect();
        let mut edges: BTreeSet<EdgeId> = self
            .edge_ids()
            .filter(|e| self.oflag_test(*e, flag))
            .collect();
        let faces: BTreeSet<FaceId> = self
            .face_ids()
            .filter(|f| self.oflag_test(*f, flag))
            .collect();

        let mut plan = DeletePlan::default();
        match context {
            DeleteContext::Verts => plan.verts = verts,
            DeleteContext::Edges => {
                // Flush down to the endpoints, they go once nothing uses them.
                for e in &edges {
                    verts.extend(self.edge_handle(*e).vertex_ids());
                }
                plan.edges = edges;
                plan.verts_if_loose = verts;
            }
            DeleteContext::FacesOnly => plan.faces = faces,
            DeleteContext::EdgesFaces => plan.edges = edges,
            DeleteContext::Faces | DeleteContext::FacesKeepBoundary => {
                for f in &faces {
                    for l in self.face_handle(*f).loops() {
                        verts.insert(l.vert().id());
                        edges.insert(l.edge().id());
                    }
                }

                // Anything a surviving face uses survives.
                for f in self.face_ids().filter(|f| !faces.contains(f)) {
                    for l in self.face_handle(f).loops() {
                        verts.remove(&l.vert().id());
                        edges.remove(&l.edge().id());
                    }
                }

                for e in self.edge_ids() {
                    let edge = self.edge_handle(e);
                    if context == DeleteContext::FacesKeepBoundary && edge.is_boundary() {
                        edges.remove(&e);
                    }
                    if !edges.contains(&e) {
                        for v in edge.vertex_ids() {
                            verts.remove(&v);
                        }
                    }
                }

                plan.faces = faces;
                plan.edges = edges;
                plan.verts = verts;
            }
            DeleteContext::TaggedOnly => {
                plan.faces = faces;
                plan.edges = edges;
                plan.verts = verts;
            }
        }

        plan
    }

    /// Kill the elements of `plan`: faces, then edges, then vertices, then the
    /// vertices left loose.
    pub fn execute_delete(&mut self, plan: &DeletePlan) {
        for f in &plan.faces {
            if self.faces_meta[f.to_index()].is_active {
                self.kill_face(*f);
            }
        }
        for e in &plan.edges {
            if self.edges_meta[e.to_index()].is_active {
                self.kill_edge(*e);
            }
        }
        for v in &plan.verts {
            if self.verts_meta[v.to_index()].is_active {
                self.kill_vert(*v);
            }
        }
        for v in &plan.verts_if_loose {
            let vert = &self.verts_meta[v.to_index()];
            if vert.is_active && vert.edge_id.is_absent() {
                self.kill_vert(*v);
            }
        }
    }

    /// Delete the elements carrying `flag` according to `context`.
    pub fn delete_oflag_context(&mut self, flag: OpFlags, context: DeleteContext) {
        let plan = self.plan_delete(flag, context);
        self.execute_delete(&plan);
    }

    /// Maps between old ids and ids after applying defragmentation.
    pub fn compute_fragmentation_maps(&self) -> FragmentationMaps {
        let mut vertex_fragmentation = HashMap::<VertId, usize>::new();
        for (counter, v) in self.verts_meta.iter().filter(|v| v.is_active).enumerate() {
            vertex_fragmentation.insert(v.id, counter);
        }
        vertex_fragmentation.insert(VertId::ABSENT, usize::MAX);

        let mut edge_fragmentation = HashMap::<EdgeId, usize>::new();
        for (counter, e) in self.edges_meta.iter().filter(|e| e.is_active).enumerate() {
            edge_fragmentation.insert(e.id, counter);
        }
        edge_fragmentation.insert(EdgeId::ABSENT, usize::MAX);

        let mut loop_fragmentation = HashMap::<LoopId, usize>::new();
        for (counter, l) in self.loops_meta.iter().filter(|l| l.is_active).enumerate() {
            loop_fragmentation.insert(l.id, counter);
        }
        loop_fragmentation.insert(LoopId::ABSENT, usize::MAX);

        let mut face_fragmentation = HashMap::<FaceId, usize>::new();
        for (counter, f) in self.faces_meta.iter().filter(|f| f.is_active).enumerate() {
            face_fragmentation.insert(f.id, counter);
        }
        face_fragmentation.insert(FaceId::ABSENT, usize::MAX);

        (
            vertex_fragmentation,
            edge_fragmentation,
            loop_fragmentation,
            face_fragmentation,
        )
    }

    /// Drop every removed element and renumber the survivors densely,
    /// preserving their relative order. Invalidates all previously held ids.
    pub fn compact(&mut self) {
        let (vert_frag, edge_frag, loop_frag, face_frag) = self.compute_fragmentation_maps();
        let v = |id: VertId| VertId(vert_frag[&id]);
        let e = |id: EdgeId| EdgeId(edge_frag[&id]);
        let l = |id: LoopId| LoopId(loop_frag[&id]);
        let f = |id: FaceId| FaceId(face_frag[&id]);

        for vert in self.verts_meta.iter_mut().filter(|m| m.is_active) {
            vert.id = v(vert.id);
            vert.edge_id = e(vert.edge_id);
        }

        for edge in self.edges_meta.iter_mut().filter(|m| m.is_active) {
            edge.id = e(edge.id);
            edge.vert_ids = [v(edge.vert_ids[0]), v(edge.vert_ids[1])];
            edge.loop_id = l(edge.loop_id);
            edge.v1_cycle.next_edge = e(edge.v1_cycle.next_edge);
            edge.v1_cycle.prev_edge = e(edge.v1_cycle.prev_edge);
            edge.v2_cycle.next_edge = e(edge.v2_cycle.next_edge);
            edge.v2_cycle.prev_edge = e(edge.v2_cycle.prev_edge);
        }

        for lp in self.loops_meta.iter_mut().filter(|m| m.is_active) {
            lp.id = l(lp.id);
            lp.vert_id = v(lp.vert_id);
            lp.edge_id = e(lp.edge_id);
            lp.face_id = f(lp.face_id);
            lp.next_id = l(lp.next_id);
            lp.prev_id = l(lp.prev_id);
            lp.radial_next_id = l(lp.radial_next_id);
            lp.radial_prev_id = l(lp.radial_prev_id);
        }

        for face in self.faces_meta.iter_mut().filter(|m| m.is_active) {
            face.id = f(face.id);
            face.loop_id = l(face.loop_id);
        }

        self.select_history = self
            .select_history
            .iter()
            .map(|elem| match *elem {
                ElemId::Vert(id) => ElemId::Vert(v(id)),
                ElemId::Edge(id) => ElemId::Edge(e(id)),
                ElemId::Loop(id) => ElemId::Loop(l(id)),
                ElemId::Face(id) => ElemId::Face(f(id)),
            })
            .collect();
        self.active_face = self.active_face.map(f);

        let mesh = self;
        compact_mesh_data!(mesh, vert_data, verts_meta);
        compact_mesh_data!(mesh, edge_data, edges_meta);
        compact_mesh_data!(mesh, loop_data, loops_meta);
        compact_mesh_data!(mesh, face_data, faces_meta);

        mesh.deleted_verts = 0;
        mesh.deleted_edges = 0;
        mesh.deleted_loops = 0;
        mesh.deleted_faces = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_meshes;
    use crate::validation::{is_correct, MeshCorrectness};

    fn flag_faces(mesh: &mut Mesh, faces: &[FaceId]) {
        for f in faces {
            mesh.oflag_enable(*f, OpFlags::DEL_INPUT);
        }
    }

    #[test]
    fn test_kill_edge_removes_faces() {
        let mut mesh = test_meshes::two_triangles();
        // Shared diagonal.
        mesh.kill_edge(EdgeId(2));

        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.edge_count(), 4);
        assert_eq!(mesh.loop_count(), 0);
        assert_eq!(is_correct(&mesh), MeshCorrectness::Correct);
    }

    #[test]
    fn test_delete_faces_keeps_shared_geometry() {
        let mut mesh = test_meshes::two_triangles();
        flag_faces(&mut mesh, &[FaceId(0)]);
        mesh.delete_oflag_context(OpFlags::DEL_INPUT, DeleteContext::Faces);

        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.edge_count(), 3);
        assert_eq!(mesh.vert_count(), 3);
        assert!(!mesh.is_elem_active(ElemId::Vert(VertId(1))));
        assert_eq!(is_correct(&mesh), MeshCorrectness::Correct);
    }

    #[test]
    fn test_delete_faces_keep_boundary() {
        let mut mesh = test_meshes::two_triangles();
        flag_faces(&mut mesh, &[FaceId(0)]);
        let plan = mesh.plan_delete(OpFlags::DEL_INPUT, DeleteContext::FacesKeepBoundary);

        assert_eq!(plan.faces.len(), 1);
        assert!(plan.edges.is_empty());
        assert!(plan.verts.is_empty());
    }

    #[test]
    fn test_delete_faces_only() {
        let mut mesh = test_meshes::two_triangles();
        flag_faces(&mut mesh, &[FaceId(0), FaceId(1)]);
        mesh.delete_oflag_context(OpFlags::DEL_INPUT, DeleteContext::FacesOnly);

        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.edge_count(), 5);
        assert_eq!(mesh.vert_count(), 4);
    }

    #[test]
    fn test_delete_edges_drops_loose_endpoints() {
        let mut mesh = test_meshes::two_triangles();
        mesh.oflag_enable(EdgeId(0), OpFlags::DEL_INPUT);
        mesh.delete_oflag_context(OpFlags::DEL_INPUT, DeleteContext::Edges);

        // Vertex 1 still has an edge to vertex 2.
        assert_eq!(mesh.vert_count(), 4);
        assert_eq!(mesh.edge_count(), 4);
        assert_eq!(mesh.face_count(), 1);

        mesh.oflag_enable(EdgeId(1), OpFlags::DEL_INPUT);
        mesh.delete_oflag_context(OpFlags::DEL_INPUT, DeleteContext::Edges);
        assert_eq!(mesh.vert_count(), 3);
        assert_eq!(is_correct(&mesh), MeshCorrectness::Correct);
    }

    #[test]
    fn test_delete_verts() {
        let mut mesh = test_meshes::two_triangles();
        mesh.oflag_enable(VertId(0), OpFlags::DEL_INPUT);
        mesh.delete_oflag_context(OpFlags::DEL_INPUT, DeleteContext::Verts);

        assert_eq!(mesh.vert_count(), 3);
        assert_eq!(mesh.edge_count(), 2);
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(is_correct(&mesh), MeshCorrectness::Correct);
    }

    #[test]
    fn test_plan_predicts_removal() {
        let mut mesh = test_meshes::two_triangles();
        flag_faces(&mut mesh, &[FaceId(0)]);
        let plan = mesh.plan_delete(OpFlags::DEL_INPUT, DeleteContext::Faces);

        let before = test_meshes::all_geom(&mesh);
        let predicted: Vec<ElemId> = before
            .iter()
            .copied()
            .filter(|e| plan.will_remove(&mesh, *e))
            .collect();
        mesh.execute_delete(&plan);
        let removed: Vec<ElemId> = before
            .iter()
            .copied()
            .filter(|e| !mesh.is_elem_active(*e))
            .collect();
        assert_eq!(predicted, removed);
        assert_eq!(removed.len(), 4);
    }

    #[test]
    fn test_unknown_context_rejected() {
        assert_eq!(
            DeleteContext::try_from(9),
            Err(MeshError::InvalidEnumValue {
                slot: "context".to_string(),
                value: 9
            })
        );
        assert_eq!(DeleteContext::try_from(6), Ok(DeleteContext::FacesKeepBoundary));
    }

    #[test]
    fn test_compact_preserves_topology() {
        let mut mesh = test_meshes::grid(3, 2);
        mesh.set_active_face(Some(FaceId(5)));
        mesh.kill_face(FaceId(0));
        mesh.kill_vert(VertId(0));
        let faces_before = mesh.face_count();
        let edges_before = mesh.edge_count();

        mesh.compact();

        assert_eq!(mesh.face_count(), faces_before);
        assert_eq!(mesh.edge_count(), edges_before);
        assert_eq!(mesh.faces_meta.len(), faces_before);
        assert_eq!(mesh.active_face(), Some(FaceId(4)));
        assert_eq!(is_correct(&mesh), MeshCorrectness::Correct);
    }
}
