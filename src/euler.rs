//! Topology-preserving creation and rewiring primitives. Every public function
//! in this module leaves the mesh valid.
use std::collections::BTreeSet;

use crate::elements::ElemId;
use crate::helpers::{disable_vert_meta, disk_append, disk_remove, radial_append, radial_remove};
use crate::{
    EdgeId, EdgeMetaData, FaceId, FaceMetaData, LoopId, LoopMetaData, Mesh, StarCycleNode, Vec3,
    VertId, VertMetaData,
};

impl Mesh {
    /// Create a loose vertex. `example` must belong to this mesh, its header
    /// flags, normal and attributes are copied onto the new vertex.
    pub fn add_vert(&mut self, co: Vec3, example: Option<VertId>) -> VertId {
        let id = VertId(self.verts_meta.len());
        self.verts_meta.push(VertMetaData {
            id,
            is_active: true,
            edge_id: EdgeId::new_absent(),
            co,
            no: Vec3::zeros(),
            header: Default::default(),
            oflags: Default::default(),
        });
        self.vert_data.push_default();

        if let Some(example) = example {
            let source = &self.verts_meta[example.to_index()];
            let (header, no) = (source.header, source.no);
            let vert = &mut self.verts_meta[id.to_index()];
            vert.header = header;
            vert.no = no;
            self.vert_data.copy_element(example.to_index(), id.to_index());
        }

        id
    }

    /// Create an edge between two distinct vertices. Does not check for an
    /// existing edge, see [`Mesh::find_edge`].
    pub fn add_edge(&mut self, v1: VertId, v2: VertId, example: Option<EdgeId>) -> EdgeId {
        debug_assert!(v1 != v2);
        let id = EdgeId(self.edges_meta.len());
        self.edges_meta.push(EdgeMetaData {
            id,
            is_active: true,
            vert_ids: [v1, v2],
            loop_id: LoopId::new_absent(),
            v1_cycle: StarCycleNode::default(),
            v2_cycle: StarCycleNode::default(),
            header: Default::default(),
            oflags: Default::default(),
        });
        self.edge_data.push_default();

        disk_append(id, v1, self);
        disk_append(id, v2, self);

        if let Some(example) = example {
            self.edges_meta[id.to_index()].header = self.edges_meta[example.to_index()].header;
            self.edge_data.copy_element(example.to_index(), id.to_index());
        }

        id
    }

    /// Create a face whose corners are `verts`, in winding order. `edges[i]`
    /// must connect `verts[i]` and `verts[i + 1]` (cyclically).
    pub fn add_face(&mut self, verts: &[VertId], edges: &[EdgeId], example: Option<FaceId>) -> FaceId {
        debug_assert!(verts.len() >= 3 && verts.len() == edges.len());
        let id = FaceId(self.faces_meta.len());
        let first_loop = LoopId(self.loops_meta.len());
        let len = verts.len();

        for (i, vert_id) in verts.iter().enumerate() {
            debug_assert!({
                let [a, b] = self.edges_meta[edges[i].to_index()].vert_ids;
                let c = verts[(i + 1) % len];
                (a == *vert_id && b == c) || (a == c && b == *vert_id)
            });

            let loop_id = LoopId(first_loop.0 + i);
            self.loops_meta.push(LoopMetaData {
                id: loop_id,
                is_active: true,
                vert_id: *vert_id,
                edge_id: EdgeId::new_absent(),
                face_id: id,
                radial_next_id: LoopId::new_absent(),
                radial_prev_id: LoopId::new_absent(),
                next_id: LoopId(first_loop.0 + (i + 1) % len),
                prev_id: LoopId(first_loop.0 + (i + len - 1) % len),
            });
            self.loop_data.push_default();
            radial_append(edges[i], loop_id, self);
        }

        self.faces_meta.push(FaceMetaData {
            id,
            is_active: true,
            loop_id: first_loop,
            len,
            no: Vec3::zeros(),
            header: Default::default(),
            oflags: Default::default(),
        });
        self.face_data.push_default();
        self.faces_meta[id.to_index()].no = self.face_handle(id).compute_normal();

        if let Some(example) = example {
            self.faces_meta[id.to_index()].header = self.faces_meta[example.to_index()].header;
            self.face_data.copy_element(example.to_index(), id.to_index());
        }

        id
    }

    /// Create a face from its corners, reusing existing edges where possible.
    pub fn add_face_verts(&mut self, verts: &[VertId], example: Option<FaceId>) -> FaceId {
        let mut edges = Vec::with_capacity(verts.len());
        for i in 0..verts.len() {
            let (a, b) = (verts[i], verts[(i + 1) % verts.len()]);
            let edge = match self.find_edge(a, b) {
                Some(edge) => edge,
                None => self.add_edge(a, b, None),
            };
            edges.push(edge);
        }

        self.add_face(verts, &edges, example)
    }

    /// Any edge joining `a` and `b`.
    pub fn find_edge(&self, a: VertId, b: VertId) -> Option<EdgeId> {
        self.vert_handle(a)
            .star_edges()
            .find(|e| e.connects(a, b))
            .map(|e| e.id())
    }

    /// Another edge joining the same two vertices as `edge_id`.
    pub fn find_double_edge(&self, edge_id: EdgeId) -> Option<EdgeId> {
        let edge = self.edge_handle(edge_id);
        let [a, b] = edge.vertex_ids();
        self.vert_handle(a)
            .star_edges()
            .find(|e| e.id() != edge_id && e.connects(a, b))
            .map(|e| e.id())
    }

    /// Another face spanning exactly the same vertices as `face_id`.
    pub fn find_double_face(&self, face_id: FaceId) -> Option<FaceId> {
        let face = self.face_handle(face_id);
        let verts: BTreeSet<_> = face.vertex_ids().collect();
        let first = face.loop_().vert();

        first.incident_faces().find(|f| {
            *f != face_id && {
                let other = self.face_handle(*f);
                other.len() == face.len() && other.vertex_ids().collect::<BTreeSet<_>>() == verts
            }
        })
    }

    /// Merge `merge` into `keep`: every edge and loop using `merge` is moved
    /// onto `keep`, then `merge` is removed. The two must not share an edge.
    pub fn splice_vert(&mut self, keep: VertId, merge: VertId) {
        debug_assert!(keep != merge);
        debug_assert!(self.find_edge(keep, merge).is_none());

        let loops: Vec<LoopId> = self.vert_handle(merge).incident_loops().map(|l| l.id()).collect();
        for loop_id in loops {
            self.loops_meta[loop_id.to_index()].vert_id = keep;
        }

        let edges: Vec<EdgeId> = self.vert_handle(merge).star_edges().map(|e| e.id()).collect();
        for edge_id in edges {
            disk_remove(edge_id, merge, self);
            *self.edges_meta[edge_id.to_index()].at(merge) = keep;
            disk_append(edge_id, keep, self);
        }

        disable_vert_meta(merge, self);
        self.select_history.retain(|e| *e != ElemId::Vert(merge));
    }

    /// Merge `merge` into `keep`, both joining the same vertices: the faces of
    /// `merge` move into the radial cycle of `keep`, then `merge` is removed.
    pub fn splice_edge(&mut self, keep: EdgeId, merge: EdgeId) {
        debug_assert!({
            let [a, b] = self.edges_meta[keep.to_index()].vert_ids;
            self.edge_handle(merge).connects(a, b)
        });

        let loops: Vec<LoopId> = self.edge_handle(merge).radial_loops().map(|l| l.id()).collect();
        for loop_id in loops {
            radial_remove(loop_id, self);
            radial_append(keep, loop_id, self);
        }

        self.kill_edge(merge);
    }

    /// Swap the endpoints of an edge, flipping its direction.
    pub fn edge_verts_swap(&mut self, edge_id: EdgeId) {
        let edge = &mut self.edges_meta[edge_id.to_index()];
        edge.vert_ids.swap(0, 1);
        std::mem::swap(&mut edge.v1_cycle, &mut edge.v2_cycle);
    }

    /// Reverse the winding of a face. Each corner keeps its vertex and its
    /// attributes, the normal is negated.
    pub fn reverse_face(&mut self, face_id: FaceId) {
        let loops: Vec<LoopId> = self.face_handle(face_id).loops().map(|l| l.id()).collect();
        let old_edges: Vec<EdgeId> = loops
            .iter()
            .map(|l| self.loops_meta[l.to_index()].edge_id)
            .collect();

        for loop_id in &loops {
            radial_remove(*loop_id, self);
        }

        let len = loops.len();
        for (i, loop_id) in loops.iter().enumerate() {
            let l = &mut self.loops_meta[loop_id.to_index()];
            std::mem::swap(&mut l.next_id, &mut l.prev_id);
            // Reversed, the corner now runs along what used to be the edge
            // arriving at it.
            radial_append(old_edges[(i + len - 1) % len], *loop_id, self);
        }

        let face = &mut self.faces_meta[face_id.to_index()];
        face.no = -face.no;
    }
}
