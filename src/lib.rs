//! A radial edge mesh together with the topological operators that duplicate,
//! split, delete, extrude and spin its elements.
use std::collections::BTreeMap;

use nalgebra::Vector3;

pub mod custom_data;
pub mod edge_handle;
pub mod elements;
pub mod error;
pub mod euler;
pub mod face_handle;
pub mod flags;
pub(crate) mod helpers;
pub mod id_map;
pub mod iterators;
pub mod loop_handle;
pub mod mesh_deleter;
pub mod normals;
pub mod operators;
pub mod validation;
pub mod vert_handle;

#[cfg(test)]
pub(crate) mod test_meshes;

use custom_data::{AttrDomain, CustomData};
use edge_handle::EdgeHandle;
use elements::ElemId;
use error::MeshError;
use face_handle::FaceHandle;
use flags::{HeaderFlags, OpFlags};
use loop_handle::LoopHandle;
use vert_handle::VertHandle;

pub type Vec3 = Vector3<f64>;

macro_rules! define_id_struct {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
        pub struct $name(pub(crate) usize);
        impl Default for $name {
            fn default() -> Self {
                Self(ABSENT)
            }
        }

        impl $name {
            pub const ABSENT: Self = Self(ABSENT);

            pub fn new_absent() -> Self {
                Self(ABSENT)
            }

            pub fn is_absent(&self) -> bool {
                self.0 == ABSENT
            }

            pub fn to_index(&self) -> usize {
                self.0
            }
        }
    };
}

pub const ABSENT: usize = usize::MAX;

define_id_struct!(VertId);
define_id_struct!(EdgeId);
define_id_struct!(LoopId);
define_id_struct!(FaceId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    V1,
    V2,
}

/// Radial edge mesh. Elements live in arenas and are addressed by index; a
/// removed element is only deactivated, so ids stay stable until
/// [`Mesh::compact`] is called.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub(crate) verts_meta: Vec<VertMetaData>,
    pub(crate) edges_meta: Vec<EdgeMetaData>,
    pub(crate) loops_meta: Vec<LoopMetaData>,
    pub(crate) faces_meta: Vec<FaceMetaData>,

    pub(crate) vert_data: CustomData,
    pub(crate) edge_data: CustomData,
    pub(crate) loop_data: CustomData,
    pub(crate) face_data: CustomData,

    /// Ordered selection history, most recent last.
    pub(crate) select_history: Vec<ElemId>,
    pub(crate) active_face: Option<FaceId>,

    pub(crate) deleted_verts: usize,
    pub(crate) deleted_edges: usize,
    pub(crate) deleted_loops: usize,
    pub(crate) deleted_faces: usize,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from vertex positions and polygons given as index lists.
    /// Edges are shared between polygons that reference the same pair of
    /// vertices.
    pub fn from_face_list(
        positions: impl IntoIterator<Item = Vec3>,
        faces: impl Iterator<Item = impl Iterator<Item = usize>>,
    ) -> Result<Self, MeshError> {
        let mut mesh = Self::new();
        let vert_ids: Vec<_> = positions
            .into_iter()
            .map(|co| mesh.add_vert(co, None))
            .collect();

        // Canonical representation of an edge is its sorted vertex indices.
        let mut edge_index_map = BTreeMap::<[usize; 2], EdgeId>::new();
        for (face_index, face) in faces.enumerate() {
            let face_vertices = face.collect::<Vec<_>>();
            if face_vertices.len() < 3 {
                return Err(MeshError::DegenerateFace { face: face_index });
            }

            let mut verts = Vec::with_capacity(face_vertices.len());
            let mut edges = Vec::with_capacity(face_vertices.len());
            for i in 0..face_vertices.len() {
                let v1 = face_vertices[i];
                let v2 = face_vertices[(i + 1) % face_vertices.len()];
                for index in [v1, v2] {
                    if index >= vert_ids.len() {
                        return Err(MeshError::FaceIndexOutOfRange {
                            face: face_index,
                            index,
                        });
                    }
                }
                if v1 == v2 {
                    return Err(MeshError::DegenerateFace { face: face_index });
                }

                let key = if v1 > v2 { [v2, v1] } else { [v1, v2] };
                let edge = match edge_index_map.get(&key) {
                    Some(edge) => *edge,
                    None => {
                        let edge = mesh.add_edge(vert_ids[v1], vert_ids[v2], None);
                        edge_index_map.insert(key, edge);
                        edge
                    }
                };

                verts.push(vert_ids[v1]);
                edges.push(edge);
            }

            mesh.add_face(&verts, &edges, None);
        }

        Ok(mesh)
    }

    /// Export active vertices and faces as a compact indexed face list.
    pub fn to_face_list(&self) -> (Vec<Vec3>, Vec<Vec<usize>>) {
        let (vert_frag, _, _, _) = self.compute_fragmentation_maps();

        let vertices = self.vert_ids().map(|v| self.vert_co(v)).collect();
        let faces = self
            .face_ids()
            .map(|f| {
                self.face_handle(f)
                    .vertex_ids()
                    .map(|v| vert_frag[&v])
                    .collect()
            })
            .collect();

        (vertices, faces)
    }

    pub fn vert_handle(&self, id: VertId) -> VertHandle<'_> {
        VertHandle::new(id, self)
    }

    pub fn edge_handle(&self, id: EdgeId) -> EdgeHandle<'_> {
        EdgeHandle::new(id, self)
    }

    pub fn loop_handle(&self, id: LoopId) -> LoopHandle<'_> {
        LoopHandle::new(id, self)
    }

    pub fn face_handle(&self, id: FaceId) -> FaceHandle<'_> {
        FaceHandle::new(id, self)
    }

    /// Count of active vertices.
    pub fn vert_count(&self) -> usize {
        self.verts_meta.len() - self.deleted_verts
    }

    /// Count of active edges.
    pub fn edge_count(&self) -> usize {
        self.edges_meta.len() - self.deleted_edges
    }

    /// Count of active loops.
    pub fn loop_count(&self) -> usize {
        self.loops_meta.len() - self.deleted_loops
    }

    /// Count of active faces.
    pub fn face_count(&self) -> usize {
        self.faces_meta.len() - self.deleted_faces
    }

    pub fn vert_ids(&self) -> impl Iterator<Item = VertId> + '_ {
        self.verts_meta.iter().filter(|v| v.is_active).map(|v| v.id)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges_meta.iter().filter(|e| e.is_active).map(|e| e.id)
    }

    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces_meta.iter().filter(|f| f.is_active).map(|f| f.id)
    }

    pub fn vert_co(&self, id: VertId) -> Vec3 {
        self.verts_meta[id.to_index()].co
    }

    pub fn set_vert_co(&mut self, id: VertId, co: Vec3) {
        self.verts_meta[id.to_index()].co = co;
    }

    /// True if `elem` addresses a live element of this mesh.
    pub fn is_elem_active(&self, elem: ElemId) -> bool {
        match elem {
            ElemId::Vert(id) => self.verts_meta.get(id.to_index()).is_some_and(|v| v.is_active),
            ElemId::Edge(id) => self.edges_meta.get(id.to_index()).is_some_and(|e| e.is_active),
            ElemId::Loop(id) => self.loops_meta.get(id.to_index()).is_some_and(|l| l.is_active),
            ElemId::Face(id) => self.faces_meta.get(id.to_index()).is_some_and(|f| f.is_active),
        }
    }

    pub fn select_history(&self) -> &[ElemId] {
        &self.select_history
    }

    pub fn push_select_history(&mut self, elem: ElemId) {
        debug_assert!(self.is_elem_active(elem));
        self.select_history.push(elem);
    }

    pub fn active_face(&self) -> Option<FaceId> {
        self.active_face
    }

    pub fn set_active_face(&mut self, face: Option<FaceId>) {
        self.active_face = face;
    }

    pub fn custom_data(&self, domain: AttrDomain) -> &CustomData {
        match domain {
            AttrDomain::Vert => &self.vert_data,
            AttrDomain::Edge => &self.edge_data,
            AttrDomain::Loop => &self.loop_data,
            AttrDomain::Face => &self.face_data,
        }
    }

    pub fn custom_data_mut(&mut self, domain: AttrDomain) -> &mut CustomData {
        match domain {
            AttrDomain::Vert => &mut self.vert_data,
            AttrDomain::Edge => &mut self.edge_data,
            AttrDomain::Loop => &mut self.loop_data,
            AttrDomain::Face => &mut self.face_data,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct VertMetaData {
    pub(crate) id: VertId,
    pub(crate) is_active: bool,
    /// Points to any edge that touches this vertex.
    pub(crate) edge_id: EdgeId,
    pub(crate) co: Vec3,
    pub(crate) no: Vec3,
    pub(crate) header: HeaderFlags,
    pub(crate) oflags: OpFlags,
}

#[derive(Debug, Clone)]
pub(crate) struct EdgeMetaData {
    pub(crate) id: EdgeId,
    pub(crate) is_active: bool,
    /// The two endpoints of the edge.
    pub(crate) vert_ids: [VertId; 2],
    /// Any loop on a face alongside this edge.
    pub(crate) loop_id: LoopId,
    /// Edges touching the v1 endpoint.
    pub(crate) v1_cycle: StarCycleNode,
    /// Edges touching the v2 endpoint.
    pub(crate) v2_cycle: StarCycleNode,
    pub(crate) header: HeaderFlags,
    pub(crate) oflags: OpFlags,
}

impl EdgeMetaData {
    pub(crate) fn cycle(&self, vert_id: VertId) -> &StarCycleNode {
        if self.vert_ids[0] == vert_id {
            &self.v1_cycle
        } else {
            debug_assert!(self.vert_ids[1] == vert_id);
            &self.v2_cycle
        }
    }

    pub(crate) fn cycle_mut(&mut self, vert_id: VertId) -> &mut StarCycleNode {
        if self.vert_ids[0] == vert_id {
            &mut self.v1_cycle
        } else {
            debug_assert!(self.vert_ids[1] == vert_id);
            &mut self.v2_cycle
        }
    }

    /// The endpoint slot holding `vert_id`.
    pub(crate) fn at(&mut self, vert_id: VertId) -> &mut VertId {
        if self.vert_ids[0] == vert_id {
            &mut self.vert_ids[0]
        } else {
            debug_assert!(self.vert_ids[1] == vert_id);
            &mut self.vert_ids[1]
        }
    }
}

/// A corner of a face. The `radial_*` pointers link every loop of every face
/// sharing the same edge into one cycle that orbits the edge. The `next`/`prev`
/// pointers walk the corners of the owning face, obeying its orientation.
#[derive(Debug, Clone)]
pub(crate) struct LoopMetaData {
    pub(crate) id: LoopId,
    pub(crate) is_active: bool,
    /// Vertex at this corner, the loop runs from it along `edge_id`.
    pub(crate) vert_id: VertId,
    pub(crate) edge_id: EdgeId,
    pub(crate) face_id: FaceId,
    /// Next loop in the parallel cycle around the edge.
    pub(crate) radial_next_id: LoopId,
    /// Prev loop in the parallel cycle around the edge.
    pub(crate) radial_prev_id: LoopId,
    /// Next loop in the face.
    pub(crate) next_id: LoopId,
    /// Prev loop in the face.
    pub(crate) prev_id: LoopId,
}

#[derive(Debug, Clone)]
pub(crate) struct FaceMetaData {
    pub(crate) id: FaceId,
    pub(crate) is_active: bool,
    pub(crate) loop_id: LoopId,
    pub(crate) len: usize,
    pub(crate) no: Vec3,
    pub(crate) header: HeaderFlags,
    pub(crate) oflags: OpFlags,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub(crate) struct StarCycleNode {
    pub(crate) prev_edge: EdgeId,
    pub(crate) next_edge: EdgeId,
}
