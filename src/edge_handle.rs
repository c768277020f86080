use crate::iterators::RadialLoopIter;
use crate::loop_handle::LoopHandle;

use crate::{EdgeId, EdgeMetaData, FaceId, Mesh, StarCycleNode, VertId};

#[derive(Clone, Copy)]
pub struct EdgeHandle<'r> {
    id: EdgeId,
    mesh: &'r Mesh,
}

impl<'r> EdgeHandle<'r> {
    pub(crate) fn new(id: EdgeId, mesh: &'r Mesh) -> Self {
        debug_assert!(!id.is_absent());
        Self { id, mesh }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn vertex_ids(&self) -> [VertId; 2] {
        self.metadata().vert_ids
    }

    pub fn is_active(&self) -> bool {
        self.metadata().is_active
    }

    pub fn connects(&self, a: VertId, b: VertId) -> bool {
        let [v1, v2] = self.metadata().vert_ids;
        (v1 == a && v2 == b) || (v1 == b && v2 == a)
    }

    pub(crate) fn cycle_at(&self, vert_id: VertId) -> &'r StarCycleNode {
        self.metadata().cycle(vert_id)
    }

    /// Any loop on a face alongside this edge.
    pub fn loop_(&self) -> Option<LoopHandle<'r>> {
        let loop_id = self.metadata().loop_id;
        (!loop_id.is_absent()).then(|| LoopHandle::new(loop_id, self.mesh))
    }

    pub fn radial_loops(&self) -> RadialLoopIter<'r> {
        RadialLoopIter::new(self.metadata().loop_id, self.mesh)
    }

    pub fn faces(&self) -> impl Iterator<Item = FaceId> + 'r {
        self.radial_loops().map(|l| l.face().id())
    }

    pub fn face_count(&self) -> usize {
        self.radial_loops().count()
    }

    /// Exactly one face uses this edge.
    pub fn is_boundary(&self) -> bool {
        self.face_count() == 1
    }

    /// No face uses this edge.
    pub fn is_wire(&self) -> bool {
        self.metadata().loop_id.is_absent()
    }

    fn metadata(&self) -> &'r EdgeMetaData {
        &self.mesh.edges_meta[self.id.to_index()]
    }
}
