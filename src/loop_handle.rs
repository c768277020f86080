use crate::edge_handle::EdgeHandle;
use crate::face_handle::FaceHandle;
use crate::iterators::{FaceLoopIter, RadialLoopIter};
use crate::vert_handle::VertHandle;

use crate::{LoopId, LoopMetaData, Mesh};

/// A face corner. The loop starts at [`LoopHandle::vert`] and runs along
/// [`LoopHandle::edge`] towards the vertex of [`LoopHandle::next`].
#[derive(Clone, Copy)]
pub struct LoopHandle<'r> {
    id: LoopId,
    mesh: &'r Mesh,
}

impl<'r> LoopHandle<'r> {
    pub(crate) fn new(id: LoopId, mesh: &'r Mesh) -> Self {
        debug_assert!(!id.is_absent());
        Self { id, mesh }
    }

    pub fn id(&self) -> LoopId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.metadata().is_active
    }

    pub fn vert(&self) -> VertHandle<'r> {
        VertHandle::new(self.metadata().vert_id, self.mesh)
    }

    pub fn edge(&self) -> EdgeHandle<'r> {
        EdgeHandle::new(self.metadata().edge_id, self.mesh)
    }

    pub fn face(&self) -> FaceHandle<'r> {
        FaceHandle::new(self.metadata().face_id, self.mesh)
    }

    pub fn next(&self) -> LoopHandle<'r> {
        LoopHandle::new(self.metadata().next_id, self.mesh)
    }

    pub fn prev(&self) -> LoopHandle<'r> {
        LoopHandle::new(self.metadata().prev_id, self.mesh)
    }

    pub fn radial_next(&self) -> LoopHandle<'r> {
        LoopHandle::new(self.metadata().radial_next_id, self.mesh)
    }

    pub fn radial_prev(&self) -> LoopHandle<'r> {
        LoopHandle::new(self.metadata().radial_prev_id, self.mesh)
    }

    /// Iterate over the loops of the owning face, starting here.
    pub fn face_loop(&self) -> FaceLoopIter<'r> {
        FaceLoopIter::new(self.id, self.mesh)
    }

    /// Iterate over the loops of every face sharing this loop's edge.
    pub fn radial_loop(&self) -> RadialLoopIter<'r> {
        RadialLoopIter::new(self.id, self.mesh)
    }

    fn metadata(&self) -> &'r LoopMetaData {
        &self.mesh.loops_meta[self.id.to_index()]
    }
}
