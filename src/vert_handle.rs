use crate::edge_handle::EdgeHandle;
use crate::iterators::VertStarEdgesIter;
use crate::loop_handle::LoopHandle;

use crate::{FaceId, Mesh, Vec3, VertId, VertMetaData};

#[derive(Clone, Copy)]
pub struct VertHandle<'r> {
    id: VertId,
    mesh: &'r Mesh,
}

impl<'r> VertHandle<'r> {
    pub(crate) fn new(id: VertId, mesh: &'r Mesh) -> Self {
        debug_assert!(!id.is_absent());
        Self { id, mesh }
    }

    pub fn id(&self) -> VertId {
        self.id
    }

    pub fn co(&self) -> Vec3 {
        self.metadata().co
    }

    pub fn no(&self) -> Vec3 {
        self.metadata().no
    }

    pub fn is_active(&self) -> bool {
        self.metadata().is_active
    }

    /// Any edge touching this vertex, `None` for a loose vertex.
    pub fn edge(&self) -> Option<EdgeHandle<'r>> {
        let edge_id = self.metadata().edge_id;
        (!edge_id.is_absent()).then(|| EdgeHandle::new(edge_id, self.mesh))
    }

    pub fn star_edges(&self) -> VertStarEdgesIter<'r> {
        VertStarEdgesIter::new(self.id, self.mesh)
    }

    /// Number of edges in the disk cycle.
    pub fn valence(&self) -> usize {
        self.star_edges().count()
    }

    pub fn is_loose(&self) -> bool {
        self.metadata().edge_id.is_absent()
    }

    /// Every loop whose corner sits on this vertex.
    pub fn incident_loops(&self) -> impl Iterator<Item = LoopHandle<'r>> + 'r {
        let id = self.id;
        self.star_edges()
            .flat_map(|e| e.radial_loops())
            .filter(move |l| l.vert().id() == id)
    }

    pub fn incident_faces(&self) -> impl Iterator<Item = FaceId> + 'r {
        self.incident_loops().map(|l| l.face().id())
    }

    fn metadata(&self) -> &'r VertMetaData {
        &self.mesh.verts_meta[self.id.to_index()]
    }
}

#[cfg(test)]
mod tests {
    use crate::test_meshes;
    use crate::VertId;

    #[test]
    fn test_incident_faces() {
        let mesh = test_meshes::two_triangles();
        assert_eq!(mesh.vert_handle(VertId(0)).incident_faces().count(), 2);
        assert_eq!(mesh.vert_handle(VertId(1)).incident_faces().count(), 1);
        assert_eq!(mesh.vert_handle(VertId(3)).valence(), 2);
    }
}
