use crate::iterators::FaceLoopIter;
use crate::loop_handle::LoopHandle;
use crate::vert_handle::VertHandle;

use crate::{EdgeId, FaceId, FaceMetaData, Mesh, Vec3, VertId};

#[derive(Clone, Copy)]
pub struct FaceHandle<'r> {
    id: FaceId,
    mesh: &'r Mesh,
}

impl<'r> FaceHandle<'r> {
    pub(crate) fn new(id: FaceId, mesh: &'r Mesh) -> Self {
        debug_assert!(!id.is_absent());
        Self { id, mesh }
    }

    pub fn id(&self) -> FaceId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.metadata().is_active
    }

    /// First loop of the face, the corner its winding starts at.
    pub fn loop_(&self) -> LoopHandle<'r> {
        LoopHandle::new(self.metadata().loop_id, self.mesh)
    }

    /// Number of corners.
    pub fn len(&self) -> usize {
        self.metadata().len
    }

    /// Stored normal, refreshed by [`Mesh::update_normals`].
    pub fn no(&self) -> Vec3 {
        self.metadata().no
    }

    pub fn loops(&self) -> FaceLoopIter<'r> {
        FaceLoopIter::new(self.metadata().loop_id, self.mesh)
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertHandle<'r>> + 'r {
        self.loops().map(|l| l.vert())
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertId> + 'r {
        self.loops().map(|l| l.vert().id())
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + 'r {
        self.loops().map(|l| l.edge().id())
    }

    /// Newell normal of the polygon, zero if it is degenerate.
    pub fn compute_normal(&self) -> Vec3 {
        let mut normal = Vec3::zeros();
        for l in self.loops() {
            let p = l.vert().co();
            let q = l.next().vert().co();
            normal.x += (p.y - q.y) * (p.z + q.z);
            normal.y += (p.z - q.z) * (p.x + q.x);
            normal.z += (p.x - q.x) * (p.y + q.y);
        }

        normal.try_normalize(f64::EPSILON).unwrap_or_else(Vec3::zeros)
    }

    pub fn centroid(&self) -> Vec3 {
        let mut centroid = Vec3::zeros();
        let mut count = 0;
        for v in self.vertices() {
            centroid += v.co();
            count += 1;
        }

        centroid / count.max(1) as f64
    }

    fn metadata(&self) -> &'r FaceMetaData {
        &self.mesh.faces_meta[self.id.to_index()]
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::test_meshes;

    #[test]
    fn test_face_metrics() {
        let mesh = test_meshes::square();
        let face = mesh.face_handle(FaceId(0));

        assert_eq!(face.len(), 4);
        assert_relative_eq!(face.compute_normal(), Vec3::z());
        assert_relative_eq!(face.centroid(), Vec3::new(0.5, 0.5, 0.0));
    }
}
