use crate::{Mesh, Vec3};

impl Mesh {
    /// Recompute face normals (Newell) and vertex normals (normalised sum of
    /// incident face normals). A vertex with no face uses its normalised
    /// position.
    pub fn update_normals(&mut self) {
        for i in 0..self.faces_meta.len() {
            if !self.faces_meta[i].is_active {
                continue;
            }
            let id = self.faces_meta[i].id;
            self.faces_meta[i].no = self.face_handle(id).compute_normal();
        }

        for i in 0..self.verts_meta.len() {
            if !self.verts_meta[i].is_active {
                continue;
            }
            let vert = self.vert_handle(self.verts_meta[i].id);
            let sum = vert
                .incident_faces()
                .fold(Vec3::zeros(), |acc, f| acc + self.faces_meta[f.to_index()].no);

            let fallback = vert.co();
            self.verts_meta[i].no = sum
                .try_normalize(f64::EPSILON)
                .or_else(|| fallback.try_normalize(f64::EPSILON))
                .unwrap_or_else(Vec3::zeros);
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::test_meshes;
    use crate::{Vec3, VertId};

    #[test]
    fn test_update_normals() {
        let mut mesh = test_meshes::grid(2, 2);
        let loose = mesh.add_vert(Vec3::new(0.0, 3.0, 4.0), None);
        mesh.update_normals();

        for f in mesh.face_ids() {
            assert_relative_eq!(mesh.face_handle(f).no(), Vec3::z());
        }
        assert_relative_eq!(mesh.vert_handle(VertId(4)).no(), Vec3::z());
        assert_relative_eq!(mesh.vert_handle(loose).no(), Vec3::new(0.0, 0.6, 0.8));
    }
}
