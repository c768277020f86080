//! Small fixture meshes shared by the unit tests.
use crate::elements::{ElemBuffer, ElemId};
use crate::{Mesh, Vec3};

fn build(positions: &[[f64; 3]], faces: &[&[usize]]) -> Mesh {
    Mesh::from_face_list(
        positions.iter().map(|p| Vec3::new(p[0], p[1], p[2])),
        faces.iter().map(|f| f.iter().copied()),
    )
    .unwrap()
}

/// Right triangle in the XY plane, facing +Z.
pub fn triangle() -> Mesh {
    build(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &[&[0, 1, 2]])
}

/// Unit square in the XY plane, facing +Z.
pub fn square() -> Mesh {
    build(
        &[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        &[&[0, 1, 2, 3]],
    )
}

/// Unit square split along the 0-2 diagonal. Edges are numbered 0-1, 1-2,
/// 2-0, 2-3, 3-0.
pub fn two_triangles() -> Mesh {
    build(
        &[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        &[&[0, 1, 2], &[0, 2, 3]],
    )
}

/// Three triangles hinged on the 0-1 edge.
pub fn fan_of_three() -> Mesh {
    build(
        &[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.5, 1.0, 0.0],
            [0.5, -1.0, 0.0],
            [0.5, 0.0, 1.0],
        ],
        &[&[0, 1, 2], &[1, 0, 3], &[0, 1, 4]],
    )
}

/// `nx` by `ny` quads of unit size in the XY plane, vertices numbered row by
/// row.
pub fn grid(nx: usize, ny: usize) -> Mesh {
    let width = nx + 1;
    let mut positions = Vec::new();
    for j in 0..=ny {
        for i in 0..=nx {
            positions.push(Vec3::new(i as f64, j as f64, 0.0));
        }
    }

    let mut faces = Vec::new();
    for j in 0..ny {
        for i in 0..nx {
            let a = j * width + i;
            faces.push(vec![a, a + 1, a + 1 + width, a + width]);
        }
    }

    Mesh::from_face_list(positions, faces.into_iter().map(|f| f.into_iter())).unwrap()
}

/// Every active vertex, edge and face.
pub fn all_geom(mesh: &Mesh) -> ElemBuffer {
    let mut buffer = ElemBuffer::new();
    buffer.extend(mesh.vert_ids().map(ElemId::Vert));
    buffer.extend(mesh.edge_ids().map(ElemId::Edge));
    buffer.extend(mesh.face_ids().map(ElemId::Face));
    buffer
}
