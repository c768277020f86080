use nalgebra::{Matrix4, Point3};

use crate::elements::{ElemBuffer, ElemTypes};
use crate::error::MeshError;
use crate::operators::{OpDefine, OpTypeFlags, Operator, SlotDef, SlotType};
use crate::Mesh;

pub static ROTATE_DEF: OpDefine = OpDefine {
    name: "rotate",
    slots_in: &[
        SlotDef::new("cent", SlotType::Vec3),
        SlotDef::new("matrix", SlotType::Mat3),
        SlotDef::new("verts", SlotType::Buffer(ElemTypes::ALL_NOLOOP)),
        SlotDef::new("space", SlotType::Mat4),
    ],
    slots_out: &[],
    exec: rotate_exec,
    type_flag: OpTypeFlags::NORMALS_CALC,
};

pub static TRANSLATE_DEF: OpDefine = OpDefine {
    name: "translate",
    slots_in: &[
        SlotDef::new("vec", SlotType::Vec3),
        SlotDef::new("verts", SlotType::Buffer(ElemTypes::ALL_NOLOOP)),
        SlotDef::new("space", SlotType::Mat4),
    ],
    slots_out: &[],
    exec: translate_exec,
    type_flag: OpTypeFlags::NORMALS_CALC,
};

/// Apply `matrix`, expressed in the frame `space` maps mesh coordinates into,
/// to every vertex of `verts`. Other element kinds in the buffer are ignored.
pub fn transform_verts(
    mesh: &mut Mesh,
    verts: &ElemBuffer,
    matrix: &Matrix4<f64>,
    space: &Matrix4<f64>,
) -> Result<(), MeshError> {
    let inverse = space.try_inverse().ok_or_else(|| MeshError::SingularMatrix {
        slot: "space".to_string(),
    })?;
    let full = inverse * matrix * space;

    for v in verts.verts() {
        let co = full.transform_point(&Point3::from(mesh.vert_co(v)));
        mesh.set_vert_co(v, co.coords);
    }
    Ok(())
}

fn rotate_exec(op: &mut Operator, mesh: &mut Mesh, _dest: Option<&mut Mesh>) -> Result<(), MeshError> {
    let center = op.slots_in.vec3("cent")?;
    let rotation = op.slots_in.mat3("matrix")?.to_homogeneous();
    let space = op.slots_in.mat4("space")?;

    let pivoted = Matrix4::new_translation(&center) * rotation * Matrix4::new_translation(&-center);
    transform_verts(mesh, op.slots_in.buffer_ref("verts")?, &pivoted, &space)
}

fn translate_exec(op: &mut Operator, mesh: &mut Mesh, _dest: Option<&mut Mesh>) -> Result<(), MeshError> {
    let offset = op.slots_in.vec3("vec")?;
    let space = op.slots_in.mat4("space")?;

    transform_verts(
        mesh,
        op.slots_in.buffer_ref("verts")?,
        &Matrix4::new_translation(&offset),
        &space,
    )
}
