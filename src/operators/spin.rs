//! Iterative spin: sweep geometry around an axis, duplicating or extruding
//! once per step, optionally welding the last ring back onto the first.
use std::collections::HashMap;

use nalgebra::{Matrix3, Rotation3, Unit};
use tracing::{debug, trace};

use crate::elements::{ElemBuffer, ElemId, ElemTypes};
use crate::error::MeshError;
use crate::id_map::ElemMap;
use crate::operators::dupe::DUPLICATE_DEF;
use crate::operators::extrude::EXTRUDE_FACE_REGION_DEF;
use crate::operators::transform::{ROTATE_DEF, TRANSLATE_DEF};
use crate::operators::{OpDefine, OpSlots, OpTypeFlags, Operator, SlotDef, SlotType};
use crate::{Mesh, Vec3, VertId};

/// In extrude mode every step keeps the geometry it extrudes from, so the
/// cap of each intermediate step stays in the mesh; merging only welds the
/// last ring onto the first.
pub static SPIN_DEF: OpDefine = OpDefine {
    name: "spin",
    slots_in: &[
        SlotDef::new("geom", SlotType::Buffer(ElemTypes::ALL_NOLOOP)),
        SlotDef::new("cent", SlotType::Vec3),
        SlotDef::new("axis", SlotType::Vec3),
        SlotDef::new("dvec", SlotType::Vec3),
        SlotDef::new("angle", SlotType::Float),
        SlotDef::new("space", SlotType::Mat4),
        SlotDef::new("steps", SlotType::Int),
        SlotDef::new("use_merge", SlotType::Bool),
        SlotDef::new("use_normal_flip", SlotType::Bool),
        SlotDef::new("use_duplicate", SlotType::Bool),
    ],
    slots_out: &[SlotDef::new("geom_last.out", SlotType::Buffer(ElemTypes::ALL_NOLOOP))],
    exec: spin_exec,
    type_flag: OpTypeFlags::NORMALS_CALC,
};

/// Vertex of the first ring every later copy descends from.
#[derive(Debug, Default)]
struct RingOrigins {
    origin: HashMap<VertId, VertId>,
}

impl RingOrigins {
    fn new(mesh: &Mesh) -> Self {
        Self {
            origin: mesh.vert_ids().map(|v| (v, v)).collect(),
        }
    }

    /// Let every copy in `vert_map` inherit the origin of its source.
    fn propagate(&mut self, vert_map: &ElemMap) {
        for (old, new) in vert_map.pairs() {
            let (Some(old), Some(new)) = (old.as_vert(), new.as_vert()) else {
                continue;
            };
            if let Some(origin) = self.origin.get(&old).copied() {
                self.origin.insert(new, origin);
            }
        }
    }

    fn get(&self, v: VertId) -> Option<VertId> {
        self.origin.get(&v).copied()
    }
}

fn spin_exec(op: &mut Operator, mesh: &mut Mesh, _dest: Option<&mut Mesh>) -> Result<(), MeshError> {
    let steps = op.slots_in.int("steps")?;
    if steps <= 0 {
        return Err(MeshError::invalid_argument("steps", "must be at least 1"));
    }
    let center = op.slots_in.vec3("cent")?;
    let axis = op.slots_in.vec3("axis")?;
    let axis = axis.try_normalize(0.0).unwrap_or(axis);
    let mut dvec = op.slots_in.vec3("dvec")?;
    let use_dvec = dvec != Vec3::zeros();
    let phi = op.slots_in.float("angle")? / f64::from(steps);
    let use_duplicate = op.slots_in.bool("use_duplicate")?;
    let use_normal_flip = op.slots_in.bool("use_normal_flip")?;
    let use_merge = op.slots_in.bool("use_merge")? && steps >= 3;

    let rotation = Rotation3::from_axis_angle(&Unit::new_unchecked(axis), phi).into_inner();
    let mut origins = use_merge.then(|| RingOrigins::new(mesh));

    let mut geom_last = op.slots_in.buffer("geom")?;
    for a in 0..steps {
        let step_out = if use_duplicate {
            let mut dupe = Operator::from_def(&DUPLICATE_DEF).with("geom", geom_last)?;
            dupe.exec_nested(mesh)?;
            let out = dupe.slots_out.buffer("geom.out")?;
            rotate(mesh, &op.slots_in, rotation, center, &out)?;
            if let Some(origins) = origins.as_mut() {
                origins.propagate(&dupe.slots_out.map("vert_map.out")?);
            }
            out
        } else {
            let mut extrude = Operator::from_def(&EXTRUDE_FACE_REGION_DEF)
                .with("geom", geom_last)?
                .with("use_keep_orig", true)?
                .with("use_normal_flip", use_normal_flip && a == 0)?;
            extrude.exec_nested(mesh)?;
            let out = extrude.slots_out.buffer("geom.out")?;
            // The last ring is welded onto the first instead.
            if !(use_merge && a == steps - 1) {
                rotate(mesh, &op.slots_in, rotation, center, &out)?;
            }
            if let Some(origins) = origins.as_mut() {
                origins.propagate(&extrude.slots_out.map("vert_map.out")?);
            }
            out
        };
        geom_last = step_out;

        if use_dvec {
            dvec = rotation * dvec;
            let mut translate = Operator::from_def(&TRANSLATE_DEF)
                .with("vec", dvec)?
                .with("verts", geom_last.clone())?;
            translate.slots_in.copy_from("space", &op.slots_in, "space")?;
            translate.exec_nested(mesh)?;
        }

        trace!(step = a, elements = geom_last.len(), "spin step");
    }

    if let Some(origins) = origins {
        let welded = weld_last_ring(mesh, &geom_last, &origins);
        debug!(welded, "welded last ring");
    }
    geom_last.retain(|e| mesh.is_elem_active(*e));

    debug!(steps, elements = geom_last.len(), use_duplicate, "spin");
    op.slots_out.set("geom_last.out", geom_last)
}

fn rotate(
    mesh: &mut Mesh,
    spin_slots: &OpSlots,
    rotation: Matrix3<f64>,
    center: Vec3,
    verts: &ElemBuffer,
) -> Result<(), MeshError> {
    let mut rotate = Operator::from_def(&ROTATE_DEF)
        .with("cent", center)?
        .with("matrix", rotation)?
        .with("verts", verts.clone())?;
    rotate.slots_in.copy_from("space", spin_slots, "space")?;
    rotate.exec_nested(mesh)
}

/// Splice the last ring onto the first: vertices onto their origin, edges onto
/// the edge they now double, and drop faces that double an existing one.
/// Returns the number of elements merged away.
fn weld_last_ring(mesh: &mut Mesh, geom_last: &ElemBuffer, origins: &RingOrigins) -> usize {
    let mut welded = 0;

    for v in geom_last.verts() {
        match origins.get(v) {
            Some(origin) if origin != v && mesh.is_elem_active(ElemId::Vert(origin)) => {
                mesh.splice_vert(origin, v);
                welded += 1;
            }
            _ => {}
        }
    }

    for e in geom_last.edges() {
        if !mesh.is_elem_active(ElemId::Edge(e)) {
            continue;
        }
        if let Some(double) = mesh.find_double_edge(e) {
            mesh.splice_edge(double, e);
            welded += 1;
        }
    }

    for f in geom_last.faces() {
        if !mesh.is_elem_active(ElemId::Face(f)) {
            continue;
        }
        if mesh.find_double_face(f).is_some() {
            mesh.kill_face(f);
            welded += 1;
        }
    }

    welded
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{PI, TAU};

    use approx::assert_relative_eq;

    use super::*;
    use crate::test_meshes;
    use crate::validation::{is_correct, MeshCorrectness};

    /// Square at distance 2 from the Z axis, standing in the XZ plane.
    fn profile() -> Mesh {
        Mesh::from_face_list(
            [
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(3.0, 0.0, 0.0),
                Vec3::new(3.0, 0.0, 1.0),
                Vec3::new(2.0, 0.0, 1.0),
            ],
            [[0usize, 1, 2, 3]].into_iter().map(|f| f.into_iter()),
        )
        .unwrap()
    }

    fn spin_op(mesh: &Mesh, steps: i32, angle: f64, use_merge: bool, use_duplicate: bool) -> Operator {
        Operator::new("spin")
            .unwrap()
            .with("geom", test_meshes::all_geom(mesh))
            .unwrap()
            .with("axis", Vec3::z())
            .unwrap()
            .with("angle", angle)
            .unwrap()
            .with("steps", steps)
            .unwrap()
            .with("use_merge", use_merge)
            .unwrap()
            .with("use_duplicate", use_duplicate)
            .unwrap()
    }

    #[test]
    fn test_steps_must_be_positive() {
        let mut mesh = profile();
        let mut op = spin_op(&mesh, 0, TAU, false, false);
        assert_eq!(
            op.exec(&mut mesh),
            Err(MeshError::invalid_argument("steps", "must be at least 1"))
        );
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn test_extrude_full_turn_merged() {
        let mut mesh = profile();
        let mut op = spin_op(&mesh, 4, TAU, true, false);
        op.exec(&mut mesh).unwrap();

        assert_eq!(mesh.vert_count(), 16);
        assert_eq!(mesh.edge_count(), 32);
        assert_eq!(mesh.face_count(), 20);
        assert_eq!(is_correct(&mesh), MeshCorrectness::Correct);

        // Every surviving element of the last step is live.
        let last = op.slots_out.buffer("geom_last.out").unwrap();
        assert!(last.iter().all(|e| mesh.is_elem_active(*e)));
        assert_eq!(last.count(ElemTypes::VERT), 0);
    }

    #[test]
    fn test_extrude_full_turn_unmerged() {
        let mut mesh = profile();
        let mut op = spin_op(&mesh, 4, TAU, false, false);
        op.exec(&mut mesh).unwrap();

        assert_eq!(mesh.vert_count(), 20);
        assert_eq!(mesh.edge_count(), 36);
        assert_eq!(mesh.face_count(), 21);

        // The last ring lands back on the first without being welded.
        let last = op.slots_out.buffer("geom_last.out").unwrap();
        for v in last.verts() {
            let co = mesh.vert_co(v);
            assert!(mesh
                .vert_ids()
                .take(4)
                .any(|first| (mesh.vert_co(first) - co).norm() < 1e-9));
        }
    }

    #[test]
    fn test_duplicate_full_turn_merged() {
        let mut mesh = profile();
        let mut op = spin_op(&mesh, 4, TAU, true, true);
        op.exec(&mut mesh).unwrap();

        assert_eq!(mesh.vert_count(), 16);
        assert_eq!(mesh.edge_count(), 16);
        assert_eq!(mesh.face_count(), 4);
        assert_eq!(is_correct(&mesh), MeshCorrectness::Correct);
        assert!(op.slots_out.buffer("geom_last.out").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_unmerged_adds_one_copy_per_step() {
        let mut mesh = test_meshes::grid(2, 1);
        let faces_before = mesh.face_count();
        let mut op = spin_op(&mesh, 5, PI, false, true);
        op.exec(&mut mesh).unwrap();

        assert_eq!(mesh.face_count(), faces_before + 5 * faces_before);
        assert_eq!(mesh.vert_count(), 6 * 6);
        assert_eq!(mesh.edge_count(), 6 * 7);
        assert_eq!(op.slots_out.buffer("geom_last.out").unwrap().len(), 15);
        assert_eq!(is_correct(&mesh), MeshCorrectness::Correct);
    }

    #[test]
    fn test_wire_edge_revolves_into_band() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vert(Vec3::new(1.0, 0.0, 0.0), None);
        let b = mesh.add_vert(Vec3::new(1.0, 0.0, 1.0), None);
        mesh.add_edge(a, b, None);

        let mut op = spin_op(&mesh, 4, TAU, true, false);
        op.exec(&mut mesh).unwrap();

        assert_eq!(mesh.vert_count(), 8);
        assert_eq!(mesh.edge_count(), 12);
        assert_eq!(mesh.face_count(), 4);
        assert_eq!(is_correct(&mesh), MeshCorrectness::Correct);
    }

    #[test]
    fn test_merge_needs_three_steps() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vert(Vec3::new(1.0, 0.0, 0.0), None);
        let b = mesh.add_vert(Vec3::new(1.0, 0.0, 1.0), None);
        mesh.add_edge(a, b, None);

        let mut op = spin_op(&mesh, 2, TAU, true, false);
        op.exec(&mut mesh).unwrap();

        // Two rotations of half a turn, nothing welded.
        assert_eq!(mesh.vert_count(), 6);
        assert_eq!(mesh.face_count(), 2);
        let last = op.slots_out.buffer("geom_last.out").unwrap();
        let top = last.verts().find(|v| mesh.vert_co(*v).z > 0.5).unwrap();
        assert_relative_eq!(mesh.vert_co(top), Vec3::new(1.0, 0.0, 1.0), epsilon = 1e-9);
    }

    #[test]
    fn test_duplicate_half_turn_with_offset() {
        let mut mesh = Mesh::new();
        mesh.add_vert(Vec3::new(1.0, 0.0, 0.0), None);

        let mut op = spin_op(&mesh, 2, PI, false, true)
            .with("dvec", Vec3::new(0.0, 0.0, 1.0))
            .unwrap();
        op.exec(&mut mesh).unwrap();

        let last = op.slots_out.buffer("geom_last.out").unwrap();
        let v = last.verts().next().unwrap();
        assert_relative_eq!(mesh.vert_co(v), Vec3::new(-1.0, 0.0, 2.0), epsilon = 1e-9);
        assert_eq!(mesh.vert_count(), 3);
    }

    #[test]
    fn test_first_step_normal_flip() {
        let mut plain = profile();
        spin_op(&plain, 3, PI, false, false).exec(&mut plain).unwrap();
        let mut flipped = profile();
        spin_op(&flipped, 3, PI, false, false)
            .with("use_normal_flip", true)
            .unwrap()
            .exec(&mut flipped)
            .unwrap();

        // The reversed first cap carries its winding into every later step.
        assert_eq!(plain.face_count(), flipped.face_count());
        assert_relative_eq!(
            flipped.face_handle(crate::FaceId(0)).no(),
            plain.face_handle(crate::FaceId(0)).no()
        );
        for f in flipped.face_ids().skip(1) {
            assert_relative_eq!(
                flipped.face_handle(f).no(),
                -plain.face_handle(f).no(),
                epsilon = 1e-9
            );
        }
    }
}
