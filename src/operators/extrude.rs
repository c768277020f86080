use tracing::debug;

use crate::elements::{ElemBuffer, ElemId, ElemTypes};
use crate::error::MeshError;
use crate::flags::OpFlags;
use crate::id_map::ElemMap;
use crate::mesh_deleter::DeleteContext;
use crate::operators::dupe::{DELETE_DEF, DUPLICATE_DEF};
use crate::operators::{OpDefine, OpTypeFlags, Operator, SlotDef, SlotType};
use crate::{EdgeId, FaceId, Mesh, VertId};

pub static EXTRUDE_FACE_REGION_DEF: OpDefine = OpDefine {
    name: "extrude_face_region",
    slots_in: &[
        SlotDef::new("geom", SlotType::Buffer(ElemTypes::ALL_NOLOOP)),
        SlotDef::new("use_keep_orig", SlotType::Bool),
        SlotDef::new("use_normal_flip", SlotType::Bool),
        SlotDef::new("use_select_history", SlotType::Bool),
    ],
    slots_out: &[
        SlotDef::new("geom.out", SlotType::Buffer(ElemTypes::ALL_NOLOOP)),
        SlotDef::new("vert_map.out", SlotType::Map),
    ],
    exec: extrude_face_region_exec,
    type_flag: OpTypeFlags::NORMALS_CALC,
};

/// Corners of the face joining `e_old` to its copy `e_new`, wound against
/// the copied region face on `e_new` if there is one, else against a face
/// of `e_old` outside the region, else following `e_new`.
fn side_quad(mesh: &Mesh, verts: &ElemMap, e_old: EdgeId, e_new: EdgeId) -> Option<[VertId; 4]> {
    let copy_of = |v: VertId| verts.new_of(ElemId::Vert(v)).and_then(|c| c.as_vert());
    let orig_of = |v: VertId| verts.old_of(ElemId::Vert(v)).and_then(|c| c.as_vert());

    if let Some(l) = mesh.edge_handle(e_new).loop_() {
        let (a, b) = (l.vert().id(), l.next().vert().id());
        return Some([orig_of(a)?, orig_of(b)?, b, a]);
    }

    let outside = mesh
        .edge_handle(e_old)
        .radial_loops()
        .find(|l| !mesh.oflag_test(l.face().id(), OpFlags::EXT_INPUT));
    if let Some(l) = outside {
        let (a, b) = (l.vert().id(), l.next().vert().id());
        return Some([b, a, copy_of(a)?, copy_of(b)?]);
    }

    let [a, b] = mesh.edge_handle(e_new).vertex_ids();
    Some([orig_of(a)?, orig_of(b)?, b, a])
}

/// Face a side quad takes its header flags and attributes from.
fn side_example(mesh: &Mesh, e_old: EdgeId, e_new: EdgeId) -> Option<FaceId> {
    mesh.edge_handle(e_new)
        .loop_()
        .or_else(|| mesh.edge_handle(e_old).loop_())
        .map(|l| l.face().id())
}

/// Input faces with the edges and vertices nothing outside them uses.
fn original_interior(mesh: &Mesh) -> ElemBuffer {
    let faces: Vec<FaceId> = mesh
        .face_ids()
        .filter(|f| mesh.oflag_test(*f, OpFlags::EXT_INPUT))
        .collect();

    let mut edges: Vec<EdgeId> = faces
        .iter()
        .flat_map(|f| mesh.face_handle(*f).edge_ids())
        .filter(|e| {
            mesh.edge_handle(*e)
                .faces()
                .all(|f| mesh.oflag_test(f, OpFlags::EXT_INPUT))
        })
        .collect();
    edges.sort();
    edges.dedup();

    let mut verts: Vec<VertId> = edges
        .iter()
        .flat_map(|e| mesh.edge_handle(*e).vertex_ids())
        .filter(|v| {
            mesh.vert_handle(*v)
                .star_edges()
                .all(|e| edges.binary_search(&e.id()).is_ok())
        })
        .collect();
    verts.sort();
    verts.dedup();

    let mut geom = ElemBuffer::new();
    geom.extend(faces);
    geom.extend(edges);
    geom.extend(verts);
    geom
}

fn extrude_face_region_exec(op: &mut Operator, mesh: &mut Mesh, _dest: Option<&mut Mesh>) -> Result<(), MeshError> {
    let use_keep_orig = op.slots_in.bool("use_keep_orig")?;
    let use_normal_flip = op.slots_in.bool("use_normal_flip")?;

    mesh.clear_oflags(OpFlags::EXT_INPUT);
    mesh.buffer_oflag_enable(op.slots_in.buffer_ref("geom")?, ElemTypes::ALL_NOLOOP, OpFlags::EXT_INPUT);

    let mut dupe = Operator::from_def(&DUPLICATE_DEF);
    dupe.slots_in.copy_from("geom", &op.slots_in, "geom")?;
    dupe.slots_in.copy_from("use_select_history", &op.slots_in, "use_select_history")?;
    dupe.slots_in.set("use_edge_flip_from_face", true)?;
    dupe.exec_nested(mesh)?;

    let vert_map = dupe.slots_out.map("vert_map.out")?;
    let face_map = dupe.slots_out.map("face_map.out")?;
    if let Some(active) = mesh.active_face {
        if let Some(ElemId::Face(copy)) = face_map.new_of(ElemId::Face(active)) {
            mesh.active_face = Some(copy);
        }
    }

    let mut side_faces = Vec::new();
    for (old, new) in dupe.slots_out.map("boundary_map.out")?.pairs() {
        let (Some(e_old), Some(e_new)) = (old.as_edge(), new.as_edge()) else {
            continue;
        };
        let Some(mut quad) = side_quad(mesh, &vert_map, e_old, e_new) else {
            continue;
        };
        if use_normal_flip {
            quad.reverse();
        }
        let example = side_example(mesh, e_old, e_new);
        side_faces.push(mesh.add_face_verts(&quad, example));
    }

    let mut spokes = 0;
    for (old, new) in dupe.slots_out.map("isovert_map.out")?.pairs() {
        let (Some(v_old), Some(v_new)) = (old.as_vert(), new.as_vert()) else {
            continue;
        };
        if mesh.find_edge(v_old, v_new).is_none() {
            mesh.add_edge(v_old, v_new, None);
            spokes += 1;
        }
    }

    let new_geom = dupe.slots_out.buffer("geom.out")?;
    if use_normal_flip {
        for f in new_geom.faces() {
            mesh.reverse_face(f);
        }
    }

    if !use_keep_orig {
        let mut delete = Operator::from_def(&DELETE_DEF)
            .with("geom", original_interior(mesh))?
            .with("context", DeleteContext::TaggedOnly as i32)?;
        delete.exec_nested(mesh)?;
    }

    op.slots_out.set("geom.out", new_geom)?;
    op.slots_out.set("vert_map.out", vert_map)?;
    mesh.clear_oflags(OpFlags::EXT_INPUT);

    debug!(side_faces = side_faces.len(), spokes, use_keep_orig, "extruded region");
    Ok(())
}
