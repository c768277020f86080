//! Element duplication and the duplicate, split and delete operators built
//! on it.
use tracing::{debug, trace};

use crate::custom_data::{AttrDomain, AttributeCopier};
use crate::elements::{ElemId, ElemTypes};
use crate::error::MeshError;
use crate::flags::OpFlags;
use crate::id_map::{ElemMap, IdentityMap};
use crate::mesh_deleter::DeleteContext;
use crate::operators::{OpDefine, OpTypeFlags, Operator, SlotDef, SlotType};
use crate::{EdgeId, FaceId, Mesh, VertId};

const GEOM: SlotType = SlotType::Buffer(ElemTypes::ALL_NOLOOP);

pub static DUPLICATE_DEF: OpDefine = OpDefine {
    name: "duplicate",
    slots_in: &[
        SlotDef::new("geom", GEOM),
        SlotDef::new("use_select_history", SlotType::Bool),
        SlotDef::new("use_edge_flip_from_face", SlotType::Bool),
    ],
    slots_out: &[
        SlotDef::new("geom_orig.out", GEOM),
        SlotDef::new("geom.out", GEOM),
        SlotDef::new("vert_map.out", SlotType::Map),
        SlotDef::new("edge_map.out", SlotType::Map),
        SlotDef::new("face_map.out", SlotType::Map),
        SlotDef::new("elem_map.out", SlotType::Map),
        SlotDef::new("boundary_map.out", SlotType::Map),
        SlotDef::new("isovert_map.out", SlotType::Map),
    ],
    exec: duplicate_exec,
    type_flag: OpTypeFlags::NORMALS_CALC.union(OpTypeFlags::USES_DEST),
};

pub static SPLIT_DEF: OpDefine = OpDefine {
    name: "split",
    slots_in: &[
        SlotDef::new("geom", GEOM),
        SlotDef::new("use_only_faces", SlotType::Bool),
        SlotDef::new("use_select_history", SlotType::Bool),
        SlotDef::new("use_edge_flip_from_face", SlotType::Bool),
    ],
    slots_out: &[
        SlotDef::new("geom.out", GEOM),
        SlotDef::new("boundary_map.out", SlotType::Map),
        SlotDef::new("isovert_map.out", SlotType::Map),
    ],
    exec: split_exec,
    type_flag: OpTypeFlags::NORMALS_CALC,
};

pub static DELETE_DEF: OpDefine = OpDefine {
    name: "delete",
    slots_in: &[
        SlotDef::new("geom", GEOM),
        SlotDef::new("context", SlotType::Int),
    ],
    slots_out: &[],
    exec: delete_exec,
    type_flag: OpTypeFlags::NORMALS_CALC,
};

/// Source and destination of a duplication, which may be one mesh.
pub enum MeshPair<'a> {
    Same(&'a mut Mesh),
    Distinct { src: &'a mut Mesh, dst: &'a mut Mesh },
}

impl<'a> MeshPair<'a> {
    pub fn src(&self) -> &Mesh {
        match self {
            MeshPair::Same(mesh) => mesh,
            MeshPair::Distinct { src, .. } => src,
        }
    }

    pub fn src_mut(&mut self) -> &mut Mesh {
        match self {
            MeshPair::Same(mesh) => mesh,
            MeshPair::Distinct { src, .. } => src,
        }
    }

    pub fn dst(&self) -> &Mesh {
        match self {
            MeshPair::Same(mesh) => mesh,
            MeshPair::Distinct { dst, .. } => dst,
        }
    }

    pub fn dst_mut(&mut self) -> &mut Mesh {
        match self {
            MeshPair::Same(mesh) => mesh,
            MeshPair::Distinct { dst, .. } => dst,
        }
    }

    pub fn is_same(&self) -> bool {
        matches!(self, MeshPair::Same(_))
    }

    fn copy_attributes(&mut self, copier: &AttributeCopier, domain: AttrDomain, from: usize, to: usize) {
        match self {
            MeshPair::Same(mesh) => mesh.custom_data_mut(domain).copy_element(from, to),
            MeshPair::Distinct { src, dst } => {
                copier.copy(domain, src.custom_data(domain), from, dst.custom_data_mut(domain), to)
            }
        }
    }
}

/// Copies every element flagged [`OpFlags::DUPE_INPUT`] in the source mesh
/// into the destination mesh, vertices first, then edges, then faces.
/// Copies are flagged [`OpFlags::DUPE_NEW`], sources [`OpFlags::DUPE_DONE`].
#[derive(Debug)]
pub struct ElementDuplicator {
    pub verts: IdentityMap<VertId>,
    pub edges: IdentityMap<EdgeId>,
    pub faces: IdentityMap<FaceId>,
    /// Copied edges bordering fewer than two copied faces.
    pub boundary_edges: IdentityMap<EdgeId>,
    /// Copied input vertices touched by no input edge or face.
    pub isolated_verts: IdentityMap<VertId>,
    use_edge_flip_from_face: bool,
    copier: AttributeCopier,
}

impl ElementDuplicator {
    pub fn new(meshes: &MeshPair, use_edge_flip_from_face: bool) -> Self {
        let copier = match meshes {
            MeshPair::Same(_) => AttributeCopier::Identity,
            MeshPair::Distinct { src, dst } => AttributeCopier::new(src, dst),
        };

        Self {
            verts: IdentityMap::new(),
            edges: IdentityMap::new(),
            faces: IdentityMap::new(),
            boundary_edges: IdentityMap::new(),
            isolated_verts: IdentityMap::new(),
            use_edge_flip_from_face,
            copier,
        }
    }

    pub fn run(&mut self, meshes: &mut MeshPair) {
        // Snapshot the element counts, copies made into the same mesh are
        // appended past them and never revisited.
        let vert_count = meshes.src().verts_meta.len();
        let edge_count = meshes.src().edges_meta.len();
        let face_count = meshes.src().faces_meta.len();

        for i in 0..vert_count {
            let v = VertId(i);
            let src = meshes.src();
            if !src.verts_meta[i].is_active
                || !src.oflag_test(v, OpFlags::DUPE_INPUT)
                || src.oflag_test(v, OpFlags::DUPE_DONE)
            {
                continue;
            }

            let isolated = !src
                .vert_handle(v)
                .incident_faces()
                .any(|f| src.oflag_test(f, OpFlags::DUPE_INPUT))
                && !src
                    .vert_handle(v)
                    .star_edges()
                    .any(|e| src.oflag_test(e.id(), OpFlags::DUPE_INPUT));

            let new = self.copy_vert(meshes, v);
            if isolated {
                self.isolated_verts.insert(v, new);
            }
        }

        for i in 0..edge_count {
            let e = EdgeId(i);
            let src = meshes.src();
            if !src.edges_meta[i].is_active
                || !src.oflag_test(e, OpFlags::DUPE_INPUT)
                || src.oflag_test(e, OpFlags::DUPE_DONE)
            {
                continue;
            }

            self.copy_edge(meshes, e);
        }

        for i in 0..face_count {
            let f = FaceId(i);
            let src = meshes.src();
            if !src.faces_meta[i].is_active || !src.oflag_test(f, OpFlags::DUPE_INPUT) {
                continue;
            }

            let handle = src.face_handle(f);
            let verts: Vec<VertId> = handle.vertex_ids().collect();
            let edges: Vec<EdgeId> = handle.edge_ids().collect();
            for v in verts {
                if !meshes.src().oflag_test(v, OpFlags::DUPE_DONE) {
                    self.copy_vert(meshes, v);
                }
            }
            for e in edges {
                if !meshes.src().oflag_test(e, OpFlags::DUPE_DONE) {
                    self.copy_edge(meshes, e);
                }
            }

            self.copy_face(meshes, f);
        }

        debug!(
            verts = self.verts.len(),
            edges = self.edges.len(),
            faces = self.faces.len(),
            boundary = self.boundary_edges.len(),
            isolated = self.isolated_verts.len(),
            "duplicated elements"
        );
    }

    fn copy_vert(&mut self, meshes: &mut MeshPair, v: VertId) -> VertId {
        let source = &meshes.src().verts_meta[v.to_index()];
        let (co, no, header) = (source.co, source.no, source.header);

        let dst = meshes.dst_mut();
        let new = dst.add_vert(co, None);
        let vert = &mut dst.verts_meta[new.to_index()];
        vert.no = no;
        vert.header = header;

        self.verts.insert(v, new);
        meshes.copy_attributes(&self.copier, AttrDomain::Vert, v.to_index(), new.to_index());

        meshes.dst_mut().oflag_enable(new, OpFlags::DUPE_NEW);
        meshes.src_mut().oflag_enable(v, OpFlags::DUPE_DONE);
        new
    }

    /// Copy an edge, copying its endpoints first if needed.
    fn copy_edge(&mut self, meshes: &mut MeshPair, e: EdgeId) -> EdgeId {
        let [v1, v2] = meshes.src().edges_meta[e.to_index()].vert_ids;
        for v in [v1, v2] {
            if !meshes.src().oflag_test(v, OpFlags::DUPE_DONE) {
                self.copy_vert(meshes, v);
            }
        }

        let src = meshes.src();
        let edge = src.edge_handle(e);
        let rlen = edge
            .radial_loops()
            .filter(|l| src.oflag_test(l.face().id(), OpFlags::DUPE_INPUT))
            .count();
        // Keep the winding of the face the edge came from, so a side face
        // built on the copy faces the same way.
        let flip = self.use_edge_flip_from_face
            && edge.is_boundary()
            && edge.loop_().is_some_and(|l| l.vert().id() == v1);
        let header = src.edges_meta[e.to_index()].header;

        let (Some(new_v1), Some(new_v2)) = (self.verts.new_of(v1), self.verts.new_of(v2)) else {
            unreachable!("endpoints are copied before their edge");
        };
        let dst = meshes.dst_mut();
        let new = dst.add_edge(new_v1, new_v2, None);
        if flip {
            dst.edge_verts_swap(new);
        }
        dst.edges_meta[new.to_index()].header = header;

        self.edges.insert(e, new);
        if rlen < 2 {
            self.boundary_edges.insert(e, new);
        } else if rlen > 2 {
            trace!(edge = e.to_index(), rlen, "non-manifold edge left out of the boundary map");
        }
        meshes.copy_attributes(&self.copier, AttrDomain::Edge, e.to_index(), new.to_index());

        meshes.dst_mut().oflag_enable(new, OpFlags::DUPE_NEW);
        meshes.src_mut().oflag_enable(e, OpFlags::DUPE_DONE);
        new
    }

    /// Copy a face whose vertices and edges have all been copied.
    fn copy_face(&mut self, meshes: &mut MeshPair, f: FaceId) -> FaceId {
        let src = meshes.src();
        let handle = src.face_handle(f);
        let src_loops: Vec<_> = handle.loops().map(|l| l.id()).collect();
        let mut verts = Vec::with_capacity(src_loops.len());
        let mut edges = Vec::with_capacity(src_loops.len());
        for l in handle.loops() {
            verts.extend(self.verts.new_of(l.vert().id()));
            edges.extend(self.edges.new_of(l.edge().id()));
        }
        debug_assert!(verts.len() == src_loops.len() && edges.len() == src_loops.len());
        let (no, header) = (src.faces_meta[f.to_index()].no, src.faces_meta[f.to_index()].header);

        let dst = meshes.dst_mut();
        let new = dst.add_face(&verts, &edges, None);
        let face = &mut dst.faces_meta[new.to_index()];
        face.no = no;
        face.header = header;

        self.faces.insert(f, new);
        meshes.copy_attributes(&self.copier, AttrDomain::Face, f.to_index(), new.to_index());

        // Both loop cycles start at the same corner, walk them in lockstep.
        let dst_loops: Vec<_> = meshes.dst().face_handle(new).loops().map(|l| l.id()).collect();
        for (from, to) in src_loops.iter().zip(dst_loops.iter()) {
            meshes.copy_attributes(&self.copier, AttrDomain::Loop, from.to_index(), to.to_index());
        }

        meshes.dst_mut().oflag_enable(new, OpFlags::DUPE_NEW);
        meshes.src_mut().oflag_enable(f, OpFlags::DUPE_DONE);
        new
    }

    /// Append the copy of every mapped selection history entry.
    pub fn extend_select_history(&self, mesh: &mut Mesh) {
        let copies: Vec<ElemId> = mesh
            .select_history
            .iter()
            .filter_map(|elem| match *elem {
                ElemId::Vert(v) => self.verts.new_of(v).map(ElemId::Vert),
                ElemId::Edge(e) => self.edges.new_of(e).map(ElemId::Edge),
                ElemId::Face(f) => self.faces.new_of(f).map(ElemId::Face),
                ElemId::Loop(_) => None,
            })
            .collect();
        mesh.select_history.extend(copies);
    }

    /// Vertex, edge and face correspondences merged into one map.
    pub fn elem_map(&self) -> ElemMap {
        let mut map: ElemMap = self.verts.map_into();
        map.extend_from(&self.edges.map_into());
        map.extend_from(&self.faces.map_into());
        map
    }
}

fn duplicate_exec(op: &mut Operator, mesh: &mut Mesh, dest: Option<&mut Mesh>) -> Result<(), MeshError> {
    let use_select_history = op.slots_in.bool("use_select_history")?;
    let use_edge_flip_from_face = op.slots_in.bool("use_edge_flip_from_face")?;
    if use_select_history && dest.is_some() {
        return Err(MeshError::SelectHistoryAcrossMeshes);
    }
    let geom = op.slots_in.buffer("geom")?;

    mesh.clear_oflags(OpFlags::DUPE_ALL);
    mesh.buffer_oflag_enable(&geom, ElemTypes::ALL_NOLOOP, OpFlags::DUPE_INPUT);

    let mut meshes = match dest {
        Some(dst) => {
            dst.clear_oflags(OpFlags::DUPE_ALL);
            MeshPair::Distinct { src: mesh, dst }
        }
        None => MeshPair::Same(mesh),
    };

    let mut duplicator = ElementDuplicator::new(&meshes, use_edge_flip_from_face);
    duplicator.run(&mut meshes);
    if use_select_history {
        duplicator.extend_select_history(meshes.dst_mut());
    }

    // Rescan rather than trusting the pass, the mesh is the source of truth
    // for what was created.
    let new_geom = meshes.dst().buffer_from_oflag(ElemTypes::ALL_NOLOOP, OpFlags::DUPE_NEW);

    op.slots_out.set("geom_orig.out", geom)?;
    op.slots_out.set("geom.out", new_geom)?;
    op.slots_out.set("vert_map.out", duplicator.verts.map_into::<ElemId>())?;
    op.slots_out.set("edge_map.out", duplicator.edges.map_into::<ElemId>())?;
    op.slots_out.set("face_map.out", duplicator.faces.map_into::<ElemId>())?;
    op.slots_out.set("elem_map.out", duplicator.elem_map())?;
    op.slots_out.set("boundary_map.out", duplicator.boundary_edges.map_into::<ElemId>())?;
    op.slots_out.set("isovert_map.out", duplicator.isolated_verts.map_into::<ElemId>())?;

    meshes.src_mut().clear_oflags(OpFlags::DUPE_ALL);
    meshes.dst_mut().clear_oflags(OpFlags::DUPE_ALL);
    Ok(())
}

fn split_exec(op: &mut Operator, mesh: &mut Mesh, _dest: Option<&mut Mesh>) -> Result<(), MeshError> {
    let use_only_faces = op.slots_in.bool("use_only_faces")?;

    let mut dupe = Operator::from_def(&DUPLICATE_DEF);
    dupe.slots_in.copy_from("geom", &op.slots_in, "geom")?;
    dupe.slots_in.copy_from("use_select_history", &op.slots_in, "use_select_history")?;
    dupe.slots_in.copy_from("use_edge_flip_from_face", &op.slots_in, "use_edge_flip_from_face")?;
    dupe.exec_nested(mesh)?;

    let face_map = dupe.slots_out.map("face_map.out")?;
    if let Some(active) = mesh.active_face {
        if let Some(ElemId::Face(copy)) = face_map.new_of(ElemId::Face(active)) {
            mesh.active_face = Some(copy);
        }
    }

    mesh.clear_oflags(OpFlags::SPLIT_INPUT);
    mesh.buffer_oflag_enable(op.slots_in.buffer_ref("geom")?, ElemTypes::ALL_NOLOOP, OpFlags::SPLIT_INPUT);

    if use_only_faces {
        // Edges whose every face goes, then vertices whose every edge goes.
        // Wire edges and loose vertices are left alone.
        let edges: Vec<EdgeId> = mesh
            .edge_ids()
            .filter(|e| {
                let edge = mesh.edge_handle(*e);
                !edge.is_wire() && edge.faces().all(|f| mesh.oflag_test(f, OpFlags::SPLIT_INPUT))
            })
            .collect();
        for e in edges {
            mesh.oflag_enable(e, OpFlags::SPLIT_INPUT);
        }

        let verts: Vec<VertId> = mesh
            .vert_ids()
            .filter(|v| {
                let vert = mesh.vert_handle(*v);
                !vert.is_loose() && vert.star_edges().all(|e| mesh.oflag_test(e.id(), OpFlags::SPLIT_INPUT))
            })
            .collect();
        for v in verts {
            mesh.oflag_enable(v, OpFlags::SPLIT_INPUT);
        }
    }

    // Read everything the outputs need from the originals before they go.
    let plan = mesh.plan_delete(OpFlags::SPLIT_INPUT, DeleteContext::Faces);
    let mut boundary_map = dupe.slots_out.map("boundary_map.out")?;
    let mut isovert_map = dupe.slots_out.map("isovert_map.out")?;
    for map in [&mut boundary_map, &mut isovert_map] {
        let doomed: Vec<ElemId> = map
            .pairs()
            .map(|(old, _)| old)
            .filter(|old| plan.will_remove(mesh, *old))
            .collect();
        for old in doomed {
            map.rekey_to_new(old);
        }
    }

    op.slots_out.copy_from("geom.out", &dupe.slots_out, "geom.out")?;
    op.slots_out.set("boundary_map.out", boundary_map)?;
    op.slots_out.set("isovert_map.out", isovert_map)?;

    mesh.execute_delete(&plan);
    mesh.clear_oflags(OpFlags::SPLIT_INPUT);

    debug!(
        removed_faces = plan.faces.len(),
        removed_edges = plan.edges.len(),
        removed_verts = plan.verts.len(),
        "split"
    );
    Ok(())
}

fn delete_exec(op: &mut Operator, mesh: &mut Mesh, _dest: Option<&mut Mesh>) -> Result<(), MeshError> {
    let context = DeleteContext::try_from(op.slots_in.int("context")?)?;

    mesh.clear_oflags(OpFlags::DEL_INPUT);
    mesh.buffer_oflag_enable(op.slots_in.buffer_ref("geom")?, ElemTypes::ALL_NOLOOP, OpFlags::DEL_INPUT);
    mesh.delete_oflag_context(OpFlags::DEL_INPUT, context);
    mesh.clear_oflags(OpFlags::DEL_INPUT);

    debug!(?context, "delete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::custom_data::{AttributeKind, AttributeValue};
    use crate::elements::ElemBuffer;
    use crate::test_meshes;
    use crate::validation::{is_correct, MeshCorrectness};
    use crate::Vec3;

    fn faces_of(mesh: &Mesh) -> ElemBuffer {
        mesh.face_ids().collect()
    }

    #[test]
    fn test_triangle_into_fresh_mesh() {
        let mut mesh = test_meshes::triangle();
        let mut dest = Mesh::new();
        let mut op = Operator::new("duplicate")
            .unwrap()
            .with("geom", faces_of(&mesh))
            .unwrap();
        op.exec_with_dest(&mut mesh, &mut dest).unwrap();

        assert_eq!(dest.vert_count(), 3);
        assert_eq!(dest.edge_count(), 3);
        assert_eq!(dest.face_count(), 1);
        assert_eq!(mesh.vert_count(), 3);
        assert_eq!(op.slots_out.map("boundary_map.out").unwrap().len(), 3);
        assert!(op.slots_out.map("isovert_map.out").unwrap().is_empty());
        assert_eq!(op.slots_out.buffer("geom.out").unwrap().len(), 7);
        assert_eq!(is_correct(&dest), MeshCorrectness::Correct);
        assert!(mesh.buffer_from_oflag(ElemTypes::ALL_NOLOOP, OpFlags::DUPE_ALL).is_empty());
        assert!(dest.buffer_from_oflag(ElemTypes::ALL_NOLOOP, OpFlags::DUPE_ALL).is_empty());
    }

    #[test]
    fn test_adjacent_triangles_boundary() {
        let mut mesh = test_meshes::two_triangles();
        let mut op = Operator::new("duplicate")
            .unwrap()
            .with("geom", faces_of(&mesh))
            .unwrap();
        op.exec(&mut mesh).unwrap();

        assert_eq!(mesh.vert_count(), 8);
        assert_eq!(mesh.edge_count(), 10);
        assert_eq!(mesh.face_count(), 4);

        let boundary = op.slots_out.map("boundary_map.out").unwrap();
        assert_eq!(boundary.len(), 4);
        // The shared diagonal borders two copied faces.
        assert_eq!(boundary.lookup(ElemId::Edge(EdgeId(2))), None);
        assert!(boundary.lookup(ElemId::Edge(EdgeId(0))).is_some());
        assert_eq!(is_correct(&mesh), MeshCorrectness::Correct);
    }

    #[test]
    fn test_maps_are_bidirectional() {
        let mut mesh = test_meshes::grid(2, 2);
        let mut op = Operator::new("duplicate")
            .unwrap()
            .with("geom", test_meshes::all_geom(&mesh))
            .unwrap();
        op.exec(&mut mesh).unwrap();

        let map = op.slots_out.map("elem_map.out").unwrap();
        assert_eq!(map.len(), 9 + 12 + 4);
        for (old, new) in map.pairs() {
            assert_eq!(map.lookup(new), Some(old));
            assert_eq!(map.lookup(map.lookup(old).unwrap()), Some(old));
        }
        assert_eq!(op.slots_out.buffer("geom_orig.out").unwrap().len(), 25);
    }

    #[test]
    fn test_face_topology_is_preserved() {
        let mut mesh = test_meshes::grid(2, 1);
        let mut op = Operator::new("duplicate")
            .unwrap()
            .with("geom", faces_of(&mesh))
            .unwrap();
        op.exec(&mut mesh).unwrap();

        let verts = op.slots_out.map("vert_map.out").unwrap();
        let faces = op.slots_out.map("face_map.out").unwrap();
        for (old, new) in faces.pairs() {
            let old_verts: Vec<_> = mesh.face_handle(old.as_face().unwrap()).vertex_ids().collect();
            let new_verts: Vec<_> = mesh.face_handle(new.as_face().unwrap()).vertex_ids().collect();
            let mapped: Vec<_> = old_verts
                .iter()
                .map(|v| verts.lookup(ElemId::Vert(*v)).unwrap())
                .collect();
            assert_eq!(mapped, new_verts.into_iter().map(ElemId::Vert).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_isolated_vertex() {
        let mut mesh = test_meshes::triangle();
        let loose = mesh.add_vert(Vec3::new(5.0, 0.0, 0.0), None);
        let mut geom = ElemBuffer::new();
        geom.push(loose);
        geom.push(VertId(0));

        let mut op = Operator::new("duplicate").unwrap().with("geom", geom).unwrap();
        op.exec(&mut mesh).unwrap();

        let isolated = op.slots_out.map("isovert_map.out").unwrap();
        // Vertex 0 has no flagged edge or face either.
        assert_eq!(isolated.len(), 2);
        assert!(isolated.lookup(ElemId::Vert(loose)).is_some());
        assert!(op.slots_out.map("boundary_map.out").unwrap().is_empty());
        assert!(op.slots_out.map("face_map.out").unwrap().is_empty());
    }

    #[test]
    fn test_single_loose_vertex() {
        let mut mesh = Mesh::new();
        let v = mesh.add_vert(Vec3::new(1.0, 2.0, 3.0), None);
        let mut geom = ElemBuffer::new();
        geom.push(v);

        let mut op = Operator::new("duplicate").unwrap().with("geom", geom).unwrap();
        op.exec(&mut mesh).unwrap();

        let copy = op.slots_out.buffer("geom.out").unwrap().verts().next().unwrap();
        let isolated = op.slots_out.map("isovert_map.out").unwrap();
        assert_eq!(isolated.pairs().collect::<Vec<_>>(), vec![(ElemId::Vert(v), ElemId::Vert(copy))]);
        assert_eq!(mesh.vert_count(), 2);
        assert_relative_eq!(mesh.vert_handle(copy).co(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_face_corner_is_not_isolated() {
        let mut mesh = test_meshes::triangle();
        let mut geom = test_meshes::all_geom(&mesh);
        geom.retain(|e| !matches!(e, ElemId::Edge(_)));

        let mut op = Operator::new("duplicate").unwrap().with("geom", geom).unwrap();
        op.exec(&mut mesh).unwrap();
        assert!(op.slots_out.map("isovert_map.out").unwrap().is_empty());
        assert_eq!(op.slots_out.map("vert_map.out").unwrap().len(), 3);
    }

    #[test]
    fn test_non_manifold_edge_not_boundary() {
        let mut mesh = test_meshes::fan_of_three();
        let mut op = Operator::new("duplicate")
            .unwrap()
            .with("geom", faces_of(&mesh))
            .unwrap();
        op.exec(&mut mesh).unwrap();

        let hinge = mesh.find_edge(VertId(0), VertId(1)).unwrap();
        let boundary = op.slots_out.map("boundary_map.out").unwrap();
        assert_eq!(boundary.lookup(ElemId::Edge(hinge)), None);
        assert_eq!(boundary.len(), 6);
    }

    #[test]
    fn test_edge_flip_from_face() {
        let mut mesh = test_meshes::triangle();
        let mut op = Operator::new("duplicate")
            .unwrap()
            .with("geom", test_meshes::all_geom(&mesh))
            .unwrap()
            .with("use_edge_flip_from_face", true)
            .unwrap();
        op.exec(&mut mesh).unwrap();

        // Every edge of a lone face is a boundary whose loop starts at v1.
        let edges = op.slots_out.map("edge_map.out").unwrap();
        for e in 0..3 {
            let old = mesh.edge_handle(EdgeId(e)).vertex_ids();
            let new = edges.new_of(ElemId::Edge(EdgeId(e))).unwrap().as_edge().unwrap();
            let [a, b] = mesh.edge_handle(new).vertex_ids();
            let verts = op.slots_out.map("vert_map.out").unwrap();
            assert_eq!(verts.old_of(ElemId::Vert(a)), Some(ElemId::Vert(old[1])));
            assert_eq!(verts.old_of(ElemId::Vert(b)), Some(ElemId::Vert(old[0])));
        }
        assert_eq!(is_correct(&mesh), MeshCorrectness::Correct);
    }

    #[test]
    fn test_select_history() {
        let mut mesh = test_meshes::two_triangles();
        mesh.push_select_history(ElemId::Vert(VertId(3)));
        mesh.push_select_history(ElemId::Face(FaceId(0)));

        let mut geom = ElemBuffer::new();
        geom.push(FaceId(0));
        let mut op = Operator::new("duplicate")
            .unwrap()
            .with("geom", geom)
            .unwrap()
            .with("use_select_history", true)
            .unwrap();
        op.exec(&mut mesh).unwrap();

        // Vertex 3 is not part of face 0, only the face copy is appended.
        assert_eq!(mesh.select_history().len(), 3);
        assert_eq!(mesh.select_history()[2], ElemId::Face(FaceId(2)));

        let mut dest = Mesh::new();
        assert_eq!(
            op.exec_with_dest(&mut mesh, &mut dest),
            Err(MeshError::SelectHistoryAcrossMeshes)
        );
    }

    #[test]
    fn test_attributes_across_layouts() {
        let mut mesh = test_meshes::triangle();
        mesh.add_layer(AttrDomain::Loop, "uv", AttributeKind::Float2).unwrap();
        mesh.add_layer(AttrDomain::Vert, "weight", AttributeKind::Float).unwrap();
        let first = mesh.face_handle(FaceId(0)).loop_().id();
        let uv = AttributeValue::Float2(nalgebra::Vector2::new(0.25, 0.75));
        mesh.loop_data.set("uv", first.to_index(), uv.clone()).unwrap();

        let mut dest = Mesh::new();
        dest.add_layer(AttrDomain::Loop, "uv", AttributeKind::Float2).unwrap();
        let mut op = Operator::new("duplicate")
            .unwrap()
            .with("geom", faces_of(&mesh))
            .unwrap();
        op.exec_with_dest(&mut mesh, &mut dest).unwrap();

        let copy_first = dest.face_handle(FaceId(0)).loop_().id();
        assert_eq!(dest.loop_data.get("uv", copy_first.to_index()).unwrap(), uv);
        assert_eq!(dest.vert_data.layer_count(), 0);
    }

    #[test]
    fn test_split_keeps_only_copies() {
        let mut mesh = test_meshes::two_triangles();
        mesh.set_active_face(Some(FaceId(0)));
        let mut geom = ElemBuffer::new();
        geom.push(FaceId(0));

        let mut op = Operator::new("split").unwrap().with("geom", geom).unwrap();
        op.exec(&mut mesh).unwrap();

        // Face 1 keeps 0, 2, 3 and its edges, the copy brings its own.
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.vert_count(), 6);
        assert_eq!(mesh.edge_count(), 6);
        assert_eq!(mesh.active_face(), Some(FaceId(2)));
        assert_eq!(is_correct(&mesh), MeshCorrectness::Correct);

        let boundary = op.slots_out.map("boundary_map.out").unwrap();
        assert_eq!(boundary.len(), 3);
        for (old, new) in boundary.pairs() {
            assert!(mesh.is_elem_active(old));
            assert!(mesh.is_elem_active(new));
        }
        // Edges 0 and 1 were removed, their entries now map copy to copy.
        assert_eq!(boundary.pairs().filter(|(old, new)| old == new).count(), 2);
        assert!(mesh.buffer_from_oflag(ElemTypes::ALL_NOLOOP, OpFlags::SPLIT_INPUT).is_empty());
    }

    #[test]
    fn test_split_matches_duplicate_then_delete() {
        let mut split_mesh = test_meshes::grid(3, 1);
        let mut geom = ElemBuffer::new();
        geom.push(FaceId(1));
        let mut split = Operator::new("split").unwrap().with("geom", geom.clone()).unwrap();
        split.exec(&mut split_mesh).unwrap();

        let mut manual = test_meshes::grid(3, 1);
        let mut dupe = Operator::new("duplicate").unwrap().with("geom", geom.clone()).unwrap();
        dupe.exec(&mut manual).unwrap();
        let mut delete = Operator::new("delete")
            .unwrap()
            .with("geom", geom)
            .unwrap()
            .with("context", DeleteContext::Faces as i32)
            .unwrap();
        delete.exec(&mut manual).unwrap();

        assert_eq!(split_mesh.vert_count(), manual.vert_count());
        assert_eq!(split_mesh.edge_count(), manual.edge_count());
        assert_eq!(split_mesh.face_count(), manual.face_count());
        assert_eq!(split_mesh.to_face_list().1, manual.to_face_list().1);
    }

    #[test]
    fn test_split_use_only_faces() {
        let mut mesh = test_meshes::two_triangles();
        let wire_a = mesh.add_vert(Vec3::new(3.0, 0.0, 0.0), None);
        let wire_b = mesh.add_vert(Vec3::new(4.0, 0.0, 0.0), None);
        mesh.add_edge(wire_a, wire_b, None);

        let mut op = Operator::new("split")
            .unwrap()
            .with("geom", faces_of(&mesh))
            .unwrap()
            .with("use_only_faces", true)
            .unwrap();
        op.exec(&mut mesh).unwrap();

        // The whole patch moves to the copy, the wire edge is untouched.
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.vert_count(), 6);
        assert_eq!(mesh.edge_count(), 6);
        assert_eq!(is_correct(&mesh), MeshCorrectness::Correct);
    }

    #[test]
    fn test_delete_requires_context() {
        let mut mesh = test_meshes::triangle();
        let mut op = Operator::new("delete")
            .unwrap()
            .with("geom", faces_of(&mesh))
            .unwrap();
        assert_eq!(
            op.exec(&mut mesh),
            Err(MeshError::InvalidEnumValue {
                slot: "context".to_string(),
                value: 0
            })
        );

        let mut op = op.with("context", DeleteContext::FacesOnly as i32).unwrap();
        op.exec(&mut mesh).unwrap();
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.edge_count(), 3);
    }
}
