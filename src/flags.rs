//! Per-element flag words.
//!
//! [`HeaderFlags`] are durable element state that travels with a copy.
//! [`OpFlags`] are scratch bits owned by exactly one operator each; the owner
//! clears its bits on entry and on exit, no other operator reads them.
use bitflags::bitflags;

use crate::elements::{ElemBuffer, ElemId, ElemTypes};
use crate::Mesh;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HeaderFlags: u8 {
        const SELECT = 1 << 0;
        const HIDDEN = 1 << 1;
        const SMOOTH = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OpFlags: u16 {
        /// Element duplicator: element requested for duplication.
        const DUPE_INPUT = 1 << 0;
        /// Element duplicator: element created by the current pass.
        const DUPE_NEW = 1 << 1;
        /// Element duplicator: source element already copied in the current pass.
        const DUPE_DONE = 1 << 2;
        /// Split: original geometry removed once the copy exists.
        const SPLIT_INPUT = 1 << 3;
        /// Delete: geometry handed to the contextual delete.
        const DEL_INPUT = 1 << 4;
        /// Region extrusion: faces of the extruded region.
        const EXT_INPUT = 1 << 5;

        const DUPE_ALL = Self::DUPE_INPUT.bits() | Self::DUPE_NEW.bits() | Self::DUPE_DONE.bits();
    }
}

impl Mesh {
    pub fn header(&self, elem: ElemId) -> HeaderFlags {
        match elem {
            ElemId::Vert(id) => self.verts_meta[id.to_index()].header,
            ElemId::Edge(id) => self.edges_meta[id.to_index()].header,
            ElemId::Face(id) => self.faces_meta[id.to_index()].header,
            ElemId::Loop(_) => HeaderFlags::empty(),
        }
    }

    pub fn set_header(&mut self, elem: ElemId, header: HeaderFlags) {
        match elem {
            ElemId::Vert(id) => self.verts_meta[id.to_index()].header = header,
            ElemId::Edge(id) => self.edges_meta[id.to_index()].header = header,
            ElemId::Face(id) => self.faces_meta[id.to_index()].header = header,
            ElemId::Loop(_) => {}
        }
    }

    fn oflags_mut(&mut self, elem: ElemId) -> Option<&mut OpFlags> {
        match elem {
            ElemId::Vert(id) => Some(&mut self.verts_meta[id.to_index()].oflags),
            ElemId::Edge(id) => Some(&mut self.edges_meta[id.to_index()].oflags),
            ElemId::Face(id) => Some(&mut self.faces_meta[id.to_index()].oflags),
            ElemId::Loop(_) => None,
        }
    }

    pub fn oflag_test(&self, elem: impl Into<ElemId>, flag: OpFlags) -> bool {
        match elem.into() {
            ElemId::Vert(id) => self.verts_meta[id.to_index()].oflags.intersects(flag),
            ElemId::Edge(id) => self.edges_meta[id.to_index()].oflags.intersects(flag),
            ElemId::Face(id) => self.faces_meta[id.to_index()].oflags.intersects(flag),
            ElemId::Loop(_) => false,
        }
    }

    pub fn oflag_enable(&mut self, elem: impl Into<ElemId>, flag: OpFlags) {
        if let Some(oflags) = self.oflags_mut(elem.into()) {
            oflags.insert(flag);
        }
    }

    /// Clear `flag` on every element, active or not.
    pub fn clear_oflags(&mut self, flag: OpFlags) {
        self.verts_meta.iter_mut().for_each(|v| v.oflags.remove(flag));
        self.edges_meta.iter_mut().for_each(|e| e.oflags.remove(flag));
        self.faces_meta.iter_mut().for_each(|f| f.oflags.remove(flag));
    }

    /// Enable `flag` on every element of `buffer` whose kind is in `types`.
    pub fn buffer_oflag_enable(&mut self, buffer: &ElemBuffer, types: ElemTypes, flag: OpFlags) {
        for elem in buffer.iter().filter(|e| types.allows(**e)) {
            self.oflag_enable(*elem, flag);
        }
    }

    /// Collect every active element of a kind in `types` that carries `flag`,
    /// vertices first, then edges, then faces.
    pub fn buffer_from_oflag(&self, types: ElemTypes, flag: OpFlags) -> ElemBuffer {
        let mut buffer = ElemBuffer::new();
        if types.contains(ElemTypes::VERT) {
            buffer.extend(
                self.verts_meta
                    .iter()
                    .filter(|v| v.is_active && v.oflags.intersects(flag))
                    .map(|v| ElemId::Vert(v.id)),
            );
        }
        if types.contains(ElemTypes::EDGE) {
            buffer.extend(
                self.edges_meta
                    .iter()
                    .filter(|e| e.is_active && e.oflags.intersects(flag))
                    .map(|e| ElemId::Edge(e.id)),
            );
        }
        if types.contains(ElemTypes::FACE) {
            buffer.extend(
                self.faces_meta
                    .iter()
                    .filter(|f| f.is_active && f.oflags.intersects(flag))
                    .map(|f| ElemId::Face(f.id)),
            );
        }
        buffer
    }
}
