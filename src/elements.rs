//! Mixed element references and buffers.
use bitflags::bitflags;

use crate::{EdgeId, FaceId, LoopId, VertId};

/// Reference to any element of a mesh, tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElemId {
    Vert(VertId),
    Edge(EdgeId),
    Loop(LoopId),
    Face(FaceId),
}

impl ElemId {
    pub fn elem_type(&self) -> ElemTypes {
        match self {
            ElemId::Vert(_) => ElemTypes::VERT,
            ElemId::Edge(_) => ElemTypes::EDGE,
            ElemId::Loop(_) => ElemTypes::LOOP,
            ElemId::Face(_) => ElemTypes::FACE,
        }
    }

    pub fn as_vert(&self) -> Option<VertId> {
        match self {
            ElemId::Vert(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_edge(&self) -> Option<EdgeId> {
        match self {
            ElemId::Edge(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_face(&self) -> Option<FaceId> {
        match self {
            ElemId::Face(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<VertId> for ElemId {
    fn from(id: VertId) -> Self {
        ElemId::Vert(id)
    }
}

impl From<EdgeId> for ElemId {
    fn from(id: EdgeId) -> Self {
        ElemId::Edge(id)
    }
}

impl From<LoopId> for ElemId {
    fn from(id: LoopId) -> Self {
        ElemId::Loop(id)
    }
}

impl From<FaceId> for ElemId {
    fn from(id: FaceId) -> Self {
        ElemId::Face(id)
    }
}

bitflags! {
    /// Bitmask of element kinds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ElemTypes: u8 {
        const VERT = 1 << 0;
        const EDGE = 1 << 1;
        const LOOP = 1 << 2;
        const FACE = 1 << 3;
        const ALL_NOLOOP = Self::VERT.bits() | Self::EDGE.bits() | Self::FACE.bits();
    }
}

impl ElemTypes {
    pub fn allows(&self, elem: ElemId) -> bool {
        self.contains(elem.elem_type())
    }
}

/// Ordered buffer of element references of mixed kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElemBuffer {
    elems: Vec<ElemId>,
}

impl ElemBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, elem: impl Into<ElemId>) {
        self.elems.push(elem.into());
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElemId> {
        self.elems.iter()
    }

    pub fn as_slice(&self) -> &[ElemId] {
        &self.elems
    }

    pub fn contains(&self, elem: impl Into<ElemId>) -> bool {
        let elem = elem.into();
        self.elems.contains(&elem)
    }

    pub fn verts(&self) -> impl Iterator<Item = VertId> + '_ {
        self.elems.iter().filter_map(|e| e.as_vert())
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.elems.iter().filter_map(|e| e.as_edge())
    }

    pub fn faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.elems.iter().filter_map(|e| e.as_face())
    }

    /// Number of entries whose kind is in `types`.
    pub fn count(&self, types: ElemTypes) -> usize {
        self.elems.iter().filter(|e| types.allows(**e)).count()
    }

    pub fn retain<F: FnMut(&ElemId) -> bool>(&mut self, f: F) {
        self.elems.retain(f)
    }
}

impl<E: Into<ElemId>> Extend<E> for ElemBuffer {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        self.elems.extend(iter.into_iter().map(Into::into));
    }
}

impl<E: Into<ElemId>> FromIterator<E> for ElemBuffer {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            elems: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_filters_by_kind() {
        let buffer: ElemBuffer = [
            ElemId::Vert(VertId(0)),
            ElemId::Edge(EdgeId(3)),
            ElemId::Face(FaceId(1)),
            ElemId::Vert(VertId(2)),
        ]
        .into_iter()
        .collect();

        assert_eq!(buffer.verts().collect::<Vec<_>>(), vec![VertId(0), VertId(2)]);
        assert_eq!(buffer.edges().collect::<Vec<_>>(), vec![EdgeId(3)]);
        assert_eq!(buffer.count(ElemTypes::VERT.union(ElemTypes::FACE)), 3);
        assert!(buffer.contains(FaceId(1)));
        assert!(!ElemTypes::ALL_NOLOOP.allows(ElemId::Loop(LoopId(0))));
    }
}
