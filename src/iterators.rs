use crate::edge_handle::EdgeHandle;
use crate::loop_handle::LoopHandle;
use crate::{EdgeId, LoopId, Mesh, VertId};

/// Walks the loops of a face along `next`, starting at the given loop.
pub struct FaceLoopIter<'r> {
    start: LoopId,
    current: LoopId,
    done: bool,

    mesh: &'r Mesh,
}

impl<'r> FaceLoopIter<'r> {
    pub(crate) fn new(start: LoopId, mesh: &'r Mesh) -> Self {
        Self {
            start,
            current: start,
            done: start.is_absent(),
            mesh,
        }
    }
}

impl<'r> Iterator for FaceLoopIter<'r> {
    type Item = LoopHandle<'r>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let handle = self.mesh.loop_handle(self.current);
        self.current = self.mesh.loops_meta[self.current.to_index()].next_id;
        self.done = self.current == self.start;

        Some(handle)
    }
}

/// Walks the loops of every face using an edge, along `radial_next`.
pub struct RadialLoopIter<'r> {
    start: LoopId,
    current: LoopId,
    done: bool,

    mesh: &'r Mesh,
}

impl<'r> RadialLoopIter<'r> {
    pub(crate) fn new(start: LoopId, mesh: &'r Mesh) -> Self {
        Self {
            start,
            current: start,
            done: start.is_absent(),
            mesh,
        }
    }
}

impl<'r> Iterator for RadialLoopIter<'r> {
    type Item = LoopHandle<'r>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let handle = self.mesh.loop_handle(self.current);
        self.current = self.mesh.loops_meta[self.current.to_index()].radial_next_id;
        self.done = self.current == self.start;

        Some(handle)
    }
}

/// Walks the disk cycle of a vertex, i.e. every edge touching it.
pub struct VertStarEdgesIter<'r> {
    start_edge: EdgeId,
    current_edge: EdgeId,
    focused_vertex: VertId,
    done: bool,

    mesh: &'r Mesh,
}

impl<'r> VertStarEdgesIter<'r> {
    pub(crate) fn new(focused_vertex: VertId, mesh: &'r Mesh) -> Self {
        let start_edge = mesh.verts_meta[focused_vertex.to_index()].edge_id;
        Self {
            start_edge,
            current_edge: start_edge,
            focused_vertex,
            done: start_edge.is_absent(),
            mesh,
        }
    }
}

impl<'r> Iterator for VertStarEdgesIter<'r> {
    type Item = EdgeHandle<'r>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let edge = self.mesh.edge_handle(self.current_edge);
        self.current_edge = edge.cycle_at(self.focused_vertex).next_edge;
        self.done = self.current_edge == self.start_edge;

        Some(edge)
    }
}
