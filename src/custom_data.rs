//! Per-element attribute layers and the copy services used when elements are
//! duplicated. Positions are not attributes, they live on the vertex itself.

use std::fmt::Debug;

use nalgebra::Vector2;

use crate::error::MeshError;
use crate::{Mesh, Vec3};

/// Trait to abstract over a column of attribute values, usually a `Vec<T>`.
#[allow(clippy::len_without_is_empty)]
pub trait PrimitiveContainer: Clone + Debug {
    /// Underlying datum of the container.
    type PrimitiveData: Clone + Debug + Default;

    /// Get datum.
    fn get(&self, index: usize) -> &Self::PrimitiveData;
    /// Set datum.
    fn set(&mut self, index: usize, data: Self::PrimitiveData);
    /// Add datum to container.
    fn push(&mut self, data: Self::PrimitiveData);
    /// Increment or reduce the size of the container.
    fn resize(&mut self, new_size: usize);
    /// Cardinality of the container.
    fn len(&self) -> usize;
    /// Keep the entries whose flag in `keep` is set, preserving order.
    fn compact(&mut self, keep: &[bool]);

    /// Overwrite the datum at `to` with the datum at `from`.
    fn copy_within(&mut self, from: usize, to: usize) {
        let data = self.get(from).clone();
        self.set(to, data);
    }
}

impl<T: Default + Clone + Debug> PrimitiveContainer for Vec<T> {
    type PrimitiveData = T;

    fn get(&self, index: usize) -> &Self::PrimitiveData {
        &self[index]
    }

    fn set(&mut self, index: usize, data: Self::PrimitiveData) {
        self[index] = data
    }

    fn push(&mut self, data: Self::PrimitiveData) {
        Vec::push(self, data)
    }

    fn resize(&mut self, new_size: usize) {
        Vec::resize(self, new_size, T::default());
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn compact(&mut self, keep: &[bool]) {
        debug_assert!(keep.len() == Vec::len(self));
        let mut index = 0;
        self.retain(|_| {
            let kept = keep[index];
            index += 1;
            kept
        });
    }
}

/// Element kind an attribute layer is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrDomain {
    Vert,
    Edge,
    Loop,
    Face,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Float,
    Int,
    Bool,
    Float2,
    Float3,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Float2(Vector2<f64>),
    Float3(Vec3),
}

impl AttributeValue {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::Float(_) => AttributeKind::Float,
            AttributeValue::Int(_) => AttributeKind::Int,
            AttributeValue::Bool(_) => AttributeKind::Bool,
            AttributeValue::Float2(_) => AttributeKind::Float2,
            AttributeValue::Float3(_) => AttributeKind::Float3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum LayerData {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Bool(Vec<bool>),
    Float2(Vec<Vector2<f64>>),
    Float3(Vec<Vec3>),
}

/// Run `$body` against the typed column behind a [`LayerData`].
macro_rules! with_column {
    ($data:expr, $column:ident => $body:expr) => {
        match $data {
            LayerData::Float($column) => $body,
            LayerData::Int($column) => $body,
            LayerData::Bool($column) => $body,
            LayerData::Float2($column) => $body,
            LayerData::Float3($column) => $body,
        }
    };
}

impl LayerData {
    fn new(kind: AttributeKind, len: usize) -> Self {
        let mut data = match kind {
            AttributeKind::Float => LayerData::Float(Vec::new()),
            AttributeKind::Int => LayerData::Int(Vec::new()),
            AttributeKind::Bool => LayerData::Bool(Vec::new()),
            AttributeKind::Float2 => LayerData::Float2(Vec::new()),
            AttributeKind::Float3 => LayerData::Float3(Vec::new()),
        };
        with_column!(&mut data, column => PrimitiveContainer::resize(column, len));
        data
    }

    fn kind(&self) -> AttributeKind {
        match self {
            LayerData::Float(_) => AttributeKind::Float,
            LayerData::Int(_) => AttributeKind::Int,
            LayerData::Bool(_) => AttributeKind::Bool,
            LayerData::Float2(_) => AttributeKind::Float2,
            LayerData::Float3(_) => AttributeKind::Float3,
        }
    }

    fn value(&self, index: usize) -> AttributeValue {
        match self {
            LayerData::Float(c) => AttributeValue::Float(c[index]),
            LayerData::Int(c) => AttributeValue::Int(c[index]),
            LayerData::Bool(c) => AttributeValue::Bool(c[index]),
            LayerData::Float2(c) => AttributeValue::Float2(c[index]),
            LayerData::Float3(c) => AttributeValue::Float3(c[index]),
        }
    }

    /// Store `value`, returns false if its kind does not match the layer.
    fn set_value(&mut self, index: usize, value: AttributeValue) -> bool {
        match (self, value) {
            (LayerData::Float(c), AttributeValue::Float(v)) => c[index] = v,
            (LayerData::Int(c), AttributeValue::Int(v)) => c[index] = v,
            (LayerData::Bool(c), AttributeValue::Bool(v)) => c[index] = v,
            (LayerData::Float2(c), AttributeValue::Float2(v)) => c[index] = v,
            (LayerData::Float3(c), AttributeValue::Float3(v)) => c[index] = v,
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Layer {
    name: String,
    data: LayerData,
}

/// Attribute layers of one element domain. Every layer holds exactly one
/// value per element slot, including deactivated slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomData {
    layers: Vec<Layer>,
    len: usize,
}

impl CustomData {
    /// Number of element slots every layer holds.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name == name)
    }

    /// Ordered `(name, kind)` description of the layers.
    pub fn layout(&self) -> Vec<(&str, AttributeKind)> {
        self.layers
            .iter()
            .map(|l| (l.name.as_str(), l.data.kind()))
            .collect()
    }

    pub fn same_layout(&self, other: &CustomData) -> bool {
        self.layout() == other.layout()
    }

    pub fn add_layer(&mut self, name: &str, kind: AttributeKind) -> Result<usize, MeshError> {
        if self.layer_index(name).is_some() {
            return Err(MeshError::DuplicateLayer(name.to_string()));
        }
        self.layers.push(Layer {
            name: name.to_string(),
            data: LayerData::new(kind, self.len),
        });
        Ok(self.layers.len() - 1)
    }

    pub fn get(&self, name: &str, index: usize) -> Result<AttributeValue, MeshError> {
        let layer = self
            .layer_index(name)
            .ok_or_else(|| MeshError::UnknownLayer(name.to_string()))?;
        Ok(self.layers[layer].data.value(index))
    }

    pub fn set(&mut self, name: &str, index: usize, value: AttributeValue) -> Result<(), MeshError> {
        let layer = self
            .layer_index(name)
            .ok_or_else(|| MeshError::UnknownLayer(name.to_string()))?;
        if !self.layers[layer].data.set_value(index, value) {
            return Err(MeshError::AttributeKindMismatch(name.to_string()));
        }
        Ok(())
    }

    /// Append a default value to every layer for a freshly created element.
    pub(crate) fn push_default(&mut self) {
        for layer in &mut self.layers {
            with_column!(&mut layer.data, column => column.push(Default::default()));
        }
        self.len += 1;
    }

    /// Copy every layer value of element `from` onto element `to`.
    pub(crate) fn copy_element(&mut self, from: usize, to: usize) {
        for layer in &mut self.layers {
            with_column!(&mut layer.data, column => column.copy_within(from, to));
        }
    }

    pub(crate) fn compact(&mut self, keep: &[bool]) {
        for layer in &mut self.layers {
            with_column!(&mut layer.data, column => column.compact(keep));
        }
        self.len = keep.iter().filter(|k| **k).count();
    }
}

/// Pairs of `(source layer, destination layer)` with equal name and kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerMap {
    pairs: Vec<(usize, usize)>,
}

impl LayerMap {
    pub fn new(src: &CustomData, dst: &CustomData) -> Self {
        let pairs = dst
            .layers
            .iter()
            .enumerate()
            .filter_map(|(dst_index, dst_layer)| {
                src.layers
                    .iter()
                    .position(|l| l.name == dst_layer.name && l.data.kind() == dst_layer.data.kind())
                    .map(|src_index| (src_index, dst_index))
            })
            .collect();
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn copy(&self, src: &CustomData, from: usize, dst: &mut CustomData, to: usize) {
        for (src_layer, dst_layer) in &self.pairs {
            let value = src.layers[*src_layer].data.value(from);
            let stored = dst.layers[*dst_layer].data.set_value(to, value);
            debug_assert!(stored);
        }
    }
}

/// Attribute copy strategy chosen once per duplication pass.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeCopier {
    /// Source and destination share one layout, values are copied slot by slot.
    Identity,
    /// Layers are matched by name and kind, unmatched destination layers keep
    /// their defaults.
    Mapped {
        verts: LayerMap,
        edges: LayerMap,
        loops: LayerMap,
        faces: LayerMap,
    },
}

impl AttributeCopier {
    pub fn new(src: &Mesh, dst: &Mesh) -> Self {
        let same = [AttrDomain::Vert, AttrDomain::Edge, AttrDomain::Loop, AttrDomain::Face]
            .into_iter()
            .all(|d| src.custom_data(d).same_layout(dst.custom_data(d)));
        if same {
            return AttributeCopier::Identity;
        }

        AttributeCopier::Mapped {
            verts: LayerMap::new(&src.vert_data, &dst.vert_data),
            edges: LayerMap::new(&src.edge_data, &dst.edge_data),
            loops: LayerMap::new(&src.loop_data, &dst.loop_data),
            faces: LayerMap::new(&src.face_data, &dst.face_data),
        }
    }

    /// Copy attributes of element `from` in `src` onto element `to` in `dst`.
    pub fn copy(&self, domain: AttrDomain, src: &CustomData, from: usize, dst: &mut CustomData, to: usize) {
        match self {
            AttributeCopier::Identity => {
                for (src_layer, dst_layer) in src.layers.iter().zip(dst.layers.iter_mut()) {
                    let stored = dst_layer.data.set_value(to, src_layer.data.value(from));
                    debug_assert!(stored);
                }
            }
            AttributeCopier::Mapped {
                verts,
                edges,
                loops,
                faces,
            } => {
                let map = match domain {
                    AttrDomain::Vert => verts,
                    AttrDomain::Edge => edges,
                    AttrDomain::Loop => loops,
                    AttrDomain::Face => faces,
                };
                map.copy(src, from, dst, to);
            }
        }
    }
}

impl Mesh {
    /// Add an attribute layer to `domain`, initialised to defaults.
    pub fn add_layer(&mut self, domain: AttrDomain, name: &str, kind: AttributeKind) -> Result<usize, MeshError> {
        self.custom_data_mut(domain).add_layer(name, kind)
    }
}
