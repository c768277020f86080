//! Operator slot protocol: named, typed input and output slots, the static
//! operator definition table, and execution entry points.
//!
//! ```ignore
//! let mut op = Operator::new("duplicate")?.with("geom", geom)?;
//! op.exec(&mut mesh)?;
//! let new_geom = op.slots_out.buffer("geom.out")?;
//! ```
use bitflags::bitflags;
use nalgebra::{Matrix3, Matrix4};
use tracing::debug;

use crate::elements::{ElemBuffer, ElemTypes};
use crate::error::MeshError;
use crate::id_map::ElemMap;
use crate::{Mesh, Vec3};

pub mod dupe;
pub mod extrude;
pub mod spin;
pub mod transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotType {
    Bool,
    Int,
    Float,
    Vec3,
    Mat3,
    Mat4,
    /// Element buffer restricted to the given kinds.
    Buffer(ElemTypes),
    /// Bidirectional element map.
    Map,
}

impl SlotType {
    fn name(&self) -> &'static str {
        match self {
            SlotType::Bool => "bool",
            SlotType::Int => "int",
            SlotType::Float => "float",
            SlotType::Vec3 => "vec3",
            SlotType::Mat3 => "mat3",
            SlotType::Mat4 => "mat4",
            SlotType::Buffer(_) => "element buffer",
            SlotType::Map => "element map",
        }
    }

    /// Value an unsupplied slot holds.
    fn default_value(&self) -> SlotValue {
        match self {
            SlotType::Bool => SlotValue::Bool(false),
            SlotType::Int => SlotValue::Int(0),
            SlotType::Float => SlotValue::Float(0.0),
            SlotType::Vec3 => SlotValue::Vec3(Vec3::zeros()),
            SlotType::Mat3 => SlotValue::Mat3(Matrix3::identity()),
            SlotType::Mat4 => SlotValue::Mat4(Matrix4::identity()),
            SlotType::Buffer(_) => SlotValue::Buffer(ElemBuffer::new()),
            SlotType::Map => SlotValue::Map(ElemMap::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    Bool(bool),
    Int(i32),
    Float(f64),
    Vec3(Vec3),
    Mat3(Matrix3<f64>),
    Mat4(Matrix4<f64>),
    Buffer(ElemBuffer),
    Map(ElemMap),
}

impl SlotValue {
    fn matches(&self, slot_type: SlotType) -> bool {
        matches!(
            (self, slot_type),
            (SlotValue::Bool(_), SlotType::Bool)
                | (SlotValue::Int(_), SlotType::Int)
                | (SlotValue::Float(_), SlotType::Float)
                | (SlotValue::Vec3(_), SlotType::Vec3)
                | (SlotValue::Mat3(_), SlotType::Mat3)
                | (SlotValue::Mat4(_), SlotType::Mat4)
                | (SlotValue::Buffer(_), SlotType::Buffer(_))
                | (SlotValue::Map(_), SlotType::Map)
        )
    }
}

macro_rules! impl_slot_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SlotValue {
                fn from(value: $ty) -> Self {
                    SlotValue::$variant(value)
                }
            }
        )*
    };
}

impl_slot_value_from!(
    bool => Bool,
    i32 => Int,
    f64 => Float,
    Vec3 => Vec3,
    Matrix3<f64> => Mat3,
    Matrix4<f64> => Mat4,
    ElemBuffer => Buffer,
    ElemMap => Map,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDef {
    pub name: &'static str,
    pub slot_type: SlotType,
}

impl SlotDef {
    pub const fn new(name: &'static str, slot_type: SlotType) -> Self {
        Self { name, slot_type }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct OpTypeFlags: u8 {
        /// Recompute normals once a top level call finishes.
        const NORMALS_CALC = 1 << 0;
        /// The operator may write into a mesh other than its source.
        const USES_DEST = 1 << 1;
    }
}

pub type ExecFn = fn(&mut Operator, &mut Mesh, Option<&mut Mesh>) -> Result<(), MeshError>;

/// Static description of an operator: its name, slots and body.
pub struct OpDefine {
    pub name: &'static str,
    pub slots_in: &'static [SlotDef],
    pub slots_out: &'static [SlotDef],
    pub exec: ExecFn,
    pub type_flag: OpTypeFlags,
}

impl std::fmt::Debug for OpDefine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpDefine")
            .field("name", &self.name)
            .field("slots_in", &self.slots_in)
            .field("slots_out", &self.slots_out)
            .field("type_flag", &self.type_flag)
            .finish()
    }
}

/// Every operator reachable through [`Operator::new`].
pub static OPERATORS: &[&OpDefine] = &[
    &dupe::DUPLICATE_DEF,
    &dupe::SPLIT_DEF,
    &dupe::DELETE_DEF,
    &transform::ROTATE_DEF,
    &transform::TRANSLATE_DEF,
    &extrude::EXTRUDE_FACE_REGION_DEF,
    &spin::SPIN_DEF,
];

pub fn find_operator(name: &str) -> Option<&'static OpDefine> {
    OPERATORS.iter().copied().find(|def| def.name == name)
}

/// Values of one side (input or output) of an operator. Every slot declared by
/// the definition exists and starts at its type's default.
#[derive(Debug, Clone, PartialEq)]
pub struct OpSlots {
    defs: &'static [SlotDef],
    values: Vec<SlotValue>,
}

macro_rules! slot_getter {
    ($fn_name:ident, $variant:ident, $ty:ty) => {
        pub fn $fn_name(&self, name: &str) -> Result<$ty, MeshError> {
            let index = self.index(name)?;
            match &self.values[index] {
                SlotValue::$variant(value) => Ok(value.clone()),
                _ => Err(MeshError::slot_type_mismatch(name, self.defs[index].slot_type.name())),
            }
        }
    };
}

impl OpSlots {
    fn new(defs: &'static [SlotDef]) -> Self {
        Self {
            defs,
            values: defs.iter().map(|d| d.slot_type.default_value()).collect(),
        }
    }

    fn index(&self, name: &str) -> Result<usize, MeshError> {
        self.defs
            .iter()
            .position(|d| d.name == name)
            .ok_or_else(|| MeshError::UnknownSlot {
                slot: name.to_string(),
            })
    }

    pub fn slot_type(&self, name: &str) -> Result<SlotType, MeshError> {
        Ok(self.defs[self.index(name)?].slot_type)
    }

    /// Store `value`, checking its type and, for buffers, the kind of every
    /// element.
    pub fn set(&mut self, name: &str, value: impl Into<SlotValue>) -> Result<(), MeshError> {
        let index = self.index(name)?;
        let slot_type = self.defs[index].slot_type;
        let value = value.into();
        if !value.matches(slot_type) {
            return Err(MeshError::slot_type_mismatch(name, slot_type.name()));
        }

        if let (SlotValue::Buffer(buffer), SlotType::Buffer(allowed)) = (&value, slot_type) {
            if let Some(elem) = buffer.iter().find(|e| !allowed.allows(**e)) {
                return Err(MeshError::ElementTypeNotAllowed {
                    slot: name.to_string(),
                    elem: *elem,
                });
            }
        }

        self.values[index] = value;
        Ok(())
    }

    slot_getter!(bool, Bool, bool);
    slot_getter!(int, Int, i32);
    slot_getter!(float, Float, f64);
    slot_getter!(vec3, Vec3, Vec3);
    slot_getter!(mat3, Mat3, Matrix3<f64>);
    slot_getter!(mat4, Mat4, Matrix4<f64>);
    slot_getter!(buffer, Buffer, ElemBuffer);
    slot_getter!(map, Map, ElemMap);

    /// Borrow a buffer slot without cloning it.
    pub fn buffer_ref(&self, name: &str) -> Result<&ElemBuffer, MeshError> {
        let index = self.index(name)?;
        match &self.values[index] {
            SlotValue::Buffer(buffer) => Ok(buffer),
            _ => Err(MeshError::slot_type_mismatch(name, self.defs[index].slot_type.name())),
        }
    }

    /// Copy slot `from_name` of `from` into slot `to_name` of `self`.
    pub fn copy_from(&mut self, to_name: &str, from: &OpSlots, from_name: &str) -> Result<(), MeshError> {
        let value = from.values[from.index(from_name)?].clone();
        self.set(to_name, value)
    }

    fn iter(&self) -> impl Iterator<Item = (&SlotDef, &SlotValue)> {
        self.defs.iter().zip(self.values.iter())
    }
}

/// An operator instance: a definition plus its input and output slot values.
#[derive(Debug, Clone)]
pub struct Operator {
    def: &'static OpDefine,
    pub slots_in: OpSlots,
    pub slots_out: OpSlots,
}

impl Operator {
    pub fn new(name: &str) -> Result<Self, MeshError> {
        find_operator(name)
            .map(Self::from_def)
            .ok_or_else(|| MeshError::UnknownOperator(name.to_string()))
    }

    pub fn from_def(def: &'static OpDefine) -> Self {
        Self {
            def,
            slots_in: OpSlots::new(def.slots_in),
            slots_out: OpSlots::new(def.slots_out),
        }
    }

    pub fn name(&self) -> &'static str {
        self.def.name
    }

    /// Builder form of setting an input slot.
    pub fn with(mut self, slot: &str, value: impl Into<SlotValue>) -> Result<Self, MeshError> {
        self.slots_in.set(slot, value)?;
        Ok(self)
    }

    /// Run the operator on `mesh`, as a top level call.
    pub fn exec(&mut self, mesh: &mut Mesh) -> Result<(), MeshError> {
        self.validate_inputs(mesh)?;
        debug!(op = self.def.name, "exec");
        let exec = self.def.exec;
        exec(self, mesh, None)?;

        if self.def.type_flag.contains(OpTypeFlags::NORMALS_CALC) {
            mesh.update_normals();
        }
        Ok(())
    }

    /// Run the operator reading from `mesh` and writing into `dest`. Only
    /// operators flagged [`OpTypeFlags::USES_DEST`] accept this.
    pub fn exec_with_dest(&mut self, mesh: &mut Mesh, dest: &mut Mesh) -> Result<(), MeshError> {
        if !self.def.type_flag.contains(OpTypeFlags::USES_DEST) {
            return Err(MeshError::DestinationNotSupported(self.def.name.to_string()));
        }
        self.validate_inputs(mesh)?;
        debug!(op = self.def.name, "exec with destination");
        let exec = self.def.exec;
        exec(self, mesh, Some(&mut *dest))?;

        if self.def.type_flag.contains(OpTypeFlags::NORMALS_CALC) {
            dest.update_normals();
        }
        Ok(())
    }

    /// Run the operator from inside another operator. Normals are left to the
    /// outermost call.
    pub(crate) fn exec_nested(&mut self, mesh: &mut Mesh) -> Result<(), MeshError> {
        self.validate_inputs(mesh)?;
        let exec = self.def.exec;
        exec(self, mesh, None)
    }

    /// Every element of every input buffer must be live in `mesh`.
    fn validate_inputs(&self, mesh: &Mesh) -> Result<(), MeshError> {
        for (_, value) in self.slots_in.iter() {
            if let SlotValue::Buffer(buffer) = value {
                if let Some(elem) = buffer.iter().find(|e| !mesh.is_elem_active(**e)) {
                    return Err(MeshError::InvalidElement(*elem));
                }
            }
        }
        Ok(())
    }
}
