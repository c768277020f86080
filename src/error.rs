//! Errors raised by mesh construction and operator execution.

use thiserror::Error;

use crate::elements::ElemId;

/// Errors that can occur while building a mesh or running an operator.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    /// No operator definition with this name
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// The operator has no slot with this name
    #[error("Unknown slot: {slot}")]
    UnknownSlot { slot: String },

    /// A slot was read or written with a value of the wrong type
    #[error("Slot {slot} expects a value of type {expected}")]
    SlotTypeMismatch { slot: String, expected: String },

    /// An element buffer slot received an element kind it does not accept
    #[error("Slot {slot} does not accept {elem:?}")]
    ElementTypeNotAllowed { slot: String, elem: ElemId },

    /// An input buffer references a removed or out of range element
    #[error("Invalid element: {0:?}")]
    InvalidElement(ElemId),

    /// An integer slot holding an enumeration has no matching variant
    #[error("Invalid value {value} for slot {slot}")]
    InvalidEnumValue { slot: String, value: i32 },

    #[error("Invalid argument for slot {slot}: {reason}")]
    InvalidArgument { slot: String, reason: String },

    /// A matrix that must be inverted has no inverse
    #[error("Matrix in slot {slot} is not invertible")]
    SingularMatrix { slot: String },

    /// The operator can only write into the mesh it reads from
    #[error("Operator {0} does not support a destination mesh")]
    DestinationNotSupported(String),

    /// Selection history only refers to elements of one mesh
    #[error("Selection history cannot be copied into a different mesh")]
    SelectHistoryAcrossMeshes,

    #[error("Face {face} references vertex {index} which does not exist")]
    FaceIndexOutOfRange { face: usize, index: usize },

    /// Polygon with fewer than three corners or a repeated consecutive corner
    #[error("Face {face} is degenerate")]
    DegenerateFace { face: usize },

    #[error("Attribute layer {0} already exists")]
    DuplicateLayer(String),

    #[error("Unknown attribute layer: {0}")]
    UnknownLayer(String),

    /// A value of the wrong kind was stored into an attribute layer
    #[error("Attribute kind mismatch for layer {0}")]
    AttributeKindMismatch(String),
}

impl MeshError {
    pub fn invalid_argument(slot: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            slot: slot.into(),
            reason: reason.into(),
        }
    }

    pub fn slot_type_mismatch(slot: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::SlotTypeMismatch {
            slot: slot.into(),
            expected: expected.into(),
        }
    }
}
