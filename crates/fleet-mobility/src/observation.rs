//! The tuple published for every route on every tick.

use fleet_core::{Position, RouteId, RouteStatus};

/// Attribute column types exposed to observers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Float64,
    Int32,
}

/// One attribute of the observation schema.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name:       &'static str,
    pub field_type: FieldType,
    /// Storage width in bytes (characters for text).
    pub length:     u16,
}

/// A single position report for one entity.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Observation {
    pub entity_id: RouteId,
    /// Degrees clockwise from north, `[0, 360)`.
    pub heading:   f64,
    pub status:    RouteStatus,
    pub position:  Position,
}

impl Observation {
    pub const ENTITY_ID_FIELD: &'static str = "Id";
    pub const HEADING_FIELD:   &'static str = "Heading";
    pub const STATUS_FIELD:    &'static str = "Status";

    /// Attribute schema, in column order.
    pub const SCHEMA: [FieldSpec; 3] = [
        FieldSpec { name: Self::ENTITY_ID_FIELD, field_type: FieldType::Text,    length: 256 },
        FieldSpec { name: Self::HEADING_FIELD,   field_type: FieldType::Float64, length: 8 },
        FieldSpec { name: Self::STATUS_FIELD,    field_type: FieldType::Int32,   length: 4 },
    ];

    #[inline]
    pub fn status_code(&self) -> i32 {
        self.status.code()
    }
}
