//! Spatial-subsystem error type.

use thiserror::Error;

use fleet_core::Position;

/// Errors produced by `fleet-spatial`.
///
/// Every variant is a per-request failure: one bad solve never affects
/// other in-flight or future requests.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: Position, to: Position },

    #[error("road network has no nodes")]
    EmptyNetwork,

    #[error("path has no vertices")]
    EmptyPath,

    #[error("path vertex {index} is not a finite coordinate")]
    NonFiniteVertex { index: usize },

    #[error("route from {from} to {to} is degenerate (start and end snap to the same place)")]
    DegenerateRoute { from: Position, to: Position },

    #[error("invalid extent: {0}")]
    InvalidExtent(String),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
