use fleet_core::{RouteId, RouteStatus};
use thiserror::Error;

/// Why a path was refused by an `ActiveRoute`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvalidPathReason {
    /// The path covers no distance.
    ZeroLength,
    /// The solver reported no usable duration, so there is no speed.
    ZeroDuration,
    /// The path starts `gap_m` metres away from where the route stopped.
    Disconnected { gap_m: f64 },
}

impl std::fmt::Display for InvalidPathReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidPathReason::ZeroLength => f.write_str("path has zero length"),
            InvalidPathReason::ZeroDuration => f.write_str("route has no positive duration"),
            InvalidPathReason::Disconnected { gap_m } => {
                write!(f, "path starts {gap_m:.1} m from the route's end point")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum MobilityError {
    #[error("invalid path for route {route}: {reason}")]
    InvalidPath { route: RouteId, reason: InvalidPathReason },

    #[error("route {route} cannot take a return path while {status}")]
    NotAtDestination { route: RouteId, status: RouteStatus },
}

pub type MobilityResult<T> = Result<T, MobilityError>;
