//! `fleet-spatial` — path geometry, extents, road network, and route solving.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`path`]    | `PathGeometry` — polyline with length / point-at-distance   |
//! | [`extent`]  | `Extent` — rectangle for random destination sampling        |
//! | [`network`] | `RoadNetwork` (CSR + R-tree), `RoadNetworkBuilder`          |
//! | [`solver`]  | `RouteSolver` trait, `SolvedRoute`, `NetworkSolver`         |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                          |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public value types.     |

pub mod error;
pub mod extent;
pub mod network;
pub mod path;
pub mod solver;


pub use error::{SpatialError, SpatialResult};
pub use extent::Extent;
pub use network::{RoadNetwork, RoadNetworkBuilder};
pub use path::PathGeometry;
pub use solver::{NetworkSolver, RouteSolver, SolvedRoute};
