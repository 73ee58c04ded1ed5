//! `fleet-core` — foundational types for the fleet simulator.
//!
//! This crate is a dependency of every other `fleet-*` crate.  It has no
//! `fleet-*` dependencies and few external ones (`rand`, `geo`, `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `RouteId` (random 6-char), `WarehouseId`              |
//! | [`geo`]         | `Position`, haversine distance, geodesic heading      |
//! | [`projection`]  | `SpatialReference`, Web Mercator ↔ WGS84              |
//! | [`status`]      | `RouteStatus` lifecycle enum and status codes         |
//! | [`time`]        | `Tick`, `SimClock`, `SimConfig`                       |
//! | [`rng`]         | `SimRng`                                              |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to config and value types.  |

pub mod error;
pub mod geo;
pub mod ids;
pub mod projection;
pub mod rng;
pub mod status;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::Position;
pub use ids::{RouteId, WarehouseId};
pub use projection::SpatialReference;
pub use rng::SimRng;
pub use status::RouteStatus;
pub use time::{SimClock, SimConfig, Tick};
