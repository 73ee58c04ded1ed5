//! `fleet-dispatch` — owns the fleet of active routes and decides what to
//! ask the route solver next.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`fleet`]     | `RouteFleetManager`, `Applied`, `Reconciliation`           |
//! | [`request`]   | `RouteRequest` / `RouteResponse` solver protocol            |
//! | [`warehouse`] | `Warehouse`, `WarehouseSet`, `WarehouseSource`, in-memory source |
//! | [`loader`]    | `CsvWarehouseSource` — `name,x,y` rows                     |
//! | [`error`]     | `DispatchError`, `DispatchResult<T>`                       |
//!
//! # Request / response protocol
//!
//! The manager never calls the solver itself during a tick.  It hands out
//! [`RouteRequest`]s, the caller solves them wherever it likes (a blocking
//! pool, a remote service) and feeds each [`RouteResponse`] back through
//! [`RouteFleetManager::apply`].  Only [`RouteFleetManager::populate`] solves
//! inline, for synchronous start-up.
//!
//! ```text
//! reconcile(now) ──▶ RouteRequest ──solve──▶ RouteResponse ──▶ apply(now)
//!      ▲                                                          │
//!      └──────────── advance_all(step) each tick ◀────────────────┘
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | `advance_all` runs on Rayon's thread pool.              |

pub mod error;
pub mod fleet;
pub mod loader;
pub mod request;
pub mod warehouse;

#[cfg(test)]
mod tests;

pub use error::{DispatchError, DispatchResult};
pub use fleet::{Applied, Reconciliation, RouteFleetManager};
pub use loader::{load_warehouses_csv, load_warehouses_reader, CsvWarehouseSource};
pub use request::{RouteRequest, RouteResponse};
pub use warehouse::{InMemoryWarehouses, Warehouse, WarehouseSet, WarehouseSource};
