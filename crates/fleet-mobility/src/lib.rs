//! `fleet-mobility` — one vehicle's progress along its current path.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`route`]       | `ActiveRoute` — advance / reset_path state machine        |
//! | [`observation`] | `Observation`, the published attribute schema             |
//! | [`error`]       | `MobilityError`, `InvalidPathReason`, `MobilityResult<T>` |
//!
//! # Movement model
//!
//! A route moves at a constant average speed along a precomputed polyline.
//! Each tick adds the simulated step to `seconds_traveled`; position is the
//! point at `seconds_traveled * speed` metres along the path, clamped to the
//! end.  There is no acceleration and routes never interact.
//!
//! ```text
//! EnRoute ──(distance ≥ length)──▶ AtDestination ──reset_path──▶ Returning
//!                                                                   │
//!                                  Complete ◀──(distance ≥ length)──┘
//! ```

pub mod error;
pub mod observation;
pub mod route;


pub use error::{InvalidPathReason, MobilityError, MobilityResult};
pub use observation::{FieldSpec, FieldType, Observation};
pub use route::ActiveRoute;
