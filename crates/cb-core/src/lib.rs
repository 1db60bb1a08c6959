//! cb-core: stable foundation for the code-blue simulator.
//!
//! Contains:
//! - numeric (Real + tolerances + clamp / first-order smoothing helpers)
//! - ids (compact monotonically assigned IDs for log entries)
//! - rng (seeded linear-congruential generator for reproducible scripts)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod rng;

pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use rng::{Lcg, seed_from_str};
