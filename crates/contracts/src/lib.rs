//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the sensors proxy.
//! All business crates can only depend on this crate, reverse dependencies
//! are prohibited.
//!
//! ## Handle Model
//! - Sub-HALs hand out handles in the low 24 bits
//! - The proxy stamps the sub-HAL index into the bits above before anything
//!   outside the sub-HAL sees the handle

mod batch;
mod blueprint;
mod control;
mod error;
mod event;
mod handle;
mod registry;
mod sensor;
mod sink;
mod wakelock;

pub use batch::EventBatch;
pub use blueprint::*;
pub use control::ControlSurface;
pub use error::*;
pub use event::*;
pub use handle::*;
pub use registry::{SensorRegistry, SensorTable};
pub use sensor::*;
pub use sink::*;
pub use wakelock::{RefCountedWakeLock, ScopedWakelock, WakeLockRefCounter};
