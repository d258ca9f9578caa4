//! Simulation module
//!
//! Everything with temporal logic lives here:
//! - Frame scheduling and timestep policy
//! - Kinematic integration
//! - Directional input resolution
//! - Button press/cooldown state
//!
//! No rendering or platform dependencies; time and frames are injected.

pub mod control;
pub mod entity;
pub mod input;
pub mod scheduler;

pub use control::{Control, ControlState};
pub use entity::KinematicEntity;
pub use input::{Direction, DirectionResolver, DirectionalControl, InputEvent, resolve};
pub use scheduler::{
    Clock, FrameHandle, FrameRequester, Scheduler, StopHandle, Timestep, Updatable, sanitize_delta,
};
