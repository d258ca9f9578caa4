//! Sprite Slide - a minimal real-time interaction loop
//!
//! Core modules:
//! - `sim`: Scheduler, kinematic entity, input resolution, button state
//! - `session`: Wires the components together and takes host input
//! - `platform`: Clock and frame-request implementations
//! - `settings`: JSON-backed configuration

pub mod error;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{DeltaError, SettingsError};
pub use session::{ControlId, DebugInfo, Key, Session};
pub use settings::{Bounds, Settings, TimestepMode};

/// Default configuration constants
pub mod consts {
    /// Entity speed while a direction is held (units/second)
    pub const SPEED: f32 = 300.0;

    /// Horizontal clamp range
    pub const MIN_X: f32 = 0.0;
    pub const MAX_X: f32 = 700.0;

    /// Spawn position
    pub const START_X: f32 = 350.0;
    pub const START_Y: f32 = 250.0;

    /// Move button cooldown (seconds)
    pub const MOVE_BUTTON_COOLDOWN: f32 = 0.1;

    /// Step rate for the fixed timestep policy
    pub const TARGET_FRAME_RATE: f32 = 60.0;
    /// Longest frame delta fed to the simulation (after a tab was hidden, etc.)
    pub const MAX_FRAME_DELTA: f32 = 0.1;
    /// Maximum fixed steps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
}
