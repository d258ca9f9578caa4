//! Kinematic entity
//!
//! The one thing on screen that moves. Velocity is replaced wholesale by the
//! input resolver; position is only ever written by integration.

use glam::Vec2;

use super::scheduler::Updatable;
use crate::settings::Bounds;

/// Position observer
pub type PositionCallback = Box<dyn FnMut(Vec2)>;

pub struct KinematicEntity {
    position: Vec2,
    velocity: Vec2,
    bounds: Bounds,
    on_position_change: Option<PositionCallback>,
}

impl std::fmt::Debug for KinematicEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KinematicEntity")
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl KinematicEntity {
    /// Spawn at `position` (x is clamped into `bounds` right away)
    pub fn new(position: Vec2, bounds: Bounds) -> Self {
        Self {
            position: Vec2::new(bounds.clamp(position.x), position.y),
            velocity: Vec2::ZERO,
            bounds,
            on_position_change: None,
        }
    }

    pub fn on_position_change(&mut self, callback: impl FnMut(Vec2) + 'static) {
        self.on_position_change = Some(Box::new(callback));
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Advance x by `velocity.x * dt`, then clamp. Returns true if x moved.
    pub fn integrate(&mut self, dt: f32) -> bool {
        let old_x = self.position.x;
        self.position.x = self.bounds.clamp(old_x + self.velocity.x * dt);
        self.position.x != old_x
    }
}

impl Updatable for KinematicEntity {
    fn on_start(&mut self) {
        log::info!("Entity started at position: {}", self.position);
    }

    fn on_update(&mut self, dt: f32) {
        if self.integrate(dt) {
            if let Some(callback) = self.on_position_change.as_mut() {
                callback(self.position);
            }
        }
    }
}
