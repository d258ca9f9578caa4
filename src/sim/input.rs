//! Directional input resolution
//!
//! Two keys and two buttons collapse into a single [`Direction`]. The newest
//! press always wins; a release only clears the direction it belongs to.
//!
//! Events are double-buffered: the host queues them whenever they arrive,
//! each one folding into a pending direction, and the resolver commits that
//! at the start of the next tick, before the entity integrates. Readers only
//! ever see the committed direction.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::KinematicEntity;
use super::scheduler::Updatable;

/// The single active movement side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    #[default]
    None,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "Left",
            Direction::Right => "Right",
            Direction::None => "None",
        }
    }

    /// Velocity for this direction at `speed` units/second
    pub fn velocity(&self, speed: f32) -> Vec2 {
        match self {
            Direction::Left => Vec2::new(-speed, 0.0),
            Direction::Right => Vec2::new(speed, 0.0),
            Direction::None => Vec2::ZERO,
        }
    }
}

/// A physical source of directional input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectionalControl {
    LeftKey,
    RightKey,
    LeftButton,
    RightButton,
}

impl DirectionalControl {
    /// Which side this control drives
    pub fn side(&self) -> Direction {
        match self {
            DirectionalControl::LeftKey | DirectionalControl::LeftButton => Direction::Left,
            DirectionalControl::RightKey | DirectionalControl::RightButton => Direction::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Press(DirectionalControl),
    Release(DirectionalControl),
    /// Pointer left a held control, or focus was lost
    Leave(DirectionalControl),
}

/// Apply one event to a direction (last-pressed-wins)
pub fn resolve(current: Direction, event: InputEvent) -> Direction {
    match event {
        InputEvent::Press(control) => control.side(),
        InputEvent::Release(control) | InputEvent::Leave(control) => {
            if current == control.side() {
                Direction::None
            } else {
                current
            }
        }
    }
}

/// Direction observer
pub type DirectionCallback = Box<dyn FnMut(Direction)>;

/// Turns queued input events into velocity on its entity
pub struct DirectionResolver {
    direction: Direction,
    speed: f32,
    pending: Option<Direction>,
    entity: Rc<RefCell<KinematicEntity>>,
    on_direction_change: Option<DirectionCallback>,
}

impl DirectionResolver {
    pub fn new(entity: Rc<RefCell<KinematicEntity>>, speed: f32) -> Self {
        Self {
            direction: Direction::None,
            speed,
            pending: None,
            entity,
            on_direction_change: None,
        }
    }

    pub fn on_direction_change(&mut self, callback: impl FnMut(Direction) + 'static) {
        self.on_direction_change = Some(Box::new(callback));
    }

    /// Committed direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Direction the queued events resolve to, if any are waiting
    pub fn pending(&self) -> Option<Direction> {
        self.pending
    }

    /// Queue an event for the next tick
    pub fn queue(&mut self, event: InputEvent) {
        let current = self.pending.unwrap_or(self.direction);
        self.pending = Some(resolve(current, event));
    }

    /// Take the pending direction, then push the new velocity if it
    /// differs from the committed one. Returns true on change.
    pub fn commit(&mut self) -> bool {
        let Some(after) = self.pending.take() else {
            return false;
        };
        let before = self.direction;
        if after == before {
            return false;
        }

        self.direction = after;
        log::debug!("Direction {} -> {}", before.as_str(), after.as_str());
        self.entity.borrow_mut().set_velocity(after.velocity(self.speed));
        if let Some(callback) = self.on_direction_change.as_mut() {
            callback(after);
        }
        true
    }
}

impl Updatable for DirectionResolver {
    fn on_update(&mut self, _dt: f32) {
        self.commit();
    }
}
