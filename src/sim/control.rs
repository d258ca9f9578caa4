//! Interactive control (button) state machine
//!
//! Hold state and cooldown are independent flags: a button can be held
//! while cooling down. Press/hold callbacks ignore the cooldown, only the
//! discrete `trigger` (click) path is gated by it.

use serde::{Deserialize, Serialize};

use super::scheduler::Updatable;

/// Snapshot of a control's state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlState {
    /// Seconds left on the cooldown (never negative)
    pub cooldown_remaining: f32,
    pub is_on_cooldown: bool,
    pub is_held: bool,
    pub disabled: bool,
}

type Action = Box<dyn FnMut()>;
type FlagCallback = Box<dyn FnMut(bool)>;

/// A button with hold visualization and a fire-once-per-cooldown trigger
pub struct Control {
    label: String,
    cooldown_duration: f32,
    state: ControlState,
    on_click: Option<Action>,
    on_press_start: Option<Action>,
    on_press_end: Option<Action>,
    on_cooldown_change: Option<FlagCallback>,
    on_held_change: Option<FlagCallback>,
}

impl std::fmt::Debug for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Control")
            .field("label", &self.label)
            .field("cooldown_duration", &self.cooldown_duration)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Control {
    /// Negative cooldowns are treated as no cooldown
    pub fn new(label: impl Into<String>, cooldown_duration: f32) -> Self {
        Self {
            label: label.into(),
            cooldown_duration: cooldown_duration.max(0.0),
            state: ControlState::default(),
            on_click: None,
            on_press_start: None,
            on_press_end: None,
            on_cooldown_change: None,
            on_held_change: None,
        }
    }

    pub fn on_click(&mut self, callback: impl FnMut() + 'static) {
        self.on_click = Some(Box::new(callback));
    }

    pub fn on_press_start(&mut self, callback: impl FnMut() + 'static) {
        self.on_press_start = Some(Box::new(callback));
    }

    pub fn on_press_end(&mut self, callback: impl FnMut() + 'static) {
        self.on_press_end = Some(Box::new(callback));
    }

    pub fn on_cooldown_change(&mut self, callback: impl FnMut(bool) + 'static) {
        self.on_cooldown_change = Some(Box::new(callback));
    }

    pub fn on_held_change(&mut self, callback: impl FnMut(bool) + 'static) {
        self.on_held_change = Some(Box::new(callback));
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn cooldown_duration(&self) -> f32 {
        self.cooldown_duration
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    pub fn is_held(&self) -> bool {
        self.state.is_held
    }

    pub fn is_on_cooldown(&self) -> bool {
        self.state.is_on_cooldown
    }

    pub fn is_disabled(&self) -> bool {
        self.state.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        if self.state.disabled != disabled {
            log::debug!("{}: disabled = {}", self.label, disabled);
            self.state.disabled = disabled;
        }
    }

    /// Fire the click action unless disabled or cooling down.
    /// Returns whether it fired.
    pub fn trigger(&mut self) -> bool {
        if self.state.disabled || self.state.is_on_cooldown {
            return false;
        }
        if let Some(callback) = self.on_click.as_mut() {
            callback();
        }
        if self.cooldown_duration > 0.0 {
            self.state.cooldown_remaining = self.cooldown_duration;
            self.set_cooldown(true);
        }
        true
    }

    /// Begin a press. Repeats while already held are ignored.
    /// Returns whether the press started.
    pub fn press_start(&mut self) -> bool {
        if self.state.is_held || self.state.disabled {
            return false;
        }
        self.set_held(true);
        if let Some(callback) = self.on_press_start.as_mut() {
            callback();
        }
        true
    }

    /// End a press. Returns whether the control was held.
    pub fn press_end(&mut self) -> bool {
        if !self.state.is_held {
            return false;
        }
        self.set_held(false);
        if let Some(callback) = self.on_press_end.as_mut() {
            callback();
        }
        true
    }

    fn set_held(&mut self, held: bool) {
        self.state.is_held = held;
        if let Some(callback) = self.on_held_change.as_mut() {
            callback(held);
        }
    }

    fn set_cooldown(&mut self, on: bool) {
        self.state.is_on_cooldown = on;
        log::debug!("{}: cooldown {}", self.label, if on { "started" } else { "ended" });
        if let Some(callback) = self.on_cooldown_change.as_mut() {
            callback(on);
        }
    }
}

impl Updatable for Control {
    fn on_update(&mut self, dt: f32) {
        if !self.state.is_on_cooldown {
            return;
        }
        self.state.cooldown_remaining -= dt;
        if self.state.cooldown_remaining <= 0.0 {
            self.state.cooldown_remaining = 0.0;
            self.set_cooldown(false);
        }
    }
}
