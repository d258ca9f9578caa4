//! Session settings
//!
//! Loaded from a JSON file on native; every field has a default so partial
//! files are fine.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;

/// How the scheduler turns wall-clock time into simulation steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimestepMode {
    /// One update per frame, scaled by the measured frame delta
    #[default]
    Variable,
    /// Whole steps of `1 / target_frame_rate` drained from an accumulator
    Fixed,
}

impl TimestepMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestepMode::Variable => "variable",
            TimestepMode::Fixed => "fixed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "variable" | "var" => Some(TimestepMode::Variable),
            "fixed" => Some(TimestepMode::Fixed),
            _ => None,
        }
    }
}

/// Horizontal range the entity is clamped into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f32,
    pub max: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: MIN_X,
            max: MAX_X,
        }
    }
}

impl Bounds {
    #[inline]
    pub fn clamp(&self, x: f32) -> f32 {
        x.clamp(self.min, self.max)
    }
}

/// Everything a session can be configured with
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Movement ===
    /// Entity speed while a direction is held (units/second)
    pub speed: f32,
    /// Horizontal clamp range
    pub bounds: Bounds,
    /// Where the entity spawns
    pub start_position: Vec2,

    // === Controls ===
    /// Cooldown of the action button (seconds, 0 = none)
    pub cooldown_duration: f32,
    /// Cooldown of the two move buttons (seconds)
    pub move_cooldown: f32,
    /// Start with every button disabled
    pub disabled: bool,

    // === Timing ===
    pub timestep: TimestepMode,
    /// Step rate under [`TimestepMode::Fixed`]
    pub target_frame_rate: f32,
    /// Longest frame delta handed to the simulation (seconds)
    pub max_frame_delta: f32,
    /// Most fixed steps run in a single frame
    pub max_substeps: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: SPEED,
            bounds: Bounds::default(),
            start_position: Vec2::new(START_X, START_Y),

            cooldown_duration: 0.0,
            move_cooldown: MOVE_BUTTON_COOLDOWN,
            disabled: false,

            timestep: TimestepMode::Variable,
            target_frame_rate: TARGET_FRAME_RATE,
            max_frame_delta: MAX_FRAME_DELTA,
            max_substeps: MAX_SUBSTEPS,
        }
    }
}

impl Settings {
    /// Settings with a different timestep policy
    pub fn with_timestep(mode: TimestepMode) -> Self {
        Self {
            timestep: mode,
            ..Self::default()
        }
    }

    /// Fixed step length in seconds
    pub fn fixed_step(&self) -> f32 {
        1.0 / self.target_frame_rate
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(SettingsError::invalid(
                "speed",
                format!("must be finite and >= 0, got {}", self.speed),
            ));
        }
        if !self.bounds.min.is_finite()
            || !self.bounds.max.is_finite()
            || self.bounds.min > self.bounds.max
        {
            return Err(SettingsError::invalid(
                "bounds",
                format!("expected min <= max, got [{}, {}]", self.bounds.min, self.bounds.max),
            ));
        }
        if !self.start_position.is_finite() {
            return Err(SettingsError::invalid("start_position", "must be finite"));
        }
        for (field, value) in [
            ("cooldown_duration", self.cooldown_duration),
            ("move_cooldown", self.move_cooldown),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::invalid(
                    field,
                    format!("must be finite and >= 0, got {}", value),
                ));
            }
        }
        if !self.target_frame_rate.is_finite() || self.target_frame_rate <= 0.0 {
            return Err(SettingsError::invalid(
                "target_frame_rate",
                format!("must be > 0, got {}", self.target_frame_rate),
            ));
        }
        if !self.max_frame_delta.is_finite() || self.max_frame_delta <= 0.0 {
            return Err(SettingsError::invalid(
                "max_frame_delta",
                format!("must be > 0, got {}", self.max_frame_delta),
            ));
        }
        if self.max_substeps == 0 {
            return Err(SettingsError::invalid("max_substeps", "must be at least 1"));
        }
        Ok(())
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
