//! Frame scheduler
//!
//! Drives every registered [`Updatable`] once per frame (or once per fixed
//! step), in registration order. Time comes from an injected [`Clock`] and
//! frames are armed through an injected [`FrameRequester`], so the loop is
//! fully deterministic under test.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::DeltaError;
use crate::settings::{Settings, TimestepMode};

/// Anything the scheduler can drive
pub trait Updatable {
    /// Called once, right when the updatable is registered
    fn on_start(&mut self) {}

    /// Called every tick with the elapsed time in seconds
    fn on_update(&mut self, dt: f32);
}

/// Monotonic time source, in seconds
pub trait Clock {
    fn now(&self) -> f64;
}

/// Opaque id of an armed frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// The host's "call me on the next frame" primitive
pub trait FrameRequester {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Stops a scheduler from anywhere, including from inside a tick
#[derive(Debug, Clone)]
pub struct StopHandle {
    running: Rc<Cell<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.running.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }
}

/// Resolved timestep policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timestep {
    /// One update per frame with the measured delta
    Variable { max_delta: f32 },
    /// Whole fixed steps drained from an accumulator
    Fixed {
        step: f32,
        max_substeps: u32,
        max_delta: f32,
    },
}

impl Timestep {
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.timestep {
            TimestepMode::Variable => Timestep::Variable {
                max_delta: settings.max_frame_delta,
            },
            TimestepMode::Fixed => Timestep::Fixed {
                step: settings.fixed_step(),
                max_substeps: settings.max_substeps,
                max_delta: settings.max_frame_delta,
            },
        }
    }

    fn max_delta(&self) -> f32 {
        match *self {
            Timestep::Variable { max_delta } | Timestep::Fixed { max_delta, .. } => max_delta,
        }
    }
}

impl Default for Timestep {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Validate a raw frame delta and clamp it to `max_delta`
pub fn sanitize_delta(raw: f64, max_delta: f32) -> Result<f32, DeltaError> {
    if !raw.is_finite() {
        return Err(DeltaError::NonFinite(raw));
    }
    if raw < 0.0 {
        return Err(DeltaError::Negative(raw));
    }
    Ok((raw as f32).min(max_delta))
}

type Slot = Weak<RefCell<dyn Updatable>>;

/// Per-frame update loop
pub struct Scheduler<C: Clock, F: FrameRequester> {
    clock: C,
    frames: F,
    timestep: Timestep,
    updatables: Vec<Slot>,
    running: Rc<Cell<bool>>,
    armed: Option<FrameHandle>,
    last_time: f64,
    accumulator: f32,
    tick_count: u64,
}

impl<C: Clock, F: FrameRequester> Scheduler<C, F> {
    pub fn new(clock: C, frames: F, timestep: Timestep) -> Self {
        Self {
            clock,
            frames,
            timestep,
            updatables: Vec::new(),
            running: Rc::new(Cell::new(false)),
            armed: None,
            last_time: 0.0,
            accumulator: 0.0,
            tick_count: 0,
        }
    }

    pub fn timestep(&self) -> Timestep {
        self.timestep
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn frames(&self) -> &F {
        &self.frames
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            running: Rc::clone(&self.running),
        }
    }

    /// Frames dispatched since creation
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Number of registered updatables that are still alive
    pub fn len(&self) -> usize {
        self.updatables.iter().filter(|w| w.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start the loop (no-op if already running)
    pub fn start(&mut self) {
        if self.running.get() {
            return;
        }
        // Left over from a StopHandle stop between frames
        if let Some(handle) = self.armed.take() {
            self.frames.cancel_frame(handle);
        }
        self.running.set(true);
        self.last_time = self.clock.now();
        self.accumulator = 0.0;
        self.armed = Some(self.frames.request_frame());
        log::info!("Scheduler started at t={:.3}", self.last_time);
    }

    /// Stop the loop (no-op if already stopped)
    pub fn stop(&mut self) {
        let was_running = self.running.replace(false);
        if let Some(handle) = self.armed.take() {
            self.frames.cancel_frame(handle);
        }
        if was_running {
            log::info!("Scheduler stopped after {} ticks", self.tick_count);
        }
    }

    /// Register an updatable and run its `on_start` immediately.
    ///
    /// The scheduler only keeps a weak reference; once the owner drops the
    /// updatable it is skipped and pruned.
    pub fn register<T: Updatable + 'static>(&mut self, updatable: &Rc<RefCell<T>>) {
        let strong: Rc<RefCell<dyn Updatable>> = updatable.clone();
        self.updatables.push(Rc::downgrade(&strong));
        updatable.borrow_mut().on_start();
    }

    /// Remove an updatable by identity (no-op if it isn't registered)
    pub fn unregister<T: Updatable + 'static>(&mut self, updatable: &Rc<RefCell<T>>) {
        let target = Rc::as_ptr(updatable) as *const ();
        self.updatables.retain(|slot| slot.as_ptr() as *const () != target);
    }

    /// Frame callback: the host calls this when an armed frame fires
    pub fn frame(&mut self) {
        // A stop from inside the previous tick leaves a handle armed
        if !self.running.get() {
            if let Some(handle) = self.armed.take() {
                self.frames.cancel_frame(handle);
            }
            return;
        }
        self.armed = None;

        let now = self.clock.now();
        let raw = now - self.last_time;
        self.last_time = now;

        match sanitize_delta(raw, self.timestep.max_delta()) {
            Ok(dt) => {
                if (raw as f32) > dt {
                    log::debug!("Frame delta {:.3}s clamped to {:.3}s", raw, dt);
                }
                self.dispatch(dt);
                self.tick_count += 1;
            }
            Err(e) => log::warn!("Skipping frame: {}", e),
        }

        self.updatables.retain(|slot| slot.strong_count() > 0);

        if self.running.get() {
            self.armed = Some(self.frames.request_frame());
        }
    }

    fn dispatch(&mut self, dt: f32) {
        match self.timestep {
            Timestep::Variable { .. } => self.update_all(dt),
            Timestep::Fixed {
                step, max_substeps, ..
            } => {
                self.accumulator += dt;
                let mut substeps = 0;
                while self.accumulator >= step && substeps < max_substeps {
                    if !self.running.get() {
                        break;
                    }
                    self.update_all(step);
                    self.accumulator -= step;
                    substeps += 1;
                }
                // Drop the backlog the cap couldn't run so it never compounds
                if substeps == max_substeps && self.accumulator > step {
                    log::debug!(
                        "Substep cap hit, dropping {:.3}s of backlog",
                        self.accumulator - step
                    );
                    self.accumulator = step;
                }
            }
        }
    }

    fn update_all(&self, dt: f32) {
        for slot in &self.updatables {
            if !self.running.get() {
                return;
            }
            if let Some(updatable) = slot.upgrade() {
                updatable.borrow_mut().on_update(dt);
            }
        }
    }
}
