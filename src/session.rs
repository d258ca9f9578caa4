//! Session: the composition root
//!
//! Owns the scheduler and every component for the lifetime of one mounted
//! view, and translates host input (keys, pointer, focus, clicks) into
//! component operations.
//!
//! Registration order is fixed: input resolver, entity, then the three
//! buttons. The resolver goes first so queued input is committed before the
//! entity integrates in the same tick.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use serde::Serialize;

use crate::error::SettingsError;
use crate::settings::Settings;
use crate::sim::{
    Clock, Control, ControlState, Direction, DirectionResolver, DirectionalControl, FrameRequester,
    InputEvent, KinematicEntity, Scheduler, StopHandle, Timestep,
};

/// Frames averaged for the FPS readout
const FPS_WINDOW: usize = 60;

/// The on-screen buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlId {
    MoveLeft,
    MoveRight,
    Action,
}

impl ControlId {
    pub const ALL: [ControlId; 3] = [ControlId::MoveLeft, ControlId::MoveRight, ControlId::Action];

    pub fn label(&self) -> &'static str {
        match self {
            ControlId::MoveLeft => "Move Left",
            ControlId::MoveRight => "Move Right",
            ControlId::Action => "Action",
        }
    }

    /// Directional input this button feeds, if any
    pub fn directional(&self) -> Option<DirectionalControl> {
        match self {
            ControlId::MoveLeft => Some(DirectionalControl::LeftButton),
            ControlId::MoveRight => Some(DirectionalControl::RightButton),
            ControlId::Action => None,
        }
    }
}

/// Keys the session reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
}

impl Key {
    /// Map a DOM-style key name; anything else is ignored
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ArrowLeft" => Some(Key::ArrowLeft),
            "ArrowRight" => Some(Key::ArrowRight),
            _ => None,
        }
    }

    pub fn control(&self) -> DirectionalControl {
        match self {
            Key::ArrowLeft => DirectionalControl::LeftKey,
            Key::ArrowRight => DirectionalControl::RightKey,
        }
    }
}

/// Read-only snapshot for a debug overlay
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DebugInfo {
    pub is_moving: bool,
    pub direction: Direction,
    pub position: Vec2,
    pub velocity: Vec2,
    pub fps: u32,
}

pub struct Session<C: Clock, F: FrameRequester> {
    settings: Settings,
    scheduler: Scheduler<C, F>,
    entity: Rc<RefCell<KinematicEntity>>,
    input: Rc<RefCell<DirectionResolver>>,
    move_left: Rc<RefCell<Control>>,
    move_right: Rc<RefCell<Control>>,
    action: Rc<RefCell<Control>>,
    // FPS tracking
    frame_times: [f64; FPS_WINDOW],
    frame_index: usize,
    frames_recorded: usize,
    fps: u32,
}

impl<C: Clock, F: FrameRequester> Session<C, F> {
    pub fn new(settings: Settings, clock: C, frames: F) -> Result<Self, SettingsError> {
        settings.validate()?;

        let entity = Rc::new(RefCell::new(KinematicEntity::new(
            settings.start_position,
            settings.bounds,
        )));
        let input = Rc::new(RefCell::new(DirectionResolver::new(
            Rc::clone(&entity),
            settings.speed,
        )));
        let make_control = |id: ControlId, cooldown: f32| {
            let mut control = Control::new(id.label(), cooldown);
            control.set_disabled(settings.disabled);
            Rc::new(RefCell::new(control))
        };
        let move_left = make_control(ControlId::MoveLeft, settings.move_cooldown);
        let move_right = make_control(ControlId::MoveRight, settings.move_cooldown);
        let action = make_control(ControlId::Action, settings.cooldown_duration);

        let mut scheduler = Scheduler::new(clock, frames, Timestep::from_settings(&settings));
        scheduler.register(&input);
        scheduler.register(&entity);
        scheduler.register(&move_left);
        scheduler.register(&move_right);
        scheduler.register(&action);

        log::info!(
            "Session ready: speed={} bounds=[{}, {}] timestep={}",
            settings.speed,
            settings.bounds.min,
            settings.bounds.max,
            settings.timestep.as_str()
        );

        Ok(Self {
            settings,
            scheduler,
            entity,
            input,
            move_left,
            move_right,
            action,
            frame_times: [0.0; FPS_WINDOW],
            frame_index: 0,
            frames_recorded: 0,
            fps: 0,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scheduler(&self) -> &Scheduler<C, F> {
        &self.scheduler
    }

    // === Loop ===

    pub fn start(&mut self) {
        self.scheduler.start();
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.scheduler.stop_handle()
    }

    /// Frame callback from the host
    pub fn frame(&mut self) {
        let ticks = self.scheduler.tick_count();
        self.scheduler.frame();
        if self.scheduler.tick_count() != ticks {
            let now = self.scheduler.clock().now();
            self.record_frame_time(now);
        }
    }

    fn record_frame_time(&mut self, now: f64) {
        self.frame_times[self.frame_index] = now;
        self.frame_index = (self.frame_index + 1) % FPS_WINDOW;
        self.frames_recorded += 1;

        if self.frames_recorded >= FPS_WINDOW {
            // Slot about to be overwritten holds the oldest sample
            let oldest = self.frame_times[self.frame_index];
            let elapsed = now - oldest;
            if elapsed > 0.0 {
                self.fps = ((FPS_WINDOW - 1) as f64 / elapsed).round() as u32;
            }
        }
    }

    // === Keyboard ===

    pub fn key_down(&mut self, key: Key) {
        self.input.borrow_mut().queue(InputEvent::Press(key.control()));
    }

    pub fn key_up(&mut self, key: Key) {
        self.input.borrow_mut().queue(InputEvent::Release(key.control()));
    }

    // === Pointer ===

    /// Press a button. Returns whether the press started.
    pub fn pointer_down(&mut self, id: ControlId) -> bool {
        let started = self.control(id).borrow_mut().press_start();
        if started {
            if let Some(control) = id.directional() {
                self.input.borrow_mut().queue(InputEvent::Press(control));
            }
        }
        started
    }

    /// Release a button. Returns whether it was held.
    pub fn pointer_up(&mut self, id: ControlId) -> bool {
        self.end_press(id, InputEvent::Release)
    }

    /// Pointer left a button; counts as a release if it was held
    pub fn pointer_leave(&mut self, id: ControlId) -> bool {
        self.end_press(id, InputEvent::Leave)
    }

    fn end_press(&mut self, id: ControlId, event: fn(DirectionalControl) -> InputEvent) -> bool {
        let was_held = self.control(id).borrow_mut().press_end();
        if was_held {
            if let Some(control) = id.directional() {
                self.input.borrow_mut().queue(event(control));
            }
        }
        was_held
    }

    /// Window lost focus: nothing stays pressed
    pub fn blur(&mut self) {
        for id in ControlId::ALL {
            self.pointer_leave(id);
        }
        let mut input = self.input.borrow_mut();
        input.queue(InputEvent::Leave(DirectionalControl::LeftKey));
        input.queue(InputEvent::Leave(DirectionalControl::RightKey));
    }

    /// Click a button. Returns whether its action fired.
    pub fn click(&mut self, id: ControlId) -> bool {
        self.control(id).borrow_mut().trigger()
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        for id in ControlId::ALL {
            self.control(id).borrow_mut().set_disabled(disabled);
        }
    }

    // === Observers ===

    pub fn on_position_change(&mut self, callback: impl FnMut(Vec2) + 'static) {
        self.entity.borrow_mut().on_position_change(callback);
    }

    pub fn on_direction_change(&mut self, callback: impl FnMut(Direction) + 'static) {
        self.input.borrow_mut().on_direction_change(callback);
    }

    pub fn on_click(&mut self, id: ControlId, callback: impl FnMut() + 'static) {
        self.control(id).borrow_mut().on_click(callback);
    }

    pub fn on_cooldown_change(&mut self, id: ControlId, callback: impl FnMut(bool) + 'static) {
        self.control(id).borrow_mut().on_cooldown_change(callback);
    }

    pub fn on_held_change(&mut self, id: ControlId, callback: impl FnMut(bool) + 'static) {
        self.control(id).borrow_mut().on_held_change(callback);
    }

    // === Queries ===

    pub fn position(&self) -> Vec2 {
        self.entity.borrow().position()
    }

    pub fn velocity(&self) -> Vec2 {
        self.entity.borrow().velocity()
    }

    pub fn direction(&self) -> Direction {
        self.input.borrow().direction()
    }

    pub fn control_state(&self, id: ControlId) -> ControlState {
        self.control(id).borrow().state()
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn debug_info(&self) -> DebugInfo {
        let direction = self.direction();
        DebugInfo {
            is_moving: direction != Direction::None,
            direction,
            position: self.position(),
            velocity: self.velocity(),
            fps: self.fps,
        }
    }

    fn control(&self, id: ControlId) -> &Rc<RefCell<Control>> {
        match id {
            ControlId::MoveLeft => &self.move_left,
            ControlId::MoveRight => &self.move_right,
            ControlId::Action => &self.action,
        }
    }
}

impl<C: Clock, F: FrameRequester> Drop for Session<C, F> {
    fn drop(&mut self) {
        // Unmount: don't leave a frame armed on the host
        self.scheduler.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{FrameQueue, ManualClock};
    use crate::settings::TimestepMode;

    const DT: f64 = 1.0 / 64.0;

    struct Harness {
        session: Session<ManualClock, FrameQueue>,
        clock: ManualClock,
        frames: FrameQueue,
    }

    impl Harness {
        fn new(settings: Settings) -> Self {
            let clock = ManualClock::new();
            let frames = FrameQueue::new();
            let mut session = Session::new(settings, clock.clone(), frames.clone()).unwrap();
            session.start();
            Self {
                session,
                clock,
                frames,
            }
        }

        /// Run `n` frames of `DT` seconds each
        fn run(&mut self, n: usize) {
            self.run_at(n, DT);
        }

        fn run_at(&mut self, n: usize, dt: f64) {
            for _ in 0..n {
                self.clock.advance(dt);
                self.frames.take_armed();
                self.session.frame();
            }
        }
    }

    #[test]
    fn test_slides_right_then_pins_at_max() {
        let mut h = Harness::new(Settings::default());
        assert_eq!(h.session.position(), Vec2::new(350.0, 250.0));

        h.session.key_down(Key::ArrowRight);
        h.run(64);
        assert!((h.session.position().x - 650.0).abs() < 1e-3);

        h.run(32);
        assert_eq!(h.session.position().x, 700.0);
        h.run(64);
        assert_eq!(h.session.position().x, 700.0);
        assert_eq!(h.session.position().y, 250.0);
    }

    #[test]
    fn test_fixed_timestep_matches_scenario() {
        let settings = Settings {
            timestep: TimestepMode::Fixed,
            target_frame_rate: 64.0,
            ..Settings::default()
        };
        let mut h = Harness::new(settings);
        h.session.key_down(Key::ArrowRight);
        h.run(64);
        assert!((h.session.position().x - 650.0).abs() < 1e-3);
    }

    #[test]
    fn test_fixed_timestep_with_uneven_frames() {
        let settings = Settings {
            timestep: TimestepMode::Fixed,
            target_frame_rate: 64.0,
            ..Settings::default()
        };
        let mut h = Harness::new(settings);
        assert_eq!(h.session.settings().fixed_step(), 0.015625);
        h.session.key_down(Key::ArrowRight);

        // 1.5 steps per frame: 32 frames run 48 steps of 300/64
        h.run_at(32, 3.0 / 128.0);
        assert!((h.session.position().x - 575.0).abs() < 1e-3);
    }

    #[test]
    fn test_fixed_timestep_drops_backlog_past_substep_cap() {
        let settings = Settings {
            timestep: TimestepMode::Fixed,
            target_frame_rate: 240.0,
            max_substeps: 2,
            ..Settings::default()
        };
        let mut h = Harness::new(settings);

        // 30 fps can only run 2 of the 8 steps each frame asks for
        h.run_at(300, 1.0 / 30.0);
        assert_eq!(h.session.position().x, 350.0);

        // No wall time passes, so at most the one carried step may run
        h.session.key_down(Key::ArrowRight);
        h.run_at(1000, 0.0);
        assert!(h.session.position().x - 350.0 <= 300.0 / 240.0 + 1e-3);
    }

    #[test]
    fn test_input_commits_at_next_tick() {
        let mut h = Harness::new(Settings::default());
        h.session.key_down(Key::ArrowLeft);
        assert_eq!(h.session.direction(), Direction::None);
        h.run(1);
        assert_eq!(h.session.direction(), Direction::Left);
        assert_eq!(h.session.velocity(), Vec2::new(-300.0, 0.0));
        // Committed velocity was applied in the same tick
        assert!(h.session.position().x < 350.0);
    }

    #[test]
    fn test_last_key_wins() {
        let mut h = Harness::new(Settings::default());
        h.session.key_down(Key::ArrowLeft);
        h.run(1);
        h.session.key_down(Key::ArrowRight);
        h.run(1);
        assert_eq!(h.session.direction(), Direction::Right);

        h.session.key_up(Key::ArrowLeft);
        h.run(1);
        assert_eq!(h.session.direction(), Direction::Right);

        h.session.key_up(Key::ArrowRight);
        h.run(1);
        assert_eq!(h.session.direction(), Direction::None);
        assert_eq!(h.session.velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_pointer_hold_fires_once() {
        let mut h = Harness::new(Settings::default());
        let starts = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&starts);
        h.session
            .on_held_change(ControlId::MoveRight, move |held| sink.borrow_mut().push(held));

        assert!(h.session.pointer_down(ControlId::MoveRight));
        assert!(!h.session.pointer_down(ControlId::MoveRight));
        assert!(!h.session.pointer_down(ControlId::MoveRight));
        assert!(h.session.control_state(ControlId::MoveRight).is_held);
        assert_eq!(*starts.borrow(), vec![true]);

        h.run(1);
        assert_eq!(h.session.direction(), Direction::Right);

        assert!(h.session.pointer_up(ControlId::MoveRight));
        h.run(1);
        assert_eq!(h.session.direction(), Direction::None);
        assert_eq!(*starts.borrow(), vec![true, false]);
    }

    #[test]
    fn test_pointer_leave_releases_held_button() {
        let mut h = Harness::new(Settings::default());
        h.session.pointer_down(ControlId::MoveLeft);
        h.run(1);
        assert_eq!(h.session.direction(), Direction::Left);

        assert!(h.session.pointer_leave(ControlId::MoveLeft));
        h.run(1);
        assert_eq!(h.session.direction(), Direction::None);
    }

    #[test]
    fn test_leaving_unpressed_button_keeps_key_direction() {
        let mut h = Harness::new(Settings::default());
        h.session.key_down(Key::ArrowLeft);
        h.run(1);
        assert!(!h.session.pointer_leave(ControlId::MoveLeft));
        h.run(1);
        assert_eq!(h.session.direction(), Direction::Left);
    }

    #[test]
    fn test_blur_releases_everything() {
        let mut h = Harness::new(Settings::default());
        h.session.pointer_down(ControlId::MoveRight);
        h.session.key_down(Key::ArrowLeft);
        h.run(1);
        assert_eq!(h.session.direction(), Direction::Left);

        h.session.blur();
        h.run(1);
        assert_eq!(h.session.direction(), Direction::None);
        assert!(!h.session.control_state(ControlId::MoveRight).is_held);
    }

    #[test]
    fn test_action_cooldown_advanced_by_ticks() {
        let settings = Settings {
            cooldown_duration: 0.5,
            ..Settings::default()
        };
        let mut h = Harness::new(settings);
        let clicks = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&clicks);
        h.session.on_click(ControlId::Action, move || *sink.borrow_mut() += 1);

        assert!(h.session.click(ControlId::Action));
        // 0.3125s later
        h.run(20);
        assert!(!h.session.click(ControlId::Action));
        // 0.625s total
        h.run(20);
        assert!(h.session.click(ControlId::Action));
        assert_eq!(*clicks.borrow(), 2);
    }

    #[test]
    fn test_move_button_hold_while_cooling_down() {
        let mut h = Harness::new(Settings::default());
        assert!(h.session.click(ControlId::MoveLeft));
        assert!(h.session.control_state(ControlId::MoveLeft).is_on_cooldown);
        assert!(h.session.pointer_down(ControlId::MoveLeft));
        h.run(1);
        assert_eq!(h.session.direction(), Direction::Left);
    }

    #[test]
    fn test_disabled_buttons_do_nothing() {
        let settings = Settings {
            disabled: true,
            ..Settings::default()
        };
        let mut h = Harness::new(settings);
        assert!(!h.session.pointer_down(ControlId::MoveRight));
        assert!(!h.session.click(ControlId::Action));
        h.run(4);
        assert_eq!(h.session.direction(), Direction::None);
        assert_eq!(h.session.position().x, 350.0);

        h.session.set_disabled(false);
        assert!(h.session.pointer_down(ControlId::MoveRight));
    }

    #[test]
    fn test_stop_freezes_simulation() {
        let mut h = Harness::new(Settings::default());
        h.session.key_down(Key::ArrowRight);
        h.run(8);
        let frozen = h.session.position();

        h.session.stop();
        assert_eq!(h.frames.pending(), 0);
        h.run(16);
        assert_eq!(h.session.position(), frozen);
        assert_eq!(h.session.scheduler().tick_count(), 8);
    }

    #[test]
    fn test_position_observer_sees_every_move() {
        let mut h = Harness::new(Settings::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        h.session.on_position_change(move |p| sink.borrow_mut().push(p.x));

        h.run(2);
        assert!(seen.borrow().is_empty());
        h.session.key_down(Key::ArrowRight);
        h.run(3);
        assert_eq!(seen.borrow().len(), 3);
        assert!(seen.borrow().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_debug_info_and_fps() {
        let mut h = Harness::new(Settings::default());
        h.session.key_down(Key::ArrowLeft);
        h.run(FPS_WINDOW);

        let info = h.session.debug_info();
        assert!(info.is_moving);
        assert_eq!(info.direction, Direction::Left);
        assert_eq!(info.velocity, Vec2::new(-300.0, 0.0));
        assert_eq!(info.fps, 64);
    }

    #[test]
    fn test_skipped_frame_not_counted_for_fps() {
        let mut h = Harness::new(Settings::default());
        h.run(FPS_WINDOW);
        assert_eq!(h.session.fps(), 64);
        let ticks = h.session.scheduler().tick_count();

        // Clock steps backwards; the frame is rejected
        h.clock.set(h.clock.now() - 1.0);
        h.frames.take_armed();
        h.session.frame();
        assert_eq!(h.session.scheduler().tick_count(), ticks);
        assert_eq!(h.session.fps(), 64);

        h.run(FPS_WINDOW);
        assert_eq!(h.session.fps(), 64);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = Settings {
            speed: f32::NAN,
            ..Settings::default()
        };
        assert!(Session::new(settings, ManualClock::new(), FrameQueue::new()).is_err());
    }

    #[test]
    fn test_drop_cancels_armed_frame() {
        let h = Harness::new(Settings::default());
        let frames = h.frames.clone();
        assert_eq!(frames.pending(), 1);
        drop(h);
        assert_eq!(frames.pending(), 0);
    }

    #[test]
    fn test_key_names() {
        assert_eq!(Key::from_name("ArrowLeft"), Some(Key::ArrowLeft));
        assert_eq!(Key::from_name("ArrowRight"), Some(Key::ArrowRight));
        assert_eq!(Key::from_name("a"), None);
    }
}
