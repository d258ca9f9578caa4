//! Sprite Slide entry point
//!
//! Runs a short scripted session headless: keys and buttons are "pressed"
//! on a timeline and the sprite's path is logged. Set `RUST_LOG=debug` to
//! see every state transition.

use std::thread;
use std::time::Duration;

use sprite_slide::platform::{FrameQueue, SystemClock};
use sprite_slide::sim::Clock;
use sprite_slide::{ControlId, Key, Session, Settings, SettingsError};

/// One scripted input
#[derive(Debug, Clone, Copy)]
enum Step {
    KeyDown(Key),
    KeyUp(Key),
    PointerDown(ControlId),
    PointerUp(ControlId),
    Click(ControlId),
    Blur,
}

/// (seconds since start, input)
const SCRIPT: &[(f64, Step)] = &[
    (0.2, Step::KeyDown(Key::ArrowRight)),
    // Left wins while right is still held
    (1.2, Step::KeyDown(Key::ArrowLeft)),
    // Not the active side: no effect
    (1.5, Step::KeyUp(Key::ArrowRight)),
    (2.0, Step::KeyUp(Key::ArrowLeft)),
    (2.2, Step::Click(ControlId::Action)),
    (2.3, Step::Click(ControlId::Action)),
    (2.5, Step::PointerDown(ControlId::MoveRight)),
    (2.6, Step::PointerDown(ControlId::MoveRight)),
    (3.0, Step::PointerUp(ControlId::MoveRight)),
    (3.2, Step::PointerDown(ControlId::MoveLeft)),
    (3.6, Step::Blur),
];

const RUN_SECONDS: f64 = 4.0;

fn apply(session: &mut Session<SystemClock, FrameQueue>, step: Step) {
    match step {
        Step::KeyDown(key) => session.key_down(key),
        Step::KeyUp(key) => session.key_up(key),
        Step::PointerDown(id) => {
            if !session.pointer_down(id) {
                log::info!("{} already held", id.label());
            }
        }
        Step::PointerUp(id) => {
            session.pointer_up(id);
        }
        Step::Click(id) => {
            if !session.click(id) {
                log::info!("{} refused (cooldown or disabled)", id.label());
            }
        }
        Step::Blur => session.blur(),
    }
}

fn run(settings: Settings) -> Result<(), SettingsError> {
    let clock = SystemClock::new();
    let frames = FrameQueue::new();
    let frame_time = Duration::from_secs_f32(1.0 / settings.target_frame_rate);

    let mut session = Session::new(settings, clock, frames.clone())?;
    session.on_direction_change(|d| log::info!("Direction: {}", d.as_str()));
    session.on_click(ControlId::Action, || log::info!("Action fired"));
    session.on_cooldown_change(ControlId::Action, |on| {
        log::info!("Action cooldown {}", if on { "started" } else { "over" })
    });
    session.on_position_change(|p| log::trace!("Position: {:.1}", p.x));

    session.start();
    let mut script = SCRIPT.iter().peekable();
    let mut last_report = 0.0;

    while frames.take_armed().is_some() {
        thread::sleep(frame_time);
        let now = clock.now();

        while let Some((_, step)) = script.next_if(|(at, _)| *at <= now) {
            log::debug!("t={:.2} {:?}", now, step);
            apply(&mut session, *step);
        }

        session.frame();

        if now - last_report >= 0.5 {
            let info = session.debug_info();
            log::info!(
                "t={:.1}s x={:.0} v={:.0} moving={} fps={}",
                now,
                info.position.x,
                info.velocity.x,
                if info.is_moving { "yes" } else { "no" },
                info.fps
            );
            last_report = now;
        }

        if now >= RUN_SECONDS {
            session.stop();
        }
    }

    println!("Final position: {}", session.position());
    Ok(())
}

fn main() {
    env_logger::init();
    log::info!("Sprite Slide (native) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => match Settings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };

    if let Err(e) = run(settings) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
