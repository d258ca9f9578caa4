//! Platform abstraction layer
//!
//! Implementations of the scheduler's host seams:
//! - Time (`Clock`)
//! - Frame pacing (`FrameRequester`)

pub mod frames;
pub mod time;

pub use frames::FrameQueue;
pub use time::{ManualClock, SystemClock};
