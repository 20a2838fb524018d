//! Operating system collaborators
//!
//! The navigation core only talks to the OS through the traits below.
//! Win32 implementations live in the `cfg(windows)` modules; the headless
//! set works everywhere and is what the script mode and tests use.

use thiserror::Error;

use crate::app::state::{MouseButton, ScrollDirection, SoundCue};
use crate::domain::core::{Point, Region};

pub mod headless;
#[cfg(windows)]
pub mod monitors;
#[cfg(windows)]
pub mod pointer;
#[cfg(windows)]
pub mod sound;

/// Errors reported by OS collaborators
///
/// The event loop logs these and moves on; none of them changes
/// navigation state.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("failed to read cursor position")]
    CursorPosition,
    #[error("no monitor found at ({x}, {y})")]
    MonitorNotFound { x: i32, y: i32 },
    #[error("monitor information unavailable")]
    MonitorInfo,
    #[error("monitor reported invalid bounds: {0}")]
    InvalidMonitor(String),
    #[error("failed to move pointer to ({x}, {y})")]
    MoveFailed { x: i32, y: i32 },
    /// `SendInput` injected fewer events than requested
    #[error("input injection incomplete: {sent} of {expected} events sent")]
    InjectionIncomplete { sent: u32, expected: u32 },
    #[error("sound playback failed: {0}")]
    Sound(String),
}

/// Finds the monitor the user is working on
pub trait MonitorLocator {
    /// Bounds of the monitor currently containing the system cursor
    fn locate_active_monitor(&self) -> Result<Region, PlatformError>;
}

/// Moves the system pointer and synthesizes button and wheel input
pub trait PointerDriver {
    fn move_to(&mut self, point: Point) -> Result<(), PlatformError>;

    fn click(&mut self, button: MouseButton) -> Result<(), PlatformError>;

    /// Scrolls by `amount` notches at the current pointer position
    fn scroll(&mut self, direction: ScrollDirection, amount: u32) -> Result<(), PlatformError>;
}

/// Plays short audible cues
pub trait SoundPlayer {
    fn play(&mut self, cue: SoundCue) -> Result<(), PlatformError>;
}

/// One wheel notch in Win32 units
pub const WHEEL_DELTA: i32 = 120;

/// Splits a scroll of `amount` notches into signed wheel deltas
///
/// Each delta fits the 16-bit signed wheel field. Up and right are
/// positive.
pub fn wheel_deltas(direction: ScrollDirection, amount: u32) -> Vec<i32> {
    const MAX_NOTCHES: u32 = (i16::MAX as i32 / WHEEL_DELTA) as u32;

    let sign = match direction {
        ScrollDirection::Up | ScrollDirection::Right => 1,
        ScrollDirection::Down | ScrollDirection::Left => -1,
    };

    let mut deltas = Vec::new();
    let mut remaining = amount;
    while remaining > 0 {
        let notches = remaining.min(MAX_NOTCHES);
        deltas.push(sign * notches as i32 * WHEEL_DELTA);
        remaining -= notches;
    }
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_scroll_is_one_delta() {
        assert_eq!(wheel_deltas(ScrollDirection::Up, 3), vec![360]);
        assert_eq!(wheel_deltas(ScrollDirection::Down, 3), vec![-360]);
        assert_eq!(wheel_deltas(ScrollDirection::Right, 1), vec![120]);
        assert_eq!(wheel_deltas(ScrollDirection::Left, 1), vec![-120]);
        assert!(wheel_deltas(ScrollDirection::Up, 0).is_empty());
    }

    #[test]
    fn large_scroll_is_split_into_16_bit_chunks() {
        let deltas = wheel_deltas(ScrollDirection::Down, 600);
        assert_eq!(deltas.iter().sum::<i32>(), -600 * WHEEL_DELTA);
        assert!(deltas.iter().all(|d| d.abs() <= i16::MAX as i32));
        assert_eq!(deltas.len(), 3);
    }
}
