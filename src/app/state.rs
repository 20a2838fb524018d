//! Navigation state and the vocabulary flowing through the controller
//!
//! Input events come in, effects go out. Both are plain data so the
//! controller can be driven and observed without any platform code.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::domain::core::{Point, Region};

/// Visibility state of the navigation overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavState {
    /// Overlay hidden, grid model discarded
    #[default]
    Hidden,
    /// Overlay shown, digits refine the current region
    Visible,
    /// Overlay temporarily hidden with the grid model kept
    Paused,
}

/// [`NavState`] mirrored for input sources on other threads
#[derive(Debug, Clone, Default)]
pub struct SharedNavState(Arc<AtomicU8>);

impl SharedNavState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> NavState {
        match self.0.load(Ordering::SeqCst) {
            1 => NavState::Visible,
            2 => NavState::Paused,
            _ => NavState::Hidden,
        }
    }

    pub fn store(&self, state: NavState) {
        let raw = match state {
            NavState::Hidden => 0,
            NavState::Visible => 1,
            NavState::Paused => 2,
        };
        self.0.store(raw, Ordering::SeqCst);
    }
}

/// Pointer action committed at the center of the current region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Move,
    LeftClick,
    RightClick,
}

impl PointerAction {
    /// Button to press after moving, if any
    pub fn button(self) -> Option<MouseButton> {
        match self {
            PointerAction::Move => None,
            PointerAction::LeftClick => Some(MouseButton::Left),
            PointerAction::RightClick => Some(MouseButton::Right),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

/// Audible feedback kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Show,
    Refine,
    Click,
    Scroll,
    Reject,
}

/// Abstract input consumed by the navigation controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Show the grid, or drill deeper with the last key when already shown
    Toggle,
    /// Numpad digit, validated by the grid model
    Digit(u8),
    Back,
    Cancel,
    ResetToRoot,
    Commit(PointerAction),
    Scroll(ScrollDirection),
    TogglePause,
}

/// Side effect requested by the controller, dispatched in emission order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ShowOverlay {
        region: Region,
        depth: usize,
        labels: [char; 9],
    },
    UpdateOverlay {
        region: Region,
        depth: usize,
    },
    HideOverlay,
    MovePointer(Point),
    Click(MouseButton),
    Scroll {
        direction: ScrollDirection,
        amount: u32,
    },
    PlaySound(SoundCue),
}

/// Everything the event loop can receive from an input source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Input(InputEvent),
    /// Re-read the configuration file
    Reload,
    Quit,
}

impl From<InputEvent> for Command {
    fn from(event: InputEvent) -> Self {
        Command::Input(event)
    }
}
