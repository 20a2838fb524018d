//! Application orchestration layer
//!
//! This module coordinates between input, domain, UI, and platform layers.
//! The controller owns navigation state; the event loop feeds it commands
//! and carries out the effects it returns.

use thiserror::Error;

use crate::config::settings::ConfigError;
use crate::input::{HotkeyError, ScriptError};
use crate::platform::PlatformError;
use crate::ui::{OverlayError, RendererError};

pub mod controller;
pub mod event_loop;
pub mod state;

pub use controller::{NavigationController, NavigationSettings, SoundSettings};
pub use event_loop::EventLoop;

/// Errors that reach the binary
///
/// Navigation itself never fails; these come from start-up and from
/// collaborators carrying out effects.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("hotkey error: {0}")]
    Hotkey(#[from] HotkeyError),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("overlay error: {0}")]
    Overlay(#[from] OverlayError),

    #[error("rendering error: {0}")]
    Renderer(#[from] RendererError),

    #[error("script error: {0}")]
    Script(#[from] ScriptError),

    #[cfg(windows)]
    #[error("keyboard capture error: {0}")]
    KeyboardCapture(#[from] crate::input::KeyboardCaptureError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
