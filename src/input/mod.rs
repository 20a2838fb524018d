//! Input sources feeding the event loop
//!
//! Chord parsing and the script reader work everywhere; the global
//! keyboard hook is Windows only.

pub mod hotkeys;
#[cfg(windows)]
pub mod keyboard;
pub mod script;

pub use hotkeys::{BoundAction, HotkeyError, HotkeyModifier, KeyBindings, KeyChord};
#[cfg(windows)]
pub use keyboard::{KeyboardCaptureError, KeyboardHook};
pub use script::ScriptError;
