//! Beep tones for navigation cues

use std::thread;

use log::{debug, warn};
use windows::Win32::System::Diagnostics::Debug::Beep;

use crate::app::state::SoundCue;
use crate::platform::{PlatformError, SoundPlayer};

/// Frequency in Hz and duration in milliseconds for a cue
pub fn tone(cue: SoundCue) -> (u32, u32) {
    match cue {
        SoundCue::Show => (800, 100),
        SoundCue::Refine => (600, 100),
        SoundCue::Click => (1000, 50),
        SoundCue::Scroll => (400, 50),
        SoundCue::Reject => (300, 150),
    }
}

/// Plays cues with `Beep` on a detached thread
///
/// `Beep` blocks for the tone's duration, which must not stall input
/// handling.
#[derive(Debug, Default)]
pub struct BeepPlayer;

impl SoundPlayer for BeepPlayer {
    fn play(&mut self, cue: SoundCue) -> Result<(), PlatformError> {
        let (frequency, duration) = tone(cue);
        debug!("Beep {:?}: {} Hz for {} ms", cue, frequency, duration);

        thread::Builder::new()
            .name("numgrid-beep".to_string())
            .spawn(move || {
                if let Err(e) = unsafe { Beep(frequency, duration) } {
                    warn!("Beep failed: {}", e);
                }
            })
            .map(|_| ())
            .map_err(|e| PlatformError::Sound(e.to_string()))
    }
}
