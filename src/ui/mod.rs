//! Grid overlay presentation
//!
//! `renderer` turns a navigation region into pixels on every platform.
//! `overlay` puts those pixels on screen in a click-through Win32 window.

use crate::domain::core::Region;

#[cfg(windows)]
pub mod overlay;
pub mod renderer;

#[cfg(windows)]
pub use overlay::LayeredOverlay;
pub use renderer::{GridLayout, GridRenderer, OverlayStyle, RendererError};

/// Overlay management errors
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Failed to register overlay window class")]
    WindowClassRegistrationFailed,

    #[error("Failed to create overlay window")]
    WindowCreationFailed,

    #[error("Failed to acquire screen device context")]
    DeviceContextFailed,

    #[error("Failed to create memory device context")]
    MemoryDeviceContextFailed,

    #[error("Failed to create DIB section for overlay frame")]
    DibSectionCreationFailed,

    #[error("Failed to select bitmap into memory DC")]
    BitmapSelectionFailed,

    #[error("Failed to update layered window surface")]
    LayerUpdateFailed,

    /// Update requested before the overlay was shown
    #[error("Overlay is not shown")]
    NotShown,

    #[error("Rendering failed: {0}")]
    RenderingError(#[from] RendererError),
}

/// Draws and hides the navigation grid
pub trait OverlaySurface {
    /// Shows the grid over `region`, which becomes the overlay's canvas
    fn show(&mut self, region: Region, depth: usize, labels: [char; 9]) -> Result<(), OverlayError>;

    /// Redraws the grid for a region inside the current canvas
    fn update(&mut self, region: Region, depth: usize) -> Result<(), OverlayError>;

    fn hide(&mut self) -> Result<(), OverlayError>;

    fn is_visible(&self) -> bool;

    /// Replaces colors and sizes; takes effect on the next frame
    fn set_style(&mut self, style: OverlayStyle);

    /// Called by the event loop when no command is pending
    fn pump(&mut self) {}
}
