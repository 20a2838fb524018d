//! Headless collaborators
//!
//! Stand-ins for the Win32 collaborators that log what they would do and
//! record it for inspection. Used by script mode on every platform and by
//! the test suites.

use log::{debug, info};
use tiny_skia::Pixmap;

use crate::app::state::{MouseButton, ScrollDirection, SoundCue};
use crate::domain::core::{Point, Region};
use crate::platform::{MonitorLocator, PlatformError, PointerDriver, SoundPlayer};
use crate::ui::renderer::{GridLayout, GridRenderer, OverlayStyle};
use crate::ui::{OverlayError, OverlaySurface};

/// Most recent entries kept by [`HeadlessPointer`] and [`HeadlessSound`]
pub const HISTORY_LIMIT: usize = 256;

/// Appends `entry`, dropping the oldest one once the history is full
fn record<T>(history: &mut Vec<T>, entry: T) {
    if history.len() >= HISTORY_LIMIT {
        history.remove(0);
    }
    history.push(entry);
}

/// A single monitor with fixed bounds
#[derive(Debug, Clone, Copy)]
pub struct HeadlessMonitor(pub Region);

impl MonitorLocator for HeadlessMonitor {
    fn locate_active_monitor(&self) -> Result<Region, PlatformError> {
        Ok(self.0)
    }
}

/// Input injected through [`HeadlessPointer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Moved(Point),
    Clicked(MouseButton),
    Scrolled(ScrollDirection, u32),
}

/// Pointer that only tracks where it would be
#[derive(Debug, Default)]
pub struct HeadlessPointer {
    position: Option<Point>,
    events: Vec<PointerEvent>,
}

impl HeadlessPointer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last position the pointer was moved to
    pub fn position(&self) -> Option<Point> {
        self.position
    }

    /// Injected input, oldest first, up to [`HISTORY_LIMIT`] entries
    pub fn events(&self) -> &[PointerEvent] {
        &self.events
    }
}

impl PointerDriver for HeadlessPointer {
    fn move_to(&mut self, point: Point) -> Result<(), PlatformError> {
        info!("pointer -> ({}, {})", point.x, point.y);
        self.position = Some(point);
        record(&mut self.events, PointerEvent::Moved(point));
        Ok(())
    }

    fn click(&mut self, button: MouseButton) -> Result<(), PlatformError> {
        info!("{:?} click at {:?}", button, self.position);
        record(&mut self.events, PointerEvent::Clicked(button));
        Ok(())
    }

    fn scroll(&mut self, direction: ScrollDirection, amount: u32) -> Result<(), PlatformError> {
        info!("scroll {:?} x{} at {:?}", direction, amount, self.position);
        record(&mut self.events, PointerEvent::Scrolled(direction, amount));
        Ok(())
    }
}

/// Sound player that logs cues instead of playing them
#[derive(Debug, Default)]
pub struct HeadlessSound {
    played: Vec<SoundCue>,
}

impl HeadlessSound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cues played, oldest first, up to [`HISTORY_LIMIT`] entries
    pub fn played(&self) -> &[SoundCue] {
        &self.played
    }
}

impl SoundPlayer for HeadlessSound {
    fn play(&mut self, cue: SoundCue) -> Result<(), PlatformError> {
        debug!("sound cue {:?}", cue);
        record(&mut self.played, cue);
        Ok(())
    }
}

/// Offscreen overlay
///
/// Every frame is laid out, so a region outside the canvas fails just like
/// it would on screen. Rasterization only happens when a renderer is
/// attached with [`HeadlessOverlay::with_renderer`].
#[derive(Debug)]
pub struct HeadlessOverlay {
    style: OverlayStyle,
    renderer: Option<GridRenderer>,
    canvas: Option<Region>,
    labels: [char; 9],
    current: Option<(Region, usize)>,
    layout: Option<GridLayout>,
    frame: Option<Pixmap>,
    frames: usize,
}

impl HeadlessOverlay {
    pub fn new(style: OverlayStyle) -> Self {
        Self {
            style,
            renderer: None,
            canvas: None,
            labels: [' '; 9],
            current: None,
            layout: None,
            frame: None,
            frames: 0,
        }
    }

    /// Rasterizes every frame with `renderer`
    pub fn with_renderer(mut self, renderer: GridRenderer) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Root region the overlay covers while shown
    pub fn canvas(&self) -> Option<Region> {
        self.canvas
    }

    /// Region and depth of the last drawn frame
    pub fn current(&self) -> Option<(Region, usize)> {
        self.current
    }

    pub fn labels(&self) -> [char; 9] {
        self.labels
    }

    pub fn layout(&self) -> Option<&GridLayout> {
        self.layout.as_ref()
    }

    /// Last rasterized frame, if a renderer is attached
    pub fn frame(&self) -> Option<&Pixmap> {
        self.frame.as_ref()
    }

    /// Number of frames drawn since creation
    pub fn frames(&self) -> usize {
        self.frames
    }

    fn draw(&mut self, canvas: Region, region: Region, depth: usize) -> Result<(), OverlayError> {
        let layout = GridLayout::new(canvas, region, depth, self.labels, &self.style)?;
        if let Some(renderer) = &self.renderer {
            self.frame = Some(renderer.render_layout(&layout)?);
        }
        self.layout = Some(layout);
        self.current = Some((region, depth));
        self.frames += 1;
        debug!("overlay frame {}: {:?} at depth {}", self.frames, region, depth);
        Ok(())
    }
}

impl OverlaySurface for HeadlessOverlay {
    fn show(
        &mut self,
        region: Region,
        depth: usize,
        labels: [char; 9],
    ) -> Result<(), OverlayError> {
        self.labels = labels;
        self.draw(region, region, depth)?;
        self.canvas = Some(region);
        info!("overlay shown over {:?}", region);
        Ok(())
    }

    fn update(&mut self, region: Region, depth: usize) -> Result<(), OverlayError> {
        let canvas = self.canvas.ok_or(OverlayError::NotShown)?;
        self.draw(canvas, region, depth)
    }

    fn hide(&mut self) -> Result<(), OverlayError> {
        if self.canvas.take().is_some() {
            info!("overlay hidden");
        }
        self.current = None;
        self.layout = None;
        self.frame = None;
        Ok(())
    }

    fn is_visible(&self) -> bool {
        self.canvas.is_some()
    }

    fn set_style(&mut self, style: OverlayStyle) {
        self.style = style;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keyboard::NumpadKey;

    fn screen() -> Region {
        Region::new(0, 0, 900, 900).unwrap()
    }

    #[test]
    fn pointer_records_events_in_order() {
        let mut pointer = HeadlessPointer::new();
        pointer.move_to(Point::new(10, 20)).unwrap();
        pointer.click(MouseButton::Right).unwrap();
        pointer.scroll(ScrollDirection::Down, 3).unwrap();

        assert_eq!(pointer.position(), Some(Point::new(10, 20)));
        assert_eq!(
            pointer.events(),
            &[
                PointerEvent::Moved(Point::new(10, 20)),
                PointerEvent::Clicked(MouseButton::Right),
                PointerEvent::Scrolled(ScrollDirection::Down, 3),
            ]
        );
    }

    #[test]
    fn pointer_history_keeps_only_recent_events() {
        let mut pointer = HeadlessPointer::new();
        for x in 0..HISTORY_LIMIT as i32 + 10 {
            pointer.move_to(Point::new(x, 0)).unwrap();
        }
        pointer.click(MouseButton::Left).unwrap();

        let events = pointer.events();
        assert_eq!(events.len(), HISTORY_LIMIT);
        assert_eq!(events[0], PointerEvent::Moved(Point::new(11, 0)));
        assert_eq!(events[HISTORY_LIMIT - 1], PointerEvent::Clicked(MouseButton::Left));
    }

    #[test]
    fn sound_history_keeps_only_recent_cues() {
        let mut sound = HeadlessSound::new();
        for _ in 0..HISTORY_LIMIT {
            sound.play(SoundCue::Refine).unwrap();
        }
        sound.play(SoundCue::Click).unwrap();

        let played = sound.played();
        assert_eq!(played.len(), HISTORY_LIMIT);
        assert_eq!(played.last(), Some(&SoundCue::Click));
        let refines = played.iter().filter(|cue| **cue == SoundCue::Refine).count();
        assert_eq!(refines, HISTORY_LIMIT - 1);
    }

    #[test]
    fn overlay_tracks_visibility_and_frames() {
        let mut overlay = HeadlessOverlay::new(OverlayStyle::default());
        assert!(!overlay.is_visible());

        overlay.show(screen(), 0, NumpadKey::labels()).unwrap();
        assert!(overlay.is_visible());
        assert_eq!(overlay.canvas(), Some(screen()));

        let cell = Region::new(300, 300, 600, 600).unwrap();
        overlay.update(cell, 1).unwrap();
        assert_eq!(overlay.current(), Some((cell, 1)));
        assert_eq!(overlay.frames(), 2);
        assert!(overlay.layout().unwrap().badge.is_some());

        overlay.hide().unwrap();
        assert!(!overlay.is_visible());
        assert_eq!(overlay.current(), None);
    }

    #[test]
    fn update_while_hidden_fails() {
        let mut overlay = HeadlessOverlay::new(OverlayStyle::default());
        let cell = Region::new(0, 0, 100, 100).unwrap();
        assert!(matches!(overlay.update(cell, 1), Err(OverlayError::NotShown)));
    }

    #[test]
    fn update_outside_canvas_fails() {
        let mut overlay = HeadlessOverlay::new(OverlayStyle::default());
        overlay.show(screen(), 0, NumpadKey::labels()).unwrap();

        let outside = Region::new(800, 800, 1100, 1100).unwrap();
        assert!(matches!(
            overlay.update(outside, 1),
            Err(OverlayError::RenderingError(_))
        ));
        assert_eq!(overlay.current(), Some((screen(), 0)));
    }

    #[test]
    fn attached_renderer_produces_canvas_sized_frames() {
        let mut overlay =
            HeadlessOverlay::new(OverlayStyle::default()).with_renderer(GridRenderer::new(None));
        let small = Region::new(0, 0, 90, 60).unwrap();
        overlay.show(small, 0, NumpadKey::labels()).unwrap();

        let frame = overlay.frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (90, 60));
    }
}
