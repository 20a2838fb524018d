//! Navigation controller
//!
//! The controller interprets abstract input events against the grid model
//! and returns the effects the rest of the application should perform.
//! It never fails: grid errors degrade to a no-op plus an optional reject
//! cue, and collaborator failures are the event loop's business.

use log::{debug, info, warn};

use crate::app::state::{Effect, InputEvent, NavState, PointerAction, ScrollDirection, SoundCue};
use crate::config::settings::{AppConfig, SoundConfig};
use crate::domain::core::Region;
use crate::domain::grid::{GridError, GridModel};
use crate::domain::keyboard::NumpadKey;
use crate::platform::MonitorLocator;

/// Which sound cues may be emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundSettings {
    pub enabled: bool,
    pub show: bool,
    pub refine: bool,
    pub click: bool,
    pub scroll: bool,
    pub reject: bool,
}

impl SoundSettings {
    pub fn allows(&self, cue: SoundCue) -> bool {
        self.enabled
            && match cue {
                SoundCue::Show => self.show,
                SoundCue::Refine => self.refine,
                SoundCue::Click => self.click,
                SoundCue::Scroll => self.scroll,
                SoundCue::Reject => self.reject,
            }
    }

    /// No cue at all
    pub fn silent() -> Self {
        Self {
            enabled: false,
            show: false,
            refine: false,
            click: false,
            scroll: false,
            reject: false,
        }
    }
}

impl From<&SoundConfig> for SoundSettings {
    fn from(config: &SoundConfig) -> Self {
        Self {
            enabled: config.enabled,
            show: config.show_grid,
            refine: config.refine_selection,
            click: config.click,
            scroll: config.scroll,
            reject: config.reject,
        }
    }
}

/// Controller policies taken from the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationSettings {
    /// 0 = unlimited
    pub max_depth: u32,
    pub min_cell_size: u32,
    pub scroll_amount: u32,
    pub hide_after_commit: bool,
    pub move_on_show: bool,
    pub follow_selection: bool,
    pub sounds: SoundSettings,
}

impl NavigationSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let behavior = &config.behavior;
        Self {
            max_depth: behavior.max_depth,
            min_cell_size: behavior.min_cell_size,
            scroll_amount: behavior.scroll_amount.max(1),
            hide_after_commit: behavior.hide_after_commit,
            move_on_show: behavior.move_on_show,
            follow_selection: behavior.follow_selection,
            sounds: SoundSettings::from(&config.sounds),
        }
    }
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// State machine driving the grid
///
/// One instance lives for the whole process. The grid model is reset on
/// every show instead of being reallocated.
#[derive(Debug)]
pub struct NavigationController {
    state: NavState,
    grid: GridModel,
    settings: NavigationSettings,
    last_action: Option<PointerAction>,
}

impl NavigationController {
    pub fn new(settings: NavigationSettings) -> Self {
        Self {
            state: NavState::Hidden,
            grid: GridModel::new(settings.max_depth, settings.min_cell_size),
            settings,
            last_action: None,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == NavState::Visible
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn settings(&self) -> &NavigationSettings {
        &self.settings
    }

    /// Most recently committed pointer action since the grid was shown
    pub fn last_action(&self) -> Option<PointerAction> {
        self.last_action
    }

    /// Processes one input event
    ///
    /// # Arguments
    /// * `event` - Event to process
    /// * `monitors` - Consulted only when the grid is shown from scratch
    ///
    /// # Returns
    /// Effects to perform, in order
    pub fn handle(&mut self, event: InputEvent, monitors: &dyn MonitorLocator) -> Vec<Effect> {
        let mut effects = Vec::new();

        match (self.state, event) {
            (NavState::Hidden, InputEvent::Toggle) | (NavState::Paused, InputEvent::Toggle) => {
                self.show(monitors, &mut effects);
            }

            (NavState::Visible, InputEvent::Toggle) => {
                self.refine(GridModel::drill_repeat, false, &mut effects);
            }
            (NavState::Visible, InputEvent::Digit(key)) => {
                self.refine(|grid| grid.select(key), true, &mut effects);
            }
            (NavState::Visible, InputEvent::Back) => {
                self.refine(GridModel::back, false, &mut effects);
            }
            (NavState::Visible, InputEvent::ResetToRoot) => {
                self.refine(GridModel::reset_to_root, false, &mut effects);
            }
            (NavState::Visible, InputEvent::Cancel) => {
                effects.push(Effect::HideOverlay);
                self.discard();
            }
            (NavState::Visible, InputEvent::Commit(action)) => {
                self.commit(action, &mut effects);
            }
            (NavState::Visible, InputEvent::Scroll(direction)) => {
                self.scroll(direction, &mut effects);
            }
            (NavState::Visible, InputEvent::TogglePause) => {
                effects.push(Effect::HideOverlay);
                self.state = NavState::Paused;
                info!("Navigation paused at depth {}", self.grid.depth());
            }

            (NavState::Paused, InputEvent::TogglePause) => self.resume(&mut effects),
            (NavState::Paused, InputEvent::Cancel) => {
                self.discard();
            }

            (state, event) => {
                debug!("Ignoring {:?} while {:?}", event, state);
            }
        }

        effects
    }

    /// Applies reloaded settings
    ///
    /// Returns an overlay update when a lowered depth limit moved the
    /// current region.
    pub fn apply_settings(&mut self, settings: NavigationSettings) -> Vec<Effect> {
        let before = self.grid.current_region().ok();
        self.grid.set_limits(settings.max_depth, settings.min_cell_size);
        self.settings = settings;
        info!(
            "Applied settings: max_depth={}, min_cell_size={}, scroll_amount={}",
            settings.max_depth, settings.min_cell_size, settings.scroll_amount
        );

        let mut effects = Vec::new();
        if self.state == NavState::Visible {
            if let Ok(region) = self.grid.current_region() {
                if before != Some(region) {
                    effects.push(Effect::UpdateOverlay {
                        region,
                        depth: self.grid.depth(),
                    });
                }
            }
        }
        effects
    }

    fn show(&mut self, monitors: &dyn MonitorLocator, effects: &mut Vec<Effect>) {
        let root = match monitors.locate_active_monitor() {
            Ok(root) => root,
            Err(e) => {
                warn!("Cannot show grid: {}", e);
                self.discard();
                self.cue(SoundCue::Reject, effects);
                return;
            }
        };

        self.grid.reset(root);
        self.last_action = None;
        self.state = NavState::Visible;
        info!("Showing grid over {:?}", root);

        effects.push(Effect::ShowOverlay {
            region: root,
            depth: 0,
            labels: NumpadKey::labels(),
        });
        if self.settings.move_on_show {
            effects.push(Effect::MovePointer(root.center()));
        }
        self.cue(SoundCue::Show, effects);
    }

    fn resume(&mut self, effects: &mut Vec<Effect>) {
        let (Ok(root), Ok(current)) = (self.grid.root_region(), self.grid.current_region()) else {
            warn!("Paused without a grid, returning to hidden");
            self.discard();
            return;
        };

        self.state = NavState::Visible;
        info!("Navigation resumed at depth {}", self.grid.depth());

        effects.push(Effect::ShowOverlay {
            region: root,
            depth: 0,
            labels: NumpadKey::labels(),
        });
        if current != root {
            effects.push(Effect::UpdateOverlay {
                region: current,
                depth: self.grid.depth(),
            });
        }
        self.cue(SoundCue::Show, effects);
    }

    /// Runs a grid transition and turns its outcome into effects
    ///
    /// `reject_unchanged` marks transitions where an unchanged region means
    /// the input was refused (digit at the depth limit), as opposed to a
    /// benign no-op such as back at the root.
    fn refine<F>(&mut self, transition: F, reject_unchanged: bool, effects: &mut Vec<Effect>)
    where
        F: FnOnce(&mut GridModel) -> Result<Region, GridError>,
    {
        let before = (self.grid.current_region().ok(), self.grid.depth());
        let region = match transition(&mut self.grid) {
            Ok(region) => region,
            Err(e) => {
                debug!("Grid rejected input: {}", e);
                if reject_unchanged {
                    self.cue(SoundCue::Reject, effects);
                }
                return;
            }
        };

        let depth = self.grid.depth();
        if before == (Some(region), depth) {
            debug!("Region unchanged at depth {}", depth);
            if reject_unchanged {
                self.cue(SoundCue::Reject, effects);
            }
            return;
        }

        debug!("Region {:?} at depth {}", region, depth);
        effects.push(Effect::UpdateOverlay { region, depth });
        if self.settings.follow_selection {
            effects.push(Effect::MovePointer(region.center()));
        }
        self.cue(SoundCue::Refine, effects);
    }

    fn commit(&mut self, action: PointerAction, effects: &mut Vec<Effect>) {
        let Ok(region) = self.grid.current_region() else {
            warn!("Commit without a grid region");
            return;
        };

        let center = region.center();
        info!("Committing {:?} at ({}, {})", action, center.x, center.y);
        effects.push(Effect::MovePointer(center));
        if let Some(button) = action.button() {
            effects.push(Effect::Click(button));
            self.cue(SoundCue::Click, effects);
        }
        self.last_action = Some(action);

        if self.settings.hide_after_commit {
            effects.push(Effect::HideOverlay);
            self.state = NavState::Hidden;
            self.grid.clear();
        }
    }

    fn scroll(&mut self, direction: ScrollDirection, effects: &mut Vec<Effect>) {
        let Ok(region) = self.grid.current_region() else {
            warn!("Scroll without a grid region");
            return;
        };

        effects.push(Effect::MovePointer(region.center()));
        effects.push(Effect::Scroll {
            direction,
            amount: self.settings.scroll_amount,
        });
        self.cue(SoundCue::Scroll, effects);
    }

    fn discard(&mut self) {
        self.state = NavState::Hidden;
        self.grid.clear();
        self.last_action = None;
    }

    fn cue(&self, cue: SoundCue, effects: &mut Vec<Effect>) {
        if self.settings.sounds.allows(cue) {
            effects.push(Effect::PlaySound(cue));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::MouseButton;
    use crate::domain::core::Point;
    use crate::platform::PlatformError;

    struct FixedMonitor(Region);

    impl MonitorLocator for FixedMonitor {
        fn locate_active_monitor(&self) -> Result<Region, PlatformError> {
            Ok(self.0)
        }
    }

    struct NoMonitor;

    impl MonitorLocator for NoMonitor {
        fn locate_active_monitor(&self) -> Result<Region, PlatformError> {
            Err(PlatformError::MonitorInfo)
        }
    }

    fn region(left: i32, top: i32, right: i32, bottom: i32) -> Region {
        Region::new(left, top, right, bottom).unwrap()
    }

    fn screen() -> FixedMonitor {
        FixedMonitor(region(0, 0, 1920, 1080))
    }

    fn quiet() -> NavigationSettings {
        NavigationSettings {
            sounds: SoundSettings::silent(),
            ..NavigationSettings::default()
        }
    }

    fn shown(settings: NavigationSettings) -> NavigationController {
        let mut controller = NavigationController::new(settings);
        controller.handle(InputEvent::Toggle, &screen());
        controller
    }

    #[test]
    fn toggle_from_hidden_shows_monitor() {
        let mut controller = NavigationController::new(NavigationSettings::default());
        let effects = controller.handle(InputEvent::Toggle, &screen());

        assert_eq!(
            effects,
            vec![
                Effect::ShowOverlay {
                    region: region(0, 0, 1920, 1080),
                    depth: 0,
                    labels: ['7', '8', '9', '4', '5', '6', '1', '2', '3'],
                },
                Effect::PlaySound(SoundCue::Show),
            ]
        );
        assert!(controller.is_visible());
        assert_eq!(controller.grid().depth(), 0);
    }

    #[test]
    fn events_while_hidden_are_ignored() {
        let mut controller = NavigationController::new(NavigationSettings::default());
        for event in [
            InputEvent::Digit(5),
            InputEvent::Back,
            InputEvent::Cancel,
            InputEvent::ResetToRoot,
            InputEvent::Commit(PointerAction::LeftClick),
            InputEvent::Scroll(ScrollDirection::Up),
            InputEvent::TogglePause,
        ] {
            assert!(controller.handle(event, &screen()).is_empty(), "{event:?}");
            assert_eq!(controller.state(), NavState::Hidden);
        }
        assert!(!controller.grid().is_initialized());
    }

    #[test]
    fn digit_updates_overlay() {
        let mut controller = shown(NavigationSettings::default());
        let effects = controller.handle(InputEvent::Digit(5), &screen());

        assert_eq!(
            effects,
            vec![
                Effect::UpdateOverlay {
                    region: region(640, 360, 1280, 720),
                    depth: 1,
                },
                Effect::PlaySound(SoundCue::Refine),
            ]
        );
    }

    #[test]
    fn invalid_digit_plays_reject_only() {
        let mut controller = shown(NavigationSettings::default());
        let effects = controller.handle(InputEvent::Digit(0), &screen());
        assert_eq!(effects, vec![Effect::PlaySound(SoundCue::Reject)]);
        assert_eq!(controller.grid().depth(), 0);
    }

    #[test]
    fn digit_at_depth_limit_is_rejected() {
        let settings = NavigationSettings {
            max_depth: 2,
            ..NavigationSettings::default()
        };
        let mut controller = shown(settings);
        controller.handle(InputEvent::Digit(1), &screen());
        controller.handle(InputEvent::Digit(3), &screen());
        let at_two = controller.grid().current_region().unwrap();

        let effects = controller.handle(InputEvent::Digit(7), &screen());
        assert_eq!(effects, vec![Effect::PlaySound(SoundCue::Reject)]);
        assert_eq!(controller.grid().depth(), 2);
        assert_eq!(controller.grid().current_region().unwrap(), at_two);
    }

    #[test]
    fn toggle_while_visible_drills_with_last_key() {
        let mut controller = shown(quiet());
        controller.handle(InputEvent::Digit(5), &screen());

        let effects = controller.handle(InputEvent::Toggle, &screen());
        assert_eq!(
            effects,
            vec![Effect::UpdateOverlay {
                region: region(853, 480, 1066, 600),
                depth: 2,
            }]
        );
    }

    #[test]
    fn toggle_at_depth_limit_is_silent_noop() {
        let settings = NavigationSettings {
            max_depth: 1,
            ..NavigationSettings::default()
        };
        let mut controller = shown(settings);
        controller.handle(InputEvent::Digit(5), &screen());

        assert!(controller.handle(InputEvent::Toggle, &screen()).is_empty());
        assert!(controller.handle(InputEvent::Toggle, &screen()).is_empty());
        assert_eq!(controller.grid().depth(), 1);
    }

    #[test]
    fn toggle_without_history_is_noop() {
        let mut controller = shown(NavigationSettings::default());
        assert!(controller.handle(InputEvent::Toggle, &screen()).is_empty());
        assert!(controller.is_visible());
    }

    #[test]
    fn back_at_root_stays_visible() {
        let mut controller = shown(NavigationSettings::default());
        assert!(controller.handle(InputEvent::Back, &screen()).is_empty());
        assert!(controller.is_visible());
        assert_eq!(controller.grid().depth(), 0);
    }

    #[test]
    fn back_returns_to_parent() {
        let mut controller = shown(quiet());
        controller.handle(InputEvent::Digit(5), &screen());
        controller.handle(InputEvent::Digit(9), &screen());

        let effects = controller.handle(InputEvent::Back, &screen());
        assert_eq!(
            effects,
            vec![Effect::UpdateOverlay {
                region: region(640, 360, 1280, 720),
                depth: 1,
            }]
        );
    }

    #[test]
    fn reset_returns_to_root() {
        let mut controller = shown(quiet());
        controller.handle(InputEvent::Digit(7), &screen());
        controller.handle(InputEvent::Digit(7), &screen());

        let effects = controller.handle(InputEvent::ResetToRoot, &screen());
        assert_eq!(
            effects,
            vec![Effect::UpdateOverlay {
                region: region(0, 0, 1920, 1080),
                depth: 0,
            }]
        );
        assert!(controller.handle(InputEvent::ResetToRoot, &screen()).is_empty());
    }

    #[test]
    fn cancel_hides_and_discards_model() {
        let mut controller = shown(NavigationSettings::default());
        controller.handle(InputEvent::Digit(3), &screen());

        let effects = controller.handle(InputEvent::Cancel, &screen());
        assert_eq!(effects, vec![Effect::HideOverlay]);
        assert_eq!(controller.state(), NavState::Hidden);
        assert!(!controller.grid().is_initialized());
    }

    #[test]
    fn show_after_cancel_starts_from_fresh_monitor() {
        let mut controller = shown(quiet());
        controller.handle(InputEvent::Digit(3), &screen());
        controller.handle(InputEvent::Cancel, &screen());

        let other = FixedMonitor(region(1920, 0, 3840, 1080));
        controller.handle(InputEvent::Toggle, &other);
        assert_eq!(controller.grid().depth(), 0);
        assert_eq!(
            controller.grid().current_region().unwrap(),
            region(1920, 0, 3840, 1080)
        );
        // Drill has no stale key to repeat
        assert!(controller.handle(InputEvent::Toggle, &other).is_empty());
    }

    #[test]
    fn commit_moves_then_clicks_at_center() {
        let mut controller = shown(NavigationSettings::default());
        controller.handle(InputEvent::Digit(5), &screen());

        let effects = controller.handle(InputEvent::Commit(PointerAction::LeftClick), &screen());
        assert_eq!(
            effects,
            vec![
                Effect::MovePointer(Point::new(960, 540)),
                Effect::Click(MouseButton::Left),
                Effect::PlaySound(SoundCue::Click),
            ]
        );
        assert!(controller.is_visible());
        assert_eq!(controller.last_action(), Some(PointerAction::LeftClick));

        let effects = controller.handle(InputEvent::Commit(PointerAction::Move), &screen());
        assert_eq!(effects, vec![Effect::MovePointer(Point::new(960, 540))]);

        let effects = controller.handle(InputEvent::Commit(PointerAction::RightClick), &screen());
        assert_eq!(effects[1], Effect::Click(MouseButton::Right));
    }

    #[test]
    fn hide_after_commit_hides_grid() {
        let settings = NavigationSettings {
            hide_after_commit: true,
            ..quiet()
        };
        let mut controller = shown(settings);

        let effects = controller.handle(InputEvent::Commit(PointerAction::Move), &screen());
        assert_eq!(
            effects,
            vec![Effect::MovePointer(Point::new(960, 540)), Effect::HideOverlay]
        );
        assert_eq!(controller.state(), NavState::Hidden);
        assert_eq!(controller.last_action(), Some(PointerAction::Move));
    }

    #[test]
    fn scroll_anchors_at_center_without_changing_grid() {
        let settings = NavigationSettings {
            scroll_amount: 5,
            ..quiet()
        };
        let mut controller = shown(settings);
        controller.handle(InputEvent::Digit(9), &screen());
        let before = controller.grid().clone();

        let effects = controller.handle(InputEvent::Scroll(ScrollDirection::Down), &screen());
        assert_eq!(
            effects,
            vec![
                Effect::MovePointer(region(1280, 0, 1920, 360).center()),
                Effect::Scroll {
                    direction: ScrollDirection::Down,
                    amount: 5,
                },
            ]
        );
        assert_eq!(controller.grid(), &before);
    }

    #[test]
    fn move_on_show_and_follow_selection() {
        let settings = NavigationSettings {
            move_on_show: true,
            follow_selection: true,
            ..quiet()
        };
        let mut controller = NavigationController::new(settings);

        let effects = controller.handle(InputEvent::Toggle, &screen());
        assert_eq!(effects[1], Effect::MovePointer(Point::new(960, 540)));

        let effects = controller.handle(InputEvent::Digit(7), &screen());
        assert_eq!(effects[1], Effect::MovePointer(Point::new(320, 180)));
    }

    #[test]
    fn pause_keeps_model_and_resume_reshows() {
        let mut controller = shown(quiet());
        controller.handle(InputEvent::Digit(5), &screen());

        let effects = controller.handle(InputEvent::TogglePause, &screen());
        assert_eq!(effects, vec![Effect::HideOverlay]);
        assert_eq!(controller.state(), NavState::Paused);
        assert!(controller.handle(InputEvent::Digit(5), &screen()).is_empty());
        assert_eq!(controller.grid().depth(), 1);

        let effects = controller.handle(InputEvent::TogglePause, &screen());
        assert_eq!(
            effects,
            vec![
                Effect::ShowOverlay {
                    region: region(0, 0, 1920, 1080),
                    depth: 0,
                    labels: NumpadKey::labels(),
                },
                Effect::UpdateOverlay {
                    region: region(640, 360, 1280, 720),
                    depth: 1,
                },
            ]
        );
        assert!(controller.is_visible());
    }

    #[test]
    fn cancel_while_paused_hides_without_effects() {
        let mut controller = shown(quiet());
        controller.handle(InputEvent::TogglePause, &screen());

        assert!(controller.handle(InputEvent::Cancel, &screen()).is_empty());
        assert_eq!(controller.state(), NavState::Hidden);
        assert!(!controller.grid().is_initialized());
    }

    #[test]
    fn toggle_while_paused_shows_fresh_grid() {
        let mut controller = shown(quiet());
        controller.handle(InputEvent::Digit(1), &screen());
        controller.handle(InputEvent::TogglePause, &screen());

        controller.handle(InputEvent::Toggle, &screen());
        assert!(controller.is_visible());
        assert_eq!(controller.grid().depth(), 0);
    }

    #[test]
    fn monitor_failure_stays_hidden_with_reject() {
        let mut controller = NavigationController::new(NavigationSettings::default());
        let effects = controller.handle(InputEvent::Toggle, &NoMonitor);
        assert_eq!(effects, vec![Effect::PlaySound(SoundCue::Reject)]);
        assert_eq!(controller.state(), NavState::Hidden);
    }

    #[test]
    fn disabled_cues_are_not_emitted() {
        let mut settings = NavigationSettings::default();
        settings.sounds.refine = false;
        let mut controller = shown(settings);

        let effects = controller.handle(InputEvent::Digit(5), &screen());
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::UpdateOverlay { .. }));

        settings.sounds.enabled = false;
        let mut controller = NavigationController::new(settings);
        let effects = controller.handle(InputEvent::Toggle, &screen());
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn lowering_depth_limit_updates_overlay() {
        let mut controller = shown(quiet());
        for _ in 0..3 {
            controller.handle(InputEvent::Digit(5), &screen());
        }

        let effects = controller.apply_settings(NavigationSettings {
            max_depth: 1,
            ..quiet()
        });
        assert_eq!(
            effects,
            vec![Effect::UpdateOverlay {
                region: region(640, 360, 1280, 720),
                depth: 1,
            }]
        );
        assert!(controller.apply_settings(quiet()).is_empty());
    }
}
