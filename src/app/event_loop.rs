//! Command processing loop
//!
//! Pulls commands off the input channel one at a time, runs them through
//! the navigation controller and performs the resulting effects on the
//! collaborators. A failed effect is logged and skipped; the controller's
//! state is never rolled back.

use std::ops::ControlFlow;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use log::{debug, info, warn};

use crate::app::AppError;
use crate::app::controller::{NavigationController, NavigationSettings};
use crate::app::state::{Command, Effect, NavState, SharedNavState};
use crate::config::settings::{AppConfig, ConfigError};
use crate::platform::{MonitorLocator, PointerDriver, SoundPlayer};
use crate::ui::{OverlayStyle, OverlaySurface};

/// How long to wait for a command before giving collaborators an idle tick
pub const IDLE_INTERVAL: Duration = Duration::from_millis(16);

/// Produces a fresh configuration on `Command::Reload`
pub type ConfigLoader = Box<dyn FnMut() -> Result<AppConfig, ConfigError>>;

/// Owns the controller and every collaborator it drives
pub struct EventLoop<M, O, P, S> {
    controller: NavigationController,
    commands: Receiver<Command>,
    monitors: M,
    overlay: O,
    pointer: P,
    sound: S,
    nav_state: SharedNavState,
    loader: Option<ConfigLoader>,
    idle_interval: Duration,
}

impl<M, O, P, S> EventLoop<M, O, P, S>
where
    M: MonitorLocator,
    O: OverlaySurface,
    P: PointerDriver,
    S: SoundPlayer,
{
    pub fn new(
        controller: NavigationController,
        commands: Receiver<Command>,
        monitors: M,
        overlay: O,
        pointer: P,
        sound: S,
    ) -> Self {
        Self {
            controller,
            commands,
            monitors,
            overlay,
            pointer,
            sound,
            nav_state: SharedNavState::new(),
            loader: None,
            idle_interval: IDLE_INTERVAL,
        }
    }

    /// Sets where `Command::Reload` reads configuration from
    pub fn with_loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Shares an existing state mirror, typically the keyboard hook's
    pub fn with_nav_state(mut self, nav_state: SharedNavState) -> Self {
        nav_state.store(self.controller.state());
        self.nav_state = nav_state;
        self
    }

    /// Mirror of the controller's state, for input sources
    pub fn nav_state(&self) -> SharedNavState {
        self.nav_state.clone()
    }

    pub fn controller(&self) -> &NavigationController {
        &self.controller
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn pointer(&self) -> &P {
        &self.pointer
    }

    pub fn sound(&self) -> &S {
        &self.sound
    }

    /// Processes commands until `Quit` or until every sender is gone
    pub fn run(&mut self) {
        info!("Event loop started");

        loop {
            match self.commands.recv_timeout(self.idle_interval) {
                Ok(command) => {
                    if self.handle_command(command).is_break() {
                        break;
                    }
                    self.overlay.pump();
                }
                Err(RecvTimeoutError::Timeout) => self.overlay.pump(),
                Err(RecvTimeoutError::Disconnected) => {
                    info!("Command channel closed");
                    break;
                }
            }
        }

        self.nav_state.store(NavState::Hidden);
        info!("Event loop stopped");
    }

    /// Handles a single command; `Break` means the loop should stop
    pub fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        debug!("Command: {:?}", command);

        match command {
            Command::Input(event) => {
                let effects = self.controller.handle(event, &self.monitors);
                self.dispatch(effects);
            }
            Command::Reload => self.reload(),
            Command::Quit => {
                info!("Quit requested");
                return ControlFlow::Break(());
            }
        }

        self.nav_state.store(self.controller.state());
        ControlFlow::Continue(())
    }

    fn dispatch(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            if let Err(e) = self.perform(&effect) {
                warn!("Effect {:?} failed: {}", effect, e);
            }
        }
    }

    fn perform(&mut self, effect: &Effect) -> Result<(), AppError> {
        match *effect {
            Effect::ShowOverlay {
                region,
                depth,
                labels,
            } => self.overlay.show(region, depth, labels)?,
            Effect::UpdateOverlay { region, depth } => self.overlay.update(region, depth)?,
            Effect::HideOverlay => self.overlay.hide()?,
            Effect::MovePointer(point) => self.pointer.move_to(point)?,
            Effect::Click(button) => self.pointer.click(button)?,
            Effect::Scroll { direction, amount } => self.pointer.scroll(direction, amount)?,
            Effect::PlaySound(cue) => self.sound.play(cue)?,
        }
        Ok(())
    }

    fn reload(&mut self) {
        let Some(loader) = self.loader.as_mut() else {
            warn!("Reload requested without a configuration source");
            return;
        };

        let config = match loader() {
            Ok(config) => config,
            Err(e) => {
                warn!("Reload failed, keeping current configuration: {}", e);
                return;
            }
        };

        match OverlayStyle::from_config(&config.overlay) {
            Ok(style) => self.overlay.set_style(style),
            Err(e) => warn!("Keeping overlay style: {}", e),
        }

        let effects = self
            .controller
            .apply_settings(NavigationSettings::from_config(&config));
        self.dispatch(effects);
        info!("Configuration reloaded");
    }
}
