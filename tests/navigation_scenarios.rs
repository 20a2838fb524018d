//! End-to-end navigation through the event loop with headless collaborators

use std::fs;
use std::sync::mpsc;

use numgrid::app::state::{MouseButton, NavState, PointerAction, ScrollDirection, SoundCue};
use numgrid::app::{EventLoop, NavigationController, NavigationSettings};
use numgrid::config::settings::{self, AppConfig};
use numgrid::domain::core::{Point, Region};
use numgrid::input::script::{self, parse_script};
use numgrid::platform::headless::{
    HeadlessMonitor, HeadlessOverlay, HeadlessPointer, HeadlessSound, PointerEvent,
};
use numgrid::ui::{OverlayStyle, OverlaySurface};

type HeadlessLoop = EventLoop<HeadlessMonitor, HeadlessOverlay, HeadlessPointer, HeadlessSound>;

fn screen() -> Region {
    Region::new(0, 0, 900, 900).unwrap()
}

fn region(left: i32, top: i32, right: i32, bottom: i32) -> Region {
    Region::new(left, top, right, bottom).unwrap()
}

/// Runs `source` to completion and returns the loop for inspection
fn replay(source: &str, config: &AppConfig) -> HeadlessLoop {
    let commands = parse_script(source).unwrap();
    let (tx, rx) = mpsc::channel();
    for command in commands {
        tx.send(command).unwrap();
    }
    drop(tx);

    let mut event_loop = EventLoop::new(
        NavigationController::new(NavigationSettings::from_config(config)),
        rx,
        HeadlessMonitor(screen()),
        HeadlessOverlay::new(OverlayStyle::default()),
        HeadlessPointer::new(),
        HeadlessSound::new(),
    );
    event_loop.run();
    event_loop
}

#[test]
fn drill_twice_and_click() {
    let event_loop = replay(
        "toggle\n\
         7   # top-left third\n\
         3\n\
         click\n\
         quit\n",
        &AppConfig::default(),
    );

    assert_eq!(
        event_loop.pointer().events(),
        &[
            PointerEvent::Moved(Point::new(250, 250)),
            PointerEvent::Clicked(MouseButton::Left),
        ]
    );
    assert_eq!(
        event_loop.sound().played(),
        &[
            SoundCue::Show,
            SoundCue::Refine,
            SoundCue::Refine,
            SoundCue::Click
        ]
    );
    assert_eq!(event_loop.controller().grid().depth(), 2);
    assert_eq!(
        event_loop.controller().last_action(),
        Some(PointerAction::LeftClick)
    );
    assert_eq!(
        event_loop.overlay().current(),
        Some((region(200, 200, 300, 300), 2))
    );
}

#[test]
fn pause_and_resume_restore_the_region() {
    let event_loop = replay("toggle\n5\npause\n", &AppConfig::default());
    assert_eq!(event_loop.controller().state(), NavState::Paused);
    assert!(!event_loop.overlay().is_visible());

    let event_loop = replay("toggle\n5\npause\n7\npause\n", &AppConfig::default());
    assert_eq!(event_loop.controller().state(), NavState::Visible);
    // The digit while paused was ignored
    assert_eq!(event_loop.controller().grid().depth(), 1);
    assert_eq!(
        event_loop.overlay().current(),
        Some((region(300, 300, 600, 600), 1))
    );
    assert_eq!(event_loop.overlay().canvas(), Some(screen()));
}

#[test]
fn depth_limit_rejects_further_digits() {
    let mut config = AppConfig::default();
    config.behavior.max_depth = 1;

    let event_loop = replay("toggle\n1\n1\n", &config);
    assert_eq!(event_loop.controller().grid().depth(), 1);
    assert_eq!(
        event_loop.overlay().current(),
        Some((region(0, 600, 300, 900), 1))
    );
    assert_eq!(
        event_loop.sound().played(),
        &[SoundCue::Show, SoundCue::Refine, SoundCue::Reject]
    );
}

#[test]
fn scroll_moves_to_center_first() {
    let mut config = AppConfig::default();
    config.behavior.scroll_amount = 5;

    let event_loop = replay("toggle\n9\nscroll down\n", &config);
    assert_eq!(
        event_loop.pointer().events(),
        &[
            PointerEvent::Moved(Point::new(750, 150)),
            PointerEvent::Scrolled(ScrollDirection::Down, 5),
        ]
    );
}

#[test]
fn back_and_reset_walk_up_the_stack() {
    let event_loop = replay("toggle\n5\n5\nback\n", &AppConfig::default());
    assert_eq!(
        event_loop.overlay().current(),
        Some((region(300, 300, 600, 600), 1))
    );

    let event_loop = replay("toggle\n5\n5\n5\nreset\n", &AppConfig::default());
    assert_eq!(event_loop.controller().grid().depth(), 0);
    assert_eq!(event_loop.overlay().current(), Some((screen(), 0)));
}

#[test]
fn cancel_discards_navigation() {
    let event_loop = replay("toggle\n4\nmove\ncancel\n", &AppConfig::default());
    assert_eq!(event_loop.controller().state(), NavState::Hidden);
    assert!(!event_loop.controller().grid().is_initialized());
    assert_eq!(event_loop.controller().last_action(), None);
    assert_eq!(
        event_loop.pointer().events(),
        &[PointerEvent::Moved(Point::new(150, 450))]
    );
}

#[test]
fn reload_reads_the_config_file_again() {
    let path = std::env::temp_dir().join(format!("numgrid-reload-{}.toml", std::process::id()));
    fs::write(&path, "[behavior]\nmax_depth = 0\n").unwrap();

    let (_tx, rx) = mpsc::channel();
    let loader_path = path.clone();
    let mut event_loop = EventLoop::new(
        NavigationController::new(NavigationSettings::from_config(
            &settings::load_from(&path).unwrap(),
        )),
        rx,
        HeadlessMonitor(screen()),
        HeadlessOverlay::new(OverlayStyle::default()),
        HeadlessPointer::new(),
        HeadlessSound::new(),
    )
    .with_loader(Box::new(move || settings::load_from(&loader_path)));

    for command in parse_script("toggle\n5\n5\n5\n").unwrap() {
        let _ = event_loop.handle_command(command);
    }
    assert_eq!(event_loop.controller().grid().depth(), 3);

    fs::write(&path, "[behavior]\nmax_depth = 2\n").unwrap();
    let _ = event_loop.handle_command(parse_script("reload").unwrap()[0]);
    assert_eq!(event_loop.controller().settings().max_depth, 2);
    assert_eq!(event_loop.controller().grid().depth(), 2);
    assert_eq!(
        event_loop.overlay().current(),
        Some((region(400, 400, 500, 500), 2))
    );

    // A broken file leaves the applied settings alone
    fs::write(&path, "[behavior\n").unwrap();
    let _ = event_loop.handle_command(parse_script("reload").unwrap()[0]);
    assert_eq!(event_loop.controller().settings().max_depth, 2);

    let _ = fs::remove_file(&path);
}

#[test]
fn feed_streams_script_until_quit() {
    let (tx, rx) = mpsc::channel();
    let source = "toggle\nbogus\n2\nquit\n8\n";
    script::feed(source.as_bytes(), &tx).unwrap();
    drop(tx);

    let mut event_loop = EventLoop::new(
        NavigationController::new(NavigationSettings::default()),
        rx,
        HeadlessMonitor(screen()),
        HeadlessOverlay::new(OverlayStyle::default()),
        HeadlessPointer::new(),
        HeadlessSound::new(),
    );
    event_loop.run();

    assert_eq!(
        event_loop.controller().grid().current_region().unwrap(),
        region(300, 600, 600, 900)
    );
}

#[test]
fn bad_script_lines_report_their_line_number() {
    let err = parse_script("toggle\n\nwiggle\n").unwrap_err();
    assert!(err.to_string().starts_with("line 3"));
}
