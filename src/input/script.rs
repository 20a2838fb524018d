//! Line-oriented command scripts
//!
//! Scripts replace live keyboard capture: one command per line, `#`
//! starts a comment, blank lines are skipped.
//!
//! ```text
//! toggle
//! 5
//! 5
//! scroll down
//! click
//! cancel
//! ```

use std::io::BufRead;
use std::sync::mpsc::Sender;

use log::{debug, warn};
use thiserror::Error;

use crate::app::state::{Command, InputEvent, PointerAction, ScrollDirection};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("line {line}: unknown command `{text}`")]
    UnknownCommand { line: usize, text: String },
    #[error("line {line}: `{text}` is not a scroll direction")]
    UnknownDirection { line: usize, text: String },
    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),
}

/// Parses one line; `Ok(None)` for blanks and comments
pub fn parse_line(line_number: usize, line: &str) -> Result<Option<Command>, ScriptError> {
    let text = match line.split_once('#') {
        Some((before, _)) => before,
        None => line,
    }
    .trim()
    .to_ascii_lowercase();

    if text.is_empty() {
        return Ok(None);
    }

    let mut words = text.split_whitespace();
    let head = words.next().unwrap_or_default();
    let rest: Vec<&str> = words.collect();

    let unknown = || ScriptError::UnknownCommand {
        line: line_number,
        text: text.clone(),
    };

    let command = match (head, rest.as_slice()) {
        ("toggle", []) => InputEvent::Toggle.into(),
        ("back", []) => InputEvent::Back.into(),
        ("cancel", []) => InputEvent::Cancel.into(),
        ("reset", []) => InputEvent::ResetToRoot.into(),
        ("move", []) => InputEvent::Commit(PointerAction::Move).into(),
        ("click", []) => InputEvent::Commit(PointerAction::LeftClick).into(),
        ("right-click", []) => InputEvent::Commit(PointerAction::RightClick).into(),
        ("pause", []) => InputEvent::TogglePause.into(),
        ("reload", []) => Command::Reload,
        ("quit", []) => Command::Quit,
        ("scroll", [direction]) => {
            let direction =
                ScrollDirection::parse(direction).ok_or_else(|| ScriptError::UnknownDirection {
                    line: line_number,
                    text: (*direction).to_string(),
                })?;
            InputEvent::Scroll(direction).into()
        }
        (digit, []) => match digit.parse::<u8>() {
            Ok(d) if (1..=9).contains(&d) => InputEvent::Digit(d).into(),
            _ => return Err(unknown()),
        },
        _ => return Err(unknown()),
    };

    Ok(Some(command))
}

/// Parses a whole script, failing on the first bad line
pub fn parse_script(source: &str) -> Result<Vec<Command>, ScriptError> {
    let mut commands = Vec::new();
    for (index, line) in source.lines().enumerate() {
        if let Some(command) = parse_line(index + 1, line)? {
            commands.push(command);
        }
    }
    Ok(commands)
}

/// Streams commands from `reader` into `sender` until EOF or `quit`
///
/// Bad lines are logged and skipped so an interactive session survives
/// typos. Returns when the receiver is gone.
pub fn feed<R: BufRead>(reader: R, sender: &Sender<Command>) -> Result<(), ScriptError> {
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        match parse_line(index + 1, &line) {
            Ok(Some(command)) => {
                debug!("Script command: {:?}", command);
                if sender.send(command).is_err() {
                    return Ok(());
                }
                if command == Command::Quit {
                    return Ok(());
                }
            }
            Ok(None) => {}
            Err(e) => warn!("{}", e),
        }
    }
    Ok(())
}
