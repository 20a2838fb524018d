//! Key chords and the action table
//!
//! Chords are parsed from configuration strings such as `"ctrl+shift+/"`
//! into a modifier mask plus a Win32 virtual-key code. Parsing and
//! resolution are pure so they are tested on every platform; only the
//! hook in `keyboard` feeds real key presses into them.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::app::state::{Command, InputEvent, NavState, PointerAction, ScrollDirection};
use crate::config::settings::HotkeyConfig;

/// Modifier keys for hotkey combinations
///
/// Values match the Win32 `MOD_*` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyModifier {
    Alt = 1,
    Control = 2,
    Shift = 4,
    Windows = 8,
}

impl HotkeyModifier {
    const ALL: [HotkeyModifier; 4] = [
        HotkeyModifier::Control,
        HotkeyModifier::Shift,
        HotkeyModifier::Alt,
        HotkeyModifier::Windows,
    ];

    fn parse(name: &str) -> Option<Self> {
        match name {
            "ctrl" | "control" => Some(Self::Control),
            "shift" => Some(Self::Shift),
            "alt" => Some(Self::Alt),
            "win" | "super" | "meta" => Some(Self::Windows),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Alt => "alt",
            Self::Control => "ctrl",
            Self::Shift => "shift",
            Self::Windows => "win",
        }
    }
}

/// Hotkey parsing and binding errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HotkeyError {
    #[error("empty key chord")]
    EmptyChord,

    #[error("unknown key `{0}`")]
    UnknownKey(String),

    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),

    #[error("`{chord}` is bound to both `{first}` and `{second}`")]
    DuplicateBinding {
        chord: String,
        first: &'static str,
        second: &'static str,
    },
}

/// A key plus the modifiers held with it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    modifiers: u32,
    vk: u32,
}

impl KeyChord {
    pub fn new(modifiers: &[HotkeyModifier], vk: u32) -> Self {
        let modifiers = modifiers.iter().fold(0u32, |acc, &m| acc | m as u32);
        Self { modifiers, vk }
    }

    /// Chord with no modifiers held
    pub fn bare(vk: u32) -> Self {
        Self { modifiers: 0, vk }
    }

    pub fn vk(&self) -> u32 {
        self.vk
    }

    /// Win32 `MOD_*` mask
    pub fn modifier_mask(&self) -> u32 {
        self.modifiers
    }

    pub fn has(&self, modifier: HotkeyModifier) -> bool {
        self.modifiers & modifier as u32 != 0
    }

    pub fn is_bare(&self) -> bool {
        self.modifiers == 0
    }

    /// Numpad digit for top-row `1`-`9` and keypad `num1`-`num9`
    pub fn digit(&self) -> Option<u8> {
        if !self.is_bare() {
            return None;
        }
        match self.vk {
            0x31..=0x39 => u8::try_from(self.vk - 0x30).ok(),
            0x61..=0x69 => u8::try_from(self.vk - 0x60).ok(),
            _ => None,
        }
    }
}

impl FromStr for KeyChord {
    type Err = HotkeyError;

    /// Parses `"ctrl+shift+/"` style chords
    ///
    /// # Example
    /// ```rust
    /// use numgrid::input::hotkeys::{HotkeyModifier, KeyChord};
    ///
    /// let chord: KeyChord = "Ctrl+Shift+/".parse().unwrap();
    /// assert!(chord.has(HotkeyModifier::Control));
    /// assert_eq!(chord.vk(), 0xBF);
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        if lowered.is_empty() {
            return Err(HotkeyError::EmptyChord);
        }

        let mut parts: Vec<&str> = lowered.split('+').map(str::trim).collect();
        let key = parts.pop().ok_or(HotkeyError::EmptyChord)?;
        let vk = key_code(key).ok_or_else(|| HotkeyError::UnknownKey(key.to_string()))?;

        let mut modifiers = Vec::with_capacity(parts.len());
        for part in parts {
            let modifier = HotkeyModifier::parse(part)
                .ok_or_else(|| HotkeyError::UnknownModifier(part.to_string()))?;
            modifiers.push(modifier);
        }

        Ok(Self::new(&modifiers, vk))
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in HotkeyModifier::ALL {
            if self.has(modifier) {
                write!(f, "{}+", modifier.name())?;
            }
        }
        match key_name(self.vk) {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "0x{:02X}", self.vk),
        }
    }
}

const NAMED_KEYS: [(&str, u32); 34] = [
    ("backspace", 0x08),
    ("tab", 0x09),
    ("enter", 0x0D),
    ("return", 0x0D),
    ("esc", 0x1B),
    ("escape", 0x1B),
    ("space", 0x20),
    ("pageup", 0x21),
    ("pagedown", 0x22),
    ("end", 0x23),
    ("home", 0x24),
    ("left", 0x25),
    ("up", 0x26),
    ("right", 0x27),
    ("down", 0x28),
    ("insert", 0x2D),
    ("delete", 0x2E),
    ("del", 0x2E),
    ("multiply", 0x6A),
    ("add", 0x6B),
    ("subtract", 0x6D),
    ("decimal", 0x6E),
    ("divide", 0x6F),
    (";", 0xBA),
    ("=", 0xBB),
    (",", 0xBC),
    ("-", 0xBD),
    (".", 0xBE),
    ("/", 0xBF),
    ("`", 0xC0),
    ("[", 0xDB),
    ("\\", 0xDC),
    ("]", 0xDD),
    ("'", 0xDE),
];

/// Virtual-key code for a lowercase key name
fn key_code(name: &str) -> Option<u32> {
    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        match ch {
            'a'..='z' => return Some(0x41 + (ch as u32 - 'a' as u32)),
            '0'..='9' => return Some(0x30 + (ch as u32 - '0' as u32)),
            _ => {}
        }
    }

    if let Some(n) = name.strip_prefix('f').and_then(|n| n.parse::<u32>().ok()) {
        return (1..=12).contains(&n).then_some(0x70 + n - 1);
    }

    if let Some(n) = name.strip_prefix("num").and_then(|n| n.parse::<u32>().ok()) {
        return (n <= 9).then_some(0x60 + n);
    }

    NAMED_KEYS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|&(_, vk)| vk)
}

fn key_name(vk: u32) -> Option<String> {
    match vk {
        0x41..=0x5A => char::from_u32(vk + 0x20).map(String::from),
        0x30..=0x39 => char::from_u32(vk).map(String::from),
        0x70..=0x7B => Some(format!("f{}", vk - 0x6F)),
        0x60..=0x69 => Some(format!("num{}", vk - 0x60)),
        _ => NAMED_KEYS
            .iter()
            .find(|&&(_, code)| code == vk)
            .map(|(name, _)| (*name).to_string()),
    }
}

/// Action a chord can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundAction {
    Toggle,
    Cancel,
    Back,
    Reset,
    Commit(PointerAction),
    Scroll(ScrollDirection),
    Pause,
    Reload,
    Quit,
}

impl BoundAction {
    /// Whether the chord is captured in `state`
    ///
    /// Toggle, reload and quit are always captured. Pause is captured while
    /// the grid is shown or paused, everything else only while it is shown.
    pub fn captured_in(self, state: NavState) -> bool {
        match self {
            BoundAction::Toggle | BoundAction::Reload | BoundAction::Quit => true,
            BoundAction::Pause => state != NavState::Hidden,
            _ => state == NavState::Visible,
        }
    }

    pub fn command(self) -> Command {
        match self {
            BoundAction::Toggle => InputEvent::Toggle.into(),
            BoundAction::Cancel => InputEvent::Cancel.into(),
            BoundAction::Back => InputEvent::Back.into(),
            BoundAction::Reset => InputEvent::ResetToRoot.into(),
            BoundAction::Commit(action) => InputEvent::Commit(action).into(),
            BoundAction::Scroll(direction) => InputEvent::Scroll(direction).into(),
            BoundAction::Pause => InputEvent::TogglePause.into(),
            BoundAction::Reload => Command::Reload,
            BoundAction::Quit => Command::Quit,
        }
    }
}

/// Chord to action table built from `[hotkeys]`
#[derive(Debug, Clone, Default)]
pub struct KeyBindings {
    bindings: HashMap<KeyChord, (BoundAction, &'static str)>,
}

impl KeyBindings {
    pub fn from_config(config: &HotkeyConfig) -> Result<Self, HotkeyError> {
        let table: [(&'static str, &str, BoundAction); 14] = [
            ("toggle", config.toggle.as_str(), BoundAction::Toggle),
            ("cancel", config.cancel.as_str(), BoundAction::Cancel),
            ("back", config.back.as_str(), BoundAction::Back),
            ("reset", config.reset.as_str(), BoundAction::Reset),
            (
                "move_pointer",
                config.move_pointer.as_str(),
                BoundAction::Commit(PointerAction::Move),
            ),
            (
                "left_click",
                config.left_click.as_str(),
                BoundAction::Commit(PointerAction::LeftClick),
            ),
            (
                "right_click",
                config.right_click.as_str(),
                BoundAction::Commit(PointerAction::RightClick),
            ),
            (
                "scroll_up",
                config.scroll_up.as_str(),
                BoundAction::Scroll(ScrollDirection::Up),
            ),
            (
                "scroll_down",
                config.scroll_down.as_str(),
                BoundAction::Scroll(ScrollDirection::Down),
            ),
            (
                "scroll_left",
                config.scroll_left.as_str(),
                BoundAction::Scroll(ScrollDirection::Left),
            ),
            (
                "scroll_right",
                config.scroll_right.as_str(),
                BoundAction::Scroll(ScrollDirection::Right),
            ),
            ("pause", config.pause.as_str(), BoundAction::Pause),
            ("reload", config.reload.as_str(), BoundAction::Reload),
            ("quit", config.quit.as_str(), BoundAction::Quit),
        ];

        let mut bindings = HashMap::new();
        for (name, chord, action) in table {
            let chord: KeyChord = chord.parse()?;
            if let Some((_, first)) = bindings.insert(chord, (action, name)) {
                return Err(HotkeyError::DuplicateBinding {
                    chord: chord.to_string(),
                    first,
                    second: name,
                });
            }
        }

        debug!("Loaded {} key bindings", bindings.len());
        Ok(Self { bindings })
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Maps a key press to a command
    ///
    /// Explicit bindings win over the digit keys. `None` means the key is
    /// not ours and must reach the focused application.
    pub fn resolve(&self, chord: KeyChord, state: NavState) -> Option<Command> {
        if let Some(&(action, _)) = self.bindings.get(&chord) {
            return action.captured_in(state).then(|| action.command());
        }

        if state == NavState::Visible {
            return chord.digit().map(|d| InputEvent::Digit(d).into());
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord(s: &str) -> KeyChord {
        s.parse().unwrap()
    }

    fn defaults() -> KeyBindings {
        KeyBindings::from_config(&HotkeyConfig::default()).unwrap()
    }

    #[test]
    fn parses_modifiers_and_keys() {
        let c = chord("ctrl+shift+/");
        assert!(c.has(HotkeyModifier::Control));
        assert!(c.has(HotkeyModifier::Shift));
        assert!(!c.has(HotkeyModifier::Alt));
        assert_eq!(c.vk(), 0xBF);
        assert_eq!(c.modifier_mask(), 6);

        assert_eq!(chord("Control + Q"), chord("ctrl+q"));
        assert_eq!(chord("super+a"), KeyChord::new(&[HotkeyModifier::Windows], 0x41));
        assert_eq!(chord("f5").vk(), 0x74);
        assert_eq!(chord("f12").vk(), 0x7B);
        assert_eq!(chord("num7").vk(), 0x67);
        assert_eq!(chord("esc"), chord("escape"));
        assert_eq!(chord(".").vk(), 0xBE);
        assert_eq!(chord("`").vk(), 0xC0);
    }

    #[test]
    fn parse_errors() {
        assert_eq!("".parse::<KeyChord>(), Err(HotkeyError::EmptyChord));
        assert_eq!("   ".parse::<KeyChord>(), Err(HotkeyError::EmptyChord));
        assert_eq!(
            "ctrl+".parse::<KeyChord>(),
            Err(HotkeyError::UnknownKey(String::new()))
        );
        assert_eq!(
            "hyper+a".parse::<KeyChord>(),
            Err(HotkeyError::UnknownModifier("hyper".to_string()))
        );
        assert_eq!(
            "f13".parse::<KeyChord>(),
            Err(HotkeyError::UnknownKey("f13".to_string()))
        );
        assert!("num10".parse::<KeyChord>().is_err());
    }

    #[test]
    fn display_is_canonical() {
        assert_eq!(chord("shift+ctrl+/").to_string(), "ctrl+shift+/");
        assert_eq!(chord("alt+f4").to_string(), "alt+f4");
        assert_eq!(chord("return").to_string(), "enter");
        assert_eq!(chord("num3").to_string(), "num3");
    }

    #[test]
    fn digits_from_top_row_and_keypad() {
        assert_eq!(chord("5").digit(), Some(5));
        assert_eq!(chord("num9").digit(), Some(9));
        assert_eq!(chord("0").digit(), None);
        assert_eq!(chord("num0").digit(), None);
        assert_eq!(chord("ctrl+5").digit(), None);
    }

    #[test]
    fn default_bindings_are_unique() {
        assert_eq!(defaults().len(), 14);
    }

    #[test]
    fn duplicate_binding_is_rejected() {
        let config = HotkeyConfig {
            back: "esc".to_string(),
            ..HotkeyConfig::default()
        };
        assert_eq!(
            KeyBindings::from_config(&config).unwrap_err(),
            HotkeyError::DuplicateBinding {
                chord: "esc".to_string(),
                first: "cancel",
                second: "back",
            }
        );
    }

    #[test]
    fn bad_chord_in_config_is_reported() {
        let config = HotkeyConfig {
            quit: "ctrl+nope".to_string(),
            ..HotkeyConfig::default()
        };
        assert!(matches!(
            KeyBindings::from_config(&config),
            Err(HotkeyError::UnknownKey(_))
        ));
    }

    #[test]
    fn global_actions_resolve_while_hidden() {
        let bindings = defaults();
        assert_eq!(
            bindings.resolve(chord("ctrl+shift+/"), NavState::Hidden),
            Some(Command::Input(InputEvent::Toggle))
        );
        assert_eq!(
            bindings.resolve(chord("ctrl+shift+q"), NavState::Hidden),
            Some(Command::Quit)
        );
        assert_eq!(
            bindings.resolve(chord("ctrl+shift+f5"), NavState::Hidden),
            Some(Command::Reload)
        );
    }

    #[test]
    fn pause_passes_through_until_the_grid_is_held() {
        let bindings = defaults();
        let pause = chord("ctrl+shift+.");
        assert_eq!(bindings.resolve(pause, NavState::Hidden), None);
        for state in [NavState::Visible, NavState::Paused] {
            assert_eq!(
                bindings.resolve(pause, state),
                Some(Command::Input(InputEvent::TogglePause))
            );
        }
    }

    #[test]
    fn only_global_actions_resolve_while_paused() {
        let bindings = defaults();
        assert_eq!(
            bindings.resolve(chord("ctrl+shift+/"), NavState::Paused),
            Some(Command::Input(InputEvent::Toggle))
        );
        assert_eq!(bindings.resolve(chord("esc"), NavState::Paused), None);
        assert_eq!(bindings.resolve(chord("num5"), NavState::Paused), None);
    }

    #[test]
    fn grid_keys_pass_through_while_hidden() {
        let bindings = defaults();
        assert_eq!(bindings.resolve(chord("esc"), NavState::Hidden), None);
        assert_eq!(bindings.resolve(chord("enter"), NavState::Hidden), None);
        assert_eq!(bindings.resolve(chord("5"), NavState::Hidden), None);
        assert_eq!(bindings.resolve(chord("num5"), NavState::Hidden), None);
    }

    #[test]
    fn grid_keys_resolve_while_active() {
        let bindings = defaults();
        assert_eq!(
            bindings.resolve(chord("num5"), NavState::Visible),
            Some(Command::Input(InputEvent::Digit(5)))
        );
        assert_eq!(
            bindings.resolve(chord("3"), NavState::Visible),
            Some(Command::Input(InputEvent::Digit(3)))
        );
        assert_eq!(
            bindings.resolve(chord("shift+enter"), NavState::Visible),
            Some(Command::Input(InputEvent::Commit(PointerAction::RightClick)))
        );
        assert_eq!(
            bindings.resolve(chord("down"), NavState::Visible),
            Some(Command::Input(InputEvent::Scroll(ScrollDirection::Down)))
        );
        assert_eq!(
            bindings.resolve(chord("backspace"), NavState::Visible),
            Some(Command::Input(InputEvent::Back))
        );
        assert_eq!(bindings.resolve(chord("x"), NavState::Visible), None);
    }
}
