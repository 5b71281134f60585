use crate::error::ParseKeyError;
use crate::modifier::ModifierSet;
use crate::types::KeyCode;
use std::collections::HashMap;

impl KeyCode {
    pub const BACK: KeyCode = KeyCode(0x08);
    pub const TAB: KeyCode = KeyCode(0x09);
    pub const RETURN: KeyCode = KeyCode(0x0D);
    pub const SHIFT: KeyCode = KeyCode(0x10);
    pub const CONTROL: KeyCode = KeyCode(0x11);
    pub const MENU: KeyCode = KeyCode(0x12);
    pub const PAUSE: KeyCode = KeyCode(0x13);
    pub const CAPITAL: KeyCode = KeyCode(0x14);
    pub const ESCAPE: KeyCode = KeyCode(0x1B);
    pub const SPACE: KeyCode = KeyCode(0x20);
    pub const PRIOR: KeyCode = KeyCode(0x21);
    pub const NEXT: KeyCode = KeyCode(0x22);
    pub const END: KeyCode = KeyCode(0x23);
    pub const HOME: KeyCode = KeyCode(0x24);
    pub const LEFT: KeyCode = KeyCode(0x25);
    pub const UP: KeyCode = KeyCode(0x26);
    pub const RIGHT: KeyCode = KeyCode(0x27);
    pub const DOWN: KeyCode = KeyCode(0x28);
    pub const INSERT: KeyCode = KeyCode(0x2D);
    pub const DELETE: KeyCode = KeyCode(0x2E);
    pub const A: KeyCode = KeyCode(0x41);
    pub const H: KeyCode = KeyCode(0x48);
    pub const I: KeyCode = KeyCode(0x49);
    pub const J: KeyCode = KeyCode(0x4A);
    pub const K: KeyCode = KeyCode(0x4B);
    pub const L: KeyCode = KeyCode(0x4C);
    pub const M: KeyCode = KeyCode(0x4D);
    pub const N: KeyCode = KeyCode(0x4E);
    pub const O: KeyCode = KeyCode(0x4F);
    pub const P: KeyCode = KeyCode(0x50);
    pub const U: KeyCode = KeyCode(0x55);
    pub const LWIN: KeyCode = KeyCode(0x5B);
    pub const RWIN: KeyCode = KeyCode(0x5C);
    pub const APPS: KeyCode = KeyCode(0x5D);
    pub const NUMLOCK: KeyCode = KeyCode(0x90);
    pub const SCROLL: KeyCode = KeyCode(0x91);
    pub const LSHIFT: KeyCode = KeyCode(0xA0);
    pub const RSHIFT: KeyCode = KeyCode(0xA1);
    pub const LCONTROL: KeyCode = KeyCode(0xA2);
    pub const RCONTROL: KeyCode = KeyCode(0xA3);
    pub const LMENU: KeyCode = KeyCode(0xA4);
    pub const RMENU: KeyCode = KeyCode(0xA5);
    pub const OEM_PERIOD: KeyCode = KeyCode(0xBE);
}

/// Display names for virtual keys. Letters and digits share their VK with ASCII.
const KEY_NAMES: &[(u16, &str)] = &[
    (0x08, "backspace"),
    (0x09, "tab"),
    (0x0D, "enter"),
    (0x10, "shift"),
    (0x11, "ctrl"),
    (0x12, "alt"),
    (0x13, "pause"),
    (0x14, "capslock"),
    (0x1B, "esc"),
    (0x20, "space"),
    (0x21, "pageup"),
    (0x22, "pagedown"),
    (0x23, "end"),
    (0x24, "home"),
    (0x25, "left"),
    (0x26, "up"),
    (0x27, "right"),
    (0x28, "down"),
    (0x2C, "printscreen"),
    (0x2D, "insert"),
    (0x2E, "delete"),
    (0x30, "0"),
    (0x31, "1"),
    (0x32, "2"),
    (0x33, "3"),
    (0x34, "4"),
    (0x35, "5"),
    (0x36, "6"),
    (0x37, "7"),
    (0x38, "8"),
    (0x39, "9"),
    (0x41, "a"),
    (0x42, "b"),
    (0x43, "c"),
    (0x44, "d"),
    (0x45, "e"),
    (0x46, "f"),
    (0x47, "g"),
    (0x48, "h"),
    (0x49, "i"),
    (0x4A, "j"),
    (0x4B, "k"),
    (0x4C, "l"),
    (0x4D, "m"),
    (0x4E, "n"),
    (0x4F, "o"),
    (0x50, "p"),
    (0x51, "q"),
    (0x52, "r"),
    (0x53, "s"),
    (0x54, "t"),
    (0x55, "u"),
    (0x56, "v"),
    (0x57, "w"),
    (0x58, "x"),
    (0x59, "y"),
    (0x5A, "z"),
    (0x5B, "lwin"),
    (0x5C, "rwin"),
    (0x5D, "apps"),
    (0x70, "f1"),
    (0x71, "f2"),
    (0x72, "f3"),
    (0x73, "f4"),
    (0x74, "f5"),
    (0x75, "f6"),
    (0x76, "f7"),
    (0x77, "f8"),
    (0x78, "f9"),
    (0x79, "f10"),
    (0x7A, "f11"),
    (0x7B, "f12"),
    (0x90, "numlock"),
    (0x91, "scrolllock"),
    (0xA0, "lshift"),
    (0xA1, "rshift"),
    (0xA2, "lctrl"),
    (0xA3, "rctrl"),
    (0xA4, "lalt"),
    (0xA5, "ralt"),
    (0xBA, ";"),
    (0xBB, "="),
    (0xBC, ","),
    (0xBD, "-"),
    (0xBE, "."),
    (0xBF, "/"),
    (0xC0, "`"),
    (0xDB, "["),
    (0xDC, "\\"),
    (0xDD, "]"),
    (0xDE, "'"),
];

/// Extra spellings accepted by `key_from_name`.
const KEY_ALIASES: &[(&str, u16)] = &[
    ("bs", 0x08),
    ("return", 0x0D),
    ("control", 0x11),
    ("menu", 0x12),
    ("escape", 0x1B),
    ("pgup", 0x21),
    ("pgdn", 0x22),
    ("ins", 0x2D),
    ("del", 0x2E),
    ("win", 0x5B),
    ("period", 0xBE),
    ("comma", 0xBC),
    ("semicolon", 0xBA),
    ("slash", 0xBF),
];

lazy_static::lazy_static! {
    static ref NAME_TO_KEY: HashMap<&'static str, KeyCode> = {
        let mut map = HashMap::with_capacity(KEY_NAMES.len() + KEY_ALIASES.len());
        for &(vk, name) in KEY_NAMES {
            map.insert(name, KeyCode(vk));
        }
        for &(alias, vk) in KEY_ALIASES {
            map.insert(alias, KeyCode(vk));
        }
        map
    };
}

pub fn key_name(key: KeyCode) -> Option<&'static str> {
    KEY_NAMES
        .iter()
        .find(|(vk, _)| *vk == key.0)
        .map(|(_, name)| *name)
}

/// Case-insensitive lookup. Also accepts `0xNN` hex codes.
pub fn key_from_name(name: &str) -> Option<KeyCode> {
    let name = name.trim();
    if let Some(hex) = name
        .strip_prefix("0x")
        .or_else(|| name.strip_prefix("0X"))
    {
        return u16::from_str_radix(hex, 16).ok().map(KeyCode);
    }
    NAME_TO_KEY.get(name.to_ascii_lowercase().as_str()).copied()
}

/// Keys that must be injected with KEYEVENTF_EXTENDEDKEY so they are not
/// read as their numeric-keypad twins.
pub fn is_extended(key: KeyCode) -> bool {
    matches!(
        key.0,
        0x21..=0x28 // PageUp, PageDown, End, Home, arrows
            | 0x2D // Insert
            | 0x2E // Delete
            | 0x5B..=0x5D // Win keys, Apps
            | 0x90 // NumLock
            | 0xA3 // RCtrl
            | 0xA5 // RAlt
    )
}

fn modifier_from_name(name: &str) -> Option<ModifierSet> {
    match name.to_ascii_lowercase().as_str() {
        "shift" => Some(ModifierSet::SHIFT),
        "ctrl" | "control" => Some(ModifierSet::CTRL),
        "alt" | "menu" => Some(ModifierSet::ALT),
        "win" | "meta" | "super" => Some(ModifierSet::META),
        _ => None,
    }
}

/// Parses `"Ctrl+Left"`, `"Alt+Space"`, `"j"`: any number of modifier names
/// followed by exactly one key.
pub fn parse_chord(text: &str) -> Result<(KeyCode, ModifierSet), ParseKeyError> {
    let parts: Vec<&str> = text.split('+').map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ParseKeyError::Empty(text.to_string()));
    }
    let (last, prefix) = parts
        .split_last()
        .ok_or_else(|| ParseKeyError::Empty(text.to_string()))?;

    let mut modifiers = ModifierSet::empty();
    for part in prefix {
        let flag =
            modifier_from_name(part).ok_or_else(|| ParseKeyError::NotAModifier(part.to_string()))?;
        modifiers |= flag;
    }

    let key = key_from_name(last).ok_or_else(|| ParseKeyError::UnknownKey(last.to_string()))?;
    Ok((key, modifiers))
}
