use crate::types::{KeyCode, KeyEdge};
use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Shift/Ctrl/Alt/Win chord bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ModifierSet: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

impl Default for ModifierSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl ModifierSet {
    /// Order in which injected modifiers are pressed. Released in reverse.
    pub const PRESS_ORDER: [ModifierSet; 4] = [
        ModifierSet::SHIFT,
        ModifierSet::CTRL,
        ModifierSet::ALT,
        ModifierSet::META,
    ];

    /// Left-hand key used when injecting a single modifier bit.
    pub fn inject_key(self) -> Option<KeyCode> {
        if self == ModifierSet::SHIFT {
            Some(KeyCode::LSHIFT)
        } else if self == ModifierSet::CTRL {
            Some(KeyCode::LCONTROL)
        } else if self == ModifierSet::ALT {
            Some(KeyCode::LMENU)
        } else if self == ModifierSet::META {
            Some(KeyCode::LWIN)
        } else {
            None
        }
    }
}

/// Modifier bit for a physical modifier key, generic or sided.
pub fn modifier_flag(key: KeyCode) -> Option<ModifierSet> {
    match key {
        KeyCode::SHIFT | KeyCode::LSHIFT | KeyCode::RSHIFT => Some(ModifierSet::SHIFT),
        KeyCode::CONTROL | KeyCode::LCONTROL | KeyCode::RCONTROL => Some(ModifierSet::CTRL),
        KeyCode::MENU | KeyCode::LMENU | KeyCode::RMENU => Some(ModifierSet::ALT),
        KeyCode::LWIN | KeyCode::RWIN => Some(ModifierSet::META),
        _ => None,
    }
}

pub fn is_modifier_key(key: KeyCode) -> bool {
    modifier_flag(key).is_some()
}

/// Live modifier mask, fed by every genuine physical event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierTracker {
    live: ModifierSet,
}

impl ModifierTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, key: KeyCode, edge: KeyEdge) {
        let Some(flag) = modifier_flag(key) else {
            return;
        };
        match edge {
            KeyEdge::Down => self.live.insert(flag),
            KeyEdge::Up => self.live.remove(flag),
        }
    }

    pub fn current(&self) -> ModifierSet {
        self.live
    }

    pub fn clear(&mut self) {
        self.live = ModifierSet::empty();
    }
}
