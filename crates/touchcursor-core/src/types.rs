use crate::modifier::ModifierSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Windows virtual-key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const fn new(vk: u16) -> Self {
        Self(vk)
    }

    pub const fn vk(self) -> u16 {
        self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match crate::keys::key_name(*self) {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEdge {
    Down,
    Up,
}

impl KeyEdge {
    pub fn is_down(self) -> bool {
        matches!(self, KeyEdge::Down)
    }

    pub fn is_up(self) -> bool {
        matches!(self, KeyEdge::Up)
    }
}

/// A genuine key transition as seen by the state machine.
#[derive(Debug, Clone, Copy)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub edge: KeyEdge,
    pub t: Instant,
}

impl KeyEvent {
    pub fn new(key: KeyCode, edge: KeyEdge, t: Instant) -> Self {
        Self { key, edge, t }
    }
}

/// What the OS should do with the physical event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Suppress,
    PassThrough,
}

/// A key transition the engine wants synthesized.
/// `modifiers` are momentary: pressed around a down, never re-asserted on up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Synth {
    pub key: KeyCode,
    pub edge: KeyEdge,
    pub modifiers: ModifierSet,
}

impl Synth {
    pub fn down(key: KeyCode, modifiers: ModifierSet) -> Self {
        Self {
            key,
            edge: KeyEdge::Down,
            modifiers,
        }
    }

    pub fn up(key: KeyCode) -> Self {
        Self {
            key,
            edge: KeyEdge::Up,
            modifiers: ModifierSet::empty(),
        }
    }
}

/// Action to be taken by the hook.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    Pass,
    Block,
    /// Inject a sequence, then block the physical event.
    Inject(Vec<Synth>),
    /// Inject a sequence, then let the physical event through.
    InjectThenPass(Vec<Synth>),
}

impl KeyAction {
    pub fn decision(&self) -> Decision {
        match self {
            KeyAction::Pass | KeyAction::InjectThenPass(_) => Decision::PassThrough,
            KeyAction::Block | KeyAction::Inject(_) => Decision::Suppress,
        }
    }

    pub fn synthesized(&self) -> &[Synth] {
        match self {
            KeyAction::Inject(events) | KeyAction::InjectThenPass(events) => events,
            KeyAction::Pass | KeyAction::Block => &[],
        }
    }

    pub(crate) fn from_parts(decision: Decision, synth: Vec<Synth>) -> Self {
        match (decision, synth.is_empty()) {
            (Decision::PassThrough, true) => KeyAction::Pass,
            (Decision::Suppress, true) => KeyAction::Block,
            (Decision::PassThrough, false) => KeyAction::InjectThenPass(synth),
            (Decision::Suppress, false) => KeyAction::Inject(synth),
        }
    }
}

/// Outbound events for UI collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// Activation key went down; no mapping has fired yet.
    ActivationAttempt { key: KeyCode },
    /// A mapping engaged (`active = true`) or the session ended.
    ActivationStateChanged { key: KeyCode, active: bool },
    /// Remapping was switched on or off.
    EnabledChanged { enabled: bool },
    Cue(Cue),
}

/// Audible feedback requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    ToggleOn,
    ToggleOff,
    /// Training mode: a mapping fired.
    MappingUsed,
    /// Training mode: an unmapped key went down while activation was held.
    UnmappedWhileActive,
}
