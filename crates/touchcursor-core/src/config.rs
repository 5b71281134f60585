use crate::error::ParseKeyError;
use crate::keys::parse_chord;
use crate::modifier::ModifierSet;
use crate::types::KeyCode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

/// Target of a remapped key: a key plus the chord injected around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mapping {
    pub target: KeyCode,
    #[serde(default)]
    pub modifiers: ModifierSet,
}

impl Mapping {
    pub const fn key(target: KeyCode) -> Self {
        Self {
            target,
            modifiers: ModifierSet::empty(),
        }
    }

    pub const fn chord(target: KeyCode, modifiers: ModifierSet) -> Self {
        Self { target, modifiers }
    }
}

impl FromStr for Mapping {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, modifiers) = parse_chord(s)?;
        Ok(Self { target, modifiers })
    }
}

/// Source-to-target mappings bound to one activation key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationProfile {
    pub activation_key: KeyCode,
    pub mappings: HashMap<KeyCode, Mapping>,
    /// Source keys that engage immediately, skipping hold-delay and rollover checks.
    pub rollover_exceptions: HashSet<KeyCode>,
    /// Overrides `Configuration::rollover_threshold_ms` when set.
    pub rollover_threshold_ms: Option<u32>,
    /// Overrides `Configuration::hold_delay_ms` when set.
    pub hold_delay_ms: Option<u32>,
}

impl Default for ActivationProfile {
    fn default() -> Self {
        Self::new(KeyCode::SPACE)
    }
}

impl ActivationProfile {
    pub fn new(activation_key: KeyCode) -> Self {
        Self {
            activation_key,
            mappings: HashMap::new(),
            rollover_exceptions: HashSet::new(),
            rollover_threshold_ms: None,
            hold_delay_ms: None,
        }
    }

    /// Space + I/J/K/L arrows, U/O Home/End, H Left, P Backspace, M Delete,
    /// N and `.` word jumps.
    pub fn classic() -> Self {
        Self::new(KeyCode::SPACE)
            .map(KeyCode::I, Mapping::key(KeyCode::UP))
            .map(KeyCode::J, Mapping::key(KeyCode::LEFT))
            .map(KeyCode::K, Mapping::key(KeyCode::DOWN))
            .map(KeyCode::L, Mapping::key(KeyCode::RIGHT))
            .map(KeyCode::U, Mapping::key(KeyCode::HOME))
            .map(KeyCode::O, Mapping::key(KeyCode::END))
            .map(KeyCode::H, Mapping::key(KeyCode::LEFT))
            .map(KeyCode::P, Mapping::key(KeyCode::BACK))
            .map(KeyCode::M, Mapping::key(KeyCode::DELETE))
            .map(KeyCode::N, Mapping::chord(KeyCode::LEFT, ModifierSet::CTRL))
            .map(
                KeyCode::OEM_PERIOD,
                Mapping::chord(KeyCode::RIGHT, ModifierSet::CTRL),
            )
    }

    pub fn map(mut self, source: KeyCode, mapping: Mapping) -> Self {
        self.mappings.insert(source, mapping);
        self
    }

    pub fn except(mut self, source: KeyCode) -> Self {
        self.rollover_exceptions.insert(source);
        self
    }

    pub fn mapping(&self, source: KeyCode) -> Option<&Mapping> {
        self.mappings.get(&source)
    }

    pub fn is_rollover_exception(&self, source: KeyCode) -> bool {
        self.rollover_exceptions.contains(&source)
    }
}

/// Hotkey that latches an activation profile on without holding its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModSwitch {
    pub key: KeyCode,
    pub modifiers: ModifierSet,
    /// Profile to latch. Falls back to the first configured profile.
    pub profile: Option<KeyCode>,
}

impl Default for ModSwitch {
    fn default() -> Self {
        Self {
            key: KeyCode::SPACE,
            modifiers: ModifierSet::ALT,
            profile: None,
        }
    }
}

impl ModSwitch {
    pub fn matches(&self, key: KeyCode, live: ModifierSet) -> bool {
        key == self.key && live.contains(self.modifiers)
    }
}

/// Read-only snapshot consumed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub enabled: bool,
    pub profiles: BTreeMap<KeyCode, ActivationProfile>,
    #[serde(default = "default_rollover_threshold_ms")]
    pub rollover_threshold_ms: u32,
    pub hold_delay_ms: u32,
    /// `None` disables the toggle hotkey.
    pub mod_switch: Option<ModSwitch>,
    /// Re-synthesize the target down on OS auto-repeat of a held source key.
    pub repeat_mapped_keys: bool,
    pub training_mode: bool,
    pub beep_for_mistakes: bool,
}

fn default_rollover_threshold_ms() -> u32 {
    50
}

impl Default for Configuration {
    fn default() -> Self {
        Self::empty().with_profile(ActivationProfile::classic())
    }
}

impl Configuration {
    /// Defaults without any activation profile.
    pub fn empty() -> Self {
        Self {
            enabled: true,
            profiles: BTreeMap::new(),
            rollover_threshold_ms: default_rollover_threshold_ms(),
            hold_delay_ms: 0,
            mod_switch: Some(ModSwitch::default()),
            repeat_mapped_keys: false,
            training_mode: false,
            beep_for_mistakes: false,
        }
    }

    pub fn with_profile(mut self, profile: ActivationProfile) -> Self {
        self.profiles.insert(profile.activation_key, profile);
        self
    }

    pub fn profile(&self, activation_key: KeyCode) -> Option<&ActivationProfile> {
        self.profiles.get(&activation_key)
    }

    pub fn is_activation_key(&self, key: KeyCode) -> bool {
        self.profiles.contains_key(&key)
    }

    pub fn rollover_threshold_for(&self, profile: &ActivationProfile) -> u32 {
        profile
            .rollover_threshold_ms
            .unwrap_or(self.rollover_threshold_ms)
    }

    pub fn hold_delay_for(&self, profile: &ActivationProfile) -> u32 {
        profile.hold_delay_ms.unwrap_or(self.hold_delay_ms)
    }

    /// Profile latched by the mod-switch hotkey.
    pub fn mod_switch_profile(&self) -> Option<KeyCode> {
        let preferred = self
            .mod_switch
            .and_then(|ms| ms.profile)
            .filter(|key| self.profiles.contains_key(key));
        preferred.or_else(|| self.profiles.keys().next().copied())
    }

    pub(crate) fn training_cues(&self) -> bool {
        self.training_mode && self.beep_for_mistakes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_classic_space_profile() {
        let config = Configuration::default();
        let profile = config.profile(KeyCode::SPACE).expect("space profile");
        assert_eq!(profile.mapping(KeyCode::I), Some(&Mapping::key(KeyCode::UP)));
        assert_eq!(
            profile.mapping(KeyCode::N),
            Some(&Mapping::chord(KeyCode::LEFT, ModifierSet::CTRL))
        );
        assert_eq!(profile.mappings.len(), 11);
        assert_eq!(config.rollover_threshold_ms, 50);
        assert_eq!(config.hold_delay_ms, 0);
        assert_eq!(config.mod_switch, Some(ModSwitch::default()));
    }

    #[test]
    fn test_per_profile_thresholds_override_global() {
        let mut profile = ActivationProfile::new(KeyCode::CAPITAL);
        let config = Configuration::empty();
        assert_eq!(config.rollover_threshold_for(&profile), 50);
        assert_eq!(config.hold_delay_for(&profile), 0);

        profile.rollover_threshold_ms = Some(0);
        profile.hold_delay_ms = Some(120);
        assert_eq!(config.rollover_threshold_for(&profile), 0);
        assert_eq!(config.hold_delay_for(&profile), 120);
    }

    #[test]
    fn test_mod_switch_profile_selection() {
        let mut config = Configuration::empty()
            .with_profile(ActivationProfile::new(KeyCode::SPACE))
            .with_profile(ActivationProfile::new(KeyCode::CAPITAL));
        // Lowest key code first.
        assert_eq!(config.mod_switch_profile(), Some(KeyCode::CAPITAL));

        config.mod_switch = Some(ModSwitch {
            profile: Some(KeyCode::SPACE),
            ..ModSwitch::default()
        });
        assert_eq!(config.mod_switch_profile(), Some(KeyCode::SPACE));

        // Unknown preference falls back instead of latching a missing profile.
        config.mod_switch = Some(ModSwitch {
            profile: Some(KeyCode::TAB),
            ..ModSwitch::default()
        });
        assert_eq!(config.mod_switch_profile(), Some(KeyCode::CAPITAL));

        assert_eq!(Configuration::empty().mod_switch_profile(), None);
    }

    #[test]
    fn test_mod_switch_requires_all_modifiers() {
        let ms = ModSwitch {
            key: KeyCode::SPACE,
            modifiers: ModifierSet::ALT | ModifierSet::CTRL,
            profile: None,
        };
        assert!(!ms.matches(KeyCode::SPACE, ModifierSet::ALT));
        assert!(ms.matches(
            KeyCode::SPACE,
            ModifierSet::ALT | ModifierSet::CTRL | ModifierSet::SHIFT
        ));
        assert!(!ms.matches(KeyCode::J, ModifierSet::ALT | ModifierSet::CTRL));
    }

    #[test]
    fn test_mapping_from_str() {
        let m: Mapping = "Ctrl+Right".parse().expect("parse");
        assert_eq!(m, Mapping::chord(KeyCode::RIGHT, ModifierSet::CTRL));
        assert!("Hyper+Right".parse::<Mapping>().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "hold_delay_ms": 120, "training_mode": true }"#;
        let config: Configuration = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.hold_delay_ms, 120);
        assert_eq!(config.rollover_threshold_ms, 50);
        assert!(config.enabled);
        assert!(config.training_mode);
        assert!(config.is_activation_key(KeyCode::SPACE));
    }

    #[test]
    fn test_json_roundtrip_keeps_profiles() {
        let config = Configuration::default();
        let json = serde_json::to_string(&config).expect("serialize");
        let back: Configuration = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, config);
    }
}
