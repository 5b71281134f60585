use crate::config::Configuration;
use crate::modifier::{ModifierSet, ModifierTracker};
use crate::remap_engine::{EngineState, Phase, RemapEngine};
use crate::types::{KeyAction, KeyCode, KeyEdge, KeyEvent, Notification, Synth};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Everything the hook needs under one lock: session state, live modifiers,
/// the configuration snapshot and notification subscribers.
pub struct Engine {
    remap: RemapEngine,
    modifiers: ModifierTracker,
    config: Arc<Configuration>,
    subscribers: Vec<Sender<Notification>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

impl Engine {
    pub fn new(config: Configuration) -> Self {
        Self {
            remap: RemapEngine::new(),
            modifiers: ModifierTracker::new(),
            config: Arc::new(config),
            subscribers: Vec::new(),
        }
    }

    /// Swaps in a new snapshot. In-flight state is dropped; the returned
    /// key-ups release whatever was held under the old one.
    pub fn configure(&mut self, config: Configuration) -> Vec<Synth> {
        info!(
            "Engine: configured with {} activation profile(s), rollover={}ms hold={}ms",
            config.profiles.len(),
            config.rollover_threshold_ms,
            config.hold_delay_ms
        );
        let enabled_changed = config.enabled != self.config.enabled;
        let releases = self.end_session();
        self.config = Arc::new(config);
        if enabled_changed {
            self.announce_enabled();
        }
        releases
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Vec<Synth> {
        if self.config.enabled == enabled {
            return Vec::new();
        }
        Arc::make_mut(&mut self.config).enabled = enabled;
        info!("Engine: remapping {}", if enabled { "enabled" } else { "disabled" });

        let releases = if enabled { Vec::new() } else { self.end_session() };
        self.announce_enabled();
        releases
    }

    fn announce_enabled(&mut self) {
        let enabled = self.config.enabled;
        self.publish([Notification::EnabledChanged { enabled }]);
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> Arc<Configuration> {
        Arc::clone(&self.config)
    }

    pub fn subscribe(&mut self) -> Receiver<Notification> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn track_modifiers(&mut self, key: KeyCode, edge: KeyEdge) {
        self.modifiers.update(key, edge);
    }

    pub fn live_modifiers(&self) -> ModifierSet {
        self.modifiers.current()
    }

    pub fn state(&self) -> &EngineState {
        self.remap.state()
    }

    pub fn phase(&self) -> Phase {
        self.remap.phase()
    }

    /// Runs one genuine event through the state machine. Modifier tracking is
    /// the caller's job and must already include this event.
    pub fn process_key(&mut self, key: KeyCode, edge: KeyEdge, t: Instant) -> KeyAction {
        let event = KeyEvent::new(key, edge, t);
        let live = self.modifiers.current();
        let response = self.remap.on_event(&event, live, &self.config);
        self.publish(response.notifications);
        KeyAction::from_parts(response.decision, response.synth)
    }

    /// Forces the idle state without releasing anything.
    pub fn reset(&mut self) {
        debug!("Engine: reset from {:?}", self.remap.phase());
        self.remap.reset();
    }

    /// Ends the current session and returns key-ups for every held target.
    pub fn release_all(&mut self) -> Vec<Synth> {
        self.end_session()
    }

    fn end_session(&mut self) -> Vec<Synth> {
        let state = self.remap.state();
        let engaged = state.toggled || state.used_for_mapping;
        let key = state.armed_key;

        let releases = self.remap.release_held();
        self.remap.reset();

        if let (Some(key), true) = (key, engaged) {
            self.publish([Notification::ActivationStateChanged { key, active: false }]);
        }
        releases
    }

    fn publish(&mut self, notifications: impl IntoIterator<Item = Notification>) {
        for notification in notifications {
            log_notification(&notification);
            self.subscribers.retain(|tx| tx.send(notification).is_ok());
        }
    }
}

fn log_notification(notification: &Notification) {
    match notification {
        Notification::ActivationAttempt { key } => debug!("notify: attempt {}", key),
        Notification::ActivationStateChanged { key, active } => {
            debug!("notify: {} active={}", key, active)
        }
        Notification::EnabledChanged { enabled } => debug!("notify: enabled={}", enabled),
        Notification::Cue(cue) => debug!("notify: cue {:?}", cue),
    }
}
