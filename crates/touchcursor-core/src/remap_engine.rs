use crate::config::{Configuration, Mapping};
use crate::modifier::{is_modifier_key, ModifierSet};
use crate::timing::{self, TimingVerdict};
use crate::types::{Cue, Decision, KeyCode, KeyEdge, KeyEvent, Notification, Synth};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, trace};

/// Mutable session state. All-empty when idle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineState {
    pub armed_key: Option<KeyCode>,
    pub armed_at: Option<Instant>,
    pub used_for_mapping: bool,
    /// Source key -> mapping whose target is currently held down.
    pub held: BTreeMap<KeyCode, Mapping>,
    pub toggled: bool,
    pub toggled_key: Option<KeyCode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Armed(KeyCode),
    Toggled(KeyCode),
}

/// Result of one event: what to do with it, what to synthesize, what to announce.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub decision: Decision,
    pub synth: Vec<Synth>,
    pub notifications: Vec<Notification>,
}

impl Response {
    fn pass() -> Self {
        Self {
            decision: Decision::PassThrough,
            synth: Vec::new(),
            notifications: Vec::new(),
        }
    }

    fn suppress() -> Self {
        Self {
            decision: Decision::Suppress,
            synth: Vec::new(),
            notifications: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RemapEngine {
    state: EngineState,
    /// Toggle key whose chord fired and which is still physically down.
    /// Tracks the keyboard, not the session, so `reset` leaves it alone.
    toggle_chord_down: Option<KeyCode>,
}

impl RemapEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        match (self.state.toggled, self.state.armed_key) {
            (true, Some(key)) => Phase::Toggled(key),
            (false, Some(key)) => Phase::Armed(key),
            (_, None) => Phase::Idle,
        }
    }

    pub fn reset(&mut self) {
        self.state = EngineState::default();
    }

    /// Key-ups for every held target. Empties the held set, keeps the session.
    pub fn release_held(&mut self) -> Vec<Synth> {
        std::mem::take(&mut self.state.held)
            .into_values()
            .map(|m| Synth::up(m.target))
            .collect()
    }

    pub fn on_event(
        &mut self,
        event: &KeyEvent,
        live: ModifierSet,
        config: &Configuration,
    ) -> Response {
        trace!(
            "on_event key={} edge={:?} live={:?} phase={:?}",
            event.key,
            event.edge,
            live,
            self.phase()
        );

        if self.toggle_chord_down == Some(event.key) {
            // Auto-repeat of the chord, or its release: neither reaches the OS.
            if event.edge.is_up() {
                self.toggle_chord_down = None;
            }
            return Response::suppress();
        }

        if let Some(ms) = config.mod_switch {
            if event.edge.is_down() && ms.matches(event.key, live) {
                let response = self.flip_toggle(event.t, config);
                if response.decision == Decision::Suppress {
                    self.toggle_chord_down = Some(event.key);
                }
                return response;
            }
        }

        if !config.enabled {
            return Response::pass();
        }

        if !self.state.toggled && config.is_activation_key(event.key) {
            if let Some(response) = self.on_activation_key(event) {
                return response;
            }
        }

        self.on_mapped_key(event, live, config)
    }

    fn on_activation_key(&mut self, event: &KeyEvent) -> Option<Response> {
        match (event.edge, self.state.armed_key) {
            (KeyEdge::Down, None) => {
                self.state.armed_key = Some(event.key);
                self.state.armed_at = Some(event.t);
                self.state.used_for_mapping = false;
                debug!("Armed {}", event.key);

                let mut response = Response::suppress();
                response
                    .notifications
                    .push(Notification::ActivationAttempt { key: event.key });
                Some(response)
            }
            // Auto-repeat, or a second activation key while one is held.
            (KeyEdge::Down, Some(_)) => Some(Response::suppress()),
            (KeyEdge::Up, Some(armed)) if armed == event.key => Some(self.disarm(armed)),
            (KeyEdge::Up, _) => None,
        }
    }

    fn disarm(&mut self, key: KeyCode) -> Response {
        let mut response = Response::suppress();
        response.synth = self.release_held();

        if self.state.used_for_mapping {
            response
                .notifications
                .push(Notification::ActivationStateChanged { key, active: false });
        } else {
            // Never used as a modifier: type it.
            response.synth.push(Synth::down(key, ModifierSet::empty()));
            response.synth.push(Synth::up(key));
        }

        debug!("Disarmed {} (used={})", key, self.state.used_for_mapping);
        self.reset();
        response
    }

    fn flip_toggle(&mut self, t: Instant, config: &Configuration) -> Response {
        if self.state.toggled {
            let mut response = Response::suppress();
            response.synth = self.release_held();
            if let Some(key) = self.state.toggled_key {
                response
                    .notifications
                    .push(Notification::ActivationStateChanged { key, active: false });
            }
            response.notifications.push(Notification::Cue(Cue::ToggleOff));
            debug!("Mod-switch off");
            self.reset();
            return response;
        }

        let Some(key) = config.mod_switch_profile() else {
            debug!("Mod-switch pressed with no activation profile configured");
            return Response::pass();
        };

        let mut response = Response::suppress();
        response.synth = self.release_held();
        if let Some(previous) = self.state.armed_key {
            if self.state.used_for_mapping {
                response.notifications.push(Notification::ActivationStateChanged {
                    key: previous,
                    active: false,
                });
            }
        }

        self.state = EngineState {
            armed_key: Some(key),
            armed_at: Some(t),
            used_for_mapping: false,
            held: BTreeMap::new(),
            toggled: true,
            toggled_key: Some(key),
        };
        debug!("Mod-switch on, latched {}", key);

        response.notifications.extend([
            Notification::ActivationAttempt { key },
            Notification::ActivationStateChanged { key, active: true },
            Notification::Cue(Cue::ToggleOn),
        ]);
        response
    }

    fn on_mapped_key(
        &mut self,
        event: &KeyEvent,
        live: ModifierSet,
        config: &Configuration,
    ) -> Response {
        let Some(active) = self.state.armed_key else {
            return Response::pass();
        };
        // Fail open if the armed profile vanished from the snapshot.
        let Some(profile) = config.profile(active) else {
            return Response::pass();
        };
        let mapping = match profile.mapping(event.key) {
            Some(m) if !config.is_activation_key(event.key) => *m,
            _ => {
                let mut response = Response::pass();
                if event.edge.is_down() && config.training_cues() && !is_modifier_key(event.key) {
                    response
                        .notifications
                        .push(Notification::Cue(Cue::UnmappedWhileActive));
                }
                return response;
            }
        };

        match event.edge {
            KeyEdge::Down => {
                if let Some(held) = self.state.held.get(&event.key) {
                    let mut response = Response::suppress();
                    if config.repeat_mapped_keys {
                        response
                            .synth
                            .push(Synth::down(held.target, held.modifiers.difference(live)));
                    }
                    return response;
                }

                // Timing only gates the first engagement of a held activation key.
                if !self.state.toggled && !self.state.used_for_mapping {
                    let elapsed = self
                        .state
                        .armed_at
                        .map(|at| event.t.saturating_duration_since(at))
                        .unwrap_or_default();
                    let verdict = timing::judge(
                        elapsed,
                        config.hold_delay_for(profile),
                        config.rollover_threshold_for(profile),
                        profile.is_rollover_exception(event.key),
                    );
                    if verdict != TimingVerdict::Proceed {
                        debug!(
                            "{:?}: {} after {} in {:?}, typing both",
                            verdict, event.key, active, elapsed
                        );
                        let mut response = Response::pass();
                        response.synth.push(Synth::down(active, ModifierSet::empty()));
                        response.synth.push(Synth::up(active));
                        self.reset();
                        return response;
                    }
                }

                let mut response = Response::suppress();
                if !self.state.used_for_mapping {
                    self.state.used_for_mapping = true;
                    if !self.state.toggled {
                        response.notifications.push(Notification::ActivationStateChanged {
                            key: active,
                            active: true,
                        });
                    }
                }
                if config.training_cues() {
                    response.notifications.push(Notification::Cue(Cue::MappingUsed));
                }

                let effective = mapping.modifiers.difference(live);
                response.synth.push(Synth::down(mapping.target, effective));
                self.state.held.insert(event.key, mapping);
                debug!(
                    "{} -> {} ({:?}) under {}",
                    event.key, mapping.target, effective, active
                );
                response
            }
            KeyEdge::Up => match self.state.held.remove(&event.key) {
                Some(held) => {
                    let mut response = Response::suppress();
                    response.synth.push(Synth::up(held.target));
                    response
                }
                None => Response::pass(),
            },
        }
    }
}
