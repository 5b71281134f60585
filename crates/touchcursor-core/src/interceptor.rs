use crate::config::Configuration;
use crate::engine::Engine;
use crate::error::InjectError;
use crate::modifier::{is_modifier_key, ModifierSet};
use crate::types::{Decision, KeyAction, KeyCode, KeyEdge, Notification, Synth};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// Marker carried in the extra-info field of every event we synthesize ("TCUR").
pub const INJECTED_TAG: usize = 0x5443_5552;

const DEFAULT_INJECT_DELAY: Duration = Duration::from_millis(1);

/// A key transition as delivered by the OS hook.
#[derive(Debug, Clone, Copy)]
pub struct RawKeyEvent {
    pub key: KeyCode,
    pub edge: KeyEdge,
    pub tag: usize,
    pub t: Instant,
}

impl RawKeyEvent {
    pub fn genuine(key: KeyCode, edge: KeyEdge, t: Instant) -> Self {
        Self { key, edge, tag: 0, t }
    }
}

/// One event handed to the OS for injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticInput {
    pub key: KeyCode,
    pub edge: KeyEdge,
    pub tag: usize,
}

/// Where synthesized events go. `SendInput` on Windows, a recorder in tests.
pub trait KeySink: Send + Sync {
    fn send(&self, input: SyntheticInput) -> Result<(), InjectError>;
}

/// Open while a burst that presses or releases modifier keys is in flight.
#[derive(Debug, Default)]
pub struct BurstWindow {
    depth: AtomicUsize,
}

impl BurstWindow {
    pub fn open(&self) -> BurstGuard<'_> {
        self.depth.fetch_add(1, Ordering::AcqRel);
        BurstGuard { window: self }
    }

    pub fn is_open(&self) -> bool {
        self.depth.load(Ordering::Acquire) > 0
    }
}

pub struct BurstGuard<'a> {
    window: &'a BurstWindow,
}

impl Drop for BurstGuard<'_> {
    fn drop(&mut self) {
        self.window.depth.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Ordered key transitions for one synthesized event. A down with modifiers
/// becomes a momentary chord: modifier downs, key down, modifier ups reversed.
pub fn expand_chord(key: KeyCode, edge: KeyEdge, modifiers: ModifierSet) -> Vec<(KeyCode, KeyEdge)> {
    if edge.is_up() || modifiers.is_empty() {
        return vec![(key, edge)];
    }

    let chord: Vec<KeyCode> = ModifierSet::PRESS_ORDER
        .iter()
        .filter(|m| modifiers.contains(**m))
        .filter_map(|m| m.inject_key())
        .collect();

    let mut steps = Vec::with_capacity(chord.len() * 2 + 1);
    steps.extend(chord.iter().map(|&m| (m, KeyEdge::Down)));
    steps.push((key, KeyEdge::Down));
    steps.extend(chord.iter().rev().map(|&m| (m, KeyEdge::Up)));
    steps
}

/// Front door for every physical key event. Owns the shared engine and the
/// injection side.
pub struct Interceptor {
    engine: Arc<Mutex<Engine>>,
    sink: Box<dyn KeySink>,
    burst: BurstWindow,
    inject_delay: Duration,
}

impl Interceptor {
    pub fn new(engine: Engine, sink: impl KeySink + 'static) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            sink: Box::new(sink),
            burst: BurstWindow::default(),
            inject_delay: DEFAULT_INJECT_DELAY,
        }
    }

    /// Spacing between consecutive synthesized events. Zero disables it.
    pub fn with_inject_delay(mut self, delay: Duration) -> Self {
        self.inject_delay = delay;
        self
    }

    pub fn engine(&self) -> &Arc<Mutex<Engine>> {
        &self.engine
    }

    pub fn burst(&self) -> &BurstWindow {
        &self.burst
    }

    pub fn on_physical_event(&self, raw: RawKeyEvent) -> Decision {
        if raw.tag == INJECTED_TAG {
            return Decision::PassThrough;
        }

        let action = {
            let mut engine = self.engine.lock();
            engine.track_modifiers(raw.key, raw.edge);

            if self.burst.is_open() && is_modifier_key(raw.key) {
                trace!("Suppressed {} {:?} inside injection burst", raw.key, raw.edge);
                return Decision::Suppress;
            }

            engine.process_key(raw.key, raw.edge, raw.t)
        };

        trace!("{} {:?} -> {:?}", raw.key, raw.edge, action);
        self.perform(&action);
        action.decision()
    }

    pub fn synthesize(&self, key: KeyCode, edge: KeyEdge, modifiers: ModifierSet) {
        self.emit(expand_chord(key, edge, modifiers));
    }

    pub fn configure(&self, config: Configuration) {
        let releases = self.engine.lock().configure(config);
        self.perform_all(&releases);
    }

    pub fn set_enabled(&self, enabled: bool) {
        let releases = self.engine.lock().set_enabled(enabled);
        self.perform_all(&releases);
    }

    pub fn reset(&self) {
        self.engine.lock().reset();
    }

    pub fn release_all(&self) {
        let releases = self.engine.lock().release_all();
        self.perform_all(&releases);
    }

    pub fn subscribe(&self) -> Receiver<Notification> {
        self.engine.lock().subscribe()
    }

    fn perform(&self, action: &KeyAction) {
        self.perform_all(action.synthesized());
    }

    fn perform_all(&self, synth: &[Synth]) {
        if synth.is_empty() {
            return;
        }
        let steps = synth
            .iter()
            .flat_map(|s| expand_chord(s.key, s.edge, s.modifiers))
            .collect();
        self.emit(steps);
    }

    fn emit(&self, steps: Vec<(KeyCode, KeyEdge)>) {
        let _guard = steps
            .iter()
            .any(|(key, _)| is_modifier_key(*key))
            .then(|| self.burst.open());

        for (i, (key, edge)) in steps.into_iter().enumerate() {
            if i > 0 && !self.inject_delay.is_zero() {
                std::thread::sleep(self.inject_delay);
            }
            let input = SyntheticInput {
                key,
                edge,
                tag: INJECTED_TAG,
            };
            if let Err(e) = self.sink.send(input) {
                warn!("{}", e);
            }
        }
    }
}
