pub mod config;
pub mod engine;
pub mod error;
pub mod interceptor;
#[cfg(windows)]
pub mod keyboard_hook;
pub mod keys;
pub mod modifier;
pub mod remap_engine;
pub mod timing;
pub mod types;

pub use config::{ActivationProfile, Configuration, Mapping, ModSwitch};
pub use engine::Engine;
pub use error::{EngineError, InjectError, ParseKeyError};
pub use interceptor::{Interceptor, KeySink, RawKeyEvent, SyntheticInput, INJECTED_TAG};
pub use keys::parse_chord;
pub use modifier::ModifierSet;
pub use types::{Cue, Decision, KeyAction, KeyCode, KeyEdge, KeyEvent, Notification, Synth};
