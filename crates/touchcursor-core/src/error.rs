use crate::types::KeyCode;
use thiserror::Error;

/// Setup failures. Fatal: remapping cannot run without the hook.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to install keyboard hook: {0}")]
    HookInstall(String),
    #[error("keyboard hook is already installed")]
    AlreadyInstalled,
    #[error("hook message loop failed: {0}")]
    MessageLoop(String),
}

/// A single synthetic event was rejected by the OS. Logged and skipped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InjectError {
    #[error("injection of {key} rejected: {reason}")]
    Rejected { key: KeyCode, reason: String },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseKeyError {
    #[error("empty key chord: {0:?}")]
    Empty(String),
    #[error("unknown key name: {0:?}")]
    UnknownKey(String),
    #[error("not a modifier: {0:?}")]
    NotAModifier(String),
}
