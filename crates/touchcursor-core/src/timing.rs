use std::time::Duration;

/// Outcome of judging how soon a mapped key followed the activation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingVerdict {
    /// Engage the mapping.
    Proceed,
    /// Activation key not held long enough; both keys are ordinary typing.
    HoldDelayFallback,
    /// Keys pressed in a fast roll; both keys are ordinary typing.
    RolloverFallback,
}

impl TimingVerdict {
    pub fn is_fallback(self) -> bool {
        !matches!(self, TimingVerdict::Proceed)
    }
}

/// Hold delay is checked first; a key inside the hold delay is never also
/// judged as rollover. A zero threshold disables its check.
pub fn judge(
    elapsed: Duration,
    hold_delay_ms: u32,
    rollover_threshold_ms: u32,
    exception: bool,
) -> TimingVerdict {
    if exception {
        return TimingVerdict::Proceed;
    }
    if hold_delay_ms > 0 && elapsed < Duration::from_millis(hold_delay_ms.into()) {
        return TimingVerdict::HoldDelayFallback;
    }
    if rollover_threshold_ms > 0 && elapsed <= Duration::from_millis(rollover_threshold_ms.into())
    {
        return TimingVerdict::RolloverFallback;
    }
    TimingVerdict::Proceed
}
