use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// Why a suspension point was interrupted (spec section 4.4): the caller's
/// own handle, the resolver's process-wide gate, or the per-call timeout.
/// Only the timeout case maps to `ResolveError::Timeout`; the other two map
/// to `ResolveError::Cancelled`.
pub enum CancelCause {
    Caller,
    Gate,
    Timeout,
}

/// The linked cancellation source a single call suspends on (spec section
/// 4.4/5): caller handle, resolver-scoped gate, and an optional deadline.
/// The deadline is computed once, at construction, from the timeout the
/// caller had configured at call time — `cancelled()` is raced at every
/// suspension point (each transport bind/connect/send and every `recv`/read
/// iteration), and re-deriving a fresh `sleep(duration)` there would reset
/// the clock on every iteration, letting a server that dribbles traffic
/// keep the call alive indefinitely. A single deadline bounds the whole
/// call regardless of how many times it suspends.
pub struct Cancellation {
    caller: CancellationToken,
    gate: CancellationToken,
    deadline: Option<Instant>,
}

impl Cancellation {
    pub fn new(caller: CancellationToken, gate: CancellationToken, timeout: Option<Duration>) -> Self {
        Self {
            caller,
            gate,
            deadline: timeout.map(|duration| Instant::now() + duration),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.caller.is_cancelled() || self.gate.is_cancelled()
    }

    /// Resolves once any of the three inputs fires. Never resolves if none
    /// of them ever will (no deadline and neither token cancelled) — callers
    /// race this against the actual I/O future.
    pub async fn cancelled(&self) -> CancelCause {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.caller.cancelled() => CancelCause::Caller,
                    _ = self.gate.cancelled() => CancelCause::Gate,
                    _ = tokio::time::sleep_until(deadline.into()) => CancelCause::Timeout,
                }
            }
            None => {
                tokio::select! {
                    _ = self.caller.cancelled() => CancelCause::Caller,
                    _ = self.gate.cancelled() => CancelCause::Gate,
                }
            }
        }
    }
}

impl From<CancelCause> for crate::error::ResolveError {
    fn from(value: CancelCause) -> Self {
        match value {
            CancelCause::Caller | CancelCause::Gate => Self::Cancelled,
            CancelCause::Timeout => Self::Timeout,
        }
    }
}
