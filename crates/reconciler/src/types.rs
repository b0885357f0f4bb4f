//! Core types for the reconciler.

use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{Error, Result};

/// Instruction returned to the dispatcher after a pass.
///
/// A zero `requeue_after` means the dispatcher should not re-trigger the
/// object on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileResult {
    pub requeue_after: Duration,
}

impl ReconcileResult {
    /// Do not re-trigger.
    #[must_use]
    pub const fn done() -> Self {
        Self {
            requeue_after: Duration::ZERO,
        }
    }

    /// Re-trigger after `delay`.
    #[must_use]
    pub const fn requeue_after(delay: Duration) -> Self {
        Self {
            requeue_after: delay,
        }
    }

    /// Whether a re-trigger was requested.
    #[must_use]
    pub const fn is_requeue(&self) -> bool {
        !self.requeue_after.is_zero()
    }
}

/// Outcome of one reconcile pass.
///
/// Unlike a plain `Result`, a failed pass still carries a requeue delay.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub result: ReconcileResult,
    pub error: Option<Error>,
}

impl Reconciled {
    /// A pass that finished without error and wants no re-trigger.
    #[must_use]
    pub const fn done() -> Self {
        Self {
            result: ReconcileResult::done(),
            error: None,
        }
    }

    /// A pass that finished without error.
    #[must_use]
    pub const fn ok(result: ReconcileResult) -> Self {
        Self {
            result,
            error: None,
        }
    }

    /// A pass that failed.
    #[must_use]
    pub const fn failed(result: ReconcileResult, error: Error) -> Self {
        Self {
            result,
            error: Some(error),
        }
    }

    /// Whether the pass failed.
    #[must_use]
    pub const fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

/// Direction the temperature has to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Drift {
    NeedsHeating,
    NeedsCooling,
    Optimal,
}

impl Drift {
    /// Compare a reading against the target. No tolerance band.
    #[must_use]
    pub fn between(current: i32, ideal: i32) -> Self {
        match current.cmp(&ideal) {
            Ordering::Less => Self::NeedsHeating,
            Ordering::Greater => Self::NeedsCooling,
            Ordering::Equal => Self::Optimal,
        }
    }
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NeedsHeating => write!(f, "heating needed"),
            Self::NeedsCooling => write!(f, "cooling needed"),
            Self::Optimal => write!(f, "optimal"),
        }
    }
}

/// What a successful pass observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub plant: String,
    pub ideal: i32,
    pub current: i32,
}

impl Observation {
    /// Direction the temperature has to move.
    #[must_use]
    pub fn drift(&self) -> Drift {
        Drift::between(self.current, self.ideal)
    }
}

/// Per-object state derived by every pass.
///
/// Every pass recomputes this from scratch; drift can always move an object
/// from `Converged` back to `Adjusting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Convergence {
    /// The pass failed.
    Failed,
    /// The temperature differs from the ideal.
    Adjusting,
    /// The temperature matches the ideal.
    Converged,
}

impl Convergence {
    /// Derive the state from a pass outcome.
    #[must_use]
    pub fn of(observed: std::result::Result<&Observation, &Error>) -> Self {
        match observed {
            Err(_) => Self::Failed,
            Ok(observation) if observation.drift() == Drift::Optimal => Self::Converged,
            Ok(_) => Self::Adjusting,
        }
    }
}

/// Cancellation signal for a pass.
///
/// Passes only look at the signal at collaborator call boundaries; a pass
/// already inside a call runs that call to completion.
#[derive(Clone)]
pub struct ReconcileContext {
    cancel: watch::Receiver<bool>,
}

impl ReconcileContext {
    /// Create a context observing `cancel`.
    #[must_use]
    pub const fn new(cancel: watch::Receiver<bool>) -> Self {
        Self { cancel }
    }

    /// A context that is never cancelled.
    #[must_use]
    pub fn background() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self::new(rx)
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Fail with [`Error::Cancelled`] once cancellation was requested.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the context is cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
