//! Admission limiter: N permits per window, callers wait for the next window.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use super::scheduler;
use crate::config::LimiterConfig;
use crate::error::{DocgateError, Result};

/// What `acquire` does once the current window is exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionPolicy {
    /// Wait until a window reset frees a permit
    #[default]
    Block,
    /// Fail immediately with `LimitReached`
    Reject,
}

/// Counter state guarded by the limiter's single lock.
#[derive(Debug, Default)]
pub(super) struct WindowState {
    /// Permits granted since the last reset
    pub(super) consumed: u64,
    /// Set once by `stop`, never cleared
    pub(super) stopped: bool,
}

/// State shared between callers and the window scheduler.
#[derive(Debug, Default)]
pub(super) struct Shared {
    pub(super) state: Mutex<WindowState>,
    /// Condition signalled on every reset and on stop
    pub(super) wakeup: Notify,
}

impl Shared {
    /// Start a new window and wake every waiter.
    ///
    /// Returns the number of permits that were consumed in the closed window,
    /// or `None` once the limiter is stopped, leaving the counter as it was.
    pub(super) fn reset(&self) -> Option<u64> {
        let released = {
            let mut state = self.state.lock();
            if state.stopped {
                return None;
            }
            std::mem::take(&mut state.consumed)
        };
        self.wakeup.notify_waiters();
        Some(released)
    }
}

enum Admission {
    Granted,
    Full,
}

/// Caps outbound calls at `capacity` per `window`.
///
/// A background task owned by the limiter resets the counter every window,
/// starting one full window after construction. Callers hitting the cap are
/// suspended until that reset (or rejected, under [`AdmissionPolicy::Reject`]).
///
/// ```no_run
/// # async fn run() -> docgate::error::Result<()> {
/// use std::time::Duration;
/// use docgate::ratelimit::AdmissionLimiter;
///
/// let limiter = AdmissionLimiter::new(Duration::from_secs(1), 3)?;
/// limiter.acquire().await?;
/// // perform the guarded call
/// limiter.stop();
/// # Ok(())
/// # }
/// ```
pub struct AdmissionLimiter {
    /// Maximum permits per window
    capacity: u64,
    /// Length of each window
    window: Duration,
    policy: AdmissionPolicy,
    shared: Arc<Shared>,
    /// Window scheduler, taken on stop
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for AdmissionLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionLimiter")
            .field("capacity", &self.capacity)
            .field("window", &self.window)
            .field("policy", &self.policy)
            .field("consumed", &self.consumed())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl AdmissionLimiter {
    /// Create a blocking limiter and start its window scheduler.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(window: Duration, capacity: u64) -> Result<Self> {
        Self::with_policy(window, capacity, AdmissionPolicy::Block)
    }

    /// Create a limiter with an explicit admission policy.
    pub fn with_policy(window: Duration, capacity: u64, policy: AdmissionPolicy) -> Result<Self> {
        if capacity == 0 {
            return Err(DocgateError::InvalidConfiguration(
                "capacity must be greater than zero".to_string(),
            ));
        }
        if window.is_zero() {
            return Err(DocgateError::InvalidConfiguration(
                "window duration must be greater than zero".to_string(),
            ));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            DocgateError::InvalidConfiguration(format!("limiter requires a Tokio runtime: {}", e))
        })?;

        let first_reset = Instant::now().checked_add(window).ok_or_else(|| {
            DocgateError::InvalidConfiguration(format!("window duration {:?} is too large", window))
        })?;

        let shared = Arc::new(Shared::default());
        let handle = scheduler::spawn(&runtime, Arc::downgrade(&shared), first_reset, window);

        debug!(
            capacity = capacity,
            window = ?window,
            policy = ?policy,
            "Admission limiter started"
        );

        Ok(Self {
            capacity,
            window,
            policy,
            shared,
            scheduler: Mutex::new(Some(handle)),
        })
    }

    /// Create a limiter from configuration.
    pub fn from_config(config: &LimiterConfig) -> Result<Self> {
        Self::with_policy(
            config.time_unit.duration(),
            config.request_limit,
            config.policy,
        )
    }

    /// Acquire one permit, waiting for the next window if none is left.
    ///
    /// Fails with `Cancelled` if the limiter is or becomes stopped, and with
    /// `LimitReached` under the reject policy. Dropping the returned future
    /// abandons the wait without consuming a permit.
    pub async fn acquire(&self) -> Result<()> {
        loop {
            // Registered before the check so a reset between check and await is not missed.
            let notified = self.shared.wakeup.notified();

            match self.admit()? {
                Admission::Granted => return Ok(()),
                Admission::Full => {
                    trace!(capacity = self.capacity, "Window exhausted, waiting for reset");
                    notified.await;
                }
            }
        }
    }

    /// Acquire one permit unless `signal` resolves first.
    ///
    /// When the signal wins the call fails with `Cancelled` and the counter
    /// is left untouched.
    pub async fn acquire_with_cancel<F>(&self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            result = self.acquire() => result,
            _ = signal => {
                debug!("Permit wait cancelled by caller");
                Err(DocgateError::Cancelled)
            }
        }
    }

    /// Take a permit only if one is free right now.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.shared.state.lock();
        if state.stopped || state.consumed >= self.capacity {
            return false;
        }
        state.consumed += 1;
        true
    }

    fn admit(&self) -> Result<Admission> {
        let mut state = self.shared.state.lock();
        if state.stopped {
            return Err(DocgateError::Cancelled);
        }
        if state.consumed < self.capacity {
            state.consumed += 1;
            return Ok(Admission::Granted);
        }
        match self.policy {
            AdmissionPolicy::Block => Ok(Admission::Full),
            AdmissionPolicy::Reject => {
                debug!(capacity = self.capacity, "Request limit reached, rejecting");
                Err(DocgateError::LimitReached {
                    capacity: self.capacity,
                })
            }
        }
    }

    /// Stop the window scheduler and release every waiter with `Cancelled`.
    ///
    /// Calling this more than once has no further effect.
    pub fn stop(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.stopped {
                return;
            }
            state.stopped = true;
        }

        if let Some(handle) = self.scheduler.lock().take() {
            handle.abort();
        }
        self.shared.wakeup.notify_waiters();

        info!(capacity = self.capacity, window = ?self.window, "Admission limiter stopped");
    }

    /// Whether `stop` has been called.
    pub fn is_stopped(&self) -> bool {
        self.shared.state.lock().stopped
    }

    /// Maximum permits per window.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Length of each window.
    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Permits granted in the current window.
    pub fn consumed(&self) -> u64 {
        self.shared.state.lock().consumed
    }

    /// Permits still free in the current window.
    pub fn available(&self) -> u64 {
        self.capacity.saturating_sub(self.consumed())
    }
}

impl Drop for AdmissionLimiter {
    fn drop(&mut self) {
        self.stop();
    }
}
