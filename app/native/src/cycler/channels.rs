//! Failure channels and state notifications.
//!
//! Failures of unattended cycles (timer ticks, display changes) and of
//! background builds cannot be returned to a caller. They are raised on a
//! [`FailureChannel`] instead: every subscriber sees the error and may mark
//! it handled. A failure nobody handles, including one raised while nobody
//! is subscribed, is escalated.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use super::error::CycleError;
use super::wallpaper::Wallpaper;

/// Verdict of a failure subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureHandling {
    Handled,
    Unhandled,
}

/// Subscriber callback of a failure channel.
pub type FailureHandler = Box<dyn Fn(&CycleError) -> FailureHandling + Send + Sync>;

/// Invoked for failures no subscriber handled.
pub type EscalationHook = Arc<dyn Fn(&'static str, &CycleError) + Send + Sync>;

/// Default escalation: log and abort the process.
///
/// Failures are raised from the timer task and the blocking pool, where a
/// panic would only end that task.
fn escalate_fatally(channel: &'static str, error: &CycleError) {
    tracing::error!(channel, error = %error, "unhandled failure escalated, aborting");
    eprintln!("wallcycle: unhandled {channel} failure: {error}");
    std::process::abort();
}

/// A named channel of failures with "mark handled or escalate" semantics.
pub struct FailureChannel {
    name: &'static str,
    subscribers: RwLock<Vec<FailureHandler>>,
    escalation: RwLock<EscalationHook>,
}

impl FailureChannel {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            subscribers: RwLock::new(Vec::new()),
            escalation: RwLock::new(Arc::new(escalate_fatally) as EscalationHook),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str { self.name }

    /// Adds a subscriber.
    pub fn subscribe<F>(&self, handler: F)
    where
        F: Fn(&CycleError) -> FailureHandling + Send + Sync + 'static,
    {
        self.subscribers.write().push(Box::new(handler));
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize { self.subscribers.read().len() }

    /// Replaces what happens to unhandled failures.
    pub fn set_escalation<F>(&self, hook: F)
    where
        F: Fn(&'static str, &CycleError) + Send + Sync + 'static,
    {
        *self.escalation.write() = Arc::new(hook);
    }

    /// Notifies every subscriber of `error`.
    ///
    /// Returns the handling verdict. When unhandled, the escalation hook has
    /// already run (the default hook aborts the process).
    pub fn raise(&self, error: &CycleError) -> FailureHandling {
        let mut handling = FailureHandling::Unhandled;
        for handler in self.subscribers.read().iter() {
            if handler(error) == FailureHandling::Handled {
                handling = FailureHandling::Handled;
            }
        }

        if handling == FailureHandling::Unhandled {
            let hook = Arc::clone(&*self.escalation.read());
            hook(self.name, error);
        } else {
            tracing::warn!(channel = self.name, error = %error, "failure reported and handled");
        }

        handling
    }
}

impl std::fmt::Debug for FailureChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureChannel")
            .field("name", &self.name)
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

/// State changes broadcast by a cycler.
#[derive(Debug, Clone)]
pub enum CyclerEvent {
    /// The set of wallpapers currently on screen changed.
    ActiveWallpapersChanged(Vec<Wallpaper>),
    /// Autocycling was started or stopped.
    AutocyclingChanged(bool),
    /// A build finished and the desktop shows the image at this path.
    BuildFinished(PathBuf),
    /// A build failed or was cancelled.
    BuildFailed(String),
}

impl CyclerEvent {
    /// Short stable name, used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ActiveWallpapersChanged(_) => "active-wallpapers-changed",
            Self::AutocyclingChanged(_) => "autocycling-changed",
            Self::BuildFinished(_) => "build-finished",
            Self::BuildFailed(_) => "build-failed",
        }
    }
}
