//! Autocycle timer actor.
//!
//! The timer runs as a task on the cycler's runtime and is driven through an
//! [`AutocycleTimer`] handle. Messages are fire-and-forget so they can be sent
//! from synchronous code, including from inside a tick.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};

/// Called on every tick. Returning `false` stops the actor for good.
pub type TickFn = Box<dyn Fn() -> bool + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerMessage {
    /// Start ticking every `Duration`, or change the period if running.
    Start(Duration),
    Stop,
    /// Restart the countdown from now, keeping the period.
    Reset,
    Shutdown,
}

/// Handle to the timer actor.
#[derive(Debug, Clone)]
pub struct AutocycleTimer {
    sender: mpsc::UnboundedSender<TimerMessage>,
}

impl AutocycleTimer {
    /// Spawns the actor on `runtime`. It starts stopped.
    pub fn spawn(runtime: &Handle, on_tick: TickFn) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        runtime.spawn(run(receiver, on_tick));
        Self { sender }
    }

    pub fn start(&self, period: Duration) { self.send(TimerMessage::Start(period)); }

    pub fn stop(&self) { self.send(TimerMessage::Stop); }

    pub fn reset(&self) { self.send(TimerMessage::Reset); }

    pub fn shutdown(&self) { self.send(TimerMessage::Shutdown); }

    fn send(&self, message: TimerMessage) {
        if self.sender.send(message).is_err() {
            tracing::debug!(?message, "autocycle timer is no longer running");
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn run(mut receiver: mpsc::UnboundedReceiver<TimerMessage>, on_tick: TickFn) {
    let mut period = Duration::ZERO;
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            message = receiver.recv() => match message {
                Some(TimerMessage::Start(new_period)) => {
                    period = new_period;
                    deadline = Some(Instant::now() + period);
                }
                Some(TimerMessage::Stop) => deadline = None,
                Some(TimerMessage::Reset) => {
                    if deadline.is_some() {
                        deadline = Some(Instant::now() + period);
                    }
                }
                Some(TimerMessage::Shutdown) | None => break,
            },
            () = wait_until(deadline) => {
                // Scheduled before the tick so a reset sent from inside the
                // tick wins.
                deadline = Some(Instant::now() + period);
                if !on_tick() {
                    break;
                }
            }
        }
    }

    tracing::debug!("autocycle timer stopped");
}
