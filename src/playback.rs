//! Duration-bounded automatic progress.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::foundation::core::{clamp01, lerp};

/// How a playback ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Progress reached `to`.
    Completed,
    /// Cancelled by `stop`, a newer `play`, or disposal.
    Stopped,
}

/// Completion signal of one `play` call. Await it or poll [`PlaybackHandle::try_outcome`].
#[derive(Debug)]
pub struct PlaybackHandle {
    rx: oneshot::Receiver<PlaybackOutcome>,
    outcome: Option<PlaybackOutcome>,
}

impl PlaybackHandle {
    fn new(rx: oneshot::Receiver<PlaybackOutcome>) -> Self {
        Self { rx, outcome: None }
    }

    /// Handle that is already resolved.
    pub(crate) fn resolved(outcome: PlaybackOutcome) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(outcome);
        Self::new(rx)
    }

    /// Non-blocking check; `None` while the playback is still running.
    pub fn try_outcome(&mut self) -> Option<PlaybackOutcome> {
        if self.outcome.is_none() {
            self.outcome = match self.rx.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(oneshot::error::TryRecvError::Empty) => None,
                Err(oneshot::error::TryRecvError::Closed) => Some(PlaybackOutcome::Stopped),
            };
        }
        self.outcome
    }
}

impl Future for PlaybackHandle {
    type Output = PlaybackOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.outcome {
            return Poll::Ready(outcome);
        }
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(PlaybackOutcome::Stopped))
    }
}

/// Progress produced by one playback tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackStep {
    pub progress: f64,
    pub finished: bool,
}

#[derive(Debug)]
struct ActivePlayback {
    from: f64,
    to: f64,
    duration_ms: f64,
    started_ms: f64,
    tx: oneshot::Sender<PlaybackOutcome>,
}

/// At most one running playback; starting another stops the first.
#[derive(Debug, Default)]
pub struct PlaybackController {
    active: Option<ActivePlayback>,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(&mut self, from: f64, to: f64, duration_ms: f64, now_ms: f64) -> PlaybackHandle {
        self.stop();
        let (tx, rx) = oneshot::channel();
        tracing::debug!(from, to, duration_ms, "playback started");
        self.active = Some(ActivePlayback {
            from,
            to,
            duration_ms: if duration_ms.is_finite() {
                duration_ms.max(0.0)
            } else {
                0.0
            },
            started_ms: now_ms,
            tx,
        });
        PlaybackHandle::new(rx)
    }

    /// Cancel the running playback. Returns `true` if one was running.
    pub fn stop(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                let _ = active.tx.send(PlaybackOutcome::Stopped);
                tracing::debug!("playback stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    /// Global progress for `now_ms`. The final step resolves the handle with `Completed`.
    pub fn tick(&mut self, now_ms: f64) -> Option<PlaybackStep> {
        let active = self.active.as_ref()?;
        let local = if active.duration_ms <= 0.0 {
            1.0
        } else {
            clamp01((now_ms - active.started_ms) / active.duration_ms)
        };
        let progress = lerp(active.from, active.to, local);
        let finished = local >= 1.0;
        if finished && let Some(done) = self.active.take() {
            let _ = done.tx.send(PlaybackOutcome::Completed);
            tracing::debug!(progress, "playback completed");
        }
        Some(PlaybackStep { progress, finished })
    }
}
