/// Paint-rate gate with a guaranteed trailing call.
///
/// A request inside the `1000 / fps` window is held as the single pending trailing call,
/// replacing whatever was pending before, and is released by [`RateLimiter::poll_trailing`] once
/// the window closes. Intermediate requests are dropped; the last one always runs.
///
/// Admission does not open a window. The caller reports a call that actually ran through
/// [`RateLimiter::commit`], so requests that turn out to be no-ops leave the gate open.
#[derive(Clone, Debug)]
pub struct RateLimiter<T> {
    fps: Option<f64>,
    last_paint_ms: Option<f64>,
    locked: bool,
    pending: Option<Trailing<T>>,
}

#[derive(Clone, Debug)]
struct Trailing<T> {
    due_ms: f64,
    payload: T,
}

impl<T> RateLimiter<T> {
    /// `fps: None` disables gating entirely.
    pub fn new(fps: Option<f64>) -> Self {
        Self {
            fps: fps.filter(|f| f.is_finite() && *f > 0.0),
            last_paint_ms: None,
            locked: true,
            pending: None,
        }
    }

    pub fn interval_ms(&self) -> Option<f64> {
        self.fps.map(|f| 1000.0 / f)
    }

    /// `false` lets every request through until locked again.
    pub fn lock(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// `Some(payload)` when it may run now, `None` when it was deferred.
    pub fn admit(&mut self, payload: T, now_ms: f64) -> Option<T> {
        if !self.locked {
            return Some(payload);
        }
        let Some(interval) = self.interval_ms() else {
            return Some(payload);
        };
        match self.last_paint_ms {
            Some(last) if now_ms - last < interval => {
                self.pending = Some(Trailing {
                    due_ms: last + interval,
                    payload,
                });
                None
            }
            _ => {
                self.pending = None;
                Some(payload)
            }
        }
    }

    /// Release the trailing call once its window has closed.
    pub fn poll_trailing(&mut self, now_ms: f64) -> Option<T> {
        if self.pending.as_ref().is_some_and(|p| now_ms >= p.due_ms) {
            return self.pending.take().map(|p| p.payload);
        }
        None
    }

    /// Start a new window at `now_ms`.
    pub fn commit(&mut self, now_ms: f64) {
        self.last_paint_ms = Some(now_ms);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending trailing call becomes due.
    pub fn next_due_ms(&self) -> Option<f64> {
        self.pending.as_ref().map(|p| p.due_ms)
    }

    pub fn cancel_trailing(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/limiter.rs"]
mod tests;
