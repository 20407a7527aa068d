use crate::foundation::core::lerp;
use crate::schedule::limiter::RateLimiter;

/// Below this distance a converging frame snaps onto its target.
const SNAP_EPSILON: f64 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameState {
    pub current_frame: f64,
    pub target_frame: f64,
    pub lerp_amount: f64,
    pub is_playing: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Converging,
}

/// Current/target frame bookkeeping plus the paint-rate gate.
#[derive(Debug)]
pub struct FrameScheduler {
    state: FrameState,
    phase: SchedulerPhase,
    limiter: RateLimiter<String>,
}

impl FrameScheduler {
    pub fn new(lerp_amount: f64, fps: Option<f64>) -> Self {
        Self {
            state: FrameState {
                current_frame: 0.0,
                target_frame: 0.0,
                lerp_amount: lerp_amount.clamp(f64::MIN_POSITIVE, 1.0),
                is_playing: false,
            },
            phase: SchedulerPhase::Idle,
            limiter: RateLimiter::new(fps),
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.state.is_playing = playing;
    }

    /// Retarget. Returns `true` when `current_frame` moved onto the target right away; otherwise
    /// convergence continues on subsequent [`FrameScheduler::tick`] calls.
    pub fn set_target(&mut self, target: f64) -> bool {
        self.state.target_frame = target;
        let diff = (target - self.state.current_frame).abs();
        if diff <= 1.0 || self.state.lerp_amount >= 1.0 {
            self.state.current_frame = target;
            self.phase = SchedulerPhase::Idle;
            true
        } else {
            self.phase = SchedulerPhase::Converging;
            false
        }
    }

    /// Advance one animation tick. Returns `true` when `current_frame` changed.
    pub fn tick(&mut self) -> bool {
        if self.phase != SchedulerPhase::Converging {
            return false;
        }
        let FrameState {
            current_frame,
            target_frame,
            lerp_amount,
            ..
        } = self.state;
        let mut next = lerp(current_frame, target_frame, lerp_amount);
        if (target_frame - next).abs() < SNAP_EPSILON {
            next = target_frame;
            self.phase = SchedulerPhase::Idle;
        }
        self.state.current_frame = next;
        true
    }

    /// Index to request: `round(current_frame)` clamped into `[0, count - 1]`.
    pub fn frame_index(&self, count: usize) -> Option<usize> {
        if count == 0 {
            return None;
        }
        let idx = self.state.current_frame.round();
        if !idx.is_finite() || idx <= 0.0 {
            return Some(0);
        }
        Some((idx as usize).min(count - 1))
    }

    /// Ask the rate limiter whether `source` may paint now.
    pub fn gate(&mut self, source: String, now_ms: f64) -> Option<String> {
        self.limiter.admit(source, now_ms)
    }

    pub fn poll_trailing(&mut self, now_ms: f64) -> Option<String> {
        self.limiter.poll_trailing(now_ms)
    }

    /// Record a paint that reached the surface; only these open a rate window.
    pub fn commit(&mut self, now_ms: f64) {
        self.limiter.commit(now_ms);
    }

    pub fn lock(&mut self, locked: bool) {
        self.limiter.lock(locked);
    }

    /// `true` while ticks still have work to do.
    pub fn is_busy(&self) -> bool {
        self.phase == SchedulerPhase::Converging || self.limiter.has_pending()
    }

    pub fn cancel_trailing(&mut self) {
        self.limiter.cancel_trailing();
    }

    /// Forget position, e.g. after the active image set changed.
    pub fn reset(&mut self) {
        self.state.current_frame = 0.0;
        self.state.target_frame = 0.0;
        self.phase = SchedulerPhase::Idle;
        self.limiter.cancel_trailing();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/scheduler.rs"]
mod tests;
