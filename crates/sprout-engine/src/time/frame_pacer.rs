use std::time::{Duration, Instant};

/// Timing snapshot of one presentation.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time since the previous presentation, in seconds.
    pub dt: f32,

    /// Monotonic timestamp taken at presentation.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Tracks the frame budget between presentations.
///
/// The baseline is the construction time, so the first frame is due one
/// budget after the pacer is created.
#[derive(Debug, Clone)]
pub struct FramePacer {
    budget: Duration,
    last: Instant,
    frame_index: u64,
}

impl FramePacer {
    pub fn new(budget: Duration) -> Self {
        Self::starting_at(budget, Instant::now())
    }

    pub fn starting_at(budget: Duration, now: Instant) -> Self {
        Self {
            budget,
            last: now,
            frame_index: 0,
        }
    }

    /// Time since the last presentation.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last)
    }

    /// `true` once strictly more than one budget has passed.
    pub fn is_due(&self, now: Instant) -> bool {
        self.elapsed(now) > self.budget
    }

    /// Records a presentation at `now` and restarts the budget.
    pub fn mark(&mut self, now: Instant) -> FrameTime {
        let dt = self.elapsed(now);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUDGET: Duration = Duration::from_millis(16);

    #[test]
    fn first_frame_waits_one_budget() {
        let t0 = Instant::now();
        let pacer = FramePacer::starting_at(BUDGET, t0);
        assert!(!pacer.is_due(t0));
        assert!(!pacer.is_due(t0 + BUDGET));
        assert!(pacer.is_due(t0 + BUDGET + Duration::from_micros(1)));
    }

    #[test]
    fn mark_restarts_the_budget() {
        let t0 = Instant::now();
        let mut pacer = FramePacer::starting_at(BUDGET, t0);
        let t1 = t0 + Duration::from_millis(20);
        let ft = pacer.mark(t1);

        assert_eq!(ft.frame_index, 0);
        assert!((ft.dt - 0.020).abs() < 1e-6);
        assert!(!pacer.is_due(t1 + Duration::from_millis(10)));
        assert_eq!(pacer.mark(t1 + BUDGET * 2).frame_index, 1);
    }

    #[test]
    fn clock_going_backwards_is_not_due() {
        let t0 = Instant::now() + Duration::from_secs(1);
        let pacer = FramePacer::starting_at(BUDGET, t0);
        assert!(!pacer.is_due(Instant::now()));
    }
}
