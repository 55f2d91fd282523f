use std::time::Duration;

/// What the render thread does when there is neither a job nor a due frame.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum IdleStrategy {
    /// Yield the time slice and check again.
    #[default]
    Spin,
    /// Sleep for the sampling interval.
    Sleep,
}

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum time between natural presentations.
    pub frame_budget: Duration,
    /// Idle sleep under [`IdleStrategy::Sleep`]: one budget split into
    /// `sampling` checks.
    pub sampling_interval: Duration,
    /// Present after this many consecutive jobs regardless of the budget.
    pub forced_present_after: u32,
    pub idle: IdleStrategy,
}

impl SchedulerConfig {
    /// Default forced-presentation threshold.
    pub const FORCED_PRESENT_AFTER: u32 = 500;

    /// Budget of `1s / fps`, sampling interval of `1s / (sampling * fps)`.
    ///
    /// Zero values are treated as 1.
    pub fn from_rate(fps: u32, sampling: u32) -> Self {
        let fps = u64::from(fps.max(1));
        let sampling = u64::from(sampling.max(1));
        Self {
            frame_budget: Duration::from_nanos(1_000_000_000 / fps),
            sampling_interval: Duration::from_nanos(1_000_000_000 / (sampling * fps)),
            forced_present_after: Self::FORCED_PRESENT_AFTER,
            idle: IdleStrategy::Spin,
        }
    }

    pub fn with_forced_present_after(mut self, jobs: u32) -> Self {
        self.forced_present_after = jobs.max(1);
        self
    }

    pub fn with_idle(mut self, idle: IdleStrategy) -> Self {
        self.idle = idle;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_rate(60, 5)
    }
}
