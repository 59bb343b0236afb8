use log::{log_enabled, warn, Level};
use std::fmt;
use std::time::{Duration, Instant};

/// Stack entry points that are timed every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreCull,
    PreRender,
    Composite,
    Teardown,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::PreCull => "pre-cull",
            Phase::PreRender => "pre-render",
            Phase::Composite => "composite",
            Phase::Teardown => "teardown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Times one phase of frame `frame`; traces entry and exit.
pub struct PhaseTimer {
    phase: Phase,
    frame: u64,
    start: Instant,
}

impl PhaseTimer {
    pub fn start(phase: Phase, frame: u64) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("frame {frame}: {phase} begin");
        }
        Self {
            phase,
            frame,
            start: Instant::now(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PhaseTimer {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            log::trace!(
                "frame {}: {} done in {} µs",
                self.frame,
                self.phase,
                self.start.elapsed().as_micros()
            );
        }
    }
}

/// Warns when the stack's share of frame `frame` ran past `budget_ms`.
pub fn warn_if_over_budget(frame: u64, spent: Duration, budget_ms: f32) -> bool {
    let spent_ms = spent.as_secs_f32() * 1000.0;
    if spent_ms <= budget_ms {
        return false;
    }
    warn!("frame {frame}: post-processing took {spent_ms:.2} ms of a {budget_ms:.2} ms budget");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_have_stable_labels() {
        assert_eq!(Phase::Composite.to_string(), "composite");
        assert_eq!(PhaseTimer::start(Phase::PreCull, 3).phase(), Phase::PreCull);
    }

    #[test]
    fn budget_check_only_fires_past_the_limit() {
        assert!(!warn_if_over_budget(0, Duration::from_millis(1), 2.0));
        assert!(warn_if_over_budget(0, Duration::from_millis(5), 2.0));
    }
}
