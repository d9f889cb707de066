//! Estimated upload progress reconciled with the real completion signal.
//!
//! The estimate is driven only by elapsed time; completion comes from the
//! network. `complete` cancels the estimate and pins the indicator at 100
//! until the clear delay has passed.

use std::time::Duration;
use thiserror::Error;

pub const COMPLETE_PERCENT: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSettings {
    pub tick_interval: Duration,
    pub step: u8,
    pub cap: u8,
    pub clear_delay: Duration,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(300),
            step: 10,
            cap: 90,
            clear_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Idle,
    Estimating { percent: u8 },
    Finalizing,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgressError {
    #[error("progress is already running ({0:?})")]
    AlreadyRunning(ProgressPhase),
    #[error("no estimate to complete ({0:?})")]
    NotEstimating(ProgressPhase),
    #[error("progress cap {cap} must be below 100")]
    InvalidCap { cap: u8 },
    #[error("tick interval must be non-zero")]
    ZeroInterval,
}

#[derive(Debug, Clone)]
pub struct UploadProgress {
    settings: ProgressSettings,
    phase: ProgressPhase,
    pending: Duration,
    finalized_for: Duration,
}

impl Default for UploadProgress {
    fn default() -> Self {
        Self {
            settings: ProgressSettings::default(),
            phase: ProgressPhase::Idle,
            pending: Duration::ZERO,
            finalized_for: Duration::ZERO,
        }
    }
}

impl UploadProgress {
    pub fn new(settings: ProgressSettings) -> Result<Self, ProgressError> {
        if settings.cap >= COMPLETE_PERCENT {
            return Err(ProgressError::InvalidCap { cap: settings.cap });
        }
        if settings.tick_interval.is_zero() {
            return Err(ProgressError::ZeroInterval);
        }
        Ok(Self {
            settings,
            ..Self::default()
        })
    }

    pub fn phase(&self) -> ProgressPhase {
        self.phase
    }

    pub fn settings(&self) -> &ProgressSettings {
        &self.settings
    }

    /// Percentage to display, `None` while idle.
    pub fn percent(&self) -> Option<u8> {
        match self.phase {
            ProgressPhase::Idle => None,
            ProgressPhase::Estimating { percent } => Some(percent),
            ProgressPhase::Finalizing => Some(COMPLETE_PERCENT),
        }
    }

    pub fn start(&mut self) -> Result<(), ProgressError> {
        if self.phase != ProgressPhase::Idle {
            return Err(ProgressError::AlreadyRunning(self.phase));
        }
        self.phase = ProgressPhase::Estimating { percent: 0 };
        self.pending = Duration::ZERO;
        Ok(())
    }

    /// Feeds elapsed time into the estimate. One step per full tick interval,
    /// never past the cap. No effect outside `Estimating`.
    pub fn tick(&mut self, elapsed: Duration) -> ProgressPhase {
        if let ProgressPhase::Estimating { percent } = self.phase {
            self.pending += elapsed;
            let mut estimate = percent;
            while self.pending >= self.settings.tick_interval {
                self.pending -= self.settings.tick_interval;
                estimate = estimate.saturating_add(self.settings.step).min(self.settings.cap);
            }
            self.phase = ProgressPhase::Estimating { percent: estimate };
        }
        self.phase
    }

    /// Network completion: stops estimating and shows 100.
    pub fn complete(&mut self) -> Result<(), ProgressError> {
        match self.phase {
            ProgressPhase::Estimating { .. } => {
                self.phase = ProgressPhase::Finalizing;
                self.pending = Duration::ZERO;
                self.finalized_for = Duration::ZERO;
                Ok(())
            }
            other => Err(ProgressError::NotEstimating(other)),
        }
    }

    /// Returns to `Idle` once the clear delay has elapsed since `complete`.
    /// Returns whether the indicator was cleared.
    pub fn clear(&mut self, elapsed: Duration) -> bool {
        if self.phase != ProgressPhase::Finalizing {
            return false;
        }
        self.finalized_for += elapsed;
        if self.finalized_for >= self.settings.clear_delay {
            self.reset();
            return true;
        }
        false
    }

    /// Drops any progress immediately, whatever the phase.
    pub fn fail(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.phase = ProgressPhase::Idle;
        self.pending = Duration::ZERO;
        self.finalized_for = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn estimate_advances_per_interval_and_stops_at_cap() {
        let mut progress = UploadProgress::default();
        progress.start().expect("starts");
        assert_eq!(progress.percent(), Some(0));

        progress.tick(ms(299));
        assert_eq!(progress.percent(), Some(0));
        progress.tick(ms(1));
        assert_eq!(progress.percent(), Some(10));
        progress.tick(ms(900));
        assert_eq!(progress.percent(), Some(40));
        progress.tick(Duration::from_secs(60));
        assert_eq!(progress.percent(), Some(90));
    }

    #[test]
    fn completion_forces_full_then_clears_after_delay() {
        let mut progress = UploadProgress::default();
        progress.start().expect("starts");
        progress.tick(ms(600));
        progress.complete().expect("completes");
        assert_eq!(progress.phase(), ProgressPhase::Finalizing);
        assert_eq!(progress.percent(), Some(100));

        assert_eq!(progress.tick(ms(600)), ProgressPhase::Finalizing);
        assert!(!progress.clear(ms(400)));
        assert!(!progress.clear(ms(500)));
        assert!(progress.clear(ms(100)));
        assert_eq!(progress.phase(), ProgressPhase::Idle);
        assert_eq!(progress.percent(), None);
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut progress = UploadProgress::default();
        assert_eq!(
            progress.complete(),
            Err(ProgressError::NotEstimating(ProgressPhase::Idle))
        );
        progress.start().expect("starts");
        assert!(matches!(
            progress.start(),
            Err(ProgressError::AlreadyRunning(ProgressPhase::Estimating { .. }))
        ));
        assert!(!progress.clear(Duration::from_secs(5)));
    }

    #[test]
    fn failure_returns_to_idle_from_any_phase() {
        let mut progress = UploadProgress::default();
        progress.start().expect("starts");
        progress.fail();
        assert_eq!(progress.phase(), ProgressPhase::Idle);

        progress.start().expect("restarts");
        progress.complete().expect("completes");
        progress.fail();
        assert_eq!(progress.phase(), ProgressPhase::Idle);
        progress.start().expect("restarts after failure");
        assert_eq!(progress.percent(), Some(0));
    }

    #[test]
    fn settings_are_validated() {
        let settings = ProgressSettings {
            cap: 100,
            ..ProgressSettings::default()
        };
        assert_eq!(
            UploadProgress::new(settings).err(),
            Some(ProgressError::InvalidCap { cap: 100 })
        );
        let settings = ProgressSettings {
            tick_interval: Duration::ZERO,
            ..ProgressSettings::default()
        };
        assert_eq!(UploadProgress::new(settings).err(), Some(ProgressError::ZeroInterval));
    }
}
