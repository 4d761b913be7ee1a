#![forbid(unsafe_code)]

//! Study-phase countdown with a generation guard.
//!
//! Each trial gets one timer pair: a tick source that advances the visible
//! countdown and a deadline source that fires once when study time runs out.
//! Both sources carry the [`TimerGeneration`] they were started with. The
//! [`TrialTimer`] accepts an event only while it is live and the generations
//! match, so a callback left over from a cancelled pair can never touch the
//! state of a later trial.
//!
//! # Example
//! ```
//! use swapgrid_core::EngineConfig;
//! use swapgrid_runtime::timer::{TimerEvent, TimerGeneration, TrialTimer};
//!
//! let config = EngineConfig::default();
//! let mut timer = TrialTimer::new(TimerGeneration::new(1), &config);
//! assert!(!timer.ready_available());
//!
//! let tick = TimerEvent::Tick { generation: TimerGeneration::new(1) };
//! for _ in 0..10 {
//!     timer.accept(tick).unwrap();
//!     timer.tick();
//! }
//! assert!(timer.ready_available());
//! assert_eq!(timer.view(), "00:20");
//! ```

use std::time::Duration;

use swapgrid_core::{EngineConfig, EngineError};

/// Token identifying one started timer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerGeneration(u64);

impl TimerGeneration {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for TimerGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// A firing from one of the two timer sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { generation: TimerGeneration },
    Deadline { generation: TimerGeneration },
}

impl TimerEvent {
    #[must_use]
    pub fn generation(&self) -> TimerGeneration {
        match self {
            Self::Tick { generation } | Self::Deadline { generation } => *generation,
        }
    }
}

/// What the scheduler needs to start a timer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSpec {
    pub generation: TimerGeneration,
    pub tick: Duration,
    pub deadline: Duration,
}

/// Countdown state for the active study phase.
#[derive(Debug, Clone)]
pub struct TrialTimer {
    generation: TimerGeneration,
    study: Duration,
    min_dwell: Duration,
    interval: Duration,
    elapsed: Duration,
    live: bool,
}

impl TrialTimer {
    #[must_use]
    pub fn new(generation: TimerGeneration, config: &EngineConfig) -> Self {
        Self {
            generation,
            study: config.study_duration(),
            min_dwell: config.min_dwell(),
            interval: config.tick_interval(),
            elapsed: Duration::ZERO,
            live: true,
        }
    }

    #[must_use]
    pub fn generation(&self) -> TimerGeneration {
        self.generation
    }

    #[must_use]
    pub fn spec(&self) -> TimerSpec {
        TimerSpec {
            generation: self.generation,
            tick: self.interval,
            deadline: self.study,
        }
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.study.saturating_sub(self.elapsed)
    }

    /// Fraction of the study time used, from 0.0 to 1.0.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.study.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f64() / self.study.as_secs_f64()).min(1.0)
    }

    /// Whether the minimum dwell has passed, so a ready signal counts.
    #[must_use]
    pub fn ready_available(&self) -> bool {
        self.live && self.elapsed >= self.min_dwell
    }

    /// Generation guard: `Ok` only for events of this live pair.
    pub fn accept(&self, event: TimerEvent) -> Result<(), EngineError> {
        let fired = event.generation();
        if self.live && fired == self.generation {
            Ok(())
        } else {
            Err(EngineError::StaleTimerFired {
                live: self.live.then_some(self.generation.get()),
                fired: fired.get(),
            })
        }
    }

    /// Advance the countdown by one interval.
    ///
    /// Returns `true` if the countdown just reached zero.
    pub fn tick(&mut self) -> bool {
        if !self.live || self.remaining().is_zero() {
            return false;
        }
        self.elapsed = self.elapsed.saturating_add(self.interval).min(self.study);
        self.remaining().is_zero()
    }

    /// Retire the pair. Returns `true` if it was live.
    pub fn cancel(&mut self) -> bool {
        std::mem::replace(&mut self.live, false)
    }

    /// Remaining time as `mm:ss`.
    #[must_use]
    pub fn view(&self) -> String {
        let total_secs = self.remaining().as_secs();
        format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(study_ms: u64, dwell_ms: u64, tick_ms: u64) -> EngineConfig {
        EngineConfig {
            study_ms,
            min_dwell_ms: dwell_ms,
            tick_ms,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn new_timer_is_full_and_live() {
        let timer = TrialTimer::new(TimerGeneration::new(4), &EngineConfig::default());
        assert!(timer.is_live());
        assert_eq!(timer.remaining(), Duration::from_secs(30));
        assert_eq!(timer.view(), "00:30");
        assert_eq!(timer.progress(), 0.0);
        assert_eq!(
            timer.spec(),
            TimerSpec {
                generation: TimerGeneration::new(4),
                tick: Duration::from_secs(1),
                deadline: Duration::from_secs(30),
            }
        );
    }

    #[test]
    fn ready_unlocks_after_min_dwell() {
        let mut timer = TrialTimer::new(TimerGeneration::new(1), &config(5000, 2000, 1000));
        timer.tick();
        assert!(!timer.ready_available());
        timer.tick();
        assert!(timer.ready_available());
    }

    #[test]
    fn tick_saturates_and_reports_zero_once() {
        let mut timer = TrialTimer::new(TimerGeneration::new(1), &config(2500, 0, 1000));
        assert!(!timer.tick());
        assert!(!timer.tick());
        assert!(timer.tick());
        assert_eq!(timer.remaining(), Duration::ZERO);
        assert!(!timer.tick());
        assert_eq!(timer.progress(), 1.0);
    }

    #[test]
    fn guard_rejects_other_generations() {
        let timer = TrialTimer::new(TimerGeneration::new(2), &EngineConfig::default());
        let stale = TimerEvent::Deadline {
            generation: TimerGeneration::new(1),
        };
        assert_eq!(
            timer.accept(stale),
            Err(EngineError::StaleTimerFired {
                live: Some(2),
                fired: 1
            })
        );
        let current = TimerEvent::Tick {
            generation: TimerGeneration::new(2),
        };
        assert!(timer.accept(current).is_ok());
    }

    #[test]
    fn cancelled_timer_rejects_everything() {
        let mut timer = TrialTimer::new(TimerGeneration::new(3), &EngineConfig::default());
        assert!(timer.cancel());
        assert!(!timer.cancel());
        let own = TimerEvent::Tick {
            generation: TimerGeneration::new(3),
        };
        assert_eq!(
            timer.accept(own),
            Err(EngineError::StaleTimerFired {
                live: None,
                fired: 3
            })
        );
        assert!(!timer.tick());
        assert!(!timer.ready_available());
    }

    #[test]
    fn view_formats_minutes() {
        let timer = TrialTimer::new(TimerGeneration::new(1), &config(95_000, 0, 1000));
        assert_eq!(timer.view(), "01:35");
    }
}
