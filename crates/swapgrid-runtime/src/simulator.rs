#![forbid(unsafe_code)]

//! Deterministic session simulator.
//!
//! Runs a [`Session`] against a virtual clock instead of threads. Timer
//! commands install virtual timers; [`SessionSimulator::advance`] fires
//! whatever is due in time order. [`SessionSimulator::deliver`] injects any
//! message directly, including events for generations that have already
//! been cancelled, which is how late timer callbacks are reproduced in tests.
//!
//! # Example
//! ```
//! use std::time::Duration;
//!
//! use rand::SeedableRng;
//! use rand::rngs::SmallRng;
//! use swapgrid_core::{EngineConfig, ShapeAssets};
//! use swapgrid_runtime::{Phase, Session, SessionSimulator};
//!
//! let session = Session::with_rng(
//!     EngineConfig::default(),
//!     ShapeAssets::new(20),
//!     SmallRng::seed_from_u64(1),
//! )
//! .unwrap();
//! let mut sim = SessionSimulator::new(session);
//! sim.start().unwrap();
//! sim.advance(Duration::from_secs(30)).unwrap();
//! assert_eq!(sim.session().phase(), Phase::Response);
//! ```

use std::time::Duration;

use swapgrid_core::AssetProvider;

use crate::error::Result;
use crate::repository::{MemoryRepository, ResultsRepository, SessionInfo};
use crate::session::{Cmd, Msg, Session};
use crate::timer::{TimerEvent, TimerGeneration, TimerSpec};

#[derive(Debug, Clone, Copy)]
struct VirtualPair {
    spec: TimerSpec,
    next_tick: Duration,
    deadline: Option<Duration>,
}

impl VirtualPair {
    fn next_due(&self) -> Duration {
        match self.deadline {
            Some(deadline) => self.next_tick.min(deadline),
            None => self.next_tick,
        }
    }
}

pub struct SessionSimulator<P> {
    session: Session<P>,
    repository: MemoryRepository,
    now: Duration,
    pair: Option<VirtualPair>,
    started: Vec<TimerGeneration>,
    cancelled: Vec<TimerGeneration>,
    quit: bool,
}

impl<P: AssetProvider> SessionSimulator<P> {
    #[must_use]
    pub fn new(session: Session<P>) -> Self {
        Self {
            session,
            repository: MemoryRepository::new(),
            now: Duration::ZERO,
            pair: None,
            started: Vec::new(),
            cancelled: Vec::new(),
            quit: false,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session<P> {
        &self.session
    }

    #[must_use]
    pub fn repository(&self) -> &MemoryRepository {
        &self.repository
    }

    /// Virtual time since the simulator was created.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Generation of the virtual pair currently scheduled.
    #[must_use]
    pub fn scheduled_generation(&self) -> Option<TimerGeneration> {
        self.pair.map(|p| p.spec.generation)
    }

    /// Every pair started so far, in order.
    #[must_use]
    pub fn started(&self) -> &[TimerGeneration] {
        &self.started
    }

    /// Every pair cancelled so far, in order.
    #[must_use]
    pub fn cancelled(&self) -> &[TimerGeneration] {
        &self.cancelled
    }

    #[must_use]
    pub fn has_quit(&self) -> bool {
        self.quit
    }

    pub fn start(&mut self) -> Result<()> {
        let info = SessionInfo::new(
            self.session.provider().name(),
            self.session.config().clone(),
        );
        self.repository.open(&info)?;
        let cmd = self.session.start()?;
        self.execute(cmd)
    }

    /// Deliver one message immediately.
    pub fn deliver(&mut self, msg: Msg) -> Result<()> {
        let cmd = self.session.update(msg)?;
        self.execute(cmd)
    }

    /// Move the clock forward, firing due ticks before a deadline at the same instant.
    pub fn advance(&mut self, by: Duration) -> Result<()> {
        let target = self.now + by;
        while let Some(pair) = self.pair {
            let due = pair.next_due();
            if due > target {
                break;
            }
            self.now = due;
            let generation = pair.spec.generation;
            let event = if pair.next_tick <= due {
                if let Some(p) = self.pair.as_mut() {
                    p.next_tick += p.spec.tick;
                }
                TimerEvent::Tick { generation }
            } else {
                if let Some(p) = self.pair.as_mut() {
                    p.deadline = None;
                }
                TimerEvent::Deadline { generation }
            };
            self.deliver(Msg::Timer(event))?;
        }
        self.now = target;
        Ok(())
    }

    fn execute(&mut self, cmd: Cmd) -> Result<()> {
        for cmd in cmd.flatten() {
            match cmd {
                Cmd::None | Cmd::Batch(_) => {}
                Cmd::StartTimers(spec) => {
                    self.started.push(spec.generation);
                    self.pair = Some(VirtualPair {
                        spec,
                        next_tick: self.now + spec.tick,
                        deadline: Some(self.now + spec.deadline),
                    });
                }
                Cmd::CancelTimers(generation) => {
                    self.cancelled.push(generation);
                    if self.scheduled_generation() == Some(generation) {
                        self.pair = None;
                    }
                }
                Cmd::Record(result) => self.repository.record(&result)?,
                Cmd::Finish(table) => self.repository.flush(&table)?,
                Cmd::Quit => self.quit = true,
            }
        }
        Ok(())
    }
}
