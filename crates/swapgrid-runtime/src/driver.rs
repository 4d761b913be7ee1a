#![forbid(unsafe_code)]

//! Event loop that runs a [`Session`] in real time.
//!
//! The driver owns one message channel. Input sources (a terminal reader,
//! a test harness) send [`Msg`] values through [`Driver::sender`]; the timer
//! scheduler sends tick and deadline events through the same channel. All
//! state changes happen on the thread that calls [`Driver::run`], one
//! message at a time.

use std::sync::mpsc;

use swapgrid_core::AssetProvider;
use web_time::Instant;

use crate::error::{Result, RuntimeError};
use crate::repository::{ResultsRepository, SessionInfo};
use crate::session::{Cmd, Msg, Session};
use crate::subscription::TimerScheduler;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every level was played.
    Completed,
    /// A quit message arrived first.
    Quit,
}

pub struct Driver<P, R> {
    session: Session<P>,
    repository: R,
    scheduler: TimerScheduler,
    sender: mpsc::Sender<Msg>,
    receiver: mpsc::Receiver<Msg>,
}

impl<P: AssetProvider, R: ResultsRepository> Driver<P, R> {
    #[must_use]
    pub fn new(session: Session<P>, repository: R) -> Self {
        let (sender, receiver) = mpsc::channel();
        let scheduler = TimerScheduler::new(sender.clone());
        Self {
            session,
            repository,
            scheduler,
            sender,
            receiver,
        }
    }

    /// A handle for feeding input messages into the loop.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<Msg> {
        self.sender.clone()
    }

    #[must_use]
    pub fn session(&self) -> &Session<P> {
        &self.session
    }

    #[must_use]
    pub fn repository(&self) -> &R {
        &self.repository
    }

    #[must_use]
    pub fn into_parts(self) -> (Session<P>, R) {
        (self.session, self.repository)
    }

    /// Open the repository, start level 1, and process messages until the
    /// session completes or quits.
    ///
    /// `observer` sees the session after start and after every message.
    pub fn run<F>(&mut self, mut observer: F) -> Result<RunOutcome>
    where
        F: FnMut(&Session<P>),
    {
        let started = Instant::now();
        let info = SessionInfo::new(
            self.session.provider().name(),
            self.session.config().clone(),
        );
        self.repository.open(&info)?;

        let cmd = self.session.start()?;
        let outcome = match self.execute(cmd) {
            Ok(true) => Some(RunOutcome::Quit),
            Ok(false) => None,
            Err(err) => {
                self.scheduler.stop_all();
                return Err(err);
            }
        };
        observer(&self.session);

        let result = match outcome {
            Some(outcome) => Ok(outcome),
            None => self.pump(&mut observer),
        };
        self.scheduler.stop_all();

        tracing::info!(
            target: "swapgrid.driver",
            outcome = ?result.as_ref().ok(),
            levels = self.session.results().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run finished"
        );
        result
    }

    fn pump<F>(&mut self, observer: &mut F) -> Result<RunOutcome>
    where
        F: FnMut(&Session<P>),
    {
        loop {
            let msg = self
                .receiver
                .recv()
                .map_err(|_| RuntimeError::Disconnected)?;
            let cmd = self.session.update(msg)?;
            let quit = self.execute(cmd)?;
            observer(&self.session);

            if quit {
                return Ok(RunOutcome::Quit);
            }
            if self.session.is_complete() {
                return Ok(RunOutcome::Completed);
            }
        }
    }

    /// Run the side effects of a command. Returns `true` on quit.
    fn execute(&mut self, cmd: Cmd) -> Result<bool> {
        let mut quit = false;
        for cmd in cmd.flatten() {
            match cmd {
                Cmd::None | Cmd::Batch(_) => {}
                Cmd::StartTimers(spec) => self.scheduler.start(spec),
                Cmd::CancelTimers(generation) => {
                    self.scheduler.cancel(generation);
                }
                Cmd::Record(result) => self.repository.record(&result)?,
                Cmd::Finish(table) => self.repository.flush(&table)?,
                Cmd::Quit => quit = true,
            }
        }
        Ok(quit)
    }
}
