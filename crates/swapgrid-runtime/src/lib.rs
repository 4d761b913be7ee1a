#![forbid(unsafe_code)]

//! Session runtime for the swapgrid spatial-memory task.
//!
//! Builds on the pure engine in `swapgrid-core` and adds everything that
//! involves time or storage:
//!
//! - [`Session`]: the level controller, an Elm-style model driven by [`Msg`]
//!   values that answers with [`Cmd`] side effects.
//! - [`timer`]: the study countdown and its generation guard.
//! - [`subscription`]: tick and deadline threads behind [`TimerScheduler`].
//! - [`Driver`]: a blocking event loop wiring the session, scheduler, and
//!   a [`ResultsRepository`] together.
//! - [`SessionSimulator`]: the same wiring on a virtual clock, for tests.
//! - [`export`]: the per-level table and summary row.

pub mod driver;
pub mod error;
pub mod export;
pub mod repository;
pub mod session;
pub mod simulator;
pub mod subscription;
pub mod timer;

pub use driver::{Driver, RunOutcome};
pub use error::{Result, RuntimeError};
pub use export::{ExportRecord, ExportTable, SummaryRecord};
pub use repository::{
    JsonFileRepository, MemoryRepository, ResultsRepository, SessionInfo, StoredSession,
};
pub use session::{Cmd, Msg, Phase, Session, StudyEnd};
pub use simulator::SessionSimulator;
pub use subscription::{StopSignal, TimerScheduler};
pub use timer::{TimerEvent, TimerGeneration, TimerSpec, TrialTimer};
