#![forbid(unsafe_code)]

//! Level controller and trial state machine.
//!
//! [`Session`] is an Elm-style model: every input arrives as a [`Msg`],
//! [`Session::update`] performs the state transition, and side effects come
//! back as a [`Cmd`] for the host to execute (start or cancel a timer pair,
//! record a level result, flush the finished table).
//!
//! # Phases
//!
//! ```text
//! Idle ──start──▶ Study ──deadline | ready──▶ Response ──submit──▶ Feedback
//!                   ▲                                                 │
//!                   └──────────────── acknowledge (level < last) ─────┤
//!                                                                     ▼
//!                                              Complete ◀── acknowledge (last level)
//! ```
//!
//! Leaving `Study` retires the live timer pair. Any later tick or deadline
//! carrying that generation fails the guard in [`TrialTimer::accept`] and is
//! dropped without touching state.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use swapgrid_core::{
    AssetProvider, EngineConfig, EngineError, Evaluation, Level, LevelResult, Position, Trial,
};

use crate::export::ExportTable;
use crate::timer::{TimerEvent, TimerGeneration, TimerSpec, TrialTimer};

/// Where the session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not started yet, or aborted.
    Idle,
    /// Items are shown; the countdown runs.
    Study,
    /// Positions have changed; the participant marks moved slots.
    Response,
    /// The trial has been scored and awaits acknowledgement.
    Feedback,
    /// Every level of the ladder has been played.
    Complete,
}

/// Inputs to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    Timer(TimerEvent),
    ToggleSelection(Position),
    Ready,
    Submit,
    Acknowledge,
    Quit,
}

impl From<TimerEvent> for Msg {
    fn from(event: TimerEvent) -> Self {
        Self::Timer(event)
    }
}

/// Why the study phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyEnd {
    Deadline,
    Ready,
}

/// Side effects requested by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    None,
    Batch(Vec<Cmd>),
    StartTimers(TimerSpec),
    CancelTimers(TimerGeneration),
    Record(LevelResult),
    Finish(ExportTable),
    Quit,
}

impl Cmd {
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::None
    }

    /// Combine commands, dropping no-ops.
    #[must_use]
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds
            .into_iter()
            .filter(|c| !matches!(c, Self::None))
            .collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.remove(0),
            _ => Self::Batch(cmds),
        }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Flatten nested batches into execution order.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(cmds) => cmds.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}

/// The level controller.
pub struct Session<P> {
    config: EngineConfig,
    provider: P,
    rng: SmallRng,
    phase: Phase,
    level: Level,
    trial: Option<Trial>,
    timer: Option<TrialTimer>,
    next_generation: TimerGeneration,
    evaluation: Option<Evaluation>,
    results: Vec<LevelResult>,
    cumulative_score: usize,
    cumulative_max: usize,
}

impl<P: AssetProvider> Session<P> {
    /// Create a session with an unseeded RNG.
    ///
    /// Fails on an invalid config, or if the provider cannot cover the
    /// largest grid of the ladder.
    pub fn new(config: EngineConfig, provider: P) -> Result<Self, EngineError> {
        Self::with_rng(config, provider, SmallRng::from_os_rng())
    }

    /// Create a session with a caller-supplied RNG.
    ///
    /// The config is validated first; an invalid one is rejected before any
    /// grid size is computed from it.
    pub fn with_rng(config: EngineConfig, provider: P, rng: SmallRng) -> Result<Self, EngineError> {
        let problems = config.validate();
        if !problems.is_empty() {
            return Err(EngineError::InvalidConfig { problems });
        }
        let required = config.max_items();
        let available = provider.pool().len();
        if available < required {
            return Err(EngineError::InsufficientAssets {
                required,
                available,
            });
        }
        swapgrid_core::asset::ensure_unique(provider.pool())?;

        Ok(Self {
            config,
            provider,
            rng,
            phase: Phase::Idle,
            level: Level::FIRST,
            trial: None,
            timer: None,
            next_generation: TimerGeneration::new(1),
            evaluation: None,
            results: Vec::new(),
            cumulative_score: 0,
            cumulative_max: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn current_level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn trial(&self) -> Option<&Trial> {
        self.trial.as_ref()
    }

    #[must_use]
    pub fn timer(&self) -> Option<&TrialTimer> {
        self.timer.as_ref()
    }

    /// Generation of the live timer pair, if any.
    #[must_use]
    pub fn live_generation(&self) -> Option<TimerGeneration> {
        self.timer
            .as_ref()
            .filter(|t| t.is_live())
            .map(TrialTimer::generation)
    }

    /// Score of the trial awaiting acknowledgement.
    #[must_use]
    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    #[must_use]
    pub fn results(&self) -> &[LevelResult] {
        &self.results
    }

    #[must_use]
    pub fn cumulative_score(&self) -> usize {
        self.cumulative_score
    }

    #[must_use]
    pub fn cumulative_max(&self) -> usize {
        self.cumulative_max
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// Open level 1. A no-op once the session has started.
    ///
    /// Starting again after [`Session::abort`] begins a fresh run: results
    /// and cumulative totals from the aborted run are discarded. Timer
    /// generations keep counting so events from the old run stay stale.
    pub fn start(&mut self) -> Result<Cmd, EngineError> {
        if self.phase != Phase::Idle {
            tracing::warn!(target: "swapgrid.session", phase = ?self.phase, "start ignored");
            return Ok(Cmd::none());
        }
        let trial = self.prepare_trial(Level::FIRST)?;
        if !self.results.is_empty() {
            tracing::debug!(
                target: "swapgrid.session",
                discarded = self.results.len(),
                "restart discards aborted results"
            );
        }
        self.results.clear();
        self.cumulative_score = 0;
        self.cumulative_max = 0;
        Ok(self.install_trial(trial))
    }

    /// Apply one message.
    ///
    /// Only fatal engine errors are returned; stale timers and out-of-phase
    /// inputs are logged and ignored.
    pub fn update(&mut self, msg: Msg) -> Result<Cmd, EngineError> {
        match msg {
            Msg::Timer(event) => self.on_timer(event),
            Msg::ToggleSelection(position) => {
                self.on_toggle(position);
                Ok(Cmd::none())
            }
            Msg::Ready => self.on_ready(),
            Msg::Submit => {
                self.on_submit();
                Ok(Cmd::none())
            }
            Msg::Acknowledge => self.on_acknowledge(),
            Msg::Quit => Ok(Cmd::batch(vec![self.abort(), Cmd::Quit])),
        }
    }

    /// Tear down the current trial, cancelling its timers.
    ///
    /// Results stay readable until the next [`Session::start`].
    pub fn abort(&mut self) -> Cmd {
        let cancel = self.retire_timer();
        if self.phase != Phase::Complete {
            self.phase = Phase::Idle;
        }
        self.trial = None;
        self.evaluation = None;
        tracing::debug!(target: "swapgrid.session", level = self.level.get(), "session aborted");
        cancel
    }

    fn prepare_trial(&mut self, level: Level) -> Result<Trial, EngineError> {
        Trial::generate(
            level,
            self.config.columns,
            self.provider.pool(),
            &mut self.rng,
        )
        .inspect_err(|err| {
            tracing::error!(
                target: "swapgrid.session",
                level = level.get(),
                error = %err,
                "level cannot start"
            );
        })
    }

    fn install_trial(&mut self, trial: Trial) -> Cmd {
        let cancel = self.retire_timer();
        let generation = self.next_generation;
        self.next_generation = generation.next();

        let timer = TrialTimer::new(generation, &self.config);
        let spec = timer.spec();
        self.level = trial.level();
        self.trial = Some(trial);
        self.timer = Some(timer);
        self.evaluation = None;
        self.phase = Phase::Study;

        tracing::info!(
            target: "swapgrid.session",
            level = self.level.get(),
            generation = generation.get(),
            provider = self.provider.name(),
            "level started"
        );
        Cmd::batch(vec![cancel, Cmd::StartTimers(spec)])
    }

    /// Cancel the live pair, if any, and return the matching command.
    fn retire_timer(&mut self) -> Cmd {
        let Some(timer) = self.timer.as_mut() else {
            return Cmd::none();
        };
        if !timer.cancel() {
            return Cmd::none();
        }
        tracing::debug!(
            target: "swapgrid.timer",
            generation = timer.generation().get(),
            "timer pair cancelled"
        );
        Cmd::CancelTimers(timer.generation())
    }

    fn on_timer(&mut self, event: TimerEvent) -> Result<Cmd, EngineError> {
        let guard = match (&self.timer, self.phase) {
            (Some(timer), Phase::Study) => timer.accept(event),
            (timer, _) => Err(EngineError::StaleTimerFired {
                live: timer
                    .as_ref()
                    .filter(|t| t.is_live())
                    .map(|t| t.generation().get()),
                fired: event.generation().get(),
            }),
        };
        if let Err(err) = guard {
            tracing::debug!(target: "swapgrid.timer", error = %err, "dropped timer event");
            return Ok(Cmd::none());
        }

        match event {
            TimerEvent::Tick { .. } => {
                if let Some(timer) = self.timer.as_mut() {
                    timer.tick();
                    tracing::trace!(
                        target: "swapgrid.timer",
                        remaining_ms = timer.remaining().as_millis() as u64,
                        "tick"
                    );
                }
                Ok(Cmd::none())
            }
            TimerEvent::Deadline { .. } => self.end_study(StudyEnd::Deadline),
        }
    }

    fn on_ready(&mut self) -> Result<Cmd, EngineError> {
        if self.phase != Phase::Study {
            tracing::debug!(target: "swapgrid.session", phase = ?self.phase, "ready ignored");
            return Ok(Cmd::none());
        }
        let available = self.timer.as_ref().is_some_and(TrialTimer::ready_available);
        if !available {
            tracing::debug!(target: "swapgrid.session", "ready before minimum dwell ignored");
            return Ok(Cmd::none());
        }
        self.end_study(StudyEnd::Ready)
    }

    fn end_study(&mut self, reason: StudyEnd) -> Result<Cmd, EngineError> {
        let Some(trial) = self.trial.as_mut() else {
            return Ok(Cmd::none());
        };
        trial.reveal(&mut self.rng)?;
        trial.clear_selection();
        let cancel = self.retire_timer();
        self.phase = Phase::Response;
        tracing::debug!(
            target: "swapgrid.session",
            level = self.level.get(),
            reason = ?reason,
            "study phase ended"
        );
        Ok(cancel)
    }

    fn on_toggle(&mut self, position: Position) {
        if self.phase != Phase::Response {
            tracing::warn!(
                target: "swapgrid.session",
                phase = ?self.phase,
                position,
                "selection ignored"
            );
            return;
        }
        if let Some(trial) = self.trial.as_mut() {
            match trial.toggle(position) {
                Ok(selected) => {
                    tracing::debug!(
                        target: "swapgrid.session",
                        position,
                        selected,
                        "selection toggled"
                    );
                }
                Err(err) => {
                    tracing::warn!(target: "swapgrid.session", error = %err, "selection rejected");
                }
            }
        }
    }

    fn on_submit(&mut self) {
        if self.phase != Phase::Response {
            tracing::warn!(target: "swapgrid.session", phase = ?self.phase, "submit ignored");
            return;
        }
        let Some(trial) = self.trial.as_ref() else {
            return;
        };
        if self.config.require_selection && trial.selected().is_empty() {
            tracing::debug!(target: "swapgrid.session", "submit with empty selection ignored");
            return;
        }
        self.evaluation = trial.evaluate(self.config.pass_policy);
        if let Some(eval) = &self.evaluation {
            tracing::debug!(
                target: "swapgrid.session",
                level = self.level.get(),
                correct = eval.correct,
                incorrect = eval.incorrect,
                score = eval.score,
                "response submitted"
            );
            self.phase = Phase::Feedback;
        }
    }

    fn on_acknowledge(&mut self) -> Result<Cmd, EngineError> {
        if self.phase != Phase::Feedback {
            tracing::warn!(target: "swapgrid.session", phase = ?self.phase, "acknowledge ignored");
            return Ok(Cmd::none());
        }
        let Some(result) = self
            .trial
            .as_ref()
            .and_then(|t| t.result(self.config.pass_policy))
        else {
            return Ok(Cmd::none());
        };

        // Build the next trial before committing anything so a failed
        // generation leaves the session in Feedback with nothing recorded.
        let next = match self.level.next(self.config.last_level()) {
            Some(level) => Some(self.prepare_trial(level)?),
            None => None,
        };

        self.cumulative_score += result.score;
        self.cumulative_max += result.total_moved;
        self.results.push(result.clone());
        tracing::info!(
            target: "swapgrid.session",
            level = result.level.get(),
            score = result.score,
            total_moved = result.total_moved,
            passed = result.passed,
            cumulative_score = self.cumulative_score,
            "level result recorded"
        );

        let record = Cmd::Record(result);
        match next {
            Some(trial) => Ok(Cmd::batch(vec![record, self.install_trial(trial)])),
            None => {
                self.trial = None;
                self.evaluation = None;
                self.phase = Phase::Complete;
                tracing::info!(
                    target: "swapgrid.session",
                    levels = self.results.len(),
                    score = self.cumulative_score,
                    max = self.cumulative_max,
                    "session complete"
                );
                Ok(Cmd::batch(vec![
                    record,
                    Cmd::Finish(ExportTable::from_results(&self.results)),
                ]))
            }
        }
    }
}

impl<P> std::fmt::Debug for Session<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.phase)
            .field("level", &self.level)
            .field("results", &self.results.len())
            .field("cumulative_score", &self.cumulative_score)
            .field("cumulative_max", &self.cumulative_max)
            .finish_non_exhaustive()
    }
}
