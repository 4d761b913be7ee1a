#![forbid(unsafe_code)]

//! Background timer sources.
//!
//! A timer pair is two threads, a periodic tick and a one-shot deadline,
//! that share a single [`StopSignal`]. Stopping the pair flips that one
//! signal, so both sources go quiet together. Messages already sitting in
//! the channel when the pair stops are not recalled; the session's
//! generation guard discards them.

use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use crate::session::Msg;
use crate::timer::{TimerEvent, TimerGeneration, TimerSpec};

/// Signal for stopping a timer source.
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    /// Create a new stop signal pair (signal, trigger).
    pub(crate) fn new() -> (Self, StopTrigger) {
        let inner = Arc::new((Mutex::new(false), Condvar::new()));
        let signal = Self {
            inner: inner.clone(),
        };
        let trigger = StopTrigger { inner };
        (signal, trigger)
    }

    /// Check if the stop signal has been triggered.
    pub fn is_stopped(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wait for either the stop signal or a timeout.
    ///
    /// Returns `true` if stopped, `false` if timed out.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let (stopped, _) = cvar
            .wait_timeout_while(guard, duration, |stopped| !*stopped)
            .unwrap_or_else(|e| e.into_inner());
        *stopped
    }
}

/// Trigger to stop a timer pair from the driver side.
pub(crate) struct StopTrigger {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopTrigger {
    pub(crate) fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(|e| e.into_inner());
        *stopped = true;
        cvar.notify_all();
    }
}

/// A running tick + deadline pair.
struct RunningPair {
    generation: TimerGeneration,
    trigger: StopTrigger,
    threads: Vec<thread::JoinHandle<()>>,
}

impl RunningPair {
    fn stop(mut self) {
        self.trigger.stop();
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for RunningPair {
    fn drop(&mut self) {
        self.trigger.stop();
    }
}

fn run_ticks(spec: TimerSpec, sender: mpsc::Sender<Msg>, stop: StopSignal) {
    loop {
        if stop.wait_timeout(spec.tick) {
            break;
        }
        let event = TimerEvent::Tick {
            generation: spec.generation,
        };
        if sender.send(Msg::Timer(event)).is_err() {
            break;
        }
    }
}

fn run_deadline(spec: TimerSpec, sender: mpsc::Sender<Msg>, stop: StopSignal) {
    if stop.wait_timeout(spec.deadline) {
        return;
    }
    let event = TimerEvent::Deadline {
        generation: spec.generation,
    };
    let _ = sender.send(Msg::Timer(event));
}

/// Owns at most one running timer pair.
pub struct TimerScheduler {
    sender: mpsc::Sender<Msg>,
    active: Option<RunningPair>,
}

impl TimerScheduler {
    #[must_use]
    pub fn new(sender: mpsc::Sender<Msg>) -> Self {
        Self {
            sender,
            active: None,
        }
    }

    #[must_use]
    pub fn active_generation(&self) -> Option<TimerGeneration> {
        self.active.as_ref().map(|p| p.generation)
    }

    /// Start a pair, stopping whatever pair was running before.
    pub fn start(&mut self, spec: TimerSpec) {
        self.stop_all();

        tracing::debug!(
            target: "swapgrid.timer",
            generation = spec.generation.get(),
            tick_ms = spec.tick.as_millis() as u64,
            deadline_ms = spec.deadline.as_millis() as u64,
            "starting timer pair"
        );
        let (signal, trigger) = StopSignal::new();
        let tick_sender = self.sender.clone();
        let tick_signal = signal.clone();
        let deadline_sender = self.sender.clone();

        let threads = vec![
            thread::spawn(move || run_ticks(spec, tick_sender, tick_signal)),
            thread::spawn(move || run_deadline(spec, deadline_sender, signal)),
        ];
        self.active = Some(RunningPair {
            generation: spec.generation,
            trigger,
            threads,
        });
    }

    /// Stop the pair with this generation. Returns `false` if it was not running.
    pub fn cancel(&mut self, generation: TimerGeneration) -> bool {
        match self.active.take() {
            Some(pair) if pair.generation == generation => {
                tracing::debug!(
                    target: "swapgrid.timer",
                    generation = generation.get(),
                    "stopping timer pair"
                );
                pair.stop();
                true
            }
            other => {
                self.active = other;
                false
            }
        }
    }

    /// Stop the running pair, if any.
    pub fn stop_all(&mut self) {
        if let Some(pair) = self.active.take() {
            pair.stop();
        }
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(generation: u64, tick_ms: u64, deadline_ms: u64) -> TimerSpec {
        TimerSpec {
            generation: TimerGeneration::new(generation),
            tick: Duration::from_millis(tick_ms),
            deadline: Duration::from_millis(deadline_ms),
        }
    }

    #[test]
    fn one_trigger_wakes_both_sources_of_a_pair() {
        let (signal, trigger) = StopSignal::new();
        let waiters: Vec<_> = (0..2)
            .map(|_| {
                let signal = signal.clone();
                thread::spawn(move || signal.wait_timeout(Duration::from_secs(10)))
            })
            .collect();
        assert!(!signal.wait_timeout(Duration::from_millis(5)));

        let started = std::time::Instant::now();
        trigger.stop();
        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(signal.is_stopped());
    }

    #[test]
    fn pair_ticks_then_fires_deadline_once() {
        let (tx, rx) = mpsc::channel();
        let mut scheduler = TimerScheduler::new(tx);
        scheduler.start(spec(1, 10, 60));

        let deadline = rx
            .iter()
            .find(|m| matches!(m, Msg::Timer(TimerEvent::Deadline { .. })))
            .unwrap();
        assert_eq!(
            deadline,
            Msg::Timer(TimerEvent::Deadline {
                generation: TimerGeneration::new(1)
            })
        );
        assert!(scheduler.cancel(TimerGeneration::new(1)));
        let leftovers: Vec<_> = rx.try_iter().collect();
        assert!(
            leftovers
                .iter()
                .all(|m| !matches!(m, Msg::Timer(TimerEvent::Deadline { .. })))
        );
    }

    #[test]
    fn cancelled_pair_goes_quiet() {
        let (tx, rx) = mpsc::channel();
        let mut scheduler = TimerScheduler::new(tx);
        scheduler.start(spec(2, 5, 10_000));
        thread::sleep(Duration::from_millis(30));
        assert!(scheduler.cancel(TimerGeneration::new(2)));
        assert!(scheduler.active_generation().is_none());

        let _drained: Vec<_> = rx.try_iter().collect();
        thread::sleep(Duration::from_millis(30));
        assert!(rx.try_iter().next().is_none());
    }

    #[test]
    fn cancel_ignores_other_generations() {
        let (tx, _rx) = mpsc::channel();
        let mut scheduler = TimerScheduler::new(tx);
        scheduler.start(spec(3, 1000, 10_000));
        assert!(!scheduler.cancel(TimerGeneration::new(2)));
        assert_eq!(scheduler.active_generation(), Some(TimerGeneration::new(3)));
        scheduler.start(spec(4, 1000, 10_000));
        assert_eq!(scheduler.active_generation(), Some(TimerGeneration::new(4)));
        scheduler.stop_all();
        assert!(scheduler.active_generation().is_none());
    }
}
