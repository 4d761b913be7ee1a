#![no_main]

use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use swapgrid_core::{EngineConfig, ShapeAssets};
use swapgrid_runtime::{Msg, Phase, Session, SessionSimulator, TimerEvent, TimerGeneration};

fuzz_target!(|data: &[u8]| {
    // First byte seeds the RNG, second picks the column count (2..=7).
    if data.len() < 2 {
        return;
    }
    let config = EngineConfig {
        columns: usize::from(data[1] % 6) + 2,
        require_selection: data[1] & 0x80 == 0,
        ..EngineConfig::default()
    };
    let Ok(session) = Session::with_rng(
        config.clone(),
        ShapeAssets::new(config.max_items()),
        SmallRng::seed_from_u64(u64::from(data[0])),
    ) else {
        return;
    };
    let mut sim = SessionSimulator::new(session);
    sim.start().expect("start with a full pool");

    for chunk in data[2..].chunks(2) {
        let op = chunk[0];
        let arg = chunk.get(1).copied().unwrap_or(0);
        let result = match op % 7 {
            0 => sim.advance(Duration::from_millis(u64::from(arg) * 250)),
            1 => sim.deliver(Msg::ToggleSelection(usize::from(arg))),
            2 => sim.deliver(Msg::Ready),
            3 => sim.deliver(Msg::Submit),
            4 => sim.deliver(Msg::Acknowledge),
            5 => sim.deliver(Msg::Timer(TimerEvent::Tick {
                generation: TimerGeneration::new(u64::from(arg)),
            })),
            _ => sim.deliver(Msg::Timer(TimerEvent::Deadline {
                generation: TimerGeneration::new(u64::from(arg)),
            })),
        };
        result.expect("valid configuration never fails mid-session");

        // Post-conditions that must always hold:
        let session = sim.session();
        assert!(session.cumulative_score() <= session.cumulative_max());
        assert!(sim.cancelled().len() <= sim.started().len());
        if let Some(trial) = session.trial() {
            let n = trial.items().len();
            assert!(trial.selected().iter().all(|&p| p < n), "selection OOB");
            if let Some(moved) = trial.moved_positions() {
                assert_eq!(moved.len() % 2, 0, "odd moved count");
                assert!(moved.iter().all(|&p| p < n), "moved position OOB");
            }
        }
        match session.phase() {
            Phase::Study => assert!(session.live_generation().is_some()),
            _ => assert!(session.live_generation().is_none()),
        }
    }
});
