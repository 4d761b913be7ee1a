//! Plain-text rendering of a session snapshot.
//!
//! Cells show `position:asset`. During response a selected cell is wrapped
//! in `[ ]`; during feedback a moved cell is marked `+` and a wrongly
//! selected one `x`.

use std::fmt::Write as _;

use swapgrid_core::{AssetProvider, Item, item::layout};
use swapgrid_runtime::{Phase, Session};

/// Render the header line plus, when a trial is on screen, its grid.
#[must_use]
pub fn render<P: AssetProvider>(session: &Session<P>) -> String {
    let mut out = header(session);
    out.push('\n');

    let Some(trial) = session.trial() else {
        if session.is_complete() {
            let _ = writeln!(
                out,
                "done: {} levels, score {}/{}",
                session.results().len(),
                session.cumulative_score(),
                session.cumulative_max()
            );
        }
        return out;
    };

    let items: &[Item] = match session.phase() {
        Phase::Study => trial.items(),
        _ => trial.swapped().unwrap_or(trial.items()),
    };
    let Some(slots) = layout(items) else {
        return out;
    };
    let moved = trial.moved_positions();
    let selected = trial.selected();
    let width = slots
        .iter()
        .map(|item| item.asset.as_str().len())
        .max()
        .unwrap_or(0)
        + slots.len().to_string().len()
        + 3;

    for row in slots.chunks(trial.columns()) {
        let line: Vec<String> = row
            .iter()
            .map(|item| {
                let label = format!("{}:{}", item.position, item.asset);
                let cell = match session.phase() {
                    Phase::Response if selected.contains(&item.position) => format!("[{label}]"),
                    Phase::Feedback => {
                        let was_moved = moved.is_some_and(|m| m.contains(&item.position));
                        let picked = selected.contains(&item.position);
                        match (was_moved, picked) {
                            (true, _) => format!("+{label}"),
                            (false, true) => format!("x{label}"),
                            (false, false) => format!(" {label}"),
                        }
                    }
                    _ => format!(" {label} "),
                };
                format!("{cell:<width$}")
            })
            .collect();
        out.push_str(line.join(" ").trim_end());
        out.push('\n');
    }

    if let (Phase::Feedback, Some(eval)) = (session.phase(), session.evaluation()) {
        let _ = writeln!(
            out,
            "correct {} incorrect {} score {}/{} {}",
            eval.correct,
            eval.incorrect,
            eval.score,
            eval.total_moved,
            if eval.passed { "passed" } else { "not passed" }
        );
    }
    out
}

fn header<P: AssetProvider>(session: &Session<P>) -> String {
    let level = session.current_level();
    let last = session.config().max_level;
    match session.phase() {
        Phase::Idle => "not started".to_string(),
        Phase::Study => {
            let countdown = session.timer().map(|t| t.view()).unwrap_or_default();
            format!("level {level}/{last}  study  {countdown}  (r = ready)")
        }
        Phase::Response => {
            format!("level {level}/{last}  which items moved?  (t <pos>, s = submit)")
        }
        Phase::Feedback => format!("level {level}/{last}  feedback  (n = next)"),
        Phase::Complete => "complete".to_string(),
    }
}
