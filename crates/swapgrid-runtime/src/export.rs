//! Flat tabular view of a session's level results.
//!
//! This is the whole contract owed to export writers: one record per
//! completed level, in order, plus a summary row of sums. Byte formats are
//! the writer's concern; [`ExportTable::to_json_lines`] is provided for the
//! CLI and for tests.

use serde::{Deserialize, Serialize};
use swapgrid_core::LevelResult;

/// One completed level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub level: u8,
    pub correct: usize,
    pub incorrect: usize,
    pub total_moved: usize,
    pub score: usize,
}

/// Sums over every exported level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub levels: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub total_moved: usize,
    pub score: usize,
    pub passed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportTable {
    pub records: Vec<ExportRecord>,
    pub summary: SummaryRecord,
}

impl ExportTable {
    #[must_use]
    pub fn from_results(results: &[LevelResult]) -> Self {
        let mut summary = SummaryRecord::default();
        let records = results
            .iter()
            .map(|r| {
                summary.levels += 1;
                summary.correct += r.correct_selections;
                summary.incorrect += r.incorrect_selections;
                summary.total_moved += r.total_moved;
                summary.score += r.score;
                summary.passed += usize::from(r.passed);
                ExportRecord {
                    level: r.level.get(),
                    correct: r.correct_selections,
                    incorrect: r.incorrect_selections,
                    total_moved: r.total_moved,
                    score: r.score,
                }
            })
            .collect();
        Self { records, summary }
    }

    /// One JSON object per line: each record, then the summary tagged `"summary": true`.
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }
        let mut summary = serde_json::to_value(self.summary)?;
        if let Some(map) = summary.as_object_mut() {
            map.insert("summary".into(), serde_json::Value::Bool(true));
        }
        out.push_str(&serde_json::to_string(&summary)?);
        out.push('\n');
        Ok(out)
    }
}
