//! History reporter: aggregation over the prediction log.
//!
//! Reads the JSONL prediction log and provides the totals, per-form
//! breakdown and recent entries shown by `medform history`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analytics::logger::{self, PredictionLogEntry};
use crate::form::FormKind;

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Summary for `medform history`.
#[derive(Debug, Serialize)]
pub struct HistoryReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub forms: Vec<FormStat>,
    /// Most recent entries, newest first.
    pub recent: Vec<PredictionLogEntry>,
}

/// Per-form aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormStat {
    pub form: String,
    pub model_id: String,
    pub count: usize,
    pub failures: usize,
    /// Mean latency over entries that recorded one.
    pub avg_latency_ms: Option<f64>,
}

impl FormStat {
    pub fn failure_pct(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.failures as f64 / self.count as f64) * 100.0
        }
    }
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Build the history report from the prediction log, optionally limited to
/// the last `days` days, keeping `limit` recent entries.
pub fn compute_history(days: Option<u32>, limit: usize) -> HistoryReport {
    let entries = logger::filter_since_days(logger::read_all_entries(), days);
    build_report(&entries, limit)
}

pub fn build_report(entries: &[PredictionLogEntry], limit: usize) -> HistoryReport {
    let succeeded = entries.iter().filter(|e| e.success).count();

    let mut by_form: BTreeMap<&str, Vec<&PredictionLogEntry>> = BTreeMap::new();
    for entry in entries {
        by_form.entry(entry.form.as_str()).or_default().push(entry);
    }

    let mut forms: Vec<FormStat> = by_form
        .into_iter()
        .map(|(form, group)| {
            let latencies: Vec<u64> = group.iter().filter_map(|e| e.latency_ms).collect();
            let avg_latency_ms = if latencies.is_empty() {
                None
            } else {
                Some(latencies.iter().sum::<u64>() as f64 / latencies.len() as f64)
            };
            FormStat {
                form: form.to_string(),
                model_id: group
                    .last()
                    .map(|e| e.model_id.clone())
                    .unwrap_or_default(),
                count: group.len(),
                failures: group.iter().filter(|e| !e.success).count(),
                avg_latency_ms,
            }
        })
        .collect();

    // Known forms in trigger order, anything else after.
    forms.sort_by_key(|stat| {
        FormKind::from_name(&stat.form)
            .map(|kind| kind as usize)
            .unwrap_or(usize::MAX)
    });

    let mut recent: Vec<PredictionLogEntry> = entries.to_vec();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    recent.truncate(limit);

    HistoryReport {
        total: entries.len(),
        succeeded,
        failed: entries.len() - succeeded,
        forms,
        recent,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ts: &str, form: &str, success: bool, latency: Option<u64>) -> PredictionLogEntry {
        PredictionLogEntry {
            timestamp: ts.to_string(),
            form: form.to_string(),
            model_id: FormKind::from_name(form)
                .map(|k| k.model_id().to_string())
                .unwrap_or_default(),
            success,
            result: if success { "1".into() } else { "Prediction failed: x".into() },
            probabilities: None,
            latency_ms: latency,
        }
    }

    #[test]
    fn empty_log_gives_empty_report() {
        let report = build_report(&[], 10);
        assert_eq!(report.total, 0);
        assert!(report.forms.is_empty());
        assert!(report.recent.is_empty());
    }

    #[test]
    fn counts_and_latency_per_form() {
        let entries = vec![
            entry("2024-01-01T00:00:01+00:00", "liver", true, Some(10)),
            entry("2024-01-01T00:00:02+00:00", "blood", false, Some(30)),
            entry("2024-01-01T00:00:03+00:00", "liver", false, None),
            entry("2024-01-01T00:00:04+00:00", "liver", true, Some(20)),
        ];
        let report = build_report(&entries, 2);

        assert_eq!(report.total, 4);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 2);

        let names: Vec<_> = report.forms.iter().map(|f| f.form.as_str()).collect();
        assert_eq!(names, ["blood", "liver"]);

        let liver = &report.forms[1];
        assert_eq!(liver.count, 3);
        assert_eq!(liver.failures, 1);
        assert_eq!(liver.avg_latency_ms, Some(15.0));
        assert_eq!(liver.model_id, "best_xgb_model4");
        assert!((liver.failure_pct() - 33.333).abs() < 0.01);

        assert_eq!(report.recent.len(), 2);
        assert_eq!(report.recent[0].timestamp, "2024-01-01T00:00:04+00:00");
    }
}
