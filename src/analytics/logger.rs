use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::LoggingConfig;

// ---------------------------------------------------------------------------
// Prediction log entry (JSONL analytics)
// ---------------------------------------------------------------------------

/// A single entry in the prediction log (`~/.medform/predictions.jsonl`).
///
/// One line per settled submission, successful or not. Read back by the
/// reporter for `medform history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionLogEntry {
    pub timestamp: String,
    /// Form name: `"blood"`, `"diabetes"`, `"cardio"` or `"liver"`.
    pub form: String,
    pub model_id: String,
    /// Whether the backend returned a usable prediction.
    #[serde(default = "default_true")]
    pub success: bool,
    /// Text rendered into the result region (label or failure message).
    #[serde(default)]
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub probabilities: Option<Vec<f64>>,
    /// Wall-clock time of the backend call in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub latency_ms: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl PredictionLogEntry {
    /// Build an entry stamped with the current time.
    pub fn now(
        form: &str,
        model_id: &str,
        success: bool,
        result: &str,
        probabilities: Option<Vec<f64>>,
        latency_ms: Option<u64>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            form: form.to_string(),
            model_id: model_id.to_string(),
            success,
            result: result.to_string(),
            probabilities,
            latency_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging functions
// ---------------------------------------------------------------------------

/// Append a settled prediction to the prediction log.
///
/// Best-effort; failures are silently ignored.
pub fn log_prediction(config: &LoggingConfig, entry: &PredictionLogEntry) {
    if !config.predictions_enabled() {
        return;
    }
    if let Some(path) = prediction_log_path() {
        let _ = append_entry(&path, entry);
    }
}

/// Append a line to the diagnostic log (`~/.medform/medform.log`).
///
/// Best-effort; failures are silently ignored.
pub fn log_diagnostic(config: &LoggingConfig, message: &str) {
    if !config.diagnostics_enabled() {
        return;
    }
    let Some(path) = diagnostic_log_path() else {
        return;
    };
    let _ = append_line(&path, &format!("{} {}", Utc::now().to_rfc3339(), message));
}

// ---------------------------------------------------------------------------
// Reading log entries
// ---------------------------------------------------------------------------

/// Read all prediction log entries.
///
/// Silently skips malformed lines. Returns an empty vec if the file does not
/// exist or cannot be read.
pub fn read_all_entries() -> Vec<PredictionLogEntry> {
    prediction_log_path()
        .map(|path| read_entries_from(&path))
        .unwrap_or_default()
}

/// Read entries from a specific log file.
pub fn read_entries_from(path: &Path) -> Vec<PredictionLogEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(|line| line.ok())
        .filter_map(|line| serde_json::from_str::<PredictionLogEntry>(&line).ok())
        .collect()
}

/// Keep only entries from the last `days` days. `None` keeps everything.
pub fn filter_since_days(
    entries: Vec<PredictionLogEntry>,
    days: Option<u32>,
) -> Vec<PredictionLogEntry> {
    let Some(days) = days else {
        return entries;
    };

    let cutoff = (Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();
    entries
        .into_iter()
        .filter(|e| e.timestamp >= cutoff)
        .collect()
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Serialize `entry` as one JSON line appended to `path`.
pub fn append_entry(path: &Path, entry: &PredictionLogEntry) -> Result<()> {
    let json = serde_json::to_string(entry)?;
    append_line(path, &json)
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;

    Ok(())
}

/// Return the path to the prediction log file.
pub fn prediction_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".medform").join("predictions.jsonl"))
}

/// Return the path to the diagnostic log file.
pub fn diagnostic_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".medform").join("medform.log"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("medform-logger-{}-{name}", std::process::id()))
            .join("predictions.jsonl")
    }

    #[test]
    fn append_then_read_skips_garbage() {
        let path = temp_log("roundtrip");
        let _ = fs::remove_file(&path);

        let ok = PredictionLogEntry::now(
            "blood",
            "best_xgb_model2",
            true,
            "1",
            Some(vec![0.3, 0.7]),
            Some(12),
        );
        append_entry(&path, &ok).unwrap();
        append_line(&path, "{not json").unwrap();
        let failed = PredictionLogEntry::now(
            "liver",
            "best_xgb_model4",
            false,
            "Prediction failed: Server error: 500 model error",
            None,
            Some(3),
        );
        append_entry(&path, &failed).unwrap();

        let entries = read_entries_from(&path);
        assert_eq!(entries, vec![ok, failed]);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_file_reads_empty() {
        assert!(read_entries_from(Path::new("/nonexistent/medform/predictions.jsonl")).is_empty());
    }

    #[test]
    fn old_entries_filtered_by_days() {
        let mut old = PredictionLogEntry::now("blood", "m", true, "0", None, None);
        old.timestamp = "2000-01-01T00:00:00+00:00".to_string();
        let fresh = PredictionLogEntry::now("blood", "m", true, "1", None, None);

        let kept = filter_since_days(vec![old.clone(), fresh.clone()], Some(7));
        assert_eq!(kept, vec![fresh.clone()]);

        let all = filter_since_days(vec![old, fresh], None);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn entry_without_optional_fields_deserializes() {
        let line = r#"{"timestamp":"2024-01-01T00:00:00+00:00","form":"cardio","model_id":"best_xgb_model3"}"#;
        let entry: PredictionLogEntry = serde_json::from_str(line).unwrap();
        assert!(entry.success);
        assert!(entry.result.is_empty());
        assert!(entry.latency_ms.is_none());
    }
}
