//! The blocking half of a submission: one backend call, timed and logged.
//!
//! [`execute_prediction`] is what the runtime's worker threads run.
//! [`submit_once`] runs a whole submission inline for callers that have no
//! event loop (the web API).

use std::time::Instant;

use serde::Serialize;

use crate::analytics::logger::{self, PredictionLogEntry};
use crate::client::{PredictionResponse, Predictor};
use crate::config::LoggingConfig;
use crate::form::{self, FormKind, Payload, RawFields};
use crate::render;

use super::{FormPanel, apply_outcome};

/// Call the backend once for `form` and record the outcome in the
/// prediction log.
///
/// Errors are flattened to their full context chain (`{:#}`), which is the
/// message shown after `Prediction failed: `.
pub fn execute_prediction(
    predictor: &dyn Predictor,
    form: FormKind,
    payload: &Payload,
    logging: &LoggingConfig,
) -> Result<PredictionResponse, String> {
    let start = Instant::now();
    let outcome = predictor
        .post_predict(form.model_id(), payload)
        .map_err(|e| format!("{e:#}"));
    let latency_ms = start.elapsed().as_millis() as u64;

    let entry = match &outcome {
        Ok(response) => PredictionLogEntry::now(
            form.name(),
            form.model_id(),
            true,
            &render::result_text(response),
            response.probabilities.clone(),
            Some(latency_ms),
        ),
        Err(message) => PredictionLogEntry::now(
            form.name(),
            form.model_id(),
            false,
            &render::failure_text(message),
            None,
            Some(latency_ms),
        ),
    };
    logger::log_prediction(logging, &entry);

    outcome
}

/// Result of an inline submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub form: FormKind,
    pub model_id: &'static str,
    /// Body that was sent.
    pub payload: Payload,
    /// Whether the prediction failed.
    pub failed: bool,
    /// Result text as rendered into the result region.
    pub result: String,
    /// Probability list as rendered.
    pub probabilities: Vec<String>,
}

/// Coerce `raw`, call the backend and render the outcome, all on the
/// calling thread.
pub fn submit_once(
    predictor: &dyn Predictor,
    form: FormKind,
    raw: &RawFields,
    logging: &LoggingConfig,
) -> Submission {
    let payload = form::coerce(form, raw);
    let outcome = execute_prediction(predictor, form, &payload, logging);

    if let Err(message) = &outcome {
        logger::log_diagnostic(
            logging,
            &format!("prediction error form={form} model={} error={message}", form.model_id()),
        );
    }

    let mut panel = FormPanel::default();
    apply_outcome(&mut panel, outcome.as_ref().map_err(String::as_str));

    Submission {
        form,
        model_id: form.model_id(),
        payload,
        failed: panel.failed,
        result: panel.result.unwrap_or_default(),
        probabilities: panel.probabilities.entries().to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records calls and answers with a fixed outcome.
    struct Canned {
        calls: Mutex<Vec<(String, Payload)>>,
        fail: bool,
    }

    impl Predictor for Canned {
        fn post_predict(&self, model_id: &str, payload: &Payload) -> Result<PredictionResponse> {
            self.calls
                .lock()
                .unwrap()
                .push((model_id.to_string(), payload.clone()));
            if self.fail {
                anyhow::bail!("Server error: 500 model error");
            }
            Ok(PredictionResponse::with_result(0).with_probabilities(vec![0.9, 0.1]))
        }
    }

    fn quiet() -> LoggingConfig {
        LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        }
    }

    #[test]
    fn submit_once_success() {
        let backend = Canned {
            calls: Mutex::new(Vec::new()),
            fail: false,
        };
        let raw: RawFields = [("Gender", "male"), ("Age", "50")].into_iter().collect();
        let submission = submit_once(&backend, FormKind::Liver, &raw, &quiet());

        assert!(!submission.failed);
        assert_eq!(submission.result, "0");
        assert_eq!(submission.probabilities, ["Class 0: 90.0%", "Class 1: 10.0%"]);

        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls[0].0, "best_xgb_model4");
        assert_eq!(
            serde_json::Value::Object(calls[0].1.clone()),
            json!({"Age": "50", "Gender_Male": 1})
        );
    }

    #[test]
    fn submit_once_failure() {
        let backend = Canned {
            calls: Mutex::new(Vec::new()),
            fail: true,
        };
        let submission = submit_once(&backend, FormKind::Blood, &RawFields::new(), &quiet());
        assert!(submission.failed);
        assert_eq!(submission.result, "Prediction failed: Server error: 500 model error");
        assert!(submission.probabilities.is_empty());
    }
}
