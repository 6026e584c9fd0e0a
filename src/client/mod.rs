/// Predict Client: HTTP access to the backend prediction service.
///
/// Talks to the backend with the synchronous `ureq` client:
///
/// - **Predict**: `POST {base}/predict/{model_id}` with the coerced payload
///   as a JSON body.
/// - **Models**: `GET {base}/models` lists the model names the backend hosts.
///
/// Each call is a single attempt. There is no retry, no timeout and no
/// cancellation; the caller decides what a failure means.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::BackendConfig;
use crate::form::Payload;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Successful body of `POST /predict/{model_id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Predicted label; usually a string or number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Per-class probabilities in class-index order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<f64>>,
    /// Anything else the backend sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PredictionResponse {
    pub fn with_result(result: impl Into<Value>) -> Self {
        Self {
            result: Some(result.into()),
            ..Self::default()
        }
    }

    pub fn with_probabilities(mut self, probabilities: Vec<f64>) -> Self {
        self.probabilities = Some(probabilities);
        self
    }
}

// ---------------------------------------------------------------------------
// Predictor seam
// ---------------------------------------------------------------------------

/// Anything that can serve a prediction for a model id.
///
/// [`PredictClient`] is the HTTP implementation; the controller runtime
/// takes any implementation so tests can substitute a canned backend.
pub trait Predictor: Send + Sync {
    fn post_predict(&self, model_id: &str, payload: &Payload) -> Result<PredictionResponse>;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous backend client.
#[derive(Debug, Clone)]
pub struct PredictClient {
    base_url: String,
    agent: ureq::Agent,
}

impl PredictClient {
    /// Build a client for the given backend base URL.
    ///
    /// Trailing slashes are trimmed and `localhost` is pinned to
    /// `127.0.0.1`; on some platforms `localhost` tries IPv6 first and
    /// stalls when the backend only binds IPv4.
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url
            .trim_end_matches('/')
            .replace("://localhost", "://127.0.0.1");
        Self {
            base_url,
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    /// Build a client from the resolved config.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(&config.url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the prediction endpoint for `model_id`.
    pub fn predict_url(&self, model_id: &str) -> String {
        format!("{}/predict/{}", self.base_url, model_id)
    }

    /// List the models the backend can serve.
    pub fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.base_url);
        let resp = match self.agent.get(&url).call() {
            Ok(resp) => resp,
            Err(ureq::Error::Status(status, resp)) => {
                return Err(server_error(status, resp));
            }
            Err(e) => return Err(e).context("models request failed"),
        };

        resp.into_json()
            .context("failed to parse models response")
    }

    /// Whether the backend answers `GET /models` at all.
    pub fn is_reachable(&self) -> bool {
        self.list_models().is_ok()
    }
}

impl Predictor for PredictClient {
    /// POST the payload as JSON and parse the JSON reply.
    ///
    /// A non-2xx status fails with `Server error: {status} {body}`, the body
    /// taken verbatim.
    fn post_predict(&self, model_id: &str, payload: &Payload) -> Result<PredictionResponse> {
        let url = self.predict_url(model_id);

        let resp = match self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_json(payload)
        {
            Ok(resp) => resp,
            Err(ureq::Error::Status(status, resp)) => {
                return Err(server_error(status, resp));
            }
            Err(e) => return Err(e).context("prediction request failed"),
        };

        resp.into_json()
            .context("failed to parse prediction response")
    }
}

/// Error for a non-success status, carrying the status code and body text.
fn server_error(status: u16, resp: ureq::Response) -> anyhow::Error {
    let text = resp.into_string().unwrap_or_default();
    anyhow::anyhow!("Server error: {status} {text}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
