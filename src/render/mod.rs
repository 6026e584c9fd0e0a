//! Result Renderer.
//!
//! Turns a prediction response into the text shown in a form's result
//! region and the list shown in its probability region. Number formatting
//! follows the browser: `String(value)` for the label and `toFixed(1)` for
//! percentages.

use serde::Serialize;
use serde_json::Value;

use crate::client::PredictionResponse;

/// Content of a probability region: an ordered list of labels, or nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProbabilityList {
    entries: Vec<String>,
}

impl ProbabilityList {
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Replace `target` with one `Class {i}: {p}%` entry per probability.
///
/// Absent or empty input leaves `target` cleared.
pub fn render_probabilities(target: &mut ProbabilityList, probabilities: Option<&[f64]>) {
    target.clear();
    let Some(probabilities) = probabilities else {
        return;
    };
    target.entries = probabilities
        .iter()
        .enumerate()
        .map(|(idx, &p)| format!("Class {idx}: {}%", to_fixed_1(p * 100.0)))
        .collect();
}

/// Text written into the result region for a successful response.
///
/// Falls back to the whole response as JSON when `result` is absent or null.
pub fn result_text(response: &PredictionResponse) -> String {
    match &response.result {
        Some(value) if !value.is_null() => js_string(value),
        _ => serde_json::to_string(response).unwrap_or_default(),
    }
}

/// Text written into the result region for a failed prediction.
pub fn failure_text(message: &str) -> String {
    format!("Prediction failed: {message}")
}

/// `String(value)` for a JSON value.
pub fn js_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() => js_number_string(f),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => js_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Shortest decimal form of a float, without a trailing `.0`.
fn js_number_string(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if f == 0.0 {
        return "0".to_string();
    }
    let s = f.to_string();
    s.strip_suffix(".0").map(str::to_string).unwrap_or(s)
}

/// `x.toFixed(1)`: one decimal from the exact binary value, exact ties go up.
fn to_fixed_1(x: f64) -> String {
    if !x.is_finite() {
        return js_number_string(x);
    }
    // A tie only counts when `x * 10` is exact; `format!` handles the rest.
    let scaled = x * 10.0;
    if scaled.fract().abs() == 0.5 && x.mul_add(10.0, -scaled) == 0.0 {
        return format!("{:.1}", (scaled.abs() + 0.5).floor().copysign(x) / 10.0);
    }
    format!("{x:.1}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_two_classes() {
        let mut list = ProbabilityList::default();
        render_probabilities(&mut list, Some(&[0.823, 0.177]));
        assert_eq!(list.entries(), ["Class 0: 82.3%", "Class 1: 17.7%"]);
    }

    #[test]
    fn absent_or_empty_clears() {
        let mut list = ProbabilityList::default();
        render_probabilities(&mut list, Some(&[0.5]));
        assert!(!list.is_empty());

        render_probabilities(&mut list, None);
        assert!(list.is_empty());

        render_probabilities(&mut list, Some(&[0.5]));
        render_probabilities(&mut list, Some(&[]));
        assert!(list.is_empty());
    }

    #[test]
    fn render_is_full_replace() {
        let mut list = ProbabilityList::default();
        render_probabilities(&mut list, Some(&[0.1, 0.2, 0.7]));
        render_probabilities(&mut list, Some(&[1.0]));
        assert_eq!(list.entries(), ["Class 0: 100.0%"]);
    }

    #[test]
    fn to_fixed_rounds_ties_up() {
        assert_eq!(to_fixed_1(1.25), "1.3");
        assert_eq!(to_fixed_1(0.0), "0.0");
        assert_eq!(to_fixed_1(50.0), "50.0");
        assert_eq!(to_fixed_1(33.333333), "33.3");
        assert_eq!(to_fixed_1(-1.25), "-1.3");
    }

    #[test]
    fn near_ties_round_on_the_exact_value() {
        // Each product lands just below the half step once multiplied by 100.
        let mut list = ProbabilityList::default();
        render_probabilities(&mut list, Some(&[0.8235, 0.0015, 0.1235, 0.4565]));
        assert_eq!(
            list.entries(),
            ["Class 0: 82.3%", "Class 1: 0.1%", "Class 2: 12.3%", "Class 3: 45.6%"]
        );
    }

    #[test]
    fn result_text_uses_string_conversion() {
        assert_eq!(result_text(&PredictionResponse::with_result("Positive")), "Positive");
        assert_eq!(result_text(&PredictionResponse::with_result(1)), "1");
        assert_eq!(result_text(&PredictionResponse::with_result(1.0)), "1");
        assert_eq!(result_text(&PredictionResponse::with_result(0.25)), "0.25");
        assert_eq!(result_text(&PredictionResponse::with_result(json!([1, 0]))), "1,0");
        assert_eq!(
            result_text(&PredictionResponse::with_result(json!({"a": 1}))),
            "[object Object]"
        );
    }

    #[test]
    fn result_text_falls_back_to_json() {
        let resp: PredictionResponse =
            serde_json::from_value(json!({"label": "x"})).unwrap();
        assert_eq!(result_text(&resp), r#"{"label":"x"}"#);
    }

    #[test]
    fn failure_text_prefix() {
        assert_eq!(
            failure_text("Server error: 500 model error"),
            "Prediction failed: Server error: 500 model error"
        );
    }
}
