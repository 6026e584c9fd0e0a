//! Per-form field coercion.
//!
//! Turns the raw, string-valued form snapshot into the JSON payload the
//! backend model expects. Every function here is pure: the output depends
//! only on the raw input.
//!
//! | Form     | Rule                                                        |
//! |----------|-------------------------------------------------------------|
//! | blood    | passthrough                                                 |
//! | diabetes | passthrough                                                 |
//! | cardio   | `gender` -> 1/0/2, `smoke`/`alco`/`active` -> number        |
//! | liver    | `Gender` -> `Gender_Male` (0/1), `Gender` removed           |
//!
//! Field order is preserved end to end (`serde_json` is built with
//! `preserve_order`): the backend orders features by insertion order when
//! the model carries no feature names.

use serde::Serialize;
use serde_json::{Map, Number, Value};

use super::FormKind;

/// JSON object sent as the request body.
pub type Payload = Map<String, Value>;

/// Cardio fields parsed to numbers when present.
const CARDIO_NUMERIC_FIELDS: [&str; 3] = ["smoke", "alco", "active"];

// ---------------------------------------------------------------------------
// Raw fields
// ---------------------------------------------------------------------------

/// Insertion-ordered snapshot of a form's inputs, all values strings.
///
/// Re-inserting an existing name replaces its value but keeps its position,
/// which is how a browser form-data walk into a plain object behaves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RawFields(Map<String, Value>);

impl RawFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), Value::String(value.into()));
    }

    /// Remove a field, keeping the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        match self.0.shift_remove(name) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str().unwrap_or_default()))
    }

    /// The fields as an uncoerced payload.
    pub fn to_payload(&self) -> Payload {
        self.0.clone()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

// ---------------------------------------------------------------------------
// Coercion entry point
// ---------------------------------------------------------------------------

/// Build the request payload for `form` from its raw fields.
pub fn coerce(form: FormKind, raw: &RawFields) -> Payload {
    match form {
        FormKind::Blood | FormKind::Diabetes => raw.to_payload(),
        FormKind::Cardio => coerce_cardio(raw),
        FormKind::Liver => coerce_liver(raw),
    }
}

/// Cardio: gender code plus numeric habit flags.
fn coerce_cardio(raw: &RawFields) -> Payload {
    let mut payload = raw.to_payload();

    if let Some(gender) = raw.get("gender") {
        payload.insert("gender".to_string(), Value::from(gender_code(gender)));
    }

    for name in CARDIO_NUMERIC_FIELDS {
        if let Some(value) = raw.get(name) {
            payload.insert(name.to_string(), js_number(value));
        }
    }

    payload
}

/// Liver: one-hot `Gender_Male` in place of `Gender`.
fn coerce_liver(raw: &RawFields) -> Payload {
    let mut payload = raw.to_payload();

    let gender_male = match raw.get("Gender") {
        Some(gender) => u8::from(gender.to_lowercase() == "male"),
        // Numeric fallback of a missing value is NaN, which falls to 0.
        None => 0,
    };
    payload.insert("Gender_Male".to_string(), Value::from(gender_male));
    payload.shift_remove("Gender");

    payload
}

/// Cardio gender code: male = 1, female = 0, anything else = 2.
pub fn gender_code(raw: &str) -> u8 {
    match raw.to_lowercase().as_str() {
        "male" => 1,
        "female" => 0,
        _ => 2,
    }
}

// ---------------------------------------------------------------------------
// Numeric parsing
// ---------------------------------------------------------------------------

/// Parse a form string the way JavaScript `Number()` does and return the
/// JSON value it serializes to.
///
/// Blank input is 0. Integral values become JSON integers. Anything that is
/// not a finite number becomes `null`.
pub fn js_number(raw: &str) -> Value {
    match parse_js_number(raw) {
        Some(n) if n.is_finite() => number_value(n),
        _ => Value::Null,
    }
}

/// `Number(raw)` as an `f64`; `None` stands for NaN.
pub fn parse_js_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(0.0);
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            return parse_radix_digits(digits, radix);
        }
    }

    match s {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    // Rust accepts spellings JS rejects ("inf", "NaN"); only digits,
    // sign, dot and exponent get this far.
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }

    s.parse::<f64>().ok()
}

/// Digits after a `0x`/`0o`/`0b` prefix, rounded to the nearest `f64`.
///
/// No sign is allowed. Digits past the first 120 bits only decide rounding,
/// through a sticky bit; anything beyond `f64::MAX` is infinite.
fn parse_radix_digits(digits: &str, radix: u32) -> Option<f64> {
    let bits = radix.trailing_zeros();
    let values: Vec<u32> = digits
        .chars()
        .map(|c| c.to_digit(radix))
        .collect::<Option<_>>()?;
    if values.is_empty() {
        return None;
    }

    let Some(first) = values.iter().position(|&d| d != 0) else {
        return Some(0.0);
    };
    let significant = &values[first..];
    let (head, tail) = significant.split_at(significant.len().min((120 / bits) as usize));

    let mut mantissa = head
        .iter()
        .fold(0u128, |acc, &d| (acc << bits) | u128::from(d));
    let mut exponent = (tail.len() as u32 * bits) as i32;
    if !tail.is_empty() {
        mantissa = (mantissa << 1) | u128::from(tail.iter().any(|&d| d != 0));
        exponent -= 1;
    }
    Some(mantissa as f64 * 2f64.powi(exponent))
}

/// Convert a finite `f64` into a JSON number, preferring integers.
pub(crate) fn number_value(n: f64) -> Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
