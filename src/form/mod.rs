//! The four prediction forms and their backend wiring.
//!
//! Each [`FormKind`] maps to exactly one backend model identifier and one
//! coercion rule (see [`coercion`]). The field catalog lists the inputs each
//! form renders by default; submissions are not restricted to it.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

pub mod coercion;

pub use coercion::{Payload, RawFields, coerce};

// ---------------------------------------------------------------------------
// Form kind
// ---------------------------------------------------------------------------

/// One of the four mutually exclusive prediction forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Blood,
    Diabetes,
    Cardio,
    Liver,
}

impl FormKind {
    /// All forms in trigger-control order.
    pub const ALL: [FormKind; 4] = [
        FormKind::Blood,
        FormKind::Diabetes,
        FormKind::Cardio,
        FormKind::Liver,
    ];

    /// Selector name used by trigger controls and the CLI.
    pub fn name(self) -> &'static str {
        match self {
            Self::Blood => "blood",
            Self::Diabetes => "diabetes",
            Self::Cardio => "cardio",
            Self::Liver => "liver",
        }
    }

    /// Exact, case-sensitive lookup by selector name.
    ///
    /// Returns `None` for anything that is not one of the four names; the
    /// form selector treats that as "hide everything".
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Backend model identifier (the `/predict/{model_id}` path segment).
    pub fn model_id(self) -> &'static str {
        match self {
            Self::Blood => "best_xgb_model2",
            Self::Diabetes => "best_xgb_model",
            Self::Cardio => "best_xgb_model3",
            Self::Liver => "best_xgb_model4",
        }
    }

    /// Human-readable title.
    pub fn title(self) -> &'static str {
        match self {
            Self::Blood => "Blood Donation",
            Self::Diabetes => "Diabetes",
            Self::Cardio => "Cardiovascular Disease",
            Self::Liver => "Liver Disease",
        }
    }

    /// Id of the region holding the predicted label or error text.
    pub fn result_region_id(self) -> String {
        format!("{}-result", self.name())
    }

    /// Id of the region holding the probability list.
    pub fn probabilities_region_id(self) -> String {
        format!("{}-result-probs", self.name())
    }

    /// One-line description of the coercion applied before submission.
    pub fn coercion_summary(self) -> &'static str {
        match self {
            Self::Blood | Self::Diabetes => "none (raw fields passed through)",
            Self::Cardio => "gender male/female/other -> 1/0/2; smoke, alco, active -> number",
            Self::Liver => "Gender -> Gender_Male (male = 1, else 0); Gender removed",
        }
    }

    /// Fields rendered for this form, in submission order.
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::Blood => BLOOD_FIELDS,
            Self::Diabetes => DIABETES_FIELDS,
            Self::Cardio => CARDIO_FIELDS,
            Self::Liver => LIVER_FIELDS,
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FormKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            anyhow::anyhow!("unknown form '{s}' (expected blood, diabetes, cardio or liver)")
        })
    }
}

// ---------------------------------------------------------------------------
// Field catalog
// ---------------------------------------------------------------------------

/// How a catalog field is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldInput {
    Number,
    /// Fixed choice list; the first option is the default.
    Select { options: &'static [&'static str] },
}

/// One input of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub input: FieldInput,
}

const fn number(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        label,
        input: FieldInput::Number,
    }
}

const fn select(
    name: &'static str,
    label: &'static str,
    options: &'static [&'static str],
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        input: FieldInput::Select { options },
    }
}

const BINARY: &[&str] = &["0", "1"];

const BLOOD_FIELDS: &[FieldSpec] = &[
    number("Recency", "Months since last donation"),
    number("Frequency", "Total donations"),
    number("Monetary", "Total blood donated (c.c.)"),
    number("Time", "Months since first donation"),
];

const DIABETES_FIELDS: &[FieldSpec] = &[
    number("Pregnancies", "Pregnancies"),
    number("Glucose", "Glucose"),
    number("BloodPressure", "Blood pressure"),
    number("SkinThickness", "Skin thickness"),
    number("Insulin", "Insulin"),
    number("BMI", "BMI"),
    number("DiabetesPedigreeFunction", "Diabetes pedigree function"),
    number("Age", "Age"),
];

const CARDIO_FIELDS: &[FieldSpec] = &[
    number("age", "Age (days)"),
    select("gender", "Gender", &["Male", "Female", "Other"]),
    number("height", "Height (cm)"),
    number("weight", "Weight (kg)"),
    number("ap_hi", "Systolic blood pressure"),
    number("ap_lo", "Diastolic blood pressure"),
    select("cholesterol", "Cholesterol", &["1", "2", "3"]),
    select("gluc", "Glucose", &["1", "2", "3"]),
    select("smoke", "Smoker", BINARY),
    select("alco", "Alcohol intake", BINARY),
    select("active", "Physically active", BINARY),
];

const LIVER_FIELDS: &[FieldSpec] = &[
    number("Age", "Age"),
    select("Gender", "Gender", &["Male", "Female"]),
    number("Total_Bilirubin", "Total bilirubin"),
    number("Direct_Bilirubin", "Direct bilirubin"),
    number("Alkaline_Phosphotase", "Alkaline phosphotase"),
    number("Alamine_Aminotransferase", "Alamine aminotransferase"),
    number("Aspartate_Aminotransferase", "Aspartate aminotransferase"),
    number("Total_Protiens", "Total proteins"),
    number("Albumin", "Albumin"),
    number("Albumin_and_Globulin_Ratio", "Albumin/globulin ratio"),
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
