/// Controller integration tests.
///
/// Drive the runtime end to end with in-process predictors: overlapping
/// submissions, hung requests, theme persistence and the coercion rules as
/// seen by the backend.
mod support;

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use medform::client::{PredictionResponse, Predictor};
use medform::controller::Event;
use medform::controller::runtime::Runtime;
use medform::form::{self, FormKind, Payload, RawFields};
use medform::storage::{FileStorage, LocalStorage, MemoryStorage};
use medform::theme::{self, Theme};
use serde_json::{Value, json};

use support::quiet_logging;

// ---------------------------------------------------------------------------
// Test predictors
// ---------------------------------------------------------------------------

/// Records every call and answers with the number of fields it got.
#[derive(Default)]
struct Recording {
    calls: Mutex<Vec<(String, Payload)>>,
}

impl Predictor for Recording {
    fn post_predict(&self, model_id: &str, payload: &Payload) -> Result<PredictionResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((model_id.to_string(), payload.clone()));
        Ok(PredictionResponse::with_result(payload.len()).with_probabilities(vec![0.5, 0.5]))
    }
}

/// Blocks the liver model until released; every other model answers at once.
struct Gated {
    release: Mutex<Receiver<()>>,
}

impl Gated {
    fn new() -> (Self, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                release: Mutex::new(rx),
            },
            tx,
        )
    }
}

impl Predictor for Gated {
    fn post_predict(&self, model_id: &str, _payload: &Payload) -> Result<PredictionResponse> {
        if model_id == FormKind::Liver.model_id() {
            let _ = self.release.lock().unwrap().recv();
        }
        Ok(PredictionResponse::with_result(model_id))
    }
}

fn runtime_with(predictor: Arc<dyn Predictor>) -> Runtime {
    let mut rt = Runtime::new(predictor, Box::new(MemoryStorage::new()), quiet_logging());
    rt.start();
    rt
}

fn input(rt: &mut Runtime, form: FormKind, pairs: &[(&str, &str)]) {
    for (name, value) in pairs {
        rt.dispatch(Event::FieldInput {
            form,
            name: name.to_string(),
            value: value.to_string(),
        });
    }
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

#[test]
fn each_submit_sends_exactly_one_request_to_its_model() {
    let backend = Arc::new(Recording::default());
    let mut rt = runtime_with(backend.clone());

    input(&mut rt, FormKind::Blood, &[("Recency", "2"), ("Frequency", "50")]);
    input(&mut rt, FormKind::Liver, &[("Gender", "Male"), ("Age", "40")]);
    rt.dispatch(Event::Submit(FormKind::Blood));
    rt.dispatch(Event::Submit(FormKind::Blood));
    rt.dispatch(Event::Submit(FormKind::Liver));
    rt.run_until_idle();

    let calls = backend.calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    let blood_calls = calls.iter().filter(|(m, _)| m == "best_xgb_model2").count();
    assert_eq!(blood_calls, 2);

    let (_, liver_payload) = calls
        .iter()
        .find(|(m, _)| m == "best_xgb_model4")
        .unwrap();
    assert_eq!(
        Value::Object(liver_payload.clone()),
        json!({"Age": "40", "Gender_Male": 1})
    );

    assert_eq!(rt.state().panel(FormKind::Blood).result.as_deref(), Some("2"));
    assert_eq!(rt.state().panel(FormKind::Liver).result.as_deref(), Some("2"));
    assert_eq!(rt.state().panel(FormKind::Blood).in_flight, 0);
}

#[test]
fn hung_request_leaves_only_its_form_pending() {
    let (gated, release) = Gated::new();
    let mut rt = runtime_with(Arc::new(gated));

    rt.dispatch(Event::Submit(FormKind::Liver));
    rt.dispatch(Event::Submit(FormKind::Diabetes));

    // Wait for the diabetes answer and both press timers.
    let mut applied = 0;
    while applied < 3 {
        assert!(
            rt.wait_next(Duration::from_secs(5)),
            "runtime stalled with {} pending",
            rt.pending()
        );
        applied += 1;
    }

    let liver = rt.state().panel(FormKind::Liver);
    assert_eq!(liver.result, None);
    assert_eq!(liver.in_flight, 1);
    assert!(!liver.pressed, "press feedback ends regardless of the request");
    assert_eq!(
        rt.state().panel(FormKind::Diabetes).result.as_deref(),
        Some("best_xgb_model")
    );

    // The user keeps working while liver is stuck.
    rt.dispatch(Event::SelectForm("cardio".into()));
    assert_eq!(rt.state().visible_form, Some(FormKind::Cardio));

    release.send(()).unwrap();
    rt.run_until_idle();
    assert_eq!(
        rt.state().panel(FormKind::Liver).result.as_deref(),
        Some("best_xgb_model4")
    );
}

#[test]
fn editing_after_submit_does_not_change_the_sent_payload() {
    let backend = Arc::new(Recording::default());
    let mut rt = runtime_with(backend.clone());

    input(&mut rt, FormKind::Cardio, &[("smoke", "1")]);
    rt.dispatch(Event::Submit(FormKind::Cardio));
    input(&mut rt, FormKind::Cardio, &[("smoke", "0"), ("alco", "1")]);
    rt.run_until_idle();

    let calls = backend.calls.lock().unwrap();
    assert_eq!(Value::Object(calls[0].1.clone()), json!({"smoke": 1}));
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[test]
fn theme_toggle_persists_across_runtimes() {
    let path = std::env::temp_dir()
        .join(format!("medform-controller-{}", std::process::id()))
        .join("storage.json");
    let _ = std::fs::remove_file(&path);

    let mut rt = Runtime::new(
        Arc::new(Recording::default()),
        Box::new(FileStorage::at(&path)),
        quiet_logging(),
    );
    rt.start();
    assert_eq!(rt.state().theme, Theme::Light);
    rt.dispatch(Event::ToggleKey(" ".into()));
    assert_eq!(rt.state().theme, Theme::Dark);

    let stored = FileStorage::at(&path);
    assert_eq!(theme::load_preference(&stored), Theme::Dark);
    assert_eq!(stored.get_item("theme").unwrap().as_deref(), Some("dark"));

    let mut again = Runtime::new(
        Arc::new(Recording::default()),
        Box::new(FileStorage::at(&path)),
        quiet_logging(),
    );
    again.start();
    assert_eq!(again.state().theme, Theme::Dark);
    assert!(again.state().toggle_checked());

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn read_only_storage_keeps_session_theme() {
    let mut rt = Runtime::new(
        Arc::new(Recording::default()),
        Box::new(MemoryStorage::read_only().with_item("theme", "dark")),
        quiet_logging(),
    );
    rt.start();
    assert_eq!(rt.state().theme, Theme::Dark);
    rt.dispatch(Event::ToggleClicked);
    assert_eq!(rt.state().theme, Theme::Light);
    rt.dispatch(Event::ToggleKey("Spacebar".into()));
    assert_eq!(rt.state().theme, Theme::Dark);
}

// ---------------------------------------------------------------------------
// Coercion properties
// ---------------------------------------------------------------------------

#[test]
fn liver_gender_male_is_always_binary_and_gender_is_gone() {
    let inputs = [
        "male", "Male", "MALE", "female", "", "1", "0", "m", "other", " male", "mâle",
    ];
    for gender in inputs {
        let raw: RawFields = [("Gender", gender), ("Age", "33")].into_iter().collect();
        let payload = form::coerce(FormKind::Liver, &raw);
        assert!(!payload.contains_key("Gender"), "{gender:?}");
        let flag = &payload["Gender_Male"];
        assert!(flag == &json!(0) || flag == &json!(1), "{gender:?} -> {flag}");
        assert_eq!(flag == &json!(1), gender.to_lowercase() == "male", "{gender:?}");
    }
}

#[test]
fn coercion_is_deterministic_and_order_preserving() {
    let raw: RawFields = [
        ("weight", "70"),
        ("gender", "Other"),
        ("active", ""),
        ("height", "170"),
        ("smoke", "abc"),
    ]
    .into_iter()
    .collect();

    let first = form::coerce(FormKind::Cardio, &raw);
    let second = form::coerce(FormKind::Cardio, &raw);
    assert_eq!(first, second);

    let keys: Vec<&str> = first.keys().map(String::as_str).collect();
    assert_eq!(keys, ["weight", "gender", "active", "height", "smoke"]);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        r#"{"weight":"70","gender":2,"active":0,"height":"170","smoke":null}"#
    );
}
