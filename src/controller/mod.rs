//! Form Controller.
//!
//! The page-level UI is an explicit [`UiState`] value. Every user action and
//! every async completion is an [`Event`]; [`update`] applies one event and
//! returns the new state plus the [`Effect`]s the caller must carry out.
//! `update` itself performs no I/O, so the whole controller can be driven
//! deterministically in tests. [`runtime::Runtime`] is the driver that
//! executes effects and feeds completions back in.
//!
//! Rules enforced here:
//!
//! - at most one form container is visible; selecting a form hides the
//!   others and the shared local-output panel
//! - an unknown selector name hides every form
//! - a submission snapshots the form's draft, coerces it, requests one
//!   prediction and presses the submit control for [`PRESS_FEEDBACK`]
//! - a failure writes `Prediction failed: …` into the result region and
//!   leaves the probability region alone

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::client::PredictionResponse;
use crate::form::{self, FormKind, Payload, RawFields};
use crate::render::{self, ProbabilityList};
use crate::theme::{self, Theme};

pub mod pipeline;
pub mod runtime;
pub mod view;

/// How long the submit control stays pressed.
pub const PRESS_FEEDBACK: Duration = Duration::from_millis(150);

/// Form selected when the controller becomes ready.
pub const INITIAL_FORM: &str = "blood";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Output and input state of one form container.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormPanel {
    /// Current input values.
    pub draft: RawFields,
    /// Result region text; `None` until the first submission settles.
    pub result: Option<String>,
    /// The last settled submission failed.
    pub failed: bool,
    /// Probability region.
    pub probabilities: ProbabilityList,
    /// Submit control shows the pressed state.
    pub pressed: bool,
    /// Predictions sent and not yet settled.
    pub in_flight: usize,
}

/// Whole-page UI state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiState {
    pub theme: Theme,
    /// The one visible form container, if any.
    pub visible_form: Option<FormKind>,
    /// Shared local-output panel visibility.
    pub local_output_visible: bool,
    pub panels: BTreeMap<FormKind, FormPanel>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            visible_form: None,
            local_output_visible: false,
            panels: FormKind::ALL
                .into_iter()
                .map(|kind| (kind, FormPanel::default()))
                .collect(),
        }
    }
}

impl UiState {
    pub fn panel(&self, form: FormKind) -> &FormPanel {
        // Every kind is inserted by `Default` and never removed.
        &self.panels[&form]
    }

    fn panel_mut(&mut self, form: FormKind) -> &mut FormPanel {
        self.panels.entry(form).or_default()
    }

    /// Whether `form`'s container is shown.
    pub fn is_visible(&self, form: FormKind) -> bool {
        self.visible_form == Some(form)
    }

    /// `aria-checked` of the theme toggle.
    pub fn toggle_checked(&self) -> bool {
        self.theme.is_dark()
    }

    /// Set the theme. Applying the current theme again changes nothing.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Hide all containers and the local-output panel, then show the one
    /// named `name`. Unknown names leave everything hidden.
    pub fn show_form(&mut self, name: &str) {
        self.visible_form = None;
        self.local_output_visible = false;
        if let Some(kind) = FormKind::from_name(name) {
            self.visible_form = Some(kind);
        }
    }
}

// ---------------------------------------------------------------------------
// Events and effects
// ---------------------------------------------------------------------------

/// Input to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Controller wiring is done. `stored_theme` is the persisted value, or
    /// `None` when absent or unreadable.
    Ready { stored_theme: Option<String> },
    /// Theme toggle clicked.
    ToggleClicked,
    /// Key pressed while the theme toggle has focus.
    ToggleKey(String),
    /// A trigger control asked for the form called `name`.
    SelectForm(String),
    /// An input of `form` changed.
    FieldInput {
        form: FormKind,
        name: String,
        value: String,
    },
    /// An input of `form` was removed.
    FieldRemoved { form: FormKind, name: String },
    /// `form` was submitted.
    Submit(FormKind),
    /// The prediction for `form` finished.
    PredictionSettled {
        form: FormKind,
        outcome: Result<PredictionResponse, String>,
    },
    /// The press-feedback timer for `form` elapsed.
    PressReleased(FormKind),
}

/// Side effect requested by [`update`].
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Write the theme to local storage; failure is ignored.
    PersistTheme(Theme),
    /// Send one prediction request.
    Predict {
        form: FormKind,
        model_id: &'static str,
        payload: Payload,
    },
    /// Deliver [`Event::PressReleased`] after `after`.
    ReleasePress { form: FormKind, after: Duration },
    /// Record a failed prediction for diagnostics.
    LogFailure { form: FormKind, message: String },
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// Apply one event to the state.
pub fn update(mut state: UiState, event: Event) -> (UiState, Vec<Effect>) {
    let mut effects = Vec::new();

    match event {
        Event::Ready { stored_theme } => {
            state.set_theme(Theme::from_stored(stored_theme.as_deref()));
            state.show_form(INITIAL_FORM);
        }
        Event::ToggleClicked => toggle_theme(&mut state, &mut effects),
        Event::ToggleKey(key) => {
            if theme::is_toggle_key(&key) {
                toggle_theme(&mut state, &mut effects);
            }
        }
        Event::SelectForm(name) => state.show_form(&name),
        Event::FieldInput { form, name, value } => {
            state.panel_mut(form).draft.insert(name, value);
        }
        Event::FieldRemoved { form, name } => {
            state.panel_mut(form).draft.remove(&name);
        }
        Event::Submit(form) => {
            let panel = state.panel_mut(form);
            let payload = form::coerce(form, &panel.draft);
            panel.in_flight += 1;
            panel.pressed = true;
            effects.push(Effect::Predict {
                form,
                model_id: form.model_id(),
                payload,
            });
            effects.push(Effect::ReleasePress {
                form,
                after: PRESS_FEEDBACK,
            });
        }
        Event::PredictionSettled { form, outcome } => {
            let panel = state.panel_mut(form);
            panel.in_flight = panel.in_flight.saturating_sub(1);
            if let Err(message) = &outcome {
                effects.push(Effect::LogFailure {
                    form,
                    message: message.clone(),
                });
            }
            apply_outcome(panel, outcome.as_ref().map_err(String::as_str));
        }
        Event::PressReleased(form) => {
            state.panel_mut(form).pressed = false;
        }
    }

    (state, effects)
}

/// Flip the theme based on the current root state and ask for it to be
/// persisted.
fn toggle_theme(state: &mut UiState, effects: &mut Vec<Effect>) {
    let next = state.theme.toggled();
    state.set_theme(next);
    effects.push(Effect::PersistTheme(next));
}

/// Write a settled prediction into a form panel.
///
/// Success sets the result text and re-renders the probabilities; failure
/// only sets the result text.
pub fn apply_outcome(panel: &mut FormPanel, outcome: Result<&PredictionResponse, &str>) {
    match outcome {
        Ok(response) => {
            panel.failed = false;
            panel.result = Some(render::result_text(response));
            render::render_probabilities(
                &mut panel.probabilities,
                response.probabilities.as_deref(),
            );
        }
        Err(message) => {
            panel.failed = true;
            panel.result = Some(render::failure_text(message));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ready(stored: Option<&str>) -> UiState {
        let (state, effects) = update(
            UiState::default(),
            Event::Ready {
                stored_theme: stored.map(str::to_string),
            },
        );
        assert!(effects.is_empty());
        state
    }

    #[test]
    fn ready_selects_blood_and_restores_theme() {
        let state = ready(Some("dark"));
        assert_eq!(state.visible_form, Some(FormKind::Blood));
        assert_eq!(state.theme, Theme::Dark);
        assert!(state.toggle_checked());

        let state = ready(None);
        assert_eq!(state.theme, Theme::Light);
    }

    #[test]
    fn show_form_each_valid_name() {
        for kind in FormKind::ALL {
            let mut state = ready(None);
            state.local_output_visible = true;
            state.show_form(kind.name());
            let visible: Vec<_> = FormKind::ALL
                .into_iter()
                .filter(|k| state.is_visible(*k))
                .collect();
            assert_eq!(visible, [kind]);
            assert!(!state.local_output_visible);
        }
    }

    #[test]
    fn show_form_unknown_hides_everything() {
        let (state, _) = update(ready(None), Event::SelectForm("kidney".into()));
        assert_eq!(state.visible_form, None);
        let (state, _) = update(state, Event::SelectForm("Blood".into()));
        assert_eq!(state.visible_form, None);
    }

    #[test]
    fn set_theme_is_idempotent() {
        let mut state = ready(None);
        state.set_theme(Theme::Dark);
        let once = state.clone();
        state.set_theme(Theme::Dark);
        assert_eq!(state, once);
    }

    #[test]
    fn toggle_flips_and_persists() {
        let (state, effects) = update(ready(None), Event::ToggleClicked);
        assert_eq!(state.theme, Theme::Dark);
        assert_eq!(effects, [Effect::PersistTheme(Theme::Dark)]);

        let (state, effects) = update(state, Event::ToggleKey("Enter".into()));
        assert_eq!(state.theme, Theme::Light);
        assert_eq!(effects, [Effect::PersistTheme(Theme::Light)]);

        let (state, effects) = update(state, Event::ToggleKey("a".into()));
        assert_eq!(state.theme, Theme::Light);
        assert!(effects.is_empty());
    }

    #[test]
    fn submit_requests_prediction_and_press() {
        let mut state = ready(None);
        for (name, value) in [("gender", "Female"), ("smoke", "1")] {
            state = update(
                state,
                Event::FieldInput {
                    form: FormKind::Cardio,
                    name: name.into(),
                    value: value.into(),
                },
            )
            .0;
        }

        let (state, effects) = update(state, Event::Submit(FormKind::Cardio));
        assert!(state.panel(FormKind::Cardio).pressed);
        assert_eq!(state.panel(FormKind::Cardio).in_flight, 1);

        let Effect::Predict { model_id, payload, .. } = &effects[0] else {
            panic!("expected predict effect, got {effects:?}");
        };
        assert_eq!(*model_id, "best_xgb_model3");
        assert_eq!(serde_json::Value::Object(payload.clone()), json!({"gender": 0, "smoke": 1}));
        assert_eq!(
            effects[1],
            Effect::ReleasePress {
                form: FormKind::Cardio,
                after: Duration::from_millis(150)
            }
        );

        let (state, _) = update(state, Event::PressReleased(FormKind::Cardio));
        assert!(!state.panel(FormKind::Cardio).pressed);
    }

    #[test]
    fn success_renders_result_and_probabilities() {
        let response = PredictionResponse::with_result(1).with_probabilities(vec![0.823, 0.177]);
        let (state, effects) = update(
            ready(None),
            Event::PredictionSettled {
                form: FormKind::Blood,
                outcome: Ok(response),
            },
        );
        assert!(effects.is_empty());
        let panel = state.panel(FormKind::Blood);
        assert_eq!(panel.result.as_deref(), Some("1"));
        assert_eq!(panel.probabilities.entries(), ["Class 0: 82.3%", "Class 1: 17.7%"]);
    }

    #[test]
    fn failure_keeps_probabilities_and_logs() {
        let ok = PredictionResponse::with_result("yes").with_probabilities(vec![0.4, 0.6]);
        let (state, _) = update(
            ready(None),
            Event::PredictionSettled {
                form: FormKind::Liver,
                outcome: Ok(ok),
            },
        );
        let (state, effects) = update(
            state,
            Event::PredictionSettled {
                form: FormKind::Liver,
                outcome: Err("Server error: 500 model error".into()),
            },
        );

        let panel = state.panel(FormKind::Liver);
        assert_eq!(
            panel.result.as_deref(),
            Some("Prediction failed: Server error: 500 model error")
        );
        assert_eq!(panel.probabilities.entries(), ["Class 0: 40.0%", "Class 1: 60.0%"]);
        assert_eq!(
            effects,
            [Effect::LogFailure {
                form: FormKind::Liver,
                message: "Server error: 500 model error".into()
            }]
        );
    }

    #[test]
    fn settling_one_form_leaves_others_untouched() {
        let (state, _) = update(
            ready(None),
            Event::PredictionSettled {
                form: FormKind::Diabetes,
                outcome: Err("boom".into()),
            },
        );
        for kind in [FormKind::Blood, FormKind::Cardio, FormKind::Liver] {
            assert_eq!(state.panel(kind), &FormPanel::default());
        }
    }

    #[test]
    fn failed_flag_follows_the_outcome_not_the_text() {
        let label = PredictionResponse::with_result("Prediction failed: retest advised");
        let (state, _) = update(
            ready(None),
            Event::PredictionSettled {
                form: FormKind::Blood,
                outcome: Ok(label),
            },
        );
        let panel = state.panel(FormKind::Blood);
        assert_eq!(panel.result.as_deref(), Some("Prediction failed: retest advised"));
        assert!(!panel.failed);

        let (state, _) = update(
            state,
            Event::PredictionSettled {
                form: FormKind::Blood,
                outcome: Err("timeout".into()),
            },
        );
        assert!(state.panel(FormKind::Blood).failed);

        let (state, _) = update(
            state,
            Event::PredictionSettled {
                form: FormKind::Blood,
                outcome: Ok(PredictionResponse::with_result(0)),
            },
        );
        assert!(!state.panel(FormKind::Blood).failed);
    }
}
