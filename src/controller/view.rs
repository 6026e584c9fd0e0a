//! Terminal rendering of [`UiState`].
//!
//! Used by the interactive session and by `medform predict`. The plain
//! layout functions return strings; colour is applied with `colored` and
//! disappears when the terminal does not support it.

use colored::Colorize;

use crate::form::{FieldInput, FormKind};
use crate::theme::Theme;

use super::{FormPanel, UiState};

/// Full screen: header, tab strip and the visible form.
pub fn render(state: &UiState) -> String {
    let mut out = String::new();
    out.push_str(&header(state.theme));
    out.push('\n');
    out.push_str(&tabs(state));
    out.push('\n');

    match state.visible_form {
        Some(form) => out.push_str(&render_panel(form, state.panel(form))),
        None => out.push_str(&format!("  {}\n", "(no form selected)".dimmed())),
    }
    out
}

fn header(theme: Theme) -> String {
    let toggle = match theme {
        Theme::Light => "[ ] dark mode",
        Theme::Dark => "[x] dark mode",
    };
    format!("{}   {}\n", "medform".bold().cyan(), toggle.dimmed())
}

/// One tab per form; the visible one is highlighted.
fn tabs(state: &UiState) -> String {
    let labels: Vec<String> = FormKind::ALL
        .into_iter()
        .map(|kind| {
            let busy = if state.panel(kind).in_flight > 0 { "*" } else { "" };
            let label = format!(" {}{busy} ", kind.name());
            if state.is_visible(kind) {
                label.reversed().bold().to_string()
            } else {
                label
            }
        })
        .collect();
    format!("  {}\n", labels.join("|"))
}

/// One form container: its inputs, submit control and output regions.
pub fn render_panel(form: FormKind, panel: &FormPanel) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "  {} ({})\n",
        form.title().bold(),
        form.model_id().dimmed()
    ));

    for field in form.fields() {
        let value = panel.draft.get(field.name).unwrap_or("");
        let hint = match field.input {
            FieldInput::Number => String::new(),
            FieldInput::Select { options } => format!("  [{}]", options.join("/")),
        };
        out.push_str(&format!(
            "    {:<28} {:<12}{}\n",
            field.label,
            value,
            hint.dimmed()
        ));
    }

    // Drafted fields outside the catalog are submitted too.
    for (name, value) in panel.draft.iter() {
        if !form.fields().iter().any(|f| f.name == name) {
            out.push_str(&format!("    {:<28} {}\n", name.italic(), value));
        }
    }

    let button = if panel.pressed {
        "[ Predict ]".reversed().to_string()
    } else {
        "[ Predict ]".to_string()
    };
    out.push_str(&format!("\n    {button}\n"));

    out.push_str(&format!("\n  {}: ", form.result_region_id().dimmed()));
    match &panel.result {
        Some(text) if panel.failed => {
            out.push_str(&text.red().to_string())
        }
        Some(text) => out.push_str(&text.green().bold().to_string()),
        None if panel.in_flight > 0 => out.push_str(&"waiting...".yellow().to_string()),
        None => {}
    }
    out.push('\n');

    if !panel.probabilities.is_empty() {
        out.push_str(&format!("  {}:\n", form.probabilities_region_id().dimmed()));
        for entry in panel.probabilities.entries() {
            out.push_str(&format!("    - {entry}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::PredictionResponse;
    use crate::controller::apply_outcome;

    #[test]
    fn panel_shows_result_and_probabilities() {
        colored::control::set_override(false);
        let mut panel = FormPanel::default();
        panel.draft.insert("Recency", "2");
        panel.draft.insert("extra", "x");
        let response = PredictionResponse::with_result(1).with_probabilities(vec![0.5, 0.5]);
        apply_outcome(&mut panel, Ok(&response));

        let text = render_panel(FormKind::Blood, &panel);
        assert!(text.contains("best_xgb_model2"));
        assert!(text.contains("blood-result: 1"));
        assert!(text.contains("- Class 1: 50.0%"));
        assert!(text.contains("extra"));
    }

    #[test]
    fn nothing_selected() {
        colored::control::set_override(false);
        let text = render(&UiState::default());
        assert!(text.contains("(no form selected)"));
        assert!(text.contains("[ ] dark mode"));
    }
}
