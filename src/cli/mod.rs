//! CLI command implementations for medform.
//!
//! Provides subcommand handlers for:
//! - `medform predict <form> -f k=v ...`: one-shot submission through the controller
//! - `medform forms`: the form catalog
//! - `medform models`: models hosted by the backend
//! - `medform theme show|toggle|set`: the stored theme preference
//! - `medform history`: past predictions from the prediction log
//! - `medform health`: backend, config, storage and log checks
//! - `medform config show|init|set|reset`: configuration management

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::analytics::logger;
use crate::analytics::reporter::{self, HistoryReport};
use crate::client::PredictClient;
use crate::config;
use crate::controller::runtime::Runtime;
use crate::controller::{Event, view};
use crate::form::{self, FieldInput, FormKind, RawFields};
use crate::storage::{self, FileStorage};
use crate::theme::{self, Theme};

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// medform predict
// ---------------------------------------------------------------------------

/// Parse `name=value` arguments into raw fields, keeping argument order.
///
/// Only the first `=` splits; the value may be empty.
pub fn parse_field_args(args: &[String]) -> Result<RawFields> {
    let mut fields = RawFields::new();
    for arg in args {
        let (name, value) = arg
            .split_once('=')
            .with_context(|| format!("expected name=value, got '{arg}'"))?;
        if name.is_empty() {
            anyhow::bail!("empty field name in '{arg}'");
        }
        fields.insert(name, value);
    }
    Ok(fields)
}

/// Submit one form through the controller and print the rendered panel.
pub fn run_predict(form: FormKind, field_args: &[String], dry_run: bool, json: bool) -> Result<()> {
    let cfg = config::load();
    let raw = parse_field_args(field_args)?;
    let client = PredictClient::from_config(&cfg.backend);

    if dry_run {
        let payload = form::coerce(form, &raw);
        if json {
            let value = serde_json::json!({
                "form": form.name(),
                "model_id": form.model_id(),
                "url": client.predict_url(form.model_id()),
                "payload": payload,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            println!("{} {}", "POST".bold(), client.predict_url(form.model_id()));
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        return Ok(());
    }

    let mut runtime = Runtime::new(Arc::new(client), storage::open(&cfg), cfg.logging.clone());
    runtime.start();
    runtime.dispatch(Event::SelectForm(form.name().to_string()));
    for (name, value) in raw.iter() {
        runtime.dispatch(Event::FieldInput {
            form,
            name: name.to_string(),
            value: value.to_string(),
        });
    }
    runtime.dispatch(Event::Submit(form));
    runtime.run_until_idle();

    let panel = runtime.state().panel(form);
    let result = panel.result.clone().unwrap_or_default();
    let failed = panel.failed;

    if json {
        let value = serde_json::json!({
            "form": form.name(),
            "model_id": form.model_id(),
            "payload": form::coerce(form, &panel.draft),
            "result": result,
            "probabilities": panel.probabilities,
            "failed": failed,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", view::render_panel(form, panel));
    }

    if failed {
        anyhow::bail!("prediction for {form} failed");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// medform forms / models
// ---------------------------------------------------------------------------

/// List the four forms, their models and suggested fields.
pub fn run_forms(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let values: Vec<_> = FormKind::ALL
                .into_iter()
                .map(|kind| {
                    serde_json::json!({
                        "name": kind.name(),
                        "title": kind.title(),
                        "model_id": kind.model_id(),
                        "coercion": kind.coercion_summary(),
                        "fields": kind.fields(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        OutputFormat::Csv => {
            println!("form,model_id,field,label,input");
            for kind in FormKind::ALL {
                for field in kind.fields() {
                    let input = match field.input {
                        FieldInput::Number => "number".to_string(),
                        FieldInput::Select { options } => options.join("|"),
                    };
                    println!(
                        "{},{},{},{},{}",
                        kind.name(),
                        kind.model_id(),
                        field.name,
                        field.label,
                        input
                    );
                }
            }
        }
        OutputFormat::Table => {
            for kind in FormKind::ALL {
                println!(
                    "{} {} {}",
                    kind.name().bold().cyan(),
                    kind.title(),
                    format!("-> {}", kind.model_id()).dimmed()
                );
                println!("  {} {}", "coercion:".dimmed(), kind.coercion_summary());
                let names: Vec<&str> = kind.fields().iter().map(|f| f.name).collect();
                println!("  {} {}", "fields:  ".dimmed(), names.join(", "));
                println!();
            }
        }
    }
    Ok(())
}

/// List the models the backend hosts.
pub fn run_models() -> Result<()> {
    let cfg = config::load();
    let client = PredictClient::from_config(&cfg.backend);
    let models = client.list_models()?;

    println!("{} {}", "Backend:".bold(), client.base_url());
    if models.is_empty() {
        println!("{}", "No models reported.".yellow());
        return Ok(());
    }
    for model in &models {
        let used_by: Vec<&str> = FormKind::ALL
            .into_iter()
            .filter(|kind| kind.model_id() == model.as_str())
            .map(FormKind::name)
            .collect();
        if used_by.is_empty() {
            println!("  {model}");
        } else {
            println!("  {model} {}", format!("({})", used_by.join(", ")).dimmed());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// medform theme show | toggle | set
// ---------------------------------------------------------------------------

pub fn run_theme_show() -> Result<()> {
    let cfg = config::load();
    let storage = storage::open(&cfg);
    println!("{}", theme::load_preference(storage.as_ref()));
    Ok(())
}

pub fn run_theme_toggle() -> Result<()> {
    let cfg = config::load();
    let mut storage = storage::open(&cfg);
    let next = theme::load_preference(storage.as_ref()).toggled();
    report_theme_write(next, theme::persist_preference(storage.as_mut(), next));
    Ok(())
}

pub fn run_theme_set(mode: &str) -> Result<()> {
    let next: Theme = mode.parse()?;
    let cfg = config::load();
    let mut storage = storage::open(&cfg);
    report_theme_write(next, theme::persist_preference(storage.as_mut(), next));
    Ok(())
}

fn report_theme_write(theme: Theme, persisted: bool) {
    if persisted {
        println!("{} theme: {}", "✓".green().bold(), theme);
    } else {
        println!(
            "{} theme: {} {}",
            "·".yellow(),
            theme,
            "(storage unavailable, not saved)".dimmed()
        );
    }
}

// ---------------------------------------------------------------------------
// medform history
// ---------------------------------------------------------------------------

/// Show past predictions from the prediction log.
pub fn run_history(format: OutputFormat, days: Option<u32>, limit: usize) -> Result<()> {
    let report = reporter::compute_history(days, limit);

    if report.total == 0 {
        println!(
            "{}",
            "No predictions logged yet. Submit a form to see history.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Csv => print_history_csv(&report),
        OutputFormat::Table => print_history_table(&report),
    }

    Ok(())
}

fn print_history_table(report: &HistoryReport) {
    println!("{}", "medform Prediction History".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();

    println!("  {} {}", "Predictions:".bold(), format_number(report.total));
    println!("  {} {}", "Succeeded:  ".bold(), format_number(report.succeeded));
    println!("  {} {}", "Failed:     ".bold(), format_number(report.failed));
    println!();

    println!("{}", "By Form".bold().cyan());
    println!(
        "  {:<10} {:<18} {:>6} {:>9} {:>10}",
        "Form", "Model", "Count", "Failed", "Avg ms"
    );
    println!("  {}", "-".repeat(58));
    for stat in &report.forms {
        let latency = stat
            .avg_latency_ms
            .map(|ms| format!("{ms:.0}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<10} {:<18} {:>6} {:>8.1}% {:>10}",
            stat.form,
            truncate(&stat.model_id, 18),
            stat.count,
            stat.failure_pct(),
            latency,
        );
    }
    println!();

    println!("{}", "Recent".bold().cyan());
    for (i, entry) in report.recent.iter().enumerate() {
        let line = format!(
            "  {:<25} {:<10} {}",
            truncate(&entry.timestamp, 25),
            entry.form,
            truncate(&entry.result, 48),
        );
        if !entry.success {
            println!("{}", line.red());
        } else if i % 2 == 0 {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_history_csv(report: &HistoryReport) {
    println!("timestamp,form,model_id,success,latency_ms,result");
    for e in &report.recent {
        println!(
            "{},{},{},{},{},\"{}\"",
            e.timestamp,
            e.form,
            e.model_id,
            e.success,
            e.latency_ms.map(|ms| ms.to_string()).unwrap_or_default(),
            e.result.replace('"', "\"\""),
        );
    }
}

// ---------------------------------------------------------------------------
// medform health
// ---------------------------------------------------------------------------

/// Check the backend, config files, local storage and logs.
pub fn run_health() -> Result<()> {
    println!("{}", "medform Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    // 0. Config file status
    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.medform/config.toml found"
        } else {
            "not found (run `medform config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".medform.toml found"
        } else {
            "none (optional)"
        },
    );

    // 1. Backend connectivity
    let client = PredictClient::from_config(&cfg.backend);
    let backend_ok = client.is_reachable();
    let backend_detail = if backend_ok {
        format!("reachable at {}", client.base_url())
    } else {
        format!("not reachable at {} (is the backend running?)", client.base_url())
    };
    print_health_item("Backend", backend_ok, &backend_detail);

    // 2. Local storage
    match FileStorage::from_config(&cfg.storage) {
        Ok(storage) => print_health_item(
            "Local storage",
            true,
            &storage.path().display().to_string(),
        ),
        Err(e) => print_health_item("Local storage", false, &format!("{e:#}")),
    }

    // 3. Prediction log
    let log_exists = logger::prediction_log_path()
        .map(|p| p.exists())
        .unwrap_or(false);
    let log_entries = if log_exists {
        logger::read_all_entries().len()
    } else {
        0
    };
    print_health_item(
        "Prediction log",
        log_exists,
        &if !cfg.logging.predictions_enabled() {
            "disabled".to_string()
        } else if log_exists {
            format!("{} entries", format_number(log_entries))
        } else {
            "no log file yet".to_string()
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// medform config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective medform Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    // Show source info
    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    if global_exists {
        println!("  {} {}", "✓".green(), "~/.medform/config.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            "~/.medform/config.toml (not found)".dimmed()
        );
    }
    if project_exists {
        println!("  {} {}", "✓".green(), ".medform.toml".dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), ".medform.toml (not found)".dimmed());
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "MEDFORM_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.medform/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point medform at your backend.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a number with comma separators for readability.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
