//! Interactive session: the form page in a terminal.
//!
//! Commands are read line by line on a background thread and handed to the
//! main loop over a channel. The main loop polls that channel with a short
//! timeout and pumps the controller runtime in between, so predictions that
//! settle while the user is typing are shown as soon as they arrive.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::client::PredictClient;
use crate::config::MedformConfig;
use crate::controller::runtime::Runtime;
use crate::controller::{Event, view};
use crate::form::{self, FormKind};
use crate::storage;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A parsed session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show(String),
    Set { name: String, value: String },
    Unset(String),
    Clear,
    Fields,
    Payload,
    Submit,
    Toggle,
    Key(String),
    View,
    Help,
    Quit,
}

/// Parse one input line. Empty lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb {
        "show" | "select" => {
            if rest.is_empty() {
                anyhow::bail!("usage: show <form>");
            }
            Command::Show(rest.to_string())
        }
        "set" => {
            let (name, value) = rest
                .split_once('=')
                .context("usage: set <field>=<value>")?;
            let name = name.trim();
            if name.is_empty() {
                anyhow::bail!("usage: set <field>=<value>");
            }
            Command::Set {
                name: name.to_string(),
                value: value.to_string(),
            }
        }
        "unset" => {
            if rest.is_empty() {
                anyhow::bail!("usage: unset <field>");
            }
            Command::Unset(rest.to_string())
        }
        "clear" => Command::Clear,
        "fields" => Command::Fields,
        "payload" => Command::Payload,
        "submit" | "predict" => Command::Submit,
        "toggle" | "theme" => Command::Toggle,
        "key" => Command::Key(key_name(rest)),
        "view" | "v" => Command::View,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => anyhow::bail!("unknown command '{other}' (try 'help')"),
    };
    Ok(Some(command))
}

/// Key names as typed by a user, mapped to DOM `key` values.
fn key_name(raw: &str) -> String {
    match raw.to_ascii_lowercase().as_str() {
        "space" | "" => " ".to_string(),
        "enter" | "return" => "Enter".to_string(),
        "spacebar" => "Spacebar".to_string(),
        _ => raw.to_string(),
    }
}

const HELP: &str = "\
Commands:
  show <form>          select blood, diabetes, cardio or liver
  set <field>=<value>  set an input of the visible form
  unset <field>        remove an input
  clear                remove every input of the visible form
  fields               list the visible form's catalog fields
  payload              show the coerced request body
  submit               request a prediction
  toggle               flip light/dark theme
  key <name>           press a key on the theme toggle (space, enter, ...)
  view                 redraw the page
  help                 this text
  quit                 leave";

/// Run the session until `quit` or end of input.
pub fn run(config: &MedformConfig) -> Result<()> {
    let storage = storage::open(config);
    let client = PredictClient::from_config(&config.backend);
    println!("{} {}", "Backend:".dimmed(), client.base_url());

    let mut runtime = Runtime::new(Arc::new(client), storage, config.logging.clone());
    runtime.start();
    print!("{}", view::render(runtime.state()));

    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = io::stdin().lock();
        for line in stdin.lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    drive(&mut runtime, &rx)
}

/// Feed input lines to the runtime until `quit` or end of input.
///
/// At end of input, outstanding predictions and timers are waited for and
/// the final view is printed, so piped sessions still show their results.
fn drive(runtime: &mut Runtime, lines: &Receiver<String>) -> Result<()> {
    prompt()?;
    loop {
        match lines.recv_timeout(POLL_INTERVAL) {
            Ok(line) => {
                match parse_command(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => {
                        if let Err(e) = execute(runtime, command) {
                            eprintln!("{} {e:#}", "error:".red());
                        }
                    }
                    Ok(None) => {}
                    Err(e) => eprintln!("{} {e:#}", "error:".red()),
                }
                prompt()?;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                if runtime.pending() > 0 {
                    runtime.run_until_idle();
                    println!();
                    print!("{}", view::render(runtime.state()));
                }
                break;
            }
        }

        if runtime.pump() > 0 {
            println!();
            print!("{}", view::render(runtime.state()));
            prompt()?;
        }
    }

    Ok(())
}

fn prompt() -> Result<()> {
    print!("{} ", ">".cyan().bold());
    io::stdout().flush().context("failed to flush stdout")
}

fn visible(runtime: &Runtime) -> Result<FormKind> {
    runtime
        .state()
        .visible_form
        .context("no form selected (use 'show <form>')")
}

/// Apply one command to the runtime and print what changed.
pub fn execute(runtime: &mut Runtime, command: Command) -> Result<()> {
    match command {
        Command::Show(name) => {
            runtime.dispatch(Event::SelectForm(name));
            print!("{}", view::render(runtime.state()));
        }
        Command::Set { name, value } => {
            let form = visible(runtime)?;
            runtime.dispatch(Event::FieldInput { form, name, value });
        }
        Command::Unset(name) => {
            let form = visible(runtime)?;
            runtime.dispatch(Event::FieldRemoved { form, name });
        }
        Command::Clear => {
            let form = visible(runtime)?;
            let names: Vec<String> = runtime
                .state()
                .panel(form)
                .draft
                .iter()
                .map(|(name, _)| name.to_string())
                .collect();
            for name in names {
                runtime.dispatch(Event::FieldRemoved { form, name });
            }
        }
        Command::Fields => {
            let form = visible(runtime)?;
            println!("{} {}", form.title().bold(), form.model_id().dimmed());
            for field in form.fields() {
                println!("  {:<28} {}", field.name, field.label.dimmed());
            }
            println!("  {} {}", "coercion:".dimmed(), form.coercion_summary());
        }
        Command::Payload => {
            let form = visible(runtime)?;
            let payload = form::coerce(form, &runtime.state().panel(form).draft);
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Command::Submit => {
            let form = visible(runtime)?;
            runtime.dispatch(Event::Submit(form));
            println!("{}", format!("sent to {}", form.model_id()).dimmed());
        }
        Command::Toggle => {
            runtime.dispatch(Event::ToggleClicked);
            println!("theme: {}", runtime.state().theme);
        }
        Command::Key(key) => {
            let before = runtime.state().theme;
            runtime.dispatch(Event::ToggleKey(key));
            if runtime.state().theme != before {
                println!("theme: {}", runtime.state().theme);
            }
        }
        Command::View => print!("{}", view::render(runtime.state())),
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
