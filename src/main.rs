use anyhow::Result;
use clap::{Parser, Subcommand};

use medform::form::FormKind;
use medform::{cli, config, session, web};

#[derive(Debug, Parser)]
#[command(name = "medform")]
#[command(about = "Medical prediction forms for a model-serving backend")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Submit one form and print the rendered result
    Predict {
        /// Form to submit: blood, diabetes, cardio or liver
        form: FormKind,
        /// Field value as name=value (repeatable, order is kept)
        #[arg(short = 'f', long = "field")]
        fields: Vec<String>,
        /// Print the coerced request without sending it
        #[arg(long)]
        dry_run: bool,
        /// Print JSON instead of the rendered panel
        #[arg(long)]
        json: bool,
    },
    /// Interactive form session in the terminal
    Session,
    /// List the forms, their models and fields
    Forms {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List the models the backend serves
    Models,
    /// Show or change the stored theme
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
    /// Show past predictions
    History {
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
        /// Number of recent predictions to list
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Check backend reachability, config, storage and logs
    Health,
    /// Serve the forms as a local web page
    Web {
        /// Listen address (default from config: 127.0.0.1:9747)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ThemeAction {
    /// Print the stored theme
    Show,
    /// Flip between light and dark
    Toggle,
    /// Store a theme: light or dark
    Set { mode: String },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write the default config to ~/.medform/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set one dotted key, e.g. backend.url
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Predict {
            form,
            fields,
            dry_run,
            json,
        } => cli::run_predict(form, &fields, dry_run, json),
        Commands::Session => session::run(&config::load()),
        Commands::Forms { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_forms(fmt)
        }
        Commands::Models => cli::run_models(),
        Commands::Theme { action } => match action {
            ThemeAction::Show => cli::run_theme_show(),
            ThemeAction::Toggle => cli::run_theme_toggle(),
            ThemeAction::Set { mode } => cli::run_theme_set(&mode),
        },
        Commands::History {
            days,
            limit,
            format,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_history(fmt, days, limit)
        }
        Commands::Health => cli::run_health(),
        Commands::Web { addr } => {
            let cfg = config::load();
            let addr = addr.unwrap_or_else(|| cfg.web.addr.clone());
            web::serve(&cfg, &addr)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
