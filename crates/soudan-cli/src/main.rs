//! soudan CLI: streaming counseling chat in the terminal

use clap::{Parser, Subcommand};
use serde::Serialize;
use soudan_engine::{Config, ConfigError, API_KEY_ENV};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Streaming counseling chat widget for the terminal
#[derive(Parser, Debug)]
#[command(name = "soudan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/soudan/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model to use, overriding the config file
    #[arg(long, global = true)]
    model: Option<String>,

    /// Seconds after the first message before the follow-up prompt
    #[arg(long, global = true)]
    follow_up_secs: Option<u64>,

    /// Color theme (mocha, latte, high-contrast)
    #[arg(long, global = true)]
    theme: Option<String>,

    /// Write diagnostics to this file (filtered by RUST_LOG)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Open the chat (default when no command specified)
    Chat,

    /// Print the resolved configuration and credential status
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        if let Err(e) = init_logging(path) {
            eprintln!("Failed to open log file {}: {e}", path.display());
            std::process::exit(1);
        }
    }

    let config_path = match config_path(&cli) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        None | Some(Commands::Chat) => cmd_chat(&cli, &config_path),
        Some(Commands::Doctor { json }) => cmd_doctor(&cli, &config_path, json),
        Some(Commands::Init { force }) => cmd_init(&config_path, force),
    }
}

/// Send tracing output to `path` only; the terminal belongs to the TUI.
fn init_logging(path: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        )
        .init();
    Ok(())
}

fn config_path(cli: &Cli) -> Result<PathBuf, ConfigError> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Config::default_path(),
    }
}

/// Apply command-line overrides on top of file settings.
fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(model) = &cli.model {
        config.model.clone_from(model);
    }
    if let Some(secs) = cli.follow_up_secs {
        config.follow_up_delay_ms = secs.saturating_mul(1000);
    }
    if let Some(theme) = &cli.theme {
        config.theme.clone_from(theme);
    }
    config
}

fn load_config(cli: &Cli, path: &Path) -> Config {
    match Config::load_or_default(path) {
        Ok(config) => apply_overrides(config, cli).with_env_credential(),
        Err(e) => {
            eprintln!("Failed to load {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

fn cmd_chat(cli: &Cli, path: &Path) {
    let config = load_config(cli, path);
    tracing::info!(model = %config.model, "starting chat");

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(soudan_tui::run_tui(config)) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Resolved settings reported by `doctor`.
#[derive(Debug, Serialize)]
struct DoctorReport {
    version: &'static str,
    config_path: String,
    config_found: bool,
    model: String,
    base_url: String,
    follow_up_delay_ms: u64,
    theme: String,
    credential_env: &'static str,
    credential_present: bool,
}

impl DoctorReport {
    fn new(config: &Config, path: &Path) -> Self {
        Self {
            version: soudan_engine::engine_version(),
            config_path: path.display().to_string(),
            config_found: path.exists(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            follow_up_delay_ms: config.follow_up_delay_ms,
            theme: config.theme.clone(),
            credential_env: API_KEY_ENV,
            credential_present: config.api_key().is_some(),
        }
    }
}

fn cmd_doctor(cli: &Cli, path: &Path, json: bool) {
    let config = load_config(cli, path);
    let report = DoctorReport::new(&config, path);

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("Failed to serialize report: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!("soudan {}\n", report.version);
    let found = if report.config_found { "" } else { " (not found, using defaults)" };
    println!("  Config:    {}{found}", report.config_path);
    println!("  Model:     {}", report.model);
    println!("  Endpoint:  {}", report.base_url);
    println!("  Follow-up: {} s", report.follow_up_delay_ms / 1000);
    println!("  Theme:     {}", report.theme);
    let credential = if report.credential_present { "set" } else { "MISSING" };
    println!("  {}: {credential}", report.credential_env);

    if !report.credential_present {
        println!("\nSet {API_KEY_ENV} to enable the chat.");
    }
}

fn cmd_init(path: &Path, force: bool) {
    if path.exists() && !force {
        println!("Config already exists at {}", path.display());
        println!("Use --force to overwrite it");
        return;
    }

    match Config::default().save(path) {
        Ok(()) => println!("Created {}", path.display()),
        Err(e) => {
            eprintln!("Failed to write config: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_chat() {
        let cli = Cli::try_parse_from(["soudan"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_doctor_json_flag() {
        let cli = Cli::try_parse_from(["soudan", "doctor", "--json"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Doctor { json: true }));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["soudan", "chat", "--model", "gemini-1.5-pro"]).unwrap();
        assert_eq!(cli.model.as_deref(), Some("gemini-1.5-pro"));
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::try_parse_from([
            "soudan",
            "--model",
            "gemini-1.5-flash",
            "--follow-up-secs",
            "30",
            "--theme",
            "latte",
        ])
        .unwrap();

        let config = apply_overrides(Config::default(), &cli);
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.follow_up_delay_ms, 30_000);
        assert_eq!(config.theme, "latte");
    }

    #[test]
    fn test_no_overrides_keeps_file_values() {
        let cli = Cli::try_parse_from(["soudan"]).unwrap();
        let config = apply_overrides(Config::default(), &cli);
        assert_eq!(config.model, Config::default().model);
        assert_eq!(config.follow_up_delay_ms, 180_000);
    }

    #[test]
    fn test_doctor_report_hides_credential() {
        let config = Config {
            api_key: Some("super-secret".into()),
            ..Config::default()
        };
        let report = DoctorReport::new(&config, Path::new("/nonexistent/soudan.json"));
        let json = serde_json::to_string(&report).unwrap();

        assert!(report.credential_present);
        assert!(!report.config_found);
        assert!(!json.contains("super-secret"));
        assert!(json.contains("\"credential_env\":\"GEMINI_API_KEY\""));
    }

    #[test]
    fn test_explicit_config_path() {
        let cli = Cli::try_parse_from(["soudan", "--config", "/tmp/x.json", "init"]).unwrap();
        assert_eq!(config_path(&cli).unwrap(), PathBuf::from("/tmp/x.json"));
        assert_eq!(cli.command, Some(Commands::Init { force: false }));
    }
}
