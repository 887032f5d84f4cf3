//! apidash - multi-API dashboard
//!
//! A CLI that pulls a superhero, NASA's picture of the day, a GIF and a
//! movie from four public APIs at once and renders them as cards.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad arguments, config, output file, etc.)
//!   2 - Every dashboard slot failed, a single-service query failed, or a
//!       connection check failed

mod cli;
mod config;
mod dashboard;
mod models;
mod panels;
mod report;
mod sources;

use anyhow::{Context, Result};
use cli::{Args, Command, OutputFormat};
use config::{Config, CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use models::{DashboardKind, KeyStatus};
use panels::PanelQuery;
use sources::ApiClient;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if args.command == Command::InitConfig {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("apidash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args.command);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("apidash failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .apidash.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Add your Superhero, GIPHY and TMDB keys under [keys].");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch the command. Returns the exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let format = OutputFormat::from_config(&config.general.format);
    let output = args.output.as_deref();

    if args.command == Command::Status {
        let status = KeyStatus {
            configured: config.keys.configured(),
            missing: config.keys.missing(),
        };
        let rendered = match format {
            OutputFormat::Json => report::generate_json(&status)?,
            OutputFormat::Markdown => report::generate_markdown_status(&status),
        };
        report::write_output(&rendered, output)?;
        return Ok(0);
    }

    let missing = config.keys.missing();
    if !missing.is_empty() {
        let names: Vec<_> = missing.iter().map(|s| s.label()).collect();
        warn!("No API key for: {}", names.join(", "));
    }

    let client = ApiClient::new(
        config.endpoints.clone(),
        config.keys.clone(),
        config.http.timeout_seconds,
    )
    .context("Failed to create HTTP client")?;

    let progress = config.general.progress;

    match args.command {
        Command::Random => {
            let tasks = dashboard::random_tasks(&client, &mut rand::thread_rng());
            let dash = with_spinner(
                progress,
                "Creating multi-API dashboard...",
                dashboard::build(&client, DashboardKind::Random, tasks),
            )
            .await;
            emit_dashboard(&dash, format, output)
        }
        Command::Themed { theme } => {
            let theme = theme.trim().to_string();
            let tasks = dashboard::themed_tasks(&client, &theme);
            let message = format!("Creating {}-themed dashboard...", theme);
            let dash = with_spinner(
                progress,
                &message,
                dashboard::build(&client, DashboardKind::Themed(theme), tasks),
            )
            .await;
            emit_dashboard(&dash, format, output)
        }
        Command::Check => {
            let checks = with_spinner(
                progress,
                "Testing API connections...",
                dashboard::check(&client),
            )
            .await;
            let rendered = match format {
                OutputFormat::Json => report::generate_json(&checks)?,
                OutputFormat::Markdown => report::generate_markdown_checks(&checks),
            };
            report::write_output(&rendered, output)?;

            Ok(if checks.iter().all(|c| c.ok) { 0 } else { 2 })
        }
        command @ (Command::Hero { .. }
        | Command::Space { .. }
        | Command::Gifs { .. }
        | Command::Movies { .. }) => {
            let Some(query) = PanelQuery::from_command(&command, &mut rand::thread_rng()) else {
                return Ok(0);
            };
            let message = format!("Fetching {}...", query);
            match with_spinner(progress, &message, panels::run(&client, query)).await {
                Ok(panel) => {
                    let rendered = match format {
                        OutputFormat::Json => report::generate_json(&panel)?,
                        OutputFormat::Markdown => report::generate_markdown_panel(&panel),
                    };
                    report::write_output(&rendered, output)?;
                    Ok(0)
                }
                Err(e) => {
                    error!("Query failed ({:?} fault): {}", e.fault(), e);
                    eprintln!("\n⛔ {}", e);
                    Ok(2)
                }
            }
        }
        Command::Status | Command::InitConfig => Ok(0),
    }
}

/// Render and write a dashboard. Exit code 2 when nothing loaded.
fn emit_dashboard(
    dash: &models::Dashboard,
    format: OutputFormat,
    output: Option<&std::path::Path>,
) -> Result<i32> {
    let rendered = match format {
        OutputFormat::Json => report::generate_json(dash)?,
        OutputFormat::Markdown => report::generate_markdown_dashboard(dash),
    };
    report::write_output(&rendered, output)?;

    if let Some(path) = output {
        eprintln!("✅ Dashboard saved to: {}", path.display());
    }

    if !dash.cards.is_empty() && dash.loaded() == 0 {
        eprintln!("\n⛔ Every source failed. Check your API keys with `apidash check`.");
        return Ok(2);
    }

    Ok(0)
}

/// Show a spinner on stderr while `fut` runs.
async fn with_spinner<F: Future>(enabled: bool, message: &str, fut: F) -> F::Output {
    if !enabled {
        return fut.await;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = fut.await;

    spinner.finish_and_clear();
    result
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
