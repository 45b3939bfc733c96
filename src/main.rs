use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use eyre::{Result, WrapErr};
use log::{LevelFilter, error, info, warn};

mod cli;

use cli::Cli;
use ytsum::config::{self, Config};
use ytsum::server::{self, AppState};
use ytsum::summarize::{DEFAULT_API_BASE, DEFAULT_MAX_CHARS, DEFAULT_MODEL, GroqClient, Summarizer};
use ytsum::youtube::{InnerTube, TranscriptFetcher};

fn setup_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level).parse_default_env();

    if let Some(path) = log_file {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(path)?);
        builder.target(env_logger::Target::Pipe(target));
    }

    builder.init();

    if let Some(path) = log_file {
        info!("Logging initialized: {}", path.display());
    }
    Ok(())
}

fn build_after_help() -> String {
    let key_line = match config::api_key() {
        Some(_) => format!("  \x1b[32m✅\x1b[0m {}", config::API_KEY_VAR),
        None => format!(
            "  \x1b[31m❌\x1b[0m {}  (not set, /summarize will answer 500)",
            config::API_KEY_VAR
        ),
    };

    format!(
        "\nCREDENTIALS:\n{key_line}\n\nConfig is read from: {}",
        config::config_path().display()
    )
}

fn load_config(cli: &Cli) -> Config {
    let result = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    // Non-fatal: fall back to defaults
    result.unwrap_or_else(|e| {
        warn!("Ignoring invalid config file: {e}");
        Config::default()
    })
}

/// Build the summarizer when a credential is present; `None` means degraded mode
fn build_summarizer(api_key: Option<&str>, config: &Config, model: String) -> Option<Summarizer<GroqClient>> {
    let Some(api_key) = api_key else {
        warn!(
            "Warning: {} not set. Summarization will not work.",
            config::API_KEY_VAR
        );
        return None;
    };

    let client = match reqwest::Client::builder().build() {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to initialize Groq client: {e}");
            return None;
        }
    };

    let backend = GroqClient::new(client, api_key)
        .with_base_url(config.api_base.as_deref().unwrap_or(DEFAULT_API_BASE));
    info!("Summarization model: {model}");
    Some(Summarizer::new(backend, model).with_max_chars(config.max_chars.unwrap_or(DEFAULT_MAX_CHARS)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {e}");
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Populate the environment from .env before anything reads it
    let _ = dotenvy::dotenv();

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    setup_logging(cli.verbose, cli.log_file.as_deref())?;

    // Load config file (non-fatal if missing/invalid)
    let config = load_config(&cli);

    // Apply config defaults (CLI flags take priority)
    let host = cli
        .host
        .clone()
        .or_else(|| config.host.clone())
        .unwrap_or_else(|| config::DEFAULT_HOST.to_string());
    let host: IpAddr = host
        .parse()
        .wrap_err_with(|| format!("invalid listen address: {host}"))?;
    let port = cli.port.or(config.port).unwrap_or(config::DEFAULT_PORT);
    let model = cli
        .model
        .clone()
        .or_else(|| config.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let api_key = config::api_key();
    let summarizer = build_summarizer(api_key.as_deref(), &config, model);

    let transcripts = TranscriptFetcher::new(
        InnerTube::new(reqwest::Client::new()),
        config.languages(),
        config.fallback_languages(),
    );

    let state = AppState::new(transcripts, summarizer, api_key.is_some());
    let app = server::router(state);

    let addr = SocketAddr::new(host, port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("binding to {addr}"))?;
    info!("API server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("running API server")?;

    Ok(())
}
