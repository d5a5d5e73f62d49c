//! review-watch CLI
//!
//! Main entry point: checks the environment, then polls the homework API
//! and relays review status changes to a Telegram chat until killed.

use std::process::ExitCode;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use review_watch::{
    failure_message, Config, EnvCredentials, Notifier, WatchError, Watcher, WatcherStatus,
    DEFAULT_ENDPOINT, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_PERIOD_SECS,
    DEFAULT_TELEGRAM_API,
};
use review_watch_http::{PracticumClient, TelegramNotifier};
use tracing_subscriber::EnvFilter;

/// review-watch - homework review notifier
///
/// Polls the homework status API and sends a Telegram message whenever the
/// review status of the latest homework changes. Requires `PRACTICUM_TOKEN`,
/// `TELEGRAM_TOKEN` and `TELEGRAM_CHAT_ID` in the environment or a `.env` file.
#[derive(Parser, Debug)]
#[command(name = "review-watch")]
#[command(version, about, long_about = None)]
struct Args {
    /// Homework status endpoint
    #[arg(long, env = "REVIEW_WATCH_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Base URL of the Telegram Bot API
    #[arg(long, env = "REVIEW_WATCH_TELEGRAM_API", default_value = DEFAULT_TELEGRAM_API)]
    telegram_api: String,

    /// Seconds to wait between polling cycles
    #[arg(long, value_name = "SECS", env = "REVIEW_WATCH_RETRY_PERIOD", default_value_t = DEFAULT_RETRY_PERIOD_SECS)]
    retry_period: u64,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, value_name = "SECS", env = "REVIEW_WATCH_REQUEST_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout: u64,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before parsing so env-backed flags see its values
    let dotenv = dotenvy::dotenv();

    let parsed = Args::try_parse();
    let verbose = parsed.as_ref().is_ok_and(|args| args.verbose);

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => tracing::debug!("No .env file found"),
        Err(e) => tracing::warn!(error = %e, "Failed to read .env file"),
    }

    let env_credentials = EnvCredentials::from_env();

    let args = match parsed {
        Ok(args) => args,
        Err(e) if is_informational(&e) => e.exit(),
        Err(e) => {
            let error = unparseable_args_error(&e, env_credentials.clone());
            report_startup_failure(
                DEFAULT_TELEGRAM_API,
                DEFAULT_REQUEST_TIMEOUT_SECS,
                &env_credentials,
                &error,
            )
            .await;
            return ExitCode::from(1);
        }
    };

    tracing::info!("review-watch starting");
    tracing::debug!(endpoint = %args.endpoint, "Homework endpoint");
    tracing::debug!(telegram_api = %args.telegram_api, "Bot API");

    let (config, source, notifier) = match startup(&args, env_credentials.clone()) {
        Ok(ready) => ready,
        Err(e) => {
            report_startup_failure(
                &args.telegram_api,
                args.request_timeout,
                &env_credentials,
                &e,
            )
            .await;
            return ExitCode::from(1);
        }
    };

    match run(&config, source, notifier).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Returns `true` for `--help` and `--version`, which clap renders itself.
fn is_informational(error: &clap::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    )
}

/// Turns a rejected command line into a startup error.
///
/// Missing credentials take precedence, the same order `build_config`
/// checks things in.
fn unparseable_args_error(error: &clap::Error, credentials: EnvCredentials) -> WatchError {
    if let Err(missing) = credentials.check() {
        return missing;
    }

    let rendered = error.to_string();
    let message = rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string();
    WatchError::invalid_config(message, "Run review-watch --help to see accepted values")
}

/// Checks the credentials and applies the CLI overrides.
fn build_config(args: &Args, credentials: EnvCredentials) -> Result<Config, WatchError> {
    tracing::info!("Checking required environment variables");
    let credentials = credentials.check()?;
    tracing::info!("Required environment variables are present");

    let config = Config::new(credentials)
        .with_endpoint(args.endpoint.as_str())
        .with_telegram_api(args.telegram_api.as_str())
        .with_retry_period(Duration::from_secs(args.retry_period))
        .with_request_timeout(Duration::from_secs(args.request_timeout));
    config.validate()?;
    Ok(config)
}

/// Builds the configuration and both HTTP clients.
fn startup(
    args: &Args,
    credentials: EnvCredentials,
) -> Result<(Config, PracticumClient, TelegramNotifier), WatchError> {
    let config = build_config(args, credentials)?;
    let source = PracticumClient::from_config(&config)?;
    let notifier = TelegramNotifier::from_config(&config)?;
    Ok((config, source, notifier))
}

/// Logs a startup error and, when the bot token and chat id are available,
/// tries to tell the chat about it. Returns `true` if the report was
/// delivered.
async fn report_startup_failure(
    telegram_api: &str,
    request_timeout_secs: u64,
    credentials: &EnvCredentials,
    error: &WatchError,
) -> bool {
    let severity = if error.is_fatal() { "critical" } else { "error" };
    tracing::error!(
        severity,
        status = %WatcherStatus::Terminated,
        kind = %error.kind(),
        error = %error,
        "Startup check failed"
    );
    eprintln!("Error: {error}");

    let Some((token, chat_id)) = credentials.chat_target() else {
        tracing::debug!("No bot token or chat id, cannot report startup failure to chat");
        return false;
    };

    let timeout = Duration::from_secs(request_timeout_secs.max(1));
    let notifier = match TelegramNotifier::new(telegram_api, token, chat_id, timeout) {
        Ok(notifier) => notifier,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot build notifier to report startup failure");
            return false;
        }
    };

    match notifier.send(&failure_message(error)).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to report startup failure to chat");
            false
        }
    }
}

/// Runs the poll loop until Ctrl+C.
async fn run(
    config: &Config,
    source: PracticumClient,
    notifier: TelegramNotifier,
) -> anyhow::Result<()> {
    tracing::info!(
        endpoint = %source.endpoint(),
        chat_id = %notifier.chat_id(),
        retry_period_secs = config.retry_period.as_secs(),
        request_timeout_secs = config.request_timeout.as_secs(),
        "Configuration loaded"
    );

    let watcher = Watcher::new(config, source, notifier);

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Received Ctrl+C, shutting down");
        }
        never = watcher.run() => match never {},
    }

    Ok(())
}
