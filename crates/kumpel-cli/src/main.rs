//! Kumpel CLI
//!
//! Interactive German translation trainer. Everything is asked at the
//! prompt; the only environment needed is the Gemini API key.

mod app;
mod prompt;
mod style;
mod terminal;

use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use kumpel_core::{Config, GeminiBackend, KumpelError};
use kumpel_store::StoryStore;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::prompt::StdConsole;

/// Environment variable that turns on debug logging.
const VERBOSE_ENV: &str = "KUMPEL_VERBOSE";

/// Kumpel - learn German by translating short stories
///
/// Generates a story at your level, then asks you to translate it into
/// English sentence by sentence.
#[derive(Parser, Debug)]
#[command(name = "kumpel")]
#[command(version, about, long_about = None)]
struct Args {}

fn main() -> ExitCode {
    let _args = Args::parse();

    // Priority: RUST_LOG env var > KUMPEL_VERBOSE > default (info)
    let default_level = if std::env::var_os(VERBOSE_ENV).is_some() {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let code = runtime.block_on(run());
    // A pending stdin read sits on a blocking thread that never finishes.
    runtime.shutdown_background();
    code
}

/// Runs Kumpel until it finishes, fails or is interrupted.
async fn run() -> ExitCode {
    let mut console = StdConsole::stdio();
    let code = supervise(
        start(&mut console),
        tokio::signal::ctrl_c(),
        &mut std::io::stdout(),
    )
    .await;
    ExitCode::from(code)
}

/// Races `app` against `shutdown` and maps the outcome to an exit code.
///
/// Interrupts and closed input say goodbye on `out` and exit 0.
async fn supervise<A, S, W>(app: A, shutdown: S, out: &mut W) -> u8
where
    A: Future<Output = anyhow::Result<()>>,
    S: Future<Output = std::io::Result<()>>,
    W: Write,
{
    let result = tokio::select! {
        result = app => result,
        Ok(()) = shutdown => {
            tracing::debug!("Received Ctrl+C");
            return farewell(out);
        }
    };

    match result {
        Ok(()) => 0,
        Err(e) => match e.downcast_ref::<KumpelError>() {
            Some(err) if err.is_user_exit() => farewell(out),
            Some(err) => {
                eprintln!("\nError: {err}");
                err.exit_code()
            }
            None => {
                eprintln!("\nError: {e:#}");
                1
            }
        },
    }
}

fn farewell<W: Write>(out: &mut W) -> u8 {
    // Best effort: the terminal may already be gone.
    let _ = writeln!(out, "\n\nGoodbye!");
    let _ = out.flush();
    0
}

/// Loads settings, connects the backend and the story library, and runs the app.
async fn start(console: &mut StdConsole) -> anyhow::Result<()> {
    let config = Config::load()?;
    let api_key = config.api_key()?;

    tracing::debug!(
        database = %config.database_path,
        check_mode = %config.check_mode,
        "Configuration loaded"
    );

    let backend = GeminiBackend::new(api_key, &config.api_base_url, config.request_timeout())
        .context("Failed to set up the Gemini client")?;
    let store = StoryStore::open(Path::new(&config.database_path)).await?;

    App::new(&config, Arc::new(backend), store, console)
        .run()
        .await
}
