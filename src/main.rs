//! CLI entry point for holdup.

mod cli;

use clap::Parser;
use holdup::bridge::run_feedback_session;
use holdup::command::LocalRunner;
use holdup::config::ConfigStore;
use holdup::envelope::FeedbackRequest;
use holdup::schedule;
use holdup::server::ToolServer;
use holdup::surface::TerminalSurface;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    init_tracing();

    let store = match &args.config {
        Some(path) => ConfigStore::open(path),
        None => match ConfigStore::open_default() {
            Ok(store) => store,
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
    };
    let timeout = resolve_timeout(args.timeout_seconds);

    match args.command.unwrap_or(cli::Command::Serve) {
        cli::Command::Serve => {
            let server = ToolServer::new(
                store,
                Arc::new(TerminalSurface::new()),
                Arc::new(LocalRunner),
                timeout,
            );
            if let Err(e) = server.serve_stdio().await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        cli::Command::Ask {
            project_directory,
            summary,
            task_id,
            command,
            output_file,
        } => {
            let mut request =
                FeedbackRequest::new(project_directory, summary, task_id).with_timeout(timeout);
            if let Some(command) = command {
                request = request.with_command(command);
            }
            let surface = TerminalSurface::new();
            let response =
                match run_feedback_session(request, &store, &surface, Some(Arc::new(LocalRunner)))
                    .await
                {
                    Ok(response) => response,
                    Err(e) => {
                        eprintln!("error: {e}");
                        std::process::exit(1);
                    }
                };
            let json = match serde_json::to_string_pretty(&response) {
                Ok(json) => json,
                Err(e) => {
                    eprintln!("error: failed to serialize response: {e}");
                    std::process::exit(1);
                }
            };
            match output_file {
                Some(path) => {
                    if let Err(e) = std::fs::write(&path, json) {
                        eprintln!("error: failed to write {path}: {e}");
                        std::process::exit(1);
                    }
                }
                None => println!("{json}"),
            }
        }
    }
}

/// CLI override wins; otherwise the env-resolved default applies.
fn resolve_timeout(flag: Option<u64>) -> Duration {
    match flag {
        Some(secs) if secs > 0 => Duration::from_secs(secs),
        Some(_) => {
            eprintln!("warning: --timeout-seconds must be positive; using the default");
            schedule::default_timeout()
        }
        None => schedule::default_timeout(),
    }
}

/// Logs go to stderr only; stdout is reserved for the JSON-RPC wire.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
