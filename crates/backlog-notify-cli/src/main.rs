mod actions;
mod report;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use backlog_notify_api::{BacklogClient, DryRunTracker, IssueTracker};
use backlog_notify_core::{Config, Event, Pipeline};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::actions::Actions;

#[derive(Parser)]
#[command(
    name = "backlog-notify",
    version,
    about = "Comment on and resolve Backlog issues referenced by pushes and pull requests"
)]
struct Cli {
    /// Event payload to read instead of $GITHUB_EVENT_PATH
    #[arg(long, value_name = "PATH")]
    event_path: Option<PathBuf>,
    /// Render and log every update without calling Backlog
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    init_tracing();
    actions::install_panic_hook();

    let cli = Cli::parse();
    let mut out = Actions::stdout();
    match execute(&cli, |key| std::env::var(key).ok(), &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = out.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn execute<F, W>(cli: &Cli, lookup: F, out: &mut Actions<W>) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
    W: Write,
{
    let config = Config::from_lookup_with(lookup, cli.event_path.clone())?;
    let pipeline = Pipeline::from_config(&config)?;
    let event = Event::load(&config.event_path)?;
    tracing::debug!(
        kind = event.kind(),
        path = %config.event_path.display(),
        dry_run = cli.dry_run,
        "loaded event"
    );

    let tracker: Box<dyn IssueTracker> = if cli.dry_run {
        Box::new(DryRunTracker)
    } else {
        Box::new(
            BacklogClient::new(&config.api_host, config.api_key.as_str())
                .context("failed to build HTTP client")?,
        )
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let outcome = rt.block_on(backlog_notify_api::run(&pipeline, &event, tracker.as_ref()))?;

    report::write(out, &outcome)?;
    Ok(())
}
