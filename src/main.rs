use anyhow::Result;
use clap::{Parser, Subcommand};
use docktest::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

/// Disposable Docker containers for integration test suites.
#[derive(Parser)]
#[command(name = version::NAME, version = version::VERSION, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Create the preset's container and wait until it is ready
    Up {
        /// Preset id, e.g. "postgresql"
        preset: String,
    },
    /// Stop and remove the preset's container
    Down { preset: String },
    /// Print the container state as JSON
    Status { preset: String },
    /// Run the preset's database reset command
    Reset { preset: String },
}

impl Command {
    fn preset(&self) -> &str {
        match self {
            Command::Up { preset }
            | Command::Down { preset }
            | Command::Status { preset }
            | Command::Reset { preset } => preset,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(version = version::VERSION, command = ?cli.command, "starting");

    let app_config = config::AppConfig::load()?;
    let registry = match &app_config.presets.dir {
        Some(dir) => PresetRegistry::with_dir(dir),
        None => PresetRegistry::new(),
    };
    let defaults = Options::default().start_timeout_secs(app_config.lifecycle.start_timeout_secs);
    let preset = registry.get(cli.command.preset())?.over_defaults(&defaults);

    let engines = EngineSlot::docker(app_config.engine.clone());
    let engine = engines.get().await?;

    let cancel = CancellationToken::new();
    let ctx = Context::with_cancellation(cancel.clone());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received shutdown signal");
            cancel.cancel();
        }
    });

    let result = run(&cli.command, &preset, engine, &ctx).await;
    engines.release().await;
    result
}

async fn run(
    command: &Command,
    preset: &Preset,
    engine: Arc<dyn EngineClient>,
    ctx: &Context,
) -> Result<()> {
    let mut container = preset.as_container(engine.clone());
    match command {
        Command::Up { .. } => {
            container.create_start(ctx).await?;
            tracing::info!(preset = %preset.id(), id = ?container.id(), "container up");
        }
        Command::Down { .. } => {
            container.stop_remove(ctx).await?;
            tracing::info!(preset = %preset.id(), "container down");
        }
        Command::Status { .. } => {
            let ready = match container.has_started(ctx).await {
                Ok(ready) => ready,
                Err(e) if e.is_not_found() => false,
                Err(e) => return Err(e.into()),
            };
            let report = serde_json::json!({
                "preset": preset.id(),
                "name": container.name(),
                "ready": ready,
                "state": container.state(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Reset { .. } => {
            let mut database = preset.as_database_container(engine)?;
            let output = database.reset_database(ctx).await?;
            print!("{}", output.stdout);
            eprint!("{}", output.stderr);
            if let Some(code) = output.exit_code.filter(|c| *c != 0) {
                anyhow::bail!("reset command exited with status {}", code);
            }
        }
    }
    Ok(())
}
