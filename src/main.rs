use anyhow::Context;
use clap::Parser;
use outreach_gen::{Config, DEFAULT_CONFIG_FILE, LOG_FILE, Pipeline, Settings, ensure_output_dirs};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "outreach-gen",
    version,
    author,
    about = "Generate A/B outreach copy for a list of leads",
    long_about = "Generate personalized A/B outreach copy for a list of leads.\n\n\
    This tool reads a leads CSV, asks a chat-completion backend for two subject/body \
    variants and two follow-ups per lead, validates the copy, and writes exports for \
    sequencing and CRM tools. Without an API key, or with --dry-run, deterministic \
    demo copy is used instead.\n\n\
    USAGE EXAMPLES:\n  \
      # Offline demo run\n  \
      outreach-gen --input leads.csv --out out --campaign \"Seed founders\" --dry-run\n\n  \
      # Live run with custom settings\n  \
      OPENAI_API_KEY=sk-... outreach-gen --input leads.csv --out out --campaign Q3 --config q3.yaml"
)]
struct Cli {
    /// Leads CSV with first_name, last_name, role, company, industry, stage, email
    #[arg(short, long, value_name = "PATH")]
    input: PathBuf,

    /// Output directory for exports and logs
    #[arg(short, long, value_name = "PATH")]
    out: PathBuf,

    /// Campaign name used in the campaign plan
    #[arg(short, long, value_name = "NAME")]
    campaign: String,

    /// Use demo copy instead of calling the backend
    #[arg(long)]
    dry_run: bool,

    /// Settings YAML file [default: config.yaml, built-in defaults if absent]
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_dir = ensure_output_dirs(&cli.out).context("Failed to create output directory")?;
    let _guard = setup_tracing(cli.verbose, &log_dir)?;

    run_logged(cli)
}

/// Runs the batch and records any fatal error in the run log.
fn run_logged(cli: Cli) -> anyhow::Result<()> {
    execute(cli).inspect_err(|err| tracing::error!("{err:#}"))
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    let settings = load_settings(cli.config.as_deref())?;

    let config = Config::builder()
        .input_path(cli.input)
        .output_dir(cli.out)
        .campaign(cli.campaign)
        .dry_run(cli.dry_run)
        .settings(settings)
        .api_key(cli.api_key)
        .build()
        .context("Failed to build configuration")?;

    let stats = Pipeline::new(config)
        .context("Failed to create pipeline")?
        .run()
        .context("Outreach run failed")?;

    stats.print_summary();
    println!("Done");

    Ok(())
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Settings::load(DEFAULT_CONFIG_FILE)
            .with_context(|| format!("Failed to load settings from {DEFAULT_CONFIG_FILE}")),
        None => {
            tracing::warn!("{} not found, using default settings", DEFAULT_CONFIG_FILE);
            Ok(Settings::default())
        }
    }
}

fn setup_tracing(verbosity: u8, log_dir: &Path) -> anyhow::Result<WorkerGuard> {
    let filter = match verbosity {
        0 => EnvFilter::new("outreach_gen=info"),
        1 => EnvFilter::new("outreach_gen=debug"),
        _ => EnvFilter::new("outreach_gen=trace"),
    };

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}
