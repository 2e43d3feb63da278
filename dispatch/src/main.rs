mod config;
mod observability;

use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError};
use observability::MetricsInitError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dispatch", version, about = "Balanced dispatch article service")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run the dispatch API and admin listeners
    Run(ConfigArgs),
    /// Load and validate a config file, then exit
    Validate(ConfigArgs),
    /// Print the metrics emitted by this service
    Metrics,
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long, env = "DISPATCH_CONFIG")]
    config_file: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid config: {0}")]
    Validation(#[from] api::config::ValidationError),
    #[error(transparent)]
    Metrics(#[from] MetricsInitError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Api(#[from] api::errors::ApiError),
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        CliCommand::Run(args) => run(args),
        CliCommand::Validate(args) => {
            let config = Config::from_file(&args.config_file)?;
            config.dispatch.validate()?;
            println!("{}: ok", args.config_file.display());
            Ok(())
        }
        CliCommand::Metrics => {
            let all: Vec<_> = fetcher::metrics_defs::ALL_METRICS
                .iter()
                .chain(api::metrics_defs::ALL_METRICS)
                .copied()
                .collect();
            print!("{}", shared::metrics_defs::describe(&all));
            Ok(())
        }
    }
}

fn run(args: ConfigArgs) -> Result<(), CliError> {
    let config = Config::from_file(&args.config_file)?;

    // Sentry must be initialised before the runtime starts.
    let _sentry_guard = observability::init_logging(config.logging.as_ref());

    if let Some(metrics_config) = &config.metrics {
        observability::init_metrics(metrics_config)?;
    }

    tracing::info!(config_file = %args.config_file.display(), "starting dispatch");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(api::run(config.dispatch))?;
    Ok(())
}
