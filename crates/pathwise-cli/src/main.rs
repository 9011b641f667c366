//! pathwise — rank candidate genes for a target by pathway selectivity and
//! network propagation.

mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pathwise", version, about = "Pathway selectivity and network propagation ranking")]
struct Cli {
    /// Config file (default: ./pathwise.toml when present)
    #[arg(long, short, env = config::CONFIG_ENV, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: config::Overrides,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pathwise=info,warn")),
        )
        .init();

    let cli = Cli::parse();
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut pipeline_config = config::load(cli.config.as_deref())?;
    cli.overrides.apply(&mut pipeline_config);

    let target = pipeline_config.inputs.target.clone().unwrap_or_default();
    let outcome = pathwise_ranker::run_from_config(&pipeline_config)
        .with_context(|| format!("ranking genes for target '{target}'"))?;

    let s = &outcome.summary;
    info!(
        target = %s.target,
        n_records = s.n_records,
        n_disease_pathways = s.n_disease_pathways,
        n_target_pathways = s.n_target_pathways,
        converged = ?s.converged,
        "Done"
    );
    Ok(())
}
