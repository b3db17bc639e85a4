mod app;

use anyhow::{Context, Result};
use clap::Parser;

use app::{Cli, Command, run_check, run_select};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Command::Check { expression, json } => {
            run_check(expression, *json, &mut std::io::stdout().lock())?;
        }
        Command::Select(args) => {
            if let Some(threads) = args.threads {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build_global()
                    .context("CLI: Failed to initialize thread pool")?;
            }

            let start = std::time::Instant::now();
            let count = run_select(args)?;
            tracing::info!(
                "Done! Selected {} records in {:.2}s",
                count,
                start.elapsed().as_secs_f64()
            );
        }
    }

    Ok(())
}
