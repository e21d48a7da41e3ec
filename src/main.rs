use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use relaysense_io::{ExperimentName, ResultWriter};
use relaysense_rf::SplitCriterion;

mod pipeline;

use pipeline::PipelineConfig;

#[derive(Parser)]
#[command(name = "relaysense")]
#[command(about = "Random forest relay-state classification from sensor readings")]
#[command(version)]
struct Cli {
    /// Path to the sensor CSV file
    #[arg(long, default_value = "synthetic_sensor_data.csv")]
    data: PathBuf,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,

    /// Number of trees in the Random Forest
    #[arg(long, default_value_t = 100)]
    n_trees: usize,

    /// RNG seed for the split and the forest
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Maximum tree depth (unlimited if not set)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Impurity measure used to choose splits
    #[arg(long, value_enum, default_value_t = CriterionArg::Gini)]
    criterion: CriterionArg,

    /// Also write `{experiment}_evaluate.json` into this directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
    #[arg(long, default_value = "relay")]
    experiment: String,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Enable verbose (debug-level) logging
    #[arg(long)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CriterionArg {
    Gini,
    Entropy,
}

impl From<CriterionArg> for SplitCriterion {
    fn from(arg: CriterionArg) -> Self {
        match arg {
            CriterionArg::Gini => SplitCriterion::Gini,
            CriterionArg::Entropy => SplitCriterion::Entropy,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    // Validate before doing any work.
    let writer = cli
        .output_dir
        .as_deref()
        .map(|dir| -> Result<ResultWriter> {
            let experiment = ExperimentName::new(cli.experiment.clone())?;
            ResultWriter::new(dir, experiment).context("failed to prepare output directory")
        })
        .transpose()?;

    let config = PipelineConfig {
        data: cli.data,
        test_size: cli.test_size,
        n_trees: cli.n_trees,
        seed: cli.seed,
        max_depth: cli.max_depth,
        criterion: cli.criterion.into(),
    };
    let evaluation = pipeline::run(&config)?;

    for feature in &evaluation.importances {
        info!(
            rank = feature.rank,
            name = %feature.name,
            importance = feature.importance,
            "feature importance"
        );
    }

    print!("{}", pipeline::render(&evaluation));

    if let Some(writer) = writer {
        let path = evaluation.write_artifact(&writer)?;
        info!(path = %path.display(), "evaluation artifact written");
    }

    Ok(())
}
