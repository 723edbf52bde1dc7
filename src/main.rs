use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use cartsplit_eval::{SplitCriterion, SplitOutcome, SplitSearchConfig, TestMethod};
use cartsplit_io::{ExperimentName, ObservationReader, ObservationSet, ResultWriter};

#[derive(Parser)]
#[command(name = "cartsplit")]
#[command(about = "Best single-threshold regression splits for one predictor")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for permutation tests
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel scoring (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Input selection shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct DataArgs {
    /// Path to the input CSV file (header row required)
    #[arg(long)]
    data: PathBuf,

    /// Header name of the predictor column
    #[arg(long)]
    predictor: String,

    /// Header name of the response column
    #[arg(long)]
    response: String,

    /// Drop rows whose predictor or response is empty or "NA"
    #[arg(long, default_value_t = false)]
    skip_missing: bool,
}

/// Significance-test tuning shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct TestArgs {
    /// Significance test: "welch", "ctree" or "permutation"
    #[arg(long, default_value = "welch")]
    test: String,

    /// Random relabelings per candidate for the permutation test
    #[arg(long, default_value_t = 999)]
    resamples: usize,

    /// Score candidates on the thread pool
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Find the best split under one criterion
    Scan {
        #[command(flatten)]
        input: DataArgs,

        /// Split criterion: "sse" or "significance"
        #[arg(long, default_value = "sse")]
        criterion: String,

        /// Minimum observations per side (defaults to 1 for sse, 2 for significance)
        #[arg(long)]
        min_group_size: Option<usize>,

        #[command(flatten)]
        tests: TestArgs,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+); no files are written without it
        #[arg(long)]
        experiment: Option<String>,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Find the best split under both criteria and report them side by side
    Compare {
        #[command(flatten)]
        input: DataArgs,

        #[command(flatten)]
        tests: TestArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct ScanOutput {
    predictor: String,
    response: String,
    n_observations: usize,
    n_skipped: usize,
    min_group_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    test: Option<TestMethod>,
    best: SplitOutcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    artifacts: Vec<PathBuf>,
}

#[derive(Serialize)]
struct CompareOutput {
    predictor: String,
    response: String,
    n_observations: usize,
    n_skipped: usize,
    test: TestMethod,
    sum_of_squares_error: SplitOutcome,
    significance_test: SplitOutcome,
    same_threshold: bool,
}

fn parse_criterion(s: &str) -> Result<SplitCriterion> {
    match s {
        "sse" => Ok(SplitCriterion::SumOfSquaresError),
        "significance" => Ok(SplitCriterion::SignificanceTest),
        other => anyhow::bail!("unknown criterion: {other} (expected sse or significance)"),
    }
}

fn parse_test(s: &str, resamples: usize, seed: u64) -> Result<TestMethod> {
    match s {
        "welch" => Ok(TestMethod::Welch),
        "ctree" => Ok(TestMethod::ConditionalInference),
        "permutation" => Ok(TestMethod::Permutation {
            n_resamples: resamples,
            seed,
        }),
        other => anyhow::bail!("unknown test: {other} (expected welch, ctree, or permutation)"),
    }
}

fn read_observations(input: &DataArgs) -> Result<ObservationSet> {
    let data = ObservationReader::new(&input.data, &input.predictor, &input.response)
        .with_skip_missing(input.skip_missing)
        .read()
        .context("failed to read input CSV")?;
    info!(
        n_observations = data.n_observations(),
        n_skipped = data.n_skipped(),
        "dataset loaded"
    );
    Ok(data)
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

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Scan {
            input,
            criterion,
            min_group_size,
            tests,
            experiment,
            output_dir,
        } => {
            let criterion = parse_criterion(&criterion)?;
            let test = parse_test(&tests.test, tests.resamples, cli.seed)?;
            // Validate before doing any work
            let experiment_name = experiment.map(ExperimentName::new).transpose()?;

            let data = read_observations(&input)?;

            let mut config = SplitSearchConfig::new(criterion)
                .with_test(test)
                .with_parallel(tests.parallel);
            if let Some(m) = min_group_size {
                config = config.with_min_group_size(m);
            }

            let scan = config
                .scan(data.observations())
                .context("split search failed")?;
            let best = if config.parallel() {
                scan.best_parallel()
            } else {
                scan.best()
            };
            info!(
                threshold = best.threshold,
                score = best.score.value(),
                n_candidates = best.n_candidates,
                "best split found"
            );

            let mut artifacts = Vec::new();
            if let Some(experiment_name) = experiment_name {
                let writer = ResultWriter::new(&output_dir, experiment_name)
                    .context("failed to create output directory")?;
                artifacts.push(
                    writer
                        .write_scan(&data, &scan, &best, Some(test))
                        .context("failed to write split result")?,
                );
                artifacts.push(
                    writer
                        .write_curve(&scan)
                        .context("failed to write score curve")?,
                );
            }

            let output = ScanOutput {
                predictor: input.predictor,
                response: input.response,
                n_observations: data.n_observations(),
                n_skipped: data.n_skipped(),
                min_group_size: config.min_group_size(),
                test: (criterion == SplitCriterion::SignificanceTest).then_some(test),
                best,
                artifacts,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Compare { input, tests } => {
            let test = parse_test(&tests.test, tests.resamples, cli.seed)?;
            let data = read_observations(&input)?;

            let sse = SplitSearchConfig::new(SplitCriterion::SumOfSquaresError)
                .with_parallel(tests.parallel)
                .evaluate(data.observations())
                .context("sum-of-squares-error search failed")?;
            let significance = SplitSearchConfig::new(SplitCriterion::SignificanceTest)
                .with_test(test)
                .with_parallel(tests.parallel)
                .evaluate(data.observations())
                .context("significance-test search failed")?;
            info!(
                sse_threshold = sse.threshold,
                significance_threshold = significance.threshold,
                "criteria compared"
            );

            let output = CompareOutput {
                predictor: input.predictor,
                response: input.response,
                n_observations: data.n_observations(),
                n_skipped: data.n_skipped(),
                test,
                same_threshold: sse.threshold == significance.threshold,
                sum_of_squares_error: sse,
                significance_test: significance,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
