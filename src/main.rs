//! paes - PAES scheduler command line.
//!
//! Reads a workload trace, optimizes its assignment onto a resource pool,
//! and writes the Pareto front plus the final current allocation into an
//! output directory. Ctrl+C stops the search early; results found so far
//! are still written.

use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use u_paes::config::{ExperimentConfig, PaesConfig};
use u_paes::models::{Job, ResourcePool, SchedulingProblem, Workload};
use u_paes::paes::{ArchiveSnapshot, Optimizer, RunSummary, StopReason};
use u_paes::report::ReportWriter;
use u_paes::validation::validate_input;

/// PAES scheduler - trade queue time against price.
#[derive(Debug, Parser)]
#[command(name = "paes")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Workload trace (`id submit run wall size` per line).
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for fronts and reports.
    #[arg(short, long)]
    output: PathBuf,

    /// TOML experiment file with `[paes]` parameters and `[[resources]]`.
    #[arg(short, long, env = "PAES_CONFIG")]
    config: Option<PathBuf>,

    /// Iteration limit.
    #[arg(long)]
    iterations: Option<u64>,

    /// Archive capacity.
    #[arg(long)]
    archive_size: Option<usize>,

    /// Grid bits per objective axis.
    #[arg(long)]
    location_bits: Option<u32>,

    /// Stop once the archive distance is unchanged over this many iterations.
    #[arg(long)]
    stability_interval: Option<u64>,

    /// Checkpoint every this many iterations (0 disables).
    #[arg(long)]
    report_interval: Option<u64>,

    /// RNG seed; drawn from the OS when omitted.
    #[arg(long, env = "PAES_SEED")]
    seed: Option<u64>,

    /// Print the workload and resource pool before optimizing.
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut PaesConfig) {
        if let Some(v) = self.iterations {
            config.max_iterations = v;
        }
        if let Some(v) = self.archive_size {
            config.archive_size = v;
        }
        if let Some(v) = self.location_bits {
            config.location_bits = v;
        }
        if let Some(v) = self.stability_interval {
            config.stability_interval = Some(v);
        }
        if let Some(v) = self.report_interval {
            config.report_interval = v;
        }
        if let Some(v) = self.seed {
            config.seed = Some(v);
        }
    }
}

/// Contents of `summary.json`.
#[derive(Debug, Serialize)]
struct ResultFile<'a> {
    run: &'a RunSummary,
    config: &'a PaesConfig,
    archive: ArchiveSnapshot,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(std::io::stderr).boxed()
    };
    tracing_subscriber::registry().with(filter).with(layer).init();
}

fn load_experiment(cli: &Cli) -> Result<ExperimentConfig> {
    let mut experiment = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            ExperimentConfig::from_toml(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => ExperimentConfig::default(),
    };
    cli.apply_overrides(&mut experiment.paes);
    experiment.paes.validate().context("invalid parameters")?;
    Ok(experiment)
}

fn load_problem(cli: &Cli, experiment: &ExperimentConfig) -> Result<SchedulingProblem> {
    let text = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read workload {}", cli.input.display()))?;
    let workload = Workload::parse_trace(&text)
        .with_context(|| format!("failed to parse workload {}", cli.input.display()))?;

    let specs = experiment.resource_specs();
    let jobs: Vec<Job> = workload.jobs().copied().collect();
    if let Err(errors) = validate_input(&jobs, &specs) {
        for e in &errors {
            error!(kind = ?e.kind, "{}", e.message);
        }
        bail!("experiment input failed validation with {} error(s)", errors.len());
    }

    let pool = ResourcePool::from_specs(&specs).context("failed to build resource pool")?;
    Ok(SchedulingProblem::new(workload, pool)?)
}

fn write_checkpoint(dir: &Path, optimizer: &Optimizer) -> Result<()> {
    let progress = optimizer.progress();
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("progress.jsonl"))
        .context("failed to open progress.jsonl")?;
    writeln!(file, "{}", serde_json::to_string(&progress)?)?;

    let title = format!("Pareto front (checkpoint at iteration {})", progress.iteration);
    ReportWriter::front(&title, &optimizer.archive().front()).write_to(dir.join("front.txt"))?;
    Ok(())
}

fn write_results(dir: &Path, optimizer: &Optimizer, summary: &RunSummary) -> Result<()> {
    let problem = optimizer.problem();
    let (absolute, relative) =
        ReportWriter::front_pair(optimizer.archive(), problem.workload(), summary);
    absolute
        .write_to(dir.join("front.txt"))
        .context("failed to write front.txt")?;
    relative
        .write_to(dir.join("front-relative.txt"))
        .context("failed to write front-relative.txt")?;

    let mut allocation = ReportWriter::new();
    allocation.add_header_line(optimizer.current().summary());
    allocation.add_block(&optimizer.current().allocation_table());
    allocation
        .write_to(dir.join("current-allocation.txt"))
        .context("failed to write current-allocation.txt")?;

    let result = ResultFile {
        run: summary,
        config: optimizer.config(),
        archive: optimizer.snapshot(),
    };
    fs::write(dir.join("summary.json"), serde_json::to_string_pretty(&result)?)
        .context("failed to write summary.json")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let experiment = load_experiment(&cli)?;
    let problem = load_problem(&cli, &experiment)?;
    info!(input = %cli.input.display(), problem = %problem.summary(), "workload loaded");
    if cli.verbose {
        println!("{}", problem.workload().summary());
        println!("{}", problem.pool().summary());
    }

    fs::create_dir_all(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_signal = stop.clone();
    ctrlc::set_handler(move || {
        stop_signal.store(true, Ordering::SeqCst);
    })
    .context("failed to install Ctrl+C handler")?;

    let report_interval = experiment.paes.report_interval;
    let mut optimizer = Optimizer::new(problem, experiment.paes)?;
    info!(seed = optimizer.seed(), "rerun with --seed to reproduce");

    let summary = optimizer.run_with(|opt| {
        if stop.load(Ordering::SeqCst) {
            return ControlFlow::Break(());
        }
        let iteration = opt.iteration();
        if report_interval > 0 && iteration > 0 && iteration % report_interval == 0 {
            if let Err(e) = write_checkpoint(&cli.output, opt) {
                warn!(error = %e, iteration, "checkpoint failed");
            }
        }
        ControlFlow::Continue(())
    })?;

    if summary.stop_reason == StopReason::Interrupted {
        warn!(iterations = summary.iterations, "interrupted, writing results found so far");
    }
    write_results(&cli.output, &optimizer, &summary)?;
    info!(output = %cli.output.display(), archive_size = summary.archive_size, "results written");
    Ok(())
}
