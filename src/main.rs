//! diffusion-pipeline: generate one image with live step progress.
//!
//! Runs the synthetic engine on a worker thread while the main thread
//! reports each denoising step, then prints a summary of the result.

use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use diffusion_pipeline::cli::Cli;
use diffusion_pipeline::config::PipelineConfig;
use diffusion_pipeline::engine::{StepProgress, SyntheticEngine};
use diffusion_pipeline::error::PipelineError;
use diffusion_pipeline::generation::Pipeline;

/// How often the main thread checks whether the worker has finished.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        if let Some(hint) = recovery_hint(&e) {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diffusion_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let config = cli.apply(PipelineConfig::from_env());
    config.validate().context("invalid configuration")?;

    let request = cli.request(&config)?;
    let engine = SyntheticEngine::new(config.image_size, config.image_size)
        .with_step_delay(config.step_delay());
    let pipeline = Pipeline::with_max_seed(engine, config.max_seed);

    let progress = pipeline.progress().subscribe();
    let task = pipeline.spawn(request);

    while !task.is_finished() {
        if let Some(step) = progress.recv_timeout(POLL_INTERVAL) {
            report_step(&step);
        }
    }
    for step in progress.drain() {
        report_step(&step);
    }

    let (_pipeline, outcome) = task.join()?;
    let result = outcome.context("generation failed")?;
    let summary = result.summary();

    if cli.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        eprintln!();
        eprintln!("Generation complete!");
        eprintln!("  Seed: {}", summary.seed);
        eprintln!("  Time: {:.2}s", summary.interval_sec);
        eprintln!("  Size: {}x{}", summary.width, summary.height);
    }

    Ok(())
}

/// Returns the recovery hint of the pipeline error behind `err`, if any.
fn recovery_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.downcast_ref::<PipelineError>()
        .map(PipelineError::recovery_hint)
}

/// Prints one progress line to stderr.
fn report_step(step: &StepProgress) {
    eprintln!(
        "Progress: {}/{} steps ({:.0}%, sigma {:.3})",
        step.step,
        step.step_count,
        step.fraction() * 100.0,
        step.sigma
    );
}
