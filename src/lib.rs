// src/lib.rs

pub mod cli;
pub mod collect;
pub mod config;
pub mod errors;
pub mod logging;
pub mod materialize;
pub mod pipeline;
pub mod queue;
pub mod supervisor;
pub mod types;
pub mod workspace;

use std::path::PathBuf;

use serde_json::Map;
use tracing::{error, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::errors::Result;
use crate::pipeline::{AbaqusPipeline, OpenFoamPipeline};
use crate::queue::{JobId, JobQueue, SequentialJobQueue};
use crate::supervisor::RealSolverBackend;
use crate::types::SimulatorKind;
use crate::workspace::JobDescriptor;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading + validation
/// - the local sequential job queue
/// - one pipeline instance per job over the real solver backend
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let jobs = args.jobs.unwrap_or(cfg.settings.jobs);
    let mut queue = SequentialJobQueue::new(jobs);

    drain_queue(&cfg, &mut queue).await?;

    info!(
        finished = queue.finished().len(),
        errored = queue.errored().len(),
        "all jobs processed"
    );
    Ok(())
}

/// Drain every open job from the queue.
///
/// A failed job is marked as an error and the loop moves on; sibling jobs
/// are never aborted by one job's failure.
pub async fn drain_queue<Q: JobQueue>(cfg: &ConfigFile, queue: &mut Q) -> Result<()> {
    loop {
        let Some(job) = queue.get_next_job() else {
            info!("no open jobs left");
            return Ok(());
        };

        info!(job, "starting job");
        match run_one_job(cfg, job).await {
            Ok(()) => {
                info!(job, "job finished");
                queue.mark_finished(job);
            }
            Err(err) => {
                error!(job, error = %err, "job failed");
                queue.mark_error(job);
            }
        }
    }
}

async fn run_one_job(cfg: &ConfigFile, job: JobId) -> Result<()> {
    // Per-design overrides come from the external experiment table; the
    // local queue runs the template parameters as-is.
    let parameters = config::merge(&cfg.parameters, &Map::new());

    match cfg.settings.simulator {
        SimulatorKind::Abaqus => {
            let mut pipeline =
                AbaqusPipeline::from_config(cfg, parameters, RealSolverBackend::new())?;
            let descriptor = JobDescriptor::for_case(format!("case_{job}"));
            let results = pipeline.run(&descriptor).await?;
            info!(job, result_keys = results.len(), "collected results");
        }
        SimulatorKind::Openfoam => {
            let mut pipeline =
                OpenFoamPipeline::from_config(cfg, parameters, job, RealSolverBackend::new())?;
            pipeline.run().await?;
        }
    }

    Ok(())
}

/// Simple dry-run output: print the resolved plan without launching
/// anything.
fn print_dry_run(cfg: &ConfigFile) {
    println!("simherd dry-run");
    println!("  settings.simulator = {:?}", cfg.settings.simulator);
    println!("  settings.platform = {}", cfg.settings.platform);
    println!("  settings.jobs = {}", cfg.settings.jobs);
    if let Some(max_time) = cfg.settings.max_time {
        println!("  settings.max_time = {max_time}s");
    }
    println!();

    match cfg.settings.simulator {
        SimulatorKind::Abaqus => {
            println!("  work root: {}", cfg.folders.main_work_directory.display());
            println!("  job name:  {}", cfg.job.name);
            if let (Some(module), Some(symbol)) =
                (&cfg.folders.sim_module, &cfg.folders.sim_symbol)
            {
                println!("  entry:     {module}::{symbol}");
            }
        }
        SimulatorKind::Openfoam => {
            if let Some(case) = &cfg.case {
                println!("  case: {} -> {}", case.source.display(), case.output.display());
            }
            for (list, stages) in [
                ("preprocess", &cfg.preprocess),
                ("solve", &cfg.solve),
                ("postprocess", &cfg.postprocess),
            ] {
                println!("  {list} ({}):", stages.len());
                for stage in stages {
                    if stage.options.is_empty() {
                        println!("    - {}", stage.tool);
                    } else {
                        println!("    - {} {:?}", stage.tool, stage.options);
                    }
                }
            }
        }
    }
}
