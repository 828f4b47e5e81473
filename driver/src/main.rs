use anyhow::Context;
use clap::Parser;
use disturbcore::imagery::PixelStack;
use generator::profile::build_stack_from_config;
use gui_bridge::bridge::GuiBridge;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::{PixelOutcome, Runner};
use workflow::script::ClickScript;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Per-pixel disturbance interval annotation driver")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// JSON pixel stack to annotate (overrides the workflow's stack)
    #[arg(long)]
    stack: Option<PathBuf>,
    /// Directory receiving one `<x>_<y>.csv` per annotated pixel
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Write the synthetic stack to this JSON file and exit
    #[arg(long)]
    export_stack: Option<PathBuf>,
    /// Replay recorded clicks from YAML instead of waiting for the annotator
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Serve pixels to the interactive annotator until the batch completes
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long)]
    bind: Option<SocketAddr>,
}

fn load_stack(config: &WorkflowConfig) -> anyhow::Result<PixelStack> {
    match &config.stack {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("reading pixel stack {}", path.display()))?;
            PixelStack::from_json(&contents)
                .with_context(|| format!("parsing pixel stack {}", path.display()))
        }
        None => build_stack_from_config(&config.generator.clone().unwrap_or_default())
            .context("generating synthetic pixel stack"),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = match &args.workflow {
        Some(path) => {
            WorkflowConfig::load(path)?.with_overrides(args.output_dir, args.stack, args.bind)
        }
        None => {
            WorkflowConfig::from_args(args.output_dir, args.stack).with_overrides(None, None, args.bind)
        }
    };

    let stack = load_stack(&workflow_config)?;

    if let Some(path) = args.export_stack {
        let json = stack.to_json().context("serializing pixel stack")?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("Exported {} pixel(s) to {}", stack.len(), path.display());
        return Ok(());
    }

    fs::create_dir_all(&workflow_config.output_dir).with_context(|| {
        format!(
            "creating output directory {}",
            workflow_config.output_dir.display()
        )
    })?;

    let runner = Arc::new(Runner::new(workflow_config.clone()));

    if let Some(path) = args.replay {
        let script = ClickScript::load(path)?;
        let outcomes = runner.run_batch(&stack, |prepared| Ok(script.annotate(prepared.pixel())))?;
        for outcome in &outcomes {
            match outcome {
                PixelOutcome::Written { path, intervals } => {
                    println!("{} -> {} interval(s)", path.display(), intervals)
                }
                PixelOutcome::Skipped(reason) => println!("skipped: {}", reason),
                PixelOutcome::WriteFailed(reason) => println!("NOT SAVED: {}", reason),
            }
        }
    } else if args.serve {
        let gui_bridge = GuiBridge::new(runner.clone(), stack);
        gui_bridge.serve(workflow_config.bind);
        gui_bridge.publish_status(&format!(
            "Annotator bridge on http://{} (Ctrl+C to stop)...",
            workflow_config.bind
        ));
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            tokio::select! {
                result = signal::ctrl_c() => result.context("awaiting Ctrl+C to exit")?,
                _ = async {
                    while !gui_bridge.is_complete() {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                    }
                } => gui_bridge.publish_status("All pixels annotated."),
            }
            Ok::<(), anyhow::Error>(())
        })?;
    } else {
        for input in &stack.pixels {
            match runner.prepare(input) {
                Ok(prepared) => println!(
                    "{} -> {} point(s), trend {}, colour {}",
                    input.pixel.key(),
                    prepared.series.plot_points().len(),
                    if prepared.trend.is_present() { "yes" } else { "no" },
                    if prepared.colours.is_present() { "yes" } else { "no" },
                ),
                Err(err) => println!("{} -> skipped: {}", input.pixel.key(), err),
            }
        }
        println!("Dry run only; pass --replay or --serve to annotate.");
        return Ok(());
    }

    let metrics = runner.metrics();
    println!(
        "annotated={} intervals={} skipped={} write_failures={}",
        metrics.annotated, metrics.intervals, metrics.skipped, metrics.write_failures
    );
    Ok(())
}
