use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::{Commands, RefineArgs};
use probeloop::config::EngineConfig;
use probeloop::demo::{
    self, BandPolicy, BroadenPolicy, Corpus, CorpusEnvironment, HitTargetEvaluator, KeywordPlanner, NarrowPolicy,
    Query, RefineAction, RephrasePolicy,
};
use probeloop::domain::StepLog;
use probeloop::events::LogSink;
use probeloop::ladder::ExplorationLadder;
use probeloop::probe::ProbeSet;
use probeloop::runner::{ExplorationOutcome, HierarchicalOrchestrator, Orchestrator};

fn setup_logging(filter: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("probeloop")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("probeloop.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let mut builder = env_logger::Builder::from_default_env();
    if let Some(filter) = filter {
        builder.parse_filters(filter);
    }
    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &EngineConfig) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Run(args) => handle_run_command(args, config, cli.is_verbose()).await,
        Commands::Explore(args) => handle_explore_command(args, config, cli.is_verbose()).await,
        Commands::Config => handle_config_command(config),
    }
}

fn load_corpus(args: &RefineArgs) -> Result<Arc<Corpus>> {
    if args.min_hits > args.max_hits {
        eyre::bail!("--min-hits ({}) exceeds --max-hits ({})", args.min_hits, args.max_hits);
    }
    let corpus = match &args.corpus {
        Some(path) => Corpus::load(path).context(format!("Failed to load corpus from {}", path.display()))?,
        None => Corpus::sample(),
    };
    if corpus.is_empty() {
        eyre::bail!("Corpus has no documents");
    }
    Ok(Arc::new(corpus))
}

async fn handle_run_command(args: &RefineArgs, config: &EngineConfig, verbose: bool) -> Result<()> {
    info!("Running flat refinement for: {}", args.query);
    let corpus = load_corpus(args)?;

    let mut orchestrator = Orchestrator::new(
        CorpusEnvironment::new(corpus.clone(), &args.query),
        HitTargetEvaluator::for_band(args.min_hits, args.max_hits),
        config.flat_budget(),
    )
    .with_ladder(ExplorationLadder::with_config(config.ladder.clone()))
    .with_policy(RephrasePolicy::sample())
    .with_policy(BroadenPolicy)
    .with_policy(NarrowPolicy::new(corpus.clone()))
    .with_classifier(config.classifier.clone())
    .with_events(Arc::new(LogSink))
    .with_config(config.orchestrator());

    for probe in demo::flat_probes(args.min_hits, args.max_hits) {
        orchestrator = orchestrator.with_probe(probe);
    }
    if let Some(termination) = config.termination() {
        orchestrator = orchestrator.with_termination(termination);
    }

    let report = orchestrator.run().await.context("Flat run failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.logs)?);
        return Ok(());
    }

    if verbose {
        print_logs(&report.logs);
    }
    println!(
        "{} \"{}\" ({} hits) after {} steps, stopped: {}",
        "Final:".green(),
        report.final_state.text(),
        report.final_state.hits,
        report.logs.len(),
        report.stop_reason.to_string().cyan()
    );
    Ok(())
}

async fn handle_explore_command(args: &RefineArgs, config: &EngineConfig, verbose: bool) -> Result<()> {
    info!("Exploring: {}", args.query);
    let corpus = load_corpus(args)?;

    let probes = ProbeSet::with_id("band-checks")
        .with_probe(probeloop::probe::RangeProbe::hit_count(args.min_hits as f64, args.max_hits as f64));

    let mut orchestrator = HierarchicalOrchestrator::new(
        KeywordPlanner::new(corpus.clone()),
        BandPolicy::new(corpus.clone(), args.min_hits, args.max_hits),
        CorpusEnvironment::new(corpus.clone(), &args.query),
        HitTargetEvaluator::for_band(args.min_hits, args.max_hits),
        config.control_budget(),
    )
    .with_probes(probes)
    .with_ladder(ExplorationLadder::with_config(config.ladder.clone()))
    .with_events(Arc::new(LogSink))
    .with_config(config.orchestrator());

    if let Some(termination) = config.termination() {
        orchestrator = orchestrator.with_termination(termination);
    }

    let report = orchestrator.run(&args.query).await.context("Exploration failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.logs)?);
        return Ok(());
    }

    if verbose {
        print_logs(&report.logs);
    }
    match &report.outcome {
        ExplorationOutcome::Resolved(output) => println!("{} {}", "Resolved:".green(), output),
        ExplorationOutcome::Unresolved { reason } => println!("{} {}", "Unresolved:".red(), reason),
    }
    println!(
        "  {} inner steps, {} outer calls, {} replans",
        report.inner_steps, report.outer_loop_calls, report.replans
    );
    Ok(())
}

fn handle_config_command(config: &EngineConfig) -> Result<()> {
    print!("{}", config.to_yaml().context("Failed to render config")?);
    Ok(())
}

fn print_logs(logs: &[StepLog<Query, RefineAction>]) {
    for log in logs {
        let head = format!("[{:>3}] {}/{}", log.t, log.probe_id, log.policy_id);
        match (&log.failure, &log.action, &log.next) {
            (Some(failure), _, _) => {
                println!("{} {} {}", head.dimmed(), failure.category.to_string().red(), failure.reason)
            }
            (None, Some(action), Some(next)) => println!(
                "{} {} -> \"{}\" ({} hits) feedback {:+.2} ladder {:.2}",
                head.dimmed(),
                action.to_string().cyan(),
                next.text(),
                next.hits,
                log.feedback.unwrap_or_default(),
                log.ladder_level
            ),
            _ => println!(
                "{} \"{}\" ({} hits) {}",
                head.dimmed(),
                log.state.text(),
                log.state.hits,
                "stable".green()
            ),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = EngineConfig::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging with the configured level unless RUST_LOG overrides it
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = config.log_filter(rust_log.as_deref());
    setup_logging(filter.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
