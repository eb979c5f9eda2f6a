//! Binary entry point for stacksort.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use stacksort::observability::{self, EventBus, FanoutSink, InitOptions, OutcomeSink, TracingSink};
use stacksort::services::{CycleDriver, CycleReport, DriverSettings};
use stacksort::{ConfiguredRegistry, SortConfig, World};

/// Stacksort - routes items into the inventories that already hold them.
#[derive(Parser)]
#[command(name = "stacksort")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "STACKSORT_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the sorting loop until interrupted.
    Run {
        /// World file describing the simulated inventories.
        #[arg(short, long)]
        world: Option<PathBuf>,

        /// Stop after this many cycles.
        #[arg(long)]
        cycles: Option<u64>,

        /// Ring the terminal bell on fallback and no-fallback outcomes.
        #[arg(long)]
        bell: bool,
    },

    /// Run a single cycle and print its report.
    Once {
        /// World file describing the simulated inventories.
        #[arg(short, long)]
        world: Option<PathBuf>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration.
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    let expose_metrics = matches!(cli.command, Commands::Run { .. });
    let _observability = match observability::init_from_config(
        &config.observability,
        InitOptions {
            verbose: cli.verbose,
            metrics_expose: expose_metrics,
        },
    ) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    match run_command(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Loads configuration and applies environment and CLI overrides.
fn load_config(cli: &Cli) -> anyhow::Result<SortConfig> {
    let config = match &cli.config {
        Some(path) => SortConfig::load_from_file(path)?,
        None => SortConfig::load_default(),
    };
    let mut config = config.with_env_overrides();

    if let Commands::Run {
        world: Some(world), ..
    }
    | Commands::Once {
        world: Some(world), ..
    } = &cli.command
    {
        config = config.with_world(world);
    }

    config.validate()?;
    Ok(config)
}

/// Runs the selected command.
async fn run_command(command: Commands, config: SortConfig) -> anyhow::Result<()> {
    match command {
        Commands::Run { cycles, bell, .. } => cmd_run(&config, cycles, bell).await,
        Commands::Once { json, .. } => cmd_once(&config, json).await,
        Commands::Config => {
            cmd_config(&config);
            Ok(())
        },
    }
}

/// Builds the driver over the configured world.
fn build_driver(config: &SortConfig, sink: Arc<dyn OutcomeSink>) -> anyhow::Result<CycleDriver> {
    let Some(world_path) = config.world.as_deref() else {
        bail!("no world file configured; pass --world or set `world` in the config file");
    };
    let world = World::load_from_file(world_path)?;
    let registry = ConfiguredRegistry::from_world(config, &world);
    let driver = CycleDriver::new(Arc::new(registry), DriverSettings::from(config), sink)
        .context("source inventory is required")?;
    Ok(driver)
}

/// Run command.
async fn cmd_run(config: &SortConfig, cycles: Option<u64>, bell: bool) -> anyhow::Result<()> {
    let bus = EventBus::default();
    let sink = FanoutSink::new()
        .with(Arc::new(TracingSink::new()))
        .with(Arc::new(bus.clone()));
    let driver = build_driver(config, Arc::new(sink))?;

    if bell {
        let mut alerts = bus.subscribe_alerts();
        tokio::spawn(async move {
            while alerts.recv().await.is_ok() {
                let mut stderr = std::io::stderr();
                let _ = stderr.write_all(b"\x07");
                let _ = stderr.flush();
            }
        });
    }

    tracing::info!(
        source = %config.source,
        fallback = ?config.fallback,
        batch_size = config.batch_size,
        loop_delay = ?config.loop_delay,
        "Starting sorting loop"
    );

    match cycles {
        Some(n) => {
            let reports = driver.run_cycles(n).await;
            let moved: u64 = reports.iter().map(|r| r.units_moved).sum();
            println!("Completed {} cycles, moved {moved} units", reports.len());
        },
        None => {
            let completed = driver
                .run_until(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "Could not listen for Ctrl-C");
                        std::future::pending::<()>().await;
                    }
                })
                .await;
            println!("Stopped after {completed} cycles");
        },
    }
    Ok(())
}

/// Once command.
async fn cmd_once(config: &SortConfig, json: bool) -> anyhow::Result<()> {
    let driver = build_driver(config, Arc::new(TracingSink::new()))?;
    let report = driver.run_cycle(1).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &CycleReport) {
    if !report.source_listed {
        println!("Source inventory could not be listed; nothing was moved.");
        return;
    }
    println!("Cycle {} ({} snapshot waves)", report.cycle, report.waves);
    println!("  slots:          {}", report.slots);
    println!("  ok:             {}", report.delivered);
    println!("  full:           {}", report.full);
    println!("  fallback:       {}", report.fallback);
    println!("  fallback full:  {}", report.fallback_full);
    println!("  no fallback:    {}", report.no_fallback);
    println!("  unreadable:     {}", report.unreadable);
    println!("  units moved:    {}", report.units_moved);
}

/// Config command.
fn cmd_config(config: &SortConfig) {
    println!("Stacksort Configuration");
    println!("=======================");
    println!("Source:       {}", config.source);
    println!(
        "Fallback:     {}",
        config.fallback.as_deref().unwrap_or("(none)")
    );
    println!("Batch size:   {}", config.batch_size);
    println!("Loop delay:   {}ms", config.loop_delay.as_millis());
    println!(
        "World:        {}",
        config
            .world
            .as_ref()
            .map_or_else(|| "(none)".to_string(), |p| p.display().to_string())
    );
    let names = config.destinations.names();
    println!("Destinations: {}", names.len());
    for name in names {
        println!("  - {name}");
    }
}
