mod commands;
mod logging;
mod progress;

use std::collections::BTreeMap;
use std::process;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use docsort_core::config::TransferMode;
use docsort_core::{AppConfig, Catalog, SortEngine, SystemRole};
use dotenv::dotenv;
use progress::CliReporter;
use tracing::{error, info};

fn main() -> Result<()> {
    dotenv().ok();

    let args = Cli::parse();

    let _guard = logging::init_logger(args.verbose);

    let mut config = match docsort_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    match args.command {
        Some(Commands::Process {
            source,
            output,
            dry_run,
            move_files,
            alphabetical,
        }) => {
            override_paths(&mut config, source, output);
            config.dry_run |= dry_run;
            config.alphabetical_view |= alphabetical;
            if move_files {
                config.transfer_mode = TransferMode::Move;
            }
            run_process(config)?;
        }
        Some(Commands::Classify { source }) => {
            override_paths(&mut config, source, None);
            run_classify(config)?;
        }
        Some(Commands::Alphabetical { output, dry_run }) => {
            override_paths(&mut config, None, output);
            config.dry_run |= dry_run;
            let stats = SortEngine::new(config)?.build_alphabetical_view()?;
            info!(
                "{} copied, {} already present, {} renamed, {} failed",
                format!("{}", stats.placed).green(),
                format!("{}", stats.already_placed).cyan(),
                format!("{}", stats.renamed).yellow(),
                format!("{}", stats.failed).red(),
            );
        }
        Some(Commands::Flatten { output, dry_run }) => {
            override_paths(&mut config, None, output);
            config.dry_run |= dry_run;
            let stats = SortEngine::new(config)?.flatten()?;
            info!(
                "{} moved, {} renamed, {} directories removed, {} failed",
                format!("{}", stats.moved).green(),
                format!("{}", stats.renamed).yellow(),
                format!("{}", stats.removed_dirs).cyan(),
                format!("{}", stats.failed).red(),
            );
        }
        Some(Commands::ListSystems) => {
            list_systems(&config)?;
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn override_paths(config: &mut AppConfig, source: Option<String>, output: Option<String>) {
    if let Some(source) = source {
        config.source_dir = source;
    }
    if let Some(output) = output {
        config.output_root = Some(output);
    }
}

fn run_process(config: AppConfig) -> Result<()> {
    let engine = SortEngine::new(config).context("building the classifier")?;
    let reporter = CliReporter::new();
    let result = engine.run(&reporter)?;

    println!();
    info!(
        "Scan: {}, Classify: {}, Recovery: {}, Place: {}",
        format!("{:.2}s", result.scan_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.classify_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.recovery_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.place_duration.as_secs_f64()).green(),
    );
    print_counts(&result.summary.per_system);
    info!(
        "{} of {} documents classified ({})",
        format!("{}", result.summary.classified).green(),
        result.summary.total_documents,
        format!("{:.1}%", result.summary.accuracy_percent).cyan(),
    );
    info!(
        "{} placed, {} already placed, {} renamed, {} failed",
        format!("{}", result.placement.placed).green(),
        format!("{}", result.placement.already_placed).cyan(),
        format!("{}", result.placement.renamed).yellow(),
        format!("{}", result.placement.failed).red(),
    );
    if let Some(alpha) = result.alphabetical {
        info!(
            "Alphabetical view: {} copied, {} already present",
            format!("{}", alpha.placed).green(),
            format!("{}", alpha.already_placed).cyan(),
        );
    }

    Ok(())
}

fn run_classify(config: AppConfig) -> Result<()> {
    let engine = SortEngine::new(config).context("building the classifier")?;
    let reporter = CliReporter::new();
    let outcome = engine.classify_all(&reporter)?;
    let summary = docsort_core::RunSummary::from_results(
        std::path::Path::new(&engine.config().source_dir),
        &outcome.results,
        outcome.passes,
    );

    println!();
    print_counts(&summary.per_system);
    info!(
        "{} of {} documents classified ({})",
        format!("{}", summary.classified).green(),
        summary.total_documents,
        format!("{:.1}%", summary.accuracy_percent).cyan(),
    );
    for (reason, count) in &summary.per_reason {
        info!("{}: {}", reason, format!("{}", count).yellow());
    }

    Ok(())
}

fn print_counts(per_system: &BTreeMap<String, usize>) {
    let mut counts: Vec<(&String, &usize)> = per_system.iter().collect();
    counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (system, count) in counts {
        println!("  {:<24} {}", system.bold(), count.to_string().cyan());
    }
}

fn list_systems(config: &AppConfig) -> Result<()> {
    let catalog = Catalog::with_extra(&config.extra_systems)?;
    for entry in catalog.entries() {
        let role = match entry.role {
            SystemRole::Standard => "".normal(),
            SystemRole::Independent => "independent".green(),
            SystemRole::AccessPortal => "access portal".yellow(),
        };
        println!(
            "  {:<20} tier {} {:<14} {}",
            entry.name.bold(),
            entry.tier,
            role,
            entry.aliases.join(", ").dimmed(),
        );
    }
    println!("{} systems", catalog.len());
    Ok(())
}
