//! SD-WAN Orchestrator - Entry Point
//!
//! Runs one build-out phase across the router fleet and prints the phase
//! result as JSON on stdout.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;
use sdwan_models::{PhaseName, PhaseResult};
use tracing::{error, info};

use sdwan_orchestrator::app::options::{AppOptions, BackendOptions};
use sdwan_orchestrator::app::run::run;
use sdwan_orchestrator::filesys::file::File;
use sdwan_orchestrator::logs::{init_logging, LogLevel, LogOptions};
use sdwan_orchestrator::storage::settings::Settings;
use sdwan_orchestrator::utils::{truncate, version_info};
use sdwan_orchestrator::verify::format_report;

const DEFAULT_SETTINGS_FILE: &str = "settings.json";

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        let version = version_info();
        println!(
            "{}",
            serde_json::to_string_pretty(&version).unwrap_or_else(|_| version.version.clone())
        );
        return ExitCode::SUCCESS;
    }

    if cli_args.contains_key("help") || !cli_args.contains_key("phase") {
        print_usage();
        return if cli_args.contains_key("help") {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(2)
        };
    }

    match execute(&cli_args).await {
        Ok(result) => {
            print_summary(&result);
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    error!("Failed to serialize phase result: {}", e);
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let reason = truncate(&format!("{:#}", e), 256);
            error!("Phase failed: {}", reason);
            eprintln!("{} {}", "error:".red().bold(), reason);
            println!("{}", serde_json::json!({ "error": reason }));
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli_args: &HashMap<String, String>) -> anyhow::Result<PhaseResult> {
    let phase: PhaseName = cli_args
        .get("phase")
        .map(String::as_str)
        .unwrap_or_default()
        .parse()
        .map_err(anyhow::Error::msg)?;

    // Retrieve the settings file
    let settings_path = cli_args
        .get("settings")
        .cloned()
        .unwrap_or_else(|| DEFAULT_SETTINGS_FILE.to_string());
    let settings = Settings::load(&settings_path)
        .await
        .with_context(|| format!("reading settings from {}", settings_path))?;

    // Initialize logging
    let log_level = match cli_args.get("log-level") {
        Some(level) => level.parse::<LogLevel>().map_err(anyhow::Error::msg)?,
        None => settings.log_level,
    };
    let log_options = LogOptions {
        log_level,
        json_format: settings.json_logs,
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }
    if !File::new(&settings_path).exists().await {
        info!("No settings at {}, using defaults", settings_path);
    }

    let event = match cli_args.get("event") {
        Some(path) => File::new(path)
            .read_json::<serde_json::Value>()
            .await
            .with_context(|| format!("reading input event from {}", path))?,
        None => serde_json::Value::Null,
    };

    let topology = settings.topology().context("validating topology")?;

    let backend = BackendOptions {
        dry_run: cli_args.contains_key("dry-run"),
        params_file: cli_args.get("params").map(PathBuf::from),
        gateway: settings.gateway.clone(),
    };
    let options = AppOptions::from_settings(&settings, backend);

    info!(
        "Running {} (dry_run={}, max_parallel_targets={})",
        phase, options.backend.dry_run, options.run.max_parallel_targets
    );
    let result = run(phase, event, topology, options).await?;
    Ok(result)
}

fn print_summary(result: &PhaseResult) {
    if result.phase == PhaseName::Verify {
        eprintln!("{}\n", format_report(result));
    }

    for (router, outcome) in &result.results {
        let status = outcome.result.status.to_string();
        let status = if outcome.result.status.is_success() {
            status.green()
        } else {
            status.red()
        };
        eprintln!("  {:<14} {}", router, status);
    }

    let line = format!(
        "{}: {}/{} routers succeeded",
        result.phase,
        result.success_count,
        result.total()
    );
    if result.fail_count == 0 {
        eprintln!("{}", line.green().bold());
    } else {
        eprintln!("{}", line.yellow().bold());
    }
}

fn print_usage() {
    eprintln!(
        "{}\n\n  sdwan-orchestrator --phase=<phase1|phase2|phase3|phase4> [options]\n\n\
         Options:\n  \
         --settings=<path>   settings JSON (default: {})\n  \
         --params=<path>     serve directory parameters from a JSON file\n  \
         --event=<path>      input event JSON passed from the previous phase\n  \
         --log-level=<lvl>   override the configured log level\n  \
         --dry-run           record payloads instead of executing them\n  \
         --version           print version information",
        "SD-WAN Orchestrator".bold(),
        DEFAULT_SETTINGS_FILE
    );
}
