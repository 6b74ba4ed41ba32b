//! `admitctl`: wires `adm-config`'s CLI surface to the run controller.

use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use adm_config::{validate_policy_params, Cli, PolicyParams, RuntimeConfig};
use adm_core::controller::{Controller, RunOutcome};
use adm_core::exit_codes::exit_code_for;
use adm_core::local_server::{LocalScenarioFile, LocalServerClient};
use adm_core::log::EventLog;
use adm_core::model::Constraint;
use adm_core::reconstruct::reconstruct;
use adm_core::server::{HttpServerClient, ServerClient};
use adm_common::GameId;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn default_log_path(cli: &Cli) -> std::path::PathBuf {
    cli.log_json.clone().unwrap_or_else(|| std::path::PathBuf::from("admitctl-events.ndjson"))
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let params = PolicyParams::resolve(
        cli.policy,
        cli.alpha,
        cli.risk_margin,
        cli.warmup,
        cli.window_size,
        cli.min_observations,
        cli.gate_top_k,
        cli.corr_aware,
        cli.corr_beta,
    );
    if let Err(e) = validate_policy_params(&params) {
        eprintln!("invalid configuration: {e}");
        return ExitCode::from(1);
    }

    let runtime = RuntimeConfig::from_cli(&cli);
    // No external cancellation source is wired up yet; the flag exists so
    // embedders (tests, a future signal handler) have a seam to flip.
    let cancel: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
    let log_path = default_log_path(&cli);

    let outcome = if let Some(scenario_path) = &cli.scenario {
        let file = match std::fs::File::open(scenario_path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("failed to open scenario file {}: {e}", scenario_path.display());
                return ExitCode::from(1);
            }
        };
        let mut local_scenario: LocalScenarioFile = match serde_json::from_reader(file) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("failed to parse scenario file {}: {e}", scenario_path.display());
                return ExitCode::from(1);
            }
        };
        if let Some(capacity) = cli.capacity {
            local_scenario.capacity = capacity;
        }
        let game_id = GameId::new(cli.game_id.clone().unwrap_or_else(|| "local".to_string()));
        let server = LocalServerClient::new(local_scenario, game_id, cli.start_index);
        run(&server, &cli, &runtime, &params, &cancel, &log_path)
    } else {
        let server = HttpServerClient::new(runtime.base_url.clone(), Duration::from_millis(runtime.timeout_ms));
        run(&server, &cli, &runtime, &params, &cancel, &log_path)
    };

    report_and_exit(cli.output, outcome)
}

/// Drives one run to completion against whichever `ServerClient` the
/// caller selected (live HTTP or a local scenario file), from either a
/// fresh start or a reconstructed resume point.
fn run<S: ServerClient>(
    server: &S,
    cli: &Cli,
    runtime: &RuntimeConfig,
    params: &PolicyParams,
    cancel: &AtomicBool,
    log_path: &std::path::Path,
) -> RunOutcome {
    if let Some(resume_path) = &cli.resume_from_log {
        match reconstruct(resume_path, params) {
            Ok(reconstructed) => {
                let log = EventLog::append_to(log_path);
                let controller = Controller::new(
                    server,
                    &log,
                    runtime.player_id.clone(),
                    runtime.retries,
                    cli.progress_interval,
                    cli.log_interval,
                    cancel,
                );
                controller.run_resumed(
                    reconstructed.game_id,
                    reconstructed.scenario,
                    reconstructed.accounting,
                    reconstructed.policy,
                    reconstructed.next_index,
                    reconstructed.last_decision,
                    params,
                )
            }
            Err(e) => RunOutcome::Failed { reason: format!("failed to reconstruct from {}: {e}", resume_path.display()) },
        }
    } else {
        let log = match EventLog::create(log_path) {
            Ok(log) => log,
            Err(e) => {
                return RunOutcome::Failed { reason: format!("failed to create event log at {}: {e}", log_path.display()) }
            }
        };
        let controller = Controller::new(
            server,
            &log,
            runtime.player_id.clone(),
            runtime.retries,
            cli.progress_interval,
            cli.log_interval,
            cancel,
        );
        let constraints: Vec<Constraint> = vec![];
        controller.run_fresh(cli.capacity.unwrap_or(0), &constraints, params)
    }
}

fn report_and_exit(output: adm_common::OutputFormat, outcome: RunOutcome) -> ExitCode {
    match output {
        adm_common::OutputFormat::Json => {
            println!("{}", serde_json::to_string(&outcome_summary(&outcome)).unwrap_or_default());
        }
        adm_common::OutputFormat::Human => {
            println!("{}", human_summary(&outcome));
        }
    }

    ExitCode::from(exit_code_for(&outcome) as u8)
}

fn outcome_summary(outcome: &adm_core::RunOutcome) -> serde_json::Value {
    use adm_core::RunOutcome::*;
    match outcome {
        Completed { admitted, rejected } => {
            serde_json::json!({ "status": "completed", "admitted": admitted, "rejected": rejected })
        }
        Failed { reason } => serde_json::json!({ "status": "failed", "reason": reason }),
        Cancelled => serde_json::json!({ "status": "cancelled" }),
    }
}

fn human_summary(outcome: &adm_core::RunOutcome) -> String {
    use adm_core::RunOutcome::*;
    match outcome {
        Completed { admitted, rejected } => format!("completed: admitted={admitted} rejected={rejected}"),
        Failed { reason } => format!("failed: {reason}"),
        Cancelled => "cancelled".to_string(),
    }
}
