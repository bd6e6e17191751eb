//! desk-runner: headless driver for the risk desk engine.
//!
//! Usage:
//!   desk-runner --seed 12345 --ticks 500 --db run.db
//!   desk-runner --seed 12345 --attack-rate 0.1 --ipc-mode

use anyhow::Result;
use riskdesk_core::{
    advisory::{AdvisoryProvider, HeuristicAdvisor},
    alerts::Alert,
    command::AnalystCommand,
    config::DeskConfig,
    engine::DeskEngine,
    metrics::DashboardMetrics,
    store::SimStore,
    transaction::Transaction,
    types::Tick,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick {
        count: u64,
    },
    Command {
        cmd: AnalystCommand,
    },
    Review {
        transaction_id: String,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState<'a> {
    tick: Tick,
    paused: bool,
    profile_mean: f64,
    profile_std_dev: f64,
    knowledge_base_size: usize,
    metrics: DashboardMetrics,
    alerts: &'a [Alert],
    transactions: &'a [Transaction],
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 500u64);
    let attack_rate = parse_arg(&args, "--attack-rate", 0.05f64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    if !ipc_mode {
        println!("Risk Desk: desk-runner");
        println!("  seed:        {seed}");
        println!("  ticks:       {ticks}");
        println!("  attack rate: {attack_rate}");
        println!("  db:          {db}");
        println!("  data_dir:    {data_dir}");
        println!();
    }

    let config = DeskConfig::load(data_dir)?;
    let store = SimStore::open(db)?;
    store.migrate()?;

    let run_id = format!("run-{seed}-{}", chrono::Utc::now().timestamp());
    let mut engine = DeskEngine::new(run_id.clone(), seed, store, config)?;
    engine.set_attack_rate(attack_rate);

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        engine.run_ticks(ticks)?;
        print_summary(&engine, ticks)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &mut DeskEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();
    let advisor = HeuristicAdvisor;

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Unrecognised IPC line: {e}");
                reply_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Tick { count } => {
                engine.run_ticks(count)?;
                writeln!(stdout, "{}", serde_json::to_string(&build_ui_state(engine))?)?;
            }
            IpcCommand::GetState => {
                writeln!(stdout, "{}", serde_json::to_string(&build_ui_state(engine))?)?;
            }
            IpcCommand::Command { cmd } => {
                if let Err(e) = engine.apply(cmd) {
                    log::warn!("Command rejected: {e}");
                    reply_error(&mut stdout, &e.to_string())?;
                    continue;
                }
                writeln!(stdout, "{}", serde_json::to_string(&build_ui_state(engine))?)?;
            }
            IpcCommand::Review { transaction_id } => {
                match engine.review(&transaction_id, Some(&advisor as &dyn AdvisoryProvider)) {
                    Ok(verdict) => writeln!(stdout, "{}", serde_json::to_string(&verdict)?)?,
                    Err(e) => {
                        reply_error(&mut stdout, &e.to_string())?;
                        continue;
                    }
                }
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn reply_error(stdout: &mut io::Stdout, message: &str) -> Result<()> {
    let err_json = serde_json::json!({ "error": message });
    writeln!(stdout, "{}", err_json)?;
    stdout.flush()?;
    Ok(())
}

fn build_ui_state(engine: &DeskEngine) -> UiState<'_> {
    UiState {
        tick: engine.clock.current_tick,
        paused: engine.clock.paused,
        profile_mean: engine.profile().mean(),
        profile_std_dev: engine.profile().std_dev(),
        knowledge_base_size: engine.knowledge_base().len(),
        metrics: engine.metrics(),
        alerts: engine.alerts(),
        transactions: engine.transactions(),
    }
}

fn print_summary(engine: &DeskEngine, ticks: u64) -> Result<()> {
    let m = engine.metrics();

    println!("=== RUN SUMMARY ===");
    println!("  run_id:          {}", engine.run_id);
    println!("  seed:            {}", engine.rng_bank.master_seed());
    println!("  ticks run:       {ticks}");
    println!("  final tick:      {}", engine.clock.current_tick);
    println!("  system health:   {:?}", m.system_health);
    println!("  transactions:    {} (live window)", m.total_transactions);
    println!("  fraud cases:     {}", m.fraud_cases);
    println!("  pending:         {}", m.pending_cases);
    println!("  detection rate:  {:.1}%", m.detection_rate * 100.0);
    println!(
        "  baseline:        mean ${:.2}, sd ${:.2} over {} amounts",
        engine.profile().mean(),
        engine.profile().std_dev(),
        engine.profile().len()
    );
    println!("  knowledge base:  {} cases", engine.knowledge_base().len());

    println!();
    println!("=== SELF-EVALUATION ===");
    println!("  TP {} | FP {} | FN {} | TN {}",
        m.true_positives, m.false_positives, m.false_negatives, m.true_negatives);
    println!("  precision {:.2} | recall {:.2} | accuracy {:.2} | FPR {:.2} | FNR {:.2}",
        m.precision, m.recall, m.accuracy, m.false_positive_rate, m.false_negative_rate);

    println!();
    println!("=== LATENCY ===");
    println!("  avg: {:.0}ms | max: {:.0}ms | p95: {:.0}ms | p99: {:.0}ms",
        m.avg_response_time_ms, m.max_response_time_ms,
        m.p95_response_time_ms, m.p99_response_time_ms);
    println!("  throughput: {:.2} tx/s", m.throughput_tps);

    println!();
    println!("=== ALERTS ({}) ===", engine.alerts().len());
    if engine.alerts().is_empty() {
        println!("  (none)");
    }
    for alert in engine.alerts().iter().take(5) {
        println!("  [{:?}] {}: {}", alert.severity, alert.title, alert.message);
    }

    let scored = engine.store.event_count(&engine.run_id, "transaction_scored")?;
    println!();
    println!("  events logged: {scored} transaction_scored");
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
