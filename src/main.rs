//! Celereum Liquid Staking - pool ledger tooling
//!
//! Usage:
//!   celereum-lst --help

use std::sync::Arc;

use celereum_liquid_staking::{
    apply_bps, AccountId, AdminCap, Address, AuditLog, InMemoryReceiptToken, ProtocolConfig,
    ReceiptToken, StakingPool, WorkerId, BPS_DENOMINATOR, CELEREUM_LST_VERSION, CELERS_PER_CEL,
    RATE_SCALE,
};
use celereum_liquid_staking::rebalance::{PERFORMANCE_WEIGHT, UPTIME_WEIGHT};
use celereum_liquid_staking::validators::{MAX_PERFORMANCE_SCORE, MAX_UPTIME_PERCENT};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Depositors driven by the simulator
const SIM_DEPOSITORS: usize = 8;

/// Epochs between reward harvests in the simulator
const SIM_HARVEST_EVERY: u64 = 5;

#[derive(Parser)]
#[command(name = "celereum-lst")]
#[command(author = "Celereum Team")]
#[command(version = CELEREUM_LST_VERSION)]
#[command(about = "Celereum liquid staking pool ledger", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default protocol config
    Config {
        /// Output file path
        #[arg(short, long, default_value = "celereum-lst.json")]
        output: String,
    },

    /// Run a deterministic pool simulation
    Simulate {
        /// Protocol config file (defaults when omitted)
        #[arg(short, long)]
        config: Option<String>,

        /// Number of workers
        #[arg(short, long, default_value = "10")]
        workers: usize,

        /// Number of epochs
        #[arg(short, long, default_value = "20")]
        epochs: u64,

        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },

    /// Show version and constants
    Info,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    match cli.command {
        Commands::Config { output } => {
            if let Err(e) = ProtocolConfig::default().save(&output) {
                error!("Failed to write config: {}", e);
                std::process::exit(1);
            }
            println!("Default config written to {}", output);
        }
        Commands::Simulate { config, workers, epochs, seed } => {
            if let Err(e) = run_simulation(config, workers, epochs, seed) {
                error!("Simulation failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Info => {
            show_info();
        }
    }
}

fn show_info() {
    println!();
    println!("Celereum Liquid Staking");
    println!("=======================");
    println!();
    println!("Version:            {}", CELEREUM_LST_VERSION);
    println!("Celers/CEL:         {}", CELERS_PER_CEL);
    println!("Rate scale:         {}", RATE_SCALE);
    println!("Basis points:       {}", BPS_DENOMINATOR);
    println!("Max score:          {}", MAX_PERFORMANCE_SCORE);
    println!("Max uptime:         {}%", MAX_UPTIME_PERCENT);
    println!(
        "Score weighting:    {}% performance / {}% uptime",
        PERFORMANCE_WEIGHT, UPTIME_WEIGHT
    );
    println!();
    println!("Commands:");
    println!("  config    - Write the default protocol config");
    println!("  simulate  - Run a deterministic pool simulation");
    println!("  info      - Show this screen");
    println!();
}

fn format_rate(rate: u64) -> String {
    format!("{:.9}", rate as f64 / RATE_SCALE as f64)
}

fn run_simulation(
    config_path: Option<String>,
    worker_count: usize,
    epochs: u64,
    seed: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => ProtocolConfig::load(&path)?,
        None => ProtocolConfig::default(),
    };

    info!("Starting simulation: {} workers, {} epochs, seed {}", worker_count, epochs, seed);

    let cap = AdminCap::generate();
    let log = Arc::new(AuditLog::new());
    let pool = StakingPool::new(&config, &cap, log.clone())?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut token = InMemoryReceiptToken::new();

    let workers: Vec<WorkerId> = (0..worker_count)
        .map(|i| Address::from_seed(format!("worker-{}", i).as_bytes()))
        .collect();
    for (i, id) in workers.iter().enumerate() {
        let commission = rng.gen_range(0..=1_000);
        if let Err(e) = pool.registry.add_worker(&cap, *id, format!("worker-{}", i), commission) {
            warn!("Worker {} not registered: {}", id, e);
        }
    }

    let depositors: Vec<AccountId> = (0..SIM_DEPOSITORS)
        .map(|i| Address::from_seed(format!("depositor-{}", i).as_bytes()))
        .collect();

    for epoch in 1..=epochs {
        for depositor in &depositors {
            if rng.gen_bool(0.5) {
                let amount = rng.gen_range(1..=100) * CELERS_PER_CEL;
                if let Err(e) = pool.vault.deposit(amount, depositor, &mut token) {
                    warn!("Deposit from {} failed: {}", depositor, e);
                }
            }
        }

        // keep a tenth of pooled capital liquid for withdrawals
        let pooled = pool.vault.snapshot().pooled_balance;
        pool.delegate_idle(&cap, pooled - pooled / 10)?;

        let reward = apply_bps(pool.vault.snapshot().delegated_capital, rng.gen_range(5..=15));
        if reward > 0 {
            pool.vault.record_rewards(&cap, reward)?;
        }
        if epoch % SIM_HARVEST_EVERY == 0 {
            pool.vault.harvest_rewards(&cap)?;
        }

        for id in &workers {
            let Some(record) = pool.registry.get_worker(id) else {
                continue;
            };
            let score = (record.performance_score as i32 + rng.gen_range(-60..=60))
                .clamp(0, MAX_PERFORMANCE_SCORE as i32) as u16;
            let uptime = (record.uptime_percent as i32 + rng.gen_range(-5..=5))
                .clamp(60, MAX_UPTIME_PERCENT as i32) as u8;
            pool.registry.update_performance(&cap, id, score, uptime)?;
        }

        for id in &workers {
            if rng.gen_bool(0.05) {
                if let Some(outcome) =
                    pool.engine.penalize_worker(&cap, &pool.registry, id, "simulated fault")?
                {
                    info!(
                        "Epoch {}: {} penalized {}%, {} moved",
                        epoch,
                        id,
                        outcome.penalty_percent,
                        outcome.moved()
                    );
                }
            }
        }

        for depositor in &depositors {
            let half = token.balance_of(depositor) / 2;
            if half > 0 && rng.gen_bool(0.2) {
                match pool.vault.withdraw(half, depositor, &mut token) {
                    Ok(payout) => info!("Epoch {}: {} withdrew {}", epoch, depositor, payout),
                    Err(e) => warn!("Epoch {}: withdrawal by {} refused: {}", epoch, depositor, e),
                }
            }
        }

        let operations = pool.advance_epoch(&cap, epoch)?;
        let snapshot = pool.vault.snapshot();
        info!(
            "Epoch {}: rate {}, value {}, supply {}, {} rebalance transfers",
            epoch,
            format_rate(snapshot.exchange_rate),
            snapshot.total_value,
            snapshot.receipt_supply,
            operations.len()
        );
    }

    let snapshot = pool.vault.snapshot();
    let stats = pool.registry.stats();
    log.verify_chain()?;

    println!();
    println!("Simulation complete");
    println!("===================");
    println!("Epochs:             {}", epochs);
    println!("Exchange rate:      {}", format_rate(snapshot.exchange_rate));
    println!("Total value:        {}", snapshot.total_value);
    println!("Pooled / delegated: {} / {}", snapshot.pooled_balance, snapshot.delegated_capital);
    println!("Receipt supply:     {}", snapshot.receipt_supply);
    println!("Holders:            {}", token.holders());
    println!("Active workers:     {} / {}", stats.active_workers, stats.total_workers);
    println!("Average score:      {}", stats.average_performance);
    println!("Audit entries:      {}", log.len());
    println!();

    Ok(())
}
