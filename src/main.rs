//! Ledgerpulse main entry point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ledgerpulse_config::Config;
use ledgerpulse_core::SystemClock;
use ledgerpulse_engine::AnalyticsEngine;
use ledgerpulse_store::{MemoryBudgetStore, MemoryLedgerStore};
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "ledgerpulse")]
#[command(version = "0.1.0")]
#[command(about = "Analytics aggregation and budget-progress engine", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,
    /// User whose budgets are tracked
    #[arg(short, long, default_value = "default")]
    user: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = if args.config.exists() {
        Config::load(args.config.clone())
            .with_context(|| format!("Failed to load config from {}", args.config.display()))?
    } else {
        log::warn!(
            "Config file {} not found, falling back to defaults",
            args.config.display()
        );
        Config::default()
    };

    let rt = Runtime::new()?;
    rt.block_on(async {
        let ledger = Arc::new(MemoryLedgerStore::new());
        let budgets = Arc::new(MemoryBudgetStore::new());
        let engine = Arc::new(AnalyticsEngine::new(
            config,
            args.user.clone(),
            ledger,
            budgets,
            Vec::new(),
            Arc::new(SystemClock),
        ));
        engine.start();
        log::info!("Engine started, tracking budgets for user {}", args.user);

        let mut snapshots = engine.subscribe_snapshots();
        let mut alerts = engine.subscribe_alerts();
        loop {
            tokio::select! {
                Ok(snapshot) = snapshots.recv() => {
                    log::info!(
                        target: "ledgerpulse::main",
                        "Cycle {}: {} budgets tracked, {:.1}% overall utilization",
                        snapshot.cycle,
                        snapshot.totals.budgets_tracked,
                        snapshot.totals.utilization_percent
                    );
                }
                Ok(alert) = alerts.recv() => {
                    log::warn!(
                        target: "ledgerpulse::main",
                        "Alert [{}]: {}",
                        alert.alert.kind,
                        alert.alert.message
                    );
                }
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Shutting down");
                    break;
                }
            }
        }

        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}
