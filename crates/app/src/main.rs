use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use file_handler_core::{ExitSignal, HandlerConfig, ManagerRegistry, SoundBankInfo};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn main() -> file_handler_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { banks, config } => run_demo(banks, config.as_ref()),
        Commands::Config => print_default_config(),
    }
}

fn run_demo(banks: u32, config: Option<&PathBuf>) -> file_handler_core::Result<()> {
    let config = match config {
        Some(path) => HandlerConfig::load(path)?,
        None => HandlerConfig::default(),
    };
    tracing::info!(banks, queue = %config.bank_queue.name, "starting file handler demo");

    let exit = ExitSignal::new();
    let registry = ManagerRegistry::with_host(config, exit.clone());
    registry.startup();

    let queue = registry
        .bank_execution_queue()
        .ok_or("bank execution queue is unavailable")?;
    let manager = registry
        .sound_bank_manager()
        .ok_or("sound bank manager is unavailable")?;

    for id in 0..banks {
        let manager = Arc::clone(&manager);
        queue.enqueue(move || {
            let bank = SoundBankInfo::new(id, format!("Bank{id:03}"));
            if let Err(err) = manager.load_sound_bank(&bank) {
                tracing::error!(%err, bank = %bank.name, "bank load failed");
            }
        })?;
    }
    // Everything enqueued before this marker has run once it returns.
    queue.enqueue_and_wait(|| {})?;

    let summary = DemoSummary {
        queue: queue.name().to_string(),
        priority: format!("{:?}", queue.priority()),
        loaded_banks: manager.loaded_ids(),
        constructions: registry.lock_stats().constructions,
    };
    drop((queue, manager));

    exit.request_exit();
    registry.shutdown();

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn print_default_config() -> file_handler_core::Result<()> {
    println!("{}", serde_json::to_string_pretty(&HandlerConfig::default())?);
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Debug, Serialize)]
struct DemoSummary {
    queue: String,
    priority: String,
    loaded_banks: Vec<u32>,
    constructions: u64,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Lazy file handler registry with a bank execution queue", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a batch of sound banks through the bank execution queue.
    Demo {
        /// Number of banks to load.
        #[arg(short, long, default_value_t = 8)]
        banks: u32,
        /// Optional JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the default configuration as JSON.
    Config,
}
