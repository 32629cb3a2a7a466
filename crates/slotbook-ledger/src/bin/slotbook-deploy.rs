//! Deploy an empty SlotBook order book and record its script hash.
//!
//! ```text
//! slotbook-deploy [config.json]
//! ```

use std::process::ExitCode;

use slotbook_ledger::{Ledger, write_script_hash};
use slotbook_types::{LogConfig, SlotbookConfig, constants::ENGINE_NAME};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let config = match std::env::args().nth(1) {
        Some(path) => match SlotbookConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => SlotbookConfig::default(),
    };
    init_logging(&config.log);

    tracing::info!(
        engine = ENGINE_NAME,
        version = slotbook_types::constants::VERSION,
        network = ?config.deploy.network,
        "Deploying order book"
    );

    let mut ledger = Ledger::new();
    let deployment = ledger.deploy(config.deploy.initial_balance);
    if let Err(err) = write_script_hash(&config.deploy.script_hash_file, &deployment.script_hash) {
        tracing::error!(error = %err, "Failed to write script hash");
        return ExitCode::FAILURE;
    }

    println!("Contract deployed: {}", deployment.txid);
    println!("Script hash: {}", deployment.script_hash);
    ExitCode::SUCCESS
}

fn init_logging(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
