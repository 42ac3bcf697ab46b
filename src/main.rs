//! Main binary entry point for pg-transfer.

use anyhow::Result;
use log::error;
use pg_transfer::args::{Args, Command, get_args};
use pg_transfer::{ReadinessGate, SystemRunner, ThreadSleeper, TransferError, TransferOrchestrator};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = get_args().unwrap_or_else(|e| e.exit());
    if let Err(err) = run(args) {
        error!("{:#}", err);
        let code = err
            .downcast_ref::<TransferError>()
            .map_or(1, TransferError::exit_code);
        std::process::exit(code);
    }
}

fn run(args: Args) -> Result<()> {
    let interrupt = Arc::new(AtomicBool::new(false));
    let interrupt_clone = interrupt.clone();
    ctrlc::set_handler(move || {
        interrupt_clone.store(true, Ordering::Relaxed);
    })?;
    match args.command {
        Command::Run(run_args) => {
            let config = run_args.into_config()?;
            let orchestrator =
                TransferOrchestrator::new(config, &SystemRunner, &ThreadSleeper, interrupt);
            orchestrator.orchestrate()?;
        }
        Command::Wait {
            source_host,
            source_port,
            gate,
        } => {
            let config = gate.gate_config(&source_host, source_port);
            ReadinessGate {
                config: &config,
                runner: &SystemRunner,
                sleeper: &ThreadSleeper,
                interrupt,
            }
            .wait()?;
        }
    }
    Ok(())
}
