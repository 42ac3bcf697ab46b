// readiness.rs
// Polls the source server with pg_isready until it accepts connections.

use crate::error::{Result, TransferError};
use crate::process::{Invocation, PASSWORD_ENV, ProcessRunner};
use crate::profile::host_args;
use log::{info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;
pub const DEFAULT_READY_MARKER: &str = "accepting connections";

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Clone, Debug)]
pub struct GateConfig {
    pub program: String,
    pub host: String,
    pub port: Option<u16>,
    pub max_retries: u32,
    pub delay: Duration,
    pub ready_marker: String,
}

impl GateConfig {
    pub fn new(host: &str) -> Self {
        GateConfig {
            program: "pg_isready".to_string(),
            host: host.to_string(),
            port: None,
            max_retries: DEFAULT_MAX_RETRIES,
            delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
            ready_marker: DEFAULT_READY_MARKER.to_string(),
        }
    }

    pub fn invocation(&self) -> Invocation {
        Invocation::new(&self.program)
            .args(host_args(&self.host, self.port))
            .scrub_credentials()
            .capture()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    /// `failed` attempts so far.
    Polling { failed: u32 },
    Ready { attempts: u32 },
    Exhausted { attempts: u32 },
}

pub struct ReadinessGate<'a> {
    pub config: &'a GateConfig,
    pub runner: &'a dyn ProcessRunner,
    pub sleeper: &'a dyn Sleeper,
    pub interrupt: Arc<AtomicBool>,
}

impl<'a> ReadinessGate<'a> {
    /// Moves the gate one attempt forward. Only `Polling` states advance.
    pub fn step(&self, state: GateState) -> Result<GateState> {
        let failed = match state {
            GateState::Polling { failed } => failed,
            done => return Ok(done),
        };
        if failed >= self.config.max_retries {
            return Ok(GateState::Exhausted { attempts: failed });
        }
        if self.interrupt.load(Ordering::Relaxed) {
            return Err(TransferError::Interrupted);
        }
        let attempt = failed + 1;
        let invocation = self.config.invocation();
        let output = self
            .runner
            .run(&invocation)
            .map_err(|source| TransferError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;
        if output.success() && output.stdout.contains(&self.config.ready_marker) {
            info!("{} is accepting connections", self.config.host);
            return Ok(GateState::Ready { attempts: attempt });
        }
        if output.success() {
            warn!(
                "{} answered but is not ready yet: {}",
                self.config.host,
                output.stdout.trim()
            );
        } else {
            warn!(
                "Error connecting to {} (exit {:?}): {}",
                self.config.host,
                output.code,
                output.stderr.trim()
            );
        }
        if attempt < self.config.max_retries {
            info!(
                "Retrying in {} seconds... (Attempt {}/{})",
                self.config.delay.as_secs(),
                attempt,
                self.config.max_retries
            );
            self.sleeper.sleep(self.config.delay);
        }
        Ok(GateState::Polling { failed: attempt })
    }

    /// Blocks until the host is ready or the retry budget is spent.
    /// Returns the number of attempts it took.
    pub fn wait(&self) -> Result<u32> {
        let mut state = GateState::Polling { failed: 0 };
        loop {
            state = self.step(state)?;
            match state {
                GateState::Polling { .. } => continue,
                GateState::Ready { attempts } => return Ok(attempts),
                GateState::Exhausted { attempts } => {
                    warn!("Max retries reached for {}", self.config.host);
                    return Err(TransferError::ReadinessExhausted {
                        host: self.config.host.clone(),
                        attempts,
                    });
                }
            }
        }
    }
}
