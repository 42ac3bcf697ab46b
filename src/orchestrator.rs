use crate::artifact::{CleanupPolicy, TransferArtifact};
use crate::error::{Result, TransferError};
use crate::pipeline::{ExportStage, ImportStage, Stage};
use crate::process::ProcessRunner;
use crate::profile::ConnectionProfile;
use crate::readiness::{GateConfig, ReadinessGate, Sleeper};
use log::{info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Program names for the two transfer tools.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tools {
    pub pg_dump: String,
    pub psql: String,
}

impl Default for Tools {
    fn default() -> Self {
        Tools {
            pg_dump: "pg_dump".to_string(),
            psql: "psql".to_string(),
        }
    }
}

/// Everything one run needs, fixed at startup.
#[derive(Clone, Debug)]
pub struct TransferConfig {
    pub source: ConnectionProfile,
    pub destination: ConnectionProfile,
    pub gate: GateConfig,
    pub artifact: TransferArtifact,
    pub cleanup: CleanupPolicy,
    pub tools: Tools,
}

pub struct TransferOrchestrator<'a> {
    pub config: TransferConfig,
    pub runner: &'a dyn ProcessRunner,
    pub sleeper: &'a dyn Sleeper,
    pub interrupt: Arc<AtomicBool>,
}

impl<'a> TransferOrchestrator<'a> {
    pub fn new(
        config: TransferConfig,
        runner: &'a dyn ProcessRunner,
        sleeper: &'a dyn Sleeper,
        interrupt: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            runner,
            sleeper,
            interrupt,
        }
    }

    pub fn wait_for_source(&self) -> Result<u32> {
        ReadinessGate {
            config: &self.config.gate,
            runner: self.runner,
            sleeper: self.sleeper,
            interrupt: self.interrupt.clone(),
        }
        .wait()
    }

    pub fn export(&self) -> Result<()> {
        info!("Exporting {} to {}", self.config.source, self.config.artifact);
        ExportStage {
            program: &self.config.tools.pg_dump,
            source: &self.config.source,
            artifact: &self.config.artifact,
        }
        .run(self.runner)
    }

    pub fn import(&self) -> Result<()> {
        match self.config.artifact.size() {
            None => warn!("Artifact {} does not exist", self.config.artifact),
            Some(0) => warn!("Artifact {} is empty", self.config.artifact),
            Some(_) => {}
        }
        info!(
            "Importing {} into {}",
            self.config.artifact, self.config.destination
        );
        ImportStage {
            program: &self.config.tools.psql,
            destination: &self.config.destination,
            artifact: &self.config.artifact,
        }
        .run(self.runner)
    }

    /// A Ctrl-C during a stage kills the child too; report that as an
    /// interruption rather than whatever the tool exited with.
    fn unless_interrupted(&self, result: Result<()>) -> Result<()> {
        if self.interrupt.load(Ordering::Relaxed) {
            return Err(TransferError::Interrupted);
        }
        result
    }

    /// wait -> export -> import, stopping at the first failure.
    pub fn orchestrate(&self) -> Result<()> {
        self.wait_for_source()?;
        self.unless_interrupted(Ok(()))?;
        info!("Starting transfer");
        self.unless_interrupted(self.export())?;
        self.unless_interrupted(self.import())?;
        if self.config.cleanup == CleanupPolicy::Remove {
            info!("Removing {}", self.config.artifact);
            self.config.artifact.remove()?;
        }
        info!("Transfer complete");
        Ok(())
    }
}
