use crate::artifact::TransferArtifact;
use crate::error::{Result, TransferError};
use crate::process::{Invocation, PASSWORD_ENV, ProcessRunner};
use crate::profile::ConnectionProfile;
use log::{debug, error, info};
use std::time::Instant;

pub trait Stage {
    fn name(&self) -> &'static str;
    fn invocation(&self) -> Invocation;
    /// Error reported when the tool exits non-zero.
    fn failure(&self, code: i32) -> TransferError;

    fn run(&self, runner: &dyn ProcessRunner) -> Result<()> {
        let invocation = self.invocation();
        debug!("{}: {}", self.name(), invocation.command_line());
        let started = Instant::now();
        let output = runner
            .run(&invocation)
            .map_err(|source| TransferError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;
        if !output.success() {
            let code = output.failure_code();
            if !output.stderr.is_empty() {
                error!("{}", output.stderr.trim());
            }
            return Err(self.failure(code));
        }
        info!("{} finished in {:.1?}", self.name(), started.elapsed());
        Ok(())
    }
}

/// Dumps schema and data of the source database into the artifact.
pub struct ExportStage<'a> {
    pub program: &'a str,
    pub source: &'a ConnectionProfile,
    pub artifact: &'a TransferArtifact,
}

impl Stage for ExportStage<'_> {
    fn name(&self) -> &'static str {
        "export"
    }

    fn invocation(&self) -> Invocation {
        Invocation::new(self.program)
            .args(self.source.connection_args())
            .args(["-f".to_string(), self.artifact.to_string(), "-w".to_string()])
            .scrub_credentials()
            .env(PASSWORD_ENV, &self.source.password)
    }

    fn failure(&self, code: i32) -> TransferError {
        TransferError::ExportFailed { code }
    }
}

/// Replays the artifact against the destination, echoing each statement.
pub struct ImportStage<'a> {
    pub program: &'a str,
    pub destination: &'a ConnectionProfile,
    pub artifact: &'a TransferArtifact,
}

impl Stage for ImportStage<'_> {
    fn name(&self) -> &'static str {
        "import"
    }

    fn invocation(&self) -> Invocation {
        Invocation::new(self.program)
            .args(self.destination.connection_args())
            .args(["-a", "-w", "-v", "ON_ERROR_STOP=1", "-f"])
            .args([self.artifact.to_string()])
            .scrub_credentials()
            .env(PASSWORD_ENV, &self.destination.password)
    }

    fn failure(&self, code: i32) -> TransferError {
        TransferError::ImportFailed { code }
    }
}
