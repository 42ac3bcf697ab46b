use crate::artifact::{CleanupPolicy, DEFAULT_ARTIFACT, TransferArtifact};
use crate::error::{Result, TransferError};
use crate::orchestrator::{Tools, TransferConfig};
use crate::process::{DEST_PASSWORD_ENV, SOURCE_PASSWORD_ENV};
use crate::profile::ConnectionProfile;
use crate::readiness::{
    DEFAULT_MAX_RETRIES, DEFAULT_READY_MARKER, DEFAULT_RETRY_DELAY_SECS, GateConfig,
};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Wait for the source, dump it and load the dump into the destination.
    ///
    /// Passwords are taken from SOURCE_PASSWORD and DEST_PASSWORD.
    Run(RunArgs),
    /// Only wait for the source to accept connections
    Wait {
        /// Source host to poll
        #[arg(long, env = "SOURCE_HOST", default_value = "source_postgres")]
        source_host: String,

        /// Source port
        #[arg(long, env = "SOURCE_PORT")]
        source_port: Option<u16>,

        #[command(flatten)]
        gate: GateArgs,
    },
}

#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub destination: DestinationArgs,

    #[command(flatten)]
    pub gate: GateArgs,

    /// Intermediate dump file
    #[arg(long, env = "TRANSFER_ARTIFACT", default_value = DEFAULT_ARTIFACT)]
    pub artifact: PathBuf,

    /// What to do with the dump file after a successful import
    #[arg(long, value_enum, env = "TRANSFER_CLEANUP", default_value_t = CleanupPolicy::Keep)]
    pub cleanup: CleanupPolicy,

    /// pg_dump executable
    #[arg(long, env = "PG_DUMP", default_value = "pg_dump")]
    pub pg_dump: String,

    /// psql executable
    #[arg(long, env = "PSQL", default_value = "psql")]
    pub psql: String,
}

#[derive(ClapArgs, Debug)]
pub struct SourceArgs {
    #[arg(long, env = "SOURCE_HOST", default_value = "source_postgres")]
    pub source_host: String,

    #[arg(long, env = "SOURCE_PORT")]
    pub source_port: Option<u16>,

    #[arg(long, env = "SOURCE_DB", default_value = "source_db")]
    pub source_db: String,

    #[arg(long, env = "SOURCE_USER", default_value = "postgres")]
    pub source_user: String,
}

#[derive(ClapArgs, Debug)]
pub struct DestinationArgs {
    #[arg(long, env = "DEST_HOST", default_value = "destination_postgres")]
    pub dest_host: String,

    #[arg(long, env = "DEST_PORT")]
    pub dest_port: Option<u16>,

    #[arg(long, env = "DEST_DB", default_value = "destination_db")]
    pub dest_db: String,

    #[arg(long, env = "DEST_USER", default_value = "postgres")]
    pub dest_user: String,
}

#[derive(ClapArgs, Debug)]
pub struct GateArgs {
    /// Readiness attempts before giving up
    #[arg(
        long,
        env = "READY_MAX_RETRIES",
        default_value_t = DEFAULT_MAX_RETRIES,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_retries: u32,

    /// Seconds between readiness attempts
    #[arg(long, env = "READY_RETRY_DELAY", default_value_t = DEFAULT_RETRY_DELAY_SECS)]
    pub retry_delay: u64,

    /// Text pg_isready prints once the server is up
    #[arg(
        long,
        env = "READY_MARKER",
        default_value = DEFAULT_READY_MARKER,
        value_parser = clap::builder::NonEmptyStringValueParser::new()
    )]
    pub ready_marker: String,

    /// pg_isready executable
    #[arg(long, env = "PG_ISREADY", default_value = "pg_isready")]
    pub pg_isready: String,
}

impl GateArgs {
    pub fn gate_config(&self, host: &str, port: Option<u16>) -> GateConfig {
        GateConfig {
            program: self.pg_isready.clone(),
            host: host.to_string(),
            port,
            max_retries: self.max_retries,
            delay: Duration::from_secs(self.retry_delay),
            ready_marker: self.ready_marker.clone(),
        }
    }
}

impl RunArgs {
    /// Builds the run configuration. Passwords only ever come from the
    /// environment so they never show up in this process's argv.
    pub fn into_config(self) -> Result<TransferConfig> {
        self.into_config_with(|var| std::env::var(var).ok())
    }

    pub fn into_config_with<F>(self, lookup: F) -> Result<TransferConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let password =
            |var: &'static str| lookup(var).ok_or(TransferError::MissingPassword { var });
        let source_password = password(SOURCE_PASSWORD_ENV)?;
        let dest_password = password(DEST_PASSWORD_ENV)?;
        let gate = self
            .gate
            .gate_config(&self.source.source_host, self.source.source_port);
        let source = ConnectionProfile::new(
            &self.source.source_host,
            &self.source.source_db,
            &self.source.source_user,
            &source_password,
        )
        .with_port(self.source.source_port);
        let destination = ConnectionProfile::new(
            &self.destination.dest_host,
            &self.destination.dest_db,
            &self.destination.dest_user,
            &dest_password,
        )
        .with_port(self.destination.dest_port);
        Ok(TransferConfig {
            source,
            destination,
            gate,
            artifact: TransferArtifact::new(self.artifact),
            cleanup: self.cleanup,
            tools: Tools {
                pg_dump: self.pg_dump,
                psql: self.psql,
            },
        })
    }
}

pub fn get_args() -> std::result::Result<Args, clap::Error> {
    Args::try_parse()
}
