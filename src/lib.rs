//! Main library entry point for pg-transfer.

pub mod args;
pub mod artifact;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod process;
pub mod profile;
pub mod readiness;

// Re-export key types for ergonomic access

pub use artifact::*;
pub use error::{Result, TransferError};
pub use orchestrator::*;
pub use pipeline::*;
pub use process::*;
pub use profile::*;
pub use readiness::*;
