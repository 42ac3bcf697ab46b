use thiserror::Error;

/// Exit code used when the run is aborted with Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("{host} was not ready after {attempts} attempts")]
    ReadinessExhausted { host: String, attempts: u32 },

    #[error("export failed with exit code {code}")]
    ExportFailed { code: i32 },

    #[error("import failed with exit code {code}")]
    ImportFailed { code: i32 },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{var} is not set")]
    MissingPassword { var: &'static str },

    #[error("interrupted")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransferError {
    /// Process exit code for this failure. Stage failures propagate the tool's own code.
    pub fn exit_code(&self) -> i32 {
        match self {
            TransferError::ExportFailed { code } | TransferError::ImportFailed { code } => *code,
            TransferError::Interrupted => EXIT_INTERRUPTED,
            TransferError::ReadinessExhausted { .. }
            | TransferError::Spawn { .. }
            | TransferError::MissingPassword { .. }
            | TransferError::Io(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransferError>;
