use thiserror::Error;

/// Shared error taxonomy across the workspace.
///
/// `Config` aborts the current command, `Data` skips the affected unit and
/// continues, `Remote` is propagated with context, `State` is fatal for a
/// scheduler invocation.
#[derive(Error, Debug)]
pub enum BaseopsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Run-state error: {0}")]
    State(String),

    #[error("{0}")]
    Other(String),
}
