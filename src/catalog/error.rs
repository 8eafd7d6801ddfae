use thiserror::Error as ThisError;

/// Failure classes surfaced by the catalog core.
///
/// `InvalidInput` means the caller handed us something the core can check
/// itself (unknown sort field, malformed cursor, bad feed locator) and can
/// recover by correcting the request. `Internal` is everything else: pool
/// faults, row decode failures, deadline expiry. Both keep the underlying
/// cause chain so diagnostics stay attributable to the originating operation.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid input: {0:#}")]
    InvalidInput(anyhow::Error),
    #[error("internal: {0:#}")]
    Internal(anyhow::Error),
}

impl Error {
    pub fn invalid_input(cause: impl Into<anyhow::Error>) -> Self {
        Self::InvalidInput(cause.into())
    }

    pub fn internal(cause: impl Into<anyhow::Error>) -> Self {
        Self::Internal(cause.into())
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::internal(err)
    }
}
