use thiserror::Error;

/// Failure talking to the statistics provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider returned http {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider request failed: {0}")]
    Transport(reqwest::Error),

    #[error("malformed provider payload: {0}")]
    Malformed(String),
}

/// Request URLs carry the API token, so it is stripped before the error is
/// kept or displayed.
impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.without_url())
    }
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Transport(err) if err.is_timeout())
    }
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("database error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("job '{job}' is already running (held by {holder})")]
    LeaseHeld { job: String, holder: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type IngestResult<T> = Result<T, IngestError>;
