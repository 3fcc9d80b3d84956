use serde::Serialize;

/// Result type for conformance operations.
pub type ConformanceResult<T> = Result<T, ConformanceError>;

/// All errors that can abort a scenario, a suite setup, or a config load.
#[derive(Debug, thiserror::Error)]
pub enum ConformanceError {
    /// The token issuer did not hand out a usable bearer token.
    #[error("credential acquisition failed: {0}")]
    Credential(String),

    /// A status code, body text, or count did not match the oracle.
    #[error("{0}")]
    Assertion(String),

    /// The request never produced an HTTP response.
    #[error("{method} {url}: {message}")]
    Transport {
        method: String,
        url: String,
        message: String,
    },

    /// A response arrived but its body was not what the oracle can read.
    #[error("could not parse response from {url}: {message}")]
    Parse { url: String, message: String },

    /// Missing or malformed configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ConformanceError {
    pub fn assertion(message: impl Into<String>) -> Self {
        ConformanceError::Assertion(message.into())
    }

    /// Which class of failure this error represents in a report.
    pub fn kind(&self) -> FailureKind {
        match self {
            ConformanceError::Credential(_) => FailureKind::Setup,
            ConformanceError::Assertion(_) => FailureKind::Assertion,
            ConformanceError::Transport { .. } => FailureKind::Transport,
            ConformanceError::Parse { .. } => FailureKind::Parse,
            ConformanceError::Config(_) => FailureKind::Config,
        }
    }
}

/// Failure classes carried into [`crate::report::Outcome::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Setup,
    Assertion,
    Transport,
    Parse,
    Config,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FailureKind::Setup => "setup",
            FailureKind::Assertion => "assertion",
            FailureKind::Transport => "transport",
            FailureKind::Parse => "parse",
            FailureKind::Config => "config",
        };
        write!(f, "{}", label)
    }
}
