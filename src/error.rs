use thiserror::Error;

/// Errors that can occur when using the llm-suite library.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed model '{0}': expected '<provider>:<model>'")]
    MalformedModel(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Missing credential for {provider}: pass an explicit key or set {env_var}")]
    MissingCredential { provider: String, env_var: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Stream reader is closed")]
    InvalidState,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// A failure of the vendor call or stream, carried as the vendor reported it.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error (HTTP {status}): {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode vendor payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("{provider} returned a response without choices")]
    EmptyResponse { provider: String },
}

impl Error {
    pub fn missing_credential(provider: impl Into<String>, env_var: impl Into<String>) -> Self {
        Error::MissingCredential {
            provider: provider.into(),
            env_var: env_var.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn api(provider: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Error::Transport(TransportError::Api {
            provider: provider.into(),
            status,
            body: body.into(),
        })
    }

    pub fn empty_response(provider: impl Into<String>) -> Self {
        Error::Transport(TransportError::EmptyResponse {
            provider: provider.into(),
        })
    }

    pub fn streaming(message: impl Into<String>) -> Self {
        Error::Transport(TransportError::Stream(message.into()))
    }

    /// True for failures of the vendor call itself; the caller owns any retry.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// True for errors that no retry can fix.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MalformedModel(_)
                | Error::UnknownProvider(_)
                | Error::MissingCredential { .. }
                | Error::Config(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::Http(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Transport(TransportError::Decode(err))
    }
}
