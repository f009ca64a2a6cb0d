/// Shared error type used across all sllmi crates.
///
/// The first five variants are the caller-facing taxonomy. The transport
/// variants below them are produced by provider adapters and normally only
/// reach the caller as the `source` of an aggregate [`Error::Generation`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Missing or empty credentials, blank model code, unreadable config.
    #[error("config: {0}")]
    Config(String),

    /// The provider answered without content, or every credential failed.
    #[error("generation: {message}")]
    Generation {
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("token counting failed: {0}")]
    Tokenization(String),

    /// The caller's cancellation token fired before the call completed.
    #[error("cancelled")]
    Cancelled,

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },
}

impl Error {
    /// A successful response that carried no candidate output.
    pub fn no_content() -> Self {
        Error::Generation {
            message: "no content in response".into(),
            source: None,
        }
    }

    /// Every credential in the set was tried and none succeeded.
    ///
    /// The last underlying failure is kept as the source and echoed in the
    /// message so a plain `to_string()` is still useful in logs.
    pub fn all_keys_failed(last: Option<Error>) -> Self {
        let message = match &last {
            Some(e) => format!("all API keys failed: {e}"),
            None => "all API keys failed".to_string(),
        };
        Error::Generation {
            message,
            source: last.map(Box::new),
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    pub fn is_generation(&self) -> bool {
        matches!(self, Error::Generation { .. })
    }

    pub fn is_model_not_found(&self) -> bool {
        matches!(self, Error::ModelNotFound(_))
    }

    pub fn is_tokenization(&self) -> bool {
        matches!(self, Error::Tokenization(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
