pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Inputs that no chunk shape or codec can be derived from.
    #[error("invalid chunking configuration: {0}")]
    Configuration(String),
    /// Anything else, e.g. an unsupported data type.
    #[error("{0}")]
    General(String),
    /// Storage options or metadata which could not be (de)serialized.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self::General(message.into())
    }
}
