pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Color scheme not found: {key}")]
    SchemeNotFound { key: String },

    #[error("SVG parse error: {message}")]
    SvgParse { message: String },

    #[error("Invalid gradient `{input}`: {message}")]
    Gradient { input: String, message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Invalid bundled data: {message}")]
    Data { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
