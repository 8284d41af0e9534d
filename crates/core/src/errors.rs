use std::path::PathBuf;

/// Authoring errors raised while building or specializing stage classes
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TypingError {
    #[error("Malformed type expression {input:?}: {reason}")]
    MalformedTypeExpression { input: String, reason: String },

    #[error("Can not subclass a {template}[{argument}] from {template}[{bound}]")]
    IncompatibleSpecialization { template: String, argument: String, bound: String },

    #[error("No return annotation found for the production method of {class}")]
    MissingReturnAnnotation { class: String },

    #[error("Unmatched type annotation for {class} ({bound} vs {declared})")]
    MismatchedReturnAnnotation { class: String, bound: String, declared: String },

    #[error("Expected Iterator as the return annotation for the production method of {class}, but found {found}")]
    NonIteratorReturnAnnotation { class: String, found: String },
}

impl TypingError {
    pub(crate) fn malformed(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedTypeExpression { input: input.into(), reason: reason.into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid log filter: {0}")]
    LogFilter(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PipetypeError {
    #[error(transparent)]
    Typing(TypingError),
    #[error(transparent)]
    Config(ConfigError),
}

impl From<TypingError> for PipetypeError {
    fn from(value: TypingError) -> Self {
        Self::Typing(value)
    }
}

impl From<ConfigError> for PipetypeError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl PipetypeError {
    /// The typing error behind this failure, if it is one
    pub fn as_typing(&self) -> Option<&TypingError> {
        match self {
            Self::Typing(err) => Some(err),
            Self::Config(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipetypeError>;
