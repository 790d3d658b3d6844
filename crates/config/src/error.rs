use std::fmt;

use gridsheet_engine::SheetError;

#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    Io { path: String, source: std::io::Error },
    /// TOML parse / deserialization error.
    Parse(String),
    /// A field expression is malformed.
    Expression(SheetError),
    /// A pattern validator does not compile.
    Regex { column: String, source: String },
    /// Semantic validation error (bad bounds, unknown variable, etc.).
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {path}: {source}"),
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::Expression(e) => write!(f, "{e}"),
            Self::Regex { column, source } => {
                write!(f, "column '{column}': invalid pattern: {source}")
            }
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Expression(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SheetError> for ConfigError {
    fn from(e: SheetError) -> Self {
        Self::Expression(e)
    }
}
