use std::fmt;
use std::io;
use std::path::PathBuf;

/// Everything that can go wrong while reading a feed. Only `DataSourceUnavailable` ever escapes a
/// loader; the other kinds are logged and the row is skipped.
#[derive(Debug)]
pub enum LoadError {
    DataSourceUnavailable { path: PathBuf, source: io::Error },
    MalformedRecord {
        path: PathBuf,
        line: u64,
        reason: String,
    },
    MalformedIdentifier(String),
}

impl LoadError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LoadError::DataSourceUnavailable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, line: u64, reason: impl ToString) -> Self {
        LoadError::MalformedRecord {
            path: path.into(),
            line,
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadError::DataSourceUnavailable { path, source } => {
                write!(f, "{} can't be read: {}", path.display(), source)
            }
            LoadError::MalformedRecord { path, line, reason } => {
                write!(f, "{}, line {}: {}", path.display(), line, reason)
            }
            LoadError::MalformedIdentifier(raw) => {
                write!(f, "{:?} isn't a <namespace>-<UIC code>-<suffix> stop identifier", raw)
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::DataSourceUnavailable { source, .. } => Some(source),
            _ => None,
        }
    }
}
