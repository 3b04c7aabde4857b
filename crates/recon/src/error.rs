use std::fmt;

/// Which input collection a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Regulator-published list.
    Authoritative,
    /// Crowd-sourced map data.
    Secondary,
    /// Records fed to the statistics aggregator.
    Stats,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authoritative => write!(f, "authoritative"),
            Self::Secondary => write!(f, "secondary"),
            Self::Stats => write!(f, "stats"),
        }
    }
}

#[derive(Debug)]
pub enum ReconError {
    /// A required field is missing or has the wrong type.
    MalformedRecord {
        source: SourceKind,
        record: String,
        reason: String,
    },
    /// No run key could be derived and the date fallback is disabled.
    UnresolvableRunKey(String),
    /// Persisted stats store does not have the expected shape.
    StoreCorrupt(String),
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad threshold, empty path, etc.).
    ConfigValidation(String),
}

impl ReconError {
    pub(crate) fn malformed(source: SourceKind, record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            source,
            record: record.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRecord { source, record, reason } => {
                write!(f, "{source} record '{record}': {reason}")
            }
            Self::UnresolvableRunKey(msg) => write!(f, "cannot resolve run key: {msg}"),
            Self::StoreCorrupt(msg) => write!(f, "stats store is corrupt: {msg}"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
