use thiserror::Error;

/// Failures talking to the upstream schedule/event APIs.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no event record could be resolved for calendar entry {label:?}")]
    ResolutionFailed { label: String },
    #[error("upstream call timed out")]
    Timeout,
}

impl SourceError {
    /// Network, timeout and non-2xx failures; the next hourly tick retries these.
    pub fn is_transient(&self) -> bool {
        !matches!(self, SourceError::ResolutionFailed { .. })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file io: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file encoding: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("state lock poisoned")]
    Poisoned,
}

/// Failures from the outbound channel sender.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid discord id {0:?}")]
    InvalidId(String),
    #[error("discord: {0}")]
    Discord(String),
    #[error("discord call timed out")]
    Timeout,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config line {line}: {content}")]
    InvalidLine { line: usize, content: String },
    #[error("invalid HH:MM value {0:?}")]
    InvalidRunAt(String),
    #[error("missing required setting {0}")]
    Missing(&'static str),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported timestamp {0:?}")]
pub struct TimeParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_failure_is_not_transient() {
        let err = SourceError::ResolutionFailed {
            label: "UFC 300".to_string(),
        };
        assert!(!err.is_transient());
        let status = SourceError::Status {
            status: 503,
            url: "https://example.invalid".to_string(),
        };
        assert!(status.is_transient());
        assert!(SourceError::Timeout.is_transient());
    }
}
