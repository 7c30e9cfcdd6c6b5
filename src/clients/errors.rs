use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Token endpoint returned no access token")]
    MissingToken,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Error::ConfigurationError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::ConfigurationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why an upstream call did not produce a usable answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    /// Connection refused, reset, DNS failure or a 5xx answer.
    Unavailable,
    TimedOut,
    RateLimited,
    /// Any other non-2xx status.
    Rejected(u16),
    Malformed,
}

/// Coarse classification of an [`Error`] used by the orchestration flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Auth,
    Upstream(UpstreamKind),
}

impl Error {
    pub fn failure(&self) -> Failure {
        match self {
            Error::Http(err) if err.is_timeout() => Failure::Upstream(UpstreamKind::TimedOut),
            Error::Http(err) if err.is_decode() => Failure::Upstream(UpstreamKind::Malformed),
            Error::Http(_) => Failure::Upstream(UpstreamKind::Unavailable),
            Error::Status { status, .. } => match *status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Failure::Auth
                }
                StatusCode::TOO_MANY_REQUESTS => Failure::Upstream(UpstreamKind::RateLimited),
                s if s.is_server_error() => Failure::Upstream(UpstreamKind::Unavailable),
                s => Failure::Upstream(UpstreamKind::Rejected(s.as_u16())),
            },
            Error::Deserialization(_) => Failure::Upstream(UpstreamKind::Malformed),
            Error::MissingCredentials(_) | Error::MissingToken => Failure::Auth,
            Error::InvalidArgument(_) => Failure::Upstream(UpstreamKind::Rejected(400)),
            Error::ConfigurationError(_) => Failure::Upstream(UpstreamKind::Unavailable),
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Error::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> Error {
        Error::Status {
            status: StatusCode::from_u16(code).unwrap(),
            body: String::new(),
        }
    }

    #[test]
    fn credential_rejections_are_auth_failures() {
        assert_eq!(status(400).failure(), Failure::Auth);
        assert_eq!(status(401).failure(), Failure::Auth);
        assert_eq!(status(403).failure(), Failure::Auth);
        assert_eq!(Error::MissingToken.failure(), Failure::Auth);
        assert_eq!(
            Error::MissingCredentials("SPOTIFY_CLIENT_ID".into()).failure(),
            Failure::Auth
        );
    }

    #[test]
    fn upstream_statuses_are_classified() {
        assert_eq!(
            status(429).failure(),
            Failure::Upstream(UpstreamKind::RateLimited)
        );
        assert_eq!(
            status(503).failure(),
            Failure::Upstream(UpstreamKind::Unavailable)
        );
        assert_eq!(
            status(404).failure(),
            Failure::Upstream(UpstreamKind::Rejected(404))
        );
        let malformed = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            Error::from(malformed).failure(),
            Failure::Upstream(UpstreamKind::Malformed)
        );
    }

    #[test]
    fn only_server_side_statuses_are_transient() {
        assert!(status(500).is_transient());
        assert!(status(502).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(401).is_transient());
        assert!(!status(404).is_transient());
        assert!(!Error::MissingToken.is_transient());
    }
}
