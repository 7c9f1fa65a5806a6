//! Errors surfaced by the command client and the cache layer.
//!
//! The adapter never interprets backend error content; it only carries it.
//! Classification here exists so views can pick a message and decide whether
//! a retry affordance makes sense.

use std::fmt;

/// Error returned by any command invocation, query or mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// The call never produced a backend answer (connection refused, body read failure).
    Transport(String),
    /// The backend rejected the command. `status` is set when the transport has one.
    Backend {
        status: Option<u16>,
        message: String,
    },
    /// The request DTO could not be serialized.
    Encode(String),
    /// The response did not match the declared output shape.
    Decode { command: String, message: String },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(msg) => write!(f, "transport error: {msg}"),
            ClientError::Backend {
                status: Some(status),
                message,
            } => write!(f, "backend error ({status}): {message}"),
            ClientError::Backend { status: None, message } => write!(f, "{message}"),
            ClientError::Encode(msg) => write!(f, "failed to encode request: {msg}"),
            ClientError::Decode { command, message } => {
                write!(f, "unexpected response from {command}: {message}")
            }
        }
    }
}

impl std::error::Error for ClientError {}

impl ClientError {
    pub fn backend(message: impl Into<String>) -> Self {
        ClientError::Backend {
            status: None,
            message: message.into(),
        }
    }

    /// Coarse category used by views for user-facing reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Transport(_) => ErrorKind::Network,
            ClientError::Encode(_) | ClientError::Decode { .. } => ErrorKind::Validation,
            ClientError::Backend { status, message } => match status {
                Some(429) => ErrorKind::RateLimit,
                Some(401) | Some(403) => ErrorKind::Auth,
                Some(s) if (500..600).contains(s) => ErrorKind::Server,
                _ => classify_message(message),
            },
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Network | ErrorKind::Server | ErrorKind::RateLimit
        )
    }
}

/// Category of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimit,
    Server,
    Network,
    Auth,
    Validation,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::Server => "server",
            ErrorKind::Network => "network",
            ErrorKind::Auth => "auth",
            ErrorKind::Validation => "validation",
            ErrorKind::Unknown => "unknown",
        }
    }
}

/// Classify a backend error message by its wording.
pub(crate) fn classify_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();

    if lower.contains("rate limit") || lower.contains("too many requests") || lower.contains("429") {
        return ErrorKind::RateLimit;
    }

    if lower.contains("internal server error")
        || lower.contains("service unavailable")
        || lower.contains("database is locked")
    {
        return ErrorKind::Server;
    }
    // Status codes only count with word boundaries, so "5000ms" stays unknown
    {
        lazy_static::lazy_static! {
            static ref HTTP_5XX: regex::Regex =
                regex::Regex::new(r"(?i)\b50[0234]\b").unwrap();
        }
        if HTTP_5XX.is_match(&lower) {
            return ErrorKind::Server;
        }
    }

    if lower.contains("network error")
        || lower.contains("connection refused")
        || lower.contains("timeout")
        || lower.contains("timed out")
    {
        return ErrorKind::Network;
    }

    if lower.contains("unauthorized") || lower.contains("master key") {
        return ErrorKind::Auth;
    }

    if lower.contains("invalid") || lower.contains("validation") || lower.contains("not found") {
        return ErrorKind::Validation;
    }

    ErrorKind::Unknown
}

/// Delay before retry number `retry_count` (0-based).
///
/// `min(base_delay_ms * multiplier^retry_count ± 5% jitter, max_delay_ms)`
pub(crate) fn backoff_delay_ms(
    retry_count: u32,
    base_delay_ms: f64,
    max_delay_ms: f64,
    backoff_multiplier: f64,
) -> f64 {
    // Cap before jitter so huge exponents never reach inf/NaN
    let delay = (base_delay_ms * backoff_multiplier.powi(retry_count as i32)).min(max_delay_ms);
    let jitter = delay * 0.1 * (rand::random::<f64>() - 0.5);
    (delay + jitter).clamp(0.0, max_delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_take_precedence_over_wording() {
        let err = ClientError::Backend {
            status: Some(503),
            message: "nothing recognisable".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Server);

        let err = ClientError::Backend {
            status: Some(401),
            message: "internal server error".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Auth);
    }

    #[test]
    fn classifies_backend_messages() {
        assert_eq!(classify_message("Too Many Requests"), ErrorKind::RateLimit);
        assert_eq!(classify_message("HTTP 502 from feed host"), ErrorKind::Server);
        assert_eq!(classify_message("database is locked"), ErrorKind::Server);
        assert_eq!(classify_message("request timed out"), ErrorKind::Network);
        assert_eq!(classify_message("master key missing"), ErrorKind::Auth);
        assert_eq!(classify_message("Idea not found: 42"), ErrorKind::Validation);
        assert_eq!(classify_message("something odd"), ErrorKind::Unknown);
    }

    #[test]
    fn numeric_codes_need_word_boundaries() {
        assert_eq!(classify_message("took 5000ms"), ErrorKind::Unknown);
        assert_eq!(classify_message("id 15003"), ErrorKind::Unknown);
    }

    #[test]
    fn transport_errors_are_retryable_validation_is_not() {
        assert!(ClientError::Transport("connection refused".into()).is_retryable());
        assert!(
            !ClientError::Decode {
                command: "list_ideas".into(),
                message: "expected array".into()
            }
            .is_retryable()
        );
        assert!(!ClientError::backend("Invalid title").is_retryable());
    }

    #[test]
    fn display_includes_status_when_known() {
        let err = ClientError::Backend {
            status: Some(500),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "backend error (500): boom");
        assert_eq!(ClientError::backend("boom").to_string(), "boom");
    }

    #[test]
    fn backoff_grows_and_caps() {
        for _ in 0..20 {
            let first = backoff_delay_ms(0, 1000.0, 30_000.0, 2.0);
            assert!((950.0..=1050.0).contains(&first));
            let capped = backoff_delay_ms(20, 1000.0, 30_000.0, 2.0);
            assert!(capped <= 30_000.0);
            assert!(capped >= 28_500.0);
        }
    }

    #[test]
    fn backoff_jitter_stays_within_five_percent() {
        for _ in 0..50 {
            let delay = backoff_delay_ms(2, 1000.0, 30_000.0, 2.0);
            assert!((3800.0..=4200.0).contains(&delay), "{delay}");
        }
    }

    #[test]
    fn backoff_survives_extreme_exponents() {
        let delay = backoff_delay_ms(10_000, 1000.0, 5_000.0, 10.0);
        assert!(delay.is_finite());
        assert!(delay <= 5_000.0);
    }
}
