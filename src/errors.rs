// Error types for the fetch/resolve/download pipeline

use std::fmt;

#[derive(Debug, Clone)]
pub enum DownloadError {
    /// Metadata service refused the request (rate limit, private or
    /// unknown subject, network failure)
    SourceUnavailable(String),

    /// Fetched window holds fewer usable records than requested
    WindowTooSmall { requested: usize, available: usize },

    /// Converter never produced a download link within the bounded wait
    /// (seconds waited)
    ResolutionTimeout(u64),

    /// Byte transfer was refused or interrupted
    TransferError(String),

    /// WebDriver endpoint not reachable or session could not be created
    DriverUnavailable(String),

    /// Username or hashtag failed validation
    InvalidSubject(String),

    /// External service returned data we could not make sense of
    ParseError(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable(msg) => write!(f, "Metadata source unavailable: {}", msg),
            Self::WindowTooSmall {
                requested,
                available,
            } => write!(
                f,
                "Fetch window too small: requested {} video(s) but only {} usable record(s) were returned",
                requested, available
            ),
            Self::ResolutionTimeout(secs) if *secs > 0 => write!(
                f,
                "Converter produced no download link within {}s",
                secs
            ),
            Self::ResolutionTimeout(_) => {
                write!(f, "Converter timed out before producing a download link")
            }
            Self::TransferError(msg) => write!(f, "Transfer failed: {}", msg),
            Self::DriverUnavailable(msg) => write!(f, "WebDriver unavailable: {}", msg),
            Self::InvalidSubject(msg) => write!(f, "Invalid subject: {}", msg),
            Self::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for DownloadError {}

// Classify free-form error text from external services
impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();

        // Rate limiting and refusals from the metadata API
        if lower.contains("429") || lower.contains("rate") || lower.contains("limit") {
            return Self::SourceUnavailable(s);
        }

        // Dead or missing chromedriver
        if lower.contains("connection refused") || lower.contains("webdriver") {
            return Self::DriverUnavailable(s);
        }

        // Converter stalls
        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::ResolutionTimeout(0);
        }

        if lower.contains("json") || lower.contains("parse") {
            return Self::ParseError(s);
        }

        Self::TransferError(s)
    }
}

impl DownloadError {
    /// Actionable suggestion for the user, where one exists
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::SourceUnavailable(_) => Some(
                "The account may be private, deleted or misspelled; if the \
                 service is rate-limiting, wait a few minutes or switch networks",
            ),
            Self::WindowTooSmall { .. } => Some(
                "Pick a larger fetch window, or lower the requested count",
            ),
            Self::ResolutionTimeout(_) => Some(
                "The converter may be overloaded; the next video will still be attempted",
            ),
            Self::DriverUnavailable(_) => Some(
                "Start chromedriver first (default endpoint http://localhost:9515)",
            ),
            Self::InvalidSubject(_) => Some(
                "Usernames are letters, digits, '.' and '_'; hashtags are letters, digits and '_'",
            ),
            Self::TransferError(_) | Self::ParseError(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rate_limit_as_source_unavailable() {
        let err = DownloadError::from("HTTP 429 too many requests".to_string());
        assert!(matches!(err, DownloadError::SourceUnavailable(_)));
    }

    #[test]
    fn classifies_refused_connection_as_driver_unavailable() {
        let err = DownloadError::from("tcp connect error: connection refused".to_string());
        assert!(matches!(err, DownloadError::DriverUnavailable(_)));
    }

    #[test]
    fn classifies_timeout_as_resolution_timeout() {
        let err = DownloadError::from("operation timed out".to_string());
        assert!(matches!(err, DownloadError::ResolutionTimeout(_)));
    }

    #[test]
    fn classifies_bad_json_as_parse_error() {
        let err = DownloadError::from("invalid JSON at line 1".to_string());
        assert!(matches!(err, DownloadError::ParseError(_)));
    }

    #[test]
    fn unknown_text_falls_back_to_transfer_error() {
        let err = DownloadError::from("wat".to_string());
        assert!(matches!(err, DownloadError::TransferError(_)));
    }

    #[test]
    fn window_too_small_names_both_counts() {
        let err = DownloadError::WindowTooSmall {
            requested: 10,
            available: 3,
        };
        let text = err.to_string();
        assert!(text.contains("10"));
        assert!(text.contains("3"));
    }

    #[test]
    fn driver_hint_mentions_chromedriver() {
        let err = DownloadError::DriverUnavailable("no session".to_string());
        assert!(err.hint().unwrap().contains("chromedriver"));
    }
}
