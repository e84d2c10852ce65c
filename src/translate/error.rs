use thiserror::Error;

/// Coarse classification of a [`TranslationError`], used for logging and
/// for the status mapping done at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Config,
    Parse,
    UpstreamApi,
    EmptyResult,
    RateLimit,
    Overload,
    Network,
}

/// Every way a translate request can fail.
///
/// Errors travel upward unchanged from the client and orchestrator; only
/// the handler turns them into an HTTP status and a user-facing message.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslationError {
    #[error("source text is empty")]
    EmptyInput,

    #[error("source text is too long ({count} characters, limit {limit})")]
    TooLong { count: usize, limit: usize },

    #[error("source text is already Japanese but target is {target}")]
    SameLanguage { target: String },

    #[error("no API key configured")]
    MissingApiKey,

    #[error("request body could not be read: {message}")]
    InvalidRequest { message: String },

    #[error("failed to parse upstream response: {message}")]
    Parse { message: String, excerpt: String },

    #[error("upstream API error (status {status:?}): {message}")]
    UpstreamApi { status: Option<u16>, message: String },

    #[error("upstream returned an empty translation")]
    EmptyResult,

    #[error("upstream rate limit reached (status {status:?}): {message}")]
    RateLimit { status: Option<u16>, message: String },

    #[error("upstream overloaded (status {status:?}): {message}")]
    Overload { status: Option<u16>, message: String },

    #[error("network error: {message}")]
    Network { message: String },
}

impl TranslationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput
            | Self::TooLong { .. }
            | Self::SameLanguage { .. }
            | Self::InvalidRequest { .. } => ErrorKind::Validation,
            Self::MissingApiKey => ErrorKind::Config,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::UpstreamApi { .. } => ErrorKind::UpstreamApi,
            Self::EmptyResult => ErrorKind::EmptyResult,
            Self::RateLimit { .. } => ErrorKind::RateLimit,
            Self::Overload { .. } => ErrorKind::Overload,
            Self::Network { .. } => ErrorKind::Network,
        }
    }

    /// HTTP status the upstream answered with, when the failure came from one.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::UpstreamApi { status, .. }
            | Self::RateLimit { status, .. }
            | Self::Overload { status, .. } => *status,
            _ => None,
        }
    }

    /// Only a literal 503 from upstream is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        self.upstream_status() == Some(503)
    }

    /// Sorts a non-2xx upstream reply into rate-limit, overload or plain API error.
    ///
    /// Status wins; otherwise the message is checked for the wording Gemini
    /// uses when quota runs out or the model is overloaded.
    pub fn from_upstream(status: Option<u16>, message: String) -> Self {
        Self::classify(status, status, message)
    }

    /// Same sorting for an `error` object found inside a 2xx body.
    ///
    /// The object's `code` only picks the variant. No HTTP status is
    /// recorded, so these never retry and plain API errors map to 500.
    pub fn from_error_object(code: Option<u16>, message: String) -> Self {
        Self::classify(code, None, message)
    }

    fn classify(code: Option<u16>, status: Option<u16>, message: String) -> Self {
        let lower = message.to_lowercase();
        if code == Some(429) || lower.contains("quota") || lower.contains("resource_exhausted") {
            Self::RateLimit { status, message }
        } else if code == Some(503)
            || lower.contains("overloaded")
            || lower.contains("unavailable")
        {
            Self::Overload { status, message }
        } else {
            Self::UpstreamApi { status, message }
        }
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else {
            err.to_string()
        };
        Self::Network { message }
    }
}
