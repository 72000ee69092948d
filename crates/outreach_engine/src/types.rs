use serde_json::{Map, Value};

/// One JSON object as exchanged with the webhooks.
pub type JsonObject = Map<String, Value>;

/// Builds the request body for one row of a batch.
pub type PayloadBuilder = fn(&JsonObject) -> Value;

/// Longest slice of a response body quoted in an error message.
pub const MAX_BODY_EXCERPT: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("invalid webhook url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("webhook returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("webhook reported an error: {0}")]
    Rejected(String),
}

impl ClientError {
    /// Transport failures, timeouts included.
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Timeout(_))
    }
}

/// Outcome of the call for one row.
pub type RowOutcome = Result<(), ClientError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// 0-based row index.
    pub index: usize,
    pub total: usize,
    pub outcome: RowOutcome,
}

impl BatchProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.index + 1) as f64 / self.total as f64
        }
    }
}

/// Outcomes of a finished batch, in row order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub outcomes: Vec<RowOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_ok()).count()
    }

    /// True for an empty batch.
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(Result::is_ok)
    }
}

/// Which webhook a batch goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchTarget {
    Persist,
    Send,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SearchCompleted {
        query: String,
        result: Result<Vec<JsonObject>, ClientError>,
    },
    BatchProgress(BatchProgress),
    BatchCompleted {
        target: BatchTarget,
        report: BatchReport,
    },
    DraftsGenerated(Result<Vec<JsonObject>, ClientError>),
}

/// Cuts `text` to at most [`MAX_BODY_EXCERPT`] bytes on a char boundary.
pub(crate) fn excerpt(text: &str) -> String {
    if text.len() <= MAX_BODY_EXCERPT {
        return text.to_string();
    }
    let mut end = MAX_BODY_EXCERPT;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
