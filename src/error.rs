use thiserror::Error;

pub type ReportResult<T> = Result<T, ReportError>;

/// Failure of a single page request against the reporting API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("reporting API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("undecodable response: {0}")]
    Decode(String),
    #[error("response contained no report section")]
    MissingReport,
}

impl FetchError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Transport failures, throttling and server-side errors are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) | Self::MissingReport => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustionReason {
    RepeatedCursor,
    PageLimit,
}

impl std::fmt::Display for ExhaustionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RepeatedCursor => f.write_str("cursor was already used in this run"),
            Self::PageLimit => f.write_str("page limit reached"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("pagination did not terminate after {pages} pages at cursor {cursor:?}: {reason}")]
    ExhaustedPagination {
        pages: usize,
        cursor: String,
        reason: ExhaustionReason,
    },
    #[error("aggregation is empty or totals zero; percentages are undefined")]
    EmptyAggregation,
}
