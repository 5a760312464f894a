#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("submission request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("submission rejected by {endpoint} (status={status}): {body}")]
    Rejected {
        endpoint: String,
        status: u16,
        body: String,
    },
}

impl SubmissionError {
    /// HTTP status returned by the endpoint, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { .. } => None,
            Self::Rejected { status, .. } => Some(*status),
        }
    }
}
