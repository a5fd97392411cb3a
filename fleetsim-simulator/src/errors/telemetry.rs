#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid base url '{0}'")]
    InvalidUrl(String),
}

impl TelemetryError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TelemetryError::Status { status, .. } => Some(*status),
            TelemetryError::Http(e) => e.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// The service rejected the request because the entity already exists.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
