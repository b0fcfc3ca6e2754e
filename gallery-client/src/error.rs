use serde_json::Value;
use thiserror::Error;

pub const UNKNOWN_ERROR: &str = "An unknown error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Http,
    Validation,
    Auth,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Unauthorized: {message}")]
    Auth {
        status: Option<u16>,
        message: String,
    },
}

impl ClientError {
    pub async fn from_http_response(resp: reqwest::Response) -> Self {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        Self::from_status_and_body(status, &body)
    }

    pub fn from_status_and_body(status: u16, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        if status == 401 {
            ClientError::Auth {
                status: Some(status),
                message,
            }
        } else {
            ClientError::Http { status, message }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::Http { .. } => ErrorKind::Http,
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Auth { .. } => ErrorKind::Auth,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Network(e) => e.status().map(|s| s.as_u16()),
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Validation(_) => None,
            ClientError::Auth { status, .. } => *status,
        }
    }

    /// Human readable message without the kind prefix.
    pub fn message(&self) -> String {
        match self {
            ClientError::Network(e) => e.to_string(),
            ClientError::Http { message, .. } | ClientError::Auth { message, .. } => {
                message.clone()
            }
            ClientError::Validation(message) => message.clone(),
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ClientError::Auth { .. })
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => ["message", "error"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.is_empty()),
        Ok(Value::String(s)) if !s.is_empty() => Some(s),
        Ok(_) => None,
        // html error pages are not worth showing to the user
        Err(_) if trimmed.starts_with('<') => None,
        Err(_) => Some(trimmed.to_string()),
    }
}
