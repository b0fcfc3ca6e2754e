use gallery_client::ClientError;
use tracing::warn;

pub const SESSION_EXPIRED: &str = "Session expired. Please login again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient user-facing message, the toast of a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Set when the caller should send the user back to the login screen.
    pub session_expired: bool,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            session_expired: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            session_expired: false,
        }
    }

    /// `fallback` is shown when the error carries no message of its own.
    pub fn from_error(fallback: &str, err: &ClientError) -> Self {
        warn!(error = %err, "{fallback}");
        if err.is_session_expired() {
            return Self {
                level: NoticeLevel::Error,
                message: SESSION_EXPIRED.into(),
                session_expired: true,
            };
        }

        let message = err.message();
        if message.trim().is_empty() {
            Self::error(fallback)
        } else {
            Self::error(message)
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_request_a_login_redirect() {
        let err = ClientError::from_status_and_body(401, "");
        let notice = Notice::from_error("Failed to fetch posts", &err);
        assert!(notice.session_expired);
        assert_eq!(notice.message, SESSION_EXPIRED);
    }

    #[test]
    fn backend_message_wins_over_fallback() {
        let err = ClientError::from_status_and_body(404, r#"{"message":"Post not found"}"#);
        let notice = Notice::from_error("Failed to delete post", &err);
        assert!(notice.is_error());
        assert!(!notice.session_expired);
        assert_eq!(notice.message, "Post not found");
    }

    #[test]
    fn empty_message_uses_fallback() {
        let err = ClientError::Validation(String::new());
        assert_eq!(Notice::from_error("Failed", &err).message, "Failed");
    }
}
