use serde::Serialize;
use std::borrow::Cow;
use tracing::{event, Level};

/// The standard error body: `{"error": {"kind": ..., "message": ...}}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponseData {
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    kind: Cow<'static, str>,
    message: Cow<'static, str>,
}

impl ErrorResponseData {
    pub fn new(
        kind: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> ErrorResponseData {
        let ret = ErrorResponseData {
            error: ErrorDetails {
                kind: kind.into(),
                message: message.into(),
            },
        };

        event!(Level::ERROR, kind=%ret.error.kind, message=%ret.error.message);

        ret
    }
}

/// A bare `{"message": ...}` body, used for conflicts that clients show directly to users.
#[derive(Debug, Serialize)]
pub struct MessageResponseData {
    message: String,
}

impl MessageResponseData {
    pub fn new(kind: &str, message: impl Into<String>) -> MessageResponseData {
        let ret = MessageResponseData {
            message: message.into(),
        };

        event!(Level::WARN, kind, message=%ret.message);

        ret
    }
}

/// Body returned with a 200 status when a looked-up object does not exist.
#[derive(Debug, Serialize)]
pub struct MissingObjectData {
    #[serde(rename = "errorMessage")]
    error_message: String,
}

impl MissingObjectData {
    pub fn new(object_type: &str, id: &str) -> MissingObjectData {
        let ret = MissingObjectData {
            error_message: format!("{object_type} with id {id} does not exist."),
        };

        event!(Level::INFO, message=%ret.error_message);

        ret
    }
}
