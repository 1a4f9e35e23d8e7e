use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use roster_db::Collection;
use thiserror::Error;

use roster_http_errors::{ErrorResponseData, MessageResponseData};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] roster_db::Error),

    #[error("Unknown {0}")]
    ObjectNotFound(&'static str),
}

/// The message shown to clients when a write collides with an existing unique value.
pub fn duplicate_message(collection: Collection, value: &str) -> String {
    match collection {
        Collection::Players => format!("A player with email {value} already exists"),
        Collection::Teams => format!("A team with name {value} already exists"),
    }
}

impl Error {
    fn error_kind(&self) -> &'static str {
        match self {
            Error::Db(e) => match e {
                roster_db::Error::DuplicateKey { .. } => "duplicate_key",
                roster_db::Error::NotFound { .. } => "not_found",
                roster_db::Error::Validation(_) => "validation",
                roster_db::Error::UnknownParent(_) => "validation",
                roster_db::Error::HierarchyCycle { .. } => "validation",
                roster_db::Error::Pool(_) | roster_db::Error::PoolBuild(_) => "db_pool",
                roster_db::Error::Db(_)
                | roster_db::Error::Interact(_)
                | roster_db::Error::Migration(_) => "db",
            },
            Error::ObjectNotFound(_) => "not_found",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::Db(roster_db::Error::DuplicateKey { .. }) => StatusCode::CONFLICT,
            Error::Db(roster_db::Error::NotFound { .. }) => StatusCode::NOT_FOUND,
            Error::Db(
                roster_db::Error::Validation(_)
                | roster_db::Error::UnknownParent(_)
                | roster_db::Error::HierarchyCycle { .. },
            ) => StatusCode::BAD_REQUEST,
            Error::ObjectNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn response_tuple(&self) -> (StatusCode, ErrorResponseData) {
        (
            self.status(),
            ErrorResponseData::new(self.error_kind(), self.to_string()),
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if let Error::Db(roster_db::Error::DuplicateKey {
            collection, value, ..
        }) = &self
        {
            let body = MessageResponseData::new(
                self.error_kind(),
                duplicate_message(*collection, value),
            );
            return (self.status(), Json(body)).into_response();
        }

        let (code, json) = self.response_tuple();
        (code, Json(json)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_player_is_conflict() {
        let err = Error::from(roster_db::Error::DuplicateKey {
            collection: Collection::Players,
            field: "email",
            value: "neo@matrix.com".to_string(),
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(
            duplicate_message(Collection::Players, "neo@matrix.com"),
            "A player with email neo@matrix.com already exists"
        );
    }

    #[test]
    fn hierarchy_errors_are_client_errors() {
        let err = Error::from(roster_db::Error::HierarchyCycle {
            team: "tema".to_string(),
            parent: "temb".to_string(),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = Error::from(roster_db::Error::UnknownParent("temc".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_failures_are_server_errors() {
        let err = Error::from(roster_db::Error::Interact("aborted".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_kind(), "db");
    }
}
