use diesel::result::DatabaseErrorKind;
use thiserror::Error;

/// The record collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Players,
    Teams,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Players => "players",
            Self::Teams => "teams",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Duplicate {collection}.{field}: {value}")]
    DuplicateKey {
        collection: Collection,
        field: &'static str,
        value: String,
    },

    #[error("No record in {collection} with id {id}")]
    NotFound { collection: Collection, id: String },

    #[error("{0}")]
    Validation(String),

    #[error("Parent team {0} does not exist")]
    UnknownParent(String),

    #[error("Team {team} cannot have {parent} as its parent because it would create a cycle")]
    HierarchyCycle { team: String, parent: String },

    #[error("Database Error: {0}")]
    Db(#[from] diesel::result::Error),

    #[error("Database Pool Error: {0}")]
    Pool(#[from] deadpool_diesel::PoolError),

    #[error("Failed to build database pool: {0}")]
    PoolBuild(String),

    #[error("Database connection task failed: {0}")]
    Interact(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

impl From<deadpool_diesel::InteractError> for Error {
    fn from(e: deadpool_diesel::InteractError) -> Self {
        let message = match e {
            deadpool_diesel::InteractError::Panic(_) => "panicked",
            deadpool_diesel::InteractError::Aborted => "aborted",
        };

        Error::Interact(message.to_string())
    }
}

impl Error {
    /// Convert a failed write into `DuplicateKey` if the store rejected it because of the unique
    /// index on `collection.field`. Other errors pass through unchanged.
    pub(crate) fn classify_write(
        err: diesel::result::Error,
        collection: Collection,
        field: &'static str,
        value: &str,
    ) -> Error {
        match err {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                if violates_column(info.message(), collection, field) =>
            {
                Error::DuplicateKey {
                    collection,
                    field,
                    value: value.to_string(),
                }
            }
            e => Error::Db(e),
        }
    }

    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Error::DuplicateKey { .. })
    }
}

/// SQLite reports unique violations as "UNIQUE constraint failed: table.column".
fn violates_column(message: &str, collection: Collection, field: &str) -> bool {
    let Some(columns) = message.strip_prefix("UNIQUE constraint failed: ") else {
        return false;
    };

    columns.split(", ").any(|column| {
        column
            .split_once('.')
            .map(|(table, col)| table == collection.as_str() && col == field)
            .unwrap_or(false)
    })
}
