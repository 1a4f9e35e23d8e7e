mod error;
mod schema;

pub mod object_id;
pub mod players;
pub mod teams;

pub use error::*;

use async_trait::async_trait;
use diesel::{
    connection::{AnsiTransactionManager, SimpleConnection, TransactionManager},
    Connection, RunQueryDsl, SqliteConnection,
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};
use tracing::{event, Level};

pub type Pool = deadpool_diesel::sqlite::Pool;

const MIGRATIONS: EmbeddedMigrations = diesel_migrations::embed_migrations!();

/// How long a connection waits for another writer to release the database before failing.
const BUSY_TIMEOUT_MS: u32 = 5000;

pub fn connect(conn_str: &str, max_connections: usize) -> Result<Pool, Error> {
    let manager =
        deadpool_diesel::sqlite::Manager::new(conn_str, deadpool_diesel::Runtime::Tokio1);
    Pool::builder(manager)
        .max_size(max_connections)
        .build()
        .map_err(|e| Error::PoolBuild(e.to_string()))
}

/// Apply any pending schema migrations.
pub async fn migrate(pool: &Pool) -> Result<(), Error> {
    let applied = pool
        .interact(|conn| {
            conn.batch_execute("PRAGMA journal_mode = WAL;")?;
            conn.run_pending_migrations(MIGRATIONS)
                .map(|versions| versions.len())
                .map_err(|e| Error::Migration(e.to_string()))
        })
        .await?;

    event!(Level::INFO, applied, "Database migrations complete");
    Ok(())
}

pub fn new_uuid() -> uuid::Uuid {
    ulid::Ulid::new().into()
}

#[async_trait]
pub trait PoolExt<F, RETVAL, ERR>
where
    F: (FnOnce(&mut SqliteConnection) -> Result<RETVAL, ERR>) + Send + 'static,
    RETVAL: Send + 'static,
    ERR: Send + 'static,
{
    async fn interact(&self, f: F) -> Result<RETVAL, ERR>;
    async fn transaction(&self, f: F) -> Result<RETVAL, ERR>;
}

#[async_trait]
impl<F, RETVAL, ERR> PoolExt<F, RETVAL, ERR> for Pool
where
    F: (FnOnce(&mut SqliteConnection) -> Result<RETVAL, ERR>) + Send + 'static,
    RETVAL: Send + 'static,
    ERR: From<Error> + From<diesel::result::Error> + Send + 'static,
{
    async fn interact(&self, f: F) -> Result<RETVAL, ERR> {
        let conn = self.get().await.map_err(Error::from)?;
        conn.interact(move |conn| {
            set_busy_timeout(conn)?;
            f(conn)
        })
        .await
        .map_err(Error::from)?
    }

    async fn transaction(&self, f: F) -> Result<RETVAL, ERR> {
        let conn = self.get().await.map_err(Error::from)?;
        conn.interact(move |conn| {
            set_busy_timeout(conn)?;
            conn.immediate_transaction(move |conn| f(conn))
        })
        .await
        .map_err(Error::from)?
    }
}

/// Run `f` in an immediate (write-locked) transaction, or in a savepoint when the caller already
/// opened one.
pub(crate) fn write_transaction<T, F>(conn: &mut SqliteConnection, f: F) -> Result<T, Error>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T, Error>,
{
    let depth = AnsiTransactionManager::transaction_manager_status_mut(conn).transaction_depth()?;
    if depth.is_some() {
        conn.transaction(f)
    } else {
        conn.immediate_transaction(f)
    }
}

fn set_busy_timeout(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    conn.batch_execute(&format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"))
}

/// A trivial query to check that the database is reachable.
pub fn ping(conn: &mut SqliteConnection) -> Result<(), Error> {
    diesel::sql_query("SELECT 1").execute(conn)?;
    Ok(())
}
