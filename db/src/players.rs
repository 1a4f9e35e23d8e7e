use diesel::{prelude::*, SqliteConnection};
use serde::{Deserialize, Serialize};
use tracing::{event, Level};

use crate::{object_id::PlayerId, schema::players, Collection, Error};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Queryable, Selectable)]
#[diesel(table_name = players)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Player {
    #[serde(rename = "_id")]
    pub id: PlayerId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPlayer {
    pub name: String,
    pub email: String,
}

/// Fields to change on a player. Fields left as `None` are not touched.
#[derive(Debug, Clone, Default, Deserialize, AsChangeset)]
#[diesel(table_name = players)]
pub struct PlayerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl PlayerUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = players)]
struct PlayerRow<'a> {
    id: PlayerId,
    name: &'a str,
    email: &'a str,
}

#[derive(Debug, Clone)]
pub enum PlayerFilter {
    All,
    ById(PlayerId),
    ByEmail(String),
}

fn require_text(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("Player {field} is required")));
    }

    Ok(())
}

pub fn create(conn: &mut SqliteConnection, input: NewPlayer) -> Result<Player, Error> {
    require_text("name", &input.name)?;
    require_text("email", &input.email)?;

    let row = PlayerRow {
        id: PlayerId::new(),
        name: &input.name,
        email: &input.email,
    };

    let player = diesel::insert_into(players::table)
        .values(&row)
        .returning(Player::as_returning())
        .get_result::<Player>(conn)
        .map_err(|e| Error::classify_write(e, Collection::Players, "email", &input.email))?;

    event!(Level::INFO, id=%player.id, "Created player");
    Ok(player)
}

pub fn find_by_id(conn: &mut SqliteConnection, id: PlayerId) -> Result<Player, Error> {
    players::table
        .filter(players::id.eq(id))
        .select(Player::as_select())
        .first::<Player>(conn)
        .optional()?
        .ok_or_else(|| not_found(id))
}

pub fn list(conn: &mut SqliteConnection) -> Result<Vec<Player>, Error> {
    let result = players::table
        .select(Player::as_select())
        .order(players::seq)
        .load::<Player>(conn)?;
    Ok(result)
}

pub fn update(
    conn: &mut SqliteConnection,
    id: PlayerId,
    changes: PlayerUpdate,
) -> Result<Player, Error> {
    if let Some(name) = changes.name.as_deref() {
        require_text("name", name)?;
    }
    if let Some(email) = changes.email.as_deref() {
        require_text("email", email)?;
    }

    if changes.is_empty() {
        return find_by_id(conn, id);
    }

    diesel::update(players::table.filter(players::id.eq(id)))
        .set(&changes)
        .returning(Player::as_returning())
        .get_result::<Player>(conn)
        .optional()
        .map_err(|e| {
            Error::classify_write(
                e,
                Collection::Players,
                "email",
                changes.email.as_deref().unwrap_or_default(),
            )
        })?
        .ok_or_else(|| not_found(id))
}

/// Delete every player matching `filter`, returning how many were removed.
pub fn remove(conn: &mut SqliteConnection, filter: PlayerFilter) -> Result<usize, Error> {
    let count = match filter {
        PlayerFilter::All => diesel::delete(players::table).execute(conn)?,
        PlayerFilter::ById(id) => {
            diesel::delete(players::table.filter(players::id.eq(id))).execute(conn)?
        }
        PlayerFilter::ByEmail(email) => {
            diesel::delete(players::table.filter(players::email.eq(email))).execute(conn)?
        }
    };

    Ok(count)
}

fn not_found(id: PlayerId) -> Error {
    Error::NotFound {
        collection: Collection::Players,
        id: id.to_string(),
    }
}
