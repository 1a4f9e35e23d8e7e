use std::collections::HashSet;

use diesel::{prelude::*, SqliteConnection};
use serde::{Deserialize, Serialize};
use tracing::{event, Level};

use crate::{object_id::TeamId, schema::teams, write_transaction, Collection, Error};

/// A team. `parent` is a reference by id only: the parent does not own its children, and
/// children are found by querying on this column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Queryable, Selectable)]
#[diesel(table_name = teams)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Team {
    #[serde(rename = "_id")]
    pub id: TeamId,
    pub name: String,
    pub parent: Option<TeamId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTeam {
    pub name: String,
    #[serde(default)]
    pub parent: Option<TeamId>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = teams)]
struct TeamRow<'a> {
    id: TeamId,
    name: &'a str,
    parent: Option<TeamId>,
}

#[derive(Debug, Clone, Copy)]
pub enum TeamFilter {
    All,
    ById(TeamId),
    ByParent(TeamId),
}

fn require_name(name: &str) -> Result<(), Error> {
    if name.trim().is_empty() {
        return Err(Error::Validation("Team name is required".to_string()));
    }

    Ok(())
}

/// Walk up from `parent` and fail if `team` is reached. A parent that is missing from the store
/// is rejected. Ancestors further up that have since been deleted just end the walk.
fn check_parent(conn: &mut SqliteConnection, team: TeamId, parent: TeamId) -> Result<(), Error> {
    let mut seen = HashSet::new();
    let mut current = Some(parent);

    while let Some(ancestor) = current {
        if ancestor == team {
            return Err(Error::HierarchyCycle {
                team: team.to_string(),
                parent: parent.to_string(),
            });
        }

        if !seen.insert(ancestor) {
            break;
        }

        let next = teams::table
            .filter(teams::id.eq(ancestor))
            .select(teams::parent)
            .first::<Option<TeamId>>(conn)
            .optional()?;

        current = match next {
            Some(next) => next,
            None if ancestor == parent => {
                return Err(Error::UnknownParent(parent.to_string()));
            }
            None => None,
        };
    }

    Ok(())
}

/// Insert a new team. The parent check and the insert share one write transaction.
pub fn create(conn: &mut SqliteConnection, input: NewTeam) -> Result<Team, Error> {
    require_name(&input.name)?;

    let team = write_transaction(conn, |conn| {
        let id = TeamId::new();
        if let Some(parent) = input.parent {
            check_parent(conn, id, parent)?;
        }

        let row = TeamRow {
            id,
            name: &input.name,
            parent: input.parent,
        };

        diesel::insert_into(teams::table)
            .values(&row)
            .returning(Team::as_returning())
            .get_result::<Team>(conn)
            .map_err(|e| Error::classify_write(e, Collection::Teams, "name", &input.name))
    })?;

    event!(Level::INFO, id=%team.id, parent=?team.parent, "Created team");
    Ok(team)
}

/// Persist the current name and parent of an existing team. The parent is only checked when it
/// changes, so a team whose parent was deleted can still be saved as long as it keeps it.
pub fn save(conn: &mut SqliteConnection, team: &Team) -> Result<Team, Error> {
    require_name(&team.name)?;

    write_transaction(conn, |conn| {
        let stored = find_by_id(conn, team.id)?;
        if let Some(parent) = team.parent.filter(|p| Some(*p) != stored.parent) {
            check_parent(conn, team.id, parent)?;
        }

        diesel::update(teams::table.filter(teams::id.eq(team.id)))
            .set((teams::name.eq(&team.name), teams::parent.eq(team.parent)))
            .returning(Team::as_returning())
            .get_result::<Team>(conn)
            .optional()
            .map_err(|e| Error::classify_write(e, Collection::Teams, "name", &team.name))?
            .ok_or_else(|| not_found(team.id))
    })
}

pub fn find_by_id(conn: &mut SqliteConnection, id: TeamId) -> Result<Team, Error> {
    teams::table
        .filter(teams::id.eq(id))
        .select(Team::as_select())
        .first::<Team>(conn)
        .optional()?
        .ok_or_else(|| not_found(id))
}

pub fn list(conn: &mut SqliteConnection) -> Result<Vec<Team>, Error> {
    let result = teams::table
        .select(Team::as_select())
        .order(teams::seq)
        .load::<Team>(conn)?;
    Ok(result)
}

/// All the teams whose parent is `id`.
pub fn get_children(conn: &mut SqliteConnection, id: TeamId) -> Result<Vec<Team>, Error> {
    let result = teams::table
        .filter(teams::parent.eq(id))
        .select(Team::as_select())
        .order(teams::seq)
        .load::<Team>(conn)?;
    Ok(result)
}

pub fn remove(conn: &mut SqliteConnection, filter: TeamFilter) -> Result<usize, Error> {
    let count = match filter {
        TeamFilter::All => diesel::delete(teams::table).execute(conn)?,
        TeamFilter::ById(id) => {
            diesel::delete(teams::table.filter(teams::id.eq(id))).execute(conn)?
        }
        TeamFilter::ByParent(id) => {
            diesel::delete(teams::table.filter(teams::parent.eq(id))).execute(conn)?
        }
    };

    Ok(count)
}

fn not_found(id: TeamId) -> Error {
    Error::NotFound {
        collection: Collection::Teams,
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test::run_database_test, Pool, PoolExt};

    async fn add_team(pool: &Pool, name: &str, parent: Option<TeamId>) -> Result<Team, Error> {
        let input = NewTeam {
            name: name.to_string(),
            parent,
        };
        pool.transaction(move |conn| create(conn, input)).await
    }

    #[tokio::test]
    async fn create_and_save() {
        run_database_test(|db| async move {
            let mut ford = add_team(&db.pool, "Ford", None).await?;
            assert_eq!(ford.name, "Ford");
            assert_eq!(ford.parent, None);

            ford.name = "Ford Motors".to_string();
            let to_save = ford.clone();
            let saved = db
                .pool
                .transaction(move |conn| save(conn, &to_save))
                .await?;
            assert_eq!(saved, ford);

            let id = ford.id;
            let found = db.pool.interact(move |conn| find_by_id(conn, id)).await?;
            assert_eq!(found.name, "Ford Motors");
            Ok(())
        })
        .await
    }

    #[tokio::test]
    async fn names_are_unique() {
        run_database_test(|db| async move {
            add_team(&db.pool, "Ford", None).await?;
            let err = add_team(&db.pool, "Ford", None)
                .await
                .expect_err("duplicate name");

            match err {
                Error::DuplicateKey {
                    collection, value, ..
                } => {
                    assert_eq!(collection, Collection::Teams);
                    assert_eq!(value, "Ford");
                }
                e => panic!("Expected DuplicateKey, saw {e:?}"),
            }
            Ok(())
        })
        .await
    }

    #[tokio::test]
    async fn save_into_existing_name_fails() {
        run_database_test(|db| async move {
            add_team(&db.pool, "Ford", None).await?;
            let mut other = add_team(&db.pool, "Chevy", None).await?;

            other.name = "Ford".to_string();
            let err = db
                .pool
                .transaction(move |conn| save(conn, &other))
                .await
                .expect_err("duplicate name");
            assert!(err.is_duplicate_key(), "saw {err:?}");
            Ok(())
        })
        .await
    }

    #[tokio::test]
    async fn children() {
        run_database_test(|db| async move {
            let fire_nation = add_team(&db.pool, "Fire Nation", None).await?;
            let royalty = add_team(&db.pool, "Royalty", Some(fire_nation.id)).await?;
            let navy = add_team(&db.pool, "Navy", Some(fire_nation.id)).await?;
            let earth = add_team(&db.pool, "Earth Kingdom", None).await?;
            add_team(&db.pool, "Palace Guards", Some(royalty.id)).await?;

            let parent_id = fire_nation.id;
            let children = db
                .pool
                .interact(move |conn| get_children(conn, parent_id))
                .await?;
            assert_eq!(children, vec![royalty, navy]);

            let leaf_id = earth.id;
            let none = db
                .pool
                .interact(move |conn| get_children(conn, leaf_id))
                .await?;
            assert!(none.is_empty());
            Ok(())
        })
        .await
    }

    #[tokio::test]
    async fn unknown_parent_rejected() {
        run_database_test(|db| async move {
            let err = add_team(&db.pool, "Orphan", Some(TeamId::new()))
                .await
                .expect_err("parent does not exist");
            assert!(matches!(err, Error::UnknownParent(_)), "saw {err:?}");
            Ok(())
        })
        .await
    }

    #[tokio::test]
    async fn cycles_rejected() {
        run_database_test(|db| async move {
            let a = add_team(&db.pool, "A", None).await?;
            let b = add_team(&db.pool, "B", Some(a.id)).await?;
            let c = add_team(&db.pool, "C", Some(b.id)).await?;

            let mut looped = a.clone();
            looped.parent = Some(c.id);
            let err = db
                .pool
                .transaction(move |conn| save(conn, &looped))
                .await
                .expect_err("cycle");
            assert!(matches!(err, Error::HierarchyCycle { .. }), "saw {err:?}");

            let mut own_parent = b.clone();
            own_parent.parent = Some(b.id);
            let err = db
                .pool
                .transaction(move |conn| save(conn, &own_parent))
                .await
                .expect_err("self parent");
            assert!(matches!(err, Error::HierarchyCycle { .. }), "saw {err:?}");

            let a_id = a.id;
            let stored = db.pool.interact(move |conn| find_by_id(conn, a_id)).await?;
            assert_eq!(stored.parent, None);
            Ok(())
        })
        .await
    }

    #[tokio::test]
    async fn remove_by_parent() {
        run_database_test(|db| async move {
            let parent = add_team(&db.pool, "Parent", None).await?;
            let first = add_team(&db.pool, "First", Some(parent.id)).await?;
            add_team(&db.pool, "Second", Some(parent.id)).await?;
            let grandchild = add_team(&db.pool, "Grandchild", Some(first.id)).await?;
            let other = add_team(&db.pool, "Other", None).await?;

            let parent_id = parent.id;
            let removed = db
                .pool
                .interact(move |conn| remove(conn, TeamFilter::ByParent(parent_id)))
                .await?;
            assert_eq!(removed, 2);

            let remaining = db.pool.interact(list).await?;
            assert_eq!(remaining, vec![parent, grandchild, other]);
            Ok(())
        })
        .await
    }

    #[tokio::test]
    async fn writes_outside_a_caller_transaction() {
        run_database_test(|db| async move {
            let input = NewTeam {
                name: "Root".to_string(),
                parent: None,
            };
            let root = db.pool.interact(move |conn| create(conn, input)).await?;

            let input = NewTeam {
                name: "Leaf".to_string(),
                parent: Some(root.id),
            };
            let mut leaf = db.pool.interact(move |conn| create(conn, input)).await?;
            assert_eq!(leaf.parent, Some(root.id));

            // A rejected save leaves nothing half written.
            let mut looped = root.clone();
            looped.name = "Renamed root".to_string();
            looped.parent = Some(leaf.id);
            let err = db
                .pool
                .interact(move |conn| save(conn, &looped))
                .await
                .expect_err("cycle");
            assert!(matches!(err, Error::HierarchyCycle { .. }), "saw {err:?}");

            let root_id = root.id;
            let stored = db.pool.interact(move |conn| find_by_id(conn, root_id)).await?;
            assert_eq!(stored, root);

            leaf.parent = None;
            let saved = db.pool.interact(move |conn| save(conn, &leaf)).await?;
            assert_eq!(saved.parent, None);
            Ok(())
        })
        .await
    }

    #[tokio::test]
    async fn removing_parent_leaves_children() {
        run_database_test(|db| async move {
            let parent = add_team(&db.pool, "Parent", None).await?;
            let child = add_team(&db.pool, "Child", Some(parent.id)).await?;

            let parent_id = parent.id;
            let removed = db
                .pool
                .interact(move |conn| remove(conn, TeamFilter::ById(parent_id)))
                .await?;
            assert_eq!(removed, 1);

            let child_id = child.id;
            let stored = db
                .pool
                .interact(move |conn| find_by_id(conn, child_id))
                .await?;
            assert_eq!(stored.parent, Some(parent_id));

            // Keeping the dangling reference does not block further saves.
            let mut renamed = stored.clone();
            renamed.name = "Renamed".to_string();
            let saved = db
                .pool
                .transaction(move |conn| save(conn, &renamed))
                .await?;
            assert_eq!(saved.name, "Renamed");
            assert_eq!(saved.parent, Some(parent_id));

            // Pointing it at another missing team does.
            let mut moved = saved.clone();
            moved.parent = Some(TeamId::new());
            let err = db
                .pool
                .transaction(move |conn| save(conn, &moved))
                .await
                .expect_err("unknown parent");
            assert!(matches!(err, Error::UnknownParent(_)), "saw {err:?}");

            let removed = db
                .pool
                .interact(|conn| remove(conn, TeamFilter::All))
                .await?;
            assert_eq!(removed, 1);
            Ok(())
        })
        .await
    }
}
