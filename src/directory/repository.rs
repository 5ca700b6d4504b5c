// Repository pattern - isolates all database side effects
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

use crate::db::models::{User, UserPage, UserSummary};
use crate::directory::domain::{like_pattern, ListParams, SearchPredicate};
use crate::state::DbPool;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// One page of summaries plus the size of the whole matching set
    async fn list(&self, params: &ListParams) -> Result<UserPage, RepositoryError>;

    async fn get(&self, id: &str) -> Result<Option<User>, RepositoryError>;

    /// Every record, ordered by id, biography included
    async fn all(&self) -> Result<Vec<User>, RepositoryError>;

    /// Replace a biography and its index entry together
    async fn update_story(&self, id: &str, story: &str) -> Result<(), RepositoryError>;

    /// Upsert records by id, then rebuild the index. Returns records written.
    async fn import(&self, users: &[User]) -> Result<usize, RepositoryError>;

    /// Regenerate the whole index from the users table. Returns entries written.
    async fn rebuild_index(&self) -> Result<usize, RepositoryError>;
}

pub struct SqliteDirectoryRepository {
    pool: DbPool,
}

impl SqliteDirectoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// FROM/WHERE fragment shared by the count and page queries, with the
/// qualifier the projection and ORDER BY must use.
struct Filter {
    from_where: String,
    qualifier: &'static str,
    param: Option<String>,
}

impl Filter {
    fn new(predicate: &SearchPredicate) -> Self {
        match predicate {
            SearchPredicate::FullText(query) => Filter {
                from_where: "FROM users_fts f JOIN users u ON u.seq = f.rowid WHERE f MATCH ?1"
                    .to_string(),
                qualifier: "u.",
                param: Some(query.clone()),
            },
            SearchPredicate::Substring(needle) if needle.is_empty() => Filter {
                from_where: "FROM users".to_string(),
                qualifier: "",
                param: None,
            },
            SearchPredicate::Substring(needle) => Filter {
                from_where: "FROM users \
                    WHERE lower(id) LIKE ?1 ESCAPE '\\' \
                    OR lower(name) LIKE ?1 ESCAPE '\\' \
                    OR lower(country) LIKE ?1 ESCAPE '\\' \
                    OR lower(city) LIKE ?1 ESCAPE '\\'"
                    .to_string(),
                qualifier: "",
                param: Some(like_pattern(needle)),
            },
        }
    }

    fn count(&self, conn: &Connection) -> rusqlite::Result<i64> {
        let sql = format!("SELECT COUNT(*) {}", self.from_where);
        match &self.param {
            Some(p) => conn.query_row(&sql, params![p], |row| row.get(0)),
            None => conn.query_row(&sql, [], |row| row.get(0)),
        }
    }

    fn page(&self, conn: &Connection, list: &ListParams) -> rusqlite::Result<Vec<UserSummary>> {
        let q = self.qualifier;
        // Placeholders are numbered after the optional filter parameter
        let (limit_at, offset_at) = if self.param.is_some() { (2, 3) } else { (1, 2) };
        let sql = format!(
            "SELECT {q}id, {q}name, {q}country, {q}city, {q}photo {} ORDER BY {} LIMIT ?{} OFFSET ?{}",
            self.from_where,
            list.order_by(q),
            limit_at,
            offset_at,
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = match &self.param {
            Some(p) => stmt.query_map(params![p, list.limit, list.offset()], map_summary)?,
            None => stmt.query_map(params![list.limit, list.offset()], map_summary)?,
        };
        rows.collect()
    }
}

fn map_summary(row: &Row<'_>) -> rusqlite::Result<UserSummary> {
    Ok(UserSummary {
        id: row.get(0)?,
        name: row.get(1)?,
        country: row.get(2)?,
        city: row.get(3)?,
        photo: row.get(4)?,
    })
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        country: row.get(2)?,
        city: row.get(3)?,
        story: row.get(4)?,
        photo: row.get(5)?,
    })
}

fn rebuild_index_with(conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM users_fts", [])?;
    conn.execute(
        "INSERT INTO users_fts (rowid, name, story) SELECT seq, name, story FROM users",
        [],
    )
}

#[async_trait]
impl DirectoryRepository for SqliteDirectoryRepository {
    async fn list(&self, params: &ListParams) -> Result<UserPage, RepositoryError> {
        let conn = self.pool.get()?;
        let filter = Filter::new(&params.predicate);

        let total = filter.count(&conn)?;
        let results = filter.page(&conn, params)?;

        Ok(UserPage {
            total,
            page: params.page,
            limit: params.limit,
            results,
        })
    }

    async fn get(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                "SELECT id, name, country, city, story, photo FROM users WHERE id = ?1",
                params![id],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    async fn all(&self) -> Result<Vec<User>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, country, city, story, photo FROM users ORDER BY id ASC",
        )?;
        let users = stmt
            .query_map([], map_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    async fn update_story(&self, id: &str, story: &str) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let changed = tx.execute(
            "UPDATE users SET story = ?1 WHERE id = ?2",
            params![story, id],
        )?;
        if changed == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        let (seq, name): (i64, String) = tx.query_row(
            "SELECT seq, name FROM users WHERE id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        // Delete then insert: FTS5 has no upsert and a second row would double-match
        tx.execute("DELETE FROM users_fts WHERE rowid = ?1", params![seq])?;
        tx.execute(
            "INSERT INTO users_fts (rowid, name, story) VALUES (?1, ?2, ?3)",
            params![seq, name, story],
        )?;

        tx.commit()?;
        Ok(())
    }

    async fn import(&self, users: &[User]) -> Result<usize, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO users (id, name, country, city, story, photo)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                   name = excluded.name,
                   country = excluded.country,
                   city = excluded.city,
                   story = excluded.story,
                   photo = excluded.photo",
            )?;
            for user in users {
                stmt.execute(params![
                    user.id,
                    user.name,
                    user.country,
                    user.city,
                    user.story,
                    user.photo
                ])?;
            }
        }

        let indexed = rebuild_index_with(&tx)?;
        tx.commit()?;

        tracing::debug!("Indexed {} users after import", indexed);
        Ok(users.len())
    }

    async fn rebuild_index(&self) -> Result<usize, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let indexed = rebuild_index_with(&tx)?;
        tx.commit()?;
        Ok(indexed)
    }
}
