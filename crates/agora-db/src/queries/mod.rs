mod conversations;
mod messages;
mod notifications;
mod social;
mod users;

use anyhow::Result;

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::Database;
    use uuid::Uuid;

    pub fn open() -> Database {
        Database::open_in_memory().expect("in-memory db")
    }

    pub fn seed_user(db: &Database, username: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, username, "argon2-hash", None)
            .expect("seed user");
        id
    }

    pub fn seed_post(db: &Database, author_id: &str, content: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.insert_post(&id, author_id, content, None)
            .expect("seed post");
        id
    }

    /// Rewrite a row's created_at so ordering and window tests do not
    /// depend on the one-second clock granularity of datetime('now').
    pub fn backdate(db: &Database, table: &str, id: &str, modifier: &str) {
        db.with_conn(|conn| {
            let sql = format!(
                "UPDATE {table} SET created_at = datetime('now', '{modifier}') WHERE id = ?1"
            );
            conn.execute(&sql, [id])?;
            Ok(())
        })
        .expect("backdate row");
    }
}
