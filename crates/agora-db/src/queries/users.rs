use anyhow::Result;
use rusqlite::Connection;

use super::OptionalExt;
use crate::Database;
use crate::models::{ProfileRow, UserRow};

impl Database {
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        full_name: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password, full_name) VALUES (?1, ?2, ?3, ?4)",
                (id, username, password_hash, full_name),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Update the mutable profile fields. Absent values leave the stored
    /// column untouched.
    pub fn update_profile(
        &self,
        id: &str,
        full_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET
                     full_name  = COALESCE(?2, full_name),
                     avatar_url = COALESCE(?3, avatar_url)
                 WHERE id = ?1",
                (id, full_name, avatar_url),
            )?;
            Ok(())
        })
    }

    /// Public profile plus the counts a profile page renders.
    pub fn get_profile(&self, id: &str) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.full_name, u.avatar_url, u.created_at,
                        (SELECT COUNT(*) FROM posts p WHERE p.author_id = u.id),
                        (SELECT COUNT(*) FROM follows f WHERE f.followee_id = u.id),
                        (SELECT COUNT(*) FROM follows f WHERE f.follower_id = u.id)
                 FROM users u
                 WHERE u.id = ?1",
            )?;

            let row = stmt
                .query_row([id], |row| {
                    Ok(ProfileRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        full_name: row.get(2)?,
                        avatar_url: row.get(3)?,
                        created_at: row.get(4)?,
                        post_count: row.get(5)?,
                        follower_count: row.get(6)?,
                        following_count: row.get(7)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, password, full_name, avatar_url, created_at
         FROM users WHERE {column} = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                full_name: row.get(3)?,
                avatar_url: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use crate::queries::testing;

    #[test]
    fn create_and_fetch_user() {
        let db = testing::open();
        let id = testing::seed_user(&db, "alice");

        let by_id = db.get_user_by_id(&id).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert_eq!(by_id.full_name, None);

        let by_name = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, id);

        assert!(db.get_user_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let db = testing::open();
        testing::seed_user(&db, "alice");

        let err = db.create_user("some-id", "alice", "hash", None);
        assert!(err.is_err());
    }

    #[test]
    fn update_profile_leaves_absent_fields_alone() {
        let db = testing::open();
        let id = testing::seed_user(&db, "alice");

        db.update_profile(&id, Some("Alice Liddell"), Some("https://cdn/a.png"))
            .unwrap();
        db.update_profile(&id, None, Some("https://cdn/b.png"))
            .unwrap();

        let user = db.get_user_by_id(&id).unwrap().unwrap();
        assert_eq!(user.full_name.as_deref(), Some("Alice Liddell"));
        assert_eq!(user.avatar_url.as_deref(), Some("https://cdn/b.png"));
    }

    #[test]
    fn profile_counts_follow_the_data() {
        let db = testing::open();
        let alice = testing::seed_user(&db, "alice");
        let bob = testing::seed_user(&db, "bob");

        testing::seed_post(&db, &alice, "first");
        testing::seed_post(&db, &alice, "second");
        db.toggle_follow("f1", &bob, &alice).unwrap();

        let profile = db.get_profile(&alice).unwrap().unwrap();
        assert_eq!(profile.post_count, 2);
        assert_eq!(profile.follower_count, 1);
        assert_eq!(profile.following_count, 0);

        assert!(db.get_profile("missing").unwrap().is_none());
    }
}
