use anyhow::Result;

use super::OptionalExt;
use crate::Database;
use crate::models::{CommentRow, PostListRow, PostRow};

impl Database {
    // -- Posts --

    pub fn insert_post(
        &self,
        id: &str,
        author_id: &str,
        content: &str,
        image_url: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO posts (id, author_id, content, image_url) VALUES (?1, ?2, ?3, ?4)",
                (id, author_id, content, image_url),
            )?;
            Ok(())
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, author_id, content, image_url, created_at FROM posts WHERE id = ?1",
            )?;

            let row = stmt
                .query_row([id], |row| {
                    Ok(PostRow {
                        id: row.get(0)?,
                        author_id: row.get(1)?,
                        content: row.get(2)?,
                        image_url: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }

    pub fn list_posts(&self, limit: u32) -> Result<Vec<PostListRow>> {
        self.with_conn(|conn| {
            // JOIN users for the author name, subselects for the counts the
            // feed renders (single query, no N+1)
            let mut stmt = conn.prepare(
                "SELECT p.id, p.author_id, u.username, p.content, p.image_url, p.created_at,
                        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id),
                        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id)
                 FROM posts p
                 LEFT JOIN users u ON p.author_id = u.id
                 ORDER BY p.created_at DESC
                 LIMIT ?1",
            )?;

            let rows = stmt
                .query_map([limit], |row| {
                    Ok(PostListRow {
                        id: row.get(0)?,
                        author_id: row.get(1)?,
                        author_username: row
                            .get::<_, Option<String>>(2)?
                            .unwrap_or_else(|| "unknown".to_string()),
                        content: row.get(3)?,
                        image_url: row.get(4)?,
                        created_at: row.get(5)?,
                        like_count: row.get(6)?,
                        comment_count: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Likes --

    /// Toggle a like: removes if present, inserts if not.
    /// Returns true when the like was added.
    pub fn toggle_like(&self, id: &str, post_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM likes WHERE post_id = ?1 AND user_id = ?2",
                    (post_id, user_id),
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(existing_id) = existing {
                conn.execute("DELETE FROM likes WHERE id = ?1", [&existing_id])?;
                Ok(false)
            } else {
                conn.execute(
                    "INSERT INTO likes (id, post_id, user_id) VALUES (?1, ?2, ?3)",
                    (id, post_id, user_id),
                )?;
                Ok(true)
            }
        })
    }

    // -- Comments --

    pub fn insert_comment(
        &self,
        id: &str,
        post_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO comments (id, post_id, author_id, content) VALUES (?1, ?2, ?3, ?4)",
                (id, post_id, author_id, content),
            )?;
            Ok(())
        })
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, post_id, author_id, content, created_at FROM comments WHERE id = ?1",
            )?;

            let row = stmt
                .query_row([id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        post_id: row.get(1)?,
                        author_id: row.get(2)?,
                        content: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }

    // -- Follows --

    /// Toggle a follow edge. Returns true when the follow was added.
    pub fn toggle_follow(&self, id: &str, follower_id: &str, followee_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
                    (follower_id, followee_id),
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(existing_id) = existing {
                conn.execute("DELETE FROM follows WHERE id = ?1", [&existing_id])?;
                Ok(false)
            } else {
                conn.execute(
                    "INSERT INTO follows (id, follower_id, followee_id) VALUES (?1, ?2, ?3)",
                    (id, follower_id, followee_id),
                )?;
                Ok(true)
            }
        })
    }

    // -- Interactions --

    /// Append one engagement event. No uniqueness: a second identical call
    /// appends a second row.
    pub fn record_interaction(
        &self,
        id: &str,
        user_id: &str,
        post_id: &str,
        kind: &str,
        duration_secs: Option<f64>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO interactions (id, user_id, post_id, kind, duration_secs)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, user_id, post_id, kind, duration_secs),
            )?;
            Ok(())
        })
    }

    /// Whether the user already has a view of this post younger than
    /// `window_secs`. Supports the optional view-coalescing window.
    pub fn has_recent_view(&self, user_id: &str, post_id: &str, window_secs: u64) -> Result<bool> {
        self.with_conn(|conn| {
            let modifier = format!("-{window_secs} seconds");
            let hit: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM interactions
                     WHERE user_id = ?1 AND post_id = ?2 AND kind = 'view'
                       AND created_at > datetime('now', ?3)
                     LIMIT 1",
                    (user_id, post_id, modifier.as_str()),
                    |row| row.get(0),
                )
                .optional()?;

            Ok(hit.is_some())
        })
    }
}
