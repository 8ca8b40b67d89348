use anyhow::Result;

use crate::Database;
use crate::models::NotificationRow;

impl Database {
    /// Append a notification for `user_id`. `post_id` and `comment_id` are
    /// present only when the kind references them.
    pub fn insert_notification(
        &self,
        id: &str,
        user_id: &str,
        actor_id: &str,
        kind: &str,
        post_id: Option<&str>,
        comment_id: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, user_id, actor_id, kind, post_id, comment_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (id, user_id, actor_id, kind, post_id, comment_id),
            )?;
            Ok(())
        })
    }

    /// The recipient's notifications, newest first, with the actor profile
    /// and the referenced post/comment joined in a single query.
    /// A user with no rows gets an empty vec, never an error.
    pub fn list_notifications(&self, user_id: &str, limit: u32) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT n.id, n.kind, n.is_read, n.created_at,
                        n.actor_id, a.username, a.full_name, a.avatar_url,
                        n.post_id, p.content, p.image_url,
                        n.comment_id, c.content
                 FROM notifications n
                 LEFT JOIN users a ON n.actor_id = a.id
                 LEFT JOIN posts p ON n.post_id = p.id
                 LEFT JOIN comments c ON n.comment_id = c.id
                 WHERE n.user_id = ?1
                 ORDER BY n.created_at DESC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map((user_id, limit), |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        kind: row.get(1)?,
                        is_read: row.get(2)?,
                        created_at: row.get(3)?,
                        actor_id: row.get(4)?,
                        actor_username: row.get(5)?,
                        actor_full_name: row.get(6)?,
                        actor_avatar_url: row.get(7)?,
                        post_id: row.get(8)?,
                        post_content: row.get(9)?,
                        post_image_url: row.get(10)?,
                        comment_id: row.get(11)?,
                        comment_content: row.get(12)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Mark every unread notification of `user_id` as read. Returns the
    /// number of rows that changed; the second call is a zero-row no-op.
    pub fn mark_all_notifications_read(&self, user_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let affected = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
                [user_id],
            )?;
            Ok(affected)
        })
    }

    /// Mark one notification as read, but only when both the id and the
    /// owner match. A missing row or a foreign owner affects zero rows and
    /// is not an error.
    pub fn mark_notification_read(&self, id: &str, user_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let affected = conn.execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ?1 AND user_id = ?2",
                (id, user_id),
            )?;
            Ok(affected)
        })
    }

    pub fn unread_notification_count(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}
