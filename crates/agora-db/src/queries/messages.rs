use anyhow::Result;

use super::OptionalExt;
use crate::Database;
use crate::models::{MessageRow, ReactionRow};

impl Database {
    pub fn insert_message(
        &self,
        id: &str,
        conversation_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_id, author_id, content) VALUES (?1, ?2, ?3, ?4)",
                (id, conversation_id, author_id, content),
            )?;
            Ok(())
        })
    }

    /// Latest messages in a conversation, newest first. `before` is a
    /// `created_at` cursor: when set, only strictly older messages come
    /// back, which gives pages that do not overlap.
    pub fn get_messages(
        &self,
        conversation_id: &str,
        limit: u32,
        before: Option<&str>,
    ) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            // JOIN users to fetch author_username in a single query (eliminates N+1)
            let mut stmt = conn.prepare(
                "SELECT m.id, m.conversation_id, m.author_id, u.username, m.content, m.created_at
                 FROM messages m
                 LEFT JOIN users u ON m.author_id = u.id
                 WHERE m.conversation_id = ?1
                   AND (?3 IS NULL OR m.created_at < ?3)
                 ORDER BY m.created_at DESC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(rusqlite::params![conversation_id, limit, before], |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        conversation_id: row.get(1)?,
                        author_id: row.get(2)?,
                        author_username: row
                            .get::<_, Option<String>>(3)?
                            .unwrap_or_else(|| "unknown".to_string()),
                        content: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Toggle a reaction: removes if exists, inserts if not.
    /// Returns true when the reaction was added, false when removed.
    pub fn toggle_message_reaction(
        &self,
        id: &str,
        message_id: &str,
        user_id: &str,
        emoji: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM message_reactions
                     WHERE message_id = ?1 AND user_id = ?2 AND emoji = ?3",
                    (message_id, user_id, emoji),
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(existing_id) = existing {
                conn.execute(
                    "DELETE FROM message_reactions WHERE id = ?1",
                    [&existing_id],
                )?;
                Ok(false)
            } else {
                conn.execute(
                    "INSERT INTO message_reactions (id, message_id, user_id, emoji)
                     VALUES (?1, ?2, ?3, ?4)",
                    (id, message_id, user_id, emoji),
                )?;
                Ok(true)
            }
        })
    }

    pub fn get_message_conversation(&self, message_id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let id = conn
                .query_row(
                    "SELECT conversation_id FROM messages WHERE id = ?1",
                    [message_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(id)
        })
    }

    pub fn get_reactions_for_messages(&self, message_ids: &[String]) -> Result<Vec<ReactionRow>> {
        if message_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=message_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT id, message_id, user_id, emoji, created_at FROM message_reactions WHERE message_id IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = message_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), |row| {
                    Ok(ReactionRow {
                        id: row.get(0)?,
                        message_id: row.get(1)?,
                        user_id: row.get(2)?,
                        emoji: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}
