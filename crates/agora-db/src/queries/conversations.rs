use anyhow::Result;

use super::OptionalExt;
use crate::Database;
use crate::models::ConversationRow;

impl Database {
    /// Find the direct conversation between two users, creating it when it
    /// does not exist yet. The pair is stored in lexicographic order so
    /// (a, b) and (b, a) resolve to the same row, and the lookup plus the
    /// insert happen inside one transaction so concurrent callers converge
    /// on a single id. `candidate_id` is used only when a new row is made.
    pub fn get_or_create_conversation(
        &self,
        candidate_id: &str,
        user_a: &str,
        user_b: &str,
    ) -> Result<String> {
        let (low, high) = if user_a <= user_b {
            (user_a, user_b)
        } else {
            (user_b, user_a)
        };

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT id FROM conversations WHERE user_a = ?1 AND user_b = ?2",
                    (low, high),
                    |row| row.get(0),
                )
                .optional()?;

            let id = match existing {
                Some(id) => id,
                None => {
                    tx.execute(
                        "INSERT INTO conversations (id, user_a, user_b) VALUES (?1, ?2, ?3)",
                        (candidate_id, low, high),
                    )?;
                    candidate_id.to_string()
                }
            };

            tx.commit()?;
            Ok(id)
        })
    }

    pub fn conversation_participants(&self, id: &str) -> Result<Option<(String, String)>> {
        self.with_conn(|conn| {
            let pair = conn
                .query_row(
                    "SELECT user_a, user_b FROM conversations WHERE id = ?1",
                    [id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            Ok(pair)
        })
    }

    /// Every conversation `user_id` takes part in, with the other
    /// participant's profile joined in. Newest conversation first.
    pub fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id,
                        CASE WHEN c.user_a = ?1 THEN c.user_b ELSE c.user_a END,
                        u.username, u.full_name, u.avatar_url,
                        c.created_at
                 FROM conversations c
                 LEFT JOIN users u
                   ON u.id = CASE WHEN c.user_a = ?1 THEN c.user_b ELSE c.user_a END
                 WHERE c.user_a = ?1 OR c.user_b = ?1
                 ORDER BY c.created_at DESC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(ConversationRow {
                        id: row.get(0)?,
                        other_id: row.get(1)?,
                        other_username: row.get(2)?,
                        other_full_name: row.get(3)?,
                        other_avatar_url: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::queries::testing;

    #[test]
    fn same_pair_resolves_to_one_conversation() {
        let db = testing::open();
        let alice = testing::seed_user(&db, "alice");
        let bob = testing::seed_user(&db, "bob");

        let first = db
            .get_or_create_conversation("conv-1", &alice, &bob)
            .unwrap();
        assert_eq!(first, "conv-1");

        // second resolve returns the stored id, ignoring the new candidate
        let second = db
            .get_or_create_conversation("conv-2", &alice, &bob)
            .unwrap();
        assert_eq!(second, "conv-1");
    }

    #[test]
    fn pair_order_does_not_matter() {
        let db = testing::open();
        let alice = testing::seed_user(&db, "alice");
        let bob = testing::seed_user(&db, "bob");

        let forward = db
            .get_or_create_conversation("conv-1", &alice, &bob)
            .unwrap();
        let reversed = db
            .get_or_create_conversation("conv-2", &bob, &alice)
            .unwrap();
        assert_eq!(forward, reversed);
    }

    #[test]
    fn distinct_pairs_get_distinct_conversations() {
        let db = testing::open();
        let alice = testing::seed_user(&db, "alice");
        let bob = testing::seed_user(&db, "bob");
        let carol = testing::seed_user(&db, "carol");

        let ab = db
            .get_or_create_conversation("conv-1", &alice, &bob)
            .unwrap();
        let ac = db
            .get_or_create_conversation("conv-2", &alice, &carol)
            .unwrap();
        assert_ne!(ab, ac);

        let listed = db.list_conversations(&alice).unwrap();
        assert_eq!(listed.len(), 2);
        let listed = db.list_conversations(&bob).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].other_username.as_deref(), Some("alice"));
    }

    #[test]
    fn participants_come_back_canonicalized() {
        let db = testing::open();
        let alice = testing::seed_user(&db, "alice");
        let bob = testing::seed_user(&db, "bob");

        let id = db
            .get_or_create_conversation("conv-1", &bob, &alice)
            .unwrap();
        let (a, b) = db.conversation_participants(&id).unwrap().unwrap();
        assert!(a <= b);
        assert!([&a, &b].contains(&&alice));
        assert!([&a, &b].contains(&&bob));

        assert_eq!(db.conversation_participants("ghost").unwrap(), None);
    }
}
