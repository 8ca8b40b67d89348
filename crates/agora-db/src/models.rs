/// Database row types — these map directly to SQLite rows.
/// Distinct from agora-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

pub struct ProfileRow {
    pub id: String,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub post_count: i64,
    pub follower_count: i64,
    pub following_count: i64,
}

pub struct PostRow {
    pub id: String,
    pub author_id: String,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: String,
}

/// A post as the feed lists it, with the author joined in and the
/// aggregate counts the client renders next to it.
pub struct PostListRow {
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub like_count: i64,
    pub comment_count: i64,
}

pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: String,
}

/// A notification joined with the actor's public profile and, when the
/// kind references them, the post and comment snapshots. The nullable
/// columns come from LEFT JOINs.
pub struct NotificationRow {
    pub id: String,
    pub kind: String,
    pub is_read: bool,
    pub created_at: String,
    pub actor_id: String,
    pub actor_username: Option<String>,
    pub actor_full_name: Option<String>,
    pub actor_avatar_url: Option<String>,
    pub post_id: Option<String>,
    pub post_content: Option<String>,
    pub post_image_url: Option<String>,
    pub comment_id: Option<String>,
    pub comment_content: Option<String>,
}

/// A conversation from one participant's point of view: the row plus the
/// other participant's public profile.
pub struct ConversationRow {
    pub id: String,
    pub other_id: String,
    pub other_username: Option<String>,
    pub other_full_name: Option<String>,
    pub other_avatar_url: Option<String>,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub conversation_id: String,
    pub author_id: String,
    pub author_username: String,
    pub content: String,
    pub created_at: String,
}

pub struct ReactionRow {
    pub id: String,
    pub message_id: String,
    pub user_id: String,
    pub emoji: String,
    pub created_at: String,
}
