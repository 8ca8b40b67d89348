use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The public subset of a user account. Every other entity references
/// profiles as actor or target; the password hash never leaves agora-db.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// What a notification is about. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Follow => "follow",
        }
    }

    /// Parse a stored kind. Returns `None` for anything this version
    /// does not know about so callers can skip the row instead of failing
    /// the whole page.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "like" => Some(Self::Like),
            "comment" => Some(Self::Comment),
            "follow" => Some(Self::Follow),
            _ => None,
        }
    }
}

/// A recorded user-to-post engagement event. Append-only telemetry;
/// duplicate rows are allowed and nothing parses the stored text back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    View,
    Like,
    Comment,
    Share,
    Save,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Share => "share",
            Self::Save => "save",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_kind_text_roundtrip() {
        for kind in [
            NotificationKind::Like,
            NotificationKind::Comment,
            NotificationKind::Follow,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(NotificationKind::parse("mention"), None);
    }

    #[test]
    fn interaction_kind_deserializes_snake_case() {
        let kind: InteractionKind = serde_json::from_str("\"view\"").unwrap();
        assert_eq!(kind, InteractionKind::View);
        assert_eq!(InteractionKind::Save.as_str(), "save");
    }
}
