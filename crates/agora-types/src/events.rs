use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events sent over the change-feed WebSocket.
///
/// Change events are coarse invalidation signals: they name the scope that
/// changed and nothing else. A client reacts by refetching its current view,
/// never by applying a diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum FeedEvent {
    /// Server confirms successful identification
    Ready { user_id: Uuid, username: String },

    /// A message in this conversation was inserted, updated or deleted
    MessagesChanged { conversation_id: Uuid },

    /// A reaction on one of this conversation's messages changed
    ReactionsChanged { conversation_id: Uuid },
}

impl FeedEvent {
    /// Returns the conversation this event is scoped to. Events that return
    /// `None` are connection-level and never fan out through the hub.
    pub fn conversation_id(&self) -> Option<Uuid> {
        match self {
            Self::MessagesChanged { conversation_id } => Some(*conversation_id),
            Self::ReactionsChanged { conversation_id } => Some(*conversation_id),
            Self::Ready { .. } => None,
        }
    }
}

/// Commands sent FROM client TO server over the change-feed WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum FeedCommand {
    /// Authenticate the WebSocket connection
    Identify { token: String },

    /// Watch one conversation's messages and reactions. Replaces any
    /// previous subscription on this connection.
    Subscribe { conversation_id: Uuid },

    /// Stop watching. The connection stays open.
    Unsubscribe,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_use_tagged_wire_shape() {
        let id = Uuid::new_v4();
        let json =
            serde_json::to_value(FeedEvent::MessagesChanged { conversation_id: id }).unwrap();
        assert_eq!(json["type"], "MessagesChanged");
        assert_eq!(json["data"]["conversation_id"], id.to_string());
    }

    #[test]
    fn scope_accessor_matches_variant() {
        let id = Uuid::new_v4();
        assert_eq!(
            FeedEvent::ReactionsChanged { conversation_id: id }.conversation_id(),
            Some(id)
        );
        assert_eq!(
            FeedEvent::Ready { user_id: id, username: "alice".into() }.conversation_id(),
            None
        );
    }

    #[test]
    fn commands_parse_from_client_json() {
        let id = Uuid::new_v4();
        let raw = format!(
            "{{\"type\":\"Subscribe\",\"data\":{{\"conversation_id\":\"{id}\"}}}}"
        );
        let cmd: FeedCommand = serde_json::from_str(&raw).unwrap();
        assert!(matches!(cmd, FeedCommand::Subscribe { conversation_id } if conversation_id == id));

        let cmd: FeedCommand = serde_json::from_str("{\"type\":\"Unsubscribe\"}").unwrap();
        assert!(matches!(cmd, FeedCommand::Unsubscribe));
    }
}
