use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Client -> Server messages ──

/// Messages the client sends to the server over WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a gig's chat room (assigned gigs, participants only).
    JoinGig { gig_id: Uuid },
    /// Leave a gig's chat room.
    LeaveGig { gig_id: Uuid },
    /// Send a chat message into a gig room.
    SendMessage { gig_id: Uuid, content: String },
    /// Mark a specific message as read.
    MarkRead { message_id: Uuid },
    /// Notify the other party that the user is typing.
    Typing { gig_id: Uuid },
    /// Notify the other party that the user stopped typing.
    StopTyping { gig_id: Uuid },
}

// ── Server -> Client messages ──

/// Messages the server sends to the client over WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Post-commit hire notification, delivered to the hired freelancer's
    /// user channel. Best-effort: dropped silently when no session is live.
    Hired {
        message: String,
        gig_id: Uuid,
        gig_title: String,
        bid_id: Uuid,
    },
    /// Confirmation that a room join succeeded.
    JoinedGig { gig_id: Uuid },
    /// A new chat message in a gig room (echoed to the sender too, so they
    /// get the server-assigned id and timestamp).
    NewMessage {
        id: Uuid,
        gig_id: Uuid,
        sender_id: Uuid,
        content: String,
        created_at: String,
    },
    /// A message was marked as read.
    MessageRead {
        gig_id: Uuid,
        message_id: Uuid,
        reader_id: Uuid,
    },
    /// The other user is typing.
    UserTyping { gig_id: Uuid, user_id: Uuid },
    /// The other user stopped typing.
    UserStopTyping { gig_id: Uuid, user_id: Uuid },
    /// Presence update: a user came online or went offline in a gig room.
    Presence {
        gig_id: Uuid,
        user_id: Uuid,
        online: bool,
    },
    /// An error occurred.
    Error { message: String },
}
