use std::collections::HashMap;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::realtime::protocol::ServerMessage;

/// A handle to send messages to one connected WebSocket session.
///
/// `conn_id` identifies the individual connection — a user may hold several
/// at once (multiple tabs), and each registers its own handle.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub conn_id: Uuid,
    pub user_id: Uuid,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

/// Registry of live WebSocket connections.
///
/// Two maps: per-user channels (every session registers here on connect, so
/// the hire engine can reach a freelancer directly) and per-gig chat rooms
/// (sessions join explicitly after an access check). Always injected as an
/// `Arc` through app data, never a process global, so the hire path stays
/// testable without real sockets.
pub struct Hub {
    /// user_id -> all of that user's connected sessions
    channels: RwLock<HashMap<Uuid, Vec<ClientHandle>>>,
    /// gig_id -> sessions currently in that gig's chat room
    rooms: RwLock<HashMap<Uuid, Vec<ClientHandle>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection under the user's channel.
    /// Returns the handle (kept by the session) and the receiver the
    /// session should listen on.
    pub async fn connect(
        &self,
        user_id: Uuid,
    ) -> (ClientHandle, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = ClientHandle {
            conn_id: Uuid::new_v4(),
            user_id,
            sender: tx,
        };

        let mut channels = self.channels.write().await;
        channels
            .entry(user_id)
            .or_insert_with(Vec::new)
            .push(handle.clone());

        (handle, rx)
    }

    /// Deregister a connection: drop it from the user channel and from any
    /// room it joined, emitting offline presence where the user's last
    /// connection left.
    pub async fn disconnect(&self, handle: &ClientHandle) {
        {
            let mut channels = self.channels.write().await;
            if let Some(list) = channels.get_mut(&handle.user_id) {
                list.retain(|c| c.conn_id != handle.conn_id);
                if list.is_empty() {
                    channels.remove(&handle.user_id);
                }
            }
        }

        let mut rooms = self.rooms.write().await;
        let mut empty_rooms = Vec::new();
        for (gig_id, room) in rooms.iter_mut() {
            let before = room.len();
            room.retain(|c| c.conn_id != handle.conn_id);
            if room.len() == before {
                continue;
            }

            let still_connected = room.iter().any(|c| c.user_id == handle.user_id);
            if !still_connected {
                let presence = ServerMessage::Presence {
                    gig_id: *gig_id,
                    user_id: handle.user_id,
                    online: false,
                };
                for client in room.iter() {
                    let _ = client.sender.send(presence.clone());
                }
            }

            if room.is_empty() {
                empty_rooms.push(*gig_id);
            }
        }
        for gig_id in empty_rooms {
            rooms.remove(&gig_id);
        }
    }

    /// Deliver an event to every live session of one user.
    ///
    /// Returns how many sessions it reached. Zero is not an error: there is
    /// no queue and no retry, the store already holds the authoritative
    /// state and the event is only a convenience signal.
    pub async fn notify_user(&self, user_id: Uuid, message: ServerMessage) -> usize {
        let channels = self.channels.read().await;
        let Some(list) = channels.get(&user_id) else {
            return 0;
        };

        let mut delivered = 0;
        for client in list {
            // A failed send means the receiver was dropped; disconnect()
            // will clean the handle up.
            if client.sender.send(message.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Add a connection to a gig's chat room and tell existing members the
    /// user came online. Access control happens before this is called.
    pub async fn join_room(&self, gig_id: Uuid, handle: ClientHandle) {
        let presence = ServerMessage::Presence {
            gig_id,
            user_id: handle.user_id,
            online: true,
        };

        let mut rooms = self.rooms.write().await;
        let room = rooms.entry(gig_id).or_insert_with(Vec::new);

        for client in room.iter() {
            if client.user_id != handle.user_id {
                let _ = client.sender.send(presence.clone());
            }
        }

        room.push(handle);
    }

    /// Remove a connection from a gig's chat room.
    pub async fn leave_room(&self, gig_id: Uuid, handle: &ClientHandle) {
        let mut rooms = self.rooms.write().await;

        if let Some(room) = rooms.get_mut(&gig_id) {
            room.retain(|c| c.conn_id != handle.conn_id);

            let still_connected = room.iter().any(|c| c.user_id == handle.user_id);
            if !still_connected {
                let presence = ServerMessage::Presence {
                    gig_id,
                    user_id: handle.user_id,
                    online: false,
                };
                for client in room.iter() {
                    let _ = client.sender.send(presence.clone());
                }
            }

            if room.is_empty() {
                rooms.remove(&gig_id);
            }
        }
    }

    /// Broadcast a message to everyone in a gig room, optionally excluding
    /// one user (typing indicators skip the sender).
    pub async fn broadcast(&self, gig_id: Uuid, message: ServerMessage, exclude_user: Option<Uuid>) {
        let rooms = self.rooms.read().await;
        if let Some(room) = rooms.get(&gig_id) {
            for client in room {
                if Some(client.user_id) == exclude_user {
                    continue;
                }
                let _ = client.sender.send(message.clone());
            }
        }
    }

    /// Check whether a connection is currently in a gig room.
    pub async fn is_in_room(&self, gig_id: Uuid, conn_id: Uuid) -> bool {
        let rooms = self.rooms.read().await;
        rooms
            .get(&gig_id)
            .map(|room| room.iter().any(|c| c.conn_id == conn_id))
            .unwrap_or(false)
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hired_event(gig_id: Uuid, bid_id: Uuid) -> ServerMessage {
        ServerMessage::Hired {
            message: "You have been hired!".to_string(),
            gig_id,
            gig_title: "Test gig".to_string(),
            bid_id,
        }
    }

    #[tokio::test]
    async fn notify_reaches_every_session_of_the_user() {
        let hub = Hub::new();
        let freelancer = Uuid::new_v4();

        let (_h1, mut rx1) = hub.connect(freelancer).await;
        let (_h2, mut rx2) = hub.connect(freelancer).await;
        let (_h3, mut rx3) = hub.connect(Uuid::new_v4()).await;

        let delivered = hub
            .notify_user(freelancer, hired_event(Uuid::new_v4(), Uuid::new_v4()))
            .await;

        assert_eq!(delivered, 2);
        assert!(matches!(rx1.try_recv(), Ok(ServerMessage::Hired { .. })));
        assert!(matches!(rx2.try_recv(), Ok(ServerMessage::Hired { .. })));
        assert!(rx3.try_recv().is_err());
    }

    #[tokio::test]
    async fn notify_with_no_sessions_is_a_silent_drop() {
        let hub = Hub::new();
        let delivered = hub
            .notify_user(Uuid::new_v4(), hired_event(Uuid::new_v4(), Uuid::new_v4()))
            .await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn disconnect_deregisters_the_session() {
        let hub = Hub::new();
        let user = Uuid::new_v4();

        let (handle, _rx) = hub.connect(user).await;
        assert_eq!(hub.notify_user(user, hired_event(user, user)).await, 1);

        hub.disconnect(&handle).await;
        assert_eq!(hub.notify_user(user, hired_event(user, user)).await, 0);
    }

    #[tokio::test]
    async fn disconnect_keeps_other_sessions_of_same_user() {
        let hub = Hub::new();
        let user = Uuid::new_v4();

        let (h1, _rx1) = hub.connect(user).await;
        let (_h2, mut rx2) = hub.connect(user).await;

        hub.disconnect(&h1).await;

        assert_eq!(hub.notify_user(user, hired_event(user, user)).await, 1);
        assert!(matches!(rx2.try_recv(), Ok(ServerMessage::Hired { .. })));
    }

    #[tokio::test]
    async fn room_broadcast_can_exclude_the_sender() {
        let hub = Hub::new();
        let gig = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let (ha, mut rx_a) = hub.connect(alice).await;
        let (hb, mut rx_b) = hub.connect(bob).await;
        hub.join_room(gig, ha.clone()).await;
        hub.join_room(gig, hb.clone()).await;

        // Bob receives Alice's online presence from the second join.
        assert!(matches!(
            rx_a.try_recv(),
            Ok(ServerMessage::Presence { online: true, .. })
        ));

        let typing = ServerMessage::UserTyping {
            gig_id: gig,
            user_id: alice,
        };
        hub.broadcast(gig, typing, Some(alice)).await;

        assert!(rx_a.try_recv().is_err());
        assert!(matches!(
            rx_b.try_recv(),
            Ok(ServerMessage::UserTyping { .. })
        ));
    }

    #[tokio::test]
    async fn leaving_a_room_stops_room_traffic_but_not_user_notifications() {
        let hub = Hub::new();
        let gig = Uuid::new_v4();
        let user = Uuid::new_v4();

        let (handle, mut rx) = hub.connect(user).await;
        hub.join_room(gig, handle.clone()).await;
        assert!(hub.is_in_room(gig, handle.conn_id).await);

        hub.leave_room(gig, &handle).await;
        assert!(!hub.is_in_room(gig, handle.conn_id).await);

        hub.broadcast(
            gig,
            ServerMessage::UserTyping {
                gig_id: gig,
                user_id: user,
            },
            None,
        )
        .await;
        assert!(rx.try_recv().is_err());

        // Direct notification still works after leaving the room.
        assert_eq!(hub.notify_user(user, hired_event(gig, user)).await, 1);
    }
}
