//! Real-time relay: clients join session/role/department rooms over a
//! WebSocket and the server pushes chat and dashboard events to the
//! relevant rooms. Pure pub/sub; nothing here persists state, and no
//! ordering is guaranteed relative to REST responses for the same message.

use std::collections::HashMap;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::AppState;
use crate::chat::ChatReply;
use crate::models::language::Language;
use crate::models::user::UserRole;

type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Room membership for all live connections.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, HashMap<Uuid, EventSender>>,
    memberships: DashMap<Uuid, Vec<String>>,
    connections: DashMap<Uuid, EventSender>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, room: &str, conn_id: Uuid, sender: EventSender) {
        self.connections.insert(conn_id, sender.clone());
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(conn_id, sender);
        self.memberships
            .entry(conn_id)
            .or_default()
            .push(room.to_string());
    }

    pub fn leave(&self, room: &str, conn_id: Uuid) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(&conn_id);
        }
        if let Some(mut rooms) = self.memberships.get_mut(&conn_id) {
            rooms.retain(|r| r != room);
        }
    }

    pub fn remove_connection(&self, conn_id: Uuid) {
        self.connections.remove(&conn_id);
        if let Some((_, rooms)) = self.memberships.remove(&conn_id) {
            for room in rooms {
                if let Some(mut members) = self.rooms.get_mut(&room) {
                    members.remove(&conn_id);
                }
            }
        }
    }

    /// Send an event to every member of a room.
    pub fn broadcast_to_room(&self, room: &str, event: &ServerEvent) {
        self.broadcast_filtered(room, event, None);
    }

    /// Send an event to every member of a room except one connection.
    pub fn broadcast_to_room_except(&self, room: &str, event: &ServerEvent, except: Uuid) {
        self.broadcast_filtered(room, event, Some(except));
    }

    fn broadcast_filtered(&self, room: &str, event: &ServerEvent, except: Option<Uuid>) {
        if let Some(members) = self.rooms.get(room) {
            for (conn_id, sender) in members.iter() {
                if Some(*conn_id) == except {
                    continue;
                }
                let _ = sender.send(event.clone());
            }
        }
    }

    /// Send an event to every live connection.
    pub fn broadcast_all(&self, event: &ServerEvent) {
        for entry in self.connections.iter() {
            let _ = entry.value().send(event.clone());
        }
    }

    #[cfg(test)]
    fn room_size(&self, room: &str) -> usize {
        self.rooms.get(room).map_or(0, |m| m.len())
    }
}

pub fn user_room(user_id: &Uuid) -> String {
    format!("user_{user_id}")
}

pub fn role_room(role: &str) -> String {
    format!("role_{role}")
}

pub fn dept_room(department: &str) -> String {
    format!("dept_{department}")
}

pub fn class_room(class_id: &str) -> String {
    format!("class_{class_id}")
}

/// Events a client may send.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinChat {
        session_id: Uuid,
    },
    SendMessage {
        session_id: Uuid,
        message: String,
        #[serde(default)]
        language: Option<Language>,
    },
    JoinDashboard {
        user_id: Uuid,
        role: UserRole,
        #[serde(default)]
        department: Option<String>,
    },
    MarkAttendance {
        student_id: Uuid,
        course_id: String,
        status: String,
        teacher_id: Uuid,
    },
    NewAssignment {
        assignment: serde_json::Value,
        student_ids: Vec<Uuid>,
    },
    BroadcastAnnouncement {
        announcement: serde_json::Value,
        target_roles: Vec<String>,
        #[serde(default)]
        department: Option<String>,
    },
    GradeUpdated {
        student_id: Uuid,
        course_id: String,
        grade: String,
    },
    FeePayment {
        student_id: Uuid,
        amount: f64,
        status: String,
        transaction_id: String,
    },
    JoinLiveClass {
        class_id: String,
        user_id: Uuid,
        user_role: String,
    },
    LeaveLiveClass {
        class_id: String,
        user_id: Uuid,
    },
    Ping,
    HealthCheck,
}

/// Events pushed to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Welcome {
        message: String,
        timestamp: DateTime<Utc>,
        connection_id: Uuid,
    },
    JoinedChat {
        session_id: Uuid,
        message: String,
        timestamp: DateTime<Utc>,
    },
    ReceiveMessage {
        session_id: Uuid,
        #[serde(flatten)]
        reply: ChatReply,
    },
    DashboardJoined {
        message: String,
        timestamp: DateTime<Utc>,
    },
    AttendanceUpdated {
        course_id: String,
        status: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
    AttendanceRecorded {
        student_id: Uuid,
        course_id: String,
        status: String,
        timestamp: DateTime<Utc>,
    },
    AssignmentNotification {
        assignment: serde_json::Value,
        timestamp: DateTime<Utc>,
    },
    Announcement {
        announcement: serde_json::Value,
        timestamp: DateTime<Utc>,
    },
    GradeNotification {
        course_id: String,
        grade: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
    PaymentNotification {
        amount: f64,
        status: String,
        transaction_id: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
    PaymentUpdate {
        student_id: Uuid,
        amount: f64,
        status: String,
        transaction_id: String,
        timestamp: DateTime<Utc>,
    },
    UserJoinedClass {
        user_id: Uuid,
        user_role: String,
        timestamp: DateTime<Utc>,
    },
    UserLeftClass {
        user_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    Pong,
    Health {
        status: String,
        timestamp: DateTime<Utc>,
    },
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl ServerEvent {
    pub fn receive_message(session_id: Uuid, reply: &ChatReply) -> Self {
        ServerEvent::ReceiveMessage {
            session_id,
            reply: reply.clone(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// WebSocket upgrade endpoint.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let (mut sink, mut stream) = socket.split();

    info!(action = "ws_connected", connection_id = %conn_id);
    let _ = tx.send(ServerEvent::Welcome {
        message: "Connected to JECRC Foundation Chat Assistant".to_string(),
        timestamp: Utc::now(),
        connection_id: conn_id,
    });

    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(t) => t,
                Err(_) => continue,
            };
            if sink.send(WsMessage::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            WsMessage::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => handle_client_event(&state, conn_id, &tx, event).await,
                Err(e) => {
                    warn!(action = "ws_bad_event", connection_id = %conn_id, error = %e);
                    let _ = tx.send(ServerEvent::error("Unrecognized event"));
                }
            },
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    state.rooms.remove_connection(conn_id);
    send_task.abort();
    info!(action = "ws_disconnected", connection_id = %conn_id);
}

async fn handle_client_event(
    state: &AppState,
    conn_id: Uuid,
    tx: &EventSender,
    event: ClientEvent,
) {
    let rooms = &state.rooms;
    match event {
        ClientEvent::JoinChat { session_id } => {
            rooms.join(&session_id.to_string(), conn_id, tx.clone());
            info!(action = "ws_join_chat", connection_id = %conn_id, session_id = %session_id);
            let _ = tx.send(ServerEvent::JoinedChat {
                session_id,
                message: "You are now connected to the chat!".to_string(),
                timestamp: Utc::now(),
            });
        }
        ClientEvent::SendMessage {
            session_id,
            message,
            language,
        } => {
            // Relay-only path: the reply is pushed to the session room but
            // nothing is persisted here.
            let reply = state
                .engine
                .process_message(&message, language, session_id)
                .await;
            let event = ServerEvent::receive_message(session_id, &reply);
            let _ = tx.send(event.clone());
            rooms.broadcast_to_room_except(&session_id.to_string(), &event, conn_id);
        }
        ClientEvent::JoinDashboard {
            user_id,
            role,
            department,
        } => {
            rooms.join(&user_room(&user_id), conn_id, tx.clone());
            rooms.join(&role_room(role.as_str()), conn_id, tx.clone());
            if let Some(dept) = department.as_deref() {
                rooms.join(&dept_room(dept), conn_id, tx.clone());
            }
            info!(action = "ws_join_dashboard", connection_id = %conn_id, role = role.as_str());
            let _ = tx.send(ServerEvent::DashboardJoined {
                message: "Connected to real-time dashboard updates".to_string(),
                timestamp: Utc::now(),
            });
        }
        ClientEvent::MarkAttendance {
            student_id,
            course_id,
            status,
            teacher_id,
        } => {
            rooms.broadcast_to_room(
                &user_room(&student_id),
                &ServerEvent::AttendanceUpdated {
                    course_id: course_id.clone(),
                    status: status.clone(),
                    message: format!("Attendance marked as {status}"),
                    timestamp: Utc::now(),
                },
            );
            rooms.broadcast_to_room(
                &user_room(&teacher_id),
                &ServerEvent::AttendanceRecorded {
                    student_id,
                    course_id,
                    status,
                    timestamp: Utc::now(),
                },
            );
        }
        ClientEvent::NewAssignment {
            assignment,
            student_ids,
        } => {
            let event = ServerEvent::AssignmentNotification {
                assignment,
                timestamp: Utc::now(),
            };
            for student_id in student_ids {
                rooms.broadcast_to_room(&user_room(&student_id), &event);
            }
        }
        ClientEvent::BroadcastAnnouncement {
            announcement,
            target_roles,
            department,
        } => {
            let event = ServerEvent::Announcement {
                announcement,
                timestamp: Utc::now(),
            };
            if target_roles.iter().any(|r| r == "all") {
                rooms.broadcast_all(&event);
            } else {
                for role in &target_roles {
                    match department.as_deref() {
                        Some(dept) => rooms.broadcast_to_room(&dept_room(dept), &event),
                        None => rooms.broadcast_to_room(&role_room(role), &event),
                    }
                }
            }
        }
        ClientEvent::GradeUpdated {
            student_id,
            course_id,
            grade,
        } => {
            rooms.broadcast_to_room(
                &user_room(&student_id),
                &ServerEvent::GradeNotification {
                    course_id,
                    grade,
                    message: "Your grade has been updated".to_string(),
                    timestamp: Utc::now(),
                },
            );
        }
        ClientEvent::FeePayment {
            student_id,
            amount,
            status,
            transaction_id,
        } => {
            let message = if status == "success" {
                "Payment processed successfully"
            } else {
                "Payment failed"
            };
            rooms.broadcast_to_room(
                &user_room(&student_id),
                &ServerEvent::PaymentNotification {
                    amount,
                    status: status.clone(),
                    transaction_id: transaction_id.clone(),
                    message: message.to_string(),
                    timestamp: Utc::now(),
                },
            );
            rooms.broadcast_to_room(
                &role_room("principal"),
                &ServerEvent::PaymentUpdate {
                    student_id,
                    amount,
                    status,
                    transaction_id,
                    timestamp: Utc::now(),
                },
            );
        }
        ClientEvent::JoinLiveClass {
            class_id,
            user_id,
            user_role,
        } => {
            rooms.join(&class_room(&class_id), conn_id, tx.clone());
            rooms.broadcast_to_room_except(
                &class_room(&class_id),
                &ServerEvent::UserJoinedClass {
                    user_id,
                    user_role,
                    timestamp: Utc::now(),
                },
                conn_id,
            );
        }
        ClientEvent::LeaveLiveClass { class_id, user_id } => {
            rooms.leave(&class_room(&class_id), conn_id);
            rooms.broadcast_to_room(
                &class_room(&class_id),
                &ServerEvent::UserLeftClass {
                    user_id,
                    timestamp: Utc::now(),
                },
            );
        }
        ClientEvent::Ping => {
            let _ = tx.send(ServerEvent::Pong);
        }
        ClientEvent::HealthCheck => {
            let _ = tx.send(ServerEvent::Health {
                status: "healthy".to_string(),
                timestamp: Utc::now(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (EventSender, mpsc::UnboundedReceiver<ServerEvent>) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn join_broadcast_leave() {
        let registry = RoomRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (tx_a, mut rx_a) = channel();
        let (tx_b, mut rx_b) = channel();

        registry.join("role_student", a, tx_a);
        registry.join("role_student", b, tx_b);
        assert_eq!(registry.room_size("role_student"), 2);

        registry.broadcast_to_room("role_student", &ServerEvent::Pong);
        assert!(matches!(rx_a.try_recv(), Ok(ServerEvent::Pong)));
        assert!(matches!(rx_b.try_recv(), Ok(ServerEvent::Pong)));

        registry.leave("role_student", a);
        registry.broadcast_to_room("role_student", &ServerEvent::Pong);
        assert!(rx_a.try_recv().is_err());
        assert!(matches!(rx_b.try_recv(), Ok(ServerEvent::Pong)));
    }

    #[test]
    fn except_skips_the_sender() {
        let registry = RoomRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (tx_a, mut rx_a) = channel();
        let (tx_b, mut rx_b) = channel();
        registry.join("session", a, tx_a);
        registry.join("session", b, tx_b);

        registry.broadcast_to_room_except("session", &ServerEvent::Pong, a);
        assert!(rx_a.try_recv().is_err());
        assert!(matches!(rx_b.try_recv(), Ok(ServerEvent::Pong)));
    }

    #[test]
    fn role_rooms_are_isolated() {
        let registry = RoomRegistry::new();
        let student = Uuid::new_v4();
        let teacher = Uuid::new_v4();
        let (tx_s, mut rx_s) = channel();
        let (tx_t, mut rx_t) = channel();
        registry.join(&role_room("student"), student, tx_s);
        registry.join(&role_room("teacher"), teacher, tx_t);

        registry.broadcast_to_room(
            &role_room("teacher"),
            &ServerEvent::Announcement {
                announcement: serde_json::json!({"title": "staff meeting"}),
                timestamp: Utc::now(),
            },
        );
        assert!(rx_s.try_recv().is_err());
        assert!(matches!(rx_t.try_recv(), Ok(ServerEvent::Announcement { .. })));
    }

    #[test]
    fn remove_connection_clears_all_rooms() {
        let registry = RoomRegistry::new();
        let conn = Uuid::new_v4();
        let (tx, mut rx) = channel();
        registry.join("a", conn, tx.clone());
        registry.join("b", conn, tx);

        registry.remove_connection(conn);
        registry.broadcast_to_room("a", &ServerEvent::Pong);
        registry.broadcast_to_room("b", &ServerEvent::Pong);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn client_events_deserialize_from_wire_shape() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type": "send_message", "session_id": "7f8de4c8-94a1-47a9-b12f-6ea409c8e94e", "message": "hostel fees?", "language": "hi"}"#,
        )
        .unwrap();
        assert!(matches!(event, ClientEvent::SendMessage { .. }));

        let event: ClientEvent = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert!(matches!(event, ClientEvent::Ping));
    }
}
