//! # Realtime change feed
//!
//! Row changes arrive over the hosted realtime service, a Phoenix-channels websocket.
//! One socket serves one subscription:
//!
//! 1. open `wss://<project>/realtime/v1/websocket?apikey=<key>&vsn=1.0.0`,
//! 2. send `phx_join` on `realtime:<channel>` with a `postgres_changes` config naming
//!    the table and a single `column=eq.value` filter,
//! 3. send a `heartbeat` on the `phoenix` topic every [`HEARTBEAT_INTERVAL_MS`],
//! 4. on drop, send `phx_leave` and close the socket.
//!
//! The frame codec ([`PhoenixMessage`], [`decode`]) is target independent; the socket
//! itself needs the browser's `WebSocket` and exists only on `wasm32`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use store::{ChangeKind, Filter, RecordChange};

/// Interval between heartbeats; the service drops silent sockets after about a minute.
pub const HEARTBEAT_INTERVAL_MS: u32 = 30_000;

/// One frame of the Phoenix wire protocol (JSON serializer v1).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

/// What an inbound frame means for the subscriber.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    Change(RecordChange),
    /// The service refused the join or reported a channel error.
    Failed(String),
    /// Replies, heartbeats, presence, and other frames with nothing to deliver.
    Ignored,
}

pub fn topic(channel: &str) -> String {
    format!("realtime:{channel}")
}

/// `phx_join` for changes of `table` rows matching `filter`.
pub fn join_message(
    channel: &str,
    table: &str,
    filter: &Filter,
    access_token: &str,
    reference: &str,
) -> PhoenixMessage {
    let mut change = json!({ "event": "*", "schema": "public", "table": table });
    if let Some(predicate) = filter.to_realtime() {
        change["filter"] = Value::String(predicate);
    }
    PhoenixMessage {
        topic: topic(channel),
        event: "phx_join".to_string(),
        payload: json!({
            "config": {
                "broadcast": { "ack": false, "self": false },
                "presence": { "key": "" },
                "postgres_changes": [change],
            },
            "access_token": access_token,
        }),
        reference: Some(reference.to_string()),
        join_ref: Some(reference.to_string()),
    }
}

pub fn heartbeat_message(reference: &str) -> PhoenixMessage {
    PhoenixMessage {
        topic: "phoenix".to_string(),
        event: "heartbeat".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
        join_ref: None,
    }
}

pub fn leave_message(channel: &str, reference: &str) -> PhoenixMessage {
    PhoenixMessage {
        topic: topic(channel),
        event: "phx_leave".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
        join_ref: None,
    }
}

/// Interpret an inbound frame.
pub fn decode(message: &PhoenixMessage) -> Inbound {
    match message.event.as_str() {
        "postgres_changes" => message
            .payload
            .get("data")
            .and_then(decode_change)
            .map(Inbound::Change)
            .unwrap_or(Inbound::Ignored),
        // Older servers push the change under its own event name.
        "INSERT" | "UPDATE" | "DELETE" => decode_change(&message.payload)
            .map(Inbound::Change)
            .unwrap_or(Inbound::Ignored),
        "phx_reply" => match message.payload.get("status").and_then(Value::as_str) {
            Some("error") => Inbound::Failed(reason(&message.payload["response"])),
            _ => Inbound::Ignored,
        },
        "phx_error" => Inbound::Failed("realtime channel error".to_string()),
        "system" => match message.payload.get("status").and_then(Value::as_str) {
            Some("error") => Inbound::Failed(reason(&message.payload)),
            _ => Inbound::Ignored,
        },
        _ => Inbound::Ignored,
    }
}

/// `{type, record, old_record}` to a [`RecordChange`]. Empty records count as absent.
fn decode_change(data: &Value) -> Option<RecordChange> {
    let kind = match data.get("type").and_then(Value::as_str)? {
        "INSERT" => ChangeKind::Insert,
        "UPDATE" => ChangeKind::Update,
        "DELETE" => ChangeKind::Delete,
        _ => return None,
    };
    Some(RecordChange {
        kind,
        old: non_empty(data.get("old_record")),
        new: non_empty(data.get("record")),
    })
}

fn non_empty(value: Option<&Value>) -> Option<Value> {
    match value? {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        other => Some(other.clone()),
    }
}

fn reason(payload: &Value) -> String {
    ["reason", "message"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_str))
        .unwrap_or("realtime subscription refused")
        .to_string()
}

#[cfg(target_arch = "wasm32")]
pub(crate) use socket::connect;

#[cfg(target_arch = "wasm32")]
mod socket {
    use std::cell::Cell;

    use gloo_timers::callback::Interval;
    use store::{Error, RecordChange, Result, Subscription};
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;
    use web_sys::{CloseEvent, MessageEvent, WebSocket};

    use super::{decode, heartbeat_message, Inbound, PhoenixMessage, HEARTBEAT_INTERVAL_MS};

    fn send(socket: &WebSocket, message: &PhoenixMessage) {
        if socket.ready_state() != WebSocket::OPEN {
            return;
        }
        match serde_json::to_string(message) {
            Ok(text) => {
                if socket.send_with_str(&text).is_err() {
                    tracing::warn!(event = %message.event, "realtime send failed");
                }
            }
            Err(e) => tracing::warn!("could not encode realtime frame: {e}"),
        }
    }

    /// Open a socket, join with `join`, and stream decoded changes until dropped.
    pub(crate) fn connect(
        url: &str,
        join: PhoenixMessage,
        leave: PhoenixMessage,
    ) -> Result<Subscription<RecordChange>> {
        let socket = WebSocket::new(url).map_err(|e| Error::Fetch(format!("{e:?}")))?;
        let (tx, subscription) = Subscription::channel();

        let onopen = {
            let socket = socket.clone();
            Closure::<dyn FnMut()>::new(move || {
                tracing::debug!(topic = %join.topic, "realtime socket open, joining");
                send(&socket, &join);
            })
        };

        let onmessage = {
            let tx = tx.clone();
            Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
                let Some(text) = event.data().as_string() else {
                    return;
                };
                let message: PhoenixMessage = match serde_json::from_str(&text) {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::warn!("malformed realtime frame: {e}");
                        return;
                    }
                };
                match decode(&message) {
                    Inbound::Change(change) => {
                        let _ = tx.unbounded_send(change);
                    }
                    Inbound::Failed(reason) => tracing::error!("realtime subscription failed: {reason}"),
                    Inbound::Ignored => {}
                }
            })
        };

        let onclose = Closure::<dyn FnMut(CloseEvent)>::new(move |event: CloseEvent| {
            tracing::debug!(code = event.code(), "realtime socket closed");
            tx.close_channel();
        });

        socket.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        socket.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        socket.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        let heartbeat = {
            let socket = socket.clone();
            let counter = Cell::new(0u64);
            Interval::new(HEARTBEAT_INTERVAL_MS, move || {
                counter.set(counter.get() + 1);
                send(&socket, &heartbeat_message(&format!("hb-{}", counter.get())));
            })
        };

        Ok(subscription.on_drop(move || {
            drop(heartbeat);
            send(&socket, &leave);
            socket.set_onopen(None);
            socket.set_onmessage(None);
            socket.set_onclose(None);
            let _ = socket.close();
            drop((onopen, onmessage, onclose));
        }))
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn connect(
    _url: &str,
    _join: PhoenixMessage,
    _leave: PhoenixMessage,
) -> store::Result<store::Subscription<RecordChange>> {
    Err(store::Error::Fetch(
        "realtime subscriptions require a browser".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(text: &str) -> PhoenixMessage {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_join_message_wire_shape() {
        let filter = Filter::new().eq("email", "a@b.com");
        let join = join_message("tasks-channel", "tasks", &filter, "jwt", "1");
        let wire = serde_json::to_value(&join).unwrap();
        assert_eq!(wire["topic"], "realtime:tasks-channel");
        assert_eq!(wire["event"], "phx_join");
        assert_eq!(wire["ref"], "1");
        assert_eq!(wire["join_ref"], "1");
        assert_eq!(wire["payload"]["access_token"], "jwt");
        assert_eq!(
            wire["payload"]["config"]["postgres_changes"][0],
            json!({"event": "*", "schema": "public", "table": "tasks", "filter": "email=eq.a@b.com"})
        );
    }

    #[test]
    fn test_heartbeat_and_leave() {
        let heartbeat = serde_json::to_value(heartbeat_message("7")).unwrap();
        assert_eq!(
            heartbeat,
            json!({"topic": "phoenix", "event": "heartbeat", "payload": {}, "ref": "7"})
        );
        let leave = leave_message("tasks-channel", "8");
        assert_eq!(leave.topic, "realtime:tasks-channel");
        assert_eq!(leave.event, "phx_leave");
    }

    #[test]
    fn test_decode_insert() {
        let message = frame(
            r#"{"topic":"realtime:tasks-channel","event":"postgres_changes","ref":null,
                "payload":{"ids":[1],"data":{"schema":"public","table":"tasks","type":"INSERT",
                "commit_timestamp":"2024-05-01T10:00:00Z","errors":null,
                "record":{"id":3,"title":"Buy milk","email":"a@b.com"},"old_record":{}}}}"#,
        );
        let Inbound::Change(change) = decode(&message) else {
            panic!("expected a change");
        };
        assert_eq!(change.kind, ChangeKind::Insert);
        assert_eq!(change.old, None);
        assert_eq!(change.new.unwrap()["title"], "Buy milk");
    }

    #[test]
    fn test_decode_delete_keeps_old_record() {
        let message = frame(
            r#"{"topic":"realtime:tasks-channel","event":"postgres_changes","ref":null,
                "payload":{"data":{"type":"DELETE","record":null,"old_record":{"id":3}}}}"#,
        );
        assert_eq!(
            decode(&message),
            Inbound::Change(RecordChange {
                kind: ChangeKind::Delete,
                old: Some(json!({"id": 3})),
                new: None,
            })
        );
    }

    #[test]
    fn test_decode_legacy_event_name() {
        let message = frame(
            r#"{"topic":"realtime:tasks-channel","event":"UPDATE","ref":null,
                "payload":{"type":"UPDATE","record":{"id":3},"old_record":{"id":3}}}"#,
        );
        assert!(matches!(decode(&message), Inbound::Change(c) if c.kind == ChangeKind::Update));
    }

    #[test]
    fn test_decode_replies() {
        let ok = frame(
            r#"{"topic":"phoenix","event":"phx_reply","ref":"hb-1","payload":{"status":"ok","response":{}}}"#,
        );
        assert_eq!(decode(&ok), Inbound::Ignored);

        let refused = frame(
            r#"{"topic":"realtime:tasks-channel","event":"phx_reply","ref":"1",
                "payload":{"status":"error","response":{"reason":"Invalid JWT"}}}"#,
        );
        assert_eq!(decode(&refused), Inbound::Failed("Invalid JWT".to_string()));
    }

    #[test]
    fn test_decode_ignores_unknown_change_type() {
        let message = frame(
            r#"{"topic":"realtime:tasks-channel","event":"postgres_changes",
                "payload":{"data":{"type":"TRUNCATE"}}}"#,
        );
        assert_eq!(decode(&message), Inbound::Ignored);
    }
}
