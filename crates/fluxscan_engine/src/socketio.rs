//! Minimal Socket.IO v5 / Engine.IO v4 text framing, enough for a client
//! that connects to the default namespace and exchanges JSON events.

use serde::Deserialize;
use serde_json::Value;

use crate::ClientError;

/// Namespace connect for the default namespace.
pub(crate) const CONNECT_FRAME: &str = "40";
/// Namespace disconnect for the default namespace.
pub(crate) const DISCONNECT_FRAME: &str = "41";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpenInfo {
    pub sid: String,
    #[serde(rename = "pingInterval", default)]
    pub ping_interval: u64,
    #[serde(rename = "pingTimeout", default)]
    pub ping_timeout: u64,
}

/// Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Open(OpenInfo),
    Close,
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

/// Socket.IO packet carried inside an Engine.IO message.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect,
    Disconnect,
    Event { name: String, data: Value },
    Ack,
    ConnectError(String),
}

pub fn decode_frame(frame: &str) -> Result<Frame, ClientError> {
    let mut chars = frame.chars();
    let kind = chars
        .next()
        .ok_or_else(|| ClientError::Channel("empty frame".to_string()))?;
    let rest = chars.as_str();
    match kind {
        '0' => serde_json::from_str(rest)
            .map(Frame::Open)
            .map_err(|err| ClientError::Channel(format!("bad open packet: {err}"))),
        '1' => Ok(Frame::Close),
        '2' => Ok(Frame::Ping(rest.to_string())),
        '3' => Ok(Frame::Pong(rest.to_string())),
        '4' => decode_packet(rest).map(Frame::Message),
        '5' => Ok(Frame::Upgrade),
        '6' => Ok(Frame::Noop),
        other => Err(ClientError::Channel(format!(
            "unknown engine packet type {other:?}"
        ))),
    }
}

fn decode_packet(packet: &str) -> Result<SocketPacket, ClientError> {
    let mut chars = packet.chars();
    let kind = chars
        .next()
        .ok_or_else(|| ClientError::Channel("empty socket packet".to_string()))?;
    let body = strip_ack_id(strip_namespace(chars.as_str()));
    match kind {
        '0' => Ok(SocketPacket::Connect),
        '1' => Ok(SocketPacket::Disconnect),
        '2' => decode_event(body),
        '3' => Ok(SocketPacket::Ack),
        '4' => Ok(SocketPacket::ConnectError(body.to_string())),
        '5' | '6' => Err(ClientError::Channel(
            "binary socket packets are not supported".to_string(),
        )),
        other => Err(ClientError::Channel(format!(
            "unknown socket packet type {other:?}"
        ))),
    }
}

fn decode_event(body: &str) -> Result<SocketPacket, ClientError> {
    let items: Vec<Value> = serde_json::from_str(body)
        .map_err(|err| ClientError::Channel(format!("bad event payload: {err}")))?;
    let mut items = items.into_iter();
    let name = match items.next() {
        Some(Value::String(name)) => name,
        _ => return Err(ClientError::Channel("event without a name".to_string())),
    };
    let data = items.next().unwrap_or(Value::Null);
    Ok(SocketPacket::Event { name, data })
}

/// Drops a `/nsp,` prefix. Only the default namespace is used, so it is
/// not checked.
fn strip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        match body.find(',') {
            Some(idx) => &body[idx + 1..],
            None => "",
        }
    } else {
        body
    }
}

fn strip_ack_id(body: &str) -> &str {
    body.trim_start_matches(|c: char| c.is_ascii_digit())
}

/// Encodes an event for the default namespace: `42["name",data]`.
pub fn encode_event(name: &str, data: &Value) -> String {
    let packet = Value::Array(vec![Value::String(name.to_string()), data.clone()]);
    format!("42{packet}")
}

pub(crate) fn pong(payload: &str) -> String {
    format!("3{payload}")
}
