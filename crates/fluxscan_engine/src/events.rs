use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScanProgress {
    #[serde(deserialize_with = "scan_id_from_wire")]
    pub scan_id: String,
    #[serde(deserialize_with = "percent_from_wire")]
    pub progress: u8,
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScanComplete {
    #[serde(deserialize_with = "scan_id_from_wire")]
    pub scan_id: String,
    pub status: String,
    #[serde(default)]
    pub signals_found: u64,
    #[serde(default)]
    pub total_scanned: Option<u64>,
}

/// Every event the server pushes that the client understands. Anything
/// else fails to deserialize and is dropped by the channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Greeting sent right after the namespace connect.
    Connected {
        #[serde(default)]
        data: String,
    },
    ScanProgress(ScanProgress),
    ScanComplete(ScanComplete),
    ScanSubscribed {
        #[serde(deserialize_with = "scan_id_from_wire")]
        scan_id: String,
    },
    ScanUnsubscribed {
        #[serde(deserialize_with = "scan_id_from_wire")]
        scan_id: String,
    },
}

impl ServerEvent {
    pub fn from_parts(name: &str, data: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(json!({ "event": name, "data": data }))
    }
}

/// What the channel hands to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Connected,
    Disconnected,
    Server(ServerEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    SubscribeScan { scan_id: String },
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::SubscribeScan { .. } => "subscribe_scan",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            ClientEvent::SubscribeScan { scan_id } => json!({ "scan_id": scan_id }),
        }
    }
}

/// Scan ids are strings on this server but numeric ids are accepted too.
pub(crate) fn scan_id_from_wire<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WireId {
        Text(String),
        Number(i64),
    }

    Ok(match WireId::deserialize(deserializer)? {
        WireId::Text(text) => text,
        WireId::Number(number) => number.to_string(),
    })
}

fn percent_from_wire<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn progress_event_accepts_numeric_ids_and_float_progress() {
        let event = ServerEvent::from_parts(
            "scan_progress",
            json!({ "scan_id": 12, "progress": 41.6, "symbol": "TCS" }),
        )
        .unwrap();

        assert_eq!(
            event,
            ServerEvent::ScanProgress(ScanProgress {
                scan_id: "12".to_string(),
                progress: 42,
                symbol: "TCS".to_string(),
            })
        );
    }

    #[test]
    fn progress_is_clamped() {
        let event = ServerEvent::from_parts(
            "scan_progress",
            json!({ "scan_id": "scan_1", "progress": 250, "symbol": "ITC" }),
        )
        .unwrap();
        let ServerEvent::ScanProgress(progress) = event else {
            panic!("expected progress");
        };
        assert_eq!(progress.progress, 100);
    }

    #[test]
    fn completion_event_keeps_counts() {
        let event = ServerEvent::from_parts(
            "scan_complete",
            json!({
                "scan_id": "scan_3",
                "status": "completed",
                "total_scanned": 50,
                "signals_found": 7
            }),
        )
        .unwrap();

        assert_eq!(
            event,
            ServerEvent::ScanComplete(ScanComplete {
                scan_id: "scan_3".to_string(),
                status: "completed".to_string(),
                signals_found: 7,
                total_scanned: Some(50),
            })
        );
    }

    #[test]
    fn unknown_event_names_are_rejected() {
        assert!(ServerEvent::from_parts("scan_progres", json!({})).is_err());
        assert!(ServerEvent::from_parts("price_tick", json!({ "x": 1 })).is_err());
    }

    #[test]
    fn subscribe_payload_carries_scan_id() {
        let event = ClientEvent::SubscribeScan {
            scan_id: "scan_9".to_string(),
        };
        assert_eq!(event.name(), "subscribe_scan");
        assert_eq!(event.payload(), json!({ "scan_id": "scan_9" }));
    }
}
