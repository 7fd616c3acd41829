//! Wire protocol shared by the grid server and its viewers.
//!
//! Every frame is a JSON text frame. Server frames use an adjacently tagged
//! envelope (`{"event": ..., "data": ...}`); viewer frames carry an optional
//! numeric `ack` id that the server echoes back on the matching acknowledgement.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ROWS: usize = 10;
pub const COLS: usize = 10;

/// Row-major matrix of cells. An empty cell is the empty string.
pub type Grid = Vec<Vec<String>>;

pub fn empty_grid() -> Grid {
    vec![vec![String::new(); COLS]; ROWS]
}

/// One accepted grid mutation as recorded in the history.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Move {
    pub row: usize,
    pub col: usize,
    #[serde(rename = "char")]
    pub ch: String,
    pub by: String,
    pub at: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    pub grid: Grid,
    pub history: Vec<Move>,
    pub online_count: usize,
    pub cooldown_seconds: u64,
}

/// Result of a submission, delivered only to the submitting session.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAck {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanent: Option<bool>,
}

impl SubmitAck {
    pub fn accepted(at: u64) -> Self {
        Self {
            ok: true,
            at: Some(at),
            error: None,
            retry_after_ms: None,
            permanent: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            at: None,
            error: Some(error.into()),
            retry_after_ms: None,
            permanent: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AckPayload {
    pub ack: Option<u64>,
    #[serde(flatten)]
    pub result: SubmitAck,
}

/// Server to viewer frames.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    Init(InitPayload),
    Update(Move),
    OnlineCount(usize),
    Ack(AckPayload),
}

/// Submission exactly as received. Fields are left as raw JSON so that shape
/// errors are reported by validation instead of failing the decode.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default)]
    pub row: Value,
    #[serde(default)]
    pub col: Value,
    #[serde(default, rename = "char")]
    pub ch: Value,
    #[serde(default)]
    pub player_id: Value,
}

impl SubmitRequest {
    pub fn new(row: usize, col: usize, ch: &str, player_id: &str) -> Self {
        Self {
            row: Value::from(row),
            col: Value::from(col),
            ch: Value::from(ch),
            player_id: Value::from(player_id),
        }
    }

    /// Builds a request from whatever arrived as `data`. Anything other than
    /// an object yields an empty request, which validation then rejects.
    pub fn from_value(data: Value) -> Self {
        if data.is_object() {
            serde_json::from_value(data).unwrap_or_default()
        } else {
            Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ClientEventKind {
    Submit,
}

/// Viewer to server frame.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClientFrame {
    pub event: ClientEventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<u64>,
    #[serde(default)]
    pub data: SubmitRequest,
}

/// Frame as read by the server. Only `event` has to be well formed, so a
/// submit with a bad `ack` or `data` is still answered.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct InboundFrame {
    pub event: ClientEventKind,
    #[serde(default)]
    pub ack: Value,
    #[serde(default)]
    pub data: Value,
}

impl InboundFrame {
    /// Correlation id to echo back, if the viewer sent a usable one
    pub fn ack_id(&self) -> Option<u64> {
        self.ack.as_u64()
    }
}

impl ClientFrame {
    pub fn submit(ack: Option<u64>, request: SubmitRequest) -> Self {
        Self {
            event: ClientEventKind::Submit,
            ack,
            data: request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_grid_dimensions() {
        let grid = empty_grid();
        assert_eq!(grid.len(), ROWS);
        assert!(grid.iter().all(|row| row.len() == COLS));
        assert!(grid.iter().flatten().all(|cell| cell.is_empty()));
    }

    #[test]
    fn test_update_event_shape() {
        let event = ServerEvent::Update(Move {
            row: 0,
            col: 0,
            ch: "A".to_string(),
            by: "P1".to_string(),
            at: 1000,
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "update",
                "data": { "row": 0, "col": 0, "char": "A", "by": "P1", "at": 1000 }
            })
        );
    }

    #[test]
    fn test_online_count_event_shape() {
        let value = serde_json::to_value(ServerEvent::OnlineCount(3)).unwrap();
        assert_eq!(value, json!({ "event": "onlineCount", "data": 3 }));
    }

    #[test]
    fn test_init_event_uses_camel_case() {
        let event = ServerEvent::Init(InitPayload {
            grid: empty_grid(),
            history: vec![],
            online_count: 1,
            cooldown_seconds: 5,
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "init");
        assert_eq!(value["data"]["onlineCount"], 1);
        assert_eq!(value["data"]["cooldownSeconds"], 5);
        assert_eq!(value["data"]["grid"][9][9], "");
    }

    #[test]
    fn test_ack_omits_absent_fields() {
        let accepted = ServerEvent::Ack(AckPayload {
            ack: Some(7),
            result: SubmitAck::accepted(1000),
        });
        assert_eq!(
            serde_json::to_value(&accepted).unwrap(),
            json!({ "event": "ack", "data": { "ack": 7, "ok": true, "at": 1000 } })
        );

        let mut cooldown = SubmitAck::rejected("On cooldown");
        cooldown.retry_after_ms = Some(3000);
        let rejected = ServerEvent::Ack(AckPayload {
            ack: None,
            result: cooldown,
        });
        assert_eq!(
            serde_json::to_value(&rejected).unwrap(),
            json!({
                "event": "ack",
                "data": { "ack": null, "ok": false, "error": "On cooldown", "retryAfterMs": 3000 }
            })
        );
    }

    #[test]
    fn test_client_frame_accepts_loose_shapes() {
        let frame: ClientFrame = serde_json::from_str(
            r#"{"event":"submit","ack":2,"data":{"row":"x","col":1.5,"playerId":"P1"}}"#,
        )
        .unwrap();

        assert_eq!(frame.event, ClientEventKind::Submit);
        assert_eq!(frame.ack, Some(2));
        assert_eq!(frame.data.row, json!("x"));
        assert_eq!(frame.data.col, json!(1.5));
        assert!(frame.data.ch.is_null());
        assert_eq!(frame.data.player_id, json!("P1"));
    }

    #[test]
    fn test_client_frame_rejects_unknown_event() {
        let result = serde_json::from_str::<ClientFrame>(r#"{"event":"paint","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_submit_frame_wire_shape() {
        let frame = ClientFrame::submit(None, SubmitRequest::new(2, 3, "Z", "P9"));
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            json!({
                "event": "submit",
                "data": { "row": 2, "col": 3, "char": "Z", "playerId": "P9" }
            })
        );
    }

    #[test]
    fn test_inbound_frame_tolerates_bad_ack_and_data() {
        let frame: InboundFrame =
            serde_json::from_str(r#"{"event":"submit","ack":1,"data":null}"#).unwrap();
        assert_eq!(frame.ack_id(), Some(1));
        assert_eq!(SubmitRequest::from_value(frame.data), SubmitRequest::default());

        let frame: InboundFrame = serde_json::from_str(
            r#"{"event":"submit","ack":"x","data":{"row":0,"col":1,"char":"A","playerId":"P1"}}"#,
        )
        .unwrap();
        assert_eq!(frame.ack_id(), None);
        assert_eq!(
            SubmitRequest::from_value(frame.data),
            SubmitRequest::new(0, 1, "A", "P1")
        );

        let frame: InboundFrame =
            serde_json::from_str(r#"{"event":"submit","ack":-4,"data":"A"}"#).unwrap();
        assert_eq!(frame.ack_id(), None);
        assert_eq!(SubmitRequest::from_value(frame.data), SubmitRequest::default());
    }

    #[test]
    fn test_inbound_frame_still_requires_known_event() {
        assert!(serde_json::from_str::<InboundFrame>(r#"{"event":"paint","data":{}}"#).is_err());
        assert!(serde_json::from_str::<InboundFrame>(r#"{"ack":1,"data":{}}"#).is_err());
    }
}
