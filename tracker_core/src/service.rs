//! Transport-agnostic status facade.
//!
//! Answers the monitoring client's four queries from the latest published
//! snapshot and routes manual-override commands into the mode cell. Any
//! request transport (HTTP server, stdin lines, tests) calls [`StatusService::handle`].

use serde::Serialize;
use serde_json::value::RawValue;

use crate::SENSOR_COUNT;
use crate::arbiter::{Mode, ModeCommand};
use crate::builder::StatusLink;
use crate::config::HistoryOrder;
use crate::snapshot::SharedSnapshot;

const CONTENT_HTML: &str = "text/html";
const CONTENT_JSON: &str = "application/json";
const CONTENT_TEXT: &str = "text/plain";

const PLACEHOLDER_ROOT: &str = "<!doctype html><title>solar tracker</title><p>/data /history /control</p>";

/// Reply to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    fn ok(content_type: &'static str, body: String) -> Self {
        Self {
            status: 200,
            content_type,
            body,
        }
    }

    fn not_found() -> Self {
        Self {
            status: 404,
            content_type: CONTENT_TEXT,
            body: "Not found".to_owned(),
        }
    }
}

/// Parsed `/control` query. Unknown keys and unparseable values are dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlCommand {
    pub mode: Option<ModeCommand>,
    pub angle: Option<i64>,
}

impl ControlCommand {
    /// Parse `mode=..&angle=..` after form decoding (`%XX`, `+`).
    /// The first occurrence of a key wins.
    pub fn parse(query: &str) -> Self {
        let mut mode_raw = None;
        let mut angle_raw = None;
        for (k, v) in form_urlencoded::parse(query.as_bytes()) {
            match &*k {
                "mode" if mode_raw.is_none() => mode_raw = Some(v),
                "angle" if angle_raw.is_none() => angle_raw = Some(v),
                _ => {}
            }
        }
        Self {
            mode: mode_raw.as_deref().and_then(ModeCommand::parse),
            angle: angle_raw.and_then(|v| v.trim().parse::<i64>().ok()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.angle.is_none()
    }
}

/// Float rendered with exactly two decimals (`3.30`, not `3.3`).
struct Fixed2(f32);

impl Serialize for Fixed2 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = if self.0.is_finite() { self.0 } else { 0.0 };
        // Anything that would print as "-0.00" prints as "0.00".
        let v = if v.abs() < 0.005 { 0.0 } else { v };
        let raw = RawValue::from_string(format!("{v:.2}"))
            .map_err(<S::Error as serde::ser::Error>::custom)?;
        raw.serialize(serializer)
    }
}

#[derive(Serialize)]
struct StatusBody {
    voltage: Fixed2,
    power: Fixed2,
    angle: i32,
    mode: &'static str,
    ldr: [i32; SENSOR_COUNT],
}

impl From<&SharedSnapshot> for StatusBody {
    fn from(s: &SharedSnapshot) -> Self {
        Self {
            voltage: Fixed2(s.voltage),
            power: Fixed2(s.power),
            angle: s.target_deg,
            mode: s.mode.label(),
            ldr: s.ldr_raw,
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "status serialization failed");
        String::from("null")
    })
}

pub struct StatusService {
    link: StatusLink,
    history_order: HistoryOrder,
    root_page: &'static str,
}

impl core::fmt::Debug for StatusService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StatusService")
            .field("history_order", &self.history_order)
            .field("mode", &self.link.mode.load())
            .finish_non_exhaustive()
    }
}

impl StatusService {
    pub fn new(link: StatusLink, history_order: HistoryOrder) -> Self {
        Self {
            link,
            history_order,
            root_page: PLACEHOLDER_ROOT,
        }
    }

    /// Document served on `/`.
    pub fn with_root_page(mut self, page: &'static str) -> Self {
        self.root_page = page;
        self
    }

    /// Latest snapshot drained from the control loop.
    pub fn snapshot(&mut self) -> &SharedSnapshot {
        self.link.reader.latest()
    }

    /// Mode the control loop will see on its next tick.
    pub fn pending_mode(&self) -> Mode {
        self.link.mode.load()
    }

    /// `{"voltage","power","angle","mode","ldr"}` from a single tick.
    pub fn status(&mut self) -> String {
        let body = StatusBody::from(self.link.reader.latest());
        to_json(&body)
    }

    /// The 60-sample voltage history as a JSON array.
    pub fn history(&mut self) -> String {
        let order = self.history_order;
        let snap = self.link.reader.latest();
        let samples = match order {
            HistoryOrder::Chronological => snap.history_chronological(),
            HistoryOrder::Storage => snap.history,
        };
        let body: Vec<Fixed2> = samples.into_iter().map(Fixed2).collect();
        to_json(&body)
    }

    /// Apply a manual-override query. Always acknowledged.
    pub fn control(&mut self, query: &str) -> &'static str {
        let cmd = ControlCommand::parse(query);
        if !cmd.is_empty() {
            let mode = self.link.mode.apply(cmd.mode, cmd.angle);
            tracing::debug!(?cmd, ?mode, "control command applied");
        }
        "OK"
    }

    pub fn root(&self) -> &'static str {
        self.root_page
    }

    /// Route a request target such as `/control?mode=manual&angle=45`.
    pub fn handle(&mut self, target: &str) -> Response {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        match path {
            "/" => Response::ok(CONTENT_HTML, self.root().to_owned()),
            "/data" => Response::ok(CONTENT_JSON, self.status()),
            "/history" => Response::ok(CONTENT_JSON, self.history()),
            "/control" => Response::ok(CONTENT_TEXT, self.control(query).to_owned()),
            _ => Response::not_found(),
        }
    }
}
