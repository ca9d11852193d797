// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity log model: the closed set of event kinds and their payloads.
//!
//! Entries arrive as loosely-typed JSON (`{ timestamp, type, data }`) from the
//! desktop collector or the dashboard. [`NewActivity::from_entry`] is the single
//! place where that JSON is checked and turned into an [`ActivityPayload`];
//! everything downstream works with the typed form.

use crate::error::ValidationError;
use crate::time_utils::{from_epoch_millis, is_fixed_width_year, parse_event_timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Kind of observed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Window,
    Browser,
    Keyboard,
    Mouse,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 4] = [
        ActivityKind::Window,
        ActivityKind::Browser,
        ActivityKind::Keyboard,
        ActivityKind::Mouse,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Window => "window",
            ActivityKind::Browser => "browser",
            ActivityKind::Keyboard => "keyboard",
            ActivityKind::Mouse => "mouse",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownKind(s.to_string()))
    }
}

/// Foreground window change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowData {
    pub process_name: String,
    pub window_title: String,
}

/// Browser history visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserData {
    pub url: String,
    pub browser_title: String,
    pub browser_name: String,
}

/// Keyboard or mouse activity. The event itself is the signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputData {}

/// Typed payload, one variant per kind.
///
/// Serializes as `{ "type": "<kind>", "data": { ... } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ActivityPayload {
    Window(WindowData),
    Browser(BrowserData),
    Keyboard(InputData),
    Mouse(InputData),
}

impl ActivityPayload {
    pub fn kind(&self) -> ActivityKind {
        match self {
            ActivityPayload::Window(_) => ActivityKind::Window,
            ActivityPayload::Browser(_) => ActivityKind::Browser,
            ActivityPayload::Keyboard(_) => ActivityKind::Keyboard,
            ActivityPayload::Mouse(_) => ActivityKind::Mouse,
        }
    }

    /// Rebuild a payload from its kind and the stored field bag.
    pub fn from_parts(kind: ActivityKind, data: ActivityData) -> Result<Self, ValidationError> {
        match kind {
            ActivityKind::Window => Ok(ActivityPayload::Window(WindowData {
                process_name: data
                    .process_name
                    .ok_or(ValidationError::MissingField("data.processName"))?,
                window_title: data
                    .window_title
                    .ok_or(ValidationError::MissingField("data.windowTitle"))?,
            })),
            ActivityKind::Browser => Ok(ActivityPayload::Browser(BrowserData {
                url: data.url.ok_or(ValidationError::MissingField("data.url"))?,
                browser_title: data
                    .browser_title
                    .ok_or(ValidationError::MissingField("data.browserTitle"))?,
                browser_name: data
                    .browser_name
                    .ok_or(ValidationError::MissingField("data.browserName"))?,
            })),
            ActivityKind::Keyboard => Ok(ActivityPayload::Keyboard(InputData {})),
            ActivityKind::Mouse => Ok(ActivityPayload::Mouse(InputData {})),
        }
    }

    /// Flatten back into the loose field bag (storage layout).
    pub fn to_data(&self) -> ActivityData {
        match self {
            ActivityPayload::Window(w) => ActivityData {
                process_name: Some(w.process_name.clone()),
                window_title: Some(w.window_title.clone()),
                ..Default::default()
            },
            ActivityPayload::Browser(b) => ActivityData {
                url: Some(b.url.clone()),
                browser_title: Some(b.browser_title.clone()),
                browser_name: Some(b.browser_name.clone()),
                ..Default::default()
            },
            ActivityPayload::Keyboard(_) | ActivityPayload::Mouse(_) => ActivityData::default(),
        }
    }
}

/// Flat payload fields as stored in Firestore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_name: Option<String>,
}

/// A validated entry, ready to be persisted for some owner.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    /// Client-asserted event time
    pub timestamp: DateTime<Utc>,
    pub payload: ActivityPayload,
}

impl NewActivity {
    /// Validate a raw `{ timestamp, type, data }` entry.
    pub fn from_entry(entry: &Value) -> Result<Self, ValidationError> {
        let obj = entry.as_object().ok_or(ValidationError::NotAnObject)?;

        let kind = match obj.get("type") {
            None | Some(Value::Null) => return Err(ValidationError::MissingField("type")),
            Some(Value::String(s)) => s.parse::<ActivityKind>()?,
            Some(other) => return Err(ValidationError::UnknownKind(other.to_string())),
        };

        let timestamp = match obj.get("timestamp") {
            None | Some(Value::Null) => return Err(ValidationError::MissingField("timestamp")),
            Some(Value::String(s)) => parse_event_timestamp(s)
                .ok_or_else(|| ValidationError::InvalidTimestamp(s.clone()))?,
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(from_epoch_millis)
                .ok_or_else(|| ValidationError::InvalidTimestamp(n.to_string()))?,
            Some(other) => return Err(ValidationError::InvalidTimestamp(other.to_string())),
        };

        if !is_fixed_width_year(&timestamp) {
            return Err(ValidationError::InvalidTimestamp(timestamp.to_rfc3339()));
        }

        let empty = Map::new();
        let data = match obj.get("data") {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(ValidationError::InvalidPayload(
                    "data must be an object".to_string(),
                ))
            }
        };

        // Only the fields the kind needs are read; anything else in `data`
        // is ignored whatever its type.
        let payload = match kind {
            ActivityKind::Window => ActivityPayload::Window(WindowData {
                process_name: required_str(data, "processName", "data.processName")?,
                window_title: required_str(data, "windowTitle", "data.windowTitle")?,
            }),
            ActivityKind::Browser => ActivityPayload::Browser(BrowserData {
                url: required_str(data, "url", "data.url")?,
                browser_title: required_str(data, "browserTitle", "data.browserTitle")?,
                browser_name: browser_name(data)?,
            }),
            ActivityKind::Keyboard => ActivityPayload::Keyboard(InputData {}),
            ActivityKind::Mouse => ActivityPayload::Mouse(InputData {}),
        };

        Ok(NewActivity { timestamp, payload })
    }
}

fn required_str(
    data: &Map<String, Value>,
    key: &str,
    field: &'static str,
) -> Result<String, ValidationError> {
    match data.get(key) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::InvalidPayload(format!(
            "{field} must be a string"
        ))),
    }
}

/// `browserName`, or the collector's older `browserType` when it is absent.
fn browser_name(data: &Map<String, Value>) -> Result<String, ValidationError> {
    match data.get("browserName") {
        None | Some(Value::Null) => required_str(data, "browserType", "data.browserName"),
        Some(_) => required_str(data, "browserName", "data.browserName"),
    }
}

/// Stored activity record, as returned to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Client-asserted event time
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: ActivityPayload,
    /// Server bookkeeping, unrelated to `timestamp`
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActivityRecord {
    pub fn kind(&self) -> ActivityKind {
        self.payload.kind()
    }
}
