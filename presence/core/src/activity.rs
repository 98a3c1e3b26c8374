//! Activity Model
//!
//! What the peer displays for this process. Every field is optional and is
//! left out of the JSON object when empty.
//!
//! `secrets` and `buttons` cannot be combined; the peer rejects an activity
//! carrying both. This layer does not check it.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A user's current activity
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Activity {
    /// What the player is currently doing
    #[serde(skip_serializing_if = "String::is_empty")]
    pub details: String,
    /// The user's current party status
    #[serde(skip_serializing_if = "String::is_empty")]
    pub state: String,
    /// Start and end of the activity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<Timestamps>,
    /// Profile artwork
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<Assets>,
    /// Party information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party: Option<Party>,
    /// Join and spectate secrets. Not allowed together with `buttons`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Secrets>,
    /// Up to two link buttons. Not allowed together with `secrets`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

/// Start and end of an activity
///
/// An `end` is displayed as time remaining. A `start` without an `end` is
/// displayed as time elapsed. Both go on the wire as Unix epoch seconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Timestamps {
    /// When the activity started
    pub start: Option<DateTime<Utc>>,
    /// When the activity ends
    pub end: Option<DateTime<Utc>>,
}

impl Timestamps {
    /// Elapsed time since `start`
    #[must_use]
    pub fn started_at(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Remaining time until `end`
    #[must_use]
    pub fn ends_at(end: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }
}

impl Serialize for Timestamps {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = usize::from(self.start.is_some()) + usize::from(self.end.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(start) = self.start {
            map.serialize_entry("start", &start.timestamp())?;
        }
        if let Some(end) = self.end {
            map.serialize_entry("end", &end.timestamp())?;
        }
        map.end()
    }
}

/// Profile artwork and tooltips
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Assets {
    /// Uploaded asset name for the large image
    #[serde(skip_serializing_if = "String::is_empty")]
    pub large_image: String,
    /// Tooltip for the large image
    #[serde(skip_serializing_if = "String::is_empty")]
    pub large_text: String,
    /// Uploaded asset name for the small image
    #[serde(skip_serializing_if = "String::is_empty")]
    pub small_image: String,
    /// Tooltip for the small image
    #[serde(skip_serializing_if = "String::is_empty")]
    pub small_text: String,
}

/// Party information
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Party {
    /// Id of the party, lobby or group
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// `[current, max]` party size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<[u32; 2]>,
}

/// Secrets for joining and spectating
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Secrets {
    /// Secret for chat invitations and Ask to Join
    #[serde(skip_serializing_if = "String::is_empty")]
    pub join: String,
    /// Secret for the Spectate button
    #[serde(skip_serializing_if = "String::is_empty")]
    pub spectate: String,
    /// Secret for a specific match
    #[serde(skip_serializing_if = "String::is_empty")]
    pub r#match: String,
}

/// A link button; both fields are required by the peer
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Button {
    /// Button text
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    /// URL opened on click
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

impl Button {
    /// Button with `label` opening `url`
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}
