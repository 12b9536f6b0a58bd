use serde::{Deserialize, Serialize};

/// A playable search result. Built from query results and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Track {
    /// Opaque remote video identifier handed to the embedded player.
    pub external_id: String,
    pub title: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

impl Track {
    pub fn new(
        external_id: impl Into<String>,
        title: impl Into<String>,
        channel: impl Into<String>,
        thumbnail_url: impl Into<String>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            title: title.into(),
            channel: channel.into(),
            thumbnail_url: thumbnail_url.into(),
        }
    }

    pub fn is_same(&self, other: &Track) -> bool {
        self.external_id == other.external_id
    }
}

/// Format a position in seconds as `m:ss`. Negative or non-finite input renders as `0:00`.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let mins = total / 60;
    let secs = total % 60;
    format!("{}:{:02}", mins, secs)
}
