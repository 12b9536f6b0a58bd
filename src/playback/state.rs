use crate::api::models::Track;
use crate::playback::capability::PlayerErrorCode;
use thiserror::Error;

pub const MAX_VOLUME: u8 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub current_track: Option<Track>,
    pub is_playing: bool,
    pub current_time: f64,
    /// Zero until the player reports the length of the loaded track.
    pub duration: f64,
    pub volume: u8,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_track: None,
            is_playing: false,
            current_time: 0.0,
            duration: 0.0,
            volume: MAX_VOLUME,
        }
    }
}

impl PlaybackState {
    pub fn is_current(&self, track: &Track) -> bool {
        self.current_track
            .as_ref()
            .map(|current| current.is_same(track))
            .unwrap_or(false)
    }

    /// Fraction of the track played, `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchSession {
    pub query: String,
    pub results: Vec<Track>,
    /// Most recent first, at most five entries.
    pub recent_queries: Vec<String>,
    pub searching: bool,
}

/// User-visible, non-fatal session failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Search failed: {0}")]
    SearchFailure(String),
    #[error("The player could not start: {0}")]
    PlayerInitFailure(String),
    #[error("{message} (error {code})", message = .0.message(), code = .0.code())]
    PlaybackError(PlayerErrorCode),
}
