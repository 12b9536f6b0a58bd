use crate::api::models::Track;
use crate::api::SearchError;
use crate::playback::capability::AdapterEvent;
use crate::playback::readiness::Readiness;

/// Commands raised by the view layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Search(String),
    SelectTrack(Track),
    TogglePlay,
    Seek(f64),
    SetVolume(f64),
    DismissError,
    SaveApiKey(String),
    Reset,
}

/// Everything the session loop reacts to, processed one at a time in arrival order.
#[derive(Debug)]
pub enum SessionMessage {
    Intent(Intent),
    CapabilityLoaded(Readiness),
    Adapter(AdapterEvent),
    Tick(u64),
    SearchCompleted {
        seq: u64,
        result: Result<Vec<Track>, SearchError>,
    },
}

impl From<Intent> for SessionMessage {
    fn from(intent: Intent) -> Self {
        Self::Intent(intent)
    }
}
