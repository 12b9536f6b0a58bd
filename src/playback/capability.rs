//! The external embeddable player, seen from Rust.
//!
//! The widget is driven imperatively through [`EmbeddedPlayer`] and reports back through
//! an [`EventSink`] bound to one adapter instance.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;
use tracing::trace;

/// Identity of one constructed widget. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Widget playback states, decoded from the numeric codes the widget emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl PlayerState {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(Self::Unstarted),
            0 => Some(Self::Ended),
            1 => Some(Self::Playing),
            2 => Some(Self::Paused),
            3 => Some(Self::Buffering),
            5 => Some(Self::Cued),
            _ => None,
        }
    }
}

/// Error codes reported by the widget's error event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerErrorCode {
    InvalidParameter,
    Html5,
    NotFound,
    EmbedNotAllowed,
    Unknown(i64),
}

impl PlayerErrorCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            2 => Self::InvalidParameter,
            5 => Self::Html5,
            100 => Self::NotFound,
            101 | 150 => Self::EmbedNotAllowed,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::InvalidParameter => 2,
            Self::Html5 => 5,
            Self::NotFound => 100,
            Self::EmbedNotAllowed => 150,
            Self::Unknown(code) => code,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidParameter => "The player rejected this video id.",
            Self::Html5 => "The browser could not play this video.",
            Self::NotFound => "This video was removed or is private.",
            Self::EmbedNotAllowed => "The owner does not allow this video to be embedded.",
            Self::Unknown(_) => "Playback failed for an unknown reason.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    Ready,
    StateChanged(PlayerState),
    Error(PlayerErrorCode),
}

/// A widget event tagged with the instance that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterEvent {
    pub instance: InstanceId,
    pub event: PlayerEvent,
}

/// Widget construction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOptions {
    pub width: String,
    pub height: String,
    pub autoplay: bool,
    pub controls: bool,
    pub keyboard: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            width: "0".to_string(),
            height: "0".to_string(),
            autoplay: true,
            controls: false,
            keyboard: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    #[error("{0}")]
    Unavailable(String),
    #[error("player container `{0}` is not mounted")]
    ContainerMissing(String),
    #[error("could not create the player: {0}")]
    Construct(String),
}

pub type EventCallback = Rc<dyn Fn(AdapterEvent)>;

/// Event channel handed to the widget for one instance. Emitting after the instance was
/// destroyed does nothing.
#[derive(Clone)]
pub struct EventSink {
    instance: InstanceId,
    listening: Rc<Cell<bool>>,
    deliver: EventCallback,
}

impl EventSink {
    pub(crate) fn new(instance: InstanceId, listening: Rc<Cell<bool>>, deliver: EventCallback) -> Self {
        Self {
            instance,
            listening,
            deliver,
        }
    }

    pub fn emit(&self, event: PlayerEvent) {
        if !self.listening.get() {
            trace!(instance = %self.instance, ?event, "event after teardown ignored");
            return;
        }
        (self.deliver)(AdapterEvent {
            instance: self.instance,
            event,
        });
    }
}

/// Imperative surface of the external player capability.
///
/// Commands are fire-and-forget; their effects are confirmed later through the sink.
pub trait EmbeddedPlayer {
    type Handle;

    fn construct(
        &self,
        container_id: &str,
        track_id: &str,
        options: &PlayerOptions,
        sink: EventSink,
    ) -> Result<Self::Handle, PlayerError>;
    fn load_track(&self, handle: &Self::Handle, track_id: &str);
    fn play(&self, handle: &Self::Handle);
    fn pause(&self, handle: &Self::Handle);
    fn seek(&self, handle: &Self::Handle, seconds: f64);
    fn set_volume(&self, handle: &Self::Handle, percent: u8);
    fn current_time(&self, handle: &Self::Handle) -> f64;
    fn duration(&self, handle: &Self::Handle) -> f64;
    fn destroy(&self, handle: Self::Handle);
}
