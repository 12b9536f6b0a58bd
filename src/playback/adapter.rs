//! Exclusive owner of the live embedded player instance.

use crate::playback::capability::{
    AdapterEvent, EmbeddedPlayer, EventCallback, EventSink, InstanceId, PlayerError,
    PlayerErrorCode, PlayerEvent, PlayerOptions, PlayerState,
};
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterStatus {
    Uninitialized,
    Constructing,
    Ready,
    Playing,
    Paused,
    Buffering,
    Ended,
    Failed(PlayerErrorCode),
    Destroyed,
}

impl AdapterStatus {
    /// Whether the widget accepts commands.
    pub fn is_controllable(self) -> bool {
        matches!(
            self,
            Self::Ready | Self::Playing | Self::Paused | Self::Buffering | Self::Ended
        )
    }
}

/// An event that passed the instance filter, tagged with the selection the instance was
/// last loaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmed {
    pub event: PlayerEvent,
    pub selection: u64,
}

struct LiveInstance<H> {
    id: InstanceId,
    handle: H,
    listening: Rc<Cell<bool>>,
    loaded_selection: u64,
}

pub struct PlayerAdapter<P: EmbeddedPlayer> {
    player: P,
    container_id: String,
    options: PlayerOptions,
    deliver: EventCallback,
    next_instance: u64,
    live: Option<LiveInstance<P::Handle>>,
    status: AdapterStatus,
}

impl<P: EmbeddedPlayer> PlayerAdapter<P> {
    pub fn new(
        player: P,
        container_id: impl Into<String>,
        options: PlayerOptions,
        deliver: EventCallback,
    ) -> Self {
        Self {
            player,
            container_id: container_id.into(),
            options,
            deliver,
            next_instance: 0,
            live: None,
            status: AdapterStatus::Uninitialized,
        }
    }

    pub fn status(&self) -> AdapterStatus {
        self.status
    }

    #[cfg(test)]
    pub(crate) fn instance(&self) -> Option<InstanceId> {
        self.live.as_ref().map(|live| live.id)
    }

    pub fn has_instance(&self) -> bool {
        self.live.is_some()
    }

    pub fn is_controllable(&self) -> bool {
        self.live.is_some() && self.status.is_controllable()
    }

    /// Builds a new widget for `track_id`. Any previous instance is destroyed first so two
    /// widgets never share the container.
    pub fn construct(&mut self, track_id: &str, selection: u64) -> Result<InstanceId, PlayerError> {
        self.destroy();

        self.next_instance += 1;
        let id = InstanceId(self.next_instance);
        let listening = Rc::new(Cell::new(true));
        let sink = EventSink::new(id, listening.clone(), self.deliver.clone());

        match self
            .player
            .construct(&self.container_id, track_id, &self.options, sink)
        {
            Ok(handle) => {
                info!(instance = %id, track_id, "constructing player");
                self.live = Some(LiveInstance {
                    id,
                    handle,
                    listening,
                    loaded_selection: selection,
                });
                self.status = AdapterStatus::Constructing;
                Ok(id)
            }
            Err(err) => {
                listening.set(false);
                warn!(instance = %id, error = %err, "player construction failed");
                self.status = AdapterStatus::Uninitialized;
                Err(err)
            }
        }
    }

    /// Points the live widget at another track. Returns `false` when it cannot take commands.
    pub fn load(&mut self, track_id: &str, selection: u64) -> bool {
        if !self.status.is_controllable() {
            return false;
        }
        let Some(live) = self.live.as_mut() else {
            return false;
        };
        debug!(instance = %live.id, track_id, selection, "loading track");
        self.player.load_track(&live.handle, track_id);
        live.loaded_selection = selection;
        true
    }

    pub fn play(&self) -> bool {
        self.command(|player, handle| player.play(handle))
    }

    pub fn pause(&self) -> bool {
        self.command(|player, handle| player.pause(handle))
    }

    pub fn seek(&self, seconds: f64) -> bool {
        self.command(|player, handle| player.seek(handle, seconds))
    }

    pub fn set_volume(&self, percent: u8) -> bool {
        self.command(|player, handle| player.set_volume(handle, percent))
    }

    pub fn current_time(&self) -> Option<f64> {
        self.query(|player, handle| player.current_time(handle))
    }

    pub fn duration(&self) -> Option<f64> {
        self.query(|player, handle| player.duration(handle))
    }

    fn command(&self, f: impl FnOnce(&P, &P::Handle)) -> bool {
        match &self.live {
            Some(live) if self.status.is_controllable() => {
                f(&self.player, &live.handle);
                true
            }
            _ => false,
        }
    }

    fn query(&self, f: impl FnOnce(&P, &P::Handle) -> f64) -> Option<f64> {
        let live = self.live.as_ref().filter(|_| self.status.is_controllable())?;
        Some(f(&self.player, &live.handle)).filter(|value| value.is_finite() && *value >= 0.0)
    }

    /// Filters out events from destroyed or superseded instances and advances the
    /// adapter state machine.
    pub fn accept(&mut self, event: AdapterEvent) -> Option<Confirmed> {
        let live = self.live.as_ref()?;
        if live.id != event.instance {
            debug!(
                stale = %event.instance,
                live = %live.id,
                "dropping event from superseded player"
            );
            return None;
        }
        let selection = live.loaded_selection;

        self.status = match (self.status, event.event) {
            (AdapterStatus::Constructing, PlayerEvent::Ready) => AdapterStatus::Ready,
            (status, PlayerEvent::Ready) => status,
            (AdapterStatus::Constructing, PlayerEvent::StateChanged(_)) => {
                AdapterStatus::Constructing
            }
            (AdapterStatus::Failed(code), PlayerEvent::StateChanged(_)) => {
                AdapterStatus::Failed(code)
            }
            (_, PlayerEvent::StateChanged(state)) => match state {
                PlayerState::Playing => AdapterStatus::Playing,
                PlayerState::Paused => AdapterStatus::Paused,
                PlayerState::Buffering => AdapterStatus::Buffering,
                PlayerState::Ended => AdapterStatus::Ended,
                PlayerState::Unstarted | PlayerState::Cued => AdapterStatus::Ready,
            },
            (_, PlayerEvent::Error(code)) => AdapterStatus::Failed(code),
        };

        Some(Confirmed {
            event: event.event,
            selection,
        })
    }

    /// Unregisters listeners and tears the widget down.
    pub fn destroy(&mut self) {
        let Some(live) = self.live.take() else {
            return;
        };
        live.listening.set(false);
        debug!(instance = %live.id, "destroying player");
        self.player.destroy(live.handle);
        self.status = AdapterStatus::Destroyed;
    }

    #[cfg(test)]
    pub(crate) fn player(&self) -> &P {
        &self.player
    }
}

impl<P: EmbeddedPlayer> Drop for PlayerAdapter<P> {
    fn drop(&mut self) {
        self.destroy();
    }
}
