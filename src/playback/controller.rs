//! The single writer of [`PlaybackState`].
//!
//! User commands apply optimistically and fire adapter calls; adapter events arrive later
//! and are authoritative. Track selections and searches carry monotonically increasing
//! sequence numbers so late confirmations of superseded requests can be discarded.

use crate::api::models::Track;
use crate::api::SearchError;
use crate::playback::adapter::{AdapterStatus, PlayerAdapter};
use crate::playback::capability::{
    AdapterEvent, EmbeddedPlayer, EventCallback, PlayerEvent, PlayerOptions, PlayerState,
};
use crate::playback::clock::{PollingClock, TickScheduler, POLL_INTERVAL};
use crate::playback::state::{PlaybackState, SearchSession, SessionError, MAX_VOLUME};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const PLAYER_CONTAINER_ID: &str = "youtube-player";

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerOptions {
    pub container_id: String,
    pub player: PlayerOptions,
    pub poll_interval: Duration,
    pub autoselect_first_result: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            container_id: PLAYER_CONTAINER_ID.to_string(),
            player: PlayerOptions::default(),
            poll_interval: POLL_INTERVAL,
            autoselect_first_result: true,
        }
    }
}

/// Load state of the external player script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityStatus {
    Unloaded,
    Loading,
    Ready,
    Failed(String),
}

/// A search the runtime should execute; report back with the same `seq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Applied {
        query: String,
        autoselected: Option<Track>,
    },
    Failed,
    Stale,
}

pub struct PlaybackController<P: EmbeddedPlayer, S: TickScheduler> {
    state: PlaybackState,
    session: SearchSession,
    error: Option<SessionError>,
    adapter: PlayerAdapter<P>,
    clock: PollingClock<S>,
    capability: CapabilityStatus,
    autoselect_first_result: bool,
    selection_seq: u64,
    awaiting_confirmation: Option<u64>,
    search_seq: u64,
    pending_search: Option<SearchTicket>,
}

impl<P: EmbeddedPlayer, S: TickScheduler> PlaybackController<P, S> {
    pub fn new(player: P, scheduler: S, deliver: EventCallback, options: ControllerOptions) -> Self {
        Self {
            state: PlaybackState::default(),
            session: SearchSession::default(),
            error: None,
            adapter: PlayerAdapter::new(player, options.container_id, options.player, deliver),
            clock: PollingClock::new(scheduler, options.poll_interval),
            capability: CapabilityStatus::Unloaded,
            autoselect_first_result: options.autoselect_first_result,
            selection_seq: 0,
            awaiting_confirmation: None,
            search_seq: 0,
            pending_search: None,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn session(&self) -> &SearchSession {
        &self.session
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn adapter_status(&self) -> AdapterStatus {
        self.adapter.status()
    }

    pub fn capability(&self) -> &CapabilityStatus {
        &self.capability
    }

    #[cfg(test)]
    pub(crate) fn clock(&self) -> &PollingClock<S> {
        &self.clock
    }

    /// Whether transport controls can act on the player right now.
    pub fn controls_enabled(&self) -> bool {
        self.state.current_track.is_some() && self.adapter.is_controllable()
    }

    pub fn set_recent_queries(&mut self, recent: Vec<String>) {
        self.session.recent_queries = recent;
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// The query of the search in flight, if any.
    pub fn pending_query(&self) -> Option<&str> {
        self.pending_search.as_ref().map(|ticket| ticket.query.as_str())
    }

    /// Starts a search and supersedes any in flight. Blank queries are ignored.
    ///
    /// The session query only changes once the search succeeds.
    pub fn search(&mut self, query: &str) -> Option<SearchTicket> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        self.search_seq += 1;
        let ticket = SearchTicket {
            seq: self.search_seq,
            query: query.to_string(),
        };
        self.pending_search = Some(ticket.clone());
        self.session.searching = true;
        debug!(seq = ticket.seq, query, "search issued");
        Some(ticket)
    }

    pub fn search_completed(
        &mut self,
        seq: u64,
        result: Result<Vec<Track>, SearchError>,
    ) -> SearchOutcome {
        let Some(ticket) = self.pending_search.take_if(|ticket| ticket.seq == seq) else {
            debug!(seq, "discarding superseded search result");
            return SearchOutcome::Stale;
        };
        self.session.searching = false;

        match result {
            Ok(results) => {
                info!(query = %ticket.query, count = results.len(), "search completed");
                self.session.query = ticket.query;
                self.session.results = results;
                if matches!(self.error, Some(SessionError::SearchFailure(_))) {
                    self.error = None;
                }
                let autoselected = if self.autoselect_first_result
                    && self.state.current_track.is_none()
                {
                    self.session.results.first().cloned()
                } else {
                    None
                };
                if let Some(track) = autoselected.clone() {
                    self.select_track(track);
                }
                SearchOutcome::Applied {
                    query: self.session.query.clone(),
                    autoselected,
                }
            }
            Err(err) => {
                warn!(query = %ticket.query, error = %err, "search failed");
                self.error = Some(SessionError::SearchFailure(err.to_string()));
                SearchOutcome::Failed
            }
        }
    }

    pub fn capability_loading(&mut self) {
        if self.capability == CapabilityStatus::Unloaded {
            self.capability = CapabilityStatus::Loading;
        }
    }

    pub fn capability_loaded(&mut self, outcome: Result<(), String>) {
        match outcome {
            Ok(()) => {
                info!("player capability ready");
                self.capability = CapabilityStatus::Ready;
                if self.state.current_track.is_some() && !self.adapter.has_instance() {
                    self.construct_current();
                }
            }
            Err(message) => {
                warn!(%message, "player capability failed to load");
                self.capability = CapabilityStatus::Failed(message.clone());
                self.error = Some(SessionError::PlayerInitFailure(message));
                self.set_playing(false);
            }
        }
    }

    /// Selects `track`, superseding any earlier selection. Returns its sequence number.
    pub fn select_track(&mut self, track: Track) -> u64 {
        self.selection_seq += 1;
        let seq = self.selection_seq;
        info!(seq, track_id = %track.external_id, "track selected");

        self.clock.stop();
        self.state.current_track = Some(track);
        self.state.current_time = 0.0;
        self.state.duration = 0.0;
        self.state.is_playing = true;
        self.awaiting_confirmation = Some(seq);
        if matches!(self.error, Some(SessionError::PlaybackError(_))) {
            self.error = None;
        }

        if let CapabilityStatus::Failed(message) = &self.capability {
            // No player can ever be built on this page.
            self.error = Some(SessionError::PlayerInitFailure(message.clone()));
            self.state.is_playing = false;
            return seq;
        }

        match self.adapter.status() {
            status if status.is_controllable() => {
                self.load_current();
            }
            // The widget is still being built; the newest selection loads once it is ready.
            AdapterStatus::Constructing => {}
            _ => {
                if self.capability == CapabilityStatus::Ready {
                    self.construct_current();
                }
            }
        }
        seq
    }

    pub fn select_index(&mut self, index: usize) -> Option<u64> {
        let track = self.session.results.get(index).cloned()?;
        Some(self.select_track(track))
    }

    /// Requests play or pause. Ignored when no controllable player exists.
    pub fn toggle_play(&mut self) -> bool {
        if !self.controls_enabled() {
            return false;
        }
        if self.state.is_playing {
            self.adapter.pause();
            self.set_playing(false);
        } else {
            self.adapter.play();
            self.state.is_playing = true;
        }
        true
    }

    /// Seeks within `[0, duration]`. Returns the clamped target, or `None` when the
    /// player did not take the command.
    pub fn seek(&mut self, seconds: f64) -> Option<f64> {
        if !seconds.is_finite() {
            return None;
        }
        let target = seconds.clamp(0.0, self.state.duration.max(0.0));
        if !self.adapter.seek(target) {
            return None;
        }
        self.state.current_time = target;
        Some(target)
    }

    /// Stores the volume clamped to `0..=100` and forwards it to the player.
    pub fn set_volume(&mut self, percent: f64) -> u8 {
        if percent.is_nan() {
            return self.state.volume;
        }
        let volume = percent.round().clamp(0.0, f64::from(MAX_VOLUME)) as u8;
        self.state.volume = volume;
        self.adapter.set_volume(volume);
        volume
    }

    /// Destroys the player and clears the selection.
    pub fn reset(&mut self) {
        self.teardown();
        self.awaiting_confirmation = None;
        self.state = PlaybackState {
            volume: self.state.volume,
            ..PlaybackState::default()
        };
    }

    /// Stops sampling and releases the player. Used on unmount.
    pub fn teardown(&mut self) {
        self.set_playing(false);
        self.adapter.destroy();
    }

    pub fn handle_event(&mut self, event: AdapterEvent) {
        let Some(confirmed) = self.adapter.accept(event) else {
            return;
        };
        let current = confirmed.selection == self.selection_seq;

        match confirmed.event {
            PlayerEvent::Ready => {
                self.adapter.set_volume(self.state.volume);
                if current {
                    self.confirm_duration();
                    if self.state.is_playing {
                        self.adapter.play();
                    }
                } else {
                    debug!(
                        stale = confirmed.selection,
                        current = self.selection_seq,
                        "ready for a superseded selection"
                    );
                    self.load_current();
                }
            }
            PlayerEvent::StateChanged(state) => {
                if current
                    && self.awaiting_confirmation == Some(self.selection_seq)
                    && matches!(
                        state,
                        PlayerState::Playing | PlayerState::Paused | PlayerState::Cued
                    )
                {
                    self.confirm_duration();
                }
                match state {
                    PlayerState::Playing => {
                        self.state.is_playing = true;
                        self.clock.start();
                    }
                    PlayerState::Buffering => {}
                    PlayerState::Paused | PlayerState::Cued | PlayerState::Unstarted => {
                        self.set_playing(false);
                    }
                    PlayerState::Ended => {
                        self.set_playing(false);
                        if self.state.duration > 0.0 {
                            self.state.current_time = self.state.duration;
                        }
                    }
                }
            }
            PlayerEvent::Error(code) => {
                warn!(code = code.code(), "player reported an error");
                self.set_playing(false);
                self.error = Some(SessionError::PlaybackError(code));
            }
        }
    }

    /// Samples the playback position for a tick of the polling clock.
    pub fn tick(&mut self, generation: u64) -> bool {
        if !self.clock.accepts(generation) {
            return false;
        }
        if !self.state.is_playing {
            self.clock.stop();
            return false;
        }
        if self.state.duration <= 0.0 {
            self.confirm_duration();
        }
        let Some(time) = self.adapter.current_time() else {
            return false;
        };
        self.state.current_time = self.clamp_to_duration(time);
        true
    }

    fn set_playing(&mut self, playing: bool) {
        self.state.is_playing = playing;
        if playing {
            return;
        }
        self.clock.stop();
        if let Some(time) = self.adapter.current_time() {
            self.state.current_time = self.clamp_to_duration(time);
        }
    }

    fn clamp_to_duration(&self, time: f64) -> f64 {
        if self.state.duration > 0.0 {
            time.clamp(0.0, self.state.duration)
        } else {
            time.max(0.0)
        }
    }

    fn confirm_duration(&mut self) {
        let Some(duration) = self.adapter.duration().filter(|d| *d > 0.0) else {
            return;
        };
        self.state.duration = duration;
        self.state.current_time = self.state.current_time.min(duration);
        self.awaiting_confirmation = None;
        debug!(duration, seq = self.selection_seq, "duration confirmed");
    }

    fn load_current(&mut self) {
        let Some(track_id) = self
            .state
            .current_track
            .as_ref()
            .map(|t| t.external_id.clone())
        else {
            return;
        };
        self.adapter.load(&track_id, self.selection_seq);
    }

    fn construct_current(&mut self) {
        let Some(track_id) = self
            .state
            .current_track
            .as_ref()
            .map(|t| t.external_id.clone())
        else {
            return;
        };
        if let Err(err) = self.adapter.construct(&track_id, self.selection_seq) {
            self.error = Some(SessionError::PlayerInitFailure(err.to_string()));
            self.set_playing(false);
        }
    }

    #[cfg(test)]
    pub(crate) fn adapter(&self) -> &PlayerAdapter<P> {
        &self.adapter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::capability::{InstanceId, PlayerErrorCode};
    use crate::playback::testing::{tracks, FakeCall, Harness};

    #[test]
    fn selection_before_the_script_loads_is_deferred() {
        let mut h = Harness::new();
        h.controller.capability_loading();
        let list = tracks(3);
        h.controller.select_track(list[0].clone());
        h.controller.select_track(list[1].clone());
        assert!(h.player.calls().is_empty());
        assert!(h.controller.state().is_playing);

        h.controller.capability_loaded(Ok(()));
        assert_eq!(h.player.calls(), vec![FakeCall::Construct("vid1".to_string())]);
        assert_eq!(h.controller.adapter_status(), AdapterStatus::Constructing);
    }

    #[test]
    fn late_confirmation_of_a_superseded_selection_is_discarded() {
        let mut h = Harness::ready();
        let list = tracks(2);
        h.player.set_duration("vid0", 200.0);
        h.player.set_duration("vid1", 321.0);

        let first = h.controller.select_track(list[0].clone());
        let second = h.controller.select_track(list[1].clone());
        assert!(second > first);

        // The widget was built for the first selection and only now reports ready.
        h.emit(PlayerEvent::Ready);
        assert_eq!(h.controller.state().duration, 0.0);
        assert_eq!(h.controller.state().current_track, Some(list[1].clone()));
        assert_eq!(
            h.player.calls(),
            vec![
                FakeCall::Construct("vid0".to_string()),
                FakeCall::Volume(100),
                FakeCall::Load("vid1".to_string()),
            ]
        );

        h.emit(PlayerEvent::StateChanged(PlayerState::Playing));
        assert_eq!(h.controller.state().duration, 321.0);
        assert_eq!(h.controller.state().current_track, Some(list[1].clone()));
    }

    #[test]
    fn selecting_on_a_ready_player_reuses_it() {
        let mut h = Harness::ready();
        let list = tracks(2);
        h.player.set_duration("vid0", 100.0);
        h.player.set_duration("vid1", 250.0);
        h.controller.select_track(list[0].clone());
        h.emit(PlayerEvent::Ready);
        h.emit(PlayerEvent::StateChanged(PlayerState::Playing));
        h.player.set_position(42.0);
        h.tick();
        assert_eq!(h.controller.state().current_time, 42.0);

        h.controller.select_track(list[1].clone());
        let state = h.controller.state();
        assert_eq!(state.current_time, 0.0);
        assert!(state.is_playing);
        assert_eq!(state.duration, 0.0);
        assert_eq!(h.timers.active(), 0);
        assert_eq!(h.player.live_handles(), 1);
        assert_eq!(h.player.calls().last(), Some(&FakeCall::Load("vid1".to_string())));

        h.emit(PlayerEvent::StateChanged(PlayerState::Buffering));
        assert_eq!(h.controller.state().duration, 0.0);
        h.emit(PlayerEvent::StateChanged(PlayerState::Playing));
        assert_eq!(h.controller.state().duration, 250.0);
    }

    #[test]
    fn at_most_one_timer_and_none_after_pause() {
        let mut h = Harness::ready();
        h.controller.select_track(tracks(1)[0].clone());
        h.emit(PlayerEvent::Ready);
        h.emit(PlayerEvent::StateChanged(PlayerState::Playing));
        h.emit(PlayerEvent::StateChanged(PlayerState::Buffering));
        h.emit(PlayerEvent::StateChanged(PlayerState::Playing));
        assert_eq!(h.timers.active(), 1);
        assert_eq!(h.timers.scheduled(), 1);

        assert!(h.controller.toggle_play());
        assert!(!h.controller.state().is_playing);
        assert_eq!(h.timers.active(), 0);
        assert_eq!(h.player.calls().last(), Some(&FakeCall::Pause));

        assert!(h.controller.toggle_play());
        assert!(h.controller.state().is_playing);
        assert_eq!(h.timers.active(), 0);
        h.emit(PlayerEvent::StateChanged(PlayerState::Playing));
        assert_eq!(h.timers.active(), 1);

        h.emit(PlayerEvent::StateChanged(PlayerState::Paused));
        assert_eq!(h.timers.active(), 0);
    }

    #[test]
    fn ticks_from_a_cancelled_timer_are_ignored() {
        let mut h = Harness::ready();
        h.controller.select_track(tracks(1)[0].clone());
        h.emit(PlayerEvent::Ready);
        h.emit(PlayerEvent::StateChanged(PlayerState::Playing));
        let stale = h.timers.last_generation();
        h.emit(PlayerEvent::StateChanged(PlayerState::Paused));
        h.player.set_position(99.0);
        assert!(!h.controller.tick(stale));
    }

    #[test]
    fn volume_and_seek_clamp() {
        let mut h = Harness::ready();
        assert_eq!(h.controller.set_volume(-10.0), 0);
        assert_eq!(h.controller.state().volume, 0);
        assert_eq!(h.controller.set_volume(150.0), 100);
        assert_eq!(h.controller.state().volume, 100);
        assert_eq!(h.controller.set_volume(42.4), 42);

        h.player.set_duration("vid0", 180.0);
        h.controller.select_track(tracks(1)[0].clone());
        h.emit(PlayerEvent::Ready);
        assert_eq!(h.controller.state().duration, 180.0);

        assert_eq!(h.controller.seek(-5.0), Some(0.0));
        assert_eq!(h.controller.state().current_time, 0.0);
        assert_eq!(h.controller.seek(230.0), Some(180.0));
        assert_eq!(h.controller.state().current_time, 180.0);
        assert_eq!(h.player.calls().last(), Some(&FakeCall::Seek(180.0)));
        assert_eq!(h.controller.seek(f64::NAN), None);
    }

    #[test]
    fn volume_is_applied_when_the_player_becomes_ready() {
        let mut h = Harness::ready();
        h.controller.set_volume(30.0);
        h.controller.select_track(tracks(1)[0].clone());
        assert!(!h.player.calls().contains(&FakeCall::Volume(30)));
        h.emit(PlayerEvent::Ready);
        assert!(h.player.calls().contains(&FakeCall::Volume(30)));
    }

    #[test]
    fn events_from_a_destroyed_player_do_not_touch_state() {
        let mut h = Harness::ready();
        let list = tracks(2);
        h.player.set_duration("vid0", 100.0);
        h.controller.select_track(list[0].clone());
        h.emit(PlayerEvent::Ready);
        h.emit(PlayerEvent::Error(PlayerErrorCode::Html5));
        let old_sink = h.player.sink(0);

        // Retrying after an error rebuilds the widget.
        h.controller.select_track(list[1].clone());
        assert_eq!(h.player.live_handles(), 1);
        assert_eq!(h.controller.adapter().instance(), Some(InstanceId(2)));
        let before = h.controller.state().clone();

        old_sink.emit(PlayerEvent::StateChanged(PlayerState::Paused));
        assert!(h.events.is_empty());
        h.controller.handle_event(AdapterEvent {
            instance: InstanceId(1),
            event: PlayerEvent::StateChanged(PlayerState::Ended),
        });
        assert_eq!(h.controller.state(), &before);
        assert!(h.controller.state().is_playing);
    }

    #[test]
    fn player_error_halts_playback_but_keeps_the_selection() {
        let mut h = Harness::ready();
        let track = tracks(1)[0].clone();
        h.controller.select_track(track.clone());
        h.emit(PlayerEvent::Ready);
        h.emit(PlayerEvent::StateChanged(PlayerState::Playing));
        h.emit(PlayerEvent::Error(PlayerErrorCode::EmbedNotAllowed));

        let state = h.controller.state();
        assert!(!state.is_playing);
        assert_eq!(state.current_track, Some(track));
        assert_eq!(h.timers.active(), 0);
        assert_eq!(
            h.controller.error(),
            Some(&SessionError::PlaybackError(PlayerErrorCode::EmbedNotAllowed))
        );
        assert!(!h.controller.toggle_play());
    }

    #[test]
    fn toggle_without_a_player_is_a_no_op() {
        let mut h = Harness::new();
        assert!(!h.controller.toggle_play());
        h.controller.select_track(tracks(1)[0].clone());
        assert!(!h.controller.toggle_play());
        assert!(h.controller.state().is_playing);
        assert!(h.player.calls().is_empty());
    }

    #[test]
    fn construction_failure_is_surfaced() {
        let mut h = Harness::ready();
        h.player.fail_next_construct();
        h.controller.select_track(tracks(1)[0].clone());
        assert!(matches!(
            h.controller.error(),
            Some(SessionError::PlayerInitFailure(_))
        ));
        assert!(!h.controller.state().is_playing);
        assert!(h.controller.state().current_track.is_some());
    }

    #[test]
    fn script_load_failure_is_surfaced() {
        let mut h = Harness::new();
        h.controller.capability_loading();
        h.controller.select_track(tracks(1)[0].clone());
        h.controller
            .capability_loaded(Err("blocked by the browser".to_string()));
        assert_eq!(
            h.controller.capability(),
            &CapabilityStatus::Failed("blocked by the browser".to_string())
        );
        assert!(!h.controller.state().is_playing);
        assert!(h.player.calls().is_empty());
    }

    #[test]
    fn selection_after_the_script_failed_stays_stopped() {
        let mut h = Harness::with_options(ControllerOptions::default());
        h.controller.capability_loading();
        h.controller.capability_loaded(Err("blocked".to_string()));
        h.controller.dismiss_error();

        let ticket = h.controller.search("lofi").unwrap();
        let list = tracks(3);
        h.controller.search_completed(ticket.seq, Ok(list.clone()));

        let state = h.controller.state();
        assert_eq!(state.current_track, Some(list[0].clone()));
        assert!(!state.is_playing);
        assert!(!h.controller.controls_enabled());
        assert_eq!(
            h.controller.error(),
            Some(&SessionError::PlayerInitFailure("blocked".to_string()))
        );
        assert!(h.player.calls().is_empty());

        h.controller.select_track(list[1].clone());
        assert!(!h.controller.state().is_playing);
        assert_eq!(h.timers.scheduled(), 0);
    }

    #[test]
    fn seek_is_dropped_when_the_player_cannot_take_it() {
        let mut h = Harness::ready();
        h.player.set_duration("vid0", 120.0);
        h.controller.select_track(tracks(1)[0].clone());
        assert_eq!(h.controller.seek(30.0), None);
        assert_eq!(h.controller.state().current_time, 0.0);

        h.emit(PlayerEvent::Ready);
        assert_eq!(h.controller.seek(30.0), Some(30.0));
        assert_eq!(h.controller.state().current_time, 30.0);

        h.player.set_position(30.0);
        h.emit(PlayerEvent::Error(PlayerErrorCode::Html5));
        assert_eq!(h.controller.seek(90.0), None);
        assert_eq!(h.controller.state().current_time, 30.0);
        assert!(!h.player.calls().contains(&FakeCall::Seek(90.0)));
    }

    #[test]
    fn superseded_search_results_are_discarded() {
        let mut h = Harness::new();
        let first = h.controller.search("jazz").unwrap();
        let second = h.controller.search("lofi").unwrap();

        assert_eq!(
            h.controller.search_completed(first.seq, Ok(tracks(3))),
            SearchOutcome::Stale
        );
        assert!(h.controller.session().results.is_empty());
        assert!(h.controller.session().searching);
        assert_eq!(h.controller.session().query, "");
        assert_eq!(h.controller.pending_query(), Some("lofi"));

        let outcome = h.controller.search_completed(second.seq, Ok(tracks(10)));
        assert_eq!(
            outcome,
            SearchOutcome::Applied {
                query: "lofi".to_string(),
                autoselected: None
            }
        );
        assert_eq!(h.controller.session().results.len(), 10);
        assert!(!h.controller.session().searching);
    }

    #[test]
    fn failed_search_keeps_previous_results() {
        let mut h = Harness::new();
        let ticket = h.controller.search("lofi").unwrap();
        h.controller.search_completed(ticket.seq, Ok(tracks(4)));

        let ticket = h.controller.search("jazz").unwrap();
        let outcome = h
            .controller
            .search_completed(ticket.seq, Err(SearchError::Request("offline".to_string())));
        assert_eq!(outcome, SearchOutcome::Failed);
        assert_eq!(h.controller.session().results.len(), 4);
        assert_eq!(h.controller.session().query, "lofi");
        assert_eq!(h.controller.pending_query(), None);
        assert!(matches!(
            h.controller.error(),
            Some(SessionError::SearchFailure(_))
        ));

        h.controller.dismiss_error();
        assert!(h.controller.error().is_none());
    }

    #[test]
    fn blank_queries_are_ignored() {
        let mut h = Harness::new();
        assert_eq!(h.controller.search("   "), None);
        assert_eq!(h.controller.search(" lofi ").map(|t| t.query), Some("lofi".to_string()));
    }

    #[test]
    fn first_result_is_autoselected_when_nothing_plays() {
        let mut h = Harness::with_autoselect();
        let ticket = h.controller.search("lofi").unwrap();
        let list = tracks(3);
        let outcome = h.controller.search_completed(ticket.seq, Ok(list.clone()));
        assert_eq!(
            outcome,
            SearchOutcome::Applied {
                query: "lofi".to_string(),
                autoselected: Some(list[0].clone())
            }
        );
        assert_eq!(h.controller.state().current_track, Some(list[0].clone()));

        let ticket = h.controller.search("jazz").unwrap();
        let outcome = h.controller.search_completed(ticket.seq, Ok(tracks(2)));
        assert!(matches!(
            outcome,
            SearchOutcome::Applied {
                autoselected: None,
                ..
            }
        ));
    }

    #[test]
    fn ended_stops_sampling_at_the_end() {
        let mut h = Harness::ready();
        h.player.set_duration("vid0", 90.0);
        h.controller.select_track(tracks(1)[0].clone());
        h.emit(PlayerEvent::Ready);
        h.emit(PlayerEvent::StateChanged(PlayerState::Playing));
        h.emit(PlayerEvent::StateChanged(PlayerState::Ended));
        assert!(!h.controller.state().is_playing);
        assert_eq!(h.controller.state().current_time, 90.0);
        assert_eq!(h.timers.active(), 0);
    }

    #[test]
    fn reset_and_teardown_release_everything() {
        let mut h = Harness::ready();
        h.controller.select_track(tracks(1)[0].clone());
        h.emit(PlayerEvent::Ready);
        h.emit(PlayerEvent::StateChanged(PlayerState::Playing));
        h.controller.set_volume(60.0);

        h.controller.teardown();
        assert_eq!(h.timers.active(), 0);
        assert_eq!(h.player.live_handles(), 0);
        assert_eq!(h.controller.adapter_status(), AdapterStatus::Destroyed);
        assert!(h.controller.state().current_track.is_some());

        h.controller.reset();
        assert_eq!(h.controller.state().current_track, None);
        assert_eq!(h.controller.state().volume, 60);
    }

    #[test]
    fn search_select_play_and_sample_end_to_end() {
        let mut h = Harness::ready();
        let ticket = h.controller.search("lofi").unwrap();
        assert_eq!(ticket.query, "lofi");
        let results = tracks(10);
        h.player.set_duration("vid0", 240.0);
        h.controller.search_completed(ticket.seq, Ok(results.clone()));
        assert_eq!(h.controller.session().results.len(), 10);

        h.controller.select_index(0).unwrap();
        assert_eq!(h.controller.state().current_track, Some(results[0].clone()));
        assert!(h.controller.state().is_playing);

        h.emit(PlayerEvent::Ready);
        assert_eq!(h.controller.state().duration, 240.0);
        assert_eq!(h.player.calls().last(), Some(&FakeCall::Play));
        assert_eq!(h.timers.active(), 0);

        h.emit(PlayerEvent::StateChanged(PlayerState::Playing));
        assert_eq!(h.timers.active(), 1);

        let mut last = h.controller.state().current_time;
        for second in 1..=5 {
            h.player.set_position(f64::from(second));
            assert!(h.tick());
            let now = h.controller.state().current_time;
            assert!(now > last);
            last = now;
        }
        assert_eq!(last, 5.0);

        h.controller.toggle_play();
        h.player.set_position(6.0);
        assert!(!h.tick());
        assert_eq!(h.controller.state().current_time, 5.0);
        assert_eq!(h.timers.active(), 0);
    }
}
