//! Top-level session: owns the playback controller and serializes every input through
//! one message loop.

use crate::api::{ApiConfig, YoutubeClient};
use crate::db::{
    load_recent_searches, load_settings, platform_store, record_recent_search, save_settings,
    AppSettings, KeyValueStore,
};
use crate::playback::capability::{EmbeddedPlayer, EventCallback};
use crate::playback::clock::TickScheduler;
use crate::playback::controller::{
    CapabilityStatus, ControllerOptions, PlaybackController, SearchOutcome, SearchTicket,
    PLAYER_CONTAINER_ID,
};
use crate::playback::platform::{request_capability, PlatformPlayer, TaskScheduler};
use crate::playback::{Intent, PlaybackState, SearchSession, SessionError, SessionMessage};
use dioxus::prelude::*;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// What the view layer renders. Republished after every message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    pub playback: PlaybackState,
    pub search: SearchSession,
    pub error: Option<SessionError>,
    pub controls_enabled: bool,
    pub player_loading: bool,
    pub has_api_key: bool,
    pub saved_api_key: String,
}

pub struct SessionRuntime<P: EmbeddedPlayer, S: TickScheduler> {
    controller: PlaybackController<P, S>,
    store: Box<dyn KeyValueStore>,
    settings: AppSettings,
    /// Sequence of the user search to record once it succeeds.
    record_seq: Option<u64>,
}

impl<P: EmbeddedPlayer, S: TickScheduler> SessionRuntime<P, S> {
    pub fn new(player: P, scheduler: S, deliver: EventCallback, store: Box<dyn KeyValueStore>) -> Self {
        let settings = load_settings(store.as_ref());
        let recent = load_recent_searches(store.as_ref());
        let options = ControllerOptions {
            autoselect_first_result: settings.autoselect_first_result,
            ..ControllerOptions::default()
        };
        let mut controller = PlaybackController::new(player, scheduler, deliver, options);
        controller.set_recent_queries(recent);
        controller.set_volume(f64::from(settings.volume));
        Self {
            controller,
            store,
            settings,
            record_seq: None,
        }
    }

    /// Marks the player script as loading and issues the first search.
    pub fn start(&mut self) -> Option<SearchTicket> {
        self.controller.capability_loading();
        let query = self
            .settings
            .initial_query(&self.controller.session().recent_queries);
        info!(%query, "starting session");
        self.search(&query, false)
    }

    pub fn client(&self) -> YoutubeClient {
        YoutubeClient::new(ApiConfig::from_settings(&self.settings))
    }

    /// Applies one message. Returns a search the caller must run.
    pub fn handle(&mut self, message: SessionMessage) -> Option<SearchTicket> {
        match message {
            SessionMessage::Intent(intent) => return self.handle_intent(intent),
            SessionMessage::CapabilityLoaded(outcome) => self.controller.capability_loaded(outcome),
            SessionMessage::Adapter(event) => self.controller.handle_event(event),
            SessionMessage::Tick(generation) => {
                self.controller.tick(generation);
            }
            SessionMessage::SearchCompleted { seq, result } => {
                let record = self.record_seq.take_if(|pending| *pending == seq).is_some();
                if let SearchOutcome::Applied {
                    query,
                    autoselected,
                } = self.controller.search_completed(seq, result)
                {
                    if record {
                        self.record(&query);
                    }
                    if let Some(track) = autoselected {
                        debug!(track_id = %track.external_id, "autoselected first result");
                    }
                }
            }
        }
        None
    }

    fn handle_intent(&mut self, intent: Intent) -> Option<SearchTicket> {
        match intent {
            Intent::Search(query) => return self.search(&query, true),
            Intent::SelectTrack(track) => {
                self.controller.select_track(track);
            }
            Intent::TogglePlay => {
                self.controller.toggle_play();
            }
            Intent::Seek(seconds) => {
                self.controller.seek(seconds);
            }
            Intent::SetVolume(percent) => {
                let volume = self.controller.set_volume(percent);
                if volume != self.settings.volume {
                    self.settings.volume = volume;
                    self.persist_settings();
                }
            }
            Intent::DismissError => self.controller.dismiss_error(),
            Intent::SaveApiKey(key) => {
                let key = key.trim();
                self.settings.api_key = (!key.is_empty()).then(|| key.to_string());
                self.persist_settings();
                let session = self.controller.session();
                let query = match self.controller.pending_query() {
                    Some(pending) => pending.to_string(),
                    None if !session.query.is_empty() => session.query.clone(),
                    None => self.settings.initial_query(&session.recent_queries),
                };
                return self.search(&query, false);
            }
            Intent::Reset => self.controller.reset(),
        }
        None
    }

    /// Issues a search. When `record` is set the query joins the recent list once
    /// results arrive.
    fn search(&mut self, query: &str, record: bool) -> Option<SearchTicket> {
        let ticket = self.controller.search(query)?;
        self.record_seq = record.then_some(ticket.seq);
        Some(ticket)
    }

    fn record(&mut self, query: &str) {
        match record_recent_search(self.store.as_ref(), query) {
            Ok(recent) => self.controller.set_recent_queries(recent),
            Err(err) => warn!(error = %err, "could not save recent search"),
        }
    }

    fn persist_settings(&self) {
        if let Err(err) = save_settings(self.store.as_ref(), &self.settings) {
            warn!(error = %err, "could not save settings");
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            playback: self.controller.state().clone(),
            search: self.controller.session().clone(),
            error: self.controller.error().cloned(),
            controls_enabled: self.controller.controls_enabled(),
            player_loading: matches!(
                self.controller.capability(),
                CapabilityStatus::Unloaded | CapabilityStatus::Loading
            ),
            has_api_key: self.settings.resolved_api_key().is_some(),
            saved_api_key: self.settings.api_key.clone().unwrap_or_default(),
        }
    }

    pub fn teardown(&mut self) {
        self.controller.teardown();
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn controller(&self) -> &PlaybackController<P, S> {
        &self.controller
    }
}

type LiveSession = SessionRuntime<PlatformPlayer, TaskScheduler>;

/// Sends user intents into the session loop.
#[derive(Clone)]
pub struct SessionHandle {
    tx: UnboundedSender<SessionMessage>,
}

impl SessionHandle {
    pub fn send(&self, intent: Intent) {
        if self.tx.unbounded_send(intent.into()).is_err() {
            warn!("session loop has stopped");
        }
    }
}

fn spawn_search(tx: UnboundedSender<SessionMessage>, client: YoutubeClient, ticket: SearchTicket) {
    spawn(async move {
        let result = client.search(&ticket.query).await;
        let _ = tx.unbounded_send(SessionMessage::SearchCompleted {
            seq: ticket.seq,
            result,
        });
    });
}

/// Creates the session loop once per mount and exposes its handle and latest snapshot.
pub fn use_session_controller() -> (SessionHandle, Signal<SessionSnapshot>) {
    let mut snapshot = use_signal(SessionSnapshot::default);
    let (tx, receiver) = use_hook(|| {
        let (tx, rx) = mpsc::unbounded::<SessionMessage>();
        (tx, Rc::new(RefCell::new(Some(rx))))
    });
    let session: Rc<RefCell<Option<LiveSession>>> = use_hook(|| Rc::new(RefCell::new(None)));

    // Runs after the first render so the player container is mounted.
    {
        let tx = tx.clone();
        let session = session.clone();
        use_effect(move || {
            let Some(rx) = receiver.borrow_mut().take() else {
                return;
            };
            let deliver: EventCallback = {
                let tx = tx.clone();
                Rc::new(move |event| {
                    let _ = tx.unbounded_send(SessionMessage::Adapter(event));
                })
            };
            let mut runtime = SessionRuntime::new(
                PlatformPlayer::default(),
                TaskScheduler::new(tx.clone()),
                deliver,
                platform_store(),
            );
            if let Some(ticket) = runtime.start() {
                spawn_search(tx.clone(), runtime.client(), ticket);
            }
            snapshot.set(runtime.snapshot());
            *session.borrow_mut() = Some(runtime);
            request_capability(tx.clone());

            spawn(run_loop(rx, tx.clone(), session.clone(), snapshot));
        });
    }

    {
        let session = session.clone();
        use_drop(move || {
            if let Some(mut runtime) = session.borrow_mut().take() {
                debug!("tearing down session");
                runtime.teardown();
            }
        });
    }

    (SessionHandle { tx }, snapshot)
}

async fn run_loop(
    mut rx: UnboundedReceiver<SessionMessage>,
    tx: UnboundedSender<SessionMessage>,
    session: Rc<RefCell<Option<LiveSession>>>,
    mut snapshot: Signal<SessionSnapshot>,
) {
    while let Some(message) = rx.next().await {
        let pending = {
            let mut guard = session.borrow_mut();
            let Some(runtime) = guard.as_mut() else {
                break;
            };
            let ticket = runtime.handle(message);
            let next = runtime.snapshot();
            if *snapshot.peek() != next {
                snapshot.set(next);
            }
            ticket.map(|ticket| (ticket, runtime.client()))
        };
        if let Some((ticket, client)) = pending {
            spawn_search(tx.clone(), client, ticket);
        }
    }
}

/// Host element the embedded player mounts into. Kept out of sight; only audio matters.
#[component]
pub fn PlayerHost() -> Element {
    rsx! {
        div { id: PLAYER_CONTAINER_ID, class: "player-host", aria_hidden: "true" }
    }
}
