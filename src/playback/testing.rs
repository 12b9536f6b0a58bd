//! In-process stand-ins for the embedded widget and the timer primitive.

use crate::api::models::Track;
use crate::playback::capability::{
    AdapterEvent, EmbeddedPlayer, EventCallback, EventSink, PlayerError, PlayerEvent,
    PlayerOptions,
};
use crate::playback::clock::TickScheduler;
use crate::playback::controller::{ControllerOptions, PlaybackController};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum FakeCall {
    Construct(String),
    Load(String),
    Play,
    Pause,
    Seek(f64),
    Volume(u8),
    Destroy,
}

#[derive(Default)]
struct FakePlayerState {
    calls: Vec<FakeCall>,
    sinks: Vec<EventSink>,
    live: HashSet<u64>,
    next_handle: u64,
    loaded: HashMap<u64, String>,
    durations: HashMap<String, f64>,
    position: f64,
    fail_next: bool,
}

/// Records every command and lets tests emit widget events through the last sink.
#[derive(Clone, Default)]
pub struct FakePlayer {
    inner: Rc<RefCell<FakePlayerState>>,
}

impl FakePlayer {
    pub fn calls(&self) -> Vec<FakeCall> {
        self.inner.borrow().calls.clone()
    }

    pub fn live_handles(&self) -> usize {
        self.inner.borrow().live.len()
    }

    /// Sink handed to the `index`-th construction.
    pub fn sink(&self, index: usize) -> EventSink {
        self.inner.borrow().sinks[index].clone()
    }

    pub fn emit_last(&self, event: PlayerEvent) {
        let sink = self.inner.borrow().sinks.last().cloned();
        if let Some(sink) = sink {
            sink.emit(event);
        }
    }

    pub fn fail_next_construct(&self) {
        self.inner.borrow_mut().fail_next = true;
    }

    pub fn set_duration(&self, track_id: &str, seconds: f64) {
        self.inner
            .borrow_mut()
            .durations
            .insert(track_id.to_string(), seconds);
    }

    pub fn set_position(&self, seconds: f64) {
        self.inner.borrow_mut().position = seconds;
    }
}

impl EmbeddedPlayer for FakePlayer {
    type Handle = u64;

    fn construct(
        &self,
        _container_id: &str,
        track_id: &str,
        _options: &PlayerOptions,
        sink: EventSink,
    ) -> Result<u64, PlayerError> {
        let mut inner = self.inner.borrow_mut();
        if std::mem::take(&mut inner.fail_next) {
            return Err(PlayerError::Construct("fake refused".to_string()));
        }
        inner.calls.push(FakeCall::Construct(track_id.to_string()));
        inner.next_handle += 1;
        let handle = inner.next_handle;
        inner.live.insert(handle);
        inner.loaded.insert(handle, track_id.to_string());
        inner.sinks.push(sink);
        inner.position = 0.0;
        Ok(handle)
    }

    fn load_track(&self, handle: &u64, track_id: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(FakeCall::Load(track_id.to_string()));
        inner.loaded.insert(*handle, track_id.to_string());
        inner.position = 0.0;
    }

    fn play(&self, _handle: &u64) {
        self.inner.borrow_mut().calls.push(FakeCall::Play);
    }

    fn pause(&self, _handle: &u64) {
        self.inner.borrow_mut().calls.push(FakeCall::Pause);
    }

    fn seek(&self, _handle: &u64, seconds: f64) {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(FakeCall::Seek(seconds));
        inner.position = seconds;
    }

    fn set_volume(&self, _handle: &u64, percent: u8) {
        self.inner.borrow_mut().calls.push(FakeCall::Volume(percent));
    }

    fn current_time(&self, _handle: &u64) -> f64 {
        self.inner.borrow().position
    }

    fn duration(&self, handle: &u64) -> f64 {
        let inner = self.inner.borrow();
        inner
            .loaded
            .get(handle)
            .and_then(|track| inner.durations.get(track))
            .copied()
            .unwrap_or(0.0)
    }

    fn destroy(&self, handle: u64) {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(FakeCall::Destroy);
        inner.live.remove(&handle);
        inner.loaded.remove(&handle);
    }
}

/// Collects delivered adapter events until the test pumps them.
#[derive(Clone, Default)]
pub struct EventQueue {
    events: Rc<RefCell<VecDeque<AdapterEvent>>>,
}

impl EventQueue {
    pub fn callback(&self) -> EventCallback {
        let events = self.events.clone();
        Rc::new(move |event| events.borrow_mut().push_back(event))
    }

    pub fn pop(&self) -> Option<AdapterEvent> {
        self.events.borrow_mut().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

#[derive(Default)]
struct FakeSchedulerState {
    next_task: u64,
    scheduled: usize,
    active: HashSet<u64>,
    last_generation: u64,
}

/// Counts scheduled and live tasks; ticks are driven by the test.
#[derive(Clone, Default)]
pub struct FakeScheduler {
    inner: Rc<RefCell<FakeSchedulerState>>,
}

impl FakeScheduler {
    pub fn scheduled(&self) -> usize {
        self.inner.borrow().scheduled
    }

    pub fn active(&self) -> usize {
        self.inner.borrow().active.len()
    }

    pub fn last_generation(&self) -> u64 {
        self.inner.borrow().last_generation
    }
}

impl TickScheduler for FakeScheduler {
    type Task = u64;

    fn schedule(&mut self, _period: Duration, generation: u64) -> u64 {
        let mut inner = self.inner.borrow_mut();
        inner.next_task += 1;
        inner.scheduled += 1;
        inner.last_generation = generation;
        let task = inner.next_task;
        inner.active.insert(task);
        task
    }

    fn cancel(&mut self, task: u64) {
        self.inner.borrow_mut().active.remove(&task);
    }
}

pub fn tracks(count: usize) -> Vec<Track> {
    (0..count)
        .map(|i| {
            Track::new(
                format!("vid{i}"),
                format!("Track {i}"),
                format!("Channel {i}"),
                format!("https://i.ytimg.com/vi/vid{i}/default.jpg"),
            )
        })
        .collect()
}

/// A controller wired to fakes, with helpers that replay the message loop by hand.
pub struct Harness {
    pub controller: PlaybackController<FakePlayer, FakeScheduler>,
    pub player: FakePlayer,
    pub timers: FakeScheduler,
    pub events: EventQueue,
}

impl Harness {
    /// Script not loaded yet, no autoselect.
    pub fn new() -> Self {
        Self::with_options(ControllerOptions {
            autoselect_first_result: false,
            ..ControllerOptions::default()
        })
    }

    /// Script already loaded.
    pub fn ready() -> Self {
        let mut harness = Self::new();
        harness.controller.capability_loaded(Ok(()));
        harness
    }

    pub fn with_autoselect() -> Self {
        let mut harness = Self::with_options(ControllerOptions::default());
        harness.controller.capability_loaded(Ok(()));
        harness
    }

    pub fn with_options(options: ControllerOptions) -> Self {
        let player = FakePlayer::default();
        let timers = FakeScheduler::default();
        let events = EventQueue::default();
        let controller =
            PlaybackController::new(player.clone(), timers.clone(), events.callback(), options);
        Self {
            controller,
            player,
            timers,
            events,
        }
    }

    /// Feeds queued adapter events to the controller in arrival order.
    pub fn pump(&mut self) {
        while let Some(event) = self.events.pop() {
            self.controller.handle_event(event);
        }
    }

    pub fn emit(&mut self, event: PlayerEvent) {
        self.player.emit_last(event);
        self.pump();
    }

    /// Fires one tick from the most recently scheduled timer.
    pub fn tick(&mut self) -> bool {
        let generation = self.timers.last_generation();
        self.controller.tick(generation)
    }
}
