//! Runtime bindings: the IFrame player on the web, the dioxus task timer everywhere.

use crate::playback::capability::{EmbeddedPlayer, EventSink, PlayerError, PlayerOptions};
use crate::playback::clock::TickScheduler;
use crate::playback::messages::SessionMessage;
use dioxus::prelude::*;
use dioxus::core::Task;
use futures::channel::mpsc::UnboundedSender;
use std::time::Duration;

#[cfg(not(target_arch = "wasm32"))]
async fn sleep(period: Duration) {
    tokio::time::sleep(period).await;
}

#[cfg(target_arch = "wasm32")]
async fn sleep(period: Duration) {
    gloo_timers::future::TimeoutFuture::new(period.as_millis() as u32).await;
}

/// Periodic ticks as dioxus tasks that post into the session loop.
pub struct TaskScheduler {
    tx: UnboundedSender<SessionMessage>,
}

impl TaskScheduler {
    pub fn new(tx: UnboundedSender<SessionMessage>) -> Self {
        Self { tx }
    }
}

impl TickScheduler for TaskScheduler {
    type Task = Task;

    fn schedule(&mut self, period: Duration, generation: u64) -> Task {
        let tx = self.tx.clone();
        spawn(async move {
            loop {
                sleep(period).await;
                if tx.unbounded_send(SessionMessage::Tick(generation)).is_err() {
                    break;
                }
            }
        })
    }

    fn cancel(&mut self, task: Task) {
        task.cancel();
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::{request_capability, YoutubeIframePlayer as PlatformPlayer};

#[cfg(not(target_arch = "wasm32"))]
pub use UnavailablePlayer as PlatformPlayer;

/// Outside the browser there is no widget to embed.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailablePlayer;

#[cfg(not(target_arch = "wasm32"))]
impl EmbeddedPlayer for UnavailablePlayer {
    type Handle = ();

    fn construct(
        &self,
        _container_id: &str,
        _track_id: &str,
        _options: &PlayerOptions,
        _sink: EventSink,
    ) -> Result<(), PlayerError> {
        Err(PlayerError::Unavailable(
            "the embedded player only runs in a browser".to_string(),
        ))
    }

    fn load_track(&self, _handle: &(), _track_id: &str) {}
    fn play(&self, _handle: &()) {}
    fn pause(&self, _handle: &()) {}
    fn seek(&self, _handle: &(), _seconds: f64) {}
    fn set_volume(&self, _handle: &(), _percent: u8) {}

    fn current_time(&self, _handle: &()) -> f64 {
        0.0
    }

    fn duration(&self, _handle: &()) -> f64 {
        0.0
    }

    fn destroy(&self, _handle: ()) {}
}

#[cfg(not(target_arch = "wasm32"))]
pub fn request_capability(tx: UnboundedSender<SessionMessage>) {
    let _ = tx.unbounded_send(SessionMessage::CapabilityLoaded(Err(
        "the YouTube player is only available in the web build".to_string(),
    )));
}

#[cfg(target_arch = "wasm32")]
mod web {
    use super::*;
    use crate::playback::capability::{PlayerErrorCode, PlayerEvent, PlayerState};
    use crate::playback::readiness::ReadinessGate;
    use js_sys::{Function, Object, Reflect};
    use std::cell::Cell;
    use tracing::{info, warn};
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{window, Element, HtmlScriptElement};

    const IFRAME_API_URL: &str = "https://www.youtube.com/iframe_api";
    const READY_CALLBACK: &str = "onYouTubeIframeAPIReady";

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_namespace = YT, js_name = Player)]
        type YtPlayer;

        #[wasm_bindgen(constructor, js_namespace = YT, js_class = "Player", catch)]
        fn new(element: &Element, options: &JsValue) -> Result<YtPlayer, JsValue>;

        #[wasm_bindgen(method, js_name = loadVideoById, catch)]
        fn load_video_by_id(this: &YtPlayer, video_id: &str) -> Result<(), JsValue>;

        #[wasm_bindgen(method, js_name = playVideo, catch)]
        fn play_video(this: &YtPlayer) -> Result<(), JsValue>;

        #[wasm_bindgen(method, js_name = pauseVideo, catch)]
        fn pause_video(this: &YtPlayer) -> Result<(), JsValue>;

        #[wasm_bindgen(method, js_name = seekTo, catch)]
        fn seek_to(this: &YtPlayer, seconds: f64, allow_seek_ahead: bool) -> Result<(), JsValue>;

        #[wasm_bindgen(method, js_name = setVolume, catch)]
        fn set_volume(this: &YtPlayer, volume: f64) -> Result<(), JsValue>;

        #[wasm_bindgen(method, js_name = getCurrentTime, catch)]
        fn get_current_time(this: &YtPlayer) -> Result<f64, JsValue>;

        #[wasm_bindgen(method, js_name = getDuration, catch)]
        fn get_duration(this: &YtPlayer) -> Result<f64, JsValue>;

        #[wasm_bindgen(method, catch)]
        fn destroy(this: &YtPlayer) -> Result<(), JsValue>;
    }

    thread_local! {
        static IFRAME_API: ReadinessGate = ReadinessGate::new();
        static MOUNT_COUNTER: Cell<u64> = const { Cell::new(0) };
    }

    fn log_js_error(action: &str, result: Result<(), JsValue>) {
        if let Err(err) = result {
            warn!(action, error = ?err, "player command failed");
        }
    }

    /// One constructed `YT.Player` and the listeners it calls into.
    pub struct IframeHandle {
        player: YtPlayer,
        host: Element,
        _listeners: Vec<Closure<dyn FnMut(JsValue)>>,
    }

    #[derive(Debug, Clone, Copy, Default)]
    pub struct YoutubeIframePlayer;

    fn event_data(event: &JsValue) -> Option<i64> {
        Reflect::get(event, &JsValue::from_str("data"))
            .ok()
            .and_then(|value| value.as_f64())
            .map(|value| value as i64)
    }

    fn listener(sink: &EventSink, map: fn(&JsValue) -> Option<PlayerEvent>) -> Closure<dyn FnMut(JsValue)> {
        let sink = sink.clone();
        Closure::wrap(Box::new(move |event: JsValue| {
            if let Some(event) = map(&event) {
                sink.emit(event);
            }
        }) as Box<dyn FnMut(JsValue)>)
    }

    fn set(target: &Object, key: &str, value: &JsValue) -> Result<(), PlayerError> {
        Reflect::set(target, &JsValue::from_str(key), value)
            .map(|_| ())
            .map_err(|err| PlayerError::Construct(format!("{err:?}")))
    }

    fn flag(value: bool) -> JsValue {
        JsValue::from_f64(if value { 1.0 } else { 0.0 })
    }

    impl EmbeddedPlayer for YoutubeIframePlayer {
        type Handle = IframeHandle;

        fn construct(
            &self,
            container_id: &str,
            track_id: &str,
            options: &PlayerOptions,
            sink: EventSink,
        ) -> Result<IframeHandle, PlayerError> {
            let document = window()
                .and_then(|w| w.document())
                .ok_or_else(|| PlayerError::Unavailable("no document".to_string()))?;
            let host = document
                .get_element_by_id(container_id)
                .ok_or_else(|| PlayerError::ContainerMissing(container_id.to_string()))?;

            // The widget replaces the element it is given, so each instance gets its own.
            let mount = document
                .create_element("div")
                .map_err(|err| PlayerError::Construct(format!("{err:?}")))?;
            let index = MOUNT_COUNTER.with(|counter| {
                counter.set(counter.get() + 1);
                counter.get()
            });
            mount.set_id(&format!("{container_id}-{index}"));
            host.append_child(&mount)
                .map_err(|err| PlayerError::Construct(format!("{err:?}")))?;

            let on_ready = listener(&sink, |_| Some(PlayerEvent::Ready));
            let on_state = listener(&sink, |event| {
                event_data(event)
                    .and_then(PlayerState::from_code)
                    .map(PlayerEvent::StateChanged)
            });
            let on_error = listener(&sink, |event| {
                event_data(event).map(|code| PlayerEvent::Error(PlayerErrorCode::from_code(code)))
            });

            let vars = Object::new();
            set(&vars, "autoplay", &flag(options.autoplay))?;
            set(&vars, "controls", &flag(options.controls))?;
            set(&vars, "disablekb", &flag(!options.keyboard))?;
            set(&vars, "playsinline", &flag(true))?;

            let events = Object::new();
            set(&events, "onReady", on_ready.as_ref().unchecked_ref::<Function>())?;
            set(&events, "onStateChange", on_state.as_ref().unchecked_ref::<Function>())?;
            set(&events, "onError", on_error.as_ref().unchecked_ref::<Function>())?;

            let config = Object::new();
            set(&config, "width", &JsValue::from_str(&options.width))?;
            set(&config, "height", &JsValue::from_str(&options.height))?;
            set(&config, "videoId", &JsValue::from_str(track_id))?;
            set(&config, "playerVars", &vars)?;
            set(&config, "events", &events)?;

            let player = YtPlayer::new(&mount, &config).map_err(|err| {
                mount.remove();
                PlayerError::Construct(format!("{err:?}"))
            })?;

            Ok(IframeHandle {
                player,
                host,
                _listeners: vec![on_ready, on_state, on_error],
            })
        }

        fn load_track(&self, handle: &IframeHandle, track_id: &str) {
            log_js_error("load", handle.player.load_video_by_id(track_id));
        }

        fn play(&self, handle: &IframeHandle) {
            log_js_error("play", handle.player.play_video());
        }

        fn pause(&self, handle: &IframeHandle) {
            log_js_error("pause", handle.player.pause_video());
        }

        fn seek(&self, handle: &IframeHandle, seconds: f64) {
            log_js_error("seek", handle.player.seek_to(seconds, true));
        }

        fn set_volume(&self, handle: &IframeHandle, percent: u8) {
            log_js_error("volume", handle.player.set_volume(f64::from(percent)));
        }

        fn current_time(&self, handle: &IframeHandle) -> f64 {
            handle.player.get_current_time().unwrap_or(0.0)
        }

        fn duration(&self, handle: &IframeHandle) -> f64 {
            handle.player.get_duration().unwrap_or(0.0)
        }

        fn destroy(&self, handle: IframeHandle) {
            log_js_error("destroy", handle.player.destroy());
            // Clears the iframe or the unused mount point, whichever is left.
            handle.host.set_inner_html("");
        }
    }

    fn iframe_api_present() -> bool {
        let Some(window) = window() else {
            return false;
        };
        Reflect::get(&window, &JsValue::from_str("YT"))
            .ok()
            .filter(|yt| yt.is_object())
            .and_then(|yt| Reflect::get(&yt, &JsValue::from_str("Player")).ok())
            .map(|player| player.is_function())
            .unwrap_or(false)
    }

    fn resolve_gate(outcome: Result<(), String>) {
        IFRAME_API.with(|gate| {
            if gate.resolve(outcome.clone()) {
                match outcome {
                    Ok(()) => info!("YouTube iframe API loaded"),
                    Err(message) => warn!(%message, "YouTube iframe API failed to load"),
                }
            }
        });
    }

    fn inject_script() -> Result<(), String> {
        let window = window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let on_ready = Closure::wrap(Box::new(move || resolve_gate(Ok(()))) as Box<dyn FnMut()>);
        Reflect::set(&window, &JsValue::from_str(READY_CALLBACK), on_ready.as_ref())
            .map_err(|err| format!("{err:?}"))?;
        on_ready.forget();

        let script: HtmlScriptElement = document
            .create_element("script")
            .map_err(|err| format!("{err:?}"))?
            .dyn_into()
            .map_err(|_| "script element has the wrong type".to_string())?;
        script.set_src(IFRAME_API_URL);
        script.set_async(true);

        let on_error = Closure::wrap(Box::new(move || {
            resolve_gate(Err(format!("could not load {IFRAME_API_URL}")))
        }) as Box<dyn FnMut()>);
        script.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();

        document
            .body()
            .ok_or("no document body")?
            .append_child(&script)
            .map_err(|err| format!("{err:?}"))?;
        Ok(())
    }

    /// Loads the iframe API at most once per page and reports the outcome to `tx`.
    pub fn request_capability(tx: UnboundedSender<SessionMessage>) {
        let waiter = IFRAME_API.with(|gate| {
            gate.request_load(|| {
                if iframe_api_present() {
                    return;
                }
                if let Err(message) = inject_script() {
                    resolve_gate(Err(message));
                }
            });
            gate.wait()
        });
        if iframe_api_present() {
            resolve_gate(Ok(()));
        }
        spawn(async move {
            let outcome = waiter.await;
            let _ = tx.unbounded_send(SessionMessage::CapabilityLoaded(outcome));
        });
    }
}
