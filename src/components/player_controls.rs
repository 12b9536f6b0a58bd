use crate::api::format_duration;
use crate::components::{Icon, SessionHandle, SessionSnapshot};
use crate::playback::Intent;
use dioxus::prelude::*;

/// Transport bar: current track, play/pause, stop, seek and volume.
#[component]
pub fn PlayerControls() -> Element {
    let snapshot = use_context::<Signal<SessionSnapshot>>();
    let session = use_context::<SessionHandle>();
    let SessionSnapshot {
        playback,
        controls_enabled,
        player_loading,
        ..
    } = snapshot();

    let Some(track) = playback.current_track.clone() else {
        return rsx! {};
    };

    let duration = playback.duration;
    let current_time = playback.current_time.min(duration.max(0.0));
    let seek_max = duration.max(0.0).floor() as i64;
    let volume = i32::from(playback.volume);
    let toggle_label = if playback.is_playing { "Pause" } else { "Play" };

    let on_toggle = {
        let session = session.clone();
        move |_| session.send(Intent::TogglePlay)
    };

    let on_stop = {
        let session = session.clone();
        move |_| session.send(Intent::Reset)
    };

    let on_seek = {
        let session = session.clone();
        move |e: Event<FormData>| {
            if let Ok(seconds) = e.value().parse::<f64>() {
                session.send(Intent::Seek(seconds));
            }
        }
    };

    let on_volume_change = move |e: Event<FormData>| {
        if let Ok(val) = e.value().parse::<f64>() {
            session.send(Intent::SetVolume(val));
        }
    };

    rsx! {
        footer { class: "player-controls",
            div { class: "player-track",
                if !track.thumbnail_url.is_empty() {
                    img {
                        class: "player-thumb",
                        src: "{track.thumbnail_url}",
                        alt: "{track.title}",
                    }
                }
                div { class: "player-track-meta",
                    p { class: "player-track-title", "{track.title}" }
                    p { class: "player-track-channel", "{track.channel}" }
                }
            }

            div { class: "player-transport",
                div { class: "transport-buttons",
                    button {
                        class: "play-button",
                        disabled: !controls_enabled,
                        aria_label: toggle_label,
                        onclick: on_toggle,
                        if player_loading {
                            Icon { name: "loader".to_string(), class: "icon".to_string() }
                        } else if playback.is_playing {
                            Icon { name: "pause".to_string(), class: "icon".to_string() }
                        } else {
                            Icon { name: "play".to_string(), class: "icon".to_string() }
                        }
                    }
                    button {
                        class: "icon-button stop-button",
                        aria_label: "Stop",
                        title: "Stop",
                        onclick: on_stop,
                        Icon { name: "close".to_string(), class: "icon".to_string() }
                    }
                }
                div { class: "seek-row",
                    span { class: "time-label", "{format_duration(current_time)}" }
                    input {
                        r#type: "range",
                        class: "seek-range",
                        min: "0",
                        max: seek_max,
                        step: "1",
                        disabled: !controls_enabled || duration <= 0.0,
                        value: current_time.floor() as i64,
                        onchange: on_seek,
                    }
                    span { class: "time-label", "{format_duration(duration)}" }
                }
            }

            div { class: "player-volume",
                Icon { name: "volume".to_string(), class: "icon".to_string() }
                input {
                    r#type: "range",
                    class: "volume-range",
                    min: "0",
                    max: "100",
                    value: volume,
                    oninput: on_volume_change,
                }
            }
        }
    }
}
