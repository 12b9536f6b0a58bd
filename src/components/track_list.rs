use crate::api::Track;
use crate::components::{Icon, SessionHandle, SessionSnapshot};
use crate::playback::Intent;
use dioxus::prelude::*;

#[component]
pub fn TrackList() -> Element {
    let snapshot = use_context::<Signal<SessionSnapshot>>();
    let session = use_context::<SessionHandle>();
    let SessionSnapshot {
        playback, search, ..
    } = snapshot();

    rsx! {
        section { class: "track-list",
            div { class: "track-list-header",
                h2 { class: "track-list-title",
                    if search.query.is_empty() {
                        "Results"
                    } else {
                        "Results for \"{search.query}\""
                    }
                }
                if search.searching {
                    Icon { name: "loader".to_string(), class: "icon".to_string() }
                }
            }

            if search.results.is_empty() && !search.searching {
                div { class: "empty-state",
                    Icon { name: "music".to_string(), class: "icon-large".to_string() }
                    p { "No tracks yet. Try a search." }
                }
            }

            ol { class: "track-rows",
                for (index, track) in search.results.into_iter().enumerate() {
                    TrackRow {
                        key: "{track.external_id}",
                        index,
                        is_current: playback.is_current(&track),
                        is_playing: playback.is_current(&track) && playback.is_playing,
                        track: track.clone(),
                        onselect: {
                            let session = session.clone();
                            move |track: Track| session.send(Intent::SelectTrack(track))
                        },
                    }
                }
            }
        }
    }
}

#[component]
fn TrackRow(
    track: Track,
    index: usize,
    is_current: bool,
    is_playing: bool,
    onselect: EventHandler<Track>,
) -> Element {
    let row_class = if is_current { "track-row current" } else { "track-row" };
    let position = index + 1;

    rsx! {
        li {
            class: "{row_class}",
            onclick: {
                let track = track.clone();
                move |_| onselect.call(track.clone())
            },
            span { class: "track-index",
                if is_playing {
                    PlayingAnimation {}
                } else {
                    "{position}"
                }
            }
            if !track.thumbnail_url.is_empty() {
                img {
                    class: "track-thumb",
                    src: "{track.thumbnail_url}",
                    alt: "{track.title}",
                    loading: "lazy",
                }
            }
            div { class: "track-meta",
                p { class: "track-title", "{track.title}" }
                p { class: "track-channel", "{track.channel}" }
            }
        }
    }
}

/// Three bouncing bars shown next to the track that is playing.
#[component]
pub fn PlayingAnimation() -> Element {
    rsx! {
        span { class: "playing-bars", aria_label: "Playing",
            span { class: "bar" }
            span { class: "bar" }
            span { class: "bar" }
        }
    }
}
