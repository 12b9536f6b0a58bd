use crate::components::{Icon, SessionSnapshot};
use dioxus::prelude::*;

#[component]
pub fn NowPlaying() -> Element {
    let snapshot = use_context::<Signal<SessionSnapshot>>();
    let playback = snapshot().playback;
    let progress = playback.progress() * 100.0;

    let Some(track) = playback.current_track else {
        return rsx! {
            section { class: "now-playing empty",
                Icon { name: "music".to_string(), class: "icon-large".to_string() }
                p { "Pick a track to start listening" }
            }
        };
    };

    rsx! {
        section { class: "now-playing",
            if track.thumbnail_url.is_empty() {
                div { class: "now-playing-art placeholder",
                    Icon { name: "music".to_string(), class: "icon-large".to_string() }
                }
            } else {
                img {
                    class: "now-playing-art",
                    src: "{track.thumbnail_url}",
                    alt: "{track.title}",
                }
            }
            h2 { class: "now-playing-title", "{track.title}" }
            p { class: "now-playing-channel", "{track.channel}" }
            div { class: "progress-track",
                div { class: "progress-fill", style: "width: {progress:.1}%" }
            }
        }
    }
}
