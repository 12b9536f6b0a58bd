use crate::components::{
    use_session_controller, Icon, NowPlaying, PlayerControls, PlayerHost, SessionHandle,
    SessionSnapshot, Sidebar, TrackList,
};
use crate::playback::Intent;
use dioxus::prelude::*;

#[component]
pub fn AppShell() -> Element {
    let (session, snapshot) = use_session_controller();
    let mut sidebar_open = use_signal(|| false);

    // Provide state via context
    use_context_provider(|| snapshot);
    use_context_provider(|| session.clone());

    rsx! {
        div { class: "app-shell",
            if sidebar_open() {
                div {
                    class: "sidebar-backdrop",
                    onclick: move |_| sidebar_open.set(false),
                }
            }
            Sidebar { sidebar_open }

            main { class: "main-panel",
                header { class: "mobile-header",
                    button {
                        class: "icon-button",
                        aria_label: "Open menu",
                        onclick: move |_| sidebar_open.set(true),
                        Icon { name: "menu".to_string(), class: "icon".to_string() }
                    }
                    span { class: "brand-title", "RustyTube" }
                }
                ErrorBanner {}
                div { class: "content",
                    NowPlaying {}
                    TrackList {}
                }
            }

            PlayerControls {}
            PlayerHost {}
        }
    }
}

/// Dismissible banner for search, player start-up and playback failures.
#[component]
fn ErrorBanner() -> Element {
    let snapshot = use_context::<Signal<SessionSnapshot>>();
    let session = use_context::<SessionHandle>();

    let Some(error) = snapshot().error else {
        return rsx! {};
    };

    rsx! {
        div { class: "error-banner", role: "alert",
            Icon { name: "alert".to_string(), class: "icon".to_string() }
            p { class: "error-message", "{error}" }
            button {
                class: "icon-button",
                aria_label: "Dismiss",
                onclick: move |_| session.send(Intent::DismissError),
                Icon { name: "close".to_string(), class: "icon".to_string() }
            }
        }
    }
}
