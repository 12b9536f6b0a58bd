use crate::components::{Icon, SessionHandle, SessionSnapshot};
use crate::playback::Intent;
use dioxus::prelude::*;

#[component]
pub fn Sidebar(mut sidebar_open: Signal<bool>) -> Element {
    let snapshot = use_context::<Signal<SessionSnapshot>>();
    let session = use_context::<SessionHandle>();
    let mut search_input = use_signal(String::new);

    let recent = snapshot().search.recent_queries;
    let searching = snapshot().search.searching;
    let open_class = if sidebar_open() { "sidebar open" } else { "sidebar" };

    let on_submit = {
        let session = session.clone();
        move |e: FormEvent| {
            e.prevent_default();
            let query = search_input().trim().to_string();
            if query.is_empty() {
                return;
            }
            session.send(Intent::Search(query));
            search_input.set(String::new());
            sidebar_open.set(false);
        }
    };

    rsx! {
        aside { class: "{open_class}",
            div { class: "sidebar-header",
                div { class: "brand",
                    div { class: "brand-mark", "R" }
                    h1 { class: "brand-title", "RustyTube" }
                }
                button {
                    class: "icon-button sidebar-close",
                    aria_label: "Close menu",
                    onclick: move |_| sidebar_open.set(false),
                    Icon { name: "close".to_string(), class: "icon".to_string() }
                }
            }

            form { class: "search-form", onsubmit: on_submit,
                Icon { name: "search".to_string(), class: "icon search-icon".to_string() }
                input {
                    class: "search-input",
                    r#type: "search",
                    placeholder: "Search for music...",
                    value: search_input,
                    oninput: move |e| search_input.set(e.value()),
                }
                if searching {
                    Icon { name: "loader".to_string(), class: "icon".to_string() }
                }
            }

            if !recent.is_empty() {
                section { class: "recent-searches",
                    p { class: "section-label", "Recent Searches" }
                    for query in recent {
                        RecentSearchItem {
                            key: "{query}",
                            query: query.clone(),
                            onselect: {
                                let session = session.clone();
                                move |query: String| {
                                    session.send(Intent::Search(query));
                                    sidebar_open.set(false);
                                }
                            },
                        }
                    }
                }
            }

            ApiKeyForm {}
        }
    }
}

#[component]
fn RecentSearchItem(query: String, onselect: EventHandler<String>) -> Element {
    rsx! {
        button {
            class: "recent-search",
            onclick: {
                let query = query.clone();
                move |_| onselect.call(query.clone())
            },
            Icon { name: "clock".to_string(), class: "icon".to_string() }
            span { "{query}" }
        }
    }
}

/// Lets the user paste a YouTube Data API key; saving re-runs the current search.
#[component]
fn ApiKeyForm() -> Element {
    let snapshot = use_context::<Signal<SessionSnapshot>>();
    let session = use_context::<SessionHandle>();
    let mut key_input = use_signal(|| snapshot.peek().saved_api_key.clone());
    let mut editing = use_signal(|| false);
    let has_api_key = snapshot().has_api_key;

    let on_save = move |e: FormEvent| {
        e.prevent_default();
        session.send(Intent::SaveApiKey(key_input()));
        editing.set(false);
    };

    rsx! {
        section { class: "api-key",
            if editing() || !has_api_key {
                form { class: "api-key-form", onsubmit: on_save,
                    label { class: "section-label", r#for: "api-key-input", "YouTube API key" }
                    input {
                        id: "api-key-input",
                        class: "api-key-input",
                        r#type: "password",
                        autocomplete: "off",
                        placeholder: "Paste your API key",
                        value: key_input,
                        oninput: move |e| key_input.set(e.value()),
                    }
                    button { class: "primary-button", r#type: "submit", "Save key" }
                }
            } else {
                button {
                    class: "link-button",
                    onclick: move |_| editing.set(true),
                    "Change API key"
                }
            }
        }
    }
}
