use dioxus::prelude::*;
use tracing::Level;

mod api;
mod components;
mod db;
mod playback;

use components::AppShell;

const APP_CSS: Asset = asset!("/assets/styling/app.css");

fn main() {
    if let Err(err) = dioxus::logger::init(Level::INFO) {
        eprintln!("logger already initialized: {err}");
    }
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Meta { name: "theme-color", content: "#0f0f12" }
        document::Title { "RustyTube" }
        document::Stylesheet { href: APP_CSS }

        AppShell {}
    }
}
