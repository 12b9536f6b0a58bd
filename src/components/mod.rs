//! The components module contains all shared components for our app.

mod app;
mod icons;
mod now_playing;
mod player_controls;
mod session_controller;
mod sidebar;
mod track_list;

pub use app::*;
pub use icons::*;
pub use now_playing::*;
pub use player_controls::*;
pub use session_controller::*;
pub use sidebar::*;
pub use track_list::*;
