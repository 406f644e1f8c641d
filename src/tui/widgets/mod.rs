// TUI widget modules for each dashboard panel.

pub mod banner;
pub mod grid;
pub mod status_bar;
pub mod streaks;
pub mod summary;
