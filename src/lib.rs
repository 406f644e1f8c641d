// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod annotations;
pub mod app;
pub mod config;
pub mod game;
pub mod protocol;
pub mod tui;
pub mod ws_client;
