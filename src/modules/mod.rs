pub mod api;
pub mod config;
pub mod formatter;
pub mod logger;
pub mod prompt;
pub mod refresh;
pub mod system;
pub mod tray;
