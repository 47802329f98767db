pub mod config;
pub mod data;
pub mod format;
pub mod html;
pub mod logging;
pub mod server;
pub mod view;
