#![allow(clippy::uninlined_format_args)]

pub mod app;
pub mod config;
pub mod list;
pub mod logging;
pub mod measure;
pub mod panel;
pub mod service;
pub mod theme;
pub mod thread;
pub mod viewport;
pub mod votes;
pub mod wrap;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::run;
