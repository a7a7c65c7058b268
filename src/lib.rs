pub mod api;
pub mod batch;
pub mod config;
pub mod drive;
pub mod engagement;
pub mod error;
pub mod fetch;
pub mod init;
pub mod log;
pub mod media;
pub mod pacing;
pub mod prompts;

pub use config::Config;
pub use log::Log;
