pub mod analytics;
pub mod config;
pub mod episode;
pub mod logging;
