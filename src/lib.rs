pub mod config;
pub mod dashboard;
pub mod market_data;
pub mod news;
pub mod persist;
pub mod quote;
pub mod refresher;
pub mod telemetry;

pub mod app;
