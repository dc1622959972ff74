pub mod alerts;
pub mod config;
pub mod db;
pub mod evaluator;
pub mod market;
pub mod metrics;
pub mod notify;
pub mod prices;
pub mod scheduler;
pub mod series;

pub mod error;
pub mod time;
