pub mod analysis;
pub mod anomaly;
pub mod api;
pub mod compare;
pub mod config;
pub mod graph;
pub mod types;
pub mod wallet;
