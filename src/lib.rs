pub mod config;
pub mod error;
pub mod fake_provider;
pub mod fielding;
pub mod http_client;
pub mod jobs;
pub mod leaderboard;
pub mod lifecycle;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod scoring;
pub mod store;
