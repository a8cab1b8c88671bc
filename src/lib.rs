pub mod agents;
pub mod auth;
pub mod cli;
pub mod config;
pub mod infra;
pub mod logging;
pub mod providers;
