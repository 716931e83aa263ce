pub mod allocation;
pub mod config;
pub mod costs;
pub mod engine;
pub mod error;
pub mod events;
pub mod generator;
pub mod handlers;
pub mod indicators;
pub mod models;
pub mod output;
pub mod state;
pub mod sweep;
