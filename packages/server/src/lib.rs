pub mod cache;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod judge;
pub mod models;
pub mod pipeline;
pub mod rate_limit;
pub mod state;
pub mod store;
pub mod views;
