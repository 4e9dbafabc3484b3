//! # Lunch Vote API Library
//!
//! This library provides the core functionality for the Lunch Vote service:
//! employee and restaurant accounts, daily menus, voting and the daily winner.

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub mod voting;
pub use migration;
