//! Workout tracking with a timed session cycle and progressive-overload
//! suggestions for the next session.

pub mod advisor;
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod gemini;
pub mod import;
pub mod logging;
pub mod models;
pub mod nutrition;
pub mod persist;
pub mod policy;
pub mod prompt;
pub mod review;
pub mod session;
pub mod store;
pub mod timer;
pub mod types;
pub mod utils;
