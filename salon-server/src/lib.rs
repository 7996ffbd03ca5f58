//! Hair salon backend server
//!
//! Every logged-in user works through a dedicated database session opened
//! with their own credentials and scoped to their database role:
//! - [`connections`] - the per-user session registry
//! - [`auth`] - JWT issue/validation and route guards
//! - [`api`] - HTTP routes
//! - [`db`] - account lookup through the service pool

pub mod api;
pub mod auth;
pub mod config;
pub mod connections;
pub mod db;
pub mod error;
pub mod logger;
pub mod state;
pub mod utils;

pub use config::Config;
pub use state::AppState;
