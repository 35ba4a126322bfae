pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod health;
pub mod reference;
pub mod repository;
pub mod state;
pub mod users;
pub mod validation;

pub use error::{AppError, AppResult};
pub use state::AppState;
