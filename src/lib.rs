pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod validation;

pub use app::router;
pub use error::AppError;
pub use state::AppState;
