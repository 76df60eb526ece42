//! Election result tabulation, report export and voter credential dispatch.

pub mod admin;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod identity;
pub mod repository;
pub mod results;
pub mod telemetry;
pub mod timefmt;

pub use error::{ApiError, AppError};
