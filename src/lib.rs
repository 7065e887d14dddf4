pub mod api;
pub mod batch;
pub mod config;
pub mod db;
pub mod error;
pub mod normalizer;
pub mod providers;
pub mod registry;
pub mod scheduler;
pub mod services;
pub mod sync;

pub use config::Config;
pub use error::{AppError, Result};
