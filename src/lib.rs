//! Movie recommendation demo: an offline factorizer that turns a ratings
//! history into truncated-SVD latent factors plus genre features, and an
//! online web server that loads those artifacts once and serves top-N
//! recommendations with a genre and popularity fallback.

pub mod api;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod recommend;

pub use config::Config;
pub use error::{AppError, AppResult};
