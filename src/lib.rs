pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod translate;
pub mod utils;

pub use config::Config;
pub use error::AppError;
pub use state::AppState;
