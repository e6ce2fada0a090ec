pub mod app;
pub mod error;
pub mod routes;

pub use app::{build_app, build_app_with_scraper, AppState};
