//! Scraper implementations.

mod http;
mod mock;

pub use http::HttpScraper;
pub use mock::MockScraper;
