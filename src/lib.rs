pub mod browser;
pub mod catalog;
pub mod config;
pub mod error;
pub mod locator;
pub mod scraper;
pub mod store;

//  Re-export commonly used items
pub use browser::{Anchor, ChromeDriver};
pub use catalog::{field_or_sentinel, Catalog, ProductRecord, NOT_AVAILABLE};
pub use config::{BrowserOptions, Locators, ScraperConfig, Waits};
pub use error::{Result, ScrapeError};
pub use scraper::Scraper;
