//! Run configuration
//!
//! Defaults target the "Dulciuri si snacks" category of mega-image.ro and its
//! current markup. Every value can be overridden from the command line.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_URL: &str = "https://www.mega-image.ro/Dulciuri-si-snacks/c/006";
pub const DEFAULT_OUTPUT: &str = "total_products.json";

/// XPath locators for the elements the scraper interacts with.
#[derive(Debug, Clone)]
pub struct Locators {
    pub cookie_accept: String,
    pub product_link: String,
    pub load_more: String,
    pub product_title: String,
}

impl Default for Locators {
    fn default() -> Self {
        Self {
            cookie_accept: r#"//button[@data-testid="cookie-popup-accept"]"#.to_string(),
            product_link: r#"//a[@data-testid="product-block-name-link"]"#.to_string(),
            load_more: r#"//*[@data-testid="vertical-load-more-wrapper"]"#.to_string(),
            product_title: r#"//*[@data-testid="product-common-header-title"]"#.to_string(),
        }
    }
}

/// How long each kind of wait may take before the run fails.
#[derive(Debug, Clone)]
pub struct Waits {
    pub cookie_popup: Duration,
    pub listing: Duration,
    pub load_more_round: Duration,
    pub product_title: Duration,
    pub poll_interval: Duration,
}

impl Default for Waits {
    fn default() -> Self {
        Self {
            cookie_popup: Duration::from_secs(20),
            listing: Duration::from_secs(10),
            load_more_round: Duration::from_secs(10),
            product_title: Duration::from_secs(20),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// Chrome launch settings
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    pub no_sandbox: bool,
    pub window_size: (u32, u32),
    pub page_load_timeout: Duration,
    pub extra_args: Vec<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: false,
            no_sandbox: false,
            window_size: (1920, 1080),
            page_load_timeout: Duration::from_secs(30),
            extra_args: vec!["--disable-gpu".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub main_url: String,
    pub output_path: PathBuf,
    pub locators: Locators,
    pub nutrients: Vec<String>,
    pub other_info: Vec<String>,
    pub waits: Waits,
    /// Upper bound on load-more rounds; `None` keeps waiting until the list
    /// finishes.
    pub max_load_more_rounds: Option<NonZeroUsize>,
    pub browser: BrowserOptions,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            main_url: DEFAULT_URL.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            locators: Locators::default(),
            nutrients: [
                "Grasimi",
                "Valoare energetica",
                "Fibre",
                "Sodiu",
                "Proteine",
                "Grasimi saturate",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            other_info: vec!["Ingrediente".to_string(), "Alergeni".to_string()],
            waits: Waits::default(),
            max_load_more_rounds: None,
            browser: BrowserOptions::default(),
        }
    }
}
