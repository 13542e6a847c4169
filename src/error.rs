use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timed out after {timeout:?} waiting for element: {locator}")]
    Timeout { locator: String, timeout: Duration },

    #[error("Timed out after {timeout:?} waiting for element to disappear: {locator}")]
    StillPresent { locator: String, timeout: Duration },

    #[error("Product name -{name}- is not in the title -{title}-")]
    TitleMismatch { name: String, title: String },

    #[error("Product list still loading after {0} rounds")]
    PaginationExhausted(usize),

    /// The page rejected a script, e.g. its context went away mid-navigation
    #[error("Script execution failed: {0}")]
    ScriptFailed(String),

    #[error("CDP error: {0}")]
    CdpError(chromiumoxide::error::CdpError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl ScrapeError {
    /// True for the one failure that field extraction tolerates.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScrapeError::ElementNotFound(_))
    }
}

impl From<chromiumoxide::error::CdpError> for ScrapeError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        use chromiumoxide::error::CdpError;

        match e {
            // Raised by the page itself; the connection is still usable
            CdpError::JavascriptException(_) | CdpError::Chrome(_) | CdpError::ChromeMessage(_) => {
                ScrapeError::ScriptFailed(e.to_string())
            }
            other => ScrapeError::CdpError(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
