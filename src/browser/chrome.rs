// spider_chrome re-exports chromiumoxide API
use crate::config::BrowserOptions;
use crate::error::{Result, ScrapeError};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use chromiumoxide_fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

pub struct ChromeDriver {
    browser: Browser,
    page: Page,
    page_load_timeout: Duration,
    temp_dir: Option<PathBuf>,
}

/// Text of the first node matched by an XPath query
#[derive(Debug, Deserialize)]
struct TextLookup {
    found: bool,
    text: String,
}

/// Anchor text and resolved `href`
#[derive(Debug, Deserialize)]
pub struct Anchor {
    pub text: String,
    pub href: String,
}

/// Wraps a JS snippet so `node` is bound to the first node matching `xpath`.
fn with_first_node(xpath: &str, body: &str) -> String {
    // JSON string syntax is valid JS string syntax
    let quoted = serde_json::Value::String(xpath.to_string()).to_string();
    format!(
        r#"(() => {{
            const node = document.evaluate({quoted}, document, null,
                XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;
            {body}
        }})()"#
    )
}

/// Wraps a JS snippet so `nodes` holds every node matching `xpath`.
fn with_all_nodes(xpath: &str, body: &str) -> String {
    let quoted = serde_json::Value::String(xpath.to_string()).to_string();
    format!(
        r#"(() => {{
            const snapshot = document.evaluate({quoted}, document, null,
                XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
            const nodes = [];
            for (let i = 0; i < snapshot.snapshotLength; i++) {{
                nodes.push(snapshot.snapshotItem(i));
            }}
            {body}
        }})()"#
    )
}

impl ChromeDriver {
    /// Launch Chrome with the given options
    pub async fn launch(options: &BrowserOptions) -> Result<Self> {
        // Unique profile directory so concurrent runs don't share state
        let unique_id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| ScrapeError::LaunchFailed(format!("System clock error: {}", e)))?
            .as_nanos();
        let temp_dir = std::env::temp_dir().join(format!("shelf-scraper-{}", unique_id));
        std::fs::create_dir_all(&temp_dir).map_err(|e| {
            ScrapeError::LaunchFailed(format!("Failed to create temp directory: {}", e))
        })?;

        let mut config = if options.headless {
            BrowserConfig::builder()
        } else {
            BrowserConfig::builder().with_head()
        };

        let (width, height) = options.window_size;
        config = config
            .user_data_dir(&temp_dir)
            .window_size(width, height)
            .request_timeout(options.page_load_timeout);

        for arg in &options.extra_args {
            config = config.arg(arg.as_str());
        }

        // Linux AppArmor workaround
        if options.no_sandbox {
            config = config.arg("--no-sandbox");
        }

        if let Some(path) = &options.chrome_path {
            config = config.chrome_executable(path);
        } else {
            match Self::ensure_chrome_installed().await {
                Ok(path) => {
                    config = config.chrome_executable(path);
                }
                Err(e) => {
                    // Let chromiumoxide look for a system install instead
                    log::warn!("Auto-download failed ({}), trying system Chrome...", e);
                }
            }
        }

        let config = config.build().map_err(|e| {
            ScrapeError::LaunchFailed(format!(
                "{}. \n\n\
                 Chrome not found. You can:\n\
                 - Install Chrome: https://www.google.com/chrome/\n\
                 - Ubuntu/Debian: sudo apt install chromium-browser\n\
                 - Or specify path: --chrome-path /path/to/chrome\n\
                 - Linux sandbox issue? Try: --no-sandbox",
                e
            ))
        })?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::LaunchFailed(e.to_string()))?;

        tokio::spawn(async move {
            while (handler.next().await).is_some() {
                // Handle browser events
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::LaunchFailed(format!("Failed to create page: {}", e)))?;

        log::info!(
            "Chrome launched ({}, {}x{})",
            if options.headless { "headless" } else { "headed" },
            width,
            height
        );

        Ok(Self {
            browser,
            page,
            page_load_timeout: options.page_load_timeout,
            temp_dir: Some(temp_dir),
        })
    }

    /// Navigate to a URL and wait for its load event
    pub async fn navigate(&self, url: &str) -> Result<()> {
        use chromiumoxide::cdp::browser_protocol::page::{EventLoadEventFired, NavigateParams};

        log::info!("Navigating to {}", url);

        // Subscribe before navigating so the load event can't be missed
        let mut load_events = self.page.event_listener::<EventLoadEventFired>().await?;

        let params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| ScrapeError::NavigationFailed(format!("Invalid URL {}: {}", url, e)))?;

        let response = self.page.execute(params).await.map_err(|e| {
            let error_str = e.to_string();

            // "oneshot canceled" means the browser connection is gone
            if error_str.contains("oneshot canceled") {
                ScrapeError::NavigationFailed(
                    "Browser connection lost. The browser may have been closed or crashed."
                        .to_string(),
                )
            } else {
                ScrapeError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e))
            }
        })?;

        if let Some(error_text) = response.result.error_text.clone() {
            return Err(ScrapeError::NavigationFailed(format!(
                "Navigation error for {}: {}",
                url, error_text
            )));
        }

        match tokio::time::timeout(self.page_load_timeout, load_events.next()).await {
            Ok(Some(_)) => {
                log::debug!("Load event fired for {}", url);
            }
            Ok(None) => {
                log::warn!("Load event stream closed before {} finished loading", url);
            }
            Err(_) => {
                return Err(ScrapeError::NavigationFailed(format!(
                    "Timed out after {}s waiting for {} to load",
                    self.page_load_timeout.as_secs(),
                    url
                )));
            }
        }

        Ok(())
    }

    /// Execute arbitrary JavaScript in the page context
    pub async fn execute_script(&self, script: &str) -> Result<serde_json::Value> {
        let result = self.page.evaluate(script).await?;

        Ok(result.into_value().unwrap_or(serde_json::Value::Null))
    }

    /// Execute JavaScript and return a specific type
    pub async fn execute_script_typed<T: serde::de::DeserializeOwned>(
        &self,
        script: &str,
    ) -> Result<T> {
        let result = self.page.evaluate(script).await?;

        result
            .into_value()
            .map_err(|e| ScrapeError::ScriptFailed(format!("Failed to deserialize result: {}", e)))
    }

    /// Number of nodes matching `xpath`
    pub async fn count(&self, xpath: &str) -> Result<usize> {
        self.execute_script_typed(&with_all_nodes(xpath, "return nodes.length;"))
            .await
    }

    /// Poll until at least one node matches `xpath`.
    ///
    /// Script failures while polling (e.g. the page is mid-navigation) count as
    /// "not there yet"; a broken connection ends the wait immediately.
    pub async fn wait_for_element(
        &self,
        xpath: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.count(xpath).await {
                Ok(n) if n > 0 => return Ok(()),
                Ok(_) => {}
                Err(ScrapeError::ScriptFailed(e)) => log::debug!("Polling {} failed: {}", xpath, e),
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Err(ScrapeError::Timeout {
                    locator: xpath.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Poll until no node matches `xpath`
    pub async fn wait_for_absence(
        &self,
        xpath: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.count(xpath).await {
                Ok(0) => return Ok(()),
                Ok(_) => {}
                Err(ScrapeError::ScriptFailed(e)) => log::debug!("Polling {} failed: {}", xpath, e),
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Err(ScrapeError::StillPresent {
                    locator: xpath.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Trimmed `innerText` of the first node matching `xpath`
    pub async fn inner_text(&self, xpath: &str) -> Result<String> {
        let script = with_first_node(
            xpath,
            r#"if (!node) { return { found: false, text: "" }; }
            const text = node.innerText !== undefined ? node.innerText : node.textContent;
            return { found: true, text: (text || "").trim() };"#,
        );

        let lookup: TextLookup = self.execute_script_typed(&script).await?;
        if lookup.found {
            Ok(lookup.text)
        } else {
            Err(ScrapeError::ElementNotFound(xpath.to_string()))
        }
    }

    /// Text and resolved `href` of every anchor matching `xpath`
    pub async fn anchors(&self, xpath: &str) -> Result<Vec<Anchor>> {
        let script = with_all_nodes(
            xpath,
            r#"return nodes.map(n => ({
                text: (n.innerText || n.textContent || "").trim(),
                href: n.href ? String(n.href) : (n.getAttribute("href") || ""),
            }));"#,
        );
        self.execute_script_typed(&script).await
    }

    /// Click the first node matching `xpath`
    pub async fn click(&self, xpath: &str) -> Result<()> {
        let script = with_first_node(
            xpath,
            r#"if (!node) { return false; }
            node.click();
            return true;"#,
        );

        let clicked: bool = self.execute_script_typed(&script).await?;
        if clicked {
            Ok(())
        } else {
            Err(ScrapeError::ElementNotFound(xpath.to_string()))
        }
    }

    /// Scroll so the first node matching `xpath` sits in the middle of the viewport
    pub async fn scroll_into_view_center(&self, xpath: &str) -> Result<()> {
        let script = with_first_node(
            xpath,
            r#"if (!node) { return false; }
            node.scrollIntoView({ behavior: 'auto', block: 'center' });
            return true;"#,
        );

        let scrolled: bool = self.execute_script_typed(&script).await?;
        if scrolled {
            Ok(())
        } else {
            Err(ScrapeError::ElementNotFound(xpath.to_string()))
        }
    }

    pub async fn scroll_to_bottom(&self) -> Result<()> {
        self.execute_script("window.scrollTo(0, document.body.scrollHeight); true")
            .await?;
        Ok(())
    }

    /// Close the browser connection
    pub async fn close(self) -> Result<()> {
        self.browser
            .close()
            .await
            .map_err(|e| ScrapeError::Other(e.to_string()))?;
        log::info!("Chrome closed");
        Ok(())
    }

    /// Ensure Chrome is installed, downloading if necessary
    async fn ensure_chrome_installed() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| ScrapeError::Other("Cannot determine cache directory".to_string()))?
            .join("shelf-scraper")
            .join("chrome");

        tokio::fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| ScrapeError::Other(format!("Failed to create cache dir: {}", e)))?;

        let revision_info_path = cache_dir.join(".downloaded");
        if revision_info_path.exists() {
            if let Some(executable) = Self::find_chrome_in_cache(&cache_dir).await {
                return Ok(executable);
            }
        }

        log::info!("Downloading Chrome for Testing (first time only, ~150MB)...");
        let fetcher = BrowserFetcher::new(
            BrowserFetcherOptions::builder()
                .with_path(&cache_dir)
                .build()
                .map_err(|e| ScrapeError::Other(format!("Fetcher config failed: {}", e)))?,
        );

        let info = fetcher
            .fetch()
            .await
            .map_err(|e| ScrapeError::Other(format!("Chrome download failed: {}", e)))?;

        tokio::fs::write(&revision_info_path, "downloaded")
            .await
            .map_err(|e| ScrapeError::Other(format!("Failed to write marker: {}", e)))?;

        log::info!("Chrome downloaded to {}", info.executable_path.display());

        Ok(info.executable_path)
    }

    /// Find Chrome executable in cache directory
    async fn find_chrome_in_cache(cache_dir: &Path) -> Option<PathBuf> {
        let possible_paths = [
            cache_dir.join("chrome"),
            cache_dir.join("chrome.exe"),
            cache_dir.join("Google Chrome.app/Contents/MacOS/Google Chrome"),
            cache_dir.join("chrome-linux/chrome"),
            cache_dir.join("chrome-mac/Chromium.app/Contents/MacOS/Chromium"),
            cache_dir.join("chrome-win/chrome.exe"),
        ];

        possible_paths.into_iter().find(|path| path.exists())
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        if let Some(temp_dir) = &self.temp_dir {
            if temp_dir.exists() {
                let _ = std::fs::remove_dir_all(temp_dir);
            }
        }
    }
}
