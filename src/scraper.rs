//! Category scrape
//!
//! Drives one browser session through the category page and then through every
//! product page it lists. Field lookups that find nothing store `"N/A"`;
//! everything else that goes wrong ends the run.

use crate::browser::ChromeDriver;
use crate::catalog::{field_or_sentinel, Catalog};
use crate::config::ScraperConfig;
use crate::error::{Result, ScrapeError};
use crate::{locator, store};
use std::collections::BTreeMap;

pub struct Scraper<'a> {
    driver: &'a ChromeDriver,
    config: &'a ScraperConfig,
}

impl<'a> Scraper<'a> {
    pub fn new(driver: &'a ChromeDriver, config: &'a ScraperConfig) -> Self {
        Self { driver, config }
    }

    /// Open the category page, then either load the existing results file or
    /// scrape everything from scratch.
    pub async fn run(&self) -> Result<Catalog> {
        self.driver.navigate(&self.config.main_url).await?;
        self.accept_cookies().await?;

        let output = &self.config.output_path;
        if store::exists(output).await {
            let catalog = store::load(output).await?;
            log::info!(
                "{} already exists with {} products, skipping scrape",
                output.display(),
                catalog.len()
            );
            return Ok(catalog);
        }

        let mut catalog = self.collect_listing().await?;
        self.extract_products(&mut catalog).await?;
        Ok(catalog)
    }

    /// Dismiss the cookie consent popup
    pub async fn accept_cookies(&self) -> Result<()> {
        let waits = &self.config.waits;
        let button = &self.config.locators.cookie_accept;

        self.driver
            .wait_for_element(button, waits.cookie_popup, waits.poll_interval)
            .await?;
        self.driver.click(button).await?;
        log::info!("Accepted cookies");
        Ok(())
    }

    /// Exhaust the load-more pagination and persist every product link.
    pub async fn collect_listing(&self) -> Result<Catalog> {
        let waits = &self.config.waits;
        let locators = &self.config.locators;

        self.driver
            .wait_for_element(&locators.product_link, waits.listing, waits.poll_interval)
            .await?;
        self.driver.scroll_to_bottom().await?;
        self.driver
            .wait_for_element(&locators.load_more, waits.listing, waits.poll_interval)
            .await?;

        let mut rounds = 0;
        loop {
            rounds += 1;

            // The wrapper may vanish between the wait and the scroll
            wrapper_gone_is_fine(
                self.driver
                    .scroll_into_view_center(&locators.load_more)
                    .await,
            )?;

            match self
                .driver
                .wait_for_absence(&locators.load_more, waits.load_more_round, waits.poll_interval)
                .await
            {
                Ok(()) => break,
                Err(ScrapeError::StillPresent { .. }) => {
                    log::warn!("The list has not finished loading (round {})", rounds);
                    if let Some(max) = self.config.max_load_more_rounds {
                        if rounds >= max.get() {
                            return Err(ScrapeError::PaginationExhausted(rounds));
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }

        let anchors = self.driver.anchors(&locators.product_link).await?;
        let catalog = Catalog::from_listing(anchors.into_iter().map(|a| (a.text, a.href)));
        log::info!(
            "Collected {} products after {} load-more round(s)",
            catalog.len(),
            rounds
        );

        store::save(&self.config.output_path, &catalog).await?;
        Ok(catalog)
    }

    /// Visit every product page, filling in its fields and saving after each.
    pub async fn extract_products(&self, catalog: &mut Catalog) -> Result<()> {
        let total = catalog.len();

        for (index, (name, link)) in catalog.links().into_iter().enumerate() {
            log::info!("[{}/{}] {}", index + 1, total, name);
            self.driver.navigate(&link).await?;
            self.check_title(&name).await?;

            let mut nutritional_info = BTreeMap::new();
            for nutrient in &self.config.nutrients {
                let value = self.read_field(&locator::nutrient_value(nutrient)).await?;
                nutritional_info.insert(nutrient.clone(), value);
            }

            let mut details = BTreeMap::new();
            for title in &self.config.other_info {
                let value = self.read_field(&locator::info_block(title)).await?;
                details.insert(title.clone(), value);
            }

            if let Some(record) = catalog.get_mut(&name) {
                record.nutritional_info = Some(nutritional_info);
                record.details.extend(details);
            }

            store::save(&self.config.output_path, catalog).await?;
        }

        Ok(())
    }

    /// The product page title must contain the name shown on the listing.
    async fn check_title(&self, name: &str) -> Result<()> {
        let waits = &self.config.waits;
        let title_xpath = &self.config.locators.product_title;

        self.driver
            .wait_for_element(title_xpath, waits.product_title, waits.poll_interval)
            .await?;
        let title = self.driver.inner_text(title_xpath).await?;

        if !title_matches(name, &title) {
            return Err(ScrapeError::TitleMismatch {
                name: name.to_string(),
                title,
            });
        }
        Ok(())
    }

    async fn read_field(&self, xpath: &str) -> Result<String> {
        let value = field_or_sentinel(self.driver.inner_text(xpath).await)?;
        log::debug!("{} -> {}", xpath, value);
        Ok(value)
    }
}

/// A load-more wrapper that is already gone needs no scrolling; the
/// absence wait that follows sees it as finished.
fn wrapper_gone_is_fine(scrolled: Result<()>) -> Result<()> {
    match scrolled {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

fn title_matches(name: &str, title: &str) -> bool {
    title.contains(name)
}
