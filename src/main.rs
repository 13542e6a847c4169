use clap::Parser;
use shelf_scraper::config::{ScraperConfig, DEFAULT_OUTPUT, DEFAULT_URL};
use shelf_scraper::{ChromeDriver, Scraper};
use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scrape a grocery category page into JSON", long_about = None)]
struct Args {
    /// Category page to scrape
    #[arg(long, default_value = DEFAULT_URL)]
    url: String,

    /// Results file; if it already exists the scrape is skipped
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Run Chrome without a window
    #[arg(long)]
    headless: bool,

    /// Pass --no-sandbox to Chrome (Linux AppArmor workaround)
    #[arg(long)]
    no_sandbox: bool,

    /// Chrome executable to use instead of the downloaded one
    #[arg(long)]
    chrome_path: Option<PathBuf>,

    /// Give up if the product list is still loading after this many rounds
    #[arg(long)]
    max_load_more_rounds: Option<NonZeroUsize>,
}

impl Args {
    fn into_config(self) -> ScraperConfig {
        let mut config = ScraperConfig {
            main_url: self.url,
            output_path: self.output,
            max_load_more_rounds: self.max_load_more_rounds,
            ..Default::default()
        };
        config.browser.headless = self.headless;
        config.browser.no_sandbox = self.no_sandbox;
        config.browser.chrome_path = self.chrome_path;
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Args::parse().into_config();

    log::info!("Starting scrape of {}", config.main_url);

    let driver = ChromeDriver::launch(&config.browser).await?;
    let outcome = Scraper::new(&driver, &config).run().await;

    // Close the session whether or not the scrape succeeded
    if let Err(e) = driver.close().await {
        log::warn!("Failed to close Chrome cleanly: {}", e);
    }

    match outcome {
        Ok(catalog) => {
            log::info!(
                "Done: {} products in {}",
                catalog.len(),
                config.output_path.display()
            );
            Ok(())
        }
        Err(e) => {
            log::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}
