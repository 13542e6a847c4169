//! Local HTTP server for tests
//!
//! Serves a miniature shop with the same markup the scraper expects: a
//! category page behind a cookie popup whose product list grows each time the
//! load-more wrapper scrolls into view, plus a handful of product pages with
//! and without nutrition tables.
//!
//! Each server instance runs on a random available port for test isolation.

use std::net::SocketAddr;
use tokio::sync::oneshot;
use warp::Filter;

/// Products on the main category page: (name, path) per load-more batch.
/// The first batch is present on page load.
const SNACK_BATCHES: &[&[(&str, &str)]] = &[
    &[("Biscuiti cu cacao", "/p/1")],
    &[("Chipsuri cu sare", "/p/2")],
    &[("Napolitane", "/p/3")],
];

/// Listed name does not appear in the product page title.
const MISMATCH_BATCHES: &[&[(&str, &str)]] = &[&[("Produs fantoma", "/p/1")], &[]];

/// First product extracts cleanly, the second one's title does not match.
const PARTIAL_BATCHES: &[&[(&str, &str)]] = &[
    &[("Biscuiti cu cacao", "/p/1"), ("Produs fantoma", "/p/3")],
    &[],
];

/// Render a category page. With `finish` false the load-more wrapper never
/// goes away.
pub fn category_page(batches: &[&[(&str, &str)]], finish: bool) -> String {
    let batches_js: Vec<String> = batches
        .iter()
        .map(|batch| {
            let items: Vec<String> = batch
                .iter()
                .map(|(name, href)| format!("[\"{}\", \"{}\"]", name, href))
                .collect();
            format!("[{}]", items.join(", "))
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="ro">
<head>
    <title>Dulciuri si snacks</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
</head>
<body>
    <div id="cookie-popup">
        <p>Folosim cookies.</p>
        <button data-testid="cookie-popup-accept"
                onclick="document.getElementById('cookie-popup').remove()">Accept</button>
    </div>
    <div id="products"></div>
    <div id="more" data-testid="vertical-load-more-wrapper" style="height: 40px">Se incarca...</div>
    <script>
        const batches = [{batches}];
        const finish = {finish};
        const list = document.getElementById('products');

        function addBatch(batch) {{
            for (const [name, href] of batch) {{
                const block = document.createElement('div');
                block.style.height = '1500px';
                const link = document.createElement('a');
                link.setAttribute('data-testid', 'product-block-name-link');
                link.href = href;
                link.textContent = name;
                block.appendChild(link);
                list.appendChild(block);
            }}
        }}

        addBatch(batches[0] || []);
        let next = 1;
        let ticksInView = 0;
        const timer = setInterval(() => {{
            const more = document.getElementById('more');
            if (!more) {{ clearInterval(timer); return; }}
            const rect = more.getBoundingClientRect();
            const inView = rect.top < window.innerHeight && rect.bottom > 0;
            ticksInView = inView ? ticksInView + 1 : 0;
            if (ticksInView < 2) {{ return; }}
            ticksInView = 0;

            if (next < batches.length) {{
                addBatch(batches[next]);
                next += 1;
            }}
            if (finish && next >= batches.length) {{
                more.remove();
                clearInterval(timer);
            }}
        }}, 200);
    </script>
</body>
</html>"#,
        batches = batches_js.join(", "),
        finish = finish,
    )
}

fn product_page(id: u32) -> String {
    let body = match id {
        1 => {
            r#"<h1 data-testid="product-common-header-title">Biscuiti cu cacao 100g</h1>
    <table>
        <tr><td>Valoare energetica</td><td> 480 kcal </td></tr>
        <tr><td>Grasimi</td><td>20 g</td></tr>
        <tr><td>Grasimi saturate</td><td>9 g</td></tr>
        <tr><td>Fibre</td><td>3.5 g</td></tr>
        <tr><td>Proteine</td><td>6 g</td></tr>
        <tr><td>Sodiu</td><td>0.3 g</td></tr>
    </table>
    <div data-testid="more-than">
        <h3>Ingrediente</h3>
        <div>faina, zahar, cacao</div>
    </div>
    <div data-testid="more-than">
        <h3>Alergeni</h3>
        <div>gluten, lapte</div>
    </div>"#
        }
        2 => {
            r#"<h1 data-testid="product-common-header-title">Chipsuri cu sare 150g</h1>
    <table>
        <tr><td>Valoare energetica</td><td>530 kcal</td></tr>
        <tr><td>Grasimi</td><td>32 g</td></tr>
        <tr><td>Proteine</td><td>7 g</td></tr>
    </table>
    <div data-testid="more-than">
        <h3>Ingrediente</h3>
        <div>cartofi, ulei, sare</div>
    </div>"#
        }
        3 => r#"<h1 data-testid="product-common-header-title">Napolitane cu alune</h1>"#,
        _ => r#"<h1>Produs inexistent</h1>"#,
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="ro">
<head><title>Produs</title></head>
<body>
    {}
</body>
</html>"#,
        body
    )
}

/// Test server that serves the miniature shop
pub struct TestServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a new test server on a random available port
    pub async fn start() -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let category = warp::path::end()
            .map(|| warp::reply::html(category_page(SNACK_BATCHES, true)));

        let mismatch = warp::path("mismatch")
            .and(warp::path::end())
            .map(|| warp::reply::html(category_page(MISMATCH_BATCHES, true)));

        let partial = warp::path("partial")
            .and(warp::path::end())
            .map(|| warp::reply::html(category_page(PARTIAL_BATCHES, true)));

        let stuck = warp::path("stuck")
            .and(warp::path::end())
            .map(|| warp::reply::html(category_page(SNACK_BATCHES, false)));

        let product = warp::path!("p" / u32).map(|id| warp::reply::html(product_page(id)));

        let routes = category
            .or(mismatch)
            .or(partial)
            .or(stuck)
            .or(product);

        // Bind to random port
        let (addr, server) =
            warp::serve(routes).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async {
                shutdown_rx.await.ok();
            });

        tokio::spawn(server);

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL for this server (e.g., "http://127.0.0.1:12345")
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    #[allow(dead_code)]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to be ready by making a test request
    pub async fn wait_ready(&self) -> anyhow::Result<()> {
        let url = self.url();
        let max_attempts = 10;

        for attempt in 1..=max_attempts {
            match reqwest::get(&url).await {
                Ok(response) if response.status().is_success() => {
                    return Ok(());
                }
                Ok(response) => {
                    println!(
                        "Attempt {}: Server returned status {}",
                        attempt,
                        response.status()
                    );
                }
                Err(e) => {
                    println!("Attempt {}: Server not ready - {}", attempt, e);
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            }
        }

        anyhow::bail!(
            "Server did not become ready after {} attempts",
            max_attempts
        )
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
