// src/fetch/mod.rs

use std::ffi::OsStr;
use std::time::Duration;

use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use reqwest::Client;
use tracing::{info, warn};

pub static PRICE_URL: &str = "https://www.trendforce.cn/price";

static USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// The price table is filled in by script after load; give it time.
const PAGE_SETTLE: Duration = Duration::from_secs(5);
const TAB_SETTLE: Duration = Duration::from_secs(3);

/// Fetch the price page, preferring a headless Chrome session so the
/// script-rendered table is present. When no Chrome binary is available
/// this degrades to a plain GET of the same URL.
pub async fn fetch_price_page(client: &Client) -> Result<String> {
    let rendered = tokio::task::spawn_blocking(|| fetch_with_browser(PRICE_URL)).await?;
    match rendered {
        Ok(html) => Ok(html),
        Err(err) => {
            warn!("browser fetch failed: {err:#}; falling back to plain GET");
            fetch_plain(client, PRICE_URL).await
        }
    }
}

/// Drive headless Chrome: load the page, best-effort click the DRAM tab,
/// return the rendered markup. Blocking; run on the blocking pool.
pub fn fetch_with_browser(url: &str) -> Result<String> {
    info!("launching headless Chrome");
    let ua_arg = format!("--user-agent={USER_AGENT}");
    let options = LaunchOptions {
        headless: true,
        sandbox: false,
        window_size: Some((1920, 1080)),
        args: vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(ua_arg.as_str()),
        ],
        ..Default::default()
    };
    let browser = Browser::new(options).context("launching headless Chrome")?;

    let tab = browser.new_tab().context("opening tab")?;
    tab.navigate_to(url).context("navigating to price page")?;

    // wait_for_element gives up quietly on a slow first paint; the fixed
    // settle below covers the rest.
    let _ = tab.wait_for_element_with_custom_timeout("table", PAGE_SETTLE);
    std::thread::sleep(PAGE_SETTLE);

    // The default tab usually already shows DRAM; a failed click is fine.
    match click_tab(&tab, "DRAM") {
        Ok(()) => std::thread::sleep(TAB_SETTLE),
        Err(err) => warn!("DRAM tab click skipped: {err:#}"),
    }

    tab.get_content().context("reading page content")
}

/// Click the first clickable element whose text mentions `label`.
fn click_tab(tab: &Tab, label: &str) -> Result<()> {
    let js = format!(
        "[...document.querySelectorAll('a, button, li, span')]\
         .find(el => el.textContent.includes('{label}'))?.click()"
    );
    tab.evaluate(&js, false).context("evaluating tab click")?;
    Ok(())
}

async fn fetch_plain(client: &Client, url: &str) -> Result<String> {
    let html = client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await
        .context("requesting price page")?
        .error_for_status()?
        .text()
        .await
        .context("reading price page body")?;
    Ok(html)
}
