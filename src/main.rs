use anyhow::Result;
use dramwatch::{chart, config::Config, extract, fetch, notify, report, summary, upload};
use reqwest::Client;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

static REPORT_TITLE: &str = "DRAM Market Distribution Report";

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,dramwatch=info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    let config = Config::from_env();
    let client = Client::new();

    // ─── 2) fetch the price page ─────────────────────────────────────
    let html = fetch::fetch_price_page(&client).await?;

    // ─── 3) extract DRAM rows ────────────────────────────────────────
    let rows = extract::extract_rows(&html, "DDR");
    if rows.is_empty() {
        error!("no price rows extracted; nothing to report");
        return Ok(());
    }
    let buckets = report::MarketBuckets::from_rows(&rows);
    info!(
        rising = buckets.rising.len(),
        falling = buckets.falling.len(),
        flat = buckets.flat.len(),
        "extracted {} rows",
        rows.len()
    );

    // ─── 4) render + upload the chart (best effort) ──────────────────
    let image_url = match chart::render_change_chart(&rows) {
        Ok(path) => upload::upload_image(&client, &path).await,
        Err(err) => {
            warn!("chart rendering failed: {err:#}");
            None
        }
    };

    // ─── 5) optional AI commentary ───────────────────────────────────
    let commentary = match config.ai_api_key.as_deref() {
        Some(key) => {
            match summary::market_commentary(&client, key, config.ai_base_url.as_deref(), &rows)
                .await
            {
                Ok(text) => Some(text),
                Err(err) => {
                    warn!("commentary skipped: {err:#}");
                    None
                }
            }
        }
        None => None,
    };

    // ─── 6) push the notification ────────────────────────────────────
    let Some((webhook, secret)) = config.dingtalk() else {
        warn!("DING_WEBHOOK / DING_SECRET not set; skipping notification");
        return Ok(());
    };
    let backup = report::text_backup(&rows);
    let mut text = notify::compose_markdown(REPORT_TITLE, &backup, image_url.as_deref());
    if let Some(commentary) = commentary {
        text.push_str("\n\n---\n");
        text.push_str(&commentary);
    }
    if let Err(err) = notify::send_markdown(&client, webhook, secret, REPORT_TITLE, &text).await {
        error!("notification failed: {err:#}");
    }

    info!("all done");
    Ok(())
}
