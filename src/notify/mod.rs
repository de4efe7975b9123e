// src/notify/mod.rs

use std::time::Duration;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{Local, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde_json::json;
use sha2::Sha256;
use tracing::info;

type HmacSha256 = Hmac<Sha256>;

const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// DingTalk robot signature: HMAC-SHA256 over `"{timestamp}\n{secret}"`
/// keyed by the secret, base64-encoded, then form-urlencoded.
pub fn sign(secret: &str, timestamp_ms: i64) -> String {
    let string_to_sign = format!("{timestamp_ms}\n{secret}");
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(string_to_sign.as_bytes());
    let digest = mac.finalize().into_bytes();
    url::form_urlencoded::byte_serialize(BASE64.encode(&digest[..]).as_bytes()).collect()
}

/// Webhook URL with `&timestamp=...&sign=...` appended, as the robot API
/// expects.
pub fn signed_url(webhook: &str, secret: &str, timestamp_ms: i64) -> String {
    format!(
        "{webhook}&timestamp={timestamp_ms}&sign={}",
        sign(secret, timestamp_ms)
    )
}

/// Markdown body for the notification: the image when we have one, the
/// backup text with a degradation notice when we don't.
pub fn compose_markdown(title: &str, backup: &str, image_url: Option<&str>) -> String {
    let mut text = format!("### 📊 {title}\n> Updated: {}\n\n", Local::now().format("%H:%M"));
    match image_url {
        Some(url) => text.push_str(&format!("![market report]({url})")),
        None => {
            text.push_str("⚠️ (image upload failed, falling back to text)\n\n");
            text.push_str(backup);
        }
    }
    text
}

/// Sign and POST a markdown message to the DingTalk webhook.
pub async fn send_markdown(
    client: &Client,
    webhook: &str,
    secret: &str,
    title: &str,
    text: &str,
) -> Result<()> {
    let url = signed_url(webhook, secret, Utc::now().timestamp_millis());
    let payload = json!({
        "msgtype": "markdown",
        "markdown": { "title": title, "text": text },
    });
    client
        .post(&url)
        .json(&payload)
        .timeout(SEND_TIMEOUT)
        .send()
        .await
        .context("posting DingTalk webhook")?
        .error_for_status()
        .context("DingTalk webhook status")?;
    info!("notification pushed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Vectors cross-checked against the reference DingTalk signing recipe.
    #[test]
    fn signature_matches_known_vectors() {
        assert_eq!(
            sign("this is a secret", 1_700_000_000_000),
            "LdEUIXwpoL8n3zRA16VP07IGUghfkzNTVAq3jVt7RvE%3D"
        );
        assert_eq!(
            sign("SEC0b1", 1_714_857_600_123),
            "5I81RqvyGBUu%2ByDw5%2FWCfO6Uvolpkrl0hW1FpWAyu9M%3D"
        );
    }

    #[test]
    fn signed_url_appends_timestamp_and_sign() {
        let url = signed_url(
            "https://oapi.dingtalk.com/robot/send?access_token=t",
            "SEC0b1",
            1_714_857_600_123,
        );
        assert!(url.starts_with("https://oapi.dingtalk.com/robot/send?access_token=t&timestamp=1714857600123&sign="));
        // percent escapes survive, raw '+' and '/' do not
        assert!(url.ends_with("%3D"));
        assert!(!url.contains('+'));
    }

    #[test]
    fn compose_embeds_image_when_available() {
        let text = compose_markdown("Report", "backup", Some("https://files.catbox.moe/x.png"));
        assert!(text.contains("![market report](https://files.catbox.moe/x.png)"));
        assert!(!text.contains("backup"));
    }

    #[test]
    fn compose_degrades_to_backup_text() {
        let text = compose_markdown("Report", "- DDR5: 5.05 (+3.27%)", None);
        assert!(text.contains("falling back to text"));
        assert!(text.contains("- DDR5: 5.05 (+3.27%)"));
    }

    #[test]
    fn degraded_message_carries_one_header() {
        let rows = vec![
            crate::extract::PriceRow {
                product: "DDR5 16G".to_string(),
                spec: "16Gb".to_string(),
                unit: "USD".to_string(),
                session_high: String::new(),
                session_low: String::new(),
                session_avg: "5.05".to_string(),
                change: "+3.27%".to_string(),
            };
            12
        ];
        let backup = crate::report::text_backup(&rows);
        let text = compose_markdown("Report", &backup, None);
        // one title, one timestamp, and the row cap survives composition
        assert_eq!(text.matches("📊").count(), 1);
        assert_eq!(text.matches("Updated:").count(), 1);
        assert!(!text.contains("\n## "));
        assert_eq!(text.matches("- DDR5 16G:").count(), 10);
    }
}
