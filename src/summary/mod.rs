// src/summary/mod.rs

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::extract::PriceRow;

static DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
static MODEL: &str = "gpt-4o-mini";

/// Rows quoted in the prompt; enough for direction, cheap on tokens.
const MAX_PROMPT_ROWS: usize = 20;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Ask an OpenAI-compatible endpoint for a one-paragraph market comment
/// on today's rows. Callers treat any failure as "no commentary".
pub async fn market_commentary(
    client: &Client,
    api_key: &str,
    base_url: Option<&str>,
    rows: &[PriceRow],
) -> Result<String> {
    let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
    let url = format!("{base}/chat/completions");

    let payload = json!({
        "model": MODEL,
        "messages": [
            {
                "role": "system",
                "content": "You are a memory-market analyst. Reply with one short paragraph of plain text.",
            },
            { "role": "user", "content": build_prompt(rows) },
        ],
        "temperature": 0.4,
    });

    let resp: ChatResponse = client
        .post(&url)
        .bearer_auth(api_key)
        .json(&payload)
        .send()
        .await
        .context("calling chat completions")?
        .error_for_status()?
        .json()
        .await
        .context("decoding chat completions response")?;

    let content = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("empty choices in response"))?
        .message
        .content
        .trim()
        .to_string();
    info!("got {} chars of commentary", content.len());
    Ok(content)
}

fn build_prompt(rows: &[PriceRow]) -> String {
    let mut lines =
        vec!["Today's DRAM spot prices (product | average | daily change):".to_string()];
    for row in rows.iter().take(MAX_PROMPT_ROWS) {
        lines.push(format!("{} | {} | {}", row.product, row.session_avg, row.change));
    }
    lines.push("Summarize the market direction in one paragraph.".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(product: &str, change: &str) -> PriceRow {
        PriceRow {
            product: product.to_string(),
            spec: String::new(),
            unit: String::new(),
            session_high: String::new(),
            session_low: String::new(),
            session_avg: "5.05".to_string(),
            change: change.to_string(),
        }
    }

    #[test]
    fn chat_response_decodes_first_choice() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "finish_reason": "stop",
                 "message": {"role": "assistant", "content": " Prices firmed across DDR5. "}}
            ],
            "usage": {"total_tokens": 120}
        }"#;
        let resp: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.choices[0].message.content.trim(), "Prices firmed across DDR5.");
    }

    #[test]
    fn prompt_quotes_rows_and_truncates() {
        let rows: Vec<PriceRow> =
            (0..30).map(|i| row(&format!("DDR5 part {i}"), "+1.0%")).collect();
        let prompt = build_prompt(&rows);
        assert!(prompt.contains("DDR5 part 0 | 5.05 | +1.0%"));
        assert!(prompt.contains("DDR5 part 19"));
        assert!(!prompt.contains("DDR5 part 20"));
    }
}
