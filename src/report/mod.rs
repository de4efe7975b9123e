// src/report/mod.rs

use std::cmp::Ordering;

use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::extract::PriceRow;

/// Unchanged products shown in the markdown before truncation.
pub const MAX_FLAT_SHOWN: usize = 10;
/// Rows quoted in the text backup sent when the image pipeline fails.
pub const MAX_BACKUP_ROWS: usize = 10;
const MAX_NAME_CHARS: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
    Flat,
}

static CHANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-]?)(\d+(?:\.\d+)?)\s*%$").expect("change regex should be valid"));

/// Parse a daily change cell like `+3.27%`, `-1.2%` or `0%` into a signed
/// percentage. The placeholder `-` and anything unparseable count as 0.
pub fn parse_change(raw: &str) -> f64 {
    let Some(caps) = CHANGE_RE.captures(raw.trim()) else {
        return 0.0;
    };
    let value: f64 = caps[2].parse().unwrap_or(0.0);
    if &caps[1] == "-" {
        -value
    } else {
        value
    }
}

pub fn classify(raw: &str) -> Trend {
    let v = parse_change(raw);
    if v > 0.0 {
        Trend::Rising
    } else if v < 0.0 {
        Trend::Falling
    } else {
        Trend::Flat
    }
}

/// Rows split into trend buckets. Rising and falling are each sorted by
/// magnitude of change, largest first; flat keeps page order.
#[derive(Debug, Default)]
pub struct MarketBuckets {
    pub rising: Vec<PriceRow>,
    pub falling: Vec<PriceRow>,
    pub flat: Vec<PriceRow>,
}

impl MarketBuckets {
    pub fn from_rows(rows: &[PriceRow]) -> Self {
        let mut buckets = MarketBuckets::default();
        for row in rows {
            match classify(&row.change) {
                Trend::Rising => buckets.rising.push(row.clone()),
                Trend::Falling => buckets.falling.push(row.clone()),
                Trend::Flat => buckets.flat.push(row.clone()),
            }
        }
        buckets.rising.sort_by(|a, b| by_magnitude(a, b));
        buckets.falling.sort_by(|a, b| by_magnitude(a, b));
        buckets
    }

    pub fn total(&self) -> usize {
        self.rising.len() + self.falling.len() + self.flat.len()
    }

    pub fn sentiment(&self) -> &'static str {
        match self.rising.len().cmp(&self.falling.len()) {
            Ordering::Greater => "Bullish (Upward)",
            Ordering::Less => "Bearish (Downward)",
            Ordering::Equal => "Mixed",
        }
    }
}

fn by_magnitude(a: &PriceRow, b: &PriceRow) -> Ordering {
    let (ma, mb) = (parse_change(&a.change).abs(), parse_change(&b.change).abs());
    mb.partial_cmp(&ma).unwrap_or(Ordering::Equal)
}

/// Shorten a product name for bullets and chart labels.
pub fn short_name(name: &str) -> String {
    let name = name.replace("DDR", "D");
    if name.chars().count() > MAX_NAME_CHARS {
        let head: String = name.chars().take(22).collect();
        format!("{head}...")
    } else {
        name
    }
}

/// Full markdown report: rising and falling sections with price + change
/// per product, and a truncated unchanged section. This is also the text
/// sent when the image pipeline fails.
pub fn markdown_report(buckets: &MarketBuckets) -> String {
    let mut lines = vec![
        "## 📊 DRAM Price Watch".to_string(),
        format!("> Updated: {}", Local::now().format("%H:%M")),
        "---".to_string(),
    ];

    push_section(&mut lines, "🔴 Rising", &buckets.rising);
    push_section(&mut lines, "💚 Falling", &buckets.falling);

    if !buckets.flat.is_empty() {
        lines.push(format!("### ➖ Unchanged ({})", buckets.flat.len()));
        for row in buckets.flat.iter().take(MAX_FLAT_SHOWN) {
            lines.push(format!("- {}", short_name(&row.product)));
        }
        if buckets.flat.len() > MAX_FLAT_SHOWN {
            lines.push(format!("- ... ({} total)", buckets.flat.len()));
        }
    }

    lines.push("---".to_string());
    lines.push(format!(
        "Total Products: {}  |  Overall Sentiment: {}",
        buckets.total(),
        buckets.sentiment()
    ));
    lines.join("\n")
}

/// Short text backup for the degraded notification: the first rows as
/// `- product: avg (change)` lines, no headers of its own.
pub fn text_backup(rows: &[PriceRow]) -> String {
    rows.iter()
        .take(MAX_BACKUP_ROWS)
        .map(|row| format!("- {}: {} ({})", row.product, row.session_avg, row.change))
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_section(lines: &mut Vec<String>, title: &str, rows: &[PriceRow]) {
    if rows.is_empty() {
        return;
    }
    lines.push(format!("### {} ({})", title, rows.len()));
    for row in rows {
        lines.push(format!(
            "**{}**\n- 💰 `{}` ({})\n",
            short_name(&row.product),
            row.session_avg,
            row.change
        ));
    }
}
