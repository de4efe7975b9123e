// src/extract/mod.rs

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// One row of the scraped price table — the seven columns the TrendForce
/// listing carries for a part: name, spec, unit, session high/low/average,
/// and the daily change string (e.g. "+3.27%").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRow {
    pub product: String,
    pub spec: String,
    pub unit: String,
    pub session_high: String,
    pub session_low: String,
    pub session_avg: String,
    pub change: String,
}

static BODY_ROWS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table tbody tr").expect("tbody row selector should be valid"));
static ANY_ROWS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table tr").expect("table row selector should be valid"));
static CELLS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th, td").expect("cell selector should be valid"));

/// Walk every table row in `html` and keep the ones that look like price
/// rows: at least 7 cells, a resolvable product cell, and a product name
/// containing `keyword` (case-insensitive). Rows that fail the cell count
/// or whose product cell is empty are skipped as malformed.
pub fn extract_rows(html: &str, keyword: &str) -> Vec<PriceRow> {
    let doc = Html::parse_document(html);
    let mut rows: Vec<ElementRef> = doc.select(&BODY_ROWS).collect();
    if rows.is_empty() {
        rows = doc.select(&ANY_ROWS).collect();
    }

    let keyword = keyword.to_uppercase();
    let mut out = Vec::new();
    for row in rows {
        let cells: Vec<ElementRef> = row.select(&CELLS).collect();
        if cells.len() < 7 {
            continue;
        }
        let Some(product) = cell_text(&cells[0]) else {
            debug!("skipping row with empty product cell");
            continue;
        };
        if !product.to_uppercase().contains(&keyword) {
            continue;
        }
        let field = |i: usize| cell_text(&cells[i]).unwrap_or_default();
        out.push(PriceRow {
            product,
            spec: field(1),
            unit: field(2),
            session_high: field(3),
            session_low: field(4),
            session_avg: field(5),
            change: field(6),
        });
    }
    out
}

/// Resolve a cell to display text: a non-empty `title` attribute wins
/// (the page elides long names into it), else the trimmed concatenation
/// of the cell's text nodes. `None` means the cell is effectively empty.
fn cell_text(cell: &ElementRef) -> Option<String> {
    if let Some(title) = cell.value().attr("title") {
        let title = title.trim();
        if !title.is_empty() {
            return Some(title.to_string());
        }
    }
    let text = cell
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
