// src/chart/mod.rs

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use plotters::prelude::*;
use tracing::info;

use crate::extract::PriceRow;
use crate::report::{self, MarketBuckets};

const WIDTH: u32 = 1200;
const MIN_HEIGHT: u32 = 500;
const MAX_HEIGHT: u32 = 1000;

static FLAT_BAR: RGBColor = RGBColor(85, 85, 85);

/// Render a per-product daily-change bar chart into the system temp
/// directory and return the PNG path.
pub fn render_change_chart(rows: &[PriceRow]) -> Result<PathBuf> {
    if rows.is_empty() {
        bail!("no rows to chart");
    }
    let path = std::env::temp_dir().join("dram_summary.png");
    draw(rows, &path)?;
    info!(path = %path.display(), "chart rendered");
    Ok(path)
}

fn draw(rows: &[PriceRow], path: &Path) -> Result<()> {
    let changes: Vec<f64> = rows.iter().map(|r| report::parse_change(&r.change)).collect();
    let (y_min, y_max) = value_range(&changes);
    let buckets = MarketBuckets::from_rows(rows);

    let root =
        BitMapBackend::new(path, (WIDTH, canvas_height(rows.len()))).into_drawing_area();
    root.fill(&WHITE).context("filling chart background")?;

    let caption = format!("DRAM Market Distribution Report ({} Products)", rows.len());
    let footer = footer_line(rows.len(), buckets.sentiment());

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0i32..rows.len() as i32, y_min..y_max)
        .context("building chart axes")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .y_desc("Daily change (%)")
        .x_desc(footer)
        .draw()
        .context("drawing chart mesh")?;

    chart
        .draw_series(changes.iter().enumerate().map(|(i, &v)| {
            let color = if v > 0.0 {
                RED.filled()
            } else if v < 0.0 {
                GREEN.filled()
            } else {
                FLAT_BAR.filled()
            };
            let mut bar = Rectangle::new([(i as i32, 0.0), (i as i32 + 1, v)], color);
            bar.set_margin(0, 0, 2, 2);
            bar
        }))
        .context("drawing change bars")?;

    root.present().context("writing chart PNG")?;
    Ok(())
}

fn footer_line(total: usize, sentiment: &str) -> String {
    format!(
        "Total Products: {total}  |  Overall Sentiment: {sentiment}  |  {}",
        Local::now().format("%Y-%m-%d")
    )
}

/// Taller canvas for longer listings, within screenshot-friendly bounds.
fn canvas_height(products: usize) -> u32 {
    (360 + products as u32 * 14).clamp(MIN_HEIGHT, MAX_HEIGHT)
}

/// Y range padded around zero so flat bars and the baseline stay visible.
fn value_range(changes: &[f64]) -> (f64, f64) {
    let mut min = 0.0f64;
    let mut max = 0.0f64;
    for &v in changes {
        min = min.min(v);
        max = max.max(v);
    }
    (min - 0.5, max + 0.5)
}
