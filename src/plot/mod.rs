// src/plot/mod.rs
use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use plotters::data::Quartiles;
use plotters::prelude::*;
use resvg::{tiny_skia, usvg};
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc};
use tracing::debug;

use crate::stats::{gaussian_kde, histogram, linspace, normal_qq};

const SIZE: (u32, u32) = (1000, 600);
const FONT: &str = "sans-serif";
const KDE_POINTS: usize = 200;

/// Per-year colours, cycled by position.
pub const PALETTE: [RGBColor; 4] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
];

/// A chart rendered in memory, ready to be written as `file_name`.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPlot {
    pub file_name: String,
    pub title: String,
    /// PNG-encoded image.
    #[serde(skip)]
    pub png: Vec<u8>,
}

// Loaded once; generic families map to the first installed face.
static FONTS: Lazy<Arc<usvg::fontdb::Database>> = Lazy::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    let family = db
        .faces()
        .next()
        .and_then(|f| f.families.first())
        .map(|(name, _)| name.clone());
    if let Some(family) = family {
        db.set_sans_serif_family(family);
    }
    debug!(faces = db.len(), "loaded system fonts");
    Arc::new(db)
});

/// Rasterizes a chart drawn with the SVG backend into PNG bytes on a white
/// background. Text is dropped when the host has no fonts.
fn rasterize(svg: &str) -> Result<Vec<u8>> {
    let opt = usvg::Options {
        fontdb: FONTS.clone(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg, &opt).context("Failed to parse rendered chart")?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow!("invalid chart size {}x{}", size.width(), size.height()))?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    pixmap.encode_png().context("Failed to encode chart as PNG")
}

fn finish(file_name: String, title: String, svg: &str) -> Result<RenderedPlot> {
    let png = rasterize(svg).with_context(|| format!("rendering {}", file_name))?;
    debug!(file = %file_name, bytes = png.len(), "rendered plot");
    Ok(RenderedPlot {
        file_name,
        title,
        png,
    })
}

fn value_range<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    let pad = ((hi - lo) * 0.05).max(1.0);
    Some((lo - pad, hi + pad))
}

/// Box plot of age, one box per year. Years without ages get no box.
pub fn age_boxplot(ages: &BTreeMap<i32, Vec<f64>>) -> Result<RenderedPlot> {
    let title = "Age by year".to_string();
    let svg = age_boxplot_svg(&title, ages)?;
    finish("age_boxplot_by_year.png".into(), title, &svg)
}

fn age_boxplot_svg(title: &str, ages: &BTreeMap<i32, Vec<f64>>) -> Result<String> {
    let years: Vec<i32> = ages.keys().copied().collect();
    let Some((lo, hi)) = value_range(ages.values().flatten()) else {
        bail!("no ages to plot");
    };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(years[..].into_segmented(), lo as f32..hi as f32)?;
        chart
            .configure_mesh()
            .x_desc("year")
            .y_desc("age")
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(y) | SegmentValue::Exact(y) => y.to_string(),
                SegmentValue::Last => String::new(),
            })
            .light_line_style(WHITE)
            .draw()?;

        chart.draw_series(
            years
                .iter()
                .zip(ages.values())
                .enumerate()
                .filter(|(_, (_, v))| !v.is_empty())
                .map(|(i, (year, v))| {
                    Boxplot::new_vertical(SegmentValue::CenterOf(year), &Quartiles::new(v.as_slice()))
                        .width(60)
                        .style(PALETTE[i % PALETTE.len()])
                }),
        )?;
        root.present()?;
    }

    Ok(svg)
}

/// Histogram of one year's ages with a KDE curve scaled to bin counts.
pub fn age_histogram(year: i32, ages: &[f64], bins: usize, colour: RGBColor) -> Result<RenderedPlot> {
    let title = format!("Age histogram {}", year);
    let svg = age_histogram_svg(&title, year, ages, bins, colour)?;
    finish(format!("age_histogram_{}.png", year), title, &svg)
}

fn age_histogram_svg(title: &str, year: i32, ages: &[f64], bins: usize, colour: RGBColor) -> Result<String> {
    let counts = histogram(ages, bins);
    let (Some(first), Some(last)) = (counts.first(), counts.last()) else {
        bail!("no ages to plot for {}", year);
    };
    let (x0, x1) = (first.start, last.end);
    let y_max = counts.iter().map(|b| b.count).max().unwrap_or(0) as f64 * 1.1 + 1.0;

    let grid = linspace(x0, x1, KDE_POINTS);
    let curve: Option<Vec<(f64, f64)>> = gaussian_kde(ages, &grid).map(|density| {
        let scale = ages.len() as f64 * first.width();
        grid.iter().zip(density).map(|(&x, d)| (x, d * scale)).collect()
    });

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x0..x1, 0.0..y_max)?;
        chart.configure_mesh().x_desc("age").y_desc("count").draw()?;

        chart.draw_series(counts.iter().map(|b| {
            Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], colour.mix(0.6).filled())
        }))?;
        if let Some(curve) = curve {
            chart.draw_series(LineSeries::new(curve, colour.stroke_width(2)))?;
        }
        root.present()?;
    }

    Ok(svg)
}

/// Normal QQ plot of one year's ages with the standardized reference line.
pub fn age_qqplot(year: i32, ages: &[f64], colour: RGBColor) -> Result<RenderedPlot> {
    let title = format!("Age QQ plot {}", year);
    let svg = age_qqplot_svg(&title, year, ages, colour)?;
    finish(format!("age_qqplot_{}.png", year), title, &svg)
}

fn age_qqplot_svg(title: &str, year: i32, ages: &[f64], colour: RGBColor) -> Result<String> {
    let qq = normal_qq(ages)?;
    let line = |x: f64| qq.intercept + qq.slope * x;

    let theoretical: Vec<f64> = qq.points.iter().map(|p| p.0).collect();
    let Some((x0, x1)) = value_range(&theoretical) else {
        bail!("no ages to plot for {}", year);
    };
    let mut sample: Vec<f64> = qq.points.iter().map(|p| p.1).collect();
    sample.extend([line(x0), line(x1)]);
    let Some((y0, y1)) = value_range(&sample) else {
        bail!("no ages to plot for {}", year);
    };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x0..x1, y0..y1)?;
        chart
            .configure_mesh()
            .x_desc("theoretical quantiles")
            .y_desc("sample quantiles")
            .draw()?;

        chart.draw_series(
            qq.points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, colour.filled())),
        )?;
        chart.draw_series(LineSeries::new([(x0, line(x0)), (x1, line(x1))], RED.stroke_width(2)))?;
        root.present()?;
    }

    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn ages() -> Vec<f64> {
        vec![3.0, 18.0, 25.0, 31.0, 34.0, 40.0, 42.0, 47.0, 55.0, 63.0, 70.0, 88.0]
    }

    fn assert_png(plot: &RenderedPlot) {
        assert!(plot.file_name.ends_with(".png"), "{}", plot.file_name);
        assert!(plot.png.starts_with(PNG_SIGNATURE));
        let decoded = tiny_skia::Pixmap::decode_png(&plot.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), SIZE);
    }

    #[test]
    fn test_boxplot_renders_png() {
        let mut by_year = BTreeMap::new();
        by_year.insert(2022, ages());
        by_year.insert(2024, ages().iter().map(|a| a + 5.0).collect());
        by_year.insert(2026, Vec::new());
        let plot = age_boxplot(&by_year).unwrap();
        assert_eq!(plot.file_name, "age_boxplot_by_year.png");
        assert_png(&plot);
    }

    #[test]
    fn test_boxplot_without_ages_fails() {
        let mut by_year = BTreeMap::new();
        by_year.insert(2022, Vec::new());
        assert!(age_boxplot(&by_year).is_err());
    }

    #[test]
    fn test_histogram_and_qq_render() {
        let hist = age_histogram(2022, &ages(), 30, PALETTE[0]).unwrap();
        assert_eq!(hist.file_name, "age_histogram_2022.png");
        assert_png(&hist);

        let qq = age_qqplot(2024, &ages(), PALETTE[1]).unwrap();
        assert_eq!(qq.file_name, "age_qqplot_2024.png");
        assert_png(&qq);
    }

    #[test]
    fn test_chart_shapes() {
        let hist = age_histogram_svg("h", 2022, &ages(), 30, PALETTE[0]).unwrap();
        assert!(hist.contains("<rect"));
        let qq = age_qqplot_svg("q", 2024, &ages(), PALETTE[1]).unwrap();
        assert!(qq.contains("<circle"));
    }

    #[test]
    fn test_constant_sample_still_plots() {
        let flat = vec![10.0; 8];
        assert!(age_histogram(2022, &flat, 30, PALETTE[0]).is_ok());
        assert!(age_qqplot(2022, &flat, PALETTE[0]).is_ok());
    }
}
