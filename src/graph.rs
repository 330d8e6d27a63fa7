#![cfg(feature = "web")]
use crate::book::{ReadBook, YearMonth};
use crate::derive::{
    CategoryShare, CumulativePoint, MonthCategoryCount, author_counts, category_breakdown,
    category_counts, cumulative_category_series, month_category_counts,
};
use crate::error::{DashboardError, Result};
use crate::query::filter_by_category;
use plotters::prelude::*;
use std::collections::BTreeSet;
use std::f64::consts::PI;

/// Charts the dashboard can draw, by route name
pub const CHART_NAMES: &[&str] = &[
    "category_share",
    "cumulative",
    "by_category",
    "by_month",
    "by_author",
];

const UNSELECTED: RGBColor = RGBColor(211, 211, 211);

/// Configuration options for graph generation
#[derive(Clone, Debug)]
pub struct GraphOptions {
    /// Title displayed at the top of the graph
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the graph in pixels
    pub width: u32,

    /// Height of the graph in pixels
    pub height: u32,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            title: "Graph".to_string(),
            x_label: String::new(),
            y_label: "No. of Books".to_string(),
            width: 800,
            height: 400,
        }
    }
}

impl GraphOptions {
    fn titled(title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            ..Self::default()
        }
    }
}

/// Stable color per category, shared by every chart
pub struct CategoryPalette {
    categories: Vec<String>,
}

impl CategoryPalette {
    pub fn new(books: &[ReadBook]) -> Self {
        let categories: BTreeSet<&str> = books.iter().map(|b| b.record.category.as_str()).collect();
        Self {
            categories: categories.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn color(&self, category: &str) -> RGBAColor {
        let index = self
            .categories
            .iter()
            .position(|c| c == category)
            .unwrap_or(0);
        Palette99::pick(index).to_rgba()
    }
}

fn render_err<E: std::fmt::Display>(e: E) -> DashboardError {
    DashboardError::Render(e.to_string())
}

/// Draws one of the dashboard charts as an SVG document
///
/// `category` filters the author chart and `highlight` greys out every bar of
/// the category chart but the selected one. Returns `Ok(None)` for an
/// unknown chart name.
pub fn chart_svg(
    name: &str,
    books: &[ReadBook],
    category: &str,
    highlight: Option<&str>,
) -> Result<Option<String>> {
    let palette = CategoryPalette::new(books);

    let svg = match name {
        "category_share" => render_category_donut(
            &category_breakdown(books),
            &GraphOptions::titled("Books by Category (%)", "", ""),
            &palette,
        )?,
        "cumulative" => render_cumulative_lines(
            &cumulative_category_series(books),
            &GraphOptions {
                height: 500,
                ..GraphOptions::titled(
                    "Cumulative Count by Category over Months",
                    "Month-Year Read",
                    "Cumulative Count",
                )
            },
            &palette,
        )?,
        "by_category" => render_count_bars(
            &category_counts(books),
            &GraphOptions::titled("Books by Category", "Category", "No. of Books"),
            |label| {
                if highlight.is_none_or(|h| h == label) {
                    palette.color(label)
                } else {
                    UNSELECTED.to_rgba()
                }
            },
        )?,
        "by_month" => render_stacked_months(
            &month_category_counts(books),
            &GraphOptions::titled("Books by Month", "Month-Year Read", "No. of Books"),
            &palette,
        )?,
        "by_author" => render_count_bars(
            &author_counts(&filter_by_category(books, category)),
            &GraphOptions::titled("Books by Author(s)", "Authors", "No. of Books"),
            |_| BLUE.to_rgba(),
        )?,
        _ => return Ok(None),
    };

    Ok(Some(svg))
}

/// Renders a donut with one slice per category share
pub fn render_category_donut(
    shares: &[CategoryShare],
    options: &GraphOptions,
    palette: &CategoryPalette,
) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let area = root
            .titled(&options.title, ("sans-serif", 30).into_font())
            .map_err(render_err)?;

        let (w, h) = area.dim_in_pixel();
        let center = (w as f64 / 2.0, h as f64 / 2.0);
        let outer = (w.min(h) as f64 / 2.0 - 10.0).max(10.0);
        let inner = outer * 0.5;
        let total: f64 = shares.iter().map(|s| s.percentage).sum();

        let mut start = -PI / 2.0;
        for share in shares.iter().filter(|s| s.percentage > 0.0) {
            let sweep = share.percentage / total * 2.0 * PI;
            let end = start + sweep;
            let points = annulus_sector(center, inner, outer, start, end);
            area.draw(&Polygon::new(points, palette.color(&share.category).filled()))
                .map_err(render_err)?;

            let mid = start + sweep / 2.0;
            let radius = (inner + outer) / 2.0;
            let label = (
                (center.0 + radius * mid.cos()) as i32,
                (center.1 + radius * mid.sin()) as i32,
            );
            area.draw(&Text::new(
                format!("{:.0}%", share.percentage),
                label,
                ("sans-serif", 14).into_font(),
            ))
            .map_err(render_err)?;

            start = end;
        }

        root.present().map_err(render_err)?;
    }
    Ok(svg)
}

/// Outline of a ring segment, outer arc forward then inner arc back
fn annulus_sector(
    center: (f64, f64),
    inner: f64,
    outer: f64,
    start: f64,
    end: f64,
) -> Vec<(i32, i32)> {
    let steps = (((end - start) / (2.0 * PI)) * 90.0).ceil().max(2.0) as usize;
    let at = |radius: f64, angle: f64| {
        (
            (center.0 + radius * angle.cos()).round() as i32,
            (center.1 + radius * angle.sin()).round() as i32,
        )
    };

    let mut points = Vec::with_capacity(2 * (steps + 1));
    for i in 0..=steps {
        let angle = start + (end - start) * i as f64 / steps as f64;
        points.push(at(outer, angle));
    }
    for i in (0..=steps).rev() {
        let angle = start + (end - start) * i as f64 / steps as f64;
        points.push(at(inner, angle));
    }
    points
}

/// Renders one bar per label, colored by `color_of`
pub fn render_count_bars<F>(
    counts: &[(String, usize)],
    options: &GraphOptions,
    color_of: F,
) -> Result<String>
where
    F: Fn(&str) -> RGBAColor,
{
    let labels: Vec<&str> = counts.iter().map(|(label, _)| label.as_str()).collect();
    let max_y = counts.iter().map(|(_, count)| *count).max().unwrap_or(0) + 1;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(40)
            .build_cartesian_2d((0..labels.len().max(1)).into_segmented(), 0..max_y)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len().max(1))
            .x_label_formatter(&|v| segment_label(v, &labels))
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(counts.iter().enumerate().map(|(i, (label, count))| {
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(i), 0), (SegmentValue::Exact(i + 1), *count)],
                    color_of(label).filled(),
                );
                bar.set_margin(0, 0, 5, 5);
                bar
            }))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
    }
    Ok(svg)
}

/// Renders a line per category of its running total
pub fn render_cumulative_lines(
    series: &[CumulativePoint],
    options: &GraphOptions,
    palette: &CategoryPalette,
) -> Result<String> {
    let months: Vec<YearMonth> = series
        .iter()
        .map(|p| p.read_month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let month_labels: Vec<String> = months.iter().map(|m| m.to_string()).collect();
    let label_refs: Vec<&str> = month_labels.iter().map(String::as_str).collect();
    let categories: BTreeSet<&str> = series.iter().map(|p| p.category.as_str()).collect();
    let max_y = series.iter().map(|p| p.cumulative_count).max().unwrap_or(0) + 1;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(40)
            .build_cartesian_2d((0..months.len().max(1)).into_segmented(), 0..max_y)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .x_labels(months.len().max(1))
            .x_label_formatter(&|v| segment_label(v, &label_refs))
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .draw()
            .map_err(render_err)?;

        for category in &categories {
            let color = palette.color(category);
            let points: Vec<(SegmentValue<usize>, usize)> = series
                .iter()
                .filter(|p| p.category == *category)
                .filter_map(|p| {
                    let i = months.binary_search(&p.read_month).ok()?;
                    Some((SegmentValue::CenterOf(i), p.cumulative_count))
                })
                .collect();

            chart
                .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
                .map_err(render_err)?
                .label(*category)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

            chart
                .draw_series(points.into_iter().map(|p| Circle::new(p, 3, color.filled())))
                .map_err(render_err)?;
        }

        if !categories.is_empty() {
            chart
                .configure_series_labels()
                .border_style(BLACK)
                .background_style(WHITE.mix(0.8))
                .draw()
                .map_err(render_err)?;
        }

        root.present().map_err(render_err)?;
    }
    Ok(svg)
}

/// Renders a bar per month, stacked by category
pub fn render_stacked_months(
    counts: &[MonthCategoryCount],
    options: &GraphOptions,
    palette: &CategoryPalette,
) -> Result<String> {
    let months: Vec<YearMonth> = counts
        .iter()
        .map(|c| c.read_month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let month_labels: Vec<String> = months.iter().map(|m| m.to_string()).collect();
    let label_refs: Vec<&str> = month_labels.iter().map(String::as_str).collect();
    let categories: BTreeSet<&str> = counts.iter().map(|c| c.category.as_str()).collect();

    let mut totals = vec![0usize; months.len()];
    for c in counts {
        if let Ok(i) = months.binary_search(&c.read_month) {
            totals[i] += c.count;
        }
    }
    let max_y = totals.iter().copied().max().unwrap_or(0) + 1;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(40)
            .build_cartesian_2d((0..months.len().max(1)).into_segmented(), 0..max_y)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(months.len().max(1))
            .x_label_formatter(&|v| segment_label(v, &label_refs))
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .draw()
            .map_err(render_err)?;

        // Height already stacked in each month
        let mut bases = vec![0usize; months.len()];
        for category in &categories {
            let color = palette.color(category);
            let mut bars = Vec::new();
            for c in counts.iter().filter(|c| c.category == *category) {
                let Ok(i) = months.binary_search(&c.read_month) else {
                    continue;
                };
                let mut bar = Rectangle::new(
                    [
                        (SegmentValue::Exact(i), bases[i]),
                        (SegmentValue::Exact(i + 1), bases[i] + c.count),
                    ],
                    color.filled(),
                );
                bar.set_margin(0, 0, 5, 5);
                bars.push(bar);
                bases[i] += c.count;
            }

            chart
                .draw_series(bars)
                .map_err(render_err)?
                .label(*category)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        if !categories.is_empty() {
            chart
                .configure_series_labels()
                .border_style(BLACK)
                .background_style(WHITE.mix(0.8))
                .draw()
                .map_err(render_err)?;
        }

        root.present().map_err(render_err)?;
    }
    Ok(svg)
}

fn segment_label(value: &SegmentValue<usize>, labels: &[&str]) -> String {
    match value {
        SegmentValue::CenterOf(i) => labels.get(*i).map(|l| l.to_string()).unwrap_or_default(),
        _ => String::new(),
    }
}
