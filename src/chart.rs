//! Declarative chart descriptors.
//!
//! A [`ChartSpec`] names the mark, the fields mapped to each channel, the
//! tooltip and any click selection, and carries its data rows inline. The
//! dashboard page and the `/api/dashboard` route hand these to the browser;
//! the `graph` module draws the same tables as SVG.

use crate::derive::{CategoryShare, CumulativePoint, MonthCategoryCount};
use serde::Serialize;
use serde_json::{Value, json};

/// Color given to bars outside the current selection
pub const UNSELECTED_COLOR: &str = "lightgray";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Arc,
    Line,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Nominal,
    Ordinal,
    Quantitative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortOrder {
    #[serde(rename = "ascending")]
    Ascending,
    /// Largest Y value first
    #[serde(rename = "-y")]
    ByYDescending,
}

/// A data field bound to a positional channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldEncoding {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortOrder>,
}

impl FieldEncoding {
    pub fn new(field: &str, field_type: FieldType) -> Self {
        Self {
            field: field.to_string(),
            field_type,
            title: None,
            sort: None,
        }
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorEncoding {
    pub field: String,
    pub legend: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tooltip {
    pub field: String,
    pub title: String,
}

impl Tooltip {
    pub fn new(field: &str, title: &str) -> Self {
        Self {
            field: field.to_string(),
            title: title.to_string(),
        }
    }
}

/// Click-to-highlight selection on a field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub name: String,
    pub fields: Vec<String>,
    /// Value currently selected, if any
    pub selected: Option<String>,
    pub unselected_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub mark: Mark,
    /// Draw point markers on line marks
    pub point: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<FieldEncoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<FieldEncoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theta: Option<FieldEncoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorEncoding>,
    pub tooltip: Vec<Tooltip>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
    pub interactive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub data: Vec<Value>,
}

impl ChartSpec {
    fn new(id: &str, title: &str, mark: Mark) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            mark,
            point: false,
            x: None,
            y: None,
            theta: None,
            color: None,
            tooltip: Vec::new(),
            selection: None,
            interactive: false,
            height: None,
            data: Vec::new(),
        }
    }
}

/// Donut of each category's share of all books
pub fn category_share_chart(shares: &[CategoryShare]) -> ChartSpec {
    let mut chart = ChartSpec::new("category_share", "Books by Category (%)", Mark::Arc);
    chart.theta = Some(FieldEncoding::new("Percentage", FieldType::Quantitative));
    chart.color = Some(ColorEncoding {
        field: "Category".to_string(),
        legend: false,
    });
    chart.tooltip = vec![
        Tooltip::new("Category", "Category"),
        Tooltip::new("Percentage", "Percentage"),
    ];
    chart.data = shares
        .iter()
        .map(|s| json!({"Category": s.category, "Count": s.count, "Percentage": s.percentage}))
        .collect();
    chart
}

/// One line per category of the running total over months
pub fn cumulative_chart(series: &[CumulativePoint]) -> ChartSpec {
    let mut chart = ChartSpec::new(
        "cumulative",
        "Cumulative Count by Category over Months",
        Mark::Line,
    );
    chart.point = true;
    chart.x = Some(FieldEncoding::new("ReadYearMonth", FieldType::Ordinal).titled("Month-Year Read"));
    chart.y = Some(
        FieldEncoding::new("CumulativeCount", FieldType::Quantitative).titled("Cumulative Count"),
    );
    chart.color = Some(ColorEncoding {
        field: "Category".to_string(),
        legend: true,
    });
    chart.tooltip = vec![
        Tooltip::new("Category", "Category"),
        Tooltip::new("ReadYearMonth", "Month"),
        Tooltip::new("CumulativeCount", "Cumulative No. of Books"),
    ];
    chart.interactive = true;
    chart.height = Some(500);
    chart.data = series
        .iter()
        .map(|p| {
            json!({
                "ReadYearMonth": p.read_month.to_string(),
                "Category": p.category,
                "CumulativeCount": p.cumulative_count,
            })
        })
        .collect();
    chart
}

/// Bars per category; clicking a bar highlights it and greys the others
pub fn category_count_chart(counts: &[(String, usize)], selected: Option<&str>) -> ChartSpec {
    let mut chart = ChartSpec::new("by_category", "Books by Category", Mark::Bar);
    chart.x = Some(FieldEncoding::new("Category", FieldType::Nominal).sorted(SortOrder::ByYDescending));
    chart.y = Some(FieldEncoding::new("Count", FieldType::Quantitative).titled("No. of Books"));
    chart.color = Some(ColorEncoding {
        field: "Category".to_string(),
        legend: true,
    });
    chart.tooltip = vec![
        Tooltip::new("Category", "Category"),
        Tooltip::new("Count", "Number of Books"),
    ];
    chart.selection = Some(Selection {
        name: "click".to_string(),
        fields: vec!["Category".to_string()],
        selected: selected.map(str::to_string),
        unselected_color: UNSELECTED_COLOR.to_string(),
    });
    chart.data = counts
        .iter()
        .map(|(category, count)| {
            json!({
                "Category": category,
                "Count": count,
                "Highlighted": selected.is_none_or(|s| s == category.as_str()),
            })
        })
        .collect();
    chart
}

/// Bars per month, stacked by category
pub fn monthly_chart(counts: &[MonthCategoryCount]) -> ChartSpec {
    let mut chart = ChartSpec::new("by_month", "Books by Month", Mark::Bar);
    chart.x = Some(FieldEncoding::new("ReadYearMonth", FieldType::Ordinal).titled("Month-Year Read"));
    chart.y = Some(FieldEncoding::new("Count", FieldType::Quantitative).titled("No. of Books"));
    chart.color = Some(ColorEncoding {
        field: "Category".to_string(),
        legend: true,
    });
    chart.tooltip = vec![
        Tooltip::new("Category", "Category"),
        Tooltip::new("ReadYearMonth", "Month"),
        Tooltip::new("Count", "Number of Books"),
    ];
    chart.data = counts
        .iter()
        .map(|c| {
            json!({
                "ReadYearMonth": c.read_month.to_string(),
                "Category": c.category,
                "Count": c.count,
            })
        })
        .collect();
    chart
}

/// Bars per author string, for the books left after the category filter
pub fn author_chart(counts: &[(String, usize)], category: &str) -> ChartSpec {
    let title = if crate::query::is_all(category) {
        "Books by Author(s)".to_string()
    } else {
        format!("Books by Author(s): {}", category)
    };
    let mut chart = ChartSpec::new("by_author", &title, Mark::Bar);
    chart.x = Some(FieldEncoding::new("Authors", FieldType::Nominal).sorted(SortOrder::ByYDescending));
    chart.y = Some(FieldEncoding::new("Count", FieldType::Quantitative).titled("No. of Books"));
    chart.tooltip = vec![
        Tooltip::new("Authors", "Authors"),
        Tooltip::new("Count", "Number of Books"),
    ];
    chart.interactive = true;
    chart.data = counts
        .iter()
        .map(|(authors, count)| json!({"Authors": authors, "Count": count}))
        .collect();
    chart
}
