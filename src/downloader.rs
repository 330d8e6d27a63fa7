use crate::query::DisplayRow;
use chrono::NaiveDate;

/// Header of the exported table
pub const EXPORT_COLUMNS: [&str; 6] = [
    "BookName",
    "Authors",
    "StartDate",
    "FinishDate",
    "Rating",
    "Category",
];

/// Convert the displayed book table to CSV
///
/// Fields containing commas, quotes or newlines are quoted, with embedded
/// quotes doubled. Missing dates are written as empty fields.
///
/// # Examples
/// ```
/// use bookshelf::downloader::to_csv;
///
/// let csv = to_csv(&[]);
/// assert_eq!(csv, "BookName,Authors,StartDate,FinishDate,Rating,Category\n");
/// ```
pub fn to_csv(rows: &[DisplayRow]) -> String {
    let mut csv_content = EXPORT_COLUMNS.join(",");
    csv_content.push('\n');

    for row in rows {
        let fields = [
            row.book_name.clone(),
            row.authors.clone(),
            format_date(row.start_date),
            format_date(row.finish_date),
            row.rating.to_string(),
            row.category.clone(),
        ];
        for (i, value) in fields.iter().enumerate() {
            if i > 0 {
                csv_content.push(',');
            }
            csv_content.push_str(&escape_csv(value));
        }
        csv_content.push('\n');
    }

    csv_content
}

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Convert the displayed book table to XLSX
///
/// Ratings are written as numbers, everything else as text.
#[cfg(feature = "web")]
pub fn to_xlsx(rows: &[DisplayRow]) -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    use rust_xlsxwriter::{Workbook, Worksheet};

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name("Books")?;

    for (c, header) in EXPORT_COLUMNS.iter().enumerate() {
        worksheet.write_string(0, c as u16, *header)?;
    }

    for (r, row) in rows.iter().enumerate() {
        let line = (r + 1) as u32;
        worksheet.write_string(line, 0, &row.book_name)?;
        worksheet.write_string(line, 1, &row.authors)?;
        worksheet.write_string(line, 2, &format_date(row.start_date))?;
        worksheet.write_string(line, 3, &format_date(row.finish_date))?;
        worksheet.write_number(line, 4, row.rating)?;
        worksheet.write_string(line, 5, &row.category)?;
    }

    workbook.push_worksheet(worksheet);
    workbook.save_to_buffer()
}
