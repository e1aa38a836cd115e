use serde::{Deserialize, Serialize};
use tripdesk_core::Booking;

const HEADERS: [&str; 7] = ["ID", "Name", "Email", "Place", "Date", "People", "Price"];
const REPORT_ROWS_PER_PAGE: usize = 50;
const REPORT_WIDTHS: [usize; 7] = [6, 24, 30, 16, 10, 6, 12];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma separated values, opens in any spreadsheet.
    #[serde(alias = "spreadsheet", alias = "excel")]
    Csv,
    /// Fixed-width text split into printable pages.
    #[serde(alias = "pdf")]
    Report,
}

#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub format: ExportFormat,
    pub file_name: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("Export buffer failed: {0}")]
    Buffer(String),
}

fn record(b: &Booking) -> [String; 7] {
    [
        b.id.to_string(),
        b.name.clone(),
        b.email.clone(),
        b.place_name.clone(),
        b.travel_date.format("%Y-%m-%d").to_string(),
        b.people.to_string(),
        b.price.to_string(),
    ]
}

/// Materializes `rows` as a document. Reads only; nothing is reordered or dropped.
pub fn export(rows: &[&Booking], format: ExportFormat) -> Result<ExportDocument, ExportError> {
    match format {
        ExportFormat::Csv => Ok(ExportDocument {
            format,
            file_name: "bookings.csv",
            content_type: "text/csv; charset=utf-8",
            bytes: to_csv(rows)?,
        }),
        ExportFormat::Report => Ok(ExportDocument {
            format,
            file_name: "bookings-report.txt",
            content_type: "text/plain; charset=utf-8",
            bytes: to_report(rows).into_bytes(),
        }),
    }
}

fn to_csv(rows: &[&Booking]) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(HEADERS)?;
    for b in rows {
        wtr.write_record(record(b))?;
    }
    wtr.into_inner().map_err(|e| ExportError::Buffer(e.to_string()))
}

fn fit(value: &str, width: usize) -> String {
    let clipped: String = value.chars().take(width).collect();
    format!("{:<width$}", clipped, width = width)
}

fn report_line(cells: &[String; 7]) -> String {
    cells
        .iter()
        .zip(REPORT_WIDTHS)
        .map(|(cell, w)| fit(cell, w))
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end()
        .to_string()
}

fn to_report(rows: &[&Booking]) -> String {
    let header = report_line(&HEADERS.map(String::from));
    let rule = "-".repeat(header.len());
    let chunks: Vec<&[&Booking]> = if rows.is_empty() {
        vec![rows]
    } else {
        rows.chunks(REPORT_ROWS_PER_PAGE).collect()
    };
    let pages = chunks.len();

    let mut out = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 {
            out.push('\u{c}');
        }
        out.push_str(&format!("Bookings Report ({} bookings)\n\n", rows.len()));
        out.push_str(&header);
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
        if chunk.is_empty() {
            out.push_str("No bookings\n");
        }
        for b in chunk.iter() {
            let mut cells = record(b);
            cells[6] = format!("{:.2}", b.price);
            out.push_str(&report_line(&cells));
            out.push('\n');
        }
        out.push_str(&format!("\nPage {} of {}\n", i + 1, pages));
    }
    out
}
