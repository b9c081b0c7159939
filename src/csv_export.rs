use chrono::{NaiveDate, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::io::Write;

use crate::error::Result;
use crate::model::MenuItem;

/// Export columns, in order
pub const CSV_HEADERS: [&str; 5] = ["name", "price", "description", "codigo", "category"];

/// Write `items` as CSV: a bare header row, then one row per item with
/// every field quoted and embedded quotes doubled.
pub fn write_csv<W: Write>(mut writer: W, items: &[MenuItem]) -> Result<()> {
    writeln!(writer, "{}", CSV_HEADERS.join(","))?;

    let mut csv = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);

    for item in items {
        csv.write_record(CSV_HEADERS.iter().map(|column| item.field(column)))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn to_csv(items: &[MenuItem]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, items)?;
    // Every field came from a String, so the output is valid UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// `menu_items_<YYYY-MM-DD>.csv`
pub fn export_filename(date: NaiveDate) -> String {
    format!("menu_items_{}.csv", date.format("%Y-%m-%d"))
}

pub fn default_export_filename() -> String {
    export_filename(Utc::now().date_naive())
}
