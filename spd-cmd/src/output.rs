//! Plain-text tables and CSV export.

use serde::Serialize;
use spd_data::record::{FieldValue, Record};
use spd_data::sort::{Column, SortDirection};
use spd_data::view::TableView;
use std::path::Path;

/// One cell as printed: text as is, numbers with two decimals, `-` for null.
pub fn cell<T: Record>(row: &T, key: &str) -> String {
    match row.field(key) {
        Some(FieldValue::Text(s)) => s.to_string(),
        Some(FieldValue::Number(n)) => format!("{:.2}", n),
        None => "-".to_string(),
    }
}

/// Render `view` as an aligned table followed by a page line.
pub fn render_table<T: Record>(columns: &[Column], view: &TableView<T>) -> String {
    let headers: Vec<String> = columns
        .iter()
        .map(|c| {
            if view.sort.key() != Some(c.key.as_str()) {
                return c.header.clone();
            }
            match view.sort.direction() {
                SortDirection::Ascending => format!("{} ^", c.header),
                SortDirection::Descending => format!("{} v", c.header),
                SortDirection::None => c.header.clone(),
            }
        })
        .collect();
    let cells: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| columns.iter().map(|c| cell(row, &c.key)).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (w, value) in widths.iter_mut().zip(row) {
            *w = (*w).max(value.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    if cells.is_empty() {
        out.push_str("(no rows)\n");
    }
    for row in &cells {
        push_line(&mut out, row, &widths);
    }
    out.push_str(&page_line(view));
    out.push('\n');
    out
}

fn push_line(out: &mut String, values: &[String], widths: &[usize]) {
    let padded: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(v, w)| format!("{:<width$}", v, width = w))
        .collect();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}

pub fn page_line<T>(view: &TableView<T>) -> String {
    let mut line = format!(
        "Page {} of {} ({} rows)",
        view.current_page, view.total_pages, view.total_items
    );
    if view.has_prev_page {
        line.push_str(" [prev]");
    }
    if view.has_next_page {
        line.push_str(" [next]");
    }
    line
}

/// Write `rows` to a CSV file with a header line. Returns the row count.
pub fn write_csv<T: Serialize>(path: impl AsRef<Path>, rows: &[T]) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    log::info!("[SPD] csv: wrote {} rows to {}", rows.len(), path.as_ref().display());
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spd_core::report::DatapointReport;
    use spd_data::sort::SortState;

    fn report(day: &str, energy: Option<f64>) -> DatapointReport {
        DatapointReport {
            total_energy_expected: energy,
            ..DatapointReport::pending(day)
        }
    }

    fn view(rows: Vec<DatapointReport>, sort: SortState) -> TableView<DatapointReport> {
        TableView {
            total_items: rows.len(),
            rows,
            current_page: 1,
            total_pages: 1,
            sort,
            has_next_page: false,
            has_prev_page: false,
        }
    }

    #[test]
    fn test_cell_formats() {
        let row = report("2025-04-01", Some(1234.5));
        assert_eq!(cell(&row, "day"), "2025-04-01");
        assert_eq!(cell(&row, "total_energy_expected"), "1234.50");
        assert_eq!(cell(&row, "total_energy_observed"), "-");
    }

    #[test]
    fn test_render_marks_sorted_column() {
        let columns = vec![
            Column::new("day", "Day"),
            Column::new("total_energy_expected", "Expected"),
        ];
        let rows = vec![report("2025-04-02", Some(900.0)), report("2025-04-01", None)];
        let text = render_table(&columns, &view(rows, SortState::descending("day")));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Day v       Expected");
        assert_eq!(lines[1], "----------  --------");
        assert_eq!(lines[2], "2025-04-02  900.00");
        assert_eq!(lines[3], "2025-04-01  -");
        assert_eq!(lines[4], "Page 1 of 1 (2 rows)");
    }

    #[test]
    fn test_render_empty_view() {
        let columns = vec![Column::new("day", "Day")];
        let text = render_table(&columns, &view(Vec::new(), SortState::unsorted()));
        assert!(text.contains("(no rows)"));
    }

    #[test]
    fn test_write_csv_with_blank_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let rows = vec![report("2025-04-01", Some(1000.0))];

        assert_eq!(write_csv(&path, &rows).unwrap(), 1);
        let written = std::fs::read_to_string(&path).unwrap();
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some("day,total_energy_expected,total_energy_observed,total_irradiation_expected,total_irradiation_observed")
        );
        assert_eq!(lines.next(), Some("2025-04-01,1000.0,,,"));
    }
}
