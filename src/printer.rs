//! Result rendering for the REPL.
//!
//! Rows come out as an ASCII table whose columns follow schema field order:
//!
//! ```text
//! +-------+---------------+------------+
//! | id    | name          | in_date    |
//! +-------+---------------+------------+
//! | 12345 | Chen Xiaoyuan | 2022-06-05 |
//! +-------+---------------+------------+
//! 1 row in set
//! ```
//!
//! Integers are right-aligned, everything else left-aligned. Cells wider
//! than [`MAX_COLUMN_WIDTH`] are truncated with `...`.

use crate::error::Error;
use crate::storage::Row;
use crate::value::Value;

pub const MAX_COLUMN_WIDTH: usize = 50;

pub struct TableFormatter {
    headers: Vec<String>,
    widths: Vec<usize>,
    rows: Vec<Vec<Cell>>,
}

struct Cell {
    text: String,
    right_aligned: bool,
}

impl TableFormatter {
    /// Lays `rows` out under `headers`; a field missing from a row renders
    /// as an empty cell.
    pub fn new(headers: &[&str], rows: &[Row]) -> Self {
        let mut widths: Vec<usize> = headers
            .iter()
            .map(|h| h.chars().count().clamp(1, MAX_COLUMN_WIDTH))
            .collect();

        let rows: Vec<Vec<Cell>> = rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .enumerate()
                    .map(|(i, field)| {
                        let cell = Cell::of(row.get(*field));
                        widths[i] = widths[i].max(cell.text.chars().count()).min(MAX_COLUMN_WIDTH);
                        cell
                    })
                    .collect()
            })
            .collect();

        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            widths,
            rows,
        }
    }

    pub fn render(&self) -> String {
        let mut output = String::new();

        self.write_separator(&mut output);
        self.write_header_row(&mut output);
        self.write_separator(&mut output);
        for row in &self.rows {
            self.write_data_row(&mut output, row);
        }
        self.write_separator(&mut output);

        output
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn write_separator(&self, output: &mut String) {
        output.push('+');
        for width in &self.widths {
            output.push_str(&"-".repeat(width + 2));
            output.push('+');
        }
        output.push('\n');
    }

    fn write_header_row(&self, output: &mut String) {
        output.push('|');
        for (header, width) in self.headers.iter().zip(&self.widths) {
            output.push_str(&format!(" {:<width$} |", truncate(header, *width)));
        }
        output.push('\n');
    }

    fn write_data_row(&self, output: &mut String, row: &[Cell]) {
        output.push('|');
        for (cell, width) in row.iter().zip(&self.widths) {
            let text = truncate(&cell.text, *width);
            if cell.right_aligned {
                output.push_str(&format!(" {text:>width$} |"));
            } else {
                output.push_str(&format!(" {text:<width$} |"));
            }
        }
        output.push('\n');
    }
}

impl Cell {
    fn of(value: Option<&Value>) -> Self {
        Self {
            text: value.map(Value::to_string).unwrap_or_default(),
            right_aligned: value.and_then(Value::as_int).is_some(),
        }
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Renders rows as a table followed by a row count, or `Empty set`.
pub fn render_rows(fields: &[&str], rows: &[Row]) -> String {
    if rows.is_empty() {
        return "Empty set".to_string();
    }
    let formatter = TableFormatter::new(fields, rows);
    let count = formatter.row_count();
    format!(
        "{}{} row{} in set",
        formatter.render(),
        count,
        if count == 1 { "" } else { "s" }
    )
}

/// `[0x102002] DataDuplicateEntry: ...`
pub fn format_error(err: &Error) -> String {
    format!("[{}] {}: {}", err.code(), err.kind(), err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn employee(id: i64, name: &str) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), Value::Int(id));
        row.insert("name".into(), Value::Text(name.into()));
        row.insert(
            "in_date".into(),
            Value::Date(NaiveDate::from_ymd_opt(2022, 6, 5).unwrap()),
        );
        row
    }

    #[test]
    fn test_render_table() {
        let rows = vec![employee(12345, "Chen Xiaoyuan"), employee(7, "Li")];
        let rendered = render_rows(&["id", "name", "in_date"], &rows);
        let expected = "\
+-------+---------------+------------+
| id    | name          | in_date    |
+-------+---------------+------------+
| 12345 | Chen Xiaoyuan | 2022-06-05 |
|     7 | Li            | 2022-06-05 |
+-------+---------------+------------+
2 rows in set";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_single_row_and_empty_set() {
        let rendered = render_rows(&["id"], &[employee(1, "A")]);
        assert!(rendered.ends_with("\n1 row in set"));
        assert_eq!(render_rows(&["id"], &[]), "Empty set");
    }

    #[test]
    fn test_columns_follow_given_order() {
        let rendered = render_rows(&["name", "id"], &[employee(1, "A")]);
        let header = rendered.lines().nth(1).unwrap();
        assert_eq!(header, "| name | id |");
    }

    #[test]
    fn test_long_cells_are_truncated() {
        let long = "x".repeat(80);
        let formatter = TableFormatter::new(&["name"], &[employee(1, &long)]);
        let rendered = formatter.render();
        let line = rendered.lines().nth(3).unwrap();
        assert_eq!(line.chars().count(), MAX_COLUMN_WIDTH + 4);
        assert!(line.contains("..."));
    }

    #[test]
    fn test_format_error() {
        let err = Error::CommandNotFound("drop".into());
        assert_eq!(
            format_error(&err),
            format!("[{}] CommandNotFound: {}", err.code(), err)
        );
    }
}
