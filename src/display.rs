//! 抽出結果・エラーの端末表示

use handtable_common::{ExtractionRecord, TableData, UiError};

const MAX_CELL_WIDTH: usize = 40;

fn cell_width(cell: &str) -> usize {
    cell.chars().count().min(MAX_CELL_WIDTH)
}

fn fit(cell: &str, width: usize) -> String {
    let count = cell.chars().count();
    if count > width {
        let mut s: String = cell.chars().take(width.saturating_sub(1)).collect();
        s.push('…');
        s
    } else {
        format!("{}{}", cell, " ".repeat(width - count))
    }
}

/// 表を罫線付きテキストに整形（1行目をヘッダーとして区切る）
pub fn render_table(table: &TableData) -> String {
    if table.is_empty() {
        return "(空の表)\n".to_string();
    }

    let width = table.width();
    let mut widths = vec![1usize; width];
    for row in table.rows() {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell_width(cell));
        }
    }

    let border: String = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let border = format!("+{}+\n", border);

    let format_row = |row: &[String]| -> String {
        let cells: Vec<String> = table
            .padded(row)
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!(" {} ", fit(cell, *w)))
            .collect();
        format!("|{}|\n", cells.join("|"))
    };

    let mut out = border.clone();
    if let Some(header) = table.header() {
        out.push_str(&format_row(header));
        out.push_str(&border.replace('-', "="));
    }
    for row in table.data_rows() {
        out.push_str(&format_row(row));
    }
    if !table.data_rows().is_empty() {
        out.push_str(&border);
    }
    out
}

/// エラーと（接続エラーなら）対処方法
pub fn render_error(error: &UiError) -> String {
    let mut out = format!("✖ {}\n", error.message);
    let hints = error.troubleshooting_hints();
    if !hints.is_empty() {
        out.push_str("\nトラブルシューティング:\n");
        for hint in hints {
            out.push_str(&format!("  - {}\n", hint));
        }
    }
    out
}

/// 履歴一覧の1行
pub fn render_record(record: &ExtractionRecord) -> String {
    let created = chrono::NaiveDateTime::parse_from_str(&record.created_at, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| record.created_at.clone());
    format!(
        "{}  {}  {} ({}行 x {}列)",
        created,
        record.id,
        record.filename,
        record.extracted_data.rows().len(),
        record.extracted_data.width()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use handtable_common::ProcessingId;

    fn table(rows: &[&[&str]]) -> TableData {
        TableData::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_render_header_and_rows() {
        let out = render_table(&table(&[&["Name", "Age"], &["Alice", "30"]]));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "+-------+-----+");
        assert_eq!(lines[1], "| Name  | Age |");
        assert_eq!(lines[2], "+=======+=====+");
        assert_eq!(lines[3], "| Alice | 30  |");
        assert_eq!(lines[4], "+-------+-----+");
    }

    #[test]
    fn test_render_ragged_rows() {
        let out = render_table(&table(&[&["A", "B", "C"], &["1"]]));
        assert!(out.contains("| 1 |   |   |"));
    }

    #[test]
    fn test_render_empty_table() {
        assert_eq!(render_table(&TableData::default()), "(空の表)\n");
    }

    #[test]
    fn test_long_cell_truncated() {
        let long = "x".repeat(60);
        let out = render_table(&table(&[&[long.as_str()]]));
        assert!(out.contains('…'));
    }

    #[test]
    fn test_render_connectivity_error_has_hints() {
        let err = handtable_common::classify_extraction_failure(
            &handtable_common::TransportError::Unreachable("refused".into()),
        );
        let out = render_error(&err);
        assert!(out.contains("トラブルシューティング"));
        assert!(out.contains("backend server is running"));
    }

    #[test]
    fn test_render_application_error_has_no_hints() {
        let out = render_error(&UiError::application(Some("low confidence".into())));
        assert_eq!(out, "✖ low confidence\n");
    }

    #[test]
    fn test_render_record() {
        let record = ExtractionRecord {
            id: ProcessingId::new("p1"),
            filename: "a.png".into(),
            extracted_data: table(&[&["H1", "H2"], &["v"]]),
            created_at: "2024-05-01T12:34:56.789000".into(),
        };
        assert_eq!(render_record(&record), "2024-05-01 12:34  p1  a.png (2行 x 2列)");
    }
}
