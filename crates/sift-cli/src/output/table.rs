const MIN_WIDTH: usize = 4;
const GAP: &str = "  ";

#[derive(Clone, Copy, Debug)]
pub struct TableOptions {
    pub max_width: Option<usize>,
    pub color: bool,
}

/// Render an aligned table. Columns shrink, widest first, until the table
/// fits `max_width`; numeric cells are right-aligned.
#[must_use]
pub fn render_table(headers: &[&str], rows: &[Vec<String>], options: TableOptions) -> String {
    let mut widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .chain([header.chars().count(), MIN_WIDTH])
                .max()
                .unwrap_or(MIN_WIDTH)
        })
        .collect();
    if let Some(max_width) = options.max_width {
        shrink_to_fit(&mut widths, headers, max_width);
    }

    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| pad(&clip(header, *width), *width, false))
        .collect::<Vec<_>>()
        .join(GAP);
    let mut lines = vec![
        header_line.clone(),
        "-".repeat(header_line.chars().count()),
    ];

    for row in rows {
        let cells = widths
            .iter()
            .enumerate()
            .map(|(col, width)| {
                let text = clip(row.get(col).map_or("-", String::as_str), *width);
                let padded = pad(&text, *width, is_numeric(&text));
                if options.color {
                    paint(&text, padded)
                } else {
                    padded
                }
            })
            .collect::<Vec<_>>();
        lines.push(cells.join(GAP));
    }
    lines.join("\n")
}

fn shrink_to_fit(widths: &mut [usize], headers: &[&str], max_width: usize) {
    let total = |widths: &[usize]| widths.iter().sum::<usize>() + GAP.len() * widths.len().saturating_sub(1);
    while total(widths) > max_width {
        let widest = widths
            .iter()
            .enumerate()
            .filter(|(col, width)| **width > headers[*col].chars().count().max(MIN_WIDTH))
            .max_by_key(|(_, width)| **width)
            .map(|(col, _)| col);
        let Some(col) = widest else {
            break;
        };
        widths[col] -= 1;
    }
}

fn clip(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn pad(value: &str, width: usize, right_align: bool) -> String {
    if right_align {
        format!("{value:>width$}")
    } else {
        format!("{value:<width$}")
    }
}

fn is_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok()
}

/// Colour workflow status words; `padded` keeps its alignment.
fn paint(text: &str, padded: String) -> String {
    let code = match text {
        "included" | "include" | "completed" => "32",
        "uncertain" | "pending" | "screening" | "awaiting_full_text" | "full_text_retrieved" => "33",
        "excluded" | "exclude" | "error" => "31",
        _ => return padded,
    };
    padded.replacen(text, &format!("\u{1b}[{code}m{text}\u{1b}[0m"), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> TableOptions {
        TableOptions {
            max_width: None,
            color: false,
        }
    }

    #[test]
    fn columns_align_across_rows() {
        let rows = vec![
            vec!["1".to_string(), "screening".to_string()],
            vec!["120".to_string(), "excluded".to_string()],
        ];
        let table = render_table(&["id", "status"], &rows, plain());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[2].starts_with("   1"));
        assert!(lines[3].starts_with(" 120"));
        assert_eq!(lines[2].find("screening"), lines[3].find("excluded"));
    }

    #[test]
    fn wide_columns_are_clipped_to_terminal() {
        let rows = vec![vec!["1".to_string(), "x".repeat(80)]];
        let table = render_table(
            &["id", "title"],
            &rows,
            TableOptions {
                max_width: Some(40),
                color: false,
            },
        );
        assert!(table.lines().all(|line| line.chars().count() <= 40));
        assert!(table.contains('…'));
    }

    #[test]
    fn status_words_are_coloured() {
        let rows = vec![vec!["included".to_string()]];
        let table = render_table(
            &["status"],
            &rows,
            TableOptions {
                max_width: None,
                color: true,
            },
        );
        assert!(table.contains("\u{1b}[32mincluded\u{1b}[0m"));
    }
}
