use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => render_table(serde_json::to_value(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

fn options() -> table::TableOptions {
    let prefs = ui::prefs();
    table::TableOptions {
        max_width: prefs.term_width,
        color: prefs.table_color,
    }
}

/// Arrays become one row per item; an object wrapping a single array (the
/// usual `{"articles": [...]}` response) is unwrapped first; other objects
/// render as key/value pairs.
fn render_table(value: Value) -> anyhow::Result<String> {
    match value {
        Value::Array(items) => Ok(render_rows(&items)),
        Value::Object(map) => {
            let mut arrays = map.values().filter(|v| v.is_array());
            if let (Some(Value::Array(items)), None, 1) = (arrays.next(), arrays.next(), map.len()) {
                return Ok(render_rows(items));
            }
            let rows = map
                .iter()
                .map(|(key, value)| vec![key.clone(), cell(value)])
                .collect::<Vec<_>>();
            Ok(table::render_table(&["key", "value"], &rows, options()))
        }
        scalar => Ok(cell(&scalar)),
    }
}

fn render_rows(items: &[Value]) -> String {
    if items.is_empty() {
        return String::from("(no rows)");
    }
    if !items.iter().all(Value::is_object) {
        let rows = items.iter().map(|item| vec![cell(item)]).collect::<Vec<_>>();
        return table::render_table(&["value"], &rows, options());
    }

    // Columns follow the first item's field order; later items may add more.
    let mut headers: Vec<String> = Vec::new();
    for map in items.iter().filter_map(Value::as_object) {
        for key in map.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    let header_refs = headers.iter().map(String::as_str).collect::<Vec<_>>();
    let rows = items
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            headers
                .iter()
                .map(|header| map.get(header).map_or_else(|| String::from("-"), cell))
                .collect()
        })
        .collect::<Vec<_>>();
    table::render_table(&header_refs, &rows, options())
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::String(text) => text.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;
    use serde_json::json;

    use super::render;
    use crate::cli::OutputFormat;

    #[derive(Serialize)]
    struct Example {
        id: i64,
        status: &'static str,
    }

    #[test]
    fn json_render_is_valid_json() {
        let out = render(&Example { id: 7, status: "screening" }, OutputFormat::Json)
            .expect("json render should work");
        let parsed: serde_json::Value = serde_json::from_str(&out).expect("json should parse");
        assert_eq!(parsed["id"], 7);
    }

    #[test]
    fn raw_render_is_single_line_json() {
        let out = render(&Example { id: 7, status: "screening" }, OutputFormat::Raw)
            .expect("raw render should work");
        assert!(!out.contains('\n'));
    }

    #[test]
    fn table_render_for_object_is_key_value() {
        let out = render(&Example { id: 7, status: "screening" }, OutputFormat::Table)
            .expect("table render should work");
        assert!(out.lines().next().is_some_and(|line| line.contains("key")));
        assert!(out.contains("status"));
    }

    #[test]
    fn wrapped_list_renders_one_row_per_item() {
        let value = json!({
            "articles": [
                {"id": 1, "title": "First", "authors": ["Smith, J", "Doe, A"]},
                {"id": 2, "title": "Second", "authors": []},
            ]
        });
        let out = render(&value, OutputFormat::Table).expect("table render should work");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("title"));
        assert!(lines[2].contains("Smith, J; Doe, A"));
    }
}
