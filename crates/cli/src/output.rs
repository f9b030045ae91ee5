//! Output formatting for CLI

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::json;

use cloudnet_common::RunSummary;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// JSON document, the form automation engines read
    #[default]
    Json,
    /// Human-readable table format
    Table,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

impl TableDisplay for RunSummary {
    fn headers() -> Vec<&'static str> {
        vec!["Changed", "ID", "Name", "Display Name"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.changed.to_string(),
            self.id.clone().unwrap_or_default(),
            self.name.clone().unwrap_or_default(),
            self.display_name.clone().unwrap_or_default(),
        ]
    }
}

/// Render a single item
pub fn render_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(T::headers());
            table.add_row(item.row());

            table.to_string()
        }
        OutputFormat::Json => serde_json::to_string(item).unwrap_or_default(),
        OutputFormat::Plain => T::headers()
            .iter()
            .zip(item.row())
            .map(|(header, value)| format!("{}: {}", header, value))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Render a fatal failure; carries no changed summary
pub fn render_failure(message: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json!({"failed": true, "msg": message}).to_string(),
        _ => format!("❌ {}", message),
    }
}

/// Print the run summary to stdout
pub fn print_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) {
    println!("{}", render_item(item, format));
}

/// Print a failure; JSON goes to stdout for the calling engine, text to stderr
pub fn print_failure(message: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", render_failure(message, format)),
        _ => eprintln!("{}", render_failure(message, format)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        RunSummary {
            changed: true,
            id: Some("n1".to_string()),
            name: Some("net".to_string()),
            display_name: None,
        }
    }

    #[test]
    fn test_json_summary() {
        let rendered = render_item(&summary(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value, json!({"changed": true, "id": "n1", "name": "net"}));
    }

    #[test]
    fn test_plain_summary() {
        let rendered = render_item(&summary(), OutputFormat::Plain);
        assert!(rendered.contains("Changed: true"));
        assert!(rendered.contains("ID: n1"));
    }

    #[test]
    fn test_failure_has_no_changed_field() {
        let rendered = render_failure("Failed: 'quota exceeded' (job j1)", OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["failed"], json!(true));
        assert!(value["msg"].as_str().unwrap().contains("quota exceeded"));
        assert!(value.get("changed").is_none());
    }
}
