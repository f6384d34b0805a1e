//! Output formatting for CLI

use console::style;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

/// Backend chosen for one URL
#[derive(Debug, Serialize, Tabled)]
pub struct DetectionRow {
    #[tabled(rename = "URL")]
    pub url: String,
    #[tabled(rename = "Backend")]
    pub backend: String,
}

/// One committed state observed during a simulation
#[derive(Debug, Serialize, Tabled)]
pub struct TransitionRow {
    #[tabled(rename = "#")]
    pub step: usize,
    #[tabled(rename = "At")]
    pub at: String,
    #[tabled(rename = "State")]
    pub state: String,
    #[tabled(rename = "Position")]
    pub position: String,
    #[tabled(rename = "Detail")]
    pub detail: String,
}

/// One event folded through the reducer
#[derive(Debug, Serialize, Tabled)]
pub struct ReplayRow {
    #[tabled(rename = "#")]
    pub step: usize,
    #[tabled(rename = "Event")]
    pub event: String,
    #[tabled(rename = "State")]
    pub state: String,
    #[tabled(rename = "Effects")]
    pub effects: String,
}

/// Print `rows` in the selected format; `text` renders one row as a line
pub fn print_rows<T, F>(rows: &[T], format: &str, text: F) -> anyhow::Result<()>
where
    T: Serialize + Tabled,
    F: Fn(&T) -> String,
{
    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Table => println!("{}", Table::new(rows).with(Style::rounded())),
        OutputFormat::Text => {
            for row in rows {
                println!("{}", text(row));
            }
        }
    }
    Ok(())
}

/// Colour a state name by family
pub fn styled_state(name: &str) -> String {
    if name.starts_with("error/") {
        style(name).red().bold().to_string()
    } else if name == "playing" {
        style(name).green().to_string()
    } else if name.starts_with("hls/") || name.starts_with("dash/") || name.starts_with("native/") {
        style(name).cyan().to_string()
    } else {
        style(name).yellow().to_string()
    }
}

/// Position as `current / duration`, or `-` for states without a timeline
pub fn position(current_time: Option<f64>, duration: Option<f64>) -> String {
    match (current_time, duration) {
        (Some(current), Some(duration)) => format!("{current:.1}s / {duration:.1}s"),
        (None, Some(duration)) => format!("- / {duration:.1}s"),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("table"), OutputFormat::Table);
        assert_eq!(OutputFormat::from("anything"), OutputFormat::Text);
    }

    #[test]
    fn test_position() {
        assert_eq!(position(Some(1.5), Some(60.0)), "1.5s / 60.0s");
        assert_eq!(position(None, Some(60.0)), "- / 60.0s");
        assert_eq!(position(None, None), "-");
    }
}
