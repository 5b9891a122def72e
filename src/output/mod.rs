pub mod report;
pub mod terminal;

use colored::Colorize;

use crate::filters::FilterPanel;
use crate::render::{RowContent, StudentCard};

pub use terminal::TerminalSurface;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// Plain-text card: name line, pills, then one indented line per row value.
/// Stacked values continue on further lines under the same row.
pub fn format_card(card: &StudentCard) -> Vec<String> {
    let mut out = Vec::new();
    let mut title = card.name.bold().to_string();
    if let Some(phonetic) = card.phonetic_name.as_deref() {
        title.push_str(&format!(" ({})", phonetic.italic()));
    }
    out.push(title);
    if !card.pills.is_empty() {
        out.push(format!(
            "  {}",
            card.pills
                .iter()
                .map(|p| format!("[{}]", p.text()).cyan().to_string())
                .collect::<Vec<_>>()
                .join(" ")
        ));
    }
    for row in card.rows.iter() {
        let label = format!("{:<12}", row.key.replace('_', " "));
        match &row.content {
            RowContent::Text { value } => {
                if row.key == "leave" {
                    out.push(format!("  {} {}", label.dimmed(), value.yellow()));
                } else {
                    out.push(format!("  {} {}", label.dimmed(), value));
                }
            }
            RowContent::Link { href, text } => {
                out.push(format!(
                    "  {} {} {}",
                    label.dimmed(),
                    text.blue().underline(),
                    format!("<{href}>").dimmed()
                ));
            }
            RowContent::Lines { lines } => {
                let mut lines = lines.iter();
                if let Some(first) = lines.next() {
                    out.push(format!("  {} {}", label.dimmed(), first));
                }
                for line in lines {
                    out.push(format!("  {:<12} {}", "", line));
                }
            }
        }
    }
    out
}

pub fn render_text(cards: &[StudentCard]) -> Vec<u8> {
    let mut out = String::new();
    for card in cards {
        for line in format_card(card) {
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render_json(cards: &[StudentCard]) -> Vec<u8> {
    serde_json::to_vec_pretty(cards).unwrap_or_else(|_| b"[]\n".to_vec())
}

pub fn render_html(cards: &[StudentCard], base_url: &str) -> Vec<u8> {
    report::render_html(cards, base_url)
}

pub fn render(format: OutputFormat, cards: &[StudentCard], base_url: &str) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(cards),
        OutputFormat::Json => render_json(cards),
        OutputFormat::Html => render_html(cards, base_url),
    }
}

/// Checkbox sidebar as text. Collapsed sections show only their header.
pub fn format_panel(panel: &FilterPanel) -> Vec<String> {
    let mut out = Vec::new();
    for section in panel.sections() {
        let marker = if section.is_collapsed() { "+" } else { "-" };
        out.push(format!("{} {}", marker, section.category().bold()));
        if section.is_collapsed() {
            continue;
        }
        out.push(format!("    {} all", checkbox(section.all_checked())));
        for option in section.options() {
            out.push(format!("    {} {}", checkbox(option.checked), option.name));
        }
    }
    out
}

fn checkbox(checked: bool) -> String {
    if checked {
        "[x]".green().to_string()
    } else {
        "[ ]".to_string()
    }
}
