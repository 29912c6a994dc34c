use itertools::Itertools;

use crate::catalog::Artwork;
use crate::utils;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".csv") {
        return Some(OutputFormat::Csv);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

pub fn render(format: OutputFormat, records: &[Artwork]) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(records),
        OutputFormat::Json => render_json(records),
        OutputFormat::Csv => render_csv(records),
    }
}

pub fn render_text(records: &[Artwork]) -> Vec<u8> {
    let mut out = String::new();
    for r in records {
        out.push_str(&format!(
            "{}  {}\n",
            r.id,
            utils::display_or_na(r.title.as_deref())
        ));
    }
    out.into_bytes()
}

/// Same shape as the state file.
pub fn render_json(records: &[Artwork]) -> Vec<u8> {
    serde_json::to_vec_pretty(records).unwrap_or_else(|_| b"[]\n".to_vec())
}

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn render_csv(records: &[Artwork]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str("id,title,place_of_origin,artist_display,inscriptions,date_start,date_end\n");
    for r in records {
        let fields = [
            r.id.to_string(),
            escape_csv(r.title.as_deref().unwrap_or_default()),
            escape_csv(r.place_of_origin.as_deref().unwrap_or_default()),
            escape_csv(r.artist_display.as_deref().unwrap_or_default()),
            escape_csv(r.inscriptions.as_deref().unwrap_or_default()),
            r.date_start.map(|y| y.to_string()).unwrap_or_default(),
            r.date_end.map(|y| y.to_string()).unwrap_or_default(),
        ];
        out.push_str(&fields.iter().join(","));
        out.push('\n');
    }
    out.into_bytes()
}
