use std::collections::HashSet;

pub fn parse_id_list_csv(value: &str) -> Result<Vec<i64>, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("id list is empty".to_string());
    }
    let mut out: Vec<i64> = Vec::new();
    let mut seen: HashSet<i64> = HashSet::new();
    for part in raw.split(',') {
        let item = part.trim();
        if item.is_empty() {
            continue;
        }
        let id: i64 = item
            .parse()
            .map_err(|_| format!("invalid record id '{item}'"))?;
        if seen.insert(id) {
            out.push(id);
        }
    }
    if out.is_empty() {
        return Err("id list is empty".to_string());
    }
    Ok(out)
}

/// Nullable display fields render as "N/A", like the catalog's own UI.
pub fn display_or_na(value: Option<&str>) -> &str {
    match value {
        Some(value) if !value.trim().is_empty() => value,
        _ => "N/A",
    }
}

pub fn display_year(value: Option<i32>) -> String {
    match value {
        Some(year) => year.to_string(),
        None => "N/A".to_string(),
    }
}

pub fn truncate_cell(value: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for (i, c) in value.chars().enumerate() {
        if i == max_chars {
            out.push('…');
            return out;
        }
        out.push(c);
    }
    out
}
