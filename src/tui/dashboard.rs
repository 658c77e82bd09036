//! Dashboard utilities — cell formatting for the tables.

/// Characters of payload shown before truncation.
const PREVIEW_CHARS: usize = 27;

/// Format a byte count for human display.
pub fn format_bytes(bytes: usize) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

/// One-line preview of a payload: lossy UTF-8, control characters blanked,
/// long values cut with "...".
pub fn payload_preview(payload: &[u8]) -> String {
    let text = String::from_utf8_lossy(payload);
    let mut chars = text.chars().map(|c| if c.is_control() { ' ' } else { c });
    let preview: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{preview}...")
    } else {
        preview
    }
}

/// Record key for display; `-` when the record has none.
pub fn format_key(key: Option<&[u8]>) -> String {
    match key {
        Some(k) if !k.is_empty() => payload_preview(k),
        _ => "-".to_string(),
    }
}

/// "Harness host1 host2" title line.
pub fn header_line(brokers: &[String]) -> String {
    if brokers.is_empty() {
        "Harness".to_string()
    } else {
        format!("Harness {}", brokers.join(" "))
    }
}
