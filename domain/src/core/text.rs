//! Text helpers for the domain layer.

/// Returns `Some(trimmed)` if the text has any non-whitespace content.
///
/// Used wherever "no text supplied" and "empty text supplied" must be treated
/// the same way.
pub fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

/// Collapse whitespace runs (including newlines) into single spaces and cut
/// the result at `max_chars` characters, appending `...` when truncated.
pub fn preview_line(s: &str, max_chars: usize) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = collapsed.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("")), None);
        assert_eq!(non_blank(Some("  \n\t")), None);
        assert_eq!(non_blank(Some("  leaves curling ")), Some("leaves curling"));
    }

    #[test]
    fn test_preview_line_collapses_whitespace() {
        assert_eq!(preview_line("yellow\n  spots\ton leaves", 80), "yellow spots on leaves");
    }

    #[test]
    fn test_preview_line_truncates_on_chars() {
        assert_eq!(preview_line("hello world", 8), "hello...");
        // multibyte characters count once each
        assert_eq!(preview_line("ありがとうございます", 6), "ありが...");
    }

    #[test]
    fn test_preview_line_short_input_unchanged() {
        assert_eq!(preview_line("aphids", 10), "aphids");
        assert_eq!(preview_line("", 10), "");
    }
}
