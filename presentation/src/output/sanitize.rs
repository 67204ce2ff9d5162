//! Safe rendering of remote markup
//!
//! Explanations and assistant replies come from the service verbatim. Before
//! they reach a terminal, control characters (which could carry escape
//! sequences) are removed and HTML special characters are escaped.

/// Make untrusted markup safe to print.
///
/// Keeps newlines and tabs, drops every other control character, and
/// escapes `&`, `<` and `>`.
pub fn sanitize_markup(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    html_escape::encode_text(&stripped).into_owned()
}

/// Sanitize a single-line value (labels, notes): also folds line breaks.
pub fn sanitize_inline(raw: &str) -> String {
    let folded: String = raw
        .chars()
        .map(|c| if c == '\n' || c == '\t' { ' ' } else { c })
        .collect();
    sanitize_markup(&folded)
}
