//! HTML fragment rendering.
//!
//! The dashboard UI lives elsewhere; this crate only hands it self-contained
//! fragments: highlighted chat lines and small report tables. Everything
//! user-controlled passes through `escape()`.

use crate::chat::classifier::Span;

/// Minimal HTML entity escaping for text nodes and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a chat line with matched spans highlighted.
///
/// `spans` must be sorted by start and non-overlapping (the classifier
/// guarantees both). Out-of-bounds spans are skipped rather than panicking:
/// a bad span loses a highlight, not the dashboard.
pub fn highlight_spans(text: &str, spans: &[Span]) -> String {
    let mut out = String::with_capacity(text.len() + spans.len() * 32);
    let mut cursor = 0;

    for span in spans {
        if span.start < cursor || span.end > text.len() {
            continue;
        }
        if !text.is_char_boundary(span.start) || !text.is_char_boundary(span.end) {
            continue;
        }
        out.push_str(&escape(&text[cursor..span.start]));
        out.push_str(&format!(
            "<span class=\"hl hl-{}\" title=\"{}\">{}</span>",
            span.category.as_str(),
            escape(span.rule),
            escape(&text[span.start..span.end])
        ));
        cursor = span.end;
    }
    out.push_str(&escape(&text[cursor..]));
    out
}

/// A `<dl>` fragment from label/value pairs, used by the report builders.
pub fn definition_list(pairs: &[(&str, String)]) -> String {
    let mut out = String::from("<dl class=\"report\">");
    for (label, value) in pairs {
        out.push_str(&format!("<dt>{}</dt><dd>{}</dd>", escape(label), escape(value)));
    }
    out.push_str("</dl>");
    out
}

/// A small `<table>` fragment with a header row.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::from("<table class=\"report\"><thead><tr>");
    for h in headers {
        out.push_str(&format!("<th>{}</th>", escape(h)));
    }
    out.push_str("</tr></thead><tbody>");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            out.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::rules::Category;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a < b & c > \"d\""), "a &lt; b &amp; c &gt; &quot;d&quot;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_highlight_spans() {
        let spans = vec![Span {
            start: 8,
            end: 13,
            category: Category::Insult,
            rule: "en.insult.mild",
            weight: 1.0,
        }];
        let html = highlight_spans("you are idiot & proud", &spans);
        assert_eq!(
            html,
            "you are <span class=\"hl hl-insult\" title=\"en.insult.mild\">idiot</span> &amp; proud"
        );
    }

    #[test]
    fn test_highlight_skips_bad_spans() {
        let spans = vec![Span {
            start: 2,
            end: 99,
            category: Category::Spam,
            rule: "x",
            weight: 1.0,
        }];
        assert_eq!(highlight_spans("short", &spans), "short");
    }

    #[test]
    fn test_table_escapes_cells() {
        let html = table(&["user"], &[vec!["<script>".to_string()]]);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
