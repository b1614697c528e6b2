//! Server-rendered pages: the overview and the classification result.

use std::fmt::Write;

use crate::models::humanize_label;

/// Escape text for HTML element and attribute content.
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

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2em auto;padding:0 1em}\
.bar{background:#4a7bd0;color:#fff;padding:2px 6px;margin:2px 0;white-space:nowrap}\
.label{display:inline-block;padding:4px 8px;margin:3px;border-radius:4px;background:#eee}\
.label.on{background:#2e9d4f;color:#fff}\
input[type=text]{width:70%;padding:6px}";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        STYLE,
        body
    )
}

fn query_form(query: &str) -> String {
    format!(
        "<form action=\"/go\" method=\"get\">\n\
         <input type=\"text\" name=\"query\" placeholder=\"Enter a message to classify\" value=\"{}\">\n\
         <button type=\"submit\">Classify Message</button>\n</form>",
        escape(query)
    )
}

/// Overview: query form, genre distribution and label frequencies.
pub fn render_index(genres: &[(String, usize)], labels: &[(String, u64)]) -> String {
    let mut body = String::new();
    body.push_str("<h1>Disaster Response Project</h1>\n");
    body.push_str(&query_form(""));

    let total: usize = genres.iter().map(|(_, c)| c).sum();
    body.push_str("\n<h2>Distribution of Message Genres</h2>\n");
    for (genre, count) in genres {
        let width = if total > 0 { count * 100 / total } else { 0 };
        let _ = writeln!(
            body,
            "<div class=\"bar\" style=\"width:{}%\">{} ({})</div>",
            width.max(1),
            escape(genre),
            count
        );
    }

    let max = labels.iter().map(|(_, c)| *c).max().unwrap_or(0);
    body.push_str("<h2>Distribution of Message Categories</h2>\n");
    for (label, count) in labels {
        let width = if max > 0 { count * 100 / max } else { 0 };
        let _ = writeln!(
            body,
            "<div class=\"bar\" style=\"width:{}%\">{} ({})</div>",
            width.max(1),
            escape(&humanize_label(label)),
            count
        );
    }

    page("Disasters", &body)
}

/// Result page: every label, highlighted when predicted.
///
/// A blank query renders the form with a prompt instead of results.
pub fn render_go(query: &str, classification: &[(String, bool)]) -> String {
    let mut body = String::new();
    body.push_str("<h1>Disaster Response Project</h1>\n");
    body.push_str(&query_form(query));
    if query.trim().is_empty() {
        body.push_str("\n<p>Enter a message to classify.</p>");
        return page("Disasters", &body);
    }
    let _ = writeln!(body, "\n<h2>Result</h2>\n<p>MESSAGE: {}</p>", escape(query));

    body.push_str("<div>\n");
    for (label, on) in classification {
        let _ = writeln!(
            body,
            "<span class=\"label{}\">{}</span>",
            if *on { " on" } else { "" },
            escape(&humanize_label(label))
        );
    }
    body.push_str("</div>");

    page("Disasters", &body)
}
