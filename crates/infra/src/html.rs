//! HTML escaping and plain-text extraction shared by emails and pages.

use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_safe};

/// Escape text for element content.
pub fn escape(text: &str) -> String {
    encode_safe(text).into_owned()
}

/// Escape a value placed inside a double-quoted attribute such as `href`.
pub fn escape_attribute(value: &str) -> String {
    encode_double_quoted_attribute(value).into_owned()
}

fn unescape(text: &str) -> String {
    decode_html_entities(&text.replace("&nbsp;", " ")).into_owned()
}

const BLOCK_TAGS: &[&str] = &["p", "br", "div", "h1", "h2", "h3", "h4", "li", "tr", "table", "title"];

fn tag_name(tag: &str) -> &str {
    tag.trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("")
}

fn href(tag: &str) -> Option<&str> {
    let start = tag.find("href=\"")? + "href=\"".len();
    let len = tag[start..].find('"')?;
    Some(&tag[start..start + len])
}

/// Plain-text rendition of an HTML body.
///
/// Block elements become line breaks, links render as `label [url]`, the
/// `<head>` is dropped and runs of blank lines collapse to one.
pub fn to_text(html: &str) -> String {
    let mut text = String::new();
    let mut rest = html;
    let mut in_head = false;
    let mut pending_href: Option<String> = None;

    while let Some(open) = rest.find('<') {
        if !in_head {
            text.push_str(&unescape(&rest[..open]));
        }
        let Some(close) = rest[open..].find('>') else {
            rest = "";
            break;
        };
        let tag = &rest[open + 1..open + close];
        rest = &rest[open + close + 1..];

        let name = tag_name(tag).to_ascii_lowercase();
        let closing = tag.starts_with('/');
        match name.as_str() {
            "head" => in_head = !closing,
            "a" if !closing => pending_href = href(tag).map(str::to_string),
            "a" => {
                if let Some(url) = pending_href.take() {
                    text.push_str(&format!(" [{url}]"));
                }
            }
            n if BLOCK_TAGS.contains(&n) => text.push('\n'),
            _ => {}
        }
    }
    if !in_head {
        text.push_str(&unescape(rest));
    }

    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() && lines.last().is_none_or(|l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}
