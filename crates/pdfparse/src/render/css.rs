//! CSS lengths, generated page rules and head injection.

use crate::types::{ConversionOptions, Margins};

/// Convert a CSS length to PostScript points. A bare number is taken as points.
pub fn length_to_pt(length: &str) -> Option<f64> {
    let s = length.trim().to_lowercase();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let value: f64 = number.parse().ok()?;
    let factor = match unit.trim() {
        "" | "pt" => 1.0,
        "in" => 72.0,
        "cm" => 72.0 / 2.54,
        "mm" => 72.0 / 25.4,
        "px" => 0.75,
        "pc" => 12.0,
        _ => return None,
    };
    let pt = value * factor;
    (pt.is_finite() && pt >= 0.0).then_some(pt)
}

pub fn length_to_mm(length: &str) -> Option<f64> {
    length_to_pt(length).map(|pt| pt / 72.0 * 25.4)
}

/// Reject margins no renderer could interpret.
pub fn validate_margins(margins: &Margins) -> Result<(), String> {
    for (side, value) in margins.sides() {
        if length_to_pt(value).is_none() {
            return Err(format!("invalid {} margin '{}'", side, value));
        }
    }
    Ok(())
}

/// `@page` rule carrying page size and margins.
pub fn page_rule(options: &ConversionOptions) -> String {
    let m = &options.margins;
    format!(
        "@page {{ size: {}; margin: {} {} {} {}; }}\n",
        options.page_size.css_value(),
        m.top,
        m.right,
        m.bottom,
        m.left
    )
}

/// Page rule plus any extra CSS, as one stylesheet.
pub fn stylesheet(options: &ConversionOptions) -> String {
    let mut css = page_rule(options);
    if let Some(extra) = &options.extra_css {
        css.push_str(extra);
        css.push('\n');
    }
    css
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

pub fn base_tag(url: &str) -> String {
    format!("<base href=\"{}\">", escape_attr(url))
}

pub fn style_tag(css: &str) -> String {
    format!("<style>\n{}</style>", css)
}

/// Insert `fragment` at the start of the document head.
///
/// Fragments without `<html>`/`<head>` are wrapped into a full document.
pub fn inject_head(html: &str, fragment: &str) -> String {
    let lower = html.to_ascii_lowercase();

    if let Some(pos) = find_tag(&lower, "<head") {
        if let Some(close) = lower[pos..].find('>') {
            let at = pos + close + 1;
            return format!("{}{}{}", &html[..at], fragment, &html[at..]);
        }
    }

    if let Some(pos) = find_tag(&lower, "<html") {
        if let Some(close) = lower[pos..].find('>') {
            let at = pos + close + 1;
            return format!("{}<head>{}</head>{}", &html[..at], fragment, &html[at..]);
        }
    }

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">{}</head><body>\n{}\n</body></html>",
        fragment, html
    )
}

/// Position of an opening tag, not matching longer names like `<header>`.
fn find_tag(lower: &str, tag: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = lower[from..].find(tag) {
        let pos = from + rel;
        match lower[pos + tag.len()..].chars().next() {
            Some(c) if c == '>' || c.is_whitespace() => return Some(pos),
            _ => from = pos + tag.len(),
        }
    }
    None
}
