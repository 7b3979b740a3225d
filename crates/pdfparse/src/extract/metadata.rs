//! Normalization of engine-reported document metadata.

use chrono::{FixedOffset, NaiveDate, TimeZone};

use crate::types::Metadata;

/// Map an engine's key (`/Title`, `CreationDate`, `Pages`, `modDate`, ...) to the
/// normalized key set, or `None` for keys outside it.
pub fn normalize_key(raw: &str) -> Option<&'static str> {
    let key: String = raw
        .trim()
        .trim_start_matches('/')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    Some(match key.as_str() {
        "title" => "title",
        "author" => "author",
        "subject" => "subject",
        "keywords" => "keywords",
        "creator" => "creator",
        "producer" => "producer",
        "creationdate" | "created" => "creation_date",
        "moddate" | "modificationdate" | "modified" => "modification_date",
        "pages" | "pagecount" => "page_count",
        _ => return None,
    })
}

/// Convert a PDF date string (`D:YYYYMMDDHHmmSSOHH'mm'`) to RFC 3339.
///
/// Anything that is not a PDF date is returned trimmed but otherwise untouched.
pub fn normalize_date(raw: &str) -> String {
    parse_pdf_date(raw).unwrap_or_else(|| raw.trim().to_string())
}

fn parse_pdf_date(raw: &str) -> Option<String> {
    let s = raw.trim();
    let (s, prefixed) = match s.strip_prefix("D:") {
        Some(rest) => (rest, true),
        None => (s, false),
    };
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    // Without the `D:` prefix only a full timestamp is taken as a PDF date.
    if digits.len() < 4 || (!prefixed && digits.len() < 14) {
        return None;
    }
    if !matches!(s[digits.len()..].chars().next(), None | Some('Z' | '+' | '-' | '\'')) {
        return None;
    }

    let field = |from: usize, len: usize, default: u32| -> Option<u32> {
        match digits.get(from..from + len) {
            Some(part) => part.parse().ok(),
            None => Some(default),
        }
    };
    let year: i32 = digits[0..4].parse().ok()?;
    let month = field(4, 2, 1)?;
    let day = field(6, 2, 1)?;
    let hour = field(8, 2, 0)?;
    let minute = field(10, 2, 0)?;
    let second = field(12, 2, 0)?;

    let rest = &s[digits.len()..];
    let offset_secs = match rest.chars().next() {
        Some(sign @ ('+' | '-')) => {
            let tz: String = rest[1..].chars().filter(|c| c.is_ascii_digit()).collect();
            let hours: i32 = tz.get(0..2).and_then(|h| h.parse().ok()).unwrap_or(0);
            let minutes: i32 = tz.get(2..4).and_then(|m| m.parse().ok()).unwrap_or(0);
            let secs = hours * 3600 + minutes * 60;
            if sign == '-' {
                -secs
            } else {
                secs
            }
        }
        _ => 0,
    };

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    let offset = FixedOffset::east_opt(offset_secs)?;
    let dt = offset.from_local_datetime(&naive).single()?;
    Some(dt.to_rfc3339())
}

/// Build normalized metadata from raw pairs.
///
/// Empty values are dropped. When a key appears more than once the first
/// non-empty value wins. `page_count` comes from the engine's own count when
/// it reports one, else from `pages_seen`.
pub fn normalize(raw: &[(String, String)], pages_seen: usize) -> Metadata {
    let page_count = raw
        .iter()
        .filter(|(k, _)| normalize_key(k) == Some("page_count"))
        .find_map(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(pages_seen);

    let mut metadata = Metadata::new();
    for (key, value) in raw {
        let Some(key) = normalize_key(key) else {
            continue;
        };
        if key == "page_count" {
            continue;
        }
        let value = value.trim();
        if value.is_empty() || metadata.contains_key(key) {
            continue;
        }
        let value = match key {
            "creation_date" | "modification_date" => normalize_date(value),
            _ => value.to_string(),
        };
        metadata.insert(key.to_string(), value);
    }
    metadata.insert("page_count".to_string(), page_count.to_string());
    metadata
}

/// Decode a PDF text string: UTF-16BE with BOM, UTF-8 with BOM, else PDFDocEncoding
/// (treated as Latin-1).
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xfe, 0xff]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xef, 0xbb, 0xbf]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_keys() {
        assert_eq!(normalize_key("/Title"), Some("title"));
        assert_eq!(normalize_key("CreationDate"), Some("creation_date"));
        assert_eq!(normalize_key("ModDate"), Some("modification_date"));
        assert_eq!(normalize_key("Pages"), Some("page_count"));
        assert_eq!(normalize_key("Page size"), None);
        assert_eq!(normalize_key("Trapped"), None);
    }

    #[test]
    fn test_pdf_dates() {
        assert_eq!(
            normalize_date("D:20240102030405+01'00'"),
            "2024-01-02T03:04:05+01:00"
        );
        assert_eq!(normalize_date("D:20240102030405Z"), "2024-01-02T03:04:05+00:00");
        assert_eq!(normalize_date("D:2024"), "2024-01-01T00:00:00+00:00");
        assert_eq!(
            normalize_date("2024-01-02T03:04:05-05:00"),
            "2024-01-02T03:04:05-05:00"
        );
        assert_eq!(normalize_date(" yesterday "), "yesterday");
    }

    #[test]
    fn test_normalize_drops_empty_and_unknown() {
        let metadata = normalize(
            &pairs(&[
                ("/Title", "Report"),
                ("/Author", "  "),
                ("/Trapped", "False"),
                ("Pages", "5"),
            ]),
            1,
        );
        assert_eq!(metadata.get("title").map(String::as_str), Some("Report"));
        assert!(!metadata.contains_key("author"));
        assert!(!metadata.contains_key("trapped"));
        assert_eq!(metadata.get("page_count").map(String::as_str), Some("5"));
    }

    #[test]
    fn test_page_count_falls_back_to_pages_seen() {
        let metadata = normalize(&pairs(&[("/Title", "")]), 3);
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata.get("page_count").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_decode_pdf_string() {
        assert_eq!(decode_pdf_string(b"plain"), "plain");
        assert_eq!(
            decode_pdf_string(&[0xfe, 0xff, 0x00, 0x48, 0x00, 0xe9]),
            "Hé"
        );
        assert_eq!(decode_pdf_string(&[0x63, 0x61, 0x66, 0xe9]), "café");
    }
}
