//! Literal substring search over extracted page text.
//!
//! Offsets and context windows are measured in characters of the original
//! page text, so they stay meaningful when case folding changes a
//! character's length.

use crate::types::{PageText, SearchMatch};

/// Characters of context kept on each side of a match.
pub const CONTEXT_CHARS: usize = 50;

/// Find every non-overlapping occurrence of `query`, page by page.
///
/// Results are ordered by page, then by offset. An empty query matches nothing;
/// callers reject it before extracting.
pub fn search_pages(pages: &[PageText], query: &str, case_sensitive: bool) -> Vec<SearchMatch> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle: Vec<char> = fold(query, case_sensitive).into_iter().map(|(c, _)| c).collect();
    pages
        .iter()
        .flat_map(|page| search_page(page, &needle, case_sensitive))
        .collect()
}

/// Fold `text` into comparable chars, each tagged with its source char index.
fn fold(text: &str, case_sensitive: bool) -> Vec<(char, usize)> {
    let mut out = Vec::with_capacity(text.len());
    for (idx, c) in text.chars().enumerate() {
        if case_sensitive {
            out.push((c, idx));
        } else {
            out.extend(c.to_lowercase().map(|l| (l, idx)));
        }
    }
    out
}

fn search_page(page: &PageText, needle: &[char], case_sensitive: bool) -> Vec<SearchMatch> {
    let chars: Vec<char> = page.text.chars().collect();
    let folded = fold(&page.text, case_sensitive);
    let n = needle.len();
    let mut matches = Vec::new();

    let mut i = 0;
    while n > 0 && i + n <= folded.len() {
        let window = &folded[i..i + n];
        let starts_clean = i == 0 || folded[i - 1].1 != folded[i].1;
        let ends_clean = i + n == folded.len() || folded[i + n].1 != folded[i + n - 1].1;

        if starts_clean && ends_clean && window.iter().map(|(c, _)| c).eq(needle.iter()) {
            let start = folded[i].1;
            let end = folded[i + n - 1].1 + 1;
            matches.push(SearchMatch {
                page: page.page,
                offset: start,
                matched: chars[start..end].iter().collect(),
                before: chars[start.saturating_sub(CONTEXT_CHARS)..start]
                    .iter()
                    .collect(),
                after: chars[end..(end + CONTEXT_CHARS).min(chars.len())]
                    .iter()
                    .collect(),
            });
            i += n;
        } else {
            i += 1;
        }
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<PageText> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| PageText {
                page: i as u32 + 1,
                text: t.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_matches_across_pages_in_order() {
        let doc = pages(&["alpha beta", "beta gamma", "delta"]);
        let found = search_pages(&doc, "beta", false);
        assert_eq!(found.len(), 2);
        assert_eq!((found[0].page, found[0].offset), (1, 6));
        assert_eq!((found[1].page, found[1].offset), (2, 0));
        assert_eq!(found[0].before, "alpha ");
        assert_eq!(found[1].after, " gamma");
    }

    #[test]
    fn test_case_folding() {
        let doc = pages(&["Beta BETA beta"]);
        assert_eq!(search_pages(&doc, "beta", false).len(), 3);
        let exact = search_pages(&doc, "beta", true);
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].offset, 10);
        let found = search_pages(&doc, "BETA", false);
        assert_eq!(found[0].matched, "Beta");
    }

    #[test]
    fn test_non_overlapping() {
        let doc = pages(&["aaaa"]);
        let found = search_pages(&doc, "aa", true);
        assert_eq!(found.iter().map(|m| m.offset).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_context_window_truncated_at_boundaries() {
        let text = format!("{}needle{}", "x".repeat(80), "y".repeat(10));
        let doc = pages(&[&text]);
        let found = search_pages(&doc, "needle", true);
        assert_eq!(found[0].before.chars().count(), CONTEXT_CHARS);
        assert_eq!(found[0].after, "y".repeat(10));
        assert_eq!(found[0].offset, 80);
    }

    #[test]
    fn test_offsets_are_characters() {
        let doc = pages(&["héllo wörld"]);
        let found = search_pages(&doc, "WÖRLD", false);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].offset, 6);
        assert_eq!(found[0].matched, "wörld");
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let doc = pages(&["cost is $5.00 (approx)"]);
        assert_eq!(search_pages(&doc, "$5.00 (", true).len(), 1);
        assert!(search_pages(&doc, "5.0.", true).is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        assert!(search_pages(&pages(&["abc"]), "", false).is_empty());
        assert!(search_pages(&pages(&[""]), "a", false).is_empty());
        assert!(search_pages(&[], "a", false).is_empty());
    }
}
