use crate::byte_scan::{find_tag_markers, matches_case_insensitive_tag};
use crate::config::EngineConfig;
use memchr::memchr;
use serde::Serialize;
use std::ops::Range;

/// How far past a `<` the tag-name compare may skip whitespace.
const TAG_NAME_LOOKAHEAD: usize = 16;

/// The located `<html>...</html>` span. `closed == false` means the open
/// tag was found but no close tag exists in the suffix window — a common
/// shape for truncated responses and sloppy scam kits, and a signal the
/// caller surfaces as critical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HtmlRange {
    pub range: Range<usize>,
    pub closed: bool,
}

/// Locate the HTML document span inside a response body.
///
/// Only the first `html_probe_window` bytes are scanned forward for a
/// case-insensitive `<html` open tag, and only the last window backward
/// for `</html` — multi-megabyte bodies are never walked end to end.
/// Partial tags straddling the window edge are accepted misses; the window
/// is a deliberate bound, not a correctness guarantee.
///
/// Returns None when no open tag exists in the prefix window, which the
/// caller must treat as "no HTML structure at all".
pub fn extract_html_range(body: &[u8], config: &EngineConfig) -> Option<HtmlRange> {
    let window = config.html_probe_window;

    let prefix_end = window.min(body.len());
    let open_pos = find_tag_markers(body, 0..prefix_end, b'<')
        .into_iter()
        .find(|&off| matches_case_insensitive_tag(body, off, b"html", TAG_NAME_LOOKAHEAD))?;

    let suffix_start = body.len().saturating_sub(window).max(open_pos);
    let close_pos = find_tag_markers(body, suffix_start..body.len(), b'<')
        .into_iter()
        .filter(|&off| {
            off + 1 < body.len()
                && body[off + 1] == b'/'
                && matches_case_insensitive_tag(body, off + 1, b"html", TAG_NAME_LOOKAHEAD)
        })
        .last();

    match close_pos {
        Some(close) => {
            let end = close_tag_end(body, close, config.tag_scan_cap);
            Some(HtmlRange {
                range: open_pos..end,
                closed: true,
            })
        }
        None => {
            log::debug!("open <html> at {} without a closing tag in the suffix window", open_pos);
            Some(HtmlRange {
                range: open_pos..body.len(),
                closed: false,
            })
        }
    }
}

/// Byte just past the `>` of the tag starting at `tag_start`; falls back to
/// the buffer end when no `>` turns up within the scan cap.
fn close_tag_end(body: &[u8], tag_start: usize, cap: usize) -> usize {
    let limit = tag_start.saturating_add(cap).min(body.len());
    match memchr(b'>', &body[tag_start..limit]) {
        Some(i) => tag_start + i + 1,
        None => body.len(),
    }
}

/// All offsets inside `range` where the named tag opens, e.g. `<script`
/// (case-insensitive). Callers pass an already-bounded range — this never
/// re-scans the whole document per tag type.
pub fn find_tag_occurrences(body: &[u8], range: Range<usize>, tag: &[u8]) -> Vec<usize> {
    find_tag_markers(body, range, b'<')
        .into_iter()
        .filter(|&off| matches_case_insensitive_tag(body, off, tag, TAG_NAME_LOOKAHEAD))
        .collect()
}

/// First occurrence of the named tag inside `range`, if any.
pub fn first_tag_occurrence(body: &[u8], range: Range<usize>, tag: &[u8]) -> Option<usize> {
    find_tag_markers(body, range, b'<')
        .into_iter()
        .find(|&off| matches_case_insensitive_tag(body, off, tag, TAG_NAME_LOOKAHEAD))
}

/// First `</tag` occurrence inside `range`, if any.
pub fn first_closing_tag(body: &[u8], range: Range<usize>, tag: &[u8]) -> Option<usize> {
    find_tag_markers(body, range, b'<')
        .into_iter()
        .find(|&off| {
            off + 1 < body.len()
                && body[off + 1] == b'/'
                && matches_case_insensitive_tag(body, off + 1, tag, TAG_NAME_LOOKAHEAD)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_document_is_byte_exact() {
        let body = b"<html><head></head><body>hi</body></html>";
        let config = EngineConfig::default();

        let html = extract_html_range(body, &config).unwrap();
        assert!(html.closed);
        assert_eq!(html.range, 0..body.len());
    }

    #[test]
    fn test_missing_close_tag_extends_to_end() {
        let body = b"<html><body>truncated response";
        let config = EngineConfig::default();

        let html = extract_html_range(body, &config).unwrap();
        assert!(!html.closed);
        assert_eq!(html.range, 0..body.len());
    }

    #[test]
    fn test_no_open_tag_is_none() {
        let config = EngineConfig::default();
        assert!(extract_html_range(b"just some text, no markup", &config).is_none());
        assert!(extract_html_range(b"", &config).is_none());
    }

    #[test]
    fn test_open_tag_outside_prefix_window_is_missed() {
        let mut body = vec![b' '; 600];
        body.extend_from_slice(b"<html></html>");
        let config = EngineConfig::default();
        // documented window tradeoff: a late open tag does not count
        assert!(extract_html_range(&body, &config).is_none());
    }

    #[test]
    fn test_case_insensitive_and_leading_content() {
        let body = b"<!doctype html>\n<HTML lang=\"en\"><body>x</body></HtMl  >";
        let config = EngineConfig::default();

        let html = extract_html_range(body, &config).unwrap();
        assert!(html.closed);
        let open = body.iter().position(|&b| b == b'H').unwrap() - 1;
        assert_eq!(html.range.start, open);
        assert_eq!(html.range.end, body.len());
    }

    #[test]
    fn test_first_open_tag_in_window_wins() {
        let body = b"<html><html><body>x</body></html>";
        let config = EngineConfig::default();

        let html = extract_html_range(body, &config).unwrap();
        assert_eq!(html.range.start, 0);
    }

    #[test]
    fn test_find_tag_occurrences_bounded() {
        let body = b"<script>a</script><div><script src='x'>";
        let occurrences = find_tag_occurrences(body, 0..body.len(), b"script");
        assert_eq!(occurrences, vec![0, 23]);

        // a narrower range sees only what falls inside it
        let occurrences = find_tag_occurrences(body, 0..10, b"script");
        assert_eq!(occurrences, vec![0]);
    }
}
