//! Byte-window search primitives shared by the boundary and script
//! extractors. Everything here works on `&[u8]`: fetched bodies are
//! attacker-controlled and may be invalid UTF-8 or carry null/control
//! bytes, so boundary detection never goes through `str`.

use memchr::memchr_iter;
use std::ops::Range;

pub fn is_tag_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn fold(b: u8) -> u8 {
    // ASCII case fold; pattern bytes are tag names, letters only
    b | 0x20
}

/// Every index in `range` where `buf[i] == marker`. Empty or out-of-bounds
/// ranges produce an empty result rather than an error.
pub fn find_tag_markers(buf: &[u8], range: Range<usize>, marker: u8) -> Vec<usize> {
    let start = range.start.min(buf.len());
    let end = range.end.min(buf.len());
    if start >= end {
        return Vec::new();
    }
    memchr_iter(marker, &buf[start..end])
        .map(|i| i + start)
        .collect()
}

/// Case-insensitive compare of `pattern` against the bytes following
/// `offset` (the position of a `<`), skipping leading whitespace up to
/// `lookahead` bytes. Returns false when not enough bytes remain.
pub fn matches_case_insensitive_tag(
    buf: &[u8],
    offset: usize,
    pattern: &[u8],
    lookahead: usize,
) -> bool {
    let mut i = offset + 1;
    let skip_limit = (offset + 1).saturating_add(lookahead).min(buf.len());
    while i < skip_limit && is_tag_whitespace(buf[i]) {
        i += 1;
    }
    if i + pattern.len() > buf.len() {
        return false;
    }
    pattern
        .iter()
        .zip(&buf[i..i + pattern.len()])
        .all(|(&p, &b)| fold(p) == fold(b))
}

/// Bounded lookahead used to cheaply reject non-candidates before any
/// expensive work: skip whitespace from `from`, then `pattern` must match
/// at the very first non-whitespace byte. The scan never walks past
/// content looking for a later match.
pub fn find_first_byte_match(buf: &[u8], from: usize, pattern: &[u8], max_scan: usize) -> bool {
    let limit = from.saturating_add(max_scan).min(buf.len());
    let mut i = from;
    while i < limit && is_tag_whitespace(buf[i]) {
        i += 1;
    }
    if i + pattern.len() > buf.len() || i >= limit {
        return false;
    }
    pattern
        .iter()
        .zip(&buf[i..i + pattern.len()])
        .all(|(&p, &b)| fold(p) == fold(b))
}

/// Longest run of printable ASCII (0x20..=0x7E) in the buffer, with its
/// byte offsets. None when the buffer has no printable byte at all.
pub fn longest_printable_ascii_run(buf: &[u8]) -> Option<(Range<usize>, &[u8])> {
    let mut best: Option<Range<usize>> = None;
    let mut run_start: Option<usize> = None;

    for (i, &b) in buf.iter().enumerate() {
        if (0x20..=0x7E).contains(&b) {
            if run_start.is_none() {
                run_start = Some(i);
            }
        } else if let Some(start) = run_start.take() {
            if best.as_ref().map_or(true, |r| i - start > r.len()) {
                best = Some(start..i);
            }
        }
    }
    if let Some(start) = run_start {
        if best.as_ref().map_or(true, |r| buf.len() - start > r.len()) {
            best = Some(start..buf.len());
        }
    }

    best.map(|r| (r.clone(), &buf[r]))
}
