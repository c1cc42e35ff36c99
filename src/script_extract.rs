use crate::byte_scan::is_tag_whitespace;
use crate::config::EngineConfig;
use crate::html_bounds::{find_tag_occurrences, first_closing_tag, first_tag_occurrence, HtmlRange};
use memchr::{memchr, memmem};
use serde::Serialize;

/// Where a script's source content comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScriptOrigin {
    Relative,
    ProtocolRelative,
    DataUri,
    HttpExternal,
    HttpsExternal,
    Inline,
    Malformed,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScriptContext {
    InHead,
    InBody,
    Unknown,
}

/// One detected `<script>` occurrence. Targets reference the shared body
/// buffer by offset only — the buffer is never copied per target.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptScanTarget {
    pub start: usize,
    pub end: Option<usize>,
    pub origin: ScriptOrigin,
    pub context: ScriptContext,
    pub src: Option<String>,
    pub nonce: Option<String>,
    pub integrity: Option<String>,
    pub self_closing: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScriptExtraction {
    pub scripts: Vec<ScriptScanTarget>,
    /// Offsets of `<meta http-equiv="refresh">` tags within the HTML range.
    pub meta_refresh: Vec<usize>,
}

enum AttrParse {
    Missing,
    Malformed,
    Value(String),
}

/// One forward scan of the HTML range for `<script>` and meta-refresh tags.
/// Each target walks found-open-tag → classified-origin → located-attributes
/// → located-close-tag with no backtracking; a target whose attribute syntax
/// cannot be parsed is terminal at `Malformed` and gets no deeper inspection.
pub fn extract(body: &[u8], html: &HtmlRange, config: &EngineConfig) -> ScriptExtraction {
    let range = html.range.clone();
    let head_pos = first_tag_occurrence(body, range.clone(), b"head");
    let body_pos = first_tag_occurrence(body, range.clone(), b"body");

    let scripts = find_tag_occurrences(body, range.clone(), b"script")
        .into_iter()
        .map(|start| classify_script(body, start, head_pos, body_pos, config))
        .collect();

    let meta_refresh = find_tag_occurrences(body, range, b"meta")
        .into_iter()
        .filter(|&start| is_meta_refresh(body, start, config))
        .collect();

    ScriptExtraction {
        scripts,
        meta_refresh,
    }
}

fn classify_script(
    body: &[u8],
    start: usize,
    head_pos: Option<usize>,
    body_pos: Option<usize>,
    config: &EngineConfig,
) -> ScriptScanTarget {
    let context = script_context(start, head_pos, body_pos);

    let attr_start = tag_name_end(body, start, b"script".len());
    let gt = match find_tag_close(body, attr_start, config.tag_scan_cap) {
        Some(gt) => gt,
        None => {
            // no closing '>' within the cap, or a quote that never ends
            log::debug!("unparseable <script> tag at offset {}", start);
            return ScriptScanTarget {
                start,
                end: None,
                origin: ScriptOrigin::Malformed,
                context,
                src: None,
                nonce: None,
                integrity: None,
                self_closing: false,
            };
        }
    };

    let region = &body[attr_start..gt];
    let self_closing = region
        .iter()
        .rev()
        .find(|&&b| !is_tag_whitespace(b))
        .map_or(false, |&b| b == b'/');

    let src_attr = find_attr(region, b"src");
    if matches!(&src_attr, AttrParse::Malformed) {
        return ScriptScanTarget {
            start,
            end: None,
            origin: ScriptOrigin::Malformed,
            context,
            src: None,
            nonce: None,
            integrity: None,
            self_closing,
        };
    }

    let src = match src_attr {
        AttrParse::Value(v) => Some(v),
        _ => None,
    };
    let origin = classify_origin(src.as_deref());

    let nonce = match find_attr(region, b"nonce") {
        AttrParse::Value(v) => Some(v),
        _ => None,
    };
    let integrity = match find_attr(region, b"integrity") {
        AttrParse::Value(v) => Some(v),
        _ => None,
    };

    let open_end = gt + 1;
    let end = if self_closing || origin != ScriptOrigin::Inline {
        // sourced and self-closing tags carry no body worth a close scan
        Some(open_end)
    } else {
        find_inline_close(body, open_end, config)
    };

    ScriptScanTarget {
        start,
        end,
        origin,
        context,
        src,
        nonce,
        integrity,
        self_closing,
    }
}

fn script_context(
    start: usize,
    head_pos: Option<usize>,
    body_pos: Option<usize>,
) -> ScriptContext {
    if let Some(bp) = body_pos {
        if start >= bp {
            return ScriptContext::InBody;
        }
    }
    if let Some(hp) = head_pos {
        if start >= hp {
            return ScriptContext::InHead;
        }
    }
    ScriptContext::Unknown
}

fn classify_origin(src: Option<&str>) -> ScriptOrigin {
    let src = match src {
        Some(s) => s.trim(),
        None => return ScriptOrigin::Inline,
    };
    if src.is_empty() {
        return ScriptOrigin::Unknown;
    }
    let lowered = src.to_ascii_lowercase();
    if lowered.starts_with("https://") {
        ScriptOrigin::HttpsExternal
    } else if lowered.starts_with("http://") {
        ScriptOrigin::HttpExternal
    } else if lowered.starts_with("//") {
        ScriptOrigin::ProtocolRelative
    } else if lowered.starts_with("data:") {
        ScriptOrigin::DataUri
    } else {
        ScriptOrigin::Relative
    }
}

/// Byte just past the whitespace-skipped tag name following `<`.
fn tag_name_end(body: &[u8], lt: usize, name_len: usize) -> usize {
    let mut i = lt + 1;
    while i < body.len() && is_tag_whitespace(body[i]) {
        i += 1;
    }
    (i + name_len).min(body.len())
}

/// Position of the `>` ending the open tag, honoring quoted attribute
/// values. None when the cap runs out first or a quote never terminates.
fn find_tag_close(body: &[u8], from: usize, cap: usize) -> Option<usize> {
    let limit = from.saturating_add(cap).min(body.len());
    let mut quote: Option<u8> = None;
    for i in from..limit {
        let b = body[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return Some(i),
                _ => {}
            },
        }
    }
    None
}

/// Bounded attribute lookup within one tag's attribute region.
fn find_attr(region: &[u8], name: &[u8]) -> AttrParse {
    let lower: Vec<u8> = region.iter().map(|b| b.to_ascii_lowercase()).collect();

    for pos in memmem::find_iter(&lower, name) {
        // word boundaries on both sides, else "src" matches inside "srcset"
        if pos == 0 || !is_tag_whitespace(lower[pos - 1]) {
            continue;
        }
        let mut j = pos + name.len();
        if j < region.len() && !is_tag_whitespace(region[j]) && region[j] != b'=' {
            continue;
        }
        while j < region.len() && is_tag_whitespace(region[j]) {
            j += 1;
        }
        if j >= region.len() || region[j] != b'=' {
            return AttrParse::Malformed;
        }
        j += 1;
        while j < region.len() && is_tag_whitespace(region[j]) {
            j += 1;
        }
        if j >= region.len() {
            return AttrParse::Malformed;
        }

        let b = region[j];
        if b == b'"' || b == b'\'' {
            return match memchr(b, &region[j + 1..]) {
                Some(k) => {
                    AttrParse::Value(String::from_utf8_lossy(&region[j + 1..j + 1 + k]).into_owned())
                }
                None => AttrParse::Malformed,
            };
        }

        // unquoted value runs to the next whitespace
        let mut k = j;
        while k < region.len() && !is_tag_whitespace(region[k]) {
            k += 1;
        }
        // a value reaching the region end may have swallowed the self-closing slash
        let mut end = k;
        if end == region.len() && end > j + 1 && region[end - 1] == b'/' {
            end -= 1;
        }
        return AttrParse::Value(String::from_utf8_lossy(&region[j..end]).into_owned());
    }

    AttrParse::Missing
}

/// Bounded forward scan for the `</script>` closing an inline script.
/// Returns the byte just past its `>`, or None when the cap runs out.
fn find_inline_close(body: &[u8], from: usize, config: &EngineConfig) -> Option<usize> {
    let limit = from
        .saturating_add(config.script_close_scan_cap)
        .min(body.len());
    let close = first_closing_tag(body, from..limit, b"script")?;
    let gt_limit = close.saturating_add(config.tag_scan_cap).min(body.len());
    memchr(b'>', &body[close..gt_limit]).map(|i| close + i + 1)
}

fn is_meta_refresh(body: &[u8], start: usize, config: &EngineConfig) -> bool {
    let attr_start = tag_name_end(body, start, b"meta".len());
    let gt = match find_tag_close(body, attr_start, config.tag_scan_cap) {
        Some(gt) => gt,
        None => return false,
    };
    let lower: Vec<u8> = body[attr_start..gt]
        .iter()
        .map(|b| b.to_ascii_lowercase())
        .collect();
    memmem::find(&lower, b"http-equiv").is_some() && memmem::find(&lower, b"refresh").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html_bounds::extract_html_range;

    fn scan(body: &[u8]) -> ScriptExtraction {
        let config = EngineConfig::default();
        let html = extract_html_range(body, &config).expect("test body has <html>");
        extract(body, &html, &config)
    }

    #[test]
    fn test_inline_script_with_close_tag() {
        let body = b"<html><head><script>var x = 1;</script></head><body></body></html>";
        let result = scan(body);

        assert_eq!(result.scripts.len(), 1);
        let target = &result.scripts[0];
        assert_eq!(target.origin, ScriptOrigin::Inline);
        assert_eq!(target.context, ScriptContext::InHead);
        assert!(target.src.is_none());

        let text = std::str::from_utf8(body).unwrap();
        let close = text.find("</script>").unwrap() + "</script>".len();
        assert_eq!(target.end, Some(close));
        assert!(target.start < target.end.unwrap());
    }

    #[test]
    fn test_external_origins() {
        let body = b"<html><body>\
            <script src=\"https://cdn.example.com/a.js\"></script>\
            <script src=\"http://cdn.example.com/b.js\"></script>\
            <script src=\"//cdn.example.com/c.js\"></script>\
            <script src=\"/static/d.js\"></script>\
            <script src=\"data:text/javascript;base64,YWxlcnQoMSk=\"></script>\
            </body></html>";
        let result = scan(body);

        let origins: Vec<ScriptOrigin> = result.scripts.iter().map(|s| s.origin).collect();
        assert_eq!(
            origins,
            vec![
                ScriptOrigin::HttpsExternal,
                ScriptOrigin::HttpExternal,
                ScriptOrigin::ProtocolRelative,
                ScriptOrigin::Relative,
                ScriptOrigin::DataUri,
            ]
        );
        assert!(result
            .scripts
            .iter()
            .all(|s| s.context == ScriptContext::InBody));
        assert_eq!(
            result.scripts[0].src.as_deref(),
            Some("https://cdn.example.com/a.js")
        );
    }

    #[test]
    fn test_empty_src_is_unknown() {
        let body = b"<html><body><script src=\"\"></script></body></html>";
        let result = scan(body);
        assert_eq!(result.scripts[0].origin, ScriptOrigin::Unknown);
    }

    #[test]
    fn test_nonce_and_integrity_attributes() {
        let body = b"<html><head><script nonce=\"r4nd0m\" integrity=\"sha384-abc123\" \
            src=\"https://cdn.example.com/a.js\"></script></head><body></body></html>";
        let result = scan(body);

        let target = &result.scripts[0];
        assert_eq!(target.nonce.as_deref(), Some("r4nd0m"));
        assert_eq!(target.integrity.as_deref(), Some("sha384-abc123"));
        assert_eq!(target.origin, ScriptOrigin::HttpsExternal);
    }

    #[test]
    fn test_unquoted_src_value() {
        let body = b"<html><body><script src=https://cdn.example.com/a.js></script></body></html>";
        let result = scan(body);
        assert_eq!(result.scripts[0].origin, ScriptOrigin::HttpsExternal);
        assert_eq!(
            result.scripts[0].src.as_deref(),
            Some("https://cdn.example.com/a.js")
        );
    }

    #[test]
    fn test_unterminated_quote_is_malformed() {
        let body = b"<html><body><script src=\"broken></body></html>";
        let result = scan(body);

        let target = &result.scripts[0];
        assert_eq!(target.origin, ScriptOrigin::Malformed);
        assert!(target.end.is_none());
        assert!(target.src.is_none());
    }

    #[test]
    fn test_self_closing_tag() {
        let body = b"<html><body><script src=\"/a.js\" /></body></html>";
        let result = scan(body);

        let target = &result.scripts[0];
        assert!(target.self_closing);
        let text = std::str::from_utf8(body).unwrap();
        assert_eq!(target.end, Some(text.find("/>").unwrap() + 2));
    }

    #[test]
    fn test_inline_without_close_tag_has_no_end() {
        let body = b"<html><body><script>var x = 1;</body></html>";
        let result = scan(body);

        let target = &result.scripts[0];
        assert_eq!(target.origin, ScriptOrigin::Inline);
        assert!(target.end.is_none());
    }

    #[test]
    fn test_meta_refresh_detected() {
        let body = b"<html><head>\
            <meta charset=\"utf-8\">\
            <meta http-equiv=\"refresh\" content=\"0;url=http://example.com/\">\
            </head><body></body></html>";
        let result = scan(body);

        assert_eq!(result.meta_refresh.len(), 1);
        let text = std::str::from_utf8(body).unwrap();
        assert_eq!(
            result.meta_refresh[0],
            text.find("<meta http-equiv").unwrap()
        );
    }

    #[test]
    fn test_head_and_body_context() {
        let body = b"<html><head><script>a</script></head>\
            <body><script>b</script></body></html>";
        let result = scan(body);

        assert_eq!(result.scripts.len(), 2);
        assert_eq!(result.scripts[0].context, ScriptContext::InHead);
        assert_eq!(result.scripts[1].context, ScriptContext::InBody);
    }
}
