use crate::config::EngineConfig;
use base64::{engine::general_purpose, Engine as _};
use regex::Regex;

/// First characters that mark a syntactically valid base64 candidate as
/// near-certain noise. Real encoded payloads essentially never start with
/// these, while random high-entropy junk frequently does.
const SUSPICIOUS_BASE64_STARTERS: &[char] = &['/', '+', '9', '8', '7', '6', '5'];

/// The pure string transforms the tree builder drives. Holds its compiled
/// regexes; every method is side-effect-free and signals failure with
/// `None` — malformed input abandons a branch, it never propagates an
/// error.
pub struct DecodingTransforms {
    base64_charset: Regex,
    uuid_pattern: Regex,
    mac_pattern: Regex,
}

impl Default for DecodingTransforms {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodingTransforms {
    pub fn new() -> Self {
        Self {
            base64_charset: Regex::new(r"^[A-Za-z0-9+/]+={0,2}$").unwrap(),
            uuid_pattern: Regex::new(
                r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
            )
            .unwrap(),
            mac_pattern: Regex::new(r"^([0-9a-fA-F]{2}[:-]){5}[0-9a-fA-F]{2}$").unwrap(),
        }
    }

    /// Massage a candidate into standard-alphabet base64, or reject it.
    /// URL-safe characters are mapped back, leading `+` runs are stripped,
    /// the charset and minimum length are enforced, the suspicious-starter
    /// set is rejected, and padding is restored to a multiple of four.
    pub fn normalize_base64(&self, input: &str, config: &EngineConfig) -> Option<String> {
        let mut s = input.replace('-', "+").replace('_', "/");
        while s.starts_with('+') {
            s.remove(0);
        }
        if s.len() < config.min_base64_len {
            return None;
        }
        if !self.base64_charset.is_match(&s) {
            return None;
        }
        if s.chars()
            .next()
            .map_or(true, |c| SUSPICIOUS_BASE64_STARTERS.contains(&c))
        {
            return None;
        }
        while s.len() % 4 != 0 {
            s.push('=');
        }
        Some(s)
    }

    /// RFC 4648 decode of an already-normalized candidate.
    pub fn decode_base64(&self, normalized: &str) -> Option<Vec<u8>> {
        general_purpose::STANDARD.decode(normalized).ok()
    }

    /// Hex digit pairs to bytes; odd length or a non-hex character fails.
    pub fn decode_hex(input: &str) -> Option<Vec<u8>> {
        hex::decode(input).ok()
    }

    /// Strict percent-decoding: every `%` must start a well-formed `%XX`
    /// escape and the decoded bytes must form valid UTF-8.
    pub fn percent_decode(input: &str) -> Option<String> {
        let bytes = input.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' {
                if i + 2 >= bytes.len() {
                    return None;
                }
                let hi = hex_digit(bytes[i + 1])?;
                let lo = hex_digit(bytes[i + 2])?;
                out.push((hi << 4) | lo);
                i += 3;
            } else {
                out.push(bytes[i]);
                i += 1;
            }
        }
        String::from_utf8(out).ok()
    }

    /// Shannon entropy over byte frequency. Empty input is 0.0, which the
    /// callers treat as "not high-entropy".
    pub fn shannon_entropy(input: &str) -> f64 {
        let data = input.as_bytes();
        if data.is_empty() {
            return 0.0;
        }

        let mut frequencies = [0u32; 256];
        for &b in data {
            frequencies[b as usize] += 1;
        }

        let len = data.len() as f64;
        frequencies
            .iter()
            .filter(|&&n| n > 0)
            .map(|&n| {
                let p = n as f64 / len;
                -p * p.log2()
            })
            .sum()
    }

    pub fn is_high_entropy(input: &str, threshold: f64) -> (bool, f64) {
        let entropy = Self::shannon_entropy(input);
        (entropy >= threshold, entropy)
    }

    /// Structured identifiers look random to an entropy measure but are
    /// not secrets; the tree builder suppresses the high-entropy signal on
    /// them.
    pub fn looks_like_uuid(&self, input: &str) -> bool {
        self.uuid_pattern.is_match(input)
    }

    pub fn looks_like_mac(&self, input: &str) -> bool {
        self.mac_pattern.is_match(input)
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transforms() -> DecodingTransforms {
        DecodingTransforms::new()
    }

    #[test]
    fn test_normalize_base64_url_safe_alphabet() {
        let config = EngineConfig::default();
        let normalized = transforms()
            .normalize_base64("aGVsbG8td29ybGQt_w-_", &config)
            .unwrap();
        assert!(!normalized.contains('-'));
        assert!(!normalized.contains('_'));
        assert_eq!(normalized.len() % 4, 0);
    }

    #[test]
    fn test_normalize_base64_rejects_short_input() {
        let config = EngineConfig::default();
        assert!(transforms().normalize_base64("aGVsbG8=", &config).is_none());
    }

    #[test]
    fn test_normalize_base64_rejects_bad_charset() {
        let config = EngineConfig::default();
        assert!(transforms()
            .normalize_base64("this is not base64 at all!", &config)
            .is_none());
    }

    #[test]
    fn test_normalize_base64_rejects_suspicious_starter() {
        let config = EngineConfig::default();
        assert!(transforms()
            .normalize_base64("9AAAABBBBCCCCDDDD", &config)
            .is_none());
        assert!(transforms()
            .normalize_base64("/AAAABBBBCCCCDDDD", &config)
            .is_none());
    }

    #[test]
    fn test_normalize_base64_strips_leading_plus() {
        let config = EngineConfig::default();
        // leading '+' runs are stripped before the starter check
        let normalized = transforms()
            .normalize_base64("++aAAAABBBBCCCCDDDD", &config)
            .unwrap();
        assert!(normalized.starts_with('a'));
    }

    #[test]
    fn test_decode_base64_roundtrip() {
        let t = transforms();
        let config = EngineConfig::default();
        let normalized = t.normalize_base64("YWJjZGVmZ2hpams=", &config).unwrap();
        let decoded = t.decode_base64(&normalized).unwrap();
        assert_eq!(decoded, b"abcdefghijk");
    }

    #[test]
    fn test_decode_hex() {
        assert_eq!(
            DecodingTransforms::decode_hex("70617970616c").unwrap(),
            b"paypal"
        );
        // odd length
        assert!(DecodingTransforms::decode_hex("abc").is_none());
        // non-hex character
        assert!(DecodingTransforms::decode_hex("zz11").is_none());
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(
            DecodingTransforms::percent_decode("a%20b%2Fc").unwrap(),
            "a b/c"
        );
        // malformed escapes fail the whole transform
        assert!(DecodingTransforms::percent_decode("broken%2").is_none());
        assert!(DecodingTransforms::percent_decode("broken%zz").is_none());
        // untouched input round-trips unchanged
        assert_eq!(
            DecodingTransforms::percent_decode("plain").unwrap(),
            "plain"
        );
    }

    #[test]
    fn test_entropy_monotonic_scenario() {
        let (high, entropy) = DecodingTransforms::is_high_entropy("aaaaaaaaaa", 3.5);
        assert!(!high);
        assert!(entropy.abs() < 1e-9);

        // 32 distinct characters, the shape of a random base64 token
        let random = "xK9mQ2vR7pL4wT8nZ3cF6hJ1bD5gS0aV";
        let (high, entropy) = DecodingTransforms::is_high_entropy(random, 4.4);
        assert!(high);
        assert!(entropy >= 4.4);
    }

    #[test]
    fn test_structured_identifier_patterns() {
        let t = transforms();
        assert!(t.looks_like_uuid("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!t.looks_like_uuid("not-a-uuid-at-all"));
        assert!(t.looks_like_mac("00:1a:2b:3c:4d:5e"));
        assert!(t.looks_like_mac("00-1A-2B-3C-4D-5E"));
        assert!(!t.looks_like_mac("00:1a:2b"));
    }
}
