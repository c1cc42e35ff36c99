use crate::config::EngineConfig;
use crate::decoding::transforms::DecodingTransforms;
use crate::decoding::{DecodeMethod, NodeSignal};
use crate::keywords::KeywordMatcher;
use crate::watchlist::Watchlist;
use serde::Serialize;

/// Split delimiters in priority order. First delimiter that yields a
/// relevant child wins; iteration order is the documented behavior, so
/// this stays an ordered slice, never a set.
const SPLIT_DELIMITERS: &[char] = &['|', '.', ';', '_', '~', ':'];

/// One node in the decode-attempt tree.
///
/// `value` is the string this node was handed; `decoded` is the transform
/// output the node was actually analyzed on (equal to `value` for raw and
/// split nodes). Children are exclusively owned — dropping a subtree never
/// touches the rest of the tree. The builder threads ancestry through its
/// traversals instead of keeping back-pointers.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedNode {
    pub value: String,
    pub decoded: String,
    pub depth: usize,
    pub method: DecodeMethod,
    pub was_relevant: bool,
    pub should_stop: bool,
    pub findings: Vec<NodeSignal>,
    pub children: Vec<DecodedNode>,
}

impl DecodedNode {
    fn new(value: String, decoded: String, method: DecodeMethod, depth: usize) -> Self {
        Self {
            value,
            decoded,
            depth,
            method,
            was_relevant: false,
            should_stop: false,
            findings: Vec::new(),
            children: Vec::new(),
        }
    }

    /// True when this node or anything beneath it carries a signal.
    pub fn subtree_relevant(&self) -> bool {
        self.was_relevant || self.children.iter().any(|c| c.subtree_relevant())
    }

    /// Total node count, tests and diagnostics only.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(|c| c.size()).sum::<usize>()
    }

    /// Largest depth present in the subtree.
    pub fn max_depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.max_depth())
            .max()
            .unwrap_or(self.depth)
    }
}

/// Bounded recursive exploration of "what could this string actually be".
///
/// Borrows its configuration, transforms and watchlist snapshot, so a
/// builder is cheap to construct per analysis and two concurrent analyses
/// share nothing mutable.
pub struct TreeBuilder<'a> {
    config: &'a EngineConfig,
    transforms: &'a DecodingTransforms,
    matcher: KeywordMatcher<'a>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(
        config: &'a EngineConfig,
        transforms: &'a DecodingTransforms,
        watchlist: &'a Watchlist,
    ) -> Self {
        Self {
            config,
            transforms,
            matcher: KeywordMatcher::new(watchlist),
        }
    }

    /// Build the full decode tree for one candidate string. Never fails:
    /// adversarial input at worst produces a shallow tree whose only
    /// signal is an entropy flag.
    pub fn build(&self, input: &str) -> DecodedNode {
        self.build_node(
            input.to_string(),
            input.to_string(),
            DecodeMethod::Raw,
            0,
        )
    }

    fn build_node(
        &self,
        value: String,
        decoded: String,
        method: DecodeMethod,
        depth: usize,
    ) -> DecodedNode {
        let mut node = DecodedNode::new(value, decoded, method, depth);

        // direct analysis first: cheap, no transform
        let scan = self.matcher.scan(&node.decoded);
        if scan.is_relevant() {
            node.findings
                .extend(scan.brands.into_iter().map(NodeSignal::BrandHit));
            node.findings
                .extend(scan.terms.into_iter().map(NodeSignal::ScamTermHit));
            node.was_relevant = true;
            node.should_stop = true;
            return node;
        }

        if depth >= self.config.max_depth {
            self.entropy_fallback(&mut node);
            return node;
        }

        // speculative splits: first strategy with a relevant child wins and
        // stops the node; a strategy that applies but convinces nobody
        // leaves nothing behind
        if let Some(children) = self.try_split_strategies(&node.decoded, depth) {
            node.children = children;
            node.was_relevant = true;
            node.should_stop = true;
            return node;
        }

        // decode attempt, fixed order base64 -> hex -> url-decode
        if let Some(child) = self.try_decode(&node.decoded, depth) {
            node.children.push(child);
            return node;
        }

        self.entropy_fallback(&mut node);
        node
    }

    fn try_split_strategies(&self, decoded: &str, depth: usize) -> Option<Vec<DecodedNode>> {
        // query-pair: at least two key=value pairs joined by '&'
        let pairs: Vec<&str> = decoded
            .split('&')
            .filter(|part| part.contains('='))
            .collect();
        if pairs.len() >= 2 {
            let children: Vec<DecodedNode> = pairs
                .iter()
                .filter_map(|pair| pair.split_once('=').map(|(_, v)| v))
                .filter(|v| v.len() >= self.config.min_split_segment_len)
                .map(|v| {
                    self.build_node(
                        v.to_string(),
                        v.to_string(),
                        DecodeMethod::QueryPair,
                        depth + 1,
                    )
                })
                .collect();
            if children.iter().any(|c| c.subtree_relevant()) {
                return Some(children);
            }
        }

        // single key=value
        if !decoded.contains('&') && decoded.matches('=').count() == 1 {
            if let Some((_, value)) = decoded.split_once('=') {
                if value.len() >= self.config.min_kv_value_len {
                    let child = self.build_node(
                        value.to_string(),
                        value.to_string(),
                        DecodeMethod::KvPair,
                        depth + 1,
                    );
                    if child.subtree_relevant() {
                        return Some(vec![child]);
                    }
                }
            }
        }

        // delimiter split, fixed priority order
        for &delimiter in SPLIT_DELIMITERS {
            if decoded.matches(delimiter).count() < self.config.min_delimiter_count {
                continue;
            }
            let children: Vec<DecodedNode> = decoded
                .split(delimiter)
                .filter(|part| part.len() >= self.config.min_split_segment_len)
                .map(|part| {
                    self.build_node(
                        part.to_string(),
                        part.to_string(),
                        DecodeMethod::Split(delimiter),
                        depth + 1,
                    )
                })
                .collect();
            if children.iter().any(|c| c.subtree_relevant()) {
                return Some(children);
            }
        }

        None
    }

    /// First transform that succeeds wins the node; a success that makes
    /// no progress (output identical to input) ends decoding here, since a
    /// fixed point would otherwise recurse forever.
    fn try_decode(&self, decoded: &str, depth: usize) -> Option<DecodedNode> {
        if let Some(normalized) = self.transforms.normalize_base64(decoded, self.config) {
            if let Some(bytes) = self.transforms.decode_base64(&normalized) {
                if let Ok(text) = String::from_utf8(bytes) {
                    return self.decode_child(decoded, text, DecodeMethod::Base64, depth);
                }
            }
        }

        if let Some(bytes) = DecodingTransforms::decode_hex(decoded) {
            if let Ok(text) = String::from_utf8(bytes) {
                return self.decode_child(decoded, text, DecodeMethod::Hex, depth);
            }
        }

        if let Some(text) = DecodingTransforms::percent_decode(decoded) {
            return self.decode_child(decoded, text, DecodeMethod::UrlDecode, depth);
        }

        None
    }

    fn decode_child(
        &self,
        input: &str,
        output: String,
        method: DecodeMethod,
        depth: usize,
    ) -> Option<DecodedNode> {
        if output.is_empty() || output == input {
            return None;
        }
        Some(self.build_node(input.to_string(), output, method, depth + 1))
    }

    /// Leaf-only signal: when nothing split and nothing decoded, the one
    /// thing left to say is "this looks like random data". Structured
    /// identifiers (UUIDs, MAC addresses) are exempt.
    fn entropy_fallback(&self, node: &mut DecodedNode) {
        if node.was_relevant || !node.children.is_empty() {
            return;
        }
        if self.transforms.looks_like_uuid(&node.decoded)
            || self.transforms.looks_like_mac(&node.decoded)
        {
            return;
        }
        let (high, entropy) =
            DecodingTransforms::is_high_entropy(&node.decoded, self.config.entropy_threshold);
        if high {
            node.findings.push(NodeSignal::HighEntropy(entropy));
            node.was_relevant = true;
            node.should_stop = true;
        }
    }
}
