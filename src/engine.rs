use crate::config::EngineConfig;
use crate::decoding::transforms::DecodingTransforms;
use crate::decoding::tree::{DecodedNode, TreeBuilder};
use crate::decoding::NodeSignal;
use crate::html_bounds::{extract_html_range, HtmlRange};
use crate::script_extract::{self, ScriptOrigin, ScriptScanTarget};
use crate::watchlist::Watchlist;
use serde::Serialize;

/// One flattened signal out of a decode tree: the value that matched, the
/// transform chain that exposed it, and what matched. This is the shape
/// the warning/scoring layer consumes; the engine itself never builds
/// user-facing warning records.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedFinding {
    pub value: String,
    pub method_chain: Vec<String>,
    pub brands: Vec<String>,
    pub terms: Vec<String>,
    pub entropy: Option<f64>,
}

/// Structural result of scanning one response body.
#[derive(Debug, Clone, Serialize)]
pub struct BodyAnalysis {
    /// Body hit the size gate; nothing was scanned.
    pub oversized: bool,
    /// None means no `<html` open tag in the prefix window — itself a
    /// critical structural signal for the caller.
    pub html: Option<HtmlRange>,
    pub scripts: Vec<ScriptScanTarget>,
    pub meta_refresh: Vec<usize>,
    /// Decode-tree findings from external script src values.
    pub script_findings: Vec<DecodedFinding>,
}

/// Facade wiring the extractors, transforms and watchlist together. One
/// engine per analysis session; every method is a pure function of its
/// arguments and the immutable snapshot inside, so concurrent sessions
/// share nothing mutable.
pub struct ScanEngine {
    config: EngineConfig,
    watchlist: Watchlist,
    transforms: DecodingTransforms,
}

impl ScanEngine {
    pub fn new(config: EngineConfig, watchlist: Watchlist) -> Self {
        Self {
            config,
            watchlist,
            transforms: DecodingTransforms::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the decode tree over one candidate string. Fragments below the
    /// minimum length are not worth a tree at all.
    pub fn analyze_candidate(&self, input: &str) -> Option<DecodedNode> {
        let trimmed = input.trim();
        if trimmed.len() < self.config.min_candidate_len {
            return None;
        }
        let builder = TreeBuilder::new(&self.config, &self.transforms, &self.watchlist);
        let root = builder.build(trimmed);
        log::debug!(
            "candidate {:?}: {} nodes, relevant: {}",
            trimmed,
            root.size(),
            root.subtree_relevant()
        );
        Some(root)
    }

    /// Structural scan of a fetched body: size gate, HTML boundary
    /// extraction, script extraction, and a decode pass over every
    /// external script source. Read-only over the buffer.
    pub fn analyze_body(&self, body: &[u8]) -> BodyAnalysis {
        if body.len() >= self.config.max_body_bytes {
            log::warn!(
                "body of {} bytes exceeds the {} byte gate, skipping extraction",
                body.len(),
                self.config.max_body_bytes
            );
            return BodyAnalysis {
                oversized: true,
                html: None,
                scripts: Vec::new(),
                meta_refresh: Vec::new(),
                script_findings: Vec::new(),
            };
        }

        let html = extract_html_range(body, &self.config);
        let (scripts, meta_refresh) = match &html {
            Some(range) => {
                let extraction = script_extract::extract(body, range, &self.config);
                (extraction.scripts, extraction.meta_refresh)
            }
            None => (Vec::new(), Vec::new()),
        };

        let mut script_findings = Vec::new();
        for target in &scripts {
            if target.origin == ScriptOrigin::Malformed {
                continue;
            }
            if let Some(src) = &target.src {
                if let Some(root) = self.analyze_candidate(src) {
                    script_findings.extend(collect_findings(&root));
                }
            }
        }

        BodyAnalysis {
            oversized: false,
            html,
            scripts,
            meta_refresh,
            script_findings,
        }
    }
}

/// Flatten a decode tree into findings, one per node that carries any
/// signal, with the method chain from the root recorded alongside.
pub fn collect_findings(root: &DecodedNode) -> Vec<DecodedFinding> {
    let mut out = Vec::new();
    let mut chain = Vec::new();
    walk(root, &mut chain, &mut out);
    out
}

fn walk(node: &DecodedNode, chain: &mut Vec<String>, out: &mut Vec<DecodedFinding>) {
    chain.push(node.method.tag());

    if !node.findings.is_empty() {
        let mut brands = Vec::new();
        let mut terms = Vec::new();
        let mut entropy = None;
        for finding in &node.findings {
            match finding {
                NodeSignal::BrandHit(b) => brands.push(b.clone()),
                NodeSignal::ScamTermHit(t) => terms.push(t.clone()),
                NodeSignal::HighEntropy(e) => entropy = Some(*e),
            }
        }
        out.push(DecodedFinding {
            value: node.decoded.clone(),
            method_chain: chain.clone(),
            brands,
            terms,
            entropy,
        });
    }

    for child in &node.children {
        walk(child, chain, out);
    }
    chain.pop();
}
