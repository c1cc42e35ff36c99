use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning knobs for the analysis core. Every heuristic constant lives here
/// so the thresholds stay visible and overridable instead of being buried
/// in the scanning code. Values below are the shipped baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum decode-tree depth; nodes at this depth get no children.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Shannon entropy above which a generic string counts as high-entropy.
    #[serde(default = "default_entropy_threshold")]
    pub entropy_threshold: f64,

    /// Stricter entropy bar applied to cookie values by downstream analyzers.
    #[serde(default = "default_cookie_entropy_threshold")]
    pub cookie_entropy_threshold: f64,

    /// Shortest string worth feeding into the decode tree at all.
    #[serde(default = "default_min_candidate_len")]
    pub min_candidate_len: usize,

    /// Shortest segment kept by query-pair and delimiter splits.
    #[serde(default = "default_min_split_segment_len")]
    pub min_split_segment_len: usize,

    /// Shortest value side accepted by the single key=value split.
    #[serde(default = "default_min_kv_value_len")]
    pub min_kv_value_len: usize,

    /// A delimiter must occur at least this many times before splitting on it.
    #[serde(default = "default_min_delimiter_count")]
    pub min_delimiter_count: usize,

    /// Shortest string considered a base64 candidate after normalization.
    #[serde(default = "default_min_base64_len")]
    pub min_base64_len: usize,

    /// Bytes scanned from each end of the body for <html>/</html>.
    #[serde(default = "default_html_probe_window")]
    pub html_probe_window: usize,

    /// Cap on any single forward scan inside a tag (attributes, close tag).
    #[serde(default = "default_tag_scan_cap")]
    pub tag_scan_cap: usize,

    /// Cap on the forward scan for an inline script's </script>.
    #[serde(default = "default_script_close_scan_cap")]
    pub script_close_scan_cap: usize,

    /// Bodies at or above this size are refused before extraction runs.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_max_depth() -> usize {
    6
}

fn default_entropy_threshold() -> f64 {
    3.5
}

fn default_cookie_entropy_threshold() -> f64 {
    4.4
}

fn default_min_candidate_len() -> usize {
    4
}

fn default_min_split_segment_len() -> usize {
    4
}

fn default_min_kv_value_len() -> usize {
    6
}

fn default_min_delimiter_count() -> usize {
    2
}

fn default_min_base64_len() -> usize {
    16
}

fn default_html_probe_window() -> usize {
    500
}

fn default_tag_scan_cap() -> usize {
    8192
}

fn default_script_close_scan_cap() -> usize {
    8192
}

fn default_max_body_bytes() -> usize {
    4_000_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            entropy_threshold: default_entropy_threshold(),
            cookie_entropy_threshold: default_cookie_entropy_threshold(),
            min_candidate_len: default_min_candidate_len(),
            min_split_segment_len: default_min_split_segment_len(),
            min_kv_value_len: default_min_kv_value_len(),
            min_delimiter_count: default_min_delimiter_count(),
            min_base64_len: default_min_base64_len(),
            html_probe_window: default_html_probe_window(),
            tag_scan_cap: default_tag_scan_cap(),
            script_close_scan_cap: default_script_close_scan_cap(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl EngineConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
