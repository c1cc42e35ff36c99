pub mod transforms;
pub mod tree;

pub use transforms::DecodingTransforms;
pub use tree::{DecodedNode, TreeBuilder};

use serde::Serialize;

/// Which transform or split strategy produced a tree node. The fixed
/// priority rules key off these, so the set is a closed enum rather than
/// free-form strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecodeMethod {
    Raw,
    Base64,
    Hex,
    UrlDecode,
    QueryPair,
    KvPair,
    Split(char),
}

impl DecodeMethod {
    /// Diagnostic tag, e.g. "base64" or "split:.".
    pub fn tag(&self) -> String {
        match self {
            DecodeMethod::Raw => "raw".to_string(),
            DecodeMethod::Base64 => "base64".to_string(),
            DecodeMethod::Hex => "hex".to_string(),
            DecodeMethod::UrlDecode => "url-decode".to_string(),
            DecodeMethod::QueryPair => "query-pair".to_string(),
            DecodeMethod::KvPair => "kv-pair".to_string(),
            DecodeMethod::Split(d) => format!("split:{}", d),
        }
    }
}

/// One matched signal on a tree node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeSignal {
    BrandHit(String),
    ScamTermHit(String),
    HighEntropy(f64),
}
