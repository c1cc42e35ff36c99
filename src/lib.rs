pub mod byte_scan;
pub mod config;
pub mod decoding;
pub mod engine;
pub mod html_bounds;
pub mod keywords;
pub mod script_extract;
pub mod watchlist;

pub use config::EngineConfig;
pub use decoding::tree::{DecodedNode, TreeBuilder};
pub use decoding::{DecodeMethod, DecodingTransforms, NodeSignal};
pub use engine::{collect_findings, BodyAnalysis, DecodedFinding, ScanEngine};
pub use html_bounds::HtmlRange;
pub use keywords::{KeywordMatcher, KeywordScan};
pub use script_extract::{ScriptContext, ScriptOrigin, ScriptScanTarget};
pub use watchlist::Watchlist;
