use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Immutable snapshot of the brand and scam-term sets used by keyword
/// matching. Built once per analysis run from the builtin lists plus any
/// user-maintained additions, then passed by reference into the matchers —
/// the core never reaches for a hidden global.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Watchlist {
    #[serde(default)]
    pub brands: HashSet<String>,
    #[serde(default)]
    pub scam_terms: HashSet<String>,
}

const BUILTIN_BRANDS: &[&str] = &[
    "paypal",
    "apple",
    "icloud",
    "amazon",
    "microsoft",
    "office365",
    "outlook",
    "google",
    "gmail",
    "facebook",
    "instagram",
    "whatsapp",
    "netflix",
    "spotify",
    "linkedin",
    "dropbox",
    "ebay",
    "steam",
    "chase",
    "wellsfargo",
    "bankofamerica",
    "citibank",
    "hsbc",
    "santander",
    "barclays",
    "americanexpress",
    "mastercard",
    "visa",
    "coinbase",
    "binance",
    "metamask",
    "dhl",
    "fedex",
    "usps",
];

const BUILTIN_SCAM_TERMS: &[&str] = &[
    "login",
    "signin",
    "logon",
    "verify",
    "verification",
    "validate",
    "authenticate",
    "account",
    "secure",
    "security",
    "update",
    "confirm",
    "password",
    "credential",
    "banking",
    "wallet",
    "invoice",
    "payment",
    "billing",
    "refund",
    "suspend",
    "suspended",
    "locked",
    "unlock",
    "alert",
    "warning",
    "urgent",
    "expired",
    "support",
    "helpdesk",
    "recovery",
    "webscr",
    "bonus",
    "prize",
    "winner",
    "reward",
    "giveaway",
];

impl Watchlist {
    /// Snapshot of the builtin lists, case-normalized.
    pub fn builtin() -> Self {
        Self {
            brands: BUILTIN_BRANDS.iter().map(|s| s.to_string()).collect(),
            scam_terms: BUILTIN_SCAM_TERMS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Load user-maintained additions from a YAML file.
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let mut watchlist: Watchlist = serde_yaml::from_str(&content)?;
        watchlist.normalize();
        Ok(watchlist)
    }

    /// Fold another snapshot's entries into this one.
    pub fn merge(&mut self, other: Watchlist) {
        self.brands.extend(other.brands);
        self.scam_terms.extend(other.scam_terms);
        self.normalize();
    }

    fn normalize(&mut self) {
        self.brands = std::mem::take(&mut self.brands)
            .into_iter()
            .map(|b| b.trim().to_lowercase())
            .filter(|b| !b.is_empty())
            .collect();
        self.scam_terms = std::mem::take(&mut self.scam_terms)
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
    }

    pub fn is_empty(&self) -> bool {
        self.brands.is_empty() && self.scam_terms.is_empty()
    }
}
