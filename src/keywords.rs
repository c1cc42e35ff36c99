use crate::watchlist::Watchlist;

/// Result of running the brand and scam-term lookups against one value.
#[derive(Debug, Clone, Default)]
pub struct KeywordScan {
    pub brands: Vec<String>,
    pub terms: Vec<String>,
}

impl KeywordScan {
    /// The co-occurrence rule: a value is only conclusive when a brand name
    /// and a scam term both match it. Either alone is too weak a signal —
    /// "paypal" appears in plenty of legitimate paths, and "login" in even
    /// more.
    pub fn is_relevant(&self) -> bool {
        !self.brands.is_empty() && !self.terms.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.brands.is_empty() && self.terms.is_empty()
    }
}

/// Token-level lookups against a watchlist snapshot. Borrows the snapshot
/// so two concurrent analyses can share one immutable list.
pub struct KeywordMatcher<'a> {
    watchlist: &'a Watchlist,
}

impl<'a> KeywordMatcher<'a> {
    pub fn new(watchlist: &'a Watchlist) -> Self {
        Self { watchlist }
    }

    /// Scan one candidate value. The value is lowercased and split into
    /// alphanumeric tokens; a watchlist entry matches when any token
    /// contains it. Matched entries are returned deduplicated and sorted
    /// so results are stable across runs.
    pub fn scan(&self, value: &str) -> KeywordScan {
        let lowered = value.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut brands: Vec<String> = self
            .watchlist
            .brands
            .iter()
            .filter(|brand| tokens.iter().any(|t| t.contains(brand.as_str())))
            .cloned()
            .collect();
        let mut terms: Vec<String> = self
            .watchlist
            .scam_terms
            .iter()
            .filter(|term| tokens.iter().any(|t| t.contains(term.as_str())))
            .cloned()
            .collect();

        brands.sort();
        brands.dedup();
        terms.sort();
        terms.dedup();

        KeywordScan { brands, terms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_watchlist() -> Watchlist {
        let mut watchlist = Watchlist::default();
        watchlist.brands.insert("paypal".to_string());
        watchlist.brands.insert("apple".to_string());
        watchlist.scam_terms.insert("login".to_string());
        watchlist.scam_terms.insert("verify".to_string());
        watchlist.scam_terms.insert("account".to_string());
        watchlist
    }

    #[test]
    fn test_brand_alone_is_not_relevant() {
        let watchlist = create_test_watchlist();
        let matcher = KeywordMatcher::new(&watchlist);

        let scan = matcher.scan("paypal-checkout");
        assert_eq!(scan.brands, vec!["paypal".to_string()]);
        assert!(scan.terms.is_empty());
        assert!(!scan.is_relevant());
    }

    #[test]
    fn test_term_alone_is_not_relevant() {
        let watchlist = create_test_watchlist();
        let matcher = KeywordMatcher::new(&watchlist);

        let scan = matcher.scan("user/login/session");
        assert!(scan.brands.is_empty());
        assert_eq!(scan.terms, vec!["login".to_string()]);
        assert!(!scan.is_relevant());
    }

    #[test]
    fn test_co_occurrence_is_relevant() {
        let watchlist = create_test_watchlist();
        let matcher = KeywordMatcher::new(&watchlist);

        let scan = matcher.scan("login-paypal-verify-account");
        assert!(scan.is_relevant());
        assert_eq!(scan.brands, vec!["paypal".to_string()]);
        assert_eq!(
            scan.terms,
            vec![
                "account".to_string(),
                "login".to_string(),
                "verify".to_string()
            ]
        );
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let watchlist = create_test_watchlist();
        let matcher = KeywordMatcher::new(&watchlist);

        let scan = matcher.scan("PayPal-LOGIN");
        assert!(scan.is_relevant());
    }

    #[test]
    fn test_match_inside_mangled_token() {
        let watchlist = create_test_watchlist();
        let matcher = KeywordMatcher::new(&watchlist);

        // "paypal1" and "xlogin" still contain the watched entries
        let scan = matcher.scan("paypal1_xlogin");
        assert!(scan.is_relevant());
    }
}
