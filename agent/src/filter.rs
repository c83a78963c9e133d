//! Call-name suppression rules
//!
//! The collector's startup configuration may carry a list of substrings;
//! any qualified method name containing one of them (case-insensitively)
//! is never captured. The rule set is fixed at activation and read from
//! every calling thread without locks.

pub struct FilterEngine {
    /// Lowercased, non-empty rules.
    rules: Vec<String>,
}

impl FilterEngine {
    pub fn new(rules: impl IntoIterator<Item = String>) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| r.trim().to_lowercase())
            .filter(|r| !r.is_empty())
            .collect();
        Self { rules }
    }

    /// An engine that suppresses nothing.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// True iff any rule is a case-insensitive substring of `name`.
    pub fn suppresses(&self, name: &str) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        let name = name.to_lowercase();
        self.rules.iter().any(|rule| name.contains(rule.as_str()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(rules: &[&str]) -> FilterEngine {
        FilterEngine::new(rules.iter().map(|r| r.to_string()))
    }

    #[test]
    fn test_substring_match() {
        let filter = engine(&["Update"]);
        assert!(filter.suppresses("Foo.Update"));
        assert!(filter.suppresses("Game.Server::OnUpdateTick"));
        assert!(!filter.suppresses("Foo.Spawn"));
    }

    #[test]
    fn test_case_insensitive() {
        let filter = engine(&["update"]);
        assert!(filter.suppresses("Foo::UPDATE"));
        assert!(filter.suppresses("foo::Update"));

        let filter = engine(&["ONTICK"]);
        assert!(filter.suppresses("Server::OnTick"));
    }

    #[test]
    fn test_empty_rule_set_allows_everything() {
        let filter = FilterEngine::empty();
        assert!(!filter.suppresses("Anything.At::All"));
        assert!(filter.is_empty());
    }

    #[test]
    fn test_blank_rules_dropped() {
        let filter = engine(&["", "  ", "Tick"]);
        assert_eq!(filter.len(), 1);
        assert!(filter.suppresses("Game::Tick"));
        assert!(!filter.suppresses("Game::Spawn"));
    }

    #[test]
    fn test_rules_trimmed() {
        let filter = engine(&["  Render "]);
        assert!(filter.suppresses("Hud::RenderOverlay"));
    }
}
