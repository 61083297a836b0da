use serde::{Deserialize, Serialize};

/// Unique identifier for a strategy
///
/// Strategies are totally ordered by their identifier; that order is the
/// canonical order of symmetric profiles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyId(pub String);

impl StrategyId {
    /// Create a new strategy ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StrategyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for StrategyId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StrategyId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_ordering() {
        let mut ids = vec![
            StrategyId::from("responsive"),
            StrategyId::from("noop"),
            StrategyId::from("opportunistic"),
        ];
        ids.sort();
        assert_eq!(ids[0].as_str(), "noop");
        assert_eq!(ids[2].as_str(), "responsive");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = StrategyId::new("noop");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"noop\"");
    }
}
