use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::StrategyId;

/// Ordered assignment of strategies to participants
///
/// Index `i` holds the strategy played by participant `i`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrategyProfile {
    assignment: Vec<StrategyId>,
}

impl StrategyProfile {
    pub fn new(assignment: Vec<StrategyId>) -> Self {
        Self { assignment }
    }

    /// Build a profile from anything convertible into strategy IDs
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StrategyId>,
    {
        Self::new(ids.into_iter().map(Into::into).collect())
    }

    /// Number of participants in the profile
    pub fn len(&self) -> usize {
        self.assignment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignment.is_empty()
    }

    /// Strategy played by a participant
    pub fn strategy_of(&self, participant: usize) -> Option<&StrategyId> {
        self.assignment.get(participant)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StrategyId> {
        self.assignment.iter()
    }

    pub fn as_slice(&self) -> &[StrategyId] {
        &self.assignment
    }

    /// Symmetric-count form of this profile
    pub fn canonical(&self) -> ProfileKey {
        ProfileKey::from_counts(self.assignment.iter().map(|s| (s.clone(), 1)))
    }
}

/// Symmetric strategy-count profile
///
/// Records only how many participants play each strategy. Entries are kept
/// sorted by strategy ID and zero counts are never stored, so two profiles
/// that are permutations of each other always produce equal keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "BTreeMap<StrategyId, u32>", into = "BTreeMap<StrategyId, u32>")]
pub struct ProfileKey {
    counts: BTreeMap<StrategyId, u32>,
}

impl ProfileKey {
    /// Build a key from (strategy, count) pairs; duplicates are summed
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (StrategyId, u32)>,
    {
        let mut merged = BTreeMap::new();
        for (strategy, count) in counts {
            if count > 0 {
                *merged.entry(strategy).or_insert(0) += count;
            }
        }
        Self { counts: merged }
    }

    /// Build a key from counts aligned with a list of strategies
    pub fn from_aligned(strategies: &[StrategyId], counts: &[u32]) -> Self {
        Self::from_counts(strategies.iter().cloned().zip(counts.iter().copied()))
    }

    /// Number of participants playing `strategy`
    pub fn count(&self, strategy: &StrategyId) -> u32 {
        self.counts.get(strategy).copied().unwrap_or(0)
    }

    /// Total number of participants
    pub fn participants(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Strategies with a non-zero count, in canonical order
    pub fn strategies(&self) -> impl Iterator<Item = &StrategyId> {
        self.counts.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StrategyId, u32)> {
        self.counts.iter().map(|(s, c)| (s, *c))
    }

    /// Counts aligned with `strategies` (zero for strategies not present)
    pub fn counts_over(&self, strategies: &[StrategyId]) -> Vec<u32> {
        strategies.iter().map(|s| self.count(s)).collect()
    }

    /// Ordered profile with participants grouped by strategy in canonical order
    pub fn expand(&self) -> StrategyProfile {
        let mut assignment = Vec::with_capacity(self.participants() as usize);
        for (strategy, count) in &self.counts {
            for _ in 0..*count {
                assignment.push(strategy.clone());
            }
        }
        StrategyProfile::new(assignment)
    }
}

impl From<BTreeMap<StrategyId, u32>> for ProfileKey {
    fn from(counts: BTreeMap<StrategyId, u32>) -> Self {
        Self::from_counts(counts)
    }
}

impl From<ProfileKey> for BTreeMap<StrategyId, u32> {
    fn from(key: ProfileKey) -> Self {
        key.counts
    }
}

impl From<&StrategyProfile> for ProfileKey {
    fn from(profile: &StrategyProfile) -> Self {
        profile.canonical()
    }
}

impl std::fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, (strategy, count)) in self.counts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", strategy, count)?;
        }
        write!(f, "]")
    }
}
