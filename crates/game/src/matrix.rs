//! Heuristic symmetric payoff matrix
//!
//! Maps every symmetric profile to running payoff statistics per strategy.
//! Workers record samples concurrently; readers always see a consistent
//! (count, mean, variance) triple per profile.
//!
//! ```text
//! Worker 1 ──► record_sample ──► DashMap shard ──► rcu(entry + sample) ──► atomic swap
//! Worker 2 ──► record_sample ──► DashMap shard ──► rcu(entry + sample) ──► atomic swap
//! Reader   ──► expected_payoff ──► load() ──► Arc<PayoffEntry> (never blocked)
//! ```

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use gridflex_core::{ProfileKey, SampleOutcome, StrategyId, StrategyProfile};
use gridflex_ports::{Visitable, Writable};
use serde::{Deserialize, Serialize};

use crate::combinatorics::multi_combination_size;
use crate::error::{GameError, PayoffResult};
use crate::stats::{ConfidenceLevel, RunningStats};

/// Statistics of one profile - immutable once created (copy-on-write)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PayoffEntry {
    count: u64,
    /// Aligned with the matrix strategies; untouched for absent strategies
    stats: Vec<RunningStats>,
}

impl PayoffEntry {
    fn empty(strategies: usize) -> Self {
        Self {
            count: 0,
            stats: vec![RunningStats::new(); strategies],
        }
    }

    /// Copy with one sample folded in; `None` marks a strategy nobody played
    fn with_sample(&self, values: &[Option<f64>]) -> Self {
        let mut next = self.clone();
        next.count += 1;
        for (stats, value) in next.stats.iter_mut().zip(values) {
            if let Some(v) = value {
                stats.push(*v);
            }
        }
        next
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn stats(&self) -> &[RunningStats] {
        &self.stats
    }
}

/// Expected payoffs of one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffEstimate {
    pub key: ProfileKey,
    /// Number of samples folded in
    pub count: u64,
    /// Mean payoff of a participant playing each strategy of the profile
    pub means: BTreeMap<StrategyId, f64>,
    /// Sample variance of those payoffs
    pub variances: BTreeMap<StrategyId, f64>,
}

impl PayoffEstimate {
    pub fn mean(&self, strategy: &StrategyId) -> Option<f64> {
        self.means.get(strategy).copied()
    }

    pub fn variance(&self, strategy: &StrategyId) -> Option<f64> {
        self.variances.get(strategy).copied()
    }

    /// Expected payoff per participant of the expanded profile
    pub fn participant_payoffs(&self) -> Vec<f64> {
        self.key
            .expand()
            .iter()
            .map(|s| self.means.get(s).copied().unwrap_or(0.0))
            .collect()
    }
}

/// Walks the sampled profiles of a matrix in canonical order
pub trait PayoffVisitor {
    fn visit(&mut self, key: &ProfileKey, estimate: &PayoffEstimate);
}

impl<F: FnMut(&ProfileKey, &PayoffEstimate)> PayoffVisitor for F {
    fn visit(&mut self, key: &ProfileKey, estimate: &PayoffEstimate) {
        self(key, estimate)
    }
}

/// Concurrent empirical payoff table for a symmetric game
///
/// Permutations of the same strategy multiset share one entry. Entries are
/// created on their first sample and never removed.
#[derive(Debug)]
pub struct HeuristicSymmetricPayoffMatrix {
    participants: u32,
    strategies: Vec<StrategyId>,
    combinations: u64,
    entries: DashMap<ProfileKey, Arc<ArcSwap<PayoffEntry>>>,
    externality: ArcSwap<RunningStats>,
}

impl HeuristicSymmetricPayoffMatrix {
    /// Matrix for `participants` players choosing among `strategies`
    ///
    /// Strategies are sorted and deduplicated.
    pub fn new(participants: u32, strategies: Vec<StrategyId>) -> PayoffResult<Self> {
        let mut strategies = strategies;
        strategies.sort();
        strategies.dedup();
        if participants == 0 {
            return Err(GameError::InvalidArgument(
                "Game needs at least one participant".into(),
            ));
        }
        if strategies.is_empty() {
            return Err(GameError::InvalidArgument(
                "Game needs at least one strategy".into(),
            ));
        }

        let combinations = multi_combination_size(strategies.len(), participants as usize);
        Ok(Self {
            participants,
            strategies,
            combinations,
            entries: DashMap::new(),
            externality: ArcSwap::from_pointee(RunningStats::new()),
        })
    }

    pub fn participants(&self) -> u32 {
        self.participants
    }

    /// Strategies in canonical (sorted) order
    pub fn strategies(&self) -> &[StrategyId] {
        &self.strategies
    }

    fn strategy_index(&self, strategy: &StrategyId) -> PayoffResult<usize> {
        self.strategies
            .binary_search(strategy)
            .map_err(|_| GameError::InvalidArgument(format!("Unknown strategy: {}", strategy)))
    }

    fn check_key(&self, key: &ProfileKey) -> PayoffResult<()> {
        if key.participants() != self.participants {
            return Err(GameError::InvalidArgument(format!(
                "Profile {} has {} participants, expected {}",
                key,
                key.participants(),
                self.participants
            )));
        }
        for strategy in key.strategies() {
            self.strategy_index(strategy)?;
        }
        Ok(())
    }

    /// Get or create the swap cell of a profile
    fn entry_cell(&self, key: &ProfileKey) -> Arc<ArcSwap<PayoffEntry>> {
        // Fast path: check if exists
        if let Some(entry) = self.entries.get(key) {
            return Arc::clone(&entry);
        }

        // Slow path: create new entry
        self.entries
            .entry(key.clone())
            .or_insert_with(|| {
                Arc::new(ArcSwap::from_pointee(PayoffEntry::empty(
                    self.strategies.len(),
                )))
            })
            .clone()
    }

    /// Fold one replication outcome into the entry of its profile
    ///
    /// Each strategy's sample is the average payoff of the participants that
    /// played it, so the order of participants in `profile` does not matter.
    pub fn record_sample(
        &self,
        profile: &StrategyProfile,
        outcome: &SampleOutcome,
    ) -> PayoffResult<()> {
        if profile.len() != self.participants as usize {
            return Err(GameError::InvalidArgument(format!(
                "Profile has {} participants, expected {}",
                profile.len(),
                self.participants
            )));
        }
        if outcome.participants() != profile.len() {
            return Err(GameError::InvalidArgument(format!(
                "Outcome has {} payoffs for {} participants",
                outcome.participants(),
                profile.len()
            )));
        }

        let mut sums = vec![0.0; self.strategies.len()];
        let mut counts = vec![0u32; self.strategies.len()];
        for (strategy, payoff) in profile.iter().zip(&outcome.payoffs) {
            if !payoff.is_finite() {
                return Err(GameError::InvalidArgument(format!(
                    "Non-finite payoff {} for {}",
                    payoff, strategy
                )));
            }
            let index = self.strategy_index(strategy)?;
            sums[index] += payoff;
            counts[index] += 1;
        }
        let values: Vec<Option<f64>> = sums
            .iter()
            .zip(&counts)
            .map(|(sum, count)| (*count > 0).then(|| sum / f64::from(*count)))
            .collect();

        let key = profile.canonical();
        let cell = self.entry_cell(&key);
        let previous = cell.rcu(|current| current.with_sample(&values));
        log::trace!("Recorded sample {} for {}", previous.count() + 1, key);

        if outcome.externality.is_finite() {
            self.externality
                .rcu(|stats| stats.with_sample(outcome.externality));
        }
        Ok(())
    }

    /// Snapshot of the raw entry of a profile
    pub fn entry(&self, key: &ProfileKey) -> Option<Arc<PayoffEntry>> {
        self.entries.get(key).map(|cell| cell.load_full())
    }

    /// Expected payoffs of a profile
    ///
    /// `NoData` when the profile was never sampled.
    pub fn expected_payoff(&self, key: &ProfileKey) -> PayoffResult<PayoffEstimate> {
        self.check_key(key)?;
        let entry = self
            .entry(key)
            .filter(|e| e.count() > 0)
            .ok_or_else(|| GameError::NoData(key.clone()))?;
        Ok(self.estimate(key, &entry))
    }

    fn estimate(&self, key: &ProfileKey, entry: &PayoffEntry) -> PayoffEstimate {
        let mut means = BTreeMap::new();
        let mut variances = BTreeMap::new();
        for (strategy, stats) in self.strategies.iter().zip(entry.stats()) {
            if key.count(strategy) > 0 {
                means.insert(strategy.clone(), stats.mean());
                variances.insert(strategy.clone(), stats.variance());
            }
        }
        PayoffEstimate {
            key: key.clone(),
            count: entry.count(),
            means,
            variances,
        }
    }

    /// Sort profiles in canonical order
    fn sort_canonical(&self, keys: &mut [ProfileKey]) {
        keys.sort_by_cached_key(|k| Reverse(k.counts_over(&self.strategies)));
    }

    /// Every sampled profile in canonical order
    pub fn all_profiles(&self) -> Vec<ProfileKey> {
        let mut keys: Vec<ProfileKey> = self
            .entries
            .iter()
            .filter(|e| e.value().load().count() > 0)
            .map(|e| e.key().clone())
            .collect();
        self.sort_canonical(&mut keys);
        keys
    }

    /// Number of symmetric profiles of this game
    pub fn number_of_profiles(&self) -> u64 {
        self.combinations
    }

    /// True when every symmetric profile has at least one sample
    pub fn is_complete(&self) -> bool {
        self.all_profiles().len() as u64 == self.combinations
    }

    /// Total number of samples recorded
    pub fn total_samples(&self) -> u64 {
        self.entries.iter().map(|e| e.value().load().count()).sum()
    }

    /// Statistics of the recorded externality values
    pub fn externality_stats(&self) -> RunningStats {
        **self.externality.load()
    }

    /// Confidence interval of the mean externality
    pub fn externality_interval(&self, level: ConfidenceLevel) -> Option<(f64, f64)> {
        self.externality_stats().confidence_interval(level)
    }

    /// Estimates of every sampled profile, canonical order
    pub fn estimates(&self) -> Vec<PayoffEstimate> {
        self.all_profiles()
            .into_iter()
            .filter_map(|key| {
                let entry = self.entry(&key)?;
                Some(self.estimate(&key, &entry))
            })
            .collect()
    }

    /// Ordered copy of all entries
    pub fn snapshot(&self) -> PayoffSnapshot {
        PayoffSnapshot {
            participants: self.participants,
            strategies: self.strategies.clone(),
            entries: self.estimates(),
            externality: self.externality_stats(),
        }
    }
}

impl<V: PayoffVisitor + ?Sized> Visitable<V> for HeuristicSymmetricPayoffMatrix {
    fn accept(&self, visitor: &mut V) {
        for estimate in self.estimates() {
            visitor.visit(&estimate.key, &estimate);
        }
    }
}

impl Writable for HeuristicSymmetricPayoffMatrix {
    fn format_result(&self) -> String {
        self.snapshot().format_result()
    }
}

/// Point-in-time copy of a payoff matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffSnapshot {
    pub participants: u32,
    pub strategies: Vec<StrategyId>,
    pub entries: Vec<PayoffEstimate>,
    pub externality: RunningStats,
}

impl Writable for PayoffSnapshot {
    fn format_result(&self) -> String {
        let mut out = String::new();
        for estimate in &self.entries {
            let means: Vec<f64> = estimate.means.values().copied().collect();
            out.push_str(&format!("V:{}->{:?}\n", estimate.key, means));
            out.push_str(&format!("C:{}->{}\n", estimate.key, estimate.count));
        }
        out
    }
}
