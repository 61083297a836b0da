//! Experiment configuration

use gridflex_core::{FlexConstraints, ProfileKey, Seed, StrategyId};
use gridflex_sim::RunConfig;
use serde::{Deserialize, Serialize};

use crate::error::DirectorResult;

/// Which symmetric profiles an experiment samples
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSelection {
    /// Every multi-combination of the strategies over the participants
    #[default]
    Exhaustive,
    /// An explicit list of profiles
    Configured(Vec<ProfileKey>),
    /// A seeded random subset of at most `budget` profiles
    Sampled { budget: usize, seed: Seed },
}

/// Experiment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    /// Players per replication
    pub participants: u32,
    /// Strategy set of the game
    pub strategies: Vec<StrategyId>,
    /// Replications per selected profile
    pub samples_per_profile: u32,
    /// Maximum number of replications running at once
    pub concurrency: usize,
    /// Profiles to sample
    pub selection: ProfileSelection,
    /// Stop dispatching after the first failed replication
    pub fail_fast: bool,
    /// Whether the solver may be called from several workers at once
    pub solver_reentrant: bool,
    /// Reference solver used by `GameDirector::from_config`
    pub solver: String,
    /// Solve each distinct set of constraints only once per experiment
    pub memoize_solver: bool,
    /// Seed of the first replication
    pub base_seed: Seed,
    /// Event types registered on top of the kernel's
    pub event_types: Vec<String>,
    /// Economic parameters of every replication
    pub run: RunConfig,
    /// Flexibility bounds handed to the solver
    pub constraints: FlexConstraints,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            participants: 2,
            strategies: vec![StrategyId::from("noop"), StrategyId::from("responsive")],
            samples_per_profile: 10,
            concurrency: 4,
            selection: ProfileSelection::Exhaustive,
            fail_fast: false,
            solver_reentrant: true,
            solver: "greedy".into(),
            memoize_solver: false,
            base_seed: 42,
            event_types: Vec::new(),
            run: RunConfig::default(),
            constraints: FlexConstraints::default(),
        }
    }
}

impl DirectorConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> DirectorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> DirectorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirectorError;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = DirectorConfig::from_json(
            r#"{
                "participants": 3,
                "strategies": ["responsive", "opportunistic"],
                "selection": {"sampled": {"budget": 2, "seed": 7}},
                "run": {"horizon": 48},
                "constraints": {"required_activations": 2}
            }"#,
        )
        .unwrap();

        assert_eq!(config.participants, 3);
        assert_eq!(config.samples_per_profile, 10);
        assert_eq!(config.selection, ProfileSelection::Sampled { budget: 2, seed: 7 });
        assert_eq!(config.run.horizon, 48);
        assert_eq!(config.run.activation_reward, 10.0);
        assert_eq!(config.constraints.required_activations(), 2);
        assert_eq!(config.constraints.activation_duration(), 2);
        assert_eq!(config.solver, "greedy");
        assert!(!config.memoize_solver);
    }

    #[test]
    fn test_solver_choice() {
        let config =
            DirectorConfig::from_json(r#"{"solver": "dummy", "memoize_solver": true}"#).unwrap();
        assert_eq!(config.solver, "dummy");
        assert!(config.memoize_solver);
    }

    #[test]
    fn test_configured_profiles() {
        let config = DirectorConfig::from_json(
            r#"{"selection": {"configured": [{"noop": 2}, {"noop": 1, "responsive": 1}]}}"#,
        )
        .unwrap();

        let ProfileSelection::Configured(keys) = config.selection else {
            panic!("expected configured selection");
        };
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].count(&StrategyId::from("noop")), 2);
    }

    #[test]
    fn test_json_round_trip() {
        let config = DirectorConfig::default();
        let back = DirectorConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_malformed_json() {
        let err = DirectorConfig::from_json("{ participants: }").unwrap_err();
        assert!(matches!(err, DirectorError::Config(_)));
    }
}
