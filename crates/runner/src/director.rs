//! Game director
//!
//! Selects the profiles of an experiment, runs every replication on a
//! bounded pool and folds the outcomes into one payoff matrix.
//!
//! ```text
//! selected profiles ──► replication 0..samples ──► permit ──► spawn_blocking
//!                                                                 │
//!        ExperimentReport ◄── join (barrier) ◄── record_sample ◄──┘
//! ```

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gridflex_core::{FlexConstraints, ProfileKey, Seed, StrategyId, StrategyProfile};
use gridflex_game::combinatorics::{multi_combination_size, multi_combinations};
use gridflex_game::{
    EvolutionaryGameDynamics, GameResult, HeuristicSymmetricPayoffMatrix, PayoffSnapshot,
};
use gridflex_ports::{AllocationSolver, StrategyFactory, Writable};
use gridflex_sim::{EventFactory, RunExecutor};
use gridflex_solver::{MemoizingSolver, SOLVER_NAMES, SerializedSolver, create_solver};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{Id, JoinError, JoinSet};

use crate::config::{DirectorConfig, ProfileSelection};
use crate::error::{DirectorError, DirectorResult};
use crate::report::{ExperimentReport, ReplicationFault};

/// Random draws allowed per requested profile in sampled selection
const SAMPLING_ATTEMPTS_PER_PROFILE: usize = 20;

/// Largest profile space enumerated exhaustively
pub const MAX_EXHAUSTIVE_PROFILES: u64 = 100_000;

/// Seed of one replication
///
/// Replayable: the same base seed, profile position and replication index
/// always give the same seed.
pub fn replication_seed(base: Seed, profile_index: usize, replication: u32) -> Seed {
    base.wrapping_add(u64::from(replication))
        ^ (profile_index as u64).wrapping_mul(0xA24B_AED4_963E_E407)
}

/// Requests best-effort cancellation of a running experiment
///
/// Cloneable and usable from any thread. Replications already handed to a
/// worker run to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Identity of one dispatched replication, kept by the dispatcher
struct Replication {
    profile: ProfileKey,
    replication: u32,
    seed: Seed,
    /// Held until the outcome has been settled by the dispatcher
    _permit: OwnedSemaphorePermit,
}

type Joined = Result<(Id, DirectorResult<()>), JoinError>;

/// Runs empirical game experiments
pub struct GameDirector {
    config: DirectorConfig,
    executor: Arc<RunExecutor>,
    solver: Arc<dyn AllocationSolver>,
    matrix: Arc<HeuristicSymmetricPayoffMatrix>,
    profiles: Vec<ProfileKey>,
    cancel: CancelHandle,
}

impl GameDirector {
    /// Validate `config` and prepare an experiment
    ///
    /// Every configuration error surfaces here, before any replication runs.
    pub fn new(
        config: DirectorConfig,
        strategies: Arc<dyn StrategyFactory>,
        solver: Arc<dyn AllocationSolver>,
    ) -> DirectorResult<Self> {
        if config.participants == 0 {
            return Err(DirectorError::InvalidArgument(
                "Experiment needs at least one participant".into(),
            ));
        }
        if config.samples_per_profile == 0 {
            return Err(DirectorError::InvalidArgument(
                "Samples per profile must be positive".into(),
            ));
        }
        if config.concurrency == 0 {
            return Err(DirectorError::InvalidArgument(
                "Concurrency must be positive".into(),
            ));
        }
        if config.concurrency > Semaphore::MAX_PERMITS {
            return Err(DirectorError::InvalidArgument(format!(
                "Concurrency {} exceeds the limit of {}",
                config.concurrency,
                Semaphore::MAX_PERMITS
            )));
        }
        if config.run.horizon == 0 {
            return Err(DirectorError::InvalidArgument(
                "Replication horizon must be positive".into(),
            ));
        }
        if let Some(unsupported) = config.strategies.iter().find(|s| !strategies.supports(s)) {
            return Err(DirectorError::InvalidArgument(format!(
                "Strategy {} is not provided by the strategy factory",
                unsupported
            )));
        }

        let matrix = HeuristicSymmetricPayoffMatrix::new(
            config.participants,
            config.strategies.clone(),
        )?;

        let mut events = EventFactory::standard();
        for event_type in &config.event_types {
            events.register(event_type.as_str());
        }
        let executor = RunExecutor::with_events(strategies, config.run.clone(), events)?;

        let solver: Arc<dyn AllocationSolver> = if config.solver_reentrant {
            solver
        } else {
            debug!("Serializing calls to {}", solver.name());
            Arc::new(SerializedSolver::new(solver))
        };
        // Outside the gate, so cache hits never wait for it
        let solver: Arc<dyn AllocationSolver> = if config.memoize_solver {
            debug!("Memoizing solutions of {}", solver.name());
            Arc::new(MemoizingSolver::new(solver))
        } else {
            solver
        };

        let profiles = select_profiles(&config.selection, &matrix)?;

        Ok(Self {
            config,
            executor: Arc::new(executor),
            solver,
            matrix: Arc::new(matrix),
            profiles,
            cancel: CancelHandle::default(),
        })
    }

    /// Director using the reference solver named by `config.solver`
    pub fn from_config(
        config: DirectorConfig,
        strategies: Arc<dyn StrategyFactory>,
    ) -> DirectorResult<Self> {
        let solver = create_solver(&config.solver).ok_or_else(|| {
            DirectorError::InvalidArgument(format!(
                "Unknown solver {}, expected one of {:?}",
                config.solver, SOLVER_NAMES
            ))
        })?;
        Self::new(config, strategies, Arc::from(solver))
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    /// Profiles the experiment samples, canonical order
    pub fn selected_profiles(&self) -> &[ProfileKey] {
        &self.profiles
    }

    /// Handle for stopping the dispatch of new replications
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Payoff matrix filled by the experiment
    pub fn payoffs(&self) -> &HeuristicSymmetricPayoffMatrix {
        &self.matrix
    }

    /// Run every replication of every selected profile
    ///
    /// Returns once all dispatched replications have finished. Failed
    /// replications, panicking ones included, are listed in the report next
    /// to the samples that made it into the matrix.
    pub async fn run_experiment(&self) -> DirectorResult<ExperimentReport> {
        let mut report = ExperimentReport::start(self.profiles.len());
        let total = self.profiles.len() as u64 * u64::from(self.config.samples_per_profile);
        info!(
            "Experiment {} started: {} profiles x {} samples on {} workers",
            report.experiment_id,
            self.profiles.len(),
            self.config.samples_per_profile,
            self.config.concurrency
        );

        let permits = Arc::new(Semaphore::new(self.config.concurrency));
        let mut workers: JoinSet<DirectorResult<()>> = JoinSet::new();
        let mut in_flight: HashMap<Id, Replication> = HashMap::new();

        'dispatch: for (profile_index, key) in self.profiles.iter().enumerate() {
            let profile = key.expand();
            for replication in 0..self.config.samples_per_profile {
                while let Some(joined) = workers.try_join_next_with_id() {
                    self.settle(joined, &mut in_flight, &mut report, total);
                }
                // Pool saturated: settle one replication so its fault is seen before the next dispatch
                if permits.available_permits() == 0 {
                    if let Some(joined) = workers.join_next_with_id().await {
                        self.settle(joined, &mut in_flight, &mut report, total);
                    }
                }

                if self.cancel.is_cancelled() {
                    info!("Experiment {} cancelled", report.experiment_id);
                    report.cancelled = true;
                    break 'dispatch;
                }
                if report.aborted {
                    break 'dispatch;
                }

                let permit = Arc::clone(&permits)
                    .acquire_owned()
                    .await
                    .map_err(|e| DirectorError::Worker(e.to_string()))?;

                let seed = replication_seed(self.config.base_seed, profile_index, replication);
                let executor = Arc::clone(&self.executor);
                let solver = Arc::clone(&self.solver);
                let matrix = Arc::clone(&self.matrix);
                let constraints = self.config.constraints;
                let profile = profile.clone();

                let handle = workers.spawn_blocking(move || {
                    replicate(&executor, solver.as_ref(), &matrix, &profile, &constraints, seed)
                });
                in_flight.insert(
                    handle.id(),
                    Replication {
                        profile: key.clone(),
                        replication,
                        seed,
                        _permit: permit,
                    },
                );
                report.dispatched += 1;
            }
        }

        // Barrier
        while let Some(joined) = workers.join_next_with_id().await {
            self.settle(joined, &mut in_flight, &mut report, total);
        }
        report.finish();

        info!(
            "Experiment {} finished: {}/{} replications recorded, {} faults in {} ms",
            report.experiment_id,
            report.completed,
            report.dispatched,
            report.faults.len(),
            report.elapsed().num_milliseconds()
        );

        Ok(report)
    }

    /// Blocking variant of [`GameDirector::run_experiment`]
    ///
    /// Builds its own multi-thread runtime, so it must not be called from
    /// inside a tokio runtime.
    pub fn run_experiment_blocking(&self) -> DirectorResult<ExperimentReport> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("gridflex-director")
            .build()?;
        runtime.block_on(self.run_experiment())
    }

    /// Dynamics factors of the current matrix, with the experiment description
    pub fn results(&self) -> GameResult<Vec<f64>> {
        let dynamics = EvolutionaryGameDynamics::from_matrix(&self.matrix);
        GameResult::create(dynamics.factors().to_vec())
            .with_description("Reps", self.config.samples_per_profile)
            .with_description("agents", self.config.participants)
            .with_description("actions", self.matrix.strategies().len())
    }

    /// Payoff table and dynamics parameters ready for a report writer
    pub fn formatted_results(&self) -> ExperimentSummary {
        ExperimentSummary {
            snapshot: self.matrix.snapshot(),
            dynamics: EvolutionaryGameDynamics::from_matrix(&self.matrix),
        }
    }

    /// Fold a finished worker into the report and release its permit
    fn settle(
        &self,
        joined: Joined,
        in_flight: &mut HashMap<Id, Replication>,
        report: &mut ExperimentReport,
        total: u64,
    ) {
        let (id, result) = match joined {
            Ok((id, result)) => (id, result),
            Err(err) => (err.id(), Err(DirectorError::Worker(err.to_string()))),
        };
        let Some(job) = in_flight.remove(&id) else {
            warn!("Worker {} finished without a dispatched replication", id);
            return;
        };

        match result {
            Ok(()) => {
                report.completed += 1;
                debug!("Replication {}/{} recorded", report.completed, total);
            }
            Err(err) => {
                warn!(
                    "Replication {} of {} (seed {}) dropped: {}",
                    job.replication, job.profile, job.seed, err
                );
                report.faults.push(ReplicationFault {
                    profile: job.profile,
                    replication: job.replication,
                    seed: job.seed,
                    message: err.to_string(),
                });
                if self.config.fail_fast && !report.aborted {
                    warn!("Fail-fast: experiment {} stops dispatching", report.experiment_id);
                    report.aborted = true;
                }
            }
        }
    }
}

/// One replication, recorded into the matrix on success
fn replicate(
    executor: &RunExecutor,
    solver: &dyn AllocationSolver,
    matrix: &HeuristicSymmetricPayoffMatrix,
    profile: &StrategyProfile,
    constraints: &FlexConstraints,
    seed: Seed,
) -> DirectorResult<()> {
    let outcome = executor.execute(profile, constraints, solver, seed)?;
    matrix.record_sample(profile, &outcome)?;
    Ok(())
}

fn select_profiles(
    selection: &ProfileSelection,
    matrix: &HeuristicSymmetricPayoffMatrix,
) -> DirectorResult<Vec<ProfileKey>> {
    let strategies = matrix.strategies();
    let participants = matrix.participants();

    let mut profiles = match selection {
        ProfileSelection::Exhaustive => bounded_exhaustive(matrix)?,
        ProfileSelection::Configured(keys) => {
            if keys.is_empty() {
                return Err(DirectorError::InvalidArgument(
                    "Configured selection lists no profiles".into(),
                ));
            }
            for key in keys {
                if key.participants() != participants {
                    return Err(DirectorError::InvalidArgument(format!(
                        "Profile {} has {} participants, expected {}",
                        key,
                        key.participants(),
                        participants
                    )));
                }
                if let Some(unknown) = key.strategies().find(|s| strategies.binary_search(s).is_err()) {
                    return Err(DirectorError::InvalidArgument(format!(
                        "Profile {} uses unknown strategy {}",
                        key, unknown
                    )));
                }
            }
            let unique: BTreeSet<ProfileKey> = keys.iter().cloned().collect();
            unique.into_iter().collect()
        }
        ProfileSelection::Sampled { budget, seed } => {
            if *budget == 0 {
                return Err(DirectorError::InvalidArgument(
                    "Sampling budget must be positive".into(),
                ));
            }
            if *budget as u64 >= matrix.number_of_profiles() {
                bounded_exhaustive(matrix)?
            } else {
                sampled(strategies, participants, *budget, *seed)
            }
        }
    };

    profiles.sort_by_cached_key(|k| Reverse(k.counts_over(strategies)));
    debug!(
        "Selected {} of {} profiles",
        profiles.len(),
        multi_combination_size(strategies.len(), participants as usize)
    );
    Ok(profiles)
}

fn bounded_exhaustive(matrix: &HeuristicSymmetricPayoffMatrix) -> DirectorResult<Vec<ProfileKey>> {
    let size = matrix.number_of_profiles();
    if size > MAX_EXHAUSTIVE_PROFILES {
        return Err(DirectorError::InvalidArgument(format!(
            "{} profiles exceed the exhaustive limit of {}, use sampled selection",
            size, MAX_EXHAUSTIVE_PROFILES
        )));
    }
    Ok(exhaustive(matrix.strategies(), matrix.participants()))
}

fn exhaustive(strategies: &[StrategyId], participants: u32) -> Vec<ProfileKey> {
    multi_combinations(strategies.len(), participants)
        .iter()
        .map(|counts| ProfileKey::from_aligned(strategies, counts))
        .collect()
}

/// Distinct profiles from uniformly random assignments
///
/// Stops early when the attempt allowance runs out, so fewer than `budget`
/// profiles may come back.
fn sampled(strategies: &[StrategyId], participants: u32, budget: usize, seed: Seed) -> Vec<ProfileKey> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = BTreeSet::new();
    let attempts = budget.saturating_mul(SAMPLING_ATTEMPTS_PER_PROFILE);
    for _ in 0..attempts {
        if picked.len() == budget {
            break;
        }
        let assignment = StrategyProfile::new(
            (0..participants)
                .map(|_| strategies[rng.gen_range(0..strategies.len())].clone())
                .collect(),
        );
        picked.insert(assignment.canonical());
    }
    picked.into_iter().collect()
}

/// Payoff table plus dynamics parameters of an experiment
#[derive(Debug, Clone)]
pub struct ExperimentSummary {
    pub snapshot: PayoffSnapshot,
    pub dynamics: EvolutionaryGameDynamics,
}

impl Writable for ExperimentSummary {
    fn format_result(&self) -> String {
        let mut out = self.snapshot.format_result();
        out.push_str("Dynamics equation params:");
        out.push_str(&self.dynamics.parameters_string());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridflex_sim::{BuiltinConfig, BuiltinStrategies};
    use gridflex_solver::GreedySolver;

    fn ids(names: &[&str]) -> Vec<StrategyId> {
        names.iter().map(|n| StrategyId::from(*n)).collect()
    }

    fn director(config: DirectorConfig) -> DirectorResult<GameDirector> {
        GameDirector::new(
            config,
            Arc::new(BuiltinStrategies::new(BuiltinConfig::default())),
            Arc::new(GreedySolver::new()),
        )
    }

    #[test]
    fn test_replication_seed_is_replayable() {
        assert_eq!(replication_seed(42, 0, 0), 42);
        assert_eq!(replication_seed(42, 0, 3), 45);
        assert_eq!(replication_seed(42, 2, 1), replication_seed(42, 2, 1));
        assert_ne!(replication_seed(42, 1, 0), replication_seed(42, 2, 0));
    }

    #[test]
    fn test_cancel_handle_is_shared() {
        let handle = CancelHandle::default();
        let clone = handle.clone();
        assert!(!handle.is_cancelled());
        clone.cancel();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_exhaustive_selection_order() {
        let d = director(DirectorConfig {
            strategies: ids(&["responsive", "noop"]),
            ..DirectorConfig::default()
        })
        .unwrap();

        let counts: Vec<Vec<u32>> = d
            .selected_profiles()
            .iter()
            .map(|k| k.counts_over(&ids(&["noop", "responsive"])))
            .collect();
        assert_eq!(counts, vec![vec![2, 0], vec![1, 1], vec![0, 2]]);
    }

    #[test]
    fn test_sampled_selection() {
        let config = DirectorConfig {
            participants: 4,
            strategies: ids(&["noop", "opportunistic", "responsive"]),
            selection: ProfileSelection::Sampled { budget: 5, seed: 3 },
            ..DirectorConfig::default()
        };
        let first = director(config.clone()).unwrap();
        let second = director(config).unwrap();

        assert!(!first.selected_profiles().is_empty());
        assert!(first.selected_profiles().len() <= 5);
        assert_eq!(first.selected_profiles(), second.selected_profiles());
        for key in first.selected_profiles() {
            assert_eq!(key.participants(), 4);
        }
    }

    #[test]
    fn test_sampled_budget_above_space_is_exhaustive() {
        let d = director(DirectorConfig {
            selection: ProfileSelection::Sampled { budget: 50, seed: 1 },
            ..DirectorConfig::default()
        })
        .unwrap();
        assert_eq!(d.selected_profiles().len(), 3);
    }

    #[test]
    fn test_configured_selection_is_deduplicated() {
        let key = ProfileKey::from_aligned(&ids(&["noop", "responsive"]), &[1, 1]);
        let d = director(DirectorConfig {
            selection: ProfileSelection::Configured(vec![key.clone(), key.clone()]),
            ..DirectorConfig::default()
        })
        .unwrap();
        assert_eq!(d.selected_profiles(), &[key]);
    }

    #[test]
    fn test_invalid_configurations() {
        let cases = [
            DirectorConfig {
                participants: 0,
                ..DirectorConfig::default()
            },
            DirectorConfig {
                samples_per_profile: 0,
                ..DirectorConfig::default()
            },
            DirectorConfig {
                concurrency: 0,
                ..DirectorConfig::default()
            },
            DirectorConfig {
                concurrency: Semaphore::MAX_PERMITS + 1,
                ..DirectorConfig::default()
            },
            DirectorConfig {
                strategies: Vec::new(),
                ..DirectorConfig::default()
            },
            DirectorConfig {
                strategies: ids(&["noop", "clairvoyant"]),
                ..DirectorConfig::default()
            },
            DirectorConfig {
                selection: ProfileSelection::Configured(vec![ProfileKey::from_aligned(
                    &ids(&["noop"]),
                    &[3],
                )]),
                ..DirectorConfig::default()
            },
            DirectorConfig {
                selection: ProfileSelection::Configured(vec![ProfileKey::from_aligned(
                    &ids(&["noop", "opportunistic"]),
                    &[1, 1],
                )]),
                ..DirectorConfig::default()
            },
            DirectorConfig {
                selection: ProfileSelection::Sampled { budget: 0, seed: 0 },
                ..DirectorConfig::default()
            },
        ];

        for config in cases {
            let err = director(config).err();
            assert!(
                matches!(err, Some(DirectorError::InvalidArgument(_))),
                "expected InvalidArgument, got {:?}",
                err
            );
        }
    }

    #[test]
    fn test_exhaustive_selection_is_bounded() {
        // C(502, 2) profiles for 500 participants over three strategies
        let crowded = DirectorConfig {
            participants: 500,
            strategies: ids(&["noop", "opportunistic", "responsive"]),
            ..DirectorConfig::default()
        };
        match director(crowded.clone()) {
            Err(DirectorError::InvalidArgument(msg)) => assert!(msg.contains("sampled")),
            other => panic!("expected InvalidArgument, got {:?}", other.map(|_| ())),
        }

        let sampled = director(DirectorConfig {
            selection: ProfileSelection::Sampled { budget: 5, seed: 3 },
            ..crowded
        })
        .unwrap();
        assert!(!sampled.selected_profiles().is_empty());
        assert!(sampled.selected_profiles().len() <= 5);
    }

    #[test]
    fn test_solver_from_config() {
        let strategies = Arc::new(BuiltinStrategies::new(BuiltinConfig::default()));
        let unknown = GameDirector::from_config(
            DirectorConfig {
                solver: "simplex".into(),
                ..DirectorConfig::default()
            },
            strategies.clone(),
        );
        assert!(matches!(unknown, Err(DirectorError::InvalidArgument(_))));

        let d = GameDirector::from_config(
            DirectorConfig {
                solver: "dummy".into(),
                memoize_solver: true,
                ..DirectorConfig::default()
            },
            strategies,
        )
        .unwrap();
        assert_eq!(d.solver.name(), "dummy");
    }

    #[test]
    fn test_results_description() {
        let d = director(DirectorConfig::default()).unwrap();
        let results = d.results();
        assert_eq!(results.describe("Reps"), Some("10"));
        assert_eq!(results.describe("agents"), Some("2"));
        assert_eq!(results.describe("actions"), Some("2"));
        assert!(results.results().is_empty());
    }
}
