//! Replication Integration Test
//!
//! Runs complete replications through the kernel with the reference
//! solvers and built-in strategies:
//! - activation plan → scheduled activations → settlements
//! - infeasible plans
//! - seeded determinism of stochastic strategies

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::sync::Arc;

use approx::assert_relative_eq;
use gridflex_core::{
    FlexConstraints, INFEASIBLE_PAYOFF, Seed, StrategyId, StrategyProfile, attributes,
    event_types,
};
use gridflex_sim::{
    BuiltinConfig, BuiltinStrategies, EventFactory, EventRecorder, KernelError, KernelResult,
    Listener, Participant, RunConfig, RunExecutor, StrategyFactory,
};
use gridflex_solver::{DummySolver, GreedySolver};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn constraints(required: u32) -> FlexConstraints {
    FlexConstraints::builder().required_activations(required).build()
}

fn builtin_executor(config: BuiltinConfig) -> RunExecutor {
    RunExecutor::new(
        Arc::new(BuiltinStrategies::new(config)),
        RunConfig::default(),
    )
    .unwrap()
}

/// Two responsive providers with staggered activations never share a slot
#[test]
fn test_greedy_plan_with_responsive_providers() {
    init_logging();
    let executor = builtin_executor(BuiltinConfig::default());
    let profile = StrategyProfile::from_ids(["responsive", "responsive"]);

    let outcome = executor
        .execute(&profile, &constraints(2), &GreedySolver::new(), 42)
        .unwrap();

    // 4 slots each, full reward of 10 minus cost 1 per slot
    assert!(outcome.feasible);
    assert_eq!(outcome.time_count, 96);
    assert_relative_eq!(outcome.payoffs[0], 36.0);
    assert_relative_eq!(outcome.payoffs[1], 36.0);
    assert_relative_eq!(outcome.externality, 0.0);
}

#[test]
fn test_event_flow_is_observable() {
    init_logging();
    let executor = builtin_executor(BuiltinConfig::default());
    let profile = StrategyProfile::from_ids(["noop", "responsive"]);

    let recorder = Rc::new(RefCell::new(EventRecorder::new()));
    let observer: Rc<RefCell<dyn Listener>> = recorder.clone();
    let outcome = executor
        .execute_observed(&profile, &constraints(2), &GreedySolver::new(), 7, &[observer])
        .unwrap();

    let recorder = recorder.borrow();
    let events = recorder.events();
    assert!(events[0].is(event_types::SIMULATION_STARTED));
    assert!(events[events.len() - 1].is(event_types::SIMULATION_STOPPED));
    assert_eq!(recorder.count(event_types::CLOCK_TICK), 96);
    assert_eq!(recorder.count(event_types::FLEX_ACTIVATION), 8);
    assert_eq!(recorder.count(event_types::MARKET_SETTLEMENT), 8);

    // The noop provider's 4 slots go undelivered
    let undelivered = recorder
        .of_type(event_types::MARKET_SETTLEMENT)
        .filter(|e| e.int(attributes::DELIVERED) == Some(0))
        .count();
    assert_eq!(undelivered, 4);
    assert_relative_eq!(outcome.externality, 4.0 * 20.0);
    assert_eq!(outcome.payoffs, vec![0.0, 36.0]);

    // Every activation volume is one quarter hour
    for activation in recorder.of_type(event_types::FLEX_ACTIVATION) {
        assert_eq!(activation.float(attributes::VOLUME), Some(0.25));
    }
}

#[test]
fn test_infeasible_requirement_still_runs_the_clock() {
    init_logging();
    let executor = builtin_executor(BuiltinConfig::default());
    let profile = StrategyProfile::from_ids(["responsive", "opportunistic"]);

    let recorder = Rc::new(RefCell::new(EventRecorder::new()));
    let observer: Rc<RefCell<dyn Listener>> = recorder.clone();
    // At most 7 activations fit the default horizon
    let outcome = executor
        .execute_observed(&profile, &constraints(10), &GreedySolver::new(), 7, &[observer])
        .unwrap();

    assert!(!outcome.feasible);
    assert_eq!(outcome.payoffs, vec![INFEASIBLE_PAYOFF, INFEASIBLE_PAYOFF]);
    assert_eq!(recorder.borrow().count(event_types::CLOCK_TICK), 96);
    assert_eq!(recorder.borrow().count(event_types::FLEX_ACTIVATION), 0);
}

#[test]
fn test_dummy_solver_leaves_payoffs_untouched() {
    let executor = builtin_executor(BuiltinConfig::default());
    let profile = StrategyProfile::from_ids(["responsive", "opportunistic", "noop"]);

    let outcome = executor
        .execute(&profile, &constraints(3), &DummySolver::new(), 1)
        .unwrap();
    assert!(outcome.feasible);
    assert_eq!(outcome.payoffs, vec![0.0; 3]);
}

#[test]
fn test_opportunistic_replications_are_replayable() {
    let executor = builtin_executor(BuiltinConfig::default());
    let profile = StrategyProfile::from_ids(["opportunistic", "opportunistic", "opportunistic"]);
    let run = |seed: Seed| {
        executor
            .execute(&profile, &constraints(4), &GreedySolver::new(), seed)
            .unwrap()
            .payoffs
    };

    assert_eq!(run(3), run(3));

    let distinct: BTreeSet<String> = (0..10).map(|s| format!("{:?}", run(s))).collect();
    assert!(distinct.len() > 1, "seeds should change delivery decisions");
}

#[test]
fn test_certain_delivery_matches_responsive() {
    let executor = builtin_executor(BuiltinConfig {
        delivery_probability: 1.0,
        ..Default::default()
    });
    let opportunistic = executor
        .execute(
            &StrategyProfile::from_ids(["opportunistic", "opportunistic"]),
            &constraints(3),
            &GreedySolver::new(),
            9,
        )
        .unwrap();
    let responsive = executor
        .execute(
            &StrategyProfile::from_ids(["responsive", "responsive"]),
            &constraints(3),
            &GreedySolver::new(),
            9,
        )
        .unwrap();

    for (a, b) in opportunistic.payoffs.iter().zip(&responsive.payoffs) {
        assert_relative_eq!(*a, *b);
    }
}

/// Built-in strategies that additionally listen for a custom event type
struct BlackoutAware(BuiltinStrategies);

impl StrategyFactory for BlackoutAware {
    fn create(
        &self,
        strategy: &StrategyId,
        index: usize,
        seed: Seed,
    ) -> KernelResult<Box<dyn Participant>> {
        self.0.create(strategy, index, seed)
    }

    fn supports(&self, strategy: &StrategyId) -> bool {
        self.0.supports(strategy)
    }

    fn event_types(&self) -> Vec<String> {
        vec!["grid:blackout".to_string()]
    }
}

#[test]
fn test_strategy_event_types_checked_up_front() {
    let strategies = Arc::new(BlackoutAware(BuiltinStrategies::default()));

    let err = RunExecutor::new(strategies.clone(), RunConfig::default()).unwrap_err();
    assert_eq!(err, KernelError::UnknownEventType("grid:blackout".into()));

    let mut events = EventFactory::standard();
    events.register("grid:blackout");
    assert!(RunExecutor::with_events(strategies, RunConfig::default(), events).is_ok());
}
