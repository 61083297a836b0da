/// Discrete simulation time, counted in steps since the clock was last reset
pub type TimeCount = u64;

/// Payoff value attributed to a participant after a replication
pub type Payoff = f64;

/// Seed for the deterministic random generators of a replication
pub type Seed = u64;
