//! Flexibility activation bounds and solver results

mod allocation;
mod constraints;

pub use allocation::{AllocResult, Allocation, INFEASIBLE_OBJECTIVE};
pub use constraints::{FlexConstraints, FlexConstraintsBuilder};
