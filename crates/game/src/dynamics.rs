//! Replicator-dynamics coefficients

use gridflex_core::ProfileKey;
use gridflex_ports::Visitable;

use crate::matrix::{HeuristicSymmetricPayoffMatrix, PayoffEstimate, PayoffVisitor};

/// Collects the mean payoff of every (profile, played strategy) pair
#[derive(Debug, Default)]
struct FactorCollector {
    factors: Vec<f64>,
}

impl PayoffVisitor for FactorCollector {
    fn visit(&mut self, key: &ProfileKey, estimate: &PayoffEstimate) {
        for (strategy, _) in key.iter() {
            if let Some(mean) = estimate.mean(strategy) {
                self.factors.push(mean);
            }
        }
    }
}

/// Coefficients of the replicator equations of an empirical game
///
/// One factor per sampled profile and strategy played in it, profiles in
/// canonical order and strategies in sorted order within a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionaryGameDynamics {
    factors: Vec<f64>,
}

impl EvolutionaryGameDynamics {
    pub fn from_matrix(matrix: &HeuristicSymmetricPayoffMatrix) -> Self {
        let mut collector = FactorCollector::default();
        matrix.accept(&mut collector);
        Self {
            factors: collector.factors,
        }
    }

    pub fn factors(&self) -> &[f64] {
        &self.factors
    }

    /// Factors as `a=…;` assignment lines, one letter per factor
    pub fn parameters_string(&self) -> String {
        let mut out = String::from("\n");
        for (i, factor) in self.factors.iter().enumerate() {
            out.push_str(&format!("{}={:?};\n", parameter_name(i), factor));
        }
        out
    }
}

/// a, b, ..., z, aa, ab, ...
fn parameter_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'a' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}
