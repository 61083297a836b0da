//! Symmetric profile enumeration
//!
//! A symmetric profile over `s` strategies and `p` participants is a count
//! vector of length `s` summing to `p`. There are C(p + s - 1, p) of them.

/// Number of multi-combinations of `strategies` items taken `participants` at a time
///
/// Saturates at `u64::MAX`.
pub fn multi_combination_size(strategies: usize, participants: usize) -> u64 {
    if strategies == 0 {
        return if participants == 0 { 1 } else { 0 };
    }
    // C(n, k) with n = p + s - 1 and k = min(p, s - 1)
    let n = (participants + strategies - 1) as u128;
    let k = participants.min(strategies - 1) as u128;
    let mut result: u128 = 1;
    for i in 1..=k {
        result = result * (n - k + i) / i;
        if result > u64::MAX as u128 {
            return u64::MAX;
        }
    }
    result as u64
}

/// Every count vector, in descending lexicographic order
///
/// For two strategies and two participants: (2,0), (1,1), (0,2).
pub fn multi_combinations(strategies: usize, participants: u32) -> Vec<Vec<u32>> {
    let mut out = Vec::new();
    if strategies == 0 {
        return out;
    }
    let mut current = Vec::with_capacity(strategies);
    fill(strategies, participants, &mut current, &mut out);
    out
}

fn fill(strategies: usize, remaining: u32, current: &mut Vec<u32>, out: &mut Vec<Vec<u32>>) {
    if current.len() + 1 == strategies {
        current.push(remaining);
        out.push(current.clone());
        current.pop();
        return;
    }
    for count in (0..=remaining).rev() {
        current.push(count);
        fill(strategies, remaining - count, current, out);
        current.pop();
    }
}
