//! Null-model statistics: label permutations, kernel densities and
//! empirical significance

pub mod density;
pub mod permutation;
pub mod significance;
