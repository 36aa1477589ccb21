//! Leakage-free rolling form features, league-relative strength and ranking derivations, and a
//! Poisson expected-goals outcome model for football matches.

pub mod classifier;
pub mod config;
pub mod csv;
pub mod data;
pub mod domain;
pub mod expand;
pub mod factorial;
pub mod feature;
pub mod form;
pub mod goal_rate;
pub mod linear;
pub mod poisson;
pub mod predictor;
pub mod print;
pub mod registry;
pub mod scoregrid;
pub mod scorer;
pub mod strength;
pub mod summary;
pub mod xg;

#[cfg(test)]
pub(crate) mod testing;

#[doc = include_str!("../README.md")]
#[cfg(doc)]
fn readme() {}
