//! # varelim-rs: Exact Inference by Variable Elimination
//!
//! **`varelim-rs`** computes posterior distributions in discrete Bayesian networks.
//! Given the conditional probability tables of a network, it answers queries of the form
//! `P(Q | E = e)` exactly, by algebraically eliminating every variable that is neither
//! queried nor observed.
//!
//! ## Factors
//!
//! Everything is expressed with [`Factor`][crate::factor::Factor]s: explicit tables from
//! joint assignments of a scope of variables to non-negative weights.
//! The [factor algebra][crate::algebra] provides four pure operations:
//!
//! - **restrict**: fix a variable to an observed value;
//! - **sumout**: marginalize a variable away;
//! - **multiply**: pointwise product, joined on shared variables;
//! - **normalize**: rescale to total mass 1.
//!
//! Every operation returns a new factor with a well-defined row order, so results are
//! reproducible row by row, not just as sets.
//!
//! ## Basic Usage
//!
//! ```rust
//! use varelim_rs::elimination::inference;
//! use varelim_rs::evidence::Evidence;
//! use varelim_rs::factor::Factor;
//! use varelim_rs::value::Value;
//!
//! // Burglary -> Alarm
//! let burglary = Factor::from_table(["B"], [([true], 0.01), ([false], 0.99)]).unwrap();
//! let alarm = Factor::from_table(
//!     ["A", "B"],
//!     [([true, true], 0.95), ([false, true], 0.05), ([true, false], 0.02), ([false, false], 0.98)],
//! )
//! .unwrap();
//!
//! let evidence = Evidence::new().observe("A", true);
//! let posterior = inference(&[burglary, alarm], &["B"], &evidence).unwrap();
//!
//! let p = posterior.get(&[("B", Value::TRUE)]).unwrap();
//! assert!((p - 0.0095 / (0.0095 + 0.0198)).abs() < 1e-12);
//! ```
//!
//! ## Core Components
//!
//! - **[`factor`]**: the table data model.
//! - **[`algebra`]**: restrict, sumout, multiply, join, normalize.
//! - **[`elimination`]**: the [`VariableElimination`][crate::elimination::VariableElimination] engine.
//! - **[`network`]**: loading networks from JSON files.

pub mod algebra;
pub mod elimination;
pub mod error;
pub mod evidence;
pub mod factor;
pub mod network;
pub mod value;
