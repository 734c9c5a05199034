//! Variable elimination.
//!
//! Answers a query `P(Q | E = e)` over a list of factors:
//!
//! 1. every factor mentioning an evidence variable is restricted to the observed value;
//! 2. each hidden variable (neither queried nor observed) is eliminated in turn:
//!    the live factors mentioning it are multiplied together and the variable is
//!    summed out of the product, which then replaces them;
//! 3. the remaining factors are multiplied into one factor over the query variables;
//! 4. that factor is normalized.
//!
//! The result does not depend on the elimination order, up to floating-point rounding.
//! Without an explicit order, hidden variables are eliminated in the order they first
//! appear in the factor scopes, so traces are reproducible.
//!
//! # Examples
//!
//! ```
//! use varelim_rs::elimination::inference;
//! use varelim_rs::evidence::Evidence;
//! use varelim_rs::factor::Factor;
//! use varelim_rs::value::Value;
//!
//! // Rain -> WetGrass
//! let rain = Factor::from_table(["R"], [([true], 0.2), ([false], 0.8)]).unwrap();
//! let wet = Factor::from_table(
//!     ["W", "R"],
//!     [([true, true], 0.9), ([false, true], 0.1), ([true, false], 0.2), ([false, false], 0.8)],
//! )
//! .unwrap();
//!
//! let posterior = inference(&[rain, wet], &["R"], &Evidence::new().observe("W", true)).unwrap();
//! let p = posterior.get(&[("R", Value::TRUE)]).unwrap();
//! assert!((p - 0.18 / 0.34).abs() < 1e-12);
//! ```

use std::collections::HashSet;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::evidence::Evidence;
use crate::factor::Factor;

/// Settings for [`VariableElimination`].
///
/// ```
/// use varelim_rs::elimination::EliminationConfig;
///
/// let config = EliminationConfig::default().with_order(["B", "A"]).with_cartesian(true);
/// assert_eq!(config.order.as_deref(), Some(&["B".to_string(), "A".to_string()][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EliminationConfig {
    /// Hidden variables to eliminate, in order.
    /// When `None`, every variable that is neither queried nor observed is eliminated,
    /// in order of first appearance across the factor scopes.
    pub order: Option<Vec<String>>,
    /// Combine factors with [`Factor::join`] instead of [`Factor::multiply`],
    /// so that factors with disjoint scopes are crossed rather than rejected.
    pub allow_cartesian: bool,
}

impl EliminationConfig {
    pub fn with_order<S: Into<String>>(mut self, order: impl IntoIterator<Item = S>) -> Self {
        self.order = Some(order.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_cartesian(mut self, allow: bool) -> Self {
        self.allow_cartesian = allow;
        self
    }
}

/// Exact inference engine.
///
/// The engine holds only configuration; every call to [`infer`][Self::infer]
/// works on its own list of live factors, so one engine can serve
/// concurrent queries.
#[derive(Debug, Clone, Default)]
pub struct VariableElimination {
    config: EliminationConfig,
}

impl VariableElimination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EliminationConfig) -> Self {
        Self { config }
    }

    /// Computes the posterior over `query` given `evidence`.
    ///
    /// Returns a normalized factor whose scope is exactly the query variables.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] if the query is empty or repeats a variable,
    /// a query variable is also observed or listed for elimination, an evidence
    /// variable appears in no factor, the surviving factors do not cover exactly
    /// the query variables, or the evidence has zero probability.
    /// Errors from the underlying algebra are passed through unchanged.
    pub fn infer<S: AsRef<str>>(&self, factors: &[Factor], query: &[S], evidence: &Evidence) -> Result<Factor> {
        let query: Vec<&str> = query.iter().map(|var| var.as_ref()).collect();
        info!("infer(query = {:?}, evidence = {:?})", query, evidence);

        self.validate(factors, &query, evidence)?;

        let hidden = self.hidden_variables(factors, &query, evidence);
        debug!("hidden variables: {:?}", hidden);

        let live = apply_evidence(factors, evidence)?;
        let live = hidden.iter().try_fold(live, |live, var| self.eliminate(live, var))?;
        let result = self.combine(live)?;

        if result.scope().len() != query.len() || !query.iter().all(|var| result.contains(var)) {
            return Err(Error::op(format!(
                "remaining factors cover {:?}, expected exactly the query {:?}",
                result.scope(),
                query
            )));
        }

        let result = result.normalize()?;
        debug!("posterior:\n{}", result);
        Ok(result)
    }

    fn validate(&self, factors: &[Factor], query: &[&str], evidence: &Evidence) -> Result<()> {
        if factors.is_empty() {
            return Err(Error::op("no factors to infer from"));
        }
        if query.is_empty() {
            return Err(Error::op("empty query"));
        }

        let mut seen = HashSet::new();
        for &var in query {
            if !seen.insert(var) {
                return Err(Error::op(format!("query variable '{}' given twice", var)));
            }
            if evidence.contains(var) {
                return Err(Error::op(format!("query variable '{}' is also observed", var)));
            }
            if let Some(order) = &self.config.order {
                if order.iter().any(|h| h == var) {
                    return Err(Error::op(format!("query variable '{}' is in the elimination order", var)));
                }
            }
        }

        for var in evidence.variables() {
            if !factors.iter().any(|f| f.contains(var)) {
                return Err(Error::op(format!("evidence variable '{}' appears in no factor", var)));
            }
        }

        Ok(())
    }

    fn hidden_variables(&self, factors: &[Factor], query: &[&str], evidence: &Evidence) -> Vec<String> {
        if let Some(order) = &self.config.order {
            return order.clone();
        }

        let mut seen = HashSet::new();
        factors
            .iter()
            .flat_map(|f| f.scope())
            .filter(|var| seen.insert(var.as_str()))
            .filter(|var| !query.contains(&var.as_str()) && !evidence.contains(var))
            .cloned()
            .collect()
    }

    /// Replaces the factors mentioning `var` by their product with `var` summed out.
    fn eliminate(&self, live: Vec<Factor>, var: &str) -> Result<Vec<Factor>> {
        let (matching, mut rest): (Vec<Factor>, Vec<Factor>) = live.into_iter().partition(|f| f.contains(var));

        let mut matching = matching.into_iter();
        let Some(first) = matching.next() else {
            debug!("eliminate({}): no factor mentions it, skipping", var);
            return Ok(rest);
        };

        debug!("eliminate({}): combining {} factor(s)", var, matching.len() + 1);
        let combined = matching.try_fold(first, |acc, f| self.product(&acc, &f))?;
        let reduced = if combined.contains(var) { combined.sumout(var)? } else { combined };

        rest.push(reduced);
        Ok(rest)
    }

    /// Multiplies the remaining factors together.
    ///
    /// Each step picks the first factor that is scalar or shares a variable with
    /// the accumulated product, so connected factors never hit a disjoint join.
    fn combine(&self, mut live: Vec<Factor>) -> Result<Factor> {
        if live.is_empty() {
            return Err(Error::op("no factors left to combine"));
        }

        let mut acc = live.remove(0);
        while !live.is_empty() {
            let next = live
                .iter()
                .position(|f| acc.is_scalar() || f.is_scalar() || f.scope().iter().any(|v| acc.contains(v)))
                .unwrap_or(0);
            let f = live.remove(next);
            acc = self.product(&acc, &f)?;
        }
        Ok(acc)
    }

    fn product(&self, f: &Factor, g: &Factor) -> Result<Factor> {
        if self.config.allow_cartesian {
            f.join(g)
        } else {
            f.multiply(g)
        }
    }
}

/// Restricts every factor mentioning an observed variable.
fn apply_evidence(factors: &[Factor], evidence: &Evidence) -> Result<Vec<Factor>> {
    factors.iter().map(|f| f.restrict_all(evidence)).collect()
}

/// Runs variable elimination with the default configuration.
pub fn inference<S: AsRef<str>>(factors: &[Factor], query: &[S], evidence: &Evidence) -> Result<Factor> {
    VariableElimination::default().infer(factors, query, evidence)
}
