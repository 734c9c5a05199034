//! Factor tables.
//!
//! A [`Factor`] is a (possibly unnormalized) function from joint assignments
//! of its *scope* to non-negative weights, stored as an explicit list of rows.
//!
//! # Representation
//!
//! - The scope is an ordered list of distinct variable names.
//! - Each [`Row`] holds a positional assignment: `assignment[i]` is the value
//!   of `scope[i]`.
//! - Rows keep the order they were produced in. Operations in
//!   [`algebra`][crate::algebra] define their output order precisely,
//!   so results are reproducible row by row.
//! - A factor with an empty scope is a *scalar* and has a single row.
//!
//! # Examples
//!
//! ```
//! use varelim_rs::factor::Factor;
//! use varelim_rs::value::Value;
//!
//! let f = Factor::from_table(
//!     ["X", "Y"],
//!     [
//!         ([true, true], 0.1),
//!         ([true, false], 0.2),
//!         ([false, true], 0.3),
//!         ([false, false], 0.4),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(f.len(), 4);
//! assert_eq!(f.get(&[("X", Value::FALSE), ("Y", Value::TRUE)]), Some(0.3));
//! ```

use std::collections::HashSet;
use std::fmt;

use crate::error::{Error, Result};
use crate::value::Value;

/// One entry of a factor table.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub assignment: Vec<Value>,
    pub value: f64,
}

impl Row {
    pub fn new(assignment: Vec<Value>, value: f64) -> Self {
        Self { assignment, value }
    }
}

/// A table over a scope of discrete variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    scope: Vec<String>,
    rows: Vec<Row>,
}

impl Factor {
    /// Creates a factor, checking the table invariants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFactor`] if the scope repeats a variable,
    /// a row has the wrong arity, a value is negative or not finite,
    /// or two rows share the same assignment.
    pub fn new(scope: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        let mut seen = HashSet::new();
        for var in &scope {
            if !seen.insert(var.as_str()) {
                return Err(Error::factor(format!("duplicate variable '{}' in scope", var)));
            }
        }

        let mut assignments = HashSet::new();
        for row in &rows {
            if row.assignment.len() != scope.len() {
                return Err(Error::factor(format!(
                    "row {:?} has {} values, scope {:?} has {} variables",
                    row.assignment,
                    row.assignment.len(),
                    scope,
                    scope.len()
                )));
            }
            if !row.value.is_finite() || row.value < 0.0 {
                return Err(Error::factor(format!("weight {} is not a non-negative number", row.value)));
            }
            if !assignments.insert(row.assignment.as_slice()) {
                return Err(Error::factor(format!("duplicate assignment {:?}", row.assignment)));
            }
        }

        if scope.is_empty() && rows.len() != 1 {
            return Err(Error::factor(format!("scalar factor must have exactly one row, got {}", rows.len())));
        }

        Ok(Self { scope, rows })
    }

    /// Convenience constructor from fixed-size literal tables.
    pub fn from_table<S, V, const N: usize>(
        scope: [S; N],
        rows: impl IntoIterator<Item = ([V; N], f64)>,
    ) -> Result<Self>
    where
        S: Into<String>,
        V: Into<Value>,
    {
        let scope = scope.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .map(|(assignment, value)| Row::new(assignment.into_iter().map(Into::into).collect(), value))
            .collect();
        Self::new(scope, rows)
    }

    /// Creates a scalar factor with an empty scope.
    pub fn scalar(value: f64) -> Self {
        Self {
            scope: Vec::new(),
            rows: vec![Row::new(Vec::new(), value)],
        }
    }

    /// Builds a factor from parts already known to satisfy the invariants.
    pub(crate) fn from_parts(scope: Vec<String>, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|row| row.assignment.len() == scope.len()));
        Self { scope, rows }
    }
}

impl Factor {
    pub fn scope(&self) -> &[String] {
        &self.scope
    }
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_scalar(&self) -> bool {
        self.scope.is_empty()
    }

    /// The value of a scalar factor.
    ///
    /// A restriction that matched no row leaves an empty scope with no rows,
    /// which reads as zero.
    pub fn scalar_value(&self) -> Option<f64> {
        if self.is_scalar() {
            Some(self.total())
        } else {
            None
        }
    }

    pub fn contains(&self, var: &str) -> bool {
        self.position(var).is_some()
    }

    /// Index of `var` in the scope.
    pub fn position(&self, var: &str) -> Option<usize> {
        self.scope.iter().position(|v| v == var)
    }

    /// Sum of all row values.
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|row| row.value).sum()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|row| row.value)
    }

    /// Looks up the value of a full assignment given by variable name.
    ///
    /// Returns `None` if the assignment does not name exactly the scope
    /// variables, or if no row matches.
    pub fn get(&self, assignment: &[(&str, Value)]) -> Option<f64> {
        if assignment.len() != self.scope.len() {
            return None;
        }
        let mut key = vec![None; self.scope.len()];
        for &(var, value) in assignment {
            key[self.position(var)?] = Some(value);
        }
        let key: Vec<Value> = key.into_iter().collect::<Option<_>>()?;
        self.rows.iter().find(|row| row.assignment == key).map(|row| row.value)
    }

    /// Returns the assignment of `row` as `(variable, value)` pairs.
    pub fn named(&self, row: &Row) -> Vec<(String, Value)> {
        self.scope.iter().cloned().zip(row.assignment.iter().copied()).collect()
    }
}

impl fmt::Display for Factor {
    /// Renders the factor as an aligned table with a trailing `Prob` column.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.assignment.iter().map(|v| v.to_string()).collect())
            .collect();

        let widths: Vec<usize> = self
            .scope
            .iter()
            .enumerate()
            .map(|(i, var)| cells.iter().map(|c| c[i].len()).chain([var.len()]).max().unwrap_or(0))
            .collect();

        for (var, &w) in self.scope.iter().zip(&widths) {
            write!(f, "{:<w$}  ", var, w = w)?;
        }
        writeln!(f, "Prob")?;

        for (row, cell) in self.rows.iter().zip(&cells) {
            for (s, &w) in cell.iter().zip(&widths) {
                write!(f, "{:<w$}  ", s, w = w)?;
            }
            writeln!(f, "{}", row.value)?;
        }
        Ok(())
    }
}
