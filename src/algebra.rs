//! Factor algebra: restriction, marginalization, product and normalization.
//!
//! All operations are pure: they borrow their inputs and return a new [`Factor`].
//! Each one fixes the order of its output rows, so the same inputs always
//! produce the same table:
//!
//! - [`restrict`][Factor::restrict] keeps the surviving rows in their original order;
//! - [`sumout`][Factor::sumout] emits rows sorted ascending by the remaining assignment;
//! - [`multiply`][Factor::multiply] emits a grouped nested-loop join, groups ordered
//!   by first appearance in the left factor;
//! - [`normalize`][Factor::normalize] keeps row order.
//!
//! # Examples
//!
//! ```
//! use varelim_rs::factor::Factor;
//!
//! let xy = Factor::from_table(
//!     ["X", "Y"],
//!     [([true, true], 0.1), ([true, false], 0.2), ([false, true], 0.3), ([false, false], 0.4)],
//! )
//! .unwrap();
//!
//! let y = xy.sumout("X").unwrap();
//! assert_eq!(y.scope(), ["Y"]);
//! assert_eq!(y.len(), 2);
//!
//! let x = xy.restrict("Y", true).unwrap();
//! assert_eq!(x.scope(), ["X"]);
//! assert_eq!(x.values().collect::<Vec<_>>(), vec![0.1, 0.3]);
//! ```

use std::collections::{BTreeMap, HashMap};

use log::{debug, log_enabled, trace, Level};

use crate::error::{Error, Result};
use crate::evidence::Evidence;
use crate::factor::{Factor, Row};
use crate::value::Value;

impl Factor {
    /// Fixes `var` to `value`: keeps the rows where `var == value`
    /// and drops `var` from the scope.
    ///
    /// Surviving rows keep their relative order. If no row matches,
    /// the result has no rows, which is a valid factor.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] if `var` is not in the scope.
    pub fn restrict(&self, var: &str, value: impl Into<Value>) -> Result<Factor> {
        let value = value.into();
        debug!("restrict(scope = {:?}, var = {}, value = {})", self.scope(), var, value);

        let index = self.position(var).ok_or_else(|| {
            Error::op(format!("cannot restrict '{}': not in scope {:?}", var, self.scope()))
        })?;

        let scope = without(self.scope(), index);
        let rows: Vec<Row> = self
            .rows()
            .iter()
            .filter(|row| row.assignment[index] == value)
            .map(|row| Row::new(without(&row.assignment, index), row.value))
            .collect();

        debug!("restrict: {} of {} rows kept", rows.len(), self.len());
        let result = Factor::from_parts(scope, rows);
        log_step(&format!("Restrict {} = {}", var, value), &[self], &result);
        Ok(result)
    }

    /// Applies every observation whose variable is in the scope.
    pub fn restrict_all(&self, evidence: &Evidence) -> Result<Factor> {
        let mut factor = self.clone();
        for (var, value) in evidence.iter() {
            if factor.contains(var) {
                factor = factor.restrict(var, value)?;
            }
        }
        Ok(factor)
    }

    /// Sums `var` out of the factor.
    ///
    /// Rows agreeing on the remaining scope are merged and their values added.
    /// Output rows are sorted ascending by the remaining assignment, comparing
    /// variables left to right in scope order. Summing out the only variable
    /// yields a scalar holding the total mass.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] if `var` is not in the scope.
    pub fn sumout(&self, var: &str) -> Result<Factor> {
        debug!("sumout(scope = {:?}, var = {})", self.scope(), var);

        let index = self.position(var).ok_or_else(|| {
            Error::op(format!("cannot sum out '{}': not in scope {:?}", var, self.scope()))
        })?;

        if self.scope().len() == 1 {
            debug!("sumout: last variable, result is scalar");
            let result = Factor::scalar(self.total());
            log_step(&format!("Sumout {}", var), &[self], &result);
            return Ok(result);
        }

        let mut groups: BTreeMap<Vec<Value>, f64> = BTreeMap::new();
        for row in self.rows() {
            *groups.entry(without(&row.assignment, index)).or_insert(0.0) += row.value;
        }

        let rows = groups.into_iter().map(|(assignment, value)| Row::new(assignment, value)).collect();
        let result = Factor::from_parts(without(self.scope(), index), rows);
        log_step(&format!("Sumout {}", var), &[self], &result);
        Ok(result)
    }

    /// Sums out each of `vars`, in the given order.
    pub fn sumout_all<S: AsRef<str>>(&self, vars: &[S]) -> Result<Factor> {
        let mut factor = self.clone();
        for var in vars {
            factor = factor.sumout(var.as_ref())?;
        }
        Ok(factor)
    }

    /// Pointwise product of two factors, joined on their shared variables.
    ///
    /// - If exactly one side is a scalar, the other side is scaled by it.
    /// - If both are scalars, the result is their product.
    /// - Otherwise the rows of `self` are grouped by their projection onto the shared
    ///   variables (groups in order of first appearance), the rows of `other` likewise,
    ///   and each group of `self` is crossed with the matching group of `other`:
    ///   outer loop over `self` rows, inner loop over `other` rows.
    ///
    /// The result scope is the scope of `self` followed by the variables
    /// of `other` not already present.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] if both scopes are non-empty and disjoint.
    /// Use [`join`][Factor::join] to get a cartesian product in that case.
    pub fn multiply(&self, other: &Factor) -> Result<Factor> {
        debug!("multiply(f = {:?}, g = {:?})", self.scope(), other.scope());
        let result = self.product(other, false)?;
        log_step("Multiply", &[self, other], &result);
        Ok(result)
    }

    /// Same as [`multiply`][Factor::multiply], but disjoint scopes produce
    /// the cartesian product instead of an error.
    pub fn join(&self, other: &Factor) -> Result<Factor> {
        debug!("join(f = {:?}, g = {:?})", self.scope(), other.scope());
        let result = self.product(other, true)?;
        log_step("Join", &[self, other], &result);
        Ok(result)
    }

    fn product(&self, other: &Factor, cartesian: bool) -> Result<Factor> {
        match (self.scalar_value(), other.scalar_value()) {
            (Some(a), Some(b)) => return Ok(Factor::scalar(a * b)),
            (None, Some(b)) => return Ok(self.scale(b)),
            (Some(a), None) => return Ok(other.scale(a)),
            (None, None) => {}
        }

        let (left_keys, right_keys): (Vec<usize>, Vec<usize>) = self
            .scope()
            .iter()
            .enumerate()
            .filter_map(|(i, var)| other.position(var).map(|j| (i, j)))
            .unzip();

        if left_keys.is_empty() && !cartesian {
            return Err(Error::op(format!(
                "cannot multiply factors with disjoint scopes {:?} and {:?}",
                self.scope(),
                other.scope()
            )));
        }

        let extra: Vec<usize> = (0..other.scope().len()).filter(|j| !right_keys.contains(j)).collect();

        let mut scope = self.scope().to_vec();
        scope.extend(extra.iter().map(|&j| other.scope()[j].clone()));

        // Left groups keep first-appearance order; right groups are looked up by key.
        let mut left_groups: Vec<(Vec<Value>, Vec<&Row>)> = Vec::new();
        let mut left_index: HashMap<Vec<Value>, usize> = HashMap::new();
        for row in self.rows() {
            let key = project(row, &left_keys);
            match left_index.get(&key) {
                Some(&g) => left_groups[g].1.push(row),
                None => {
                    left_index.insert(key.clone(), left_groups.len());
                    left_groups.push((key, vec![row]));
                }
            }
        }

        let mut right_groups: HashMap<Vec<Value>, Vec<&Row>> = HashMap::new();
        for row in other.rows() {
            right_groups.entry(project(row, &right_keys)).or_default().push(row);
        }

        let mut rows = Vec::new();
        for (key, lhs) in &left_groups {
            let Some(rhs) = right_groups.get(key) else {
                trace!("product: no match for {:?}", key);
                continue;
            };
            for l in lhs {
                for r in rhs {
                    let mut assignment = l.assignment.clone();
                    assignment.extend(extra.iter().map(|&j| r.assignment[j]));
                    rows.push(Row::new(assignment, l.value * r.value));
                }
            }
        }

        debug!("product: {} x {} rows -> {} rows over {:?}", self.len(), other.len(), rows.len(), scope);
        Ok(Factor::from_parts(scope, rows))
    }

    fn scale(&self, k: f64) -> Factor {
        self.map_values(|value| value * k)
    }

    fn map_values(&self, f: impl Fn(f64) -> f64) -> Factor {
        let rows = self.rows().iter().map(|row| Row::new(row.assignment.clone(), f(row.value))).collect();
        Factor::from_parts(self.scope().to_vec(), rows)
    }

    /// Divides every value by the total mass, keeping scope and row order.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] if the total mass is zero, which happens when
    /// the evidence is impossible under the model, or if it overflows to infinity.
    pub fn normalize(&self) -> Result<Factor> {
        let total = self.total();
        debug!("normalize(scope = {:?}, total = {})", self.scope(), total);

        if total <= 0.0 {
            return Err(Error::op(format!("cannot normalize factor over {:?} with zero mass", self.scope())));
        }
        if !total.is_finite() {
            return Err(Error::op(format!("cannot normalize factor over {:?}: total mass overflows", self.scope())));
        }

        let result = self.map_values(|value| value / total);
        log_step("Normalize", &[self], &result);
        Ok(result)
    }
}

/// Logs operands and result of one algebra step as tables.
fn log_step(title: &str, operands: &[&Factor], result: &Factor) {
    if log_enabled!(Level::Trace) {
        trace!("{}", render_step(title, operands, result));
    }
}

fn render_step(title: &str, operands: &[&Factor], result: &Factor) -> String {
    let mut out = format!("{}:\n", title);
    for f in operands {
        out.push_str(&f.to_string());
    }
    out.push_str("Result:\n");
    out.push_str(&result.to_string());
    out
}

fn without<T: Clone>(items: &[T], index: usize) -> Vec<T> {
    let mut items = items.to_vec();
    items.remove(index);
    items
}

fn project(row: &Row, positions: &[usize]) -> Vec<Value> {
    positions.iter().map(|&i| row.assignment[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use test_log::test;

    const T: bool = true;
    const F: bool = false;

    fn f0() -> Factor {
        Factor::from_table(["X", "Y"], [([T, T], 0.1), ([T, F], 0.2), ([F, T], 0.3), ([F, F], 0.4)]).unwrap()
    }

    fn f1() -> Factor {
        Factor::from_table(
            ["X", "Y", "Z"],
            [
                ([T, T, T], 0.1),
                ([T, T, F], 0.2),
                ([T, F, T], 0.3),
                ([T, F, F], 0.4),
                ([F, T, T], 0.5),
                ([F, T, F], 0.6),
                ([F, F, T], 0.7),
                ([F, F, F], 0.8),
            ],
        )
        .unwrap()
    }

    fn assignments(f: &Factor) -> Vec<Vec<Value>> {
        f.rows().iter().map(|row| row.assignment.clone()).collect()
    }

    fn assert_values(f: &Factor, expected: &[f64]) {
        let actual: Vec<f64> = f.values().collect();
        assert_eq!(actual.len(), expected.len(), "values = {:?}", actual);
        for (a, e) in actual.iter().zip(expected) {
            assert_abs_diff_eq!(a, e, epsilon = 1e-12);
        }
    }

    fn v(bits: &[bool]) -> Vec<Value> {
        bits.iter().map(|&b| Value::from(b)).collect()
    }

    #[test]
    fn test_restrict() {
        let g = f1().restrict("X", true).unwrap();
        println!("{}", g);
        assert_eq!(g.scope(), ["Y", "Z"]);
        assert_eq!(assignments(&g), vec![v(&[T, T]), v(&[T, F]), v(&[F, T]), v(&[F, F])]);
        assert_values(&g, &[0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_restrict_middle_variable() {
        let g = f1().restrict("Y", false).unwrap();
        assert_eq!(g.scope(), ["X", "Z"]);
        assert_eq!(assignments(&g), vec![v(&[T, T]), v(&[T, F]), v(&[F, T]), v(&[F, F])]);
        assert_values(&g, &[0.3, 0.4, 0.7, 0.8]);
    }

    #[test]
    fn test_restrict_no_match() {
        let f = Factor::from_table(["X"], [([true], 1.0)]).unwrap();
        let g = f.restrict("X", false).unwrap();
        assert!(g.is_scalar());
        assert!(g.is_empty());
        assert_eq!(g.scalar_value(), Some(0.0));
    }

    #[test]
    fn test_restrict_missing_variable() {
        let res = f0().restrict("Z", true);
        assert!(matches!(res, Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_restrict_all() {
        let ev = Evidence::new().observe("Z", false).observe("W", true).observe("X", true);
        let g = f1().restrict_all(&ev).unwrap();
        assert_eq!(g.scope(), ["Y"]);
        assert_values(&g, &[0.2, 0.4]);
    }

    #[test]
    fn test_sumout() {
        let g = f1().sumout("X").unwrap();
        println!("{}", g);
        assert_eq!(g.scope(), ["Y", "Z"]);
        assert_eq!(assignments(&g), vec![v(&[F, F]), v(&[F, T]), v(&[T, F]), v(&[T, T])]);
        assert_values(&g, &[1.2, 1.0, 0.8, 0.6]);
    }

    #[test]
    fn test_sumout_single_column() {
        let f = Factor::from_table(["X"], [([T], 0.1), ([F], 0.5)]).unwrap();
        let g = f.sumout("X").unwrap();
        assert!(g.is_scalar());
        assert_abs_diff_eq!(g.scalar_value().unwrap(), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_sumout_last_variable_totals_mass() {
        let g = f1().sumout_all(&["X", "Y", "Z"]).unwrap();
        assert!(g.is_scalar());
        assert_abs_diff_eq!(g.scalar_value().unwrap(), 3.6, epsilon = 1e-12);
    }

    #[test]
    fn test_sumout_int_domain() {
        let f = Factor::from_table(
            ["A", "B"],
            [([2i64, 0], 1.0), ([0, 1], 2.0), ([1, 0], 3.0), ([0, 0], 4.0), ([2, 1], 5.0)],
        )
        .unwrap();
        let g = f.sumout("B").unwrap();
        assert_eq!(assignments(&g), vec![vec![Value::Int(0)], vec![Value::Int(1)], vec![Value::Int(2)]]);
        assert_values(&g, &[6.0, 3.0, 6.0]);
    }

    #[test]
    fn test_sumout_missing_variable() {
        let res = f0().sumout("Z");
        assert!(matches!(res, Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_multiply() {
        let f = f0();
        let g = Factor::from_table(["Y", "Z"], [([T, T], 0.4), ([F, T], 0.3), ([T, F], 0.2), ([F, F], 0.1)]).unwrap();
        let h = f.multiply(&g).unwrap();
        println!("{}", h);
        assert_eq!(h.scope(), ["X", "Y", "Z"]);
        assert_eq!(
            assignments(&h),
            vec![
                v(&[T, T, T]),
                v(&[T, T, F]),
                v(&[F, T, T]),
                v(&[F, T, F]),
                v(&[T, F, T]),
                v(&[T, F, F]),
                v(&[F, F, T]),
                v(&[F, F, F]),
            ]
        );
        assert_values(&h, &[0.04, 0.02, 0.12, 0.06, 0.06, 0.02, 0.12, 0.04]);
    }

    #[test]
    fn test_multiply_constant() {
        let h = f0().multiply(&Factor::scalar(0.1)).unwrap();
        assert_eq!(h.scope(), ["X", "Y"]);
        assert_eq!(assignments(&h), assignments(&f0()));
        assert_values(&h, &[0.01, 0.02, 0.03, 0.04]);

        let h = Factor::scalar(0.1).multiply(&f0()).unwrap();
        assert_eq!(h.scope(), ["X", "Y"]);
        assert_values(&h, &[0.01, 0.02, 0.03, 0.04]);
    }

    #[test]
    fn test_multiply_scalars() {
        let h = Factor::scalar(0.5).multiply(&Factor::scalar(0.25)).unwrap();
        assert!(h.is_scalar());
        assert_eq!(h.scalar_value(), Some(0.125));
    }

    #[test]
    fn test_multiply_scalar_identity() {
        assert_eq!(f1().multiply(&Factor::scalar(1.0)).unwrap(), f1());
    }

    #[test]
    fn test_multiply_disjoint() {
        let g = Factor::from_table(["Z"], [([T], 0.5), ([F], 0.5)]).unwrap();
        let res = f0().multiply(&g);
        assert!(matches!(res, Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_join_disjoint_is_cartesian() {
        let f = Factor::from_table(["X"], [([T], 0.2), ([F], 0.8)]).unwrap();
        let g = Factor::from_table(["Z"], [([T], 0.5), ([F], 0.25)]).unwrap();
        let h = f.join(&g).unwrap();
        assert_eq!(h.scope(), ["X", "Z"]);
        assert_eq!(assignments(&h), vec![v(&[T, T]), v(&[T, F]), v(&[F, T]), v(&[F, F])]);
        assert_values(&h, &[0.1, 0.05, 0.4, 0.2]);
    }

    #[test]
    fn test_join_overlapping_matches_multiply() {
        let g = Factor::from_table(["Y", "Z"], [([T, T], 0.4), ([F, T], 0.3), ([T, F], 0.2), ([F, F], 0.1)]).unwrap();
        assert_eq!(f0().join(&g).unwrap(), f0().multiply(&g).unwrap());
    }

    #[test]
    fn test_multiply_unmatched_keys() {
        let f = Factor::from_table(["X", "Y"], [([T, T], 0.5), ([T, F], 0.5)]).unwrap();
        let g = Factor::from_table(["X"], [([F], 1.0)]).unwrap();
        let h = f.multiply(&g).unwrap();
        assert_eq!(h.scope(), ["X", "Y"]);
        assert!(h.is_empty());
    }

    #[test]
    fn test_normalize() {
        let g = f0().normalize().unwrap();
        assert_eq!(g, f0());
    }

    #[test]
    fn test_normalize_rescales() {
        let f = Factor::from_table(["X"], [([T], 1.0), ([F], 3.0)]).unwrap();
        let g = f.normalize().unwrap();
        assert_values(&g, &[0.25, 0.75]);
    }

    #[test]
    fn test_normalize_zero_mass() {
        let f = Factor::from_table(["X"], [([T], 0.0), ([F], 0.0)]).unwrap();
        assert!(matches!(f.normalize(), Err(Error::InvalidOperation(_))));

        let none = Factor::from_table(["X"], [([T], 1.0)]).unwrap().restrict("X", false).unwrap();
        assert!(matches!(none.normalize(), Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_normalize_overflowing_mass() {
        let f = Factor::from_table(["X"], [([T], f64::MAX), ([F], f64::MAX)]).unwrap();
        assert!(matches!(f.normalize(), Err(Error::InvalidOperation(_))));

        let twos = Factor::from_table(["X"], [([T], 2.0), ([F], 2.0)]).unwrap();
        let g = f.multiply(&twos).unwrap();
        assert!(matches!(g.normalize(), Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_render_step_shows_tables() {
        let g = Factor::from_table(["Y", "Z"], [([T, T], 0.4), ([F, T], 0.3), ([T, F], 0.2), ([F, F], 0.1)]).unwrap();
        let h = f0().multiply(&g).unwrap();
        let text = render_step("Multiply", &[&f0(), &g], &h);
        println!("{}", text);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Multiply:");
        assert_eq!(lines[1], "X      Y      Prob");
        assert_eq!(lines[2], "true   true   0.1");
        assert!(lines.contains(&"Y      Z      Prob"));
        assert!(lines.contains(&"Result:"));
        assert!(lines.contains(&"X      Y      Z      Prob"));
        assert_eq!(lines.len(), 1 + 5 + 5 + 1 + 9);
    }

    #[test]
    fn test_inputs_untouched() {
        let f = f1();
        let before = f.clone();
        let _ = f.restrict("X", true).unwrap();
        let _ = f.sumout("Y").unwrap();
        let _ = f.multiply(&f0()).unwrap();
        let _ = f.normalize().unwrap();
        assert_eq!(f, before);
    }
}
