//! Observed values.

use crate::value::Value;

/// An ordered set of observations `variable = value`.
///
/// Observations keep insertion order, so evidence is applied to factors in the
/// order it was given. Observing the same variable twice keeps the last value.
///
/// ```
/// use varelim_rs::evidence::Evidence;
/// use varelim_rs::value::Value;
///
/// let ev = Evidence::new().observe("FM", true).observe("FH", true);
/// assert_eq!(ev.get("FM"), Some(Value::TRUE));
/// assert_eq!(ev.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evidence {
    observations: Vec<(String, Value)>,
}

impl Evidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observation, returning the updated evidence.
    pub fn observe(mut self, var: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(var, value);
        self
    }

    pub fn insert(&mut self, var: impl Into<String>, value: impl Into<Value>) {
        let var = var.into();
        let value = value.into();
        match self.observations.iter_mut().find(|(v, _)| *v == var) {
            Some(entry) => entry.1 = value,
            None => self.observations.push((var, value)),
        }
    }

    pub fn get(&self, var: &str) -> Option<Value> {
        self.observations.iter().find(|(v, _)| v == var).map(|&(_, value)| value)
    }

    pub fn contains(&self, var: &str) -> bool {
        self.get(var).is_some()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Value)> {
        self.observations.iter().map(|(var, value)| (var.as_str(), *value))
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.observations.iter().map(|(var, _)| var.as_str())
    }
}

impl<S: Into<String>, V: Into<Value>> FromIterator<(S, V)> for Evidence {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        let mut evidence = Evidence::new();
        for (var, value) in iter {
            evidence.insert(var, value);
        }
        evidence
    }
}
