//! Loading Bayesian networks from JSON.
//!
//! # File Format
//!
//! ```text
//! {
//!   "variables": ["A", "B"],
//!   "prA": { "A": [true, false],             "Prob": [0.3, 0.7] },
//!   "prB": { "B": [true, false, true, false],
//!            "A": [true, true, false, false], "Prob": [0.9, 0.1, 0.2, 0.8] }
//! }
//! ```
//!
//! - `variables` declares every variable of the network.
//! - Every other key is a conditional probability table, given column-wise:
//!   one column per scope variable plus a `Prob` column with the weights.
//! - Column order is scope order, table order is document order.
//!
//! # Example
//!
//! ```
//! use varelim_rs::evidence::Evidence;
//! use varelim_rs::network::Network;
//!
//! let net = Network::from_json_str(r#"{
//!     "variables": ["A", "B"],
//!     "prA": { "A": [true, false], "Prob": [0.3, 0.7] },
//!     "prB": { "B": [true, false, true, false], "A": [true, true, false, false],
//!              "Prob": [0.9, 0.1, 0.2, 0.8] }
//! }"#).unwrap();
//!
//! let posterior = net.query(&["A"], &Evidence::new().observe("B", true)).unwrap();
//! assert_eq!(posterior.len(), 2);
//! ```

use std::fs;
use std::path::Path;

use log::debug;
use serde::Deserialize;
use serde_json::Map;
use thiserror::Error;

use crate::elimination::{EliminationConfig, VariableElimination};
use crate::error::Error;
use crate::evidence::Evidence;
use crate::factor::{Factor, Row};
use crate::value::Value;

const PROB_COLUMN: &str = "Prob";

/// Errors raised while loading or querying a network.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("table '{name}': {source}")]
    Factor {
        name: String,
        #[source]
        source: Error,
    },
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error(transparent)]
    Inference(#[from] Error),
}

#[derive(Deserialize)]
struct NetworkFile {
    variables: Vec<String>,
    #[serde(flatten)]
    tables: Map<String, serde_json::Value>,
}

/// A Bayesian network: declared variables plus one named factor per table.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    variables: Vec<String>,
    names: Vec<String>,
    factors: Vec<Factor>,
}

impl Network {
    /// Creates a network, checking that every factor only mentions declared variables.
    pub fn new(variables: Vec<String>, tables: Vec<(String, Factor)>) -> Result<Self, NetworkError> {
        for (name, factor) in &tables {
            if let Some(var) = factor.scope().iter().find(|v| !variables.contains(v)) {
                return Err(NetworkError::Parse(format!(
                    "table '{}' mentions undeclared variable '{}'",
                    name, var
                )));
            }
        }
        let (names, factors) = tables.into_iter().unzip();
        Ok(Self { variables, names, factors })
    }

    /// Reads a network from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NetworkError> {
        let path = path.as_ref();
        debug!("load(path = {})", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parses a network from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self, NetworkError> {
        let file: NetworkFile = serde_json::from_str(content)?;

        let mut tables = Vec::with_capacity(file.tables.len());
        for (name, table) in file.tables {
            let factor = parse_table(&name, table)?;
            debug!("table '{}' over {:?} with {} rows", name, factor.scope(), factor.len());
            tables.push((name, factor));
        }

        Self::new(file.variables, tables)
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Looks up a table by its key in the network file.
    pub fn factor(&self, name: &str) -> Option<&Factor> {
        self.names.iter().position(|n| n == name).map(|i| &self.factors[i])
    }

    /// Answers `P(query | evidence)`, eliminating the remaining variables in declaration order.
    pub fn query<S: AsRef<str>>(&self, query: &[S], evidence: &Evidence) -> Result<Factor, NetworkError> {
        self.check_names(query.iter().map(|q| q.as_ref()).chain(evidence.variables()))?;

        let hidden = self
            .variables
            .iter()
            .filter(|v| !query.iter().any(|q| q.as_ref() == v.as_str()) && !evidence.contains(v))
            .cloned();
        let engine = VariableElimination::with_config(EliminationConfig::default().with_order(hidden));

        Ok(engine.infer(&self.factors, query, evidence)?)
    }

    /// Answers `P(query | evidence)` with a caller-configured engine.
    pub fn query_with<S: AsRef<str>>(
        &self,
        engine: &VariableElimination,
        query: &[S],
        evidence: &Evidence,
    ) -> Result<Factor, NetworkError> {
        self.check_names(query.iter().map(|q| q.as_ref()).chain(evidence.variables()))?;
        Ok(engine.infer(&self.factors, query, evidence)?)
    }

    fn check_names<'a>(&self, mut names: impl Iterator<Item = &'a str>) -> Result<(), NetworkError> {
        match names.find(|name| !self.variables.iter().any(|v| v == name)) {
            Some(name) => Err(NetworkError::UnknownVariable(name.to_string())),
            None => Ok(()),
        }
    }
}

fn parse_table(name: &str, table: serde_json::Value) -> Result<Factor, NetworkError> {
    let serde_json::Value::Object(columns) = table else {
        return Err(NetworkError::Parse(format!("table '{}' is not an object", name)));
    };

    let mut scope = Vec::new();
    let mut values: Vec<Vec<Value>> = Vec::new();
    let mut probs: Option<Vec<f64>> = None;
    for (column, data) in columns {
        if column == PROB_COLUMN {
            probs = Some(serde_json::from_value(data)?);
        } else {
            values.push(serde_json::from_value(data)?);
            scope.push(column);
        }
    }

    let probs = probs.ok_or_else(|| NetworkError::Parse(format!("table '{}' has no '{}' column", name, PROB_COLUMN)))?;
    if let Some((var, col)) = scope.iter().zip(&values).find(|(_, col)| col.len() != probs.len()) {
        return Err(NetworkError::Parse(format!(
            "table '{}': column '{}' has {} entries, '{}' has {}",
            name,
            var,
            col.len(),
            PROB_COLUMN,
            probs.len()
        )));
    }

    let rows = probs
        .iter()
        .enumerate()
        .map(|(i, &p)| Row::new(values.iter().map(|col| col[i]).collect(), p))
        .collect();

    Factor::new(scope, rows).map_err(|source| NetworkError::Factor {
        name: name.to_string(),
        source,
    })
}
