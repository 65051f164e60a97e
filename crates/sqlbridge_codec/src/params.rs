//! Statement parameters and result rows.

use crate::value::Value;
use std::collections::BTreeMap;

/// Parameters bound to one statement invocation.
///
/// A statement uses exactly one shape. Positional values bind to `?`
/// placeholders in order (1-based on the engine side); named values bind
/// by name and keys are unique by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Params {
    /// Ordered values.
    Positional(Vec<Value>),
    /// Name to value mapping.
    Named(BTreeMap<String, Value>),
}

impl Params {
    /// The empty parameter set.
    pub fn empty() -> Self {
        Params::Positional(Vec::new())
    }

    /// Builds a positional parameter set.
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Params::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Builds a named parameter set. A repeated name keeps the last value.
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Params::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Number of bound values.
    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(map) => map.len(),
        }
    }

    /// Returns true if no values are bound.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<()> for Params {
    fn from((): ()) -> Self {
        Self::empty()
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Positional(values)
    }
}

impl From<BTreeMap<String, Value>> for Params {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Params::Named(map)
    }
}

/// One result row: a value per selected column, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Creates a row from column values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Returns the value at `idx`, if the column exists.
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true for a zero-column row.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All column values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consumes the row, returning its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}
