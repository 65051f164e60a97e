//! Statement execution surface shared by sessions and transactions.

use crate::error::BridgeResult;
use crate::rows::Rows;
use crate::transaction::Transaction;
use sqlbridge_codec::Params;

/// Multi-statement input for [`Connection::execute_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Batch {
    /// A script of `;`-separated statements handed to the engine as one unit.
    Script(String),
    /// Statements run one by one in order, stopping at the first failure.
    Statements(Vec<String>),
}

impl From<&str> for Batch {
    fn from(script: &str) -> Self {
        Batch::Script(script.to_string())
    }
}

impl From<String> for Batch {
    fn from(script: String) -> Self {
        Batch::Script(script)
    }
}

impl From<Vec<String>> for Batch {
    fn from(statements: Vec<String>) -> Self {
        Batch::Statements(statements)
    }
}

impl From<&[&str]> for Batch {
    fn from(statements: &[&str]) -> Self {
        Batch::Statements(statements.iter().map(|s| (*s).to_string()).collect())
    }
}

/// Anything statements can run against.
///
/// Implemented by [`Session`](crate::Session) and [`Transaction`]. Calling
/// [`transaction`](Connection::transaction) on a transaction always fails
/// with `NestedTransactionNotAllowed`.
pub trait Connection {
    /// Executes one statement and returns the number of affected rows.
    fn execute(&self, sql: &str, params: impl Into<Params>) -> BridgeResult<u64>;

    /// Starts a query and returns a cursor over its rows.
    fn query(&self, sql: &str, params: impl Into<Params>) -> BridgeResult<Rows>;

    /// Executes several statements.
    fn execute_batch(&self, batch: impl Into<Batch>) -> BridgeResult<()>;

    /// Starts a transaction.
    fn transaction(&self) -> BridgeResult<Transaction>;
}
