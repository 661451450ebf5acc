//! Transaction helpers for the result store.

use crate::utils::error::StorageError;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Run `operation` inside one IMMEDIATE transaction
///
/// The write lock is taken up front, so concurrent read-modify-write
/// cycles on the same key serialize instead of failing on upgrade.
/// Rollback on error happens when the transaction is dropped.
pub fn execute_in_transaction<F, T>(conn: &mut Connection, operation: F) -> Result<T, StorageError>
where
    F: FnOnce(&Transaction) -> Result<T, StorageError>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let result = operation(&tx)?;
    tx.commit()?;
    Ok(result)
}
