use crate::model::{Triple, TriplePattern};
use crate::store::TripleStore;
use crate::types::{Result, TrellisError};

use super::{ReadTxn, TxnGraph, TxnMode, WriteTxn};

enum SessionTxn<S: TripleStore + Clone + 'static> {
    Idle,
    Read(ReadTxn<S>),
    Write(WriteTxn<S>),
}

/// Dynamically-checked transaction session.
///
/// The guard API ([`TxnGraph::begin_read`]/[`TxnGraph::begin_write`])
/// makes most protocol violations unrepresentable; a `Session` trades
/// that for the literal `begin`/`commit`/`abort`/`end` surface, reporting
/// violations as distinct errors instead: mutating with no open write
/// transaction, beginning twice, or committing, aborting and ending with
/// nothing open. A failed call changes no transaction or store state.
pub struct Session<S: TripleStore + Clone + 'static> {
    graph: TxnGraph<S>,
    txn: SessionTxn<S>,
}

impl<S: TripleStore + Clone + 'static> Session<S> {
    /// Creates an idle session over a coordinator handle.
    pub fn new(graph: TxnGraph<S>) -> Self {
        Self {
            graph,
            txn: SessionTxn::Idle,
        }
    }

    /// The mode of the currently open transaction, if any.
    pub fn current_mode(&self) -> Option<TxnMode> {
        match self.txn {
            SessionTxn::Idle => None,
            SessionTxn::Read(_) => Some(TxnMode::Read),
            SessionTxn::Write(_) => Some(TxnMode::Write),
        }
    }

    /// Opens a transaction in the requested mode.
    pub fn begin(&mut self, mode: TxnMode) -> Result<()> {
        if !matches!(self.txn, SessionTxn::Idle) {
            return Err(TrellisError::TransactionOpen(
                "begin while a transaction is open",
            ));
        }
        self.txn = match mode {
            TxnMode::Read => SessionTxn::Read(self.graph.begin_read()),
            TxnMode::Write => SessionTxn::Write(self.graph.begin_write()?),
        };
        Ok(())
    }

    /// Commits the open write transaction.
    pub fn commit(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.txn, SessionTxn::Idle) {
            SessionTxn::Write(write) => {
                write.commit();
                Ok(())
            }
            SessionTxn::Read(read) => {
                self.txn = SessionTxn::Read(read);
                Err(TrellisError::NoTransaction(
                    "commit requires an open write transaction",
                ))
            }
            SessionTxn::Idle => Err(TrellisError::NoTransaction(
                "commit with no open transaction",
            )),
        }
    }

    /// Aborts the open write transaction.
    pub fn abort(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.txn, SessionTxn::Idle) {
            SessionTxn::Write(write) => {
                write.abort();
                Ok(())
            }
            SessionTxn::Read(read) => {
                self.txn = SessionTxn::Read(read);
                Err(TrellisError::NoTransaction(
                    "abort requires an open write transaction",
                ))
            }
            SessionTxn::Idle => Err(TrellisError::NoTransaction(
                "abort with no open transaction",
            )),
        }
    }

    /// Ends the open read transaction, releasing its snapshot.
    ///
    /// Ending an open write transaction is rejected; it must commit or
    /// abort explicitly.
    pub fn end(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.txn, SessionTxn::Idle) {
            SessionTxn::Read(read) => {
                read.end();
                Ok(())
            }
            SessionTxn::Write(write) => {
                self.txn = SessionTxn::Write(write);
                Err(TrellisError::TransactionOpen(
                    "write transaction must commit or abort",
                ))
            }
            SessionTxn::Idle => Err(TrellisError::NoTransaction(
                "end with no open transaction",
            )),
        }
    }

    /// Inserts a triple within the open write transaction.
    pub fn add(&mut self, triple: Triple) -> Result<bool> {
        match &mut self.txn {
            SessionTxn::Write(write) => Ok(write.add(triple)),
            _ => Err(TrellisError::TransactionRequired(
                "add requires an open write transaction",
            )),
        }
    }

    /// Deletes a triple within the open write transaction.
    pub fn delete(&mut self, triple: &Triple) -> Result<bool> {
        match &mut self.txn {
            SessionTxn::Write(write) => Ok(write.delete(triple)),
            _ => Err(TrellisError::TransactionRequired(
                "delete requires an open write transaction",
            )),
        }
    }

    /// Pattern containment against the open transaction's view.
    pub fn contains(&self, pattern: &TriplePattern) -> Result<bool> {
        match &self.txn {
            SessionTxn::Read(read) => Ok(read.contains(pattern)),
            SessionTxn::Write(write) => Ok(write.contains(pattern)),
            SessionTxn::Idle => Err(TrellisError::TransactionRequired(
                "reads require an open transaction",
            )),
        }
    }

    /// Materialized pattern matches from the open transaction's view.
    pub fn find(&self, pattern: TriplePattern) -> Result<Vec<Triple>> {
        match &self.txn {
            SessionTxn::Read(read) => Ok(read.find(pattern).collect()),
            SessionTxn::Write(write) => Ok(write.find(pattern).collect()),
            SessionTxn::Idle => Err(TrellisError::TransactionRequired(
                "reads require an open transaction",
            )),
        }
    }

    /// Size of the open transaction's view.
    pub fn len(&self) -> Result<usize> {
        match &self.txn {
            SessionTxn::Read(read) => Ok(read.len()),
            SessionTxn::Write(write) => Ok(write.len()),
            SessionTxn::Idle => Err(TrellisError::TransactionRequired(
                "reads require an open transaction",
            )),
        }
    }
}
