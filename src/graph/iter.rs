use std::collections::VecDeque;

use crate::model::{Triple, TriplePattern};
use crate::store::{ScanPos, TripleStore};
use crate::types::{Result, TrellisError};

/// Lazy iterator over pattern matches. Produced on demand through the
/// store's resumable scan; never materializes the result set.
pub struct FindIter<'a, S: TripleStore> {
    store: &'a S,
    pattern: TriplePattern,
    pos: ScanPos,
}

impl<'a, S: TripleStore> FindIter<'a, S> {
    pub(crate) fn new(store: &'a S, pattern: TriplePattern) -> Self {
        Self {
            store,
            pattern,
            pos: ScanPos::default(),
        }
    }
}

impl<S: TripleStore> Iterator for FindIter<'_, S> {
    type Item = Triple;

    fn next(&mut self) -> Option<Triple> {
        self.store.scan_next(&self.pattern, &mut self.pos)
    }
}

/// Pattern cursor supporting removal of the just-yielded triple.
///
/// Holds the graph's mutable borrow for its whole lifetime, so nothing
/// else can mutate the store mid-iteration; the only mutation path is
/// [`remove_current`](Self::remove_current). Because backward-shift
/// deletion relocates entries, the first removal eagerly drains the
/// not-yet-visited remainder into a fixed list before touching the store;
/// every remaining original element is then still visited exactly once.
pub struct FindCursor<'a, S: TripleStore> {
    store: &'a mut S,
    pattern: TriplePattern,
    pos: ScanPos,
    current: Option<Triple>,
    rest: Option<VecDeque<Triple>>,
    expected_len: usize,
}

impl<'a, S: TripleStore> FindCursor<'a, S> {
    pub(crate) fn new(store: &'a mut S, pattern: TriplePattern) -> Self {
        let expected_len = store.len();
        Self {
            store,
            pattern,
            pos: ScanPos::default(),
            current: None,
            rest: None,
            expected_len,
        }
    }

    /// Deletes the triple most recently yielded by the cursor from the
    /// owning store. Errors when no triple has been yielded, or when the
    /// current one was already removed.
    pub fn remove_current(&mut self) -> Result<()> {
        let current = self
            .current
            .take()
            .ok_or(TrellisError::Invalid("cursor has no current element"))?;
        if self.rest.is_none() {
            let mut rest = VecDeque::new();
            while let Some(triple) = self.store.scan_next(&self.pattern, &mut self.pos) {
                rest.push_back(triple);
            }
            self.rest = Some(rest);
        }
        if !self.store.remove(&current) {
            return Err(TrellisError::Corruption(
                "cursor element missing from its store",
            ));
        }
        self.expected_len = self.store.len();
        Ok(())
    }
}

impl<S: TripleStore> Iterator for FindCursor<'_, S> {
    type Item = Triple;

    fn next(&mut self) -> Option<Triple> {
        let triple = match &mut self.rest {
            Some(rest) => rest.pop_front(),
            None => {
                // Best-effort net; real interference is ruled out by the
                // exclusive borrow.
                debug_assert_eq!(self.expected_len, self.store.len());
                self.store.scan_next(&self.pattern, &mut self.pos)
            }
        };
        self.current = triple.clone();
        triple
    }
}
