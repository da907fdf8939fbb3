//! MVCC transaction layer over the graph facade.
//!
//! The coordinator keeps two materialized graph copies. Readers pin
//! whichever copy is labeled active when they begin and see exactly that
//! state for their whole lifetime. A writer takes the other copy, private
//! once its delta queue has drained and its old readers have gone, mutates
//! it directly while recording a [`Delta`], and commit atomically swaps
//! the labels, so the mutated copy becomes the one new readers pin. A
//! background applier then folds the queued delta into the now-stale copy,
//! one delta at a time in commit order, which is what bounds chain growth:
//! each commit contributes exactly one delta and the worker is always
//! draining the other side.
//!
//! Snapshots own their copy through an `Arc`, so a laggard reader never
//! blocks a writer: when the stale copy is still pinned (or still behind
//! its queue), the writer disowns it and starts from a fresh clone of the
//! active state instead. The disowned copy lives exactly as long as its
//! longest-referencing reader. The clone is the exceptional path; with
//! promptly-ending readers every write reuses the caught-up copy and no
//! dataset copying happens at all.
//!
//! ## Isolation guarantees
//!
//! 1. A reader that began before a commit never observes it.
//! 2. A reader that begins after a commit observes exactly that commit.
//! 3. Successive commits are observed in order, each by the readers that
//!    began after it.
//! 4. Background application and the label swap are invisible: readers
//!    only ever see whole committed states.

mod delta;
mod session;

pub use delta::{Delta, DeltaOp};
pub use session::Session;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Condvar, Mutex, RawMutex, RwLock, RwLockReadGuard};
use tracing::{debug, error, trace};

use crate::graph::{Graph, GraphOptions, MemGraph};
use crate::model::{Node, Triple, TriplePattern};
use crate::store::{AdaptiveTable, BitmapTable, ScanPos, TripleStore, TripleTable};
use crate::types::{Result, TrellisError};

/// Transaction mode requested through [`Session::begin`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TxnMode {
    /// Snapshot reader.
    Read,
    /// Exclusive writer.
    Write,
}

enum ApplierMsg {
    Apply,
    Shutdown,
}

// One materialized graph copy. `readers` counts live read transactions
// pinning it; all transitions happen under the coordinator state lock.
struct GraphCell<S: TripleStore> {
    graph: RwLock<MemGraph<S>>,
    readers: AtomicUsize,
}

impl<S: TripleStore> GraphCell<S> {
    fn new(graph: MemGraph<S>) -> Arc<Self> {
        Arc::new(Self {
            graph: RwLock::new(graph),
            readers: AtomicUsize::new(0),
        })
    }

    fn pinned(&self) -> bool {
        self.readers.load(Ordering::Relaxed) != 0
    }
}

struct CoordState<S: TripleStore> {
    /// The copy new readers pin; reflects the latest commit.
    active: Arc<GraphCell<S>>,
    /// The older copy, lagging by the queued deltas. `None` exactly while
    /// a write transaction owns it as its working copy.
    stale: Option<Arc<GraphCell<S>>>,
    /// Committed deltas not yet folded into the stale copy, commit order.
    queue: VecDeque<Arc<Delta>>,
    /// The applier is mid-delta.
    applying: bool,
    /// A delta replay diverged; no further writes are admitted.
    poisoned: bool,
}

struct Shared<S: TripleStore + 'static> {
    state: Mutex<CoordState<S>>,
    /// Signaled on reader release, queue drain, disowning and poisoning.
    changed: Condvar,
    /// Writer admission token; held for the lifetime of a [`WriteTxn`].
    writer: Arc<Mutex<()>>,
    applier_tx: Mutex<Sender<ApplierMsg>>,
    applier_handle: Mutex<Option<JoinHandle<()>>>,
}

impl<S: TripleStore + 'static> Drop for Shared<S> {
    fn drop(&mut self) {
        let _ = self.applier_tx.lock().send(ApplierMsg::Shutdown);
        if let Some(handle) = self.applier_handle.lock().take() {
            let _ = handle.join();
        }
    }
}

/// Transactional wrapper around a pair of [`MemGraph`] copies.
///
/// Cloning yields another handle to the same coordinator. All mutation
/// goes through [`begin_write`](Self::begin_write); reads go through
/// [`begin_read`](Self::begin_read) snapshots.
pub struct TxnGraph<S: TripleStore + Clone + 'static> {
    shared: Arc<Shared<S>>,
}

impl<S: TripleStore + Clone + 'static> Clone for TxnGraph<S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl TxnGraph<TripleTable> {
    /// Creates a transactional graph over the baseline store.
    pub fn new(options: GraphOptions) -> Self {
        Self::from_factory(|| MemGraph::new(options))
    }
}

impl TxnGraph<BitmapTable> {
    /// Creates a transactional graph over the bitmap-indexed variant.
    pub fn bitmap_indexed(options: GraphOptions) -> Self {
        Self::from_factory(|| MemGraph::bitmap_indexed(options))
    }
}

impl TxnGraph<AdaptiveTable> {
    /// Creates a transactional graph over the adaptive-threshold variant.
    pub fn adaptive_indexed(options: GraphOptions) -> Self {
        Self::from_factory(|| MemGraph::adaptive_indexed(options))
    }
}

impl<S: TripleStore + Clone + 'static> TxnGraph<S> {
    fn from_factory(mut factory: impl FnMut() -> MemGraph<S>) -> Self {
        let (tx, rx) = mpsc::channel();
        let shared = Arc::new(Shared {
            state: Mutex::new(CoordState {
                active: GraphCell::new(factory()),
                stale: Some(GraphCell::new(factory())),
                queue: VecDeque::new(),
                applying: false,
                poisoned: false,
            }),
            changed: Condvar::new(),
            writer: Arc::new(Mutex::new(())),
            applier_tx: Mutex::new(tx),
            applier_handle: Mutex::new(None),
        });
        let weak = Arc::downgrade(&shared);
        let handle = thread::spawn(move || applier_loop(weak, rx));
        *shared.applier_handle.lock() = Some(handle);
        TxnGraph { shared }
    }

    /// Opens a snapshot read transaction pinned to the currently active
    /// copy. The pin is taken under the coordinator lock, so a concurrent
    /// commit's label swap is either fully before or fully after it.
    pub fn begin_read(&self) -> ReadTxn<S> {
        let state = self.shared.state.lock();
        let cell = state.active.clone();
        cell.readers.fetch_add(1, Ordering::Relaxed);
        drop(state);
        trace!("read transaction began");
        ReadTxn {
            shared: self.shared.clone(),
            cell,
            done: false,
        }
    }

    /// Opens the write transaction, blocking while another writer holds
    /// admission. Readers never block a writer: if the stale copy is
    /// still pinned or lagging, the writer clones the active state
    /// instead of waiting.
    pub fn begin_write(&self) -> Result<WriteTxn<S>> {
        let admission = self.shared.writer.lock_arc();
        self.writer_txn(admission)
    }

    /// Fail-fast variant of [`begin_write`](Self::begin_write): errors
    /// with [`TrellisError::WriterBusy`] instead of waiting for admission.
    pub fn try_begin_write(&self) -> Result<WriteTxn<S>> {
        let admission = self
            .shared
            .writer
            .try_lock_arc()
            .ok_or(TrellisError::WriterBusy)?;
        self.writer_txn(admission)
    }

    /// Wraps this handle in a dynamically-checked [`Session`].
    pub fn session(&self) -> Session<S> {
        Session::new(self.clone())
    }

    fn writer_txn(&self, admission: ArcMutexGuard<RawMutex, ()>) -> Result<WriteTxn<S>> {
        let mut state = self.shared.state.lock();
        loop {
            if state.poisoned {
                return Err(TrellisError::Corruption(
                    "delta applier failed; coordinator is poisoned",
                ));
            }
            if !state.applying {
                break;
            }
            // One delta is mid-flight; bounded wait.
            self.shared.changed.wait(&mut state);
        }
        let stale = state
            .stale
            .take()
            .expect("stale copy present outside write transactions");
        let working = if state.queue.is_empty() && !stale.pinned() {
            debug!("write transaction began on the caught-up copy");
            stale
        } else {
            // The old copy is pinned by laggard readers or still behind
            // its queue. Disown it (its readers keep it alive) and start
            // from a fresh clone of the active state.
            state.queue.clear();
            drop(stale);
            let active = state.active.clone();
            drop(state);
            self.shared.changed.notify_all();
            let graph = active.graph.read().clone();
            debug!("write transaction began on a fresh clone; stale copy disowned");
            GraphCell::new(graph)
        };
        Ok(WriteTxn {
            shared: self.shared.clone(),
            _admission: admission,
            working,
            delta: Delta::new(),
            finished: false,
        })
    }
}

/// A snapshot read transaction.
///
/// Every read observes exactly the graph state that was active at
/// [`TxnGraph::begin_read`], regardless of later commits. Ends on
/// [`end`](Self::end) or drop; the longest-lived reader determines how
/// long its pinned copy stays alive.
pub struct ReadTxn<S: TripleStore + 'static> {
    shared: Arc<Shared<S>>,
    cell: Arc<GraphCell<S>>,
    done: bool,
}

impl<S: TripleStore + 'static> ReadTxn<S> {
    fn graph(&self) -> RwLockReadGuard<'_, MemGraph<S>> {
        self.cell.graph.read()
    }

    /// Pattern containment against the snapshot.
    pub fn contains(&self, pattern: &TriplePattern) -> bool {
        self.graph().contains(pattern)
    }

    /// Snapshot size.
    pub fn len(&self) -> usize {
        self.graph().len()
    }

    /// Returns `true` when the snapshot holds no triples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lazy pattern iteration over the snapshot.
    pub fn find(&self, pattern: TriplePattern) -> SnapshotIter<'_, S> {
        SnapshotIter {
            guard: self.graph(),
            pattern,
            pos: ScanPos::default(),
        }
    }

    /// Lazy iteration expressed over optional terms.
    pub fn stream(
        &self,
        subject: Option<Node>,
        predicate: Option<Node>,
        object: Option<Node>,
    ) -> SnapshotIter<'_, S> {
        self.find(TriplePattern::new(subject, predicate, object))
    }

    /// Releases the snapshot. Equivalent to dropping the transaction.
    pub fn end(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        // Decrement under the state lock so a waiting applier cannot miss
        // the release.
        let state = self.shared.state.lock();
        self.cell.readers.fetch_sub(1, Ordering::Relaxed);
        drop(state);
        self.shared.changed.notify_all();
        trace!("read transaction ended");
    }
}

impl<S: TripleStore + 'static> Drop for ReadTxn<S> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Lazy iterator over a transaction's view of the graph.
pub struct SnapshotIter<'a, S: TripleStore> {
    guard: RwLockReadGuard<'a, MemGraph<S>>,
    pattern: TriplePattern,
    pos: ScanPos,
}

impl<S: TripleStore> Iterator for SnapshotIter<'_, S> {
    type Item = Triple;

    fn next(&mut self) -> Option<Triple> {
        self.guard.scan_next(&self.pattern, &mut self.pos)
    }
}

/// The exclusive write transaction.
///
/// Mutations apply to a private caught-up copy and are recorded in a
/// delta; the writer reads its own writes, concurrent readers observe
/// nothing until [`commit`](Self::commit). Dropping the transaction
/// without committing aborts it.
pub struct WriteTxn<S: TripleStore + 'static> {
    shared: Arc<Shared<S>>,
    _admission: ArcMutexGuard<RawMutex, ()>,
    working: Arc<GraphCell<S>>,
    delta: Delta,
    finished: bool,
}

impl<S: TripleStore + 'static> WriteTxn<S> {
    /// Inserts a triple; returns `false` when already present.
    pub fn add(&mut self, triple: Triple) -> bool {
        let changed = self.working.graph.write().add(triple.clone());
        if changed {
            self.delta.record_add(triple);
        }
        changed
    }

    /// Deletes a triple; returns `false` when absent.
    pub fn delete(&mut self, triple: &Triple) -> bool {
        let changed = self.working.graph.write().delete(triple);
        if changed {
            self.delta.record_remove(triple.clone());
        }
        changed
    }

    /// Pattern containment against the working copy, own writes included.
    pub fn contains(&self, pattern: &TriplePattern) -> bool {
        self.working.graph.read().contains(pattern)
    }

    /// Working copy size, own writes included.
    pub fn len(&self) -> usize {
        self.working.graph.read().len()
    }

    /// Lazy pattern iteration over the working copy.
    pub fn find(&self, pattern: TriplePattern) -> SnapshotIter<'_, S> {
        SnapshotIter {
            guard: self.working.graph.read(),
            pattern,
            pos: ScanPos::default(),
        }
    }

    /// Number of operations recorded so far.
    pub fn pending_ops(&self) -> usize {
        self.delta.len()
    }

    /// Publishes the transaction: the working copy becomes the active one
    /// under the coordinator lock, and the delta is queued for the
    /// background applier to fold into the other copy.
    pub fn commit(mut self) {
        self.finished = true;
        let delta = std::mem::take(&mut self.delta);
        let ops = delta.len();
        let mut state = self.shared.state.lock();
        let old_active = std::mem::replace(&mut state.active, self.working.clone());
        state.stale = Some(old_active);
        if ops > 0 {
            state.queue.push_back(Arc::new(delta));
            drop(state);
            let _ = self.shared.applier_tx.lock().send(ApplierMsg::Apply);
        }
        debug!(ops, "write transaction committed");
    }

    /// Discards the transaction; no state change is observable.
    pub fn abort(mut self) {
        self.rollback();
    }

    fn rollback(&mut self) {
        self.finished = true;
        let delta = std::mem::take(&mut self.delta);
        let ops = delta.len();
        if ops > 0 {
            delta.revert(&mut self.working.graph.write());
        }
        // The reverted copy equals the active state again; hand it back
        // as the caught-up stale copy.
        let mut state = self.shared.state.lock();
        state.stale = Some(self.working.clone());
        drop(state);
        self.shared.changed.notify_all();
        debug!(ops, "write transaction aborted");
    }
}

impl<S: TripleStore + 'static> Drop for WriteTxn<S> {
    fn drop(&mut self) {
        // Implicit abort: a write transaction that neither committed nor
        // aborted leaves no observable state change.
        if !self.finished {
            self.rollback();
        }
    }
}

fn applier_loop<S: TripleStore + 'static>(shared: Weak<Shared<S>>, rx: Receiver<ApplierMsg>) {
    while let Ok(msg) = rx.recv() {
        if matches!(msg, ApplierMsg::Shutdown) {
            break;
        }
        let Some(shared) = shared.upgrade() else {
            break;
        };
        if !drain_queue(&shared) {
            // Replay failure is fatal to this worker; a skipped delta
            // would permanently desynchronize the stale copy.
            break;
        }
    }
}

// Folds queued deltas into the stale copy, one at a time in commit order,
// touching it only while no reader pins it. Returns `false` when the
// coordinator was poisoned.
fn drain_queue<S: TripleStore + 'static>(shared: &Shared<S>) -> bool {
    loop {
        let (delta, cell) = {
            let mut state = shared.state.lock();
            if state.poisoned {
                return false;
            }
            if state.queue.is_empty() {
                drop(state);
                shared.changed.notify_all();
                return true;
            }
            // A non-empty queue implies the stale copy is present: a
            // writer owning it as working copy clears the queue first.
            let cell = state
                .stale
                .as_ref()
                .expect("stale copy present while deltas are queued")
                .clone();
            if cell.pinned() {
                // Wait for its readers to drain, then re-evaluate from
                // scratch; the world may have changed while we slept.
                shared.changed.wait(&mut state);
                continue;
            }
            state.applying = true;
            let delta = state.queue.pop_front().expect("queue checked non-empty");
            (delta, cell)
        };
        let outcome = {
            let mut graph = cell.graph.write();
            delta.apply(&mut graph)
        };
        let mut state = shared.state.lock();
        state.applying = false;
        match outcome {
            Ok(()) => {
                debug!(ops = delta.len(), "delta folded into stale copy");
                drop(state);
                shared.changed.notify_all();
            }
            Err(err) => {
                error!(error = %err, "delta replay failed; poisoning coordinator");
                state.poisoned = true;
                drop(state);
                shared.changed.notify_all();
                return false;
            }
        }
    }
}
