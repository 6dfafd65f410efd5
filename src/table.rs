//! Public table façade
//!
//! Construction and destruction are collective: every rank calls them with
//! identical parameters, and both end in a global barrier. Between those,
//! `insert` and `find` may be called freely from any rank; a find phase that
//! must observe all inserts is separated from them by [`Rank::barrier`].

use std::collections::VecDeque;
use std::sync::Arc;

use thiserror::Error;

use crate::config::TableConfig;
use crate::dispatch::{Dispatcher, TableCore};
use crate::partition::Partitioner;
use crate::pgas::{Rank, RpcFuture};
use crate::record::TableRecord;
use crate::segment::LocalSegment;
use crate::stats::{StatsSnapshot, TableStats};
use crate::status::Status;

/// Errors from collective table construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// The requested capacity was zero.
    #[error("table capacity must be non-zero")]
    ZeroCapacity,
    /// Ranks disagreed on the slot count.
    #[error("rank {rank} constructed the table with {theirs} slots, this rank with {ours}")]
    CapacityMismatch {
        /// Disagreeing rank.
        rank: usize,
        /// This rank's slot count.
        ours: u64,
        /// The disagreeing rank's slot count.
        theirs: u64,
    },
    /// Ranks disagreed on the remote access mode.
    #[error("rank {rank} constructed the table with a different remote mode")]
    ModeMismatch {
        /// Disagreeing rank.
        rank: usize,
    },
}

/// One rank's handle to the distributed hash table.
///
/// The handle is cheap to use from its owning rank only; the storage behind
/// it is shared by the whole cohort and lives until every rank has called
/// [`destroy`](Self::destroy).
pub struct DistHashMap<R: TableRecord> {
    rank: Rank,
    config: TableConfig,
    core: Arc<TableCore<R>>,
    local: Arc<LocalSegment<R>>,
    dispatcher: Dispatcher<R>,
}

impl<R: TableRecord> DistHashMap<R> {
    /// Collectively construct the table. Every rank allocates and zeroes its
    /// local segment, publishes the handle through a collective exchange,
    /// and leaves only after the closing barrier, so no rank can observe a
    /// peer's segment before it exists.
    pub fn new(rank: &Rank, config: &TableConfig) -> Result<Self, TableError> {
        let partitioner = Partitioner::new(rank.count(), config.total_slots);
        let local = Arc::new(LocalSegment::<R>::new(partitioner.segment_len(rank.me())));

        let views = rank.exchange((
            config.total_slots,
            config.remote_mode,
            Arc::clone(&local),
            Arc::new(TableStats::default()),
        ));

        for (peer, view) in views.iter().enumerate() {
            if view.0 != config.total_slots {
                return Err(TableError::CapacityMismatch {
                    rank: peer,
                    ours: config.total_slots,
                    theirs: view.0,
                });
            }
            if view.1 != config.remote_mode {
                return Err(TableError::ModeMismatch { rank: peer });
            }
        }
        if config.total_slots == 0 {
            return Err(TableError::ZeroCapacity);
        }

        let directory: Box<[_]> = views.iter().map(|view| Arc::clone(&view.2)).collect();
        // The cohort shares rank 0's counter block.
        let stats = Arc::clone(&views[0].3);

        let core = Arc::new(TableCore {
            directory,
            partitioner,
            stats,
        });
        let dispatcher = Dispatcher::new(rank.clone(), Arc::clone(&core), config.remote_mode);

        tracing::info!(
            ranks = rank.count(),
            total_slots = config.total_slots,
            local_slots = local.len(),
            mode = config.remote_mode.as_str(),
            "distributed table constructed"
        );

        Ok(Self {
            rank: rank.clone(),
            config: config.clone(),
            core,
            local,
            dispatcher,
        })
    }

    /// Insert a record. Returns `true` when a slot was claimed and the
    /// record committed; `false` when the probe sequence saturated. A
    /// rejected record is not retried and will not be found later.
    pub fn insert(&self, record: R) -> bool {
        let status = self.dispatcher.insert(&record);
        if status.is_table_full() {
            tracing::debug!(hash = record.hash(), "probe sequence saturated, insert rejected");
        }
        status.is_ok()
    }

    /// Insert a batch, overlapping remote operations across independent
    /// keys up to the configured in-flight cap. Returns how many committed.
    /// Per-key probe order is unchanged; this only pipelines across keys.
    pub fn insert_batch(&self, records: &[R]) -> usize {
        let cap = self.config.inflight_cap();
        let mut inflight: VecDeque<RpcFuture<Status>> = VecDeque::with_capacity(cap);
        let mut committed = 0;

        for record in records {
            let home = self.dispatcher.home_of(record.hash());
            if self.dispatcher.is_direct(home) {
                committed += usize::from(self.insert(*record));
            } else {
                if inflight.len() == cap {
                    let status = inflight.pop_front().expect("inflight queue").wait();
                    committed += usize::from(status.is_ok());
                }
                self.core.stats.record_remote_op();
                inflight.push_back(self.dispatcher.insert_rpc(home, *record));
            }
        }
        for future in inflight {
            committed += usize::from(future.wait().is_ok());
        }
        committed
    }

    /// Look up a key. `None` means the key was never committed — or the
    /// find ran concurrently with the insert phase, in which case the
    /// result is meaningful only after the inter-phase barrier.
    pub fn find(&self, key: &R::Key) -> Option<R> {
        self.dispatcher.find(key)
    }

    /// Total slot count `N` (capacity, not occupancy).
    #[inline]
    pub fn size(&self) -> u64 {
        self.core.partitioner.total_slots()
    }

    /// This rank's segment length `L_r`.
    #[inline]
    pub fn local_size(&self) -> u64 {
        self.local.len()
    }

    /// Claimed slots in this rank's segment. Diagnostic scan.
    pub fn local_occupied(&self) -> u64 {
        self.local.occupied()
    }

    /// Point-in-time copy of the cohort-wide operation counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.core.stats.snapshot()
    }

    /// Collectively tear the table down. The barrier quiesces all remote
    /// access to every segment before any storage is released.
    pub fn destroy(self) {
        self.rank.barrier();
        tracing::debug!(rank = self.rank.me(), "distributed table destroyed");
    }
}
