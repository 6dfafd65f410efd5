//! Access-path selection for probe targets
//!
//! Every operation resolves its home rank and then takes the cheapest path
//! there. The caller's own segment is touched directly; another rank's
//! segment is reached either through the shared directory handle (remote
//! atomics on the owner's storage) or by shipping the whole operation to the
//! owner as an RPC handler. Both paths go through the same claim protocol;
//! the CAS discipline is never relaxed.

use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::partition::Partitioner;
use crate::pgas::{Rank, RpcFuture};
use crate::record::TableRecord;
use crate::segment::LocalSegment;
use crate::stats::TableStats;
use crate::status::Status;

/// How operations reach a slot owned by another rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteMode {
    /// Per-probe atomic claim/load on the owner's segment, driven by the
    /// caller. The hot-path default.
    #[default]
    Atomics,
    /// Ship the record (or key) to the home rank and run the whole probe
    /// chain in a handler there. Serializes on the owner's progress loop.
    Rpc,
}

impl RemoteMode {
    /// Name used in configuration files.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RemoteMode::Atomics => "atomics",
            RemoteMode::Rpc => "rpc",
        }
    }
}

impl FromStr for RemoteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "atomics" => Ok(RemoteMode::Atomics),
            "rpc" => Ok(RemoteMode::Rpc),
            other => Err(format!("unknown remote mode `{other}`")),
        }
    }
}

/// Replicated per-rank view of the table's shared structure: the broadcast
/// directory of segment handles, the partition function, and the cohort-wide
/// counters. RPC handlers capture a clone and operate on the same storage.
pub(crate) struct TableCore<R: TableRecord> {
    pub(crate) directory: Box<[Arc<LocalSegment<R>>]>,
    pub(crate) partitioner: Partitioner,
    pub(crate) stats: Arc<TableStats>,
}

impl<R: TableRecord> TableCore<R> {
    /// Run the insert probe chain on `home`'s segment. Counts the outcome
    /// exactly once, wherever the chain executes.
    pub(crate) fn insert_on(&self, home: usize, hash: u64, record: &R) -> Status {
        let segment = &self.directory[home];
        let (status, probes) = segment.local_insert(self.partitioner.initial_index(hash), record);
        self.stats.add_insert_probes(probes);
        self.stats.record_insert(status.is_ok());
        status
    }

    /// Run the find probe chain on `home`'s segment.
    pub(crate) fn find_on(&self, home: usize, hash: u64, key: &R::Key) -> Option<R> {
        let segment = &self.directory[home];
        let (found, probes) = segment.local_find(self.partitioner.initial_index(hash), key);
        self.stats.add_find_probes(probes);
        self.stats.record_find(found.is_some());
        found
    }
}

/// Routes each operation to the local, remote-atomic or RPC path.
pub(crate) struct Dispatcher<R: TableRecord> {
    rank: Rank,
    core: Arc<TableCore<R>>,
    mode: RemoteMode,
}

impl<R: TableRecord> Dispatcher<R> {
    pub(crate) fn new(rank: Rank, core: Arc<TableCore<R>>, mode: RemoteMode) -> Self {
        Self { rank, core, mode }
    }

    /// Whether operations homed on `home` run in the calling rank without an
    /// RPC round trip.
    #[inline]
    pub(crate) fn is_direct(&self, home: usize) -> bool {
        home == self.rank.me() || self.mode == RemoteMode::Atomics
    }

    pub(crate) fn insert(&self, record: &R) -> Status {
        let hash = record.hash();
        let home = self.core.partitioner.owner(hash);
        if home != self.rank.me() {
            self.core.stats.record_remote_op();
        }
        if self.is_direct(home) {
            self.core.insert_on(home, hash, record)
        } else {
            self.insert_rpc(home, *record).wait()
        }
    }

    /// Issue the insert as an RPC to its home rank without waiting.
    pub(crate) fn insert_rpc(&self, home: usize, record: R) -> RpcFuture<Status> {
        self.core.stats.record_rpc();
        let core = Arc::clone(&self.core);
        self.rank
            .rpc(home, move || core.insert_on(home, record.hash(), &record))
    }

    pub(crate) fn find(&self, key: &R::Key) -> Option<R> {
        let hash = R::key_hash(key);
        let home = self.core.partitioner.owner(hash);
        if home != self.rank.me() {
            self.core.stats.record_remote_op();
        }
        if self.is_direct(home) {
            self.core.find_on(home, hash, key)
        } else {
            self.core.stats.record_rpc();
            let core = Arc::clone(&self.core);
            let key = *key;
            self.rank
                .rpc(home, move || core.find_on(home, R::key_hash(&key), &key))
                .wait()
        }
    }

    /// Home rank for a record hash.
    #[inline]
    pub(crate) fn home_of(&self, hash: u64) -> usize {
        self.core.partitioner.owner(hash)
    }
}
