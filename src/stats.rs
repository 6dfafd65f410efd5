//! Operation counters for the distributed table
//!
//! One `TableStats` block is shared by the whole cohort (the counters are
//! plain atomics, so cross-rank increments are cheap). Counters use relaxed
//! ordering; they are diagnostics, not synchronization.

use std::sync::atomic::{AtomicU64, Ordering};

/// Cohort-wide operation statistics.
#[derive(Debug, Default)]
pub struct TableStats {
    /// Inserts that committed a slot.
    pub inserts_committed: AtomicU64,
    /// Inserts rejected by probe-sequence saturation.
    pub inserts_rejected: AtomicU64,
    /// Finds that returned a record.
    pub finds_hit: AtomicU64,
    /// Finds that returned nothing.
    pub finds_missed: AtomicU64,
    /// Slots visited by insert probe chains.
    pub insert_probes: AtomicU64,
    /// Slots visited by find probe chains.
    pub find_probes: AtomicU64,
    /// Operations whose home rank was not the caller.
    pub remote_ops: AtomicU64,
    /// Remote procedure calls issued.
    pub rpcs_issued: AtomicU64,
}

impl TableStats {
    /// Record an insert outcome.
    pub fn record_insert(&self, committed: bool) {
        if committed {
            self.inserts_committed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inserts_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a find outcome.
    pub fn record_find(&self, hit: bool) {
        if hit {
            self.finds_hit.fetch_add(1, Ordering::Relaxed);
        } else {
            self.finds_missed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Add probe steps taken by one insert.
    #[inline]
    pub fn add_insert_probes(&self, probes: u64) {
        self.insert_probes.fetch_add(probes, Ordering::Relaxed);
    }

    /// Add probe steps taken by one find.
    #[inline]
    pub fn add_find_probes(&self, probes: u64) {
        self.find_probes.fetch_add(probes, Ordering::Relaxed);
    }

    /// Record an operation targeting a remote rank.
    #[inline]
    pub fn record_remote_op(&self) {
        self.remote_ops.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an RPC dispatch.
    #[inline]
    pub fn record_rpc(&self) {
        self.rpcs_issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            inserts_committed: self.inserts_committed.load(Ordering::Relaxed),
            inserts_rejected: self.inserts_rejected.load(Ordering::Relaxed),
            finds_hit: self.finds_hit.load(Ordering::Relaxed),
            finds_missed: self.finds_missed.load(Ordering::Relaxed),
            insert_probes: self.insert_probes.load(Ordering::Relaxed),
            find_probes: self.find_probes.load(Ordering::Relaxed),
            remote_ops: self.remote_ops.load(Ordering::Relaxed),
            rpcs_issued: self.rpcs_issued.load(Ordering::Relaxed),
        }
    }
}

/// Plain-value view of [`TableStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Inserts that committed a slot.
    pub inserts_committed: u64,
    /// Inserts rejected by probe-sequence saturation.
    pub inserts_rejected: u64,
    /// Finds that returned a record.
    pub finds_hit: u64,
    /// Finds that returned nothing.
    pub finds_missed: u64,
    /// Slots visited by insert probe chains.
    pub insert_probes: u64,
    /// Slots visited by find probe chains.
    pub find_probes: u64,
    /// Operations whose home rank was not the caller.
    pub remote_ops: u64,
    /// Remote procedure calls issued.
    pub rpcs_issued: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = TableStats::default();
        stats.record_insert(true);
        stats.record_insert(true);
        stats.record_insert(false);
        stats.record_find(true);
        stats.record_find(false);
        stats.add_insert_probes(5);
        stats.add_find_probes(2);
        stats.record_rpc();

        let snap = stats.snapshot();
        assert_eq!(snap.inserts_committed, 2);
        assert_eq!(snap.inserts_rejected, 1);
        assert_eq!(snap.finds_hit, 1);
        assert_eq!(snap.finds_missed, 1);
        assert_eq!(snap.insert_probes, 5);
        assert_eq!(snap.find_probes, 2);
        assert_eq!(snap.rpcs_issued, 1);
    }

    #[test]
    fn test_snapshot_is_plain_copy() {
        let stats = TableStats::default();
        let before = stats.snapshot();
        stats.record_insert(true);
        let after = stats.snapshot();
        assert_eq!(before.inserts_committed, 0);
        assert_eq!(after.inserts_committed, 1);
    }
}
