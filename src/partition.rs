//! Hash-partitioned slot ownership
//!
//! Every key is homed on rank `h mod R` and probed entirely within that
//! rank's local segment, starting at `(h / R) mod L_r`. Dividing out the
//! rank component decorrelates the owner choice from the in-segment
//! position. Segment lengths differ by at most one slot across ranks and
//! are fixed for the table's lifetime.

/// Maps a key hash to its owning rank and initial local slot.
///
/// Pure and identical on every rank: the same `(ranks, total_slots)` pair
/// always yields the same layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioner {
    ranks: u64,
    total_slots: u64,
}

impl Partitioner {
    /// Build the partition function for a cohort of `ranks` over
    /// `total_slots` table slots.
    pub fn new(ranks: usize, total_slots: u64) -> Self {
        assert!(ranks > 0, "partitioner needs at least one rank");
        Self {
            ranks: ranks as u64,
            total_slots,
        }
    }

    /// Total slot count `N` across the cohort.
    #[inline]
    pub fn total_slots(&self) -> u64 {
        self.total_slots
    }

    /// Number of ranks `R`.
    #[inline]
    pub fn ranks(&self) -> usize {
        self.ranks as usize
    }

    /// The rank owning this hash's probe sequence.
    #[inline]
    pub fn owner(&self, hash: u64) -> usize {
        (hash % self.ranks) as usize
    }

    /// Length of `rank`'s local segment: `⌊N/R⌋`, plus one for the first
    /// `N mod R` ranks.
    #[inline]
    pub fn segment_len(&self, rank: usize) -> u64 {
        let base = self.total_slots / self.ranks;
        let remainder = self.total_slots % self.ranks;
        base + u64::from((rank as u64) < remainder)
    }

    /// First probed slot within the owner's segment. Zero when the owner's
    /// segment is empty (`N < R`); such probes saturate immediately.
    #[inline]
    pub fn initial_index(&self, hash: u64) -> u64 {
        let len = self.segment_len(self.owner(hash));
        if len == 0 {
            0
        } else {
            (hash / self.ranks) % len
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_lens_sum_to_total() {
        for ranks in 1..=7 {
            for total in [0u64, 1, 5, 8, 64, 1000] {
                let p = Partitioner::new(ranks, total);
                let sum: u64 = (0..ranks).map(|r| p.segment_len(r)).sum();
                assert_eq!(sum, total, "ranks={ranks} total={total}");
            }
        }
    }

    #[test]
    fn test_segment_lens_differ_by_at_most_one() {
        let p = Partitioner::new(3, 10);
        let lens: Vec<u64> = (0..3).map(|r| p.segment_len(r)).collect();
        assert_eq!(lens, vec![4, 3, 3]);
    }

    #[test]
    fn test_owner_and_initial_index_are_stable() {
        // Property: two partitioners built from the same parameters agree
        // everywhere, which is what construction on separate ranks relies on.
        let a = Partitioner::new(4, 1024);
        let b = Partitioner::new(4, 1024);
        for hash in (0..10_000u64).map(|i| i.wrapping_mul(0x9e37_79b9_7f4a_7c15)) {
            assert_eq!(a.owner(hash), b.owner(hash));
            assert_eq!(a.initial_index(hash), b.initial_index(hash));
        }
    }

    #[test]
    fn test_initial_index_in_bounds() {
        let p = Partitioner::new(3, 10);
        for hash in 0..1000u64 {
            let owner = p.owner(hash);
            assert!(p.initial_index(hash) < p.segment_len(owner));
        }
    }

    #[test]
    fn test_two_rank_layout() {
        // R=2, N=8: even hashes home on rank 0, odd on rank 1, and
        // consecutive same-rank hashes land in consecutive slots.
        let p = Partitioner::new(2, 8);
        for hash in 0..8u64 {
            assert_eq!(p.owner(hash), (hash % 2) as usize);
            assert_eq!(p.initial_index(hash), (hash / 2) % 4);
        }
    }

    #[test]
    fn test_fewer_slots_than_ranks() {
        let p = Partitioner::new(4, 2);
        assert_eq!(p.segment_len(0), 1);
        assert_eq!(p.segment_len(1), 1);
        assert_eq!(p.segment_len(2), 0);
        assert_eq!(p.segment_len(3), 0);
        // Hash homed on an empty segment must not divide by zero.
        assert_eq!(p.initial_index(2), 0);
    }
}
