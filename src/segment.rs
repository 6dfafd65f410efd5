//! Per-rank slot storage and the claim protocol
//!
//! A segment is two parallel arrays: an atomic `used` flag per slot and the
//! slot's record, stored as little-endian `u64` words. The only permitted
//! flag transition on a live table is 0 -> 1, performed by a single
//! compare-and-swap; the winner then writes the record words. A record cell
//! is defined for a reader only once a happens-before fence (the inter-phase
//! barrier, or same-thread program order) separates it from the claiming
//! insert.
//!
//! Word-granular atomic access keeps racing phases free of undefined
//! behavior: a reader that ignores the phase contract sees stale or partial
//! words, never a torn non-atomic read.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use bytemuck::Zeroable;

use crate::probe::ProbeSeq;
use crate::record::TableRecord;
use crate::status::Status;

const SLOT_EMPTY: u32 = 0;
const SLOT_OCCUPIED: u32 = 1;

/// One rank's contiguous share of the table.
///
/// Remote ranks address slots through a shared handle to this segment; all
/// mutation goes through the atomic operations below.
pub struct LocalSegment<R: TableRecord> {
    used: Box<[AtomicU32]>,
    words: Box<[AtomicU64]>,
    _record: PhantomData<R>,
}

impl<R: TableRecord> LocalSegment<R> {
    /// `u64` words per record cell.
    pub const RECORD_WORDS: usize = (std::mem::size_of::<R>() + 7) / 8;

    /// Allocate a zeroed segment of `len` slots.
    pub fn new(len: u64) -> Self {
        let len = usize::try_from(len).expect("segment length exceeds address space");
        Self {
            used: (0..len).map(|_| AtomicU32::new(SLOT_EMPTY)).collect(),
            words: (0..len * Self::RECORD_WORDS)
                .map(|_| AtomicU64::new(0))
                .collect(),
            _record: PhantomData,
        }
    }

    /// Slot count `L_r`.
    #[inline]
    pub fn len(&self) -> u64 {
        self.used.len() as u64
    }

    /// Whether this rank owns no slots (legal when `N < R`).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Atomically claim `slot`. Returns `true` when this caller performed
    /// the 0 -> 1 transition; at most one claim ever succeeds per slot.
    #[inline]
    pub fn request_slot(&self, slot: u64) -> bool {
        self.used[slot as usize]
            .compare_exchange(
                SLOT_EMPTY,
                SLOT_OCCUPIED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Occupancy of `slot`, with acquire ordering against the claim.
    #[inline]
    pub fn slot_used(&self, slot: u64) -> bool {
        self.used[slot as usize].load(Ordering::Acquire) == SLOT_OCCUPIED
    }

    /// Word-granular record store. The caller must have claimed `slot` via
    /// [`request_slot`](Self::request_slot); exactly one writer ever touches
    /// a given cell.
    pub fn write_slot(&self, slot: u64, record: &R) {
        let bytes = bytemuck::bytes_of(record);
        let base = slot as usize * Self::RECORD_WORDS;
        for (i, chunk) in bytes.chunks(8).enumerate() {
            let mut word = [0u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            self.words[base + i].store(u64::from_le_bytes(word), Ordering::Relaxed);
        }
    }

    /// Word-granular record load. Meaningful only for slots observed
    /// occupied across a fence from the claiming insert.
    pub fn read_slot(&self, slot: u64) -> R {
        let mut record = R::zeroed();
        let base = slot as usize * Self::RECORD_WORDS;
        let bytes = bytemuck::bytes_of_mut(&mut record);
        for (i, chunk) in bytes.chunks_mut(8).enumerate() {
            let word = self.words[base + i].load(Ordering::Relaxed).to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
        record
    }

    /// Probe this segment for a free slot starting at `initial` and claim
    /// it. Returns the outcome and the number of slots visited.
    pub fn local_insert(&self, initial: u64, record: &R) -> (Status, u64) {
        let mut probes = 0;
        for slot in ProbeSeq::new(initial, self.len()) {
            probes += 1;
            if self.request_slot(slot) {
                self.write_slot(slot, record);
                return (Status::Ok, probes);
            }
        }
        (Status::TableFull, probes)
    }

    /// Walk the probe sequence for `key` starting at `initial`. The first
    /// empty slot terminates the search: occupancy is monotone, so an
    /// earlier-probe insert for this key would have claimed that slot.
    pub fn local_find(&self, initial: u64, key: &R::Key) -> (Option<R>, u64) {
        let mut probes = 0;
        for slot in ProbeSeq::new(initial, self.len()) {
            probes += 1;
            if !self.slot_used(slot) {
                return (None, probes);
            }
            let record = self.read_slot(slot);
            if record.key() == *key {
                return (Some(record), probes);
            }
        }
        (None, probes)
    }

    /// Count of claimed slots. Diagnostic only; not part of the hot path.
    pub fn occupied(&self) -> u64 {
        self.used
            .iter()
            .filter(|flag| flag.load(Ordering::Relaxed) == SLOT_OCCUPIED)
            .count() as u64
    }
}
