//! Record contract for stored table entries
//!
//! The table is generic over the record it stores. A record is a small,
//! trivially copyable value with a stable 64-bit key digest; `bytemuck::Pod`
//! supplies byte-copyability and makes an all-zero bit pattern a valid
//! (empty) record, which is what freshly zeroed slots hold.

use bytemuck::Pod;

/// A fixed-size record storable in the distributed table.
///
/// The key digest must be identical on every rank for the same key; the
/// partition function is derived from it.
pub trait TableRecord: Pod + Send + Sync + 'static {
    /// The lookup key carried inside the record.
    type Key: Pod + PartialEq + Send + Sync + 'static;

    /// Extract the record's key.
    fn key(&self) -> Self::Key;

    /// Digest a key into a 64-bit hash. Deterministic across ranks and runs.
    fn key_hash(key: &Self::Key) -> u64;

    /// Digest of this record's own key.
    #[inline]
    fn hash(&self) -> u64 {
        Self::key_hash(&self.key())
    }
}
