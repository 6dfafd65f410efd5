//! K-mer records: packed keys plus extension payload
//!
//! A k-mer is a fixed-length DNA subsequence. `KMER_LEN` is fixed at compile
//! time by cargo feature, matching the assembler's fixed-K builds; bases are
//! packed two bits each so records stay small and byte-copyable.
//!
//! The key digest must be deterministic across runs and ranks. We do not use
//! `DefaultHasher`.

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

#[cfg(not(any(feature = "k19", feature = "k51")))]
compile_error!("Enable a k-mer length feature: `k19` (default) or `k51`.");

#[cfg(not(any(feature = "hash-xxh3", feature = "hash-xxh64")))]
compile_error!("Enable a hash feature: `hash-xxh3` (default) or `hash-xxh64`.");

/// Number of bases in a k-mer, selected at compile time.
#[cfg(feature = "k19")]
pub const KMER_LEN: usize = 19;

/// Number of bases in a k-mer, selected at compile time.
#[cfg(all(not(feature = "k19"), feature = "k51"))]
pub const KMER_LEN: usize = 51;

/// Bytes needed to pack `KMER_LEN` bases at two bits per base.
pub const PACKED_KMER_BYTES: usize = (KMER_LEN + 3) / 4;

/// Extension character marking a contig terminal.
pub const TERMINAL_EXT: u8 = b'F';

/// Errors from constructing k-mer values out of text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KmerError {
    /// A base other than A, C, G or T appeared in the sequence.
    #[error("invalid base `{0}` in k-mer")]
    InvalidBase(char),
    /// The sequence length does not match the compiled `KMER_LEN`.
    #[error("expected {KMER_LEN} bases, got {0}")]
    WrongLength(usize),
    /// An extension character other than A, C, G, T or F.
    #[error("invalid extension `{0}`")]
    InvalidExtension(char),
}

/// Hash key bytes into a 64-bit value (deterministic).
#[inline]
pub fn hash64(bytes: &[u8]) -> u64 {
    #[cfg(feature = "hash-xxh3")]
    {
        xxhash_rust::xxh3::xxh3_64(bytes)
    }

    #[cfg(all(not(feature = "hash-xxh3"), feature = "hash-xxh64"))]
    {
        xxhash_rust::xxh64::xxh64(bytes, 0)
    }
}

#[inline]
fn encode_base(base: u8) -> Result<u8, KmerError> {
    match base {
        b'A' => Ok(0),
        b'C' => Ok(1),
        b'G' => Ok(2),
        b'T' => Ok(3),
        other => Err(KmerError::InvalidBase(other as char)),
    }
}

#[inline]
fn decode_base(code: u8) -> u8 {
    match code & 0b11 {
        0 => b'A',
        1 => b'C',
        2 => b'G',
        _ => b'T',
    }
}

#[inline]
fn validate_ext(ext: u8) -> Result<u8, KmerError> {
    match ext {
        b'A' | b'C' | b'G' | b'T' | TERMINAL_EXT => Ok(ext),
        other => Err(KmerError::InvalidExtension(other as char)),
    }
}

/// A k-mer key, two bits per base, little-endian within each byte.
///
/// Trailing bits of the last byte are always zero, so equal sequences have
/// equal bytes and the digest is well defined.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct PackedKmer {
    bytes: [u8; PACKED_KMER_BYTES],
}

impl PackedKmer {
    /// Pack a textual base sequence of exactly `KMER_LEN` characters.
    pub fn from_bases(bases: &str) -> Result<Self, KmerError> {
        let raw = bases.as_bytes();
        if raw.len() != KMER_LEN {
            return Err(KmerError::WrongLength(raw.len()));
        }
        let mut bytes = [0u8; PACKED_KMER_BYTES];
        for (i, &base) in raw.iter().enumerate() {
            bytes[i / 4] |= encode_base(base)? << (2 * (i % 4));
        }
        Ok(Self { bytes })
    }

    /// The packed representation.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decode back to a textual base sequence.
    pub fn to_bases(&self) -> String {
        let mut out = String::with_capacity(KMER_LEN);
        for i in 0..KMER_LEN {
            out.push(decode_base(self.bytes[i / 4] >> (2 * (i % 4))) as char);
        }
        out
    }

    /// Key digest used for partitioning and probing.
    #[inline]
    pub fn hash(&self) -> u64 {
        hash64(&self.bytes)
    }
}

impl std::fmt::Debug for PackedKmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PackedKmer").field(&self.to_bases()).finish()
    }
}

/// One table entry: a packed k-mer key plus its two extension characters.
///
/// The forward and backward extensions drive the contig walk that consumes
/// the table; `F` marks a contig terminal.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct KmerRecord {
    kmer: PackedKmer,
    ext: [u8; 2],
}

impl KmerRecord {
    /// Build a record from a packed key and forward/backward extensions.
    pub fn new(kmer: PackedKmer, forward: u8, backward: u8) -> Result<Self, KmerError> {
        Ok(Self {
            kmer,
            ext: [validate_ext(forward)?, validate_ext(backward)?],
        })
    }

    /// The record's key.
    #[inline]
    pub fn kmer(&self) -> &PackedKmer {
        &self.kmer
    }

    /// Extension appended when walking forward.
    #[inline]
    pub fn forward_ext(&self) -> u8 {
        self.ext[0]
    }

    /// Extension appended when walking backward.
    #[inline]
    pub fn backward_ext(&self) -> u8 {
        self.ext[1]
    }

    /// Whether the forward walk terminates at this record.
    #[inline]
    pub fn is_forward_terminal(&self) -> bool {
        self.ext[0] == TERMINAL_EXT
    }
}

impl std::fmt::Debug for KmerRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KmerRecord")
            .field("kmer", &self.kmer)
            .field("forward", &(self.ext[0] as char))
            .field("backward", &(self.ext[1] as char))
            .finish()
    }
}

impl crate::record::TableRecord for KmerRecord {
    type Key = PackedKmer;

    #[inline]
    fn key(&self) -> PackedKmer {
        self.kmer
    }

    #[inline]
    fn key_hash(key: &PackedKmer) -> u64 {
        key.hash()
    }
}
