//! kmerdht - a distributed open-addressing hash table for k-mer records
//!
//! This crate provides the central data structure of a parallel de Bruijn
//! contig assembler: a write-once, read-many hash table whose storage is
//! partitioned across a cohort of peer ranks. Each rank owns a flat local
//! segment of slots; any rank can insert into or query any slot through the
//! partitioned global address space.
//!
//! The table is built in a single bulk insert phase and then queried in a
//! traversal phase; a global barrier separates the two. Slots are claimed
//! with an atomic compare-and-swap on an occupancy flag and never released.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use kmerdht::{Cohort, DistHashMap, KmerRecord, TableConfig};
//!
//! Cohort::launch(4, |rank| {
//!     let table = DistHashMap::<KmerRecord>::new(&rank, &TableConfig::with_slots(1 << 20))?;
//!
//!     for record in my_records(&rank) {
//!         table.insert(record);
//!     }
//!     rank.barrier(); // insert phase complete on every rank
//!
//!     let hit = table.find(&some_key);
//!     table.destroy();
//!     Ok::<_, kmerdht::TableError>(())
//! });
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod dispatch;
pub mod kmer;
pub mod partition;
pub mod pgas;
pub mod probe;
pub mod record;
pub mod segment;
pub mod stats;
pub mod status;
pub mod table;

// Re-exports for convenience
pub use config::{ConfigError, KmerDhtConfig, TableConfig};
pub use dispatch::RemoteMode;
pub use kmer::{KmerError, KmerRecord, PackedKmer, KMER_LEN};
pub use pgas::{Cohort, Rank, RpcFuture};
pub use record::TableRecord;
pub use stats::StatsSnapshot;
pub use status::Status;
pub use table::{DistHashMap, TableError};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::TableConfig;
    pub use crate::dispatch::RemoteMode;
    pub use crate::kmer::{KmerRecord, PackedKmer};
    pub use crate::pgas::{Cohort, Rank};
    pub use crate::record::TableRecord;
    pub use crate::status::Status;
    pub use crate::table::DistHashMap;
}
