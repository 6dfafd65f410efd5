//! In-process PGAS cohort
//!
//! The table's runtime collaborator: a cohort of peer ranks with a global
//! barrier, a collective exchange for building replicated directories, and
//! remote procedure calls returning futures.
//!
//! Each rank runs on its own OS thread; globally-addressable memory is
//! modeled by `Arc`-shared segments, so a remote atomic is literally an
//! atomic operation on the owner's storage. Inbound RPC handlers execute
//! only at the target rank's progress points — inside [`Rank::barrier`],
//! inside [`RpcFuture::wait`], or an explicit [`Rank::progress`] call — so
//! handlers are serialized on the owning rank, as in a cooperative
//! communication runtime. There is no cancellation and no timeout: every
//! issued operation completes.

mod cohort;
mod rpc;

pub use cohort::{Cohort, Rank};
pub use rpc::RpcFuture;
