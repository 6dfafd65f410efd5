//! Cohort launch, rank handles, barrier and collective exchange

use std::any::Any;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;

use super::rpc::{Handler, RpcFuture};

/// Sense-reversing barrier state shared by the cohort.
struct BarrierState {
    arrived: AtomicUsize,
    generation: AtomicU64,
}

struct CohortShared {
    count: usize,
    barrier: BarrierState,
    mailboxes: Box<[Sender<Handler>]>,
    exchange_slots: Mutex<Vec<Option<Arc<dyn Any + Send + Sync>>>>,
}

/// Launches a cohort of peer ranks.
pub struct Cohort;

impl Cohort {
    /// Run `f` once per rank, each on its own thread, and collect the
    /// results in rank order. Returns when every rank has finished.
    pub fn launch<F, T>(ranks: usize, f: F) -> Vec<T>
    where
        F: Fn(Rank) -> T + Send + Sync,
        T: Send,
    {
        assert!(ranks > 0, "cohort needs at least one rank");

        let mut mailboxes = Vec::with_capacity(ranks);
        let mut inboxes = Vec::with_capacity(ranks);
        for _ in 0..ranks {
            let (tx, rx) = unbounded::<Handler>();
            mailboxes.push(tx);
            inboxes.push(rx);
        }

        let shared = Arc::new(CohortShared {
            count: ranks,
            barrier: BarrierState {
                arrived: AtomicUsize::new(0),
                generation: AtomicU64::new(0),
            },
            mailboxes: mailboxes.into_boxed_slice(),
            exchange_slots: Mutex::new(vec![None; ranks]),
        });

        thread::scope(|scope| {
            let f = &f;
            let handles: Vec<_> = inboxes
                .into_iter()
                .enumerate()
                .map(|(me, inbox)| {
                    let shared = Arc::clone(&shared);
                    scope.spawn(move || {
                        f(Rank {
                            me,
                            shared,
                            inbox,
                        })
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("rank thread panicked"))
                .collect()
        })
    }
}

/// Per-rank handle to the cohort.
///
/// Clones share the rank's identity and inbox; a handle must stay on its
/// owning thread so inbound handlers run where the rank's state lives.
#[derive(Clone)]
pub struct Rank {
    me: usize,
    shared: Arc<CohortShared>,
    inbox: Receiver<Handler>,
}

impl Rank {
    /// This rank's id in `[0, count)`.
    #[inline]
    pub fn me(&self) -> usize {
        self.me
    }

    /// Number of ranks in the cohort.
    #[inline]
    pub fn count(&self) -> usize {
        self.shared.count
    }

    /// Service all currently queued inbound handlers without blocking.
    pub fn progress(&self) {
        while let Ok(handler) = self.inbox.try_recv() {
            handler();
        }
    }

    /// Global barrier. Establishes happens-before between everything the
    /// cohort did before the barrier and everything after it; this is the
    /// fence separating the table's insert and find phases. Services the
    /// inbox while waiting.
    pub fn barrier(&self) {
        let barrier = &self.shared.barrier;
        let generation = barrier.generation.load(Ordering::Acquire);
        if barrier.arrived.fetch_add(1, Ordering::AcqRel) + 1 == self.shared.count {
            barrier.arrived.store(0, Ordering::Release);
            barrier.generation.fetch_add(1, Ordering::Release);
        } else {
            while barrier.generation.load(Ordering::Acquire) == generation {
                self.progress();
                thread::yield_now();
            }
        }
    }

    /// Ship `f` to `target` and return a future for its result. The handler
    /// runs at one of the target's progress points; a self-targeted call
    /// runs immediately.
    pub fn rpc<T, F>(&self, target: usize, f: F) -> RpcFuture<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        assert!(target < self.shared.count, "rpc target out of range");
        let (reply_tx, reply_rx) = bounded(1);
        let handler: Handler = Box::new(move || {
            let _ = reply_tx.send(f());
        });
        if target == self.me {
            handler();
        } else {
            self.shared.mailboxes[target]
                .send(handler)
                .expect("target rank mailbox closed");
        }
        RpcFuture::new(reply_rx, self.inbox.clone())
    }

    /// Collective all-gather: every rank contributes one value and receives
    /// every rank's contribution, indexed by rank. This is how replicated
    /// directories are built at table construction.
    ///
    /// All ranks must call `exchange` with the same `T`, in the same
    /// collective order.
    pub fn exchange<T>(&self, value: T) -> Vec<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.shared.exchange_slots.lock()[self.me] = Some(Arc::new(value));
        self.barrier();
        let gathered: Vec<T> = {
            let slots = self.shared.exchange_slots.lock();
            slots
                .iter()
                .map(|slot| {
                    let any = Arc::clone(slot.as_ref().expect("exchange slot not deposited"));
                    match any.downcast::<T>() {
                        Ok(value) => value.as_ref().clone(),
                        Err(_) => panic!("exchange type mismatch across ranks"),
                    }
                })
                .collect()
        };
        self.barrier();
        self.shared.exchange_slots.lock()[self.me] = None;
        gathered
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_ranks_are_enumerated() {
        let mut ids = Cohort::launch(4, |rank| {
            assert_eq!(rank.count(), 4);
            rank.me()
        });
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_barrier_separates_phases() {
        let counter = Arc::new(AtomicUsize::new(0));
        let observed = Cohort::launch(4, |rank| {
            counter.fetch_add(1, Ordering::SeqCst);
            rank.barrier();
            counter.load(Ordering::SeqCst)
        });
        // Every rank must observe all four pre-barrier increments.
        assert_eq!(observed, vec![4, 4, 4, 4]);
    }

    #[test]
    fn test_repeated_barriers() {
        Cohort::launch(3, |rank| {
            for _ in 0..100 {
                rank.barrier();
            }
        });
    }

    #[test]
    fn test_exchange_gathers_in_rank_order() {
        let gathered = Cohort::launch(3, |rank| rank.exchange(rank.me() * 10));
        for per_rank in gathered {
            assert_eq!(per_rank, vec![0, 10, 20]);
        }
    }

    #[test]
    fn test_exchange_twice_in_a_row() {
        Cohort::launch(2, |rank| {
            let first = rank.exchange(rank.me());
            let second = rank.exchange(rank.me() + 100);
            assert_eq!(first, vec![0, 1]);
            assert_eq!(second, vec![100, 101]);
        });
    }

    #[test]
    fn test_rpc_runs_on_target() {
        let results = Cohort::launch(2, |rank| {
            if rank.me() == 0 {
                let future = rank.rpc(1, || 7 * 6);
                let value = future.wait();
                rank.barrier();
                value
            } else {
                // Rank 1 sits in the barrier servicing rank 0's call.
                rank.barrier();
                0
            }
        });
        assert_eq!(results[0], 42);
    }

    #[test]
    fn test_self_rpc_runs_inline() {
        Cohort::launch(1, |rank| {
            let future = rank.rpc(0, || "inline");
            assert_eq!(future.wait(), "inline");
        });
    }

    #[test]
    fn test_mutual_rpc_does_not_deadlock() {
        Cohort::launch(2, |rank| {
            let peer = 1 - rank.me();
            let future = rank.rpc(peer, move || peer * 10);
            // Both ranks wait simultaneously; each services the other's
            // handler from inside wait().
            assert_eq!(future.wait(), peer * 10);
            rank.barrier();
        });
    }
}
