//! Remote procedure calls and their futures

use crossbeam::channel::{Receiver, TryRecvError};

/// A boxed handler shipped to another rank's mailbox.
pub(crate) type Handler = Box<dyn FnOnce() + Send + 'static>;

/// Pending result of an RPC issued with [`Rank::rpc`](super::Rank::rpc).
///
/// Waiting is a progress point: while blocked, the issuing rank services its
/// own inbound handlers, so two ranks RPC-ing each other cannot deadlock.
pub struct RpcFuture<T> {
    reply: Receiver<T>,
    inbox: Receiver<Handler>,
}

impl<T> RpcFuture<T> {
    pub(crate) fn new(reply: Receiver<T>, inbox: Receiver<Handler>) -> Self {
        Self { reply, inbox }
    }

    /// Block until the remote handler has run and returned its value.
    pub fn wait(self) -> T {
        loop {
            match self.reply.try_recv() {
                Ok(value) => return value,
                Err(TryRecvError::Empty) => {}
                // The target dropped the handler without running it; the
                // runtime model has no recovery path for that.
                Err(TryRecvError::Disconnected) => panic!("rpc reply channel closed"),
            }
            match self.inbox.try_recv() {
                Ok(handler) => handler(),
                Err(_) => std::thread::yield_now(),
            }
        }
    }
}
