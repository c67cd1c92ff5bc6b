//! One-shot load delivery and the seam to the external fetch implementation.
//!
//! Delivery objects are consumed by value, so "exactly one completion per
//! request" holds by construction instead of by runtime discipline. Replies
//! carry the generation they were issued for; the controller compares it at
//! apply time, which is what makes late completions after a release safe.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::content::SharedImage;

/// A load completion: the decoded image, or absence on failure.
pub type LoadDelivery = Option<SharedImage>;

pub(crate) type CompletionSender = async_channel::Sender<(u64, LoadDelivery)>;
pub(crate) type CompletionReceiver = async_channel::Receiver<(u64, LoadDelivery)>;

/// Single-use delivery handle for one load request.
pub struct LoadTicket {
    tx: CompletionSender,
    generation: u64,
    guard: Arc<AtomicU64>,
}

impl LoadTicket {
    pub(crate) fn new(tx: CompletionSender, generation: u64, guard: Arc<AtomicU64>) -> Self {
        Self {
            tx,
            generation,
            guard,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver the result. Consumes the ticket; the channel is unbounded so
    /// this never blocks the caller.
    pub fn deliver(self, result: LoadDelivery) {
        let _ = self.tx.send_blocking((self.generation, result));
    }

    pub(crate) fn into_fetch_reply(self, placeholder: Option<SharedImage>) -> FetchReply {
        FetchReply {
            ticket: self,
            placeholder,
        }
    }
}

/// Reply handle given to a fetch implementation.
///
/// Failure substitutes the configured placeholder when one exists, so the
/// transport never needs to know about it.
pub struct FetchReply {
    ticket: LoadTicket,
    placeholder: Option<SharedImage>,
}

impl FetchReply {
    /// True when the request this reply belongs to has been superseded.
    /// Workers can use this to skip dead decode/transfer work early; the
    /// controller re-checks at apply time regardless.
    pub fn is_stale(&self) -> bool {
        self.ticket.generation != self.ticket.guard.load(Ordering::Acquire)
    }

    pub fn succeed(self, image: SharedImage) {
        self.ticket.deliver(Some(image));
    }

    pub fn fail(self) {
        let placeholder = self.placeholder.clone();
        self.ticket.deliver(placeholder);
    }
}

/// Best-effort abort of an in-flight fetch. Aborting does not suppress the
/// completion; it only allows the transport to stop early.
pub trait AbortHandle {
    fn abort(&self);
}

/// Abort handle for loads that finish before they can be cancelled.
pub struct NoopAbort;

impl AbortHandle for NoopAbort {
    fn abort(&self) {}
}

/// External fetch implementation consumed by remote video sources.
///
/// Implementations must complete the reply exactly once (enforced by the
/// reply being consumed) and may do so from any thread.
pub trait ThumbnailFetch {
    fn fetch(&self, url: &str, reply: FetchReply) -> Box<dyn AbortHandle>;
}

/// Fetcher for hosts without a transport: every fetch fails immediately,
/// which surfaces the placeholder (or the retry affordance).
pub struct NoFetch;

impl ThumbnailFetch for NoFetch {
    fn fetch(&self, url: &str, reply: FetchReply) -> Box<dyn AbortHandle> {
        tracing::debug!("no fetch transport configured, failing fetch for {url}");
        reply.fail();
        Box::new(NoopAbort)
    }
}
