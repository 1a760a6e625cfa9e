//! The resolution state behind every promise.
//!
//! One mutex guards the outcome, the handler list and the waker list. It is
//! held only for bookkeeping: handler bodies are handed to their queue and run
//! there, never under the lock and never on the resolving or registering
//! thread.
use crate::{error::Error, queue::Queue, reporter};
use log::trace;
use parking_lot::Mutex;
use std::{
    mem,
    sync::Arc,
    task::Waker,
};

pub(crate) type Outcome<T> = Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Fulfilled,
    Rejected,
}

/// What a handler was registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Fulfill,
    Reject,
    Finally,
    /// Internal: carries a returned promise's outcome into a child.
    Forward,
}

struct Handler<T> {
    kind: Kind,
    queue: Queue,
    deliver: Box<dyn FnOnce(Outcome<T>) + Send>,
}

impl<T: Send + 'static> Handler<T> {
    fn dispatch(self, outcome: Outcome<T>) {
        trace!("dispatching {:?} handler to `{}`", self.kind, self.queue.label());
        let deliver = self.deliver;
        self.queue.submit(move || deliver(outcome));
    }
}

struct Inner<T> {
    outcome: Option<Outcome<T>>,
    handlers: Vec<Handler<T>>,
    wakers: Vec<Waker>,
    /// Live `Promise` handles.
    handles: usize,
    /// Some handler, waiter or awaiting future has taken on the outcome.
    observed: bool,
}

pub(crate) struct State<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> State<T> {
    pub(crate) fn pending() -> Arc<Self> {
        Self::with_outcome(None)
    }

    pub(crate) fn settled(outcome: Outcome<T>) -> Arc<Self> {
        Self::with_outcome(Some(outcome))
    }

    fn with_outcome(outcome: Option<Outcome<T>>) -> Arc<Self> {
        Arc::new(State {
            inner: Mutex::new(Inner {
                outcome,
                handlers: Vec::new(),
                wakers: Vec::new(),
                handles: 0,
                observed: false,
            }),
        })
    }

    pub(crate) fn status(&self) -> Status {
        match self.inner.lock().outcome {
            None => Status::Pending,
            Some(Ok(_)) => Status::Fulfilled,
            Some(Err(_)) => Status::Rejected,
        }
    }

    pub(crate) fn retain_handle(&self) {
        self.inner.lock().handles += 1;
    }

    pub(crate) fn release_handle(&self) {
        self.inner.lock().handles -= 1;
    }
}

impl<T: Clone + Send + 'static> State<T> {
    pub(crate) fn value(&self) -> Option<T> {
        match self.inner.lock().outcome {
            Some(Ok(ref value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Moves a pending state to its terminal outcome and hands every stored
    /// handler to its queue, in registration order. Returns false, changing
    /// nothing, if the state was already settled.
    pub(crate) fn settle(&self, outcome: Outcome<T>) -> bool {
        self.settle_if(outcome, |_| true)
    }

    /// Rejects with [`Error::ProducerDropped`] if the state is pending and
    /// something can still see the result: a handle, a handler or a waiter.
    pub(crate) fn abandon(&self) -> bool {
        self.settle_if(Err(Error::ProducerDropped), |inner| {
            inner.handles > 0 || !inner.handlers.is_empty() || !inner.wakers.is_empty()
        })
    }

    fn settle_if<P>(&self, outcome: Outcome<T>, wanted: P) -> bool
    where
        P: FnOnce(&Inner<T>) -> bool,
    {
        let wakers = {
            let mut inner = self.inner.lock();
            if inner.outcome.is_some() {
                trace!("ignoring resolution of a settled promise");
                return false;
            }
            if !wanted(&*inner) {
                return false;
            }
            // Submitted under the lock so that a late subscriber racing with
            // this call cannot be queued ahead of the stored handlers.
            for handler in mem::take(&mut inner.handlers) {
                handler.dispatch(outcome.clone());
            }
            inner.outcome = Some(outcome);
            mem::take(&mut inner.wakers)
        };
        for waker in wakers {
            waker.wake();
        }
        true
    }

    /// Registers `deliver` to receive the outcome on `queue`. A state that is
    /// already settled dispatches it right away, still through the queue.
    pub(crate) fn subscribe<F>(&self, kind: Kind, queue: Queue, deliver: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        let handler = Handler {
            kind,
            queue,
            deliver: Box::new(deliver),
        };
        let mut inner = self.inner.lock();
        inner.observed = true;
        match inner.outcome.clone() {
            Some(outcome) => handler.dispatch(outcome),
            None => inner.handlers.push(handler),
        }
    }

    /// The outcome if settled, otherwise remembers `waker` for the settlement.
    pub(crate) fn poll_outcome(&self, waker: &Waker) -> Option<Outcome<T>> {
        let mut inner = self.inner.lock();
        match inner.outcome.clone() {
            Some(outcome) => {
                inner.observed = true;
                Some(outcome)
            }
            None => {
                if !inner.wakers.iter().any(|w| w.will_wake(waker)) {
                    inner.wakers.push(waker.clone());
                }
                None
            }
        }
    }
}

impl<T> Drop for State<T> {
    /// A rejection nobody ever took on is reported here, once.
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if let Some(Err(ref err)) = inner.outcome {
            if !inner.observed {
                reporter::report(err);
            }
        }
    }
}
