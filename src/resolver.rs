//! The fulfill and reject callbacks handed to [`Promise::new`](crate::Promise::new).
//!
//! Both share one seal on the promise. When the last of them is dropped while
//! the promise is still pending and still referenced elsewhere, the promise is
//! rejected with [`Error::ProducerDropped`] so nothing downstream waits forever.
use crate::{error::Error, state::State};
use std::{fmt, sync::Arc};

struct Seal<T: Clone + Send + 'static> {
    state: Arc<State<T>>,
}

impl<T: Clone + Send + 'static> Drop for Seal<T> {
    fn drop(&mut self) {
        self.state.abandon();
    }
}

pub struct Fulfiller<T: Clone + Send + 'static> {
    seal: Arc<Seal<T>>,
}

pub struct Rejecter<T: Clone + Send + 'static> {
    seal: Arc<Seal<T>>,
}

pub(crate) fn pair<T>(state: Arc<State<T>>) -> (Fulfiller<T>, Rejecter<T>)
where
    T: Clone + Send + 'static,
{
    let seal = Arc::new(Seal { state });
    (Fulfiller { seal: seal.clone() }, Rejecter { seal })
}

impl<T: Clone + Send + 'static> Fulfiller<T> {
    /// Fulfills the promise. Returns false if it was already settled.
    pub fn fulfill(&self, value: T) -> bool {
        self.seal.state.settle(Ok(value))
    }

    /// Fulfills with `Ok`, rejects with `Err`.
    pub fn resolve(&self, outcome: Result<T, Error>) -> bool {
        self.seal.state.settle(outcome)
    }
}

impl<T: Clone + Send + 'static> Rejecter<T> {
    /// Rejects the promise. Returns false if it was already settled.
    pub fn reject(&self, err: impl Into<Error>) -> bool {
        self.seal.state.settle(Err(err.into()))
    }
}

impl<T: Clone + Send + 'static> Clone for Fulfiller<T> {
    fn clone(&self) -> Self {
        Fulfiller { seal: self.seal.clone() }
    }
}

impl<T: Clone + Send + 'static> Clone for Rejecter<T> {
    fn clone(&self) -> Self {
        Rejecter { seal: self.seal.clone() }
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for Fulfiller<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fulfiller").field("status", &self.seal.state.status()).finish()
    }
}

impl<T: Clone + Send + 'static> fmt::Debug for Rejecter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejecter").field("status", &self.seal.state.status()).finish()
    }
}
