//! What a handler body's return value does to the promise it feeds.
use crate::{
    error::{Error, Stage},
    manifold::Manifold,
    promise::Promise,
    queue::Queue,
    state::{Kind, State},
};
use log::debug;
use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

/// How a child promise is to be resolved.
#[derive(Debug)]
pub enum Resolution<T> {
    Value(T),
    Error(Error),
    /// Adopt the eventual outcome of another promise.
    Promise(Promise<T>),
}

/// Return types accepted from `then`, `catch` and `run_async` bodies.
///
/// * `()` fulfills with `()`.
/// * `Result<T, Error>` fulfills with the value or rejects with the error.
/// * `Promise<T>` is flattened: the child settles when it does, the same way.
/// * `Manifold<A, B, C>` fulfills with all of its values.
pub trait IntoResolution {
    type Value: Clone + Send + 'static;

    fn into_resolution(self) -> Resolution<Self::Value>;
}

impl<T: Clone + Send + 'static> IntoResolution for Resolution<T> {
    type Value = T;

    fn into_resolution(self) -> Resolution<T> {
        self
    }
}

impl IntoResolution for () {
    type Value = ();

    fn into_resolution(self) -> Resolution<()> {
        Resolution::Value(())
    }
}

impl<T: Clone + Send + 'static> IntoResolution for Result<T, Error> {
    type Value = T;

    fn into_resolution(self) -> Resolution<T> {
        match self {
            Ok(value) => Resolution::Value(value),
            Err(err) => Resolution::Error(err),
        }
    }
}

impl<T: Clone + Send + 'static> IntoResolution for Promise<T> {
    type Value = T;

    fn into_resolution(self) -> Resolution<T> {
        Resolution::Promise(self)
    }
}

impl<A, B, C> IntoResolution for Manifold<A, B, C>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
{
    type Value = Self;

    fn into_resolution(self) -> Resolution<Self> {
        Resolution::Value(self)
    }
}

/// Runs caller code, turning a panic into a fault rejection.
pub(crate) fn invoke<F, R>(stage: Stage, body: F) -> Resolution<R::Value>
where
    F: FnOnce() -> R,
    R: IntoResolution,
{
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(ret) => ret.into_resolution(),
        Err(payload) => {
            let err = Error::fault(stage, payload);
            debug!("{}", err);
            Resolution::Error(err)
        }
    }
}

/// Settles `target` from `resolution`. A returned promise is followed on
/// `queue`; since its own chain was flattened the same way, nesting of any
/// depth collapses into `target`.
pub(crate) fn adopt<T>(target: Arc<State<T>>, queue: &Queue, resolution: Resolution<T>)
where
    T: Clone + Send + 'static,
{
    match resolution {
        Resolution::Value(value) => {
            target.settle(Ok(value));
        }
        Resolution::Error(err) => {
            target.settle(Err(err));
        }
        Resolution::Promise(inner) => inner.state().subscribe(Kind::Forward, queue.clone(), move |outcome| {
            target.settle(outcome);
        }),
    }
}
