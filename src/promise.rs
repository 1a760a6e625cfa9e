//! The promise handle and its chaining operations.
use crate::{
    chain::{self, IntoResolution, Resolution},
    error::{Error, Stage},
    queue::Queue,
    resolver::{self, Fulfiller, Rejecter},
    state::{Kind, State, Status},
};
use std::{
    fmt,
    future::Future,
    panic::{self, AssertUnwindSafe},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll, Wake, Waker},
    thread::{self, Thread},
};

/// A handle to the eventual result of an asynchronous operation.
///
/// Handles are cheap to clone and all clones see the same result. Chaining
/// with [`then`](Self::then), [`catch`](Self::catch) or
/// [`finally`](Self::finally) returns a new promise right away; the body runs
/// later on a [`Queue`], [`Queue::main`] unless an `_on` variant names one.
///
/// # Examples
///
/// ```
/// use dispatch_promise::{Error, Promise};
///
/// let len = Promise::fulfilled(String::from("🍓🍓"))
///     .then(|s| Ok(s.chars().count()))
///     .then(|n| if n > 1 { Err(Error::msg("too many")) } else { Ok(n) })
///     .catch(|_err| Ok(0));
/// assert_eq!(len.wait().unwrap(), 0);
/// ```
pub struct Promise<T> {
    state: Arc<State<T>>,
}

impl<T> Promise<T> {
    pub(crate) fn from_state(state: Arc<State<T>>) -> Self {
        state.retain_handle();
        Promise { state }
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Promise::from_state(self.state.clone())
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        self.state.release_handle();
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise").field("status", &self.state.status()).finish()
    }
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// Runs `initializer` right away on the calling thread with the callbacks
    /// that settle the returned promise. A panic inside `initializer` rejects
    /// the promise instead of unwinding into the caller.
    ///
    /// ```
    /// use dispatch_promise::Promise;
    /// use std::thread;
    ///
    /// let promise = Promise::new(|fulfill, _reject| {
    ///     thread::spawn(move || fulfill.fulfill(42));
    /// });
    /// assert_eq!(promise.wait().unwrap(), 42);
    /// ```
    pub fn new<F>(initializer: F) -> Self
    where
        F: FnOnce(Fulfiller<T>, Rejecter<T>),
    {
        let promise = Promise::from_state(State::pending());
        let (fulfill, reject) = resolver::pair(promise.state.clone());
        // Held across the call so an unwinding initializer cannot trip the
        // dropped-producer rejection before the fault is recorded.
        let guard = fulfill.clone();
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || initializer(fulfill, reject))) {
            promise.state.settle(Err(Error::fault(Stage::Initializer, payload)));
        }
        drop(guard);
        promise
    }

    /// A pending promise together with the callbacks that settle it.
    pub fn pending() -> (Self, Fulfiller<T>, Rejecter<T>) {
        let promise = Promise::from_state(State::pending());
        let (fulfill, reject) = resolver::pair(promise.state.clone());
        (promise, fulfill, reject)
    }

    /// An already settled promise: fulfilled with `Ok`, rejected with `Err`.
    pub fn resolved(outcome: Result<T, Error>) -> Self {
        Promise::from_state(State::settled(outcome))
    }

    pub fn fulfilled(value: T) -> Self {
        Self::resolved(Ok(value))
    }

    pub fn rejected(err: impl Into<Error>) -> Self {
        Self::resolved(Err(err.into()))
    }

    pub(crate) fn state(&self) -> &Arc<State<T>> {
        &self.state
    }

    /// A snapshot; another thread may settle the promise right after.
    pub fn status(&self) -> Status {
        self.state.status()
    }

    pub fn is_pending(&self) -> bool {
        self.status() == Status::Pending
    }

    pub fn is_resolved(&self) -> bool {
        self.status() != Status::Pending
    }

    pub fn is_fulfilled(&self) -> bool {
        self.status() == Status::Fulfilled
    }

    pub fn is_rejected(&self) -> bool {
        self.status() == Status::Rejected
    }

    /// The fulfillment value, or `None` while pending or when rejected.
    pub fn value(&self) -> Option<T> {
        self.state.value()
    }

    pub fn then<F, R>(&self, body: F) -> Promise<R::Value>
    where
        F: FnOnce(T) -> R + Send + 'static,
        R: IntoResolution,
    {
        self.then_on(&Queue::main(), body)
    }

    pub fn then_in_background<F, R>(&self, body: F) -> Promise<R::Value>
    where
        F: FnOnce(T) -> R + Send + 'static,
        R: IntoResolution,
    {
        self.then_on(&Queue::background(), body)
    }

    /// Runs `body` on `queue` with the value once this promise fulfills. A
    /// rejection skips `body` and passes to the returned promise unchanged.
    pub fn then_on<F, R>(&self, queue: &Queue, body: F) -> Promise<R::Value>
    where
        F: FnOnce(T) -> R + Send + 'static,
        R: IntoResolution,
    {
        let child = State::pending();
        let target = child.clone();
        let hop = queue.clone();
        self.state.subscribe(Kind::Fulfill, queue.clone(), move |outcome| match outcome {
            Ok(value) => chain::adopt(target, &hop, chain::invoke(Stage::Then, move || body(value))),
            Err(err) => {
                target.settle(Err(err));
            }
        });
        Promise::from_state(child)
    }

    pub fn catch<F, R>(&self, body: F) -> Promise<T>
    where
        F: FnOnce(Error) -> R + Send + 'static,
        R: IntoResolution<Value = T>,
    {
        self.catch_on(&Queue::main(), body)
    }

    /// Runs `body` on `queue` with the error once this promise rejects. A
    /// fulfillment skips `body` and passes to the returned promise unchanged.
    pub fn catch_on<F, R>(&self, queue: &Queue, body: F) -> Promise<T>
    where
        F: FnOnce(Error) -> R + Send + 'static,
        R: IntoResolution<Value = T>,
    {
        let child = State::pending();
        let target = child.clone();
        let hop = queue.clone();
        self.state.subscribe(Kind::Reject, queue.clone(), move |outcome| match outcome {
            Ok(value) => {
                target.settle(Ok(value));
            }
            Err(err) => chain::adopt(target, &hop, chain::invoke(Stage::Catch, move || body(err))),
        });
        Promise::from_state(child)
    }

    pub fn finally<F>(&self, body: F) -> Promise<T>
    where
        F: FnOnce() + Send + 'static,
    {
        self.finally_on(&Queue::main(), body)
    }

    /// Runs `body` on `queue` once this promise settles either way. The
    /// returned promise settles exactly as this one did, unless `body` panics,
    /// which rejects it with a fault.
    pub fn finally_on<F>(&self, queue: &Queue, body: F) -> Promise<T>
    where
        F: FnOnce() + Send + 'static,
    {
        let child = State::pending();
        let target = child.clone();
        self.state.subscribe(Kind::Finally, queue.clone(), move |outcome| {
            let outcome = match chain::invoke(Stage::Finally, body) {
                Resolution::Error(fault) => Err(fault),
                _ => outcome,
            };
            target.settle(outcome);
        });
        Promise::from_state(child)
    }

    /// Blocks the calling thread until the promise settles.
    ///
    /// Never call this from the queue the promise depends on: with a serial
    /// queue the handler that would settle it can then never run.
    pub fn wait(&self) -> Result<T, Error> {
        let waker = Waker::from(Arc::new(Unparker(thread::current())));
        loop {
            if let Some(outcome) = self.state.poll_outcome(&waker) {
                return outcome;
            }
            thread::park();
        }
    }
}

struct Unparker(Thread);

impl Wake for Unparker {
    fn wake(self: Arc<Self>) {
        self.0.unpark();
    }
}

impl<T: Clone + Send + 'static> Future for Promise<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.state.poll_outcome(cx.waker()) {
            Some(outcome) => Poll::Ready(outcome),
            None => Poll::Pending,
        }
    }
}

/// Runs `work` on [`Queue::background`] and returns a promise of its result.
///
/// ```
/// use dispatch_promise::run_async;
///
/// let sum = run_async(|| Ok((1..=10).sum::<u32>()));
/// assert_eq!(sum.wait().unwrap(), 55);
/// ```
pub fn run_async<F, R>(work: F) -> Promise<R::Value>
where
    F: FnOnce() -> R + Send + 'static,
    R: IntoResolution,
{
    run_async_on(&Queue::background(), work)
}

/// Runs `work` on `queue`. An `Err` return or a panic rejects the returned
/// promise; anything else settles it the way a `then` body's return would.
pub fn run_async_on<F, R>(queue: &Queue, work: F) -> Promise<R::Value>
where
    F: FnOnce() -> R + Send + 'static,
    R: IntoResolution,
{
    let state = State::pending();
    let target = state.clone();
    let hop = queue.clone();
    queue.submit(move || chain::adopt(target, &hop, chain::invoke(Stage::Task, work)));
    Promise::from_state(state)
}
