//! Execution contexts.
//!
//! A [`Queue`] is an opaque place to run work: "run this job on queue Q".
//! Anything implementing [`Dispatch`] can back a queue, as long as it runs jobs
//! asynchronously (never inline inside `submit`) and preserves submission
//! order for jobs on the same queue.
//!
//! The crate bundles a worker-thread executor built with [`Builder`]. A single
//! worker gives a serial queue; more workers give a concurrent queue whose jobs
//! are still dequeued in FIFO order.
use crate::error::Panic;
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{debug, error};
use std::{
    fmt, io,
    num::NonZeroUsize,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, OnceLock},
    thread,
};

/// A unit of work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// An executor a [`Queue`] hands its jobs to.
///
/// `submit` is called while the submitting promise's state is locked, which
/// keeps handlers in registration order. It must only enqueue: running the
/// job inline, blocking, or taking a lock that is also held around calls to
/// `then`, `catch`, `finally` or a resolver can deadlock.
pub trait Dispatch: Send + Sync {
    /// Schedules `job` to run later. Must not run it on the calling thread
    /// before returning.
    fn submit(&self, job: Job);
}

static MAIN: OnceLock<Queue> = OnceLock::new();
static BACKGROUND: OnceLock<Queue> = OnceLock::new();

#[derive(Clone)]
pub struct Queue {
    label: Arc<str>,
    dispatch: Arc<dyn Dispatch>,
}

impl Queue {
    pub fn new<D>(label: &str, dispatch: D) -> Self
    where
        D: Dispatch + 'static,
    {
        Queue {
            label: label.into(),
            dispatch: Arc::new(dispatch),
        }
    }

    /// The default context for `then`, `catch` and `finally`.
    ///
    /// Unless [`Queue::install_main`] ran first, this is a serial queue backed
    /// by one worker thread started on first use.
    pub fn main() -> Queue {
        MAIN.get_or_init(|| start_global(Builder::new("promise.main")))
            .clone()
    }

    /// The default context for `run_async` and `then_in_background`.
    pub fn background() -> Queue {
        BACKGROUND
            .get_or_init(|| {
                let workers = thread::available_parallelism().map_or(2, NonZeroUsize::get);
                start_global(Builder::new("promise.background").workers(workers))
            })
            .clone()
    }

    /// Substitutes the application's own main queue, typically one that runs
    /// jobs on a UI thread. Gives the queue back if a main queue is already in
    /// place.
    pub fn install_main(queue: Queue) -> Result<(), Queue> {
        MAIN.set(queue)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.dispatch.submit(Box::new(job));
    }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue").field("label", &self.label).finish()
    }
}

fn start_global(builder: Builder) -> Queue {
    let label = builder.label.clone();
    match builder.spawn() {
        Ok(queue) => queue,
        // Same contract as `std::thread::spawn`.
        Err(err) => panic!("failed to start queue `{}`: {}", label, err),
    }
}

/// Worker queue configuration.
///
/// # Examples
///
/// ```
/// use dispatch_promise::{queue::Builder, Promise};
///
/// let io = Builder::new("io").workers(4).spawn().unwrap();
/// let len = Promise::fulfilled("hello").then_on(&io, |s| Ok(s.len()));
/// assert_eq!(len.wait().unwrap(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    label: String,
    workers: usize,
    stack_size: Option<usize>,
}

impl Builder {
    pub fn new(label: &str) -> Builder {
        Builder {
            label: label.to_owned(),
            workers: 1,
            stack_size: None,
        }
    }

    /// Number of worker threads, at least one.
    #[inline]
    pub fn workers(mut self, workers: usize) -> Builder {
        self.workers = workers.max(1);
        self
    }

    #[inline]
    pub fn stack_size(mut self, stack_size: usize) -> Builder {
        self.stack_size = Some(stack_size);
        self
    }

    /// Starts the worker threads. They exit once every clone of the returned
    /// queue is dropped and the remaining jobs are drained.
    pub fn spawn(self) -> io::Result<Queue> {
        let (sender, receiver) = unbounded::<Job>();
        for index in 0..self.workers {
            let mut thread = thread::Builder::new().name(format!("{}-{}", self.label, index));
            if let Some(size) = self.stack_size {
                thread = thread.stack_size(size);
            }
            let receiver = receiver.clone();
            let label = self.label.clone();
            thread.spawn(move || run_worker(&label, receiver))?;
        }
        debug!("started queue `{}` with {} worker(s)", self.label, self.workers);
        Ok(Queue::new(&self.label, Workers { sender }))
    }
}

struct Workers {
    sender: Sender<Job>,
}

impl Dispatch for Workers {
    fn submit(&self, job: Job) {
        if self.sender.send(job).is_err() {
            error!("queue workers have exited; job dropped");
        }
    }
}

fn run_worker(label: &str, receiver: Receiver<Job>) {
    for job in receiver.iter() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            error!("job on queue `{}` panicked: {}", label, Panic::from_payload(payload));
        }
    }
    debug!("worker of queue `{}` exiting", label);
}
