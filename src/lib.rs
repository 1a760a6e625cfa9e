//! Promises whose handlers run on queues.
//!
//! A [`Promise`] is a handle to one future result. Attach handlers with
//! [`then`](Promise::then), [`catch`](Promise::catch) and
//! [`finally`](Promise::finally); each returns a new promise for the
//! transformed result, so chains never need threads or callbacks managed by
//! hand. Bodies run on a [`Queue`] (by default [`Queue::main`]), never inline
//! in the call that registers or resolves them.
//!
//! ```
//! use dispatch_promise::{run_async, Error, Manifold};
//!
//! let greeting = run_async(|| Ok(String::from("hi")))
//!     .then(|s| Manifold::two(s.len(), s))
//!     .then(|m| match m.into_parts() {
//!         (len, Some(s), _) => Ok(format!("{} ({})", s, len)),
//!         _ => Err(Error::msg("missing text")),
//!     });
//! assert_eq!(greeting.wait().unwrap(), "hi (2)");
//! ```
//!
//! A rejection that is dropped without anyone catching it goes to the hook set
//! with [`set_unhandled_rejection_handler`].

mod chain;
pub mod error;
pub mod manifold;
pub mod promise;
pub mod queue;
pub mod reporter;
pub mod resolver;
mod state;

pub use chain::{IntoResolution, Resolution};
pub use error::{Error, Panic, Stage};
pub use manifold::Manifold;
pub use promise::{run_async, run_async_on, Promise};
pub use queue::{Dispatch, Queue};
pub use reporter::{reset_unhandled_rejection_handler, set_unhandled_rejection_handler};
pub use resolver::{Fulfiller, Rejecter};
pub use state::Status;
