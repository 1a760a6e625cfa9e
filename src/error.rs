//! Rejection values.
//!
//! Every rejected promise carries an [`Error`]. Producers reject with their own
//! error wrapped by [`Error::new`] or [`Error::msg`]; panics caught while running
//! caller code become [`Error::Fault`] with the panic as its source.
use std::{any::Any, error::Error as StdError, fmt, sync::Arc};
use thiserror::Error;

/// The kind of caller code that was running when a panic was caught.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Then,
    Catch,
    Finally,
    Initializer,
    Task,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Then => "then",
            Stage::Catch => "catch",
            Stage::Finally => "finally",
            Stage::Initializer => "initializer",
            Stage::Task => "task",
        };
        f.write_str(name)
    }
}

/// A caught panic, reduced to its message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Panic {
    message: String,
}

impl Panic {
    pub(crate) fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_owned()
        };
        Panic { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The producer rejected the promise.
    #[error(transparent)]
    Rejected(Arc<dyn StdError + Send + Sync + 'static>),
    /// Caller code panicked; the child promise is rejected instead of stalling.
    #[error("{stage} handler panicked: {cause}")]
    Fault {
        stage: Stage,
        #[source]
        cause: Panic,
    },
    #[error("promise producer dropped without resolving")]
    ProducerDropped,
}

#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);

impl Error {
    pub fn new<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Error::Rejected(Arc::new(err))
    }

    pub fn msg(message: impl fmt::Display) -> Self {
        Error::new(Message(message.to_string()))
    }

    pub(crate) fn fault(stage: Stage, payload: Box<dyn Any + Send>) -> Self {
        Error::Fault {
            stage,
            cause: Panic::from_payload(payload),
        }
    }

    /// True when this error stands for a caught panic rather than a producer error.
    pub fn is_fault(&self) -> bool {
        matches!(self, Error::Fault { .. })
    }

    /// The producer's concrete error, if this is a [`Error::Rejected`] of type `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            Error::Rejected(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::msg(message)
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::new(Message(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_msg_displays_message() {
        let err = Error::msg("💥");
        assert_eq!(err.to_string(), "💥");
        assert!(!err.is_fault());
    }

    #[test]
    fn test_downcast_producer_error() {
        let err = Error::new(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let io_err = err.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
        assert!(err.downcast_ref::<Panic>().is_none());
    }

    #[test]
    fn test_fault_keeps_panic_as_source() {
        let err = Error::fault(Stage::Then, Box::new("boom"));
        assert!(err.is_fault());
        assert_eq!(err.to_string(), "then handler panicked: boom");
        assert_eq!(err.source().unwrap().to_string(), "boom");
    }

    #[test]
    fn test_panic_payload_string() {
        let panic = Panic::from_payload(Box::new(String::from("owned")));
        assert_eq!(panic.message(), "owned");
        let panic = Panic::from_payload(Box::new(42_u8));
        assert_eq!(panic.message(), "Box<dyn Any>");
    }
}
