//! Unhandled rejections.
//!
//! A rejected promise that is released without any handler, waiter or
//! awaiting future ever taking on its error is passed to a process-wide hook.
//! The default hook logs it with `log::error!`.
//!
//! The hook runs on whichever thread released the last reference to the
//! promise. It must do its own synchronization.
use crate::error::Error;
use log::error;
use parking_lot::{const_rwlock, RwLock};
use std::sync::Arc;

type Hook = Arc<dyn Fn(&Error) + Send + Sync + 'static>;

static HOOK: RwLock<Option<Hook>> = const_rwlock(None);

/// Replaces the unhandled-rejection hook.
///
/// # Examples
///
/// ```
/// use dispatch_promise::{set_unhandled_rejection_handler, reset_unhandled_rejection_handler};
///
/// set_unhandled_rejection_handler(|err| eprintln!("nobody caught: {}", err));
/// reset_unhandled_rejection_handler();
/// ```
pub fn set_unhandled_rejection_handler<F>(hook: F)
where
    F: Fn(&Error) + Send + Sync + 'static,
{
    *HOOK.write() = Some(Arc::new(hook));
}

/// Restores the logging hook.
pub fn reset_unhandled_rejection_handler() {
    *HOOK.write() = None;
}

pub(crate) fn report(err: &Error) {
    // Cloned out so a hook may replace itself without deadlocking.
    let hook = HOOK.read().clone();
    match hook {
        Some(hook) => hook(err),
        None => error!("unhandled promise rejection: {}", err),
    }
}
