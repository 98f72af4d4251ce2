//! Error type of the crate.
//!
//! Streams carry their own error type `E`. Failures raised by the crate itself
//! are described by [`Error`] and reach user code through `E: From<Error>`, so a
//! producer can propagate anything a sink returns with `?`.

use thiserror::Error;

use crate::observable::CapabilityKey;

/// Failures raised by subscriptions, the `from` adapter and schedulers.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
  /// A delivery was attempted while a `next` handler of the same subscription
  /// is still executing.
  #[error("subscription observer is already running")]
  AlreadyRunning,

  /// An event reached a subscription that has not finished its `start` hook.
  ///
  /// Sinks are only handed to producers after `start`, so this guards the
  /// crate's own callers and user code does not see it.
  #[error("subscription is not initialized")]
  NotInitialized,

  /// A well-known capability is present on a source but cannot be invoked.
  #[error("{0} capability is not callable")]
  NotCallable(CapabilityKey),

  /// The observable capability returned something without `subscribe`.
  #[error("observable capability did not return a subscribable value")]
  NotSubscribable,

  /// The source exposes neither the observable nor the iteration capability.
  #[error("source is neither observable nor iterable")]
  NotConvertible,

  /// The scheduler refused the task.
  #[error("scheduler is shut down")]
  SchedulerShutdown,
}

impl From<futures::task::SpawnError> for Error {
  fn from(_: futures::task::SpawnError) -> Self { Error::SchedulerShutdown }
}
