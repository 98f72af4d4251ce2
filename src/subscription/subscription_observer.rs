use std::fmt::{Debug, Formatter};

use super::{run_cleanup, Cleanup, State, Subscription};
use crate::{observer::Observer, Error};

/// The sink a producer pushes events into.
///
/// Every method delegates to the owning [`Subscription`] and enforces its
/// rules before the user's observer sees anything:
///
/// - nothing is delivered once the subscription is closed;
/// - `next` is never nested: calling into the sink from inside a `next`
///   handler fails with [`Error::AlreadyRunning`];
/// - `error` and `complete` close the subscription *before* the user's handler
///   runs, and run the teardown after it.
pub struct SubscriptionObserver<T, E>(pub(crate) Subscription<T, E>);

impl<T, E> Clone for SubscriptionObserver<T, E> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T, E> Debug for SubscriptionObserver<T, E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SubscriptionObserver").field("closed", &self.closed()).finish()
  }
}

impl<T, E> SubscriptionObserver<T, E> {
  pub fn closed(&self) -> bool { self.0.closed() }
}

impl<T, E: From<Error>> SubscriptionObserver<T, E> {
  /// Delivers a value. A failure of the `next` handler is returned as is and
  /// does not close the subscription.
  pub fn next(&self, value: T) -> Result<(), E> {
    let mut handler = {
      let mut inner = self.0 .0.borrow_mut();
      match inner.state {
        State::Closed => return Ok(()),
        State::Running => return Err(Error::AlreadyRunning.into()),
        // Only reachable from inside the crate, sinks are handed out once
        // `start` is done.
        State::Initializing => return Err(Error::NotInitialized.into()),
        State::Ready => {}
      }
      let Some(handler) = inner.observer.as_mut().and_then(|o| o.next.take()) else {
        return Ok(());
      };
      inner.state = State::Running;
      handler
    };

    let result = handler(value);

    // `handler` outlives this borrow, a closure dropped here may still reach
    // the subscription.
    let mut inner = self.0 .0.borrow_mut();
    if inner.state == State::Running {
      inner.state = State::Ready;
      if let Some(observer) = inner.observer.as_mut() {
        observer.next = Some(handler);
      }
    }
    result
  }

  /// Closes the subscription and hands `err` to the `error` handler. Without a
  /// handler, `err` itself is returned.
  pub fn error(&self, err: E) -> Result<(), E> {
    let Some((observer, cleanup)) = self.begin_terminal()? else {
      return Ok(());
    };
    tracing::trace!("subscription errored");
    deliver_error(observer, cleanup, err)
  }

  /// Closes the subscription and notifies the `complete` handler, if any.
  pub fn complete(&self) -> Result<(), E> {
    let Some((observer, cleanup)) = self.begin_terminal()? else {
      return Ok(());
    };
    tracing::trace!("subscription completed");
    let result = match observer.and_then(|o| o.complete) {
      Some(complete) => complete(),
      None => Ok(()),
    };
    finish(result, cleanup)
  }

  /// Error path used for failures of the `start` hook and of the producer,
  /// which happen outside of the `Ready` window.
  pub(crate) fn fail(&self, err: E) -> Result<(), E> {
    if self.closed() {
      return Ok(());
    }
    tracing::trace!("subscription failed during setup");
    let (observer, cleanup) = self.0.close();
    deliver_error(observer, cleanup, err)
  }

  /// `Ok(None)` when already closed; closes and detaches otherwise.
  #[allow(clippy::type_complexity)]
  fn begin_terminal(&self) -> Result<Option<(Option<Observer<T, E>>, Option<Cleanup<E>>)>, E> {
    match self.0.state() {
      State::Closed => Ok(None),
      State::Running => Err(Error::AlreadyRunning.into()),
      // See `next`.
      State::Initializing => Err(Error::NotInitialized.into()),
      State::Ready => Ok(Some(self.0.close())),
    }
  }
}

fn deliver_error<T, E>(
  observer: Option<Observer<T, E>>, cleanup: Option<Cleanup<E>>, err: E,
) -> Result<(), E> {
  let result = match observer.and_then(|o| o.error) {
    Some(error) => error(err),
    None => Err(err),
  };
  finish(result, cleanup)
}

/// Runs the teardown after a terminal handler. When both fail, the handler's
/// failure is the one reported.
fn finish<E>(result: Result<(), E>, cleanup: Option<Cleanup<E>>) -> Result<(), E> {
  let cleaned = run_cleanup(cleanup);
  result.and(cleaned)
}
