//! The consumer side of a subscription.
//!
//! An [`Observer`] is a record of optional handlers. A missing handler is
//! really absent rather than a no-op closure: a missing `error` handler makes
//! the error value come back to whoever reported it, and a missing `next`
//! handler never opens a delivery window.
//!
//! Every handler comes in two flavours. `on_xxx` takes a plain closure that
//! cannot fail, `try_on_xxx` takes a closure returning `Result`, where an `Err`
//! is a thrown value that propagates to the caller of the triggering operation.

use crate::subscription::{Subscription, SubscriptionObserver};

pub(crate) type StartFn<T, E> = Box<dyn FnOnce(&Subscription<T, E>) -> Result<(), E>>;
pub(crate) type NextFn<T, E> = Box<dyn FnMut(T) -> Result<(), E>>;
pub(crate) type ErrorFn<E> = Box<dyn FnOnce(E) -> Result<(), E>>;
pub(crate) type CompleteFn<E> = Box<dyn FnOnce() -> Result<(), E>>;

/// Normalized observer handed to [`Observable::subscribe`].
///
/// ```rust
/// use es_observable::prelude::*;
///
/// let observer: Observer<i32, Error> = Observer::new()
///   .on_next(|v: i32| println!("{v}"))
///   .on_complete(|| println!("done"));
/// ```
///
/// [`Observable::subscribe`]: crate::observable::Observable::subscribe
pub struct Observer<T, E> {
  pub(crate) start: Option<StartFn<T, E>>,
  pub(crate) next: Option<NextFn<T, E>>,
  pub(crate) error: Option<ErrorFn<E>>,
  pub(crate) complete: Option<CompleteFn<E>>,
}

impl<T, E> Observer<T, E> {
  /// An observer without any handler.
  pub fn new() -> Self { Self { start: None, next: None, error: None, complete: None } }

  /// Runs before the producer, receiving the subscription being built. The
  /// hook may cancel the subscription, in which case the producer never runs.
  pub fn on_start(self, f: impl FnOnce(&Subscription<T, E>) + 'static) -> Self {
    self.try_on_start(move |subscription| {
      f(subscription);
      Ok(())
    })
  }

  pub fn try_on_start(
    mut self, f: impl FnOnce(&Subscription<T, E>) -> Result<(), E> + 'static,
  ) -> Self {
    self.start = Some(Box::new(f));
    self
  }

  pub fn on_next(self, mut f: impl FnMut(T) + 'static) -> Self {
    self.try_on_next(move |v| {
      f(v);
      Ok(())
    })
  }

  pub fn try_on_next(mut self, f: impl FnMut(T) -> Result<(), E> + 'static) -> Self {
    self.next = Some(Box::new(f));
    self
  }

  /// Consumes the error. Once an `error` handler is present, error values no
  /// longer come back to the producer.
  pub fn on_error(self, f: impl FnOnce(E) + 'static) -> Self {
    self.try_on_error(move |err| {
      f(err);
      Ok(())
    })
  }

  pub fn try_on_error(mut self, f: impl FnOnce(E) -> Result<(), E> + 'static) -> Self {
    self.error = Some(Box::new(f));
    self
  }

  pub fn on_complete(self, f: impl FnOnce() + 'static) -> Self {
    self.try_on_complete(move || {
      f();
      Ok(())
    })
  }

  pub fn try_on_complete(mut self, f: impl FnOnce() -> Result<(), E> + 'static) -> Self {
    self.complete = Some(Box::new(f));
    self
  }

  pub fn has_next(&self) -> bool { self.next.is_some() }

  pub fn has_error(&self) -> bool { self.error.is_some() }

  pub fn has_complete(&self) -> bool { self.complete.is_some() }
}

impl<T: 'static, E: From<crate::Error> + 'static> Observer<T, E> {
  /// Relays every event into `sink`. Failures of the sink come back as the
  /// handler's own failure.
  pub fn forward(sink: SubscriptionObserver<T, E>) -> Self {
    let on_error = sink.clone();
    let on_complete = sink.clone();
    Observer::new()
      .try_on_next(move |v| sink.next(v))
      .try_on_error(move |err| on_error.error(err))
      .try_on_complete(move || on_complete.complete())
  }
}

impl<T, E> Default for Observer<T, E> {
  fn default() -> Self { Self::new() }
}

impl<T, E> std::fmt::Debug for Observer<T, E> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Observer")
      .field("start", &self.start.is_some())
      .field("next", &self.next.is_some())
      .field("error", &self.error.is_some())
      .field("complete", &self.complete.is_some())
      .finish()
  }
}

// Positional forms: `subscribe(())`, `subscribe((next,))`,
// `subscribe((next, error))` and `subscribe((next, error, complete))`.

impl<T, E> From<()> for Observer<T, E> {
  fn from(_: ()) -> Self { Self::new() }
}

impl<T, E, N> From<(N,)> for Observer<T, E>
where
  N: FnMut(T) + 'static,
{
  fn from((next,): (N,)) -> Self { Self::new().on_next(next) }
}

impl<T, E, N, Er> From<(N, Er)> for Observer<T, E>
where
  N: FnMut(T) + 'static,
  Er: FnOnce(E) + 'static,
{
  fn from((next, error): (N, Er)) -> Self { Self::new().on_next(next).on_error(error) }
}

impl<T, E, N, Er, C> From<(N, Er, C)> for Observer<T, E>
where
  N: FnMut(T) + 'static,
  Er: FnOnce(E) + 'static,
  C: FnOnce() + 'static,
{
  fn from((next, error, complete): (N, Er, C)) -> Self {
    Self::new().on_next(next).on_error(error).on_complete(complete)
  }
}
