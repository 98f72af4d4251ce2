use std::fmt::{Debug, Formatter};

use super::Subscription;

pub(crate) type Cleanup<E> = Box<dyn FnOnce() -> Result<(), E>>;

/// Anything that can be cancelled, the "unsubscribe capability".
pub trait Unsubscribe<E> {
  fn unsubscribe(&self) -> Result<(), E>;

  fn is_closed(&self) -> bool;
}

/// What a producer leaves behind: nothing, a cleanup action, or a handle to
/// cancel.
///
/// The cleanup runs exactly once, when the subscription closes.
///
/// ```rust
/// use es_observable::prelude::*;
///
/// let ticks = Observable::<u32, Error>::new(|sink| {
///   sink.next(1)?;
///   Ok(Teardown::new(|| println!("released")))
/// });
/// ```
pub struct Teardown<E>(Option<Cleanup<E>>);

impl<E> Teardown<E> {
  pub fn none() -> Self { Teardown(None) }

  pub fn new(f: impl FnOnce() + 'static) -> Self {
    Self::try_new(move || {
      f();
      Ok(())
    })
  }

  /// A cleanup that may fail. The failure is reported to whoever caused the
  /// subscription to close.
  pub fn try_new(f: impl FnOnce() -> Result<(), E> + 'static) -> Self { Teardown(Some(Box::new(f))) }

  /// Cancels `target` on cleanup.
  pub fn unsubscribe(target: impl Unsubscribe<E> + 'static) -> Self {
    Self::try_new(move || target.unsubscribe())
  }

  pub fn is_none(&self) -> bool { self.0.is_none() }

  pub(crate) fn into_cleanup(self) -> Option<Cleanup<E>> { self.0 }
}

impl<E> Default for Teardown<E> {
  fn default() -> Self { Self::none() }
}

impl<E> Debug for Teardown<E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("Teardown").field(&self.0.is_some()).finish()
  }
}

impl<E> From<()> for Teardown<E> {
  fn from(_: ()) -> Self { Self::none() }
}

impl<T: 'static, E: 'static> From<Subscription<T, E>> for Teardown<E> {
  fn from(subscription: Subscription<T, E>) -> Self { Self::unsubscribe(subscription) }
}
