//! The lazy producer wrapper.
//!
//! An [`Observable`] holds one producer function and nothing else. Every call
//! to [`Observable::subscribe`] runs the producer again with a fresh
//! [`SubscriptionObserver`], so an observable can be subscribed any number of
//! times.
//!
//! ```rust
//! use es_observable::prelude::*;
//!
//! let numbers = Observable::<i32, Error>::new(|sink| {
//!   sink.next(1)?;
//!   sink.next(2)?;
//!   sink.complete()?;
//!   Ok(Teardown::none())
//! });
//!
//! let subscription = numbers
//!   .subscribe((|v: i32| println!("{v}"), |_: Error| {}, || println!("done")))
//!   .unwrap();
//! assert!(subscription.closed());
//! ```

use std::{
  fmt::{Debug, Formatter},
  rc::Rc,
};

use crate::{
  observer::Observer,
  scheduler::Scheduler,
  subscription::{Subscription, SubscriptionObserver, Teardown},
  Error,
};

mod defer;
mod from;
mod from_iter;

pub use from::{Capability, CapabilityKey, Interop, Subscribable};

/// The producer signature: given a sink, push events and leave a teardown.
/// An `Err` is delivered to the observer as an error event.
pub type Producer<T, E> = dyn Fn(SubscriptionObserver<T, E>) -> Result<Teardown<E>, E>;

/// Identifies the factory an observable was built by.
///
/// Species are compared by address, so every species must live in a `static`.
/// [`Species::from`] returns its argument unchanged when the argument already
/// belongs to that species.
///
/// ```rust
/// use es_observable::prelude::*;
///
/// static TICKS: Species = Species::new("Ticks");
///
/// let ticks = Observable::<u8, Error>::with_species(&TICKS, |_| Ok(Teardown::none()));
/// assert!(std::ptr::eq(ticks.species(), &TICKS));
/// ```
pub struct Species {
  name: &'static str,
}

impl Species {
  pub const fn new(name: &'static str) -> Self { Species { name } }

  pub fn name(&self) -> &'static str { self.name }
}

impl Debug for Species {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("Species").field(&self.name).finish()
  }
}

/// The species of observables built by [`Observable::new`].
pub static OBSERVABLE: Species = Species::new("Observable");

pub struct Observable<T, E> {
  producer: Rc<Producer<T, E>>,
  species: &'static Species,
}

impl<T, E> Clone for Observable<T, E> {
  fn clone(&self) -> Self { Self { producer: self.producer.clone(), species: self.species } }
}

impl<T, E> Debug for Observable<T, E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Observable").field("species", &self.species.name).finish()
  }
}

impl<T, E> Observable<T, E> {
  pub fn species(&self) -> &'static Species { self.species }

  /// `true` when both handles share one producer.
  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.producer, &other.producer) }
}

impl<T: 'static, E: From<Error> + 'static> Observable<T, E> {
  pub fn new<F>(producer: F) -> Self
  where
    F: Fn(SubscriptionObserver<T, E>) -> Result<Teardown<E>, E> + 'static,
  {
    Self::with_species(&OBSERVABLE, producer)
  }

  /// Builds an observable tagged with another species, the equivalent of a
  /// subclass constructor.
  pub fn with_species<F>(species: &'static Species, producer: F) -> Self
  where
    F: Fn(SubscriptionObserver<T, E>) -> Result<Teardown<E>, E> + 'static,
  {
    Observable { producer: Rc::new(producer), species }
  }

  /// Starts a new observation.
  ///
  /// Accepts a full [`Observer`], `()` for no observer at all, or a positional
  /// `(next,)`, `(next, error)` or `(next, error, complete)` tuple of closures.
  /// The producer runs before this returns; when it fails and the observer has
  /// no `error` handler, the failure is returned here.
  pub fn subscribe(&self, observer: impl Into<Observer<T, E>>) -> Result<Subscription<T, E>, E> {
    tracing::trace!(species = self.species.name, "subscribe");
    Subscription::new(observer.into(), &*self.producer)
  }

  /// Adapts an observable-like or iterable source, see [`Species::from`].
  pub fn from<S>(source: S, scheduler: impl Scheduler + 'static) -> Result<Self, Error>
  where
    S: Interop<T, E>,
  {
    OBSERVABLE.from(source, scheduler)
  }

  /// Delivers `items` on the next turns of `scheduler`, then completes.
  pub fn of<I>(items: I, scheduler: impl Scheduler + 'static) -> Self
  where
    I: IntoIterator<Item = T>,
    T: Clone,
  {
    OBSERVABLE.of(items, scheduler)
  }
}
