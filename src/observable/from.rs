//! Adapting foreign sources into observables.
//!
//! Sources are recognised by the capabilities they expose, never by their
//! concrete type: a source answers [`Interop::capability`] for the well-known
//! [`CapabilityKey`]s and the adapter works with whatever comes back.

use std::{fmt, rc::Rc};

use super::{from_iter, Observable, Species};
use crate::{observer::Observer, scheduler::Scheduler, subscription::Teardown, Error};

/// Process-wide key naming a well-known capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilityKey(&'static str);

impl CapabilityKey {
  /// Yields something with a `subscribe` capability.
  pub const OBSERVABLE: CapabilityKey = CapabilityKey("@@observable");
  /// Yields an iterator over the source's items.
  pub const ITERATOR: CapabilityKey = CapabilityKey("@@iterator");

  pub fn name(&self) -> &'static str { self.0 }
}

impl fmt::Display for CapabilityKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.0) }
}

/// The "has a `subscribe` method" contract. The returned teardown is the
/// cleanup of the subscription that was started.
pub trait Subscribable<T, E> {
  fn subscribe(&self, observer: Observer<T, E>) -> Result<Teardown<E>, E>;
}

pub type OpenObservable<T, E> = Box<dyn FnOnce() -> Option<Rc<dyn Subscribable<T, E>>>>;
pub type OpenIterator<T> = Rc<dyn Fn() -> Box<dyn Iterator<Item = T>>>;

/// What a source holds under a capability key.
pub enum Capability<T, E> {
  /// Invocable observable capability. `None` from the call means the result
  /// has no `subscribe` capability.
  Observable(OpenObservable<T, E>),
  /// Invocable iteration capability, called once per subscription.
  Iterator(OpenIterator<T>),
  /// Something is stored under the key but it cannot be invoked.
  Value,
}

impl<T, E> fmt::Debug for Capability<T, E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Capability::Observable(_) => f.write_str("Capability::Observable"),
      Capability::Iterator(_) => f.write_str("Capability::Iterator"),
      Capability::Value => f.write_str("Capability::Value"),
    }
  }
}

/// A source [`Species::from`] can adapt.
///
/// Every observable and every `IntoIterator + Clone` type is a source.
pub trait Interop<T, E> {
  /// Looks up a well-known capability. `None` when the key is absent.
  fn capability(&self, key: CapabilityKey) -> Option<Capability<T, E>>;

  /// The source itself when it already is an observable.
  fn as_observable(&self) -> Option<&Observable<T, E>> { None }
}

impl<T: 'static, E: From<Error> + 'static> Interop<T, E> for Observable<T, E> {
  fn capability(&self, key: CapabilityKey) -> Option<Capability<T, E>> {
    (key == CapabilityKey::OBSERVABLE).then(|| {
      let this = self.clone();
      Capability::Observable(Box::new(move || Some(Rc::new(this) as Rc<dyn Subscribable<T, E>>)))
    })
  }

  fn as_observable(&self) -> Option<&Observable<T, E>> { Some(self) }
}

impl<T, E, I> Interop<T, E> for I
where
  I: IntoIterator<Item = T> + Clone + 'static,
  I::IntoIter: 'static,
{
  fn capability(&self, key: CapabilityKey) -> Option<Capability<T, E>> {
    (key == CapabilityKey::ITERATOR).then(|| {
      let source = self.clone();
      let open = move || Box::new(source.clone().into_iter()) as Box<dyn Iterator<Item = T>>;
      Capability::Iterator(Rc::new(open))
    })
  }
}

impl<T: 'static, E: From<Error> + 'static> Subscribable<T, E> for Observable<T, E> {
  fn subscribe(&self, observer: Observer<T, E>) -> Result<Teardown<E>, E> {
    let subscription = Observable::subscribe(self, observer)?;
    Ok(Teardown::unsubscribe(subscription))
  }
}

impl Species {
  /// Converts `source` into an observable of this species.
  ///
  /// - An observable already of this species is returned as is.
  /// - An observable-like source is subscribed to on every subscription, its
  ///   events relayed and its teardown kept.
  /// - An iterable is drained on the following turns of `scheduler`, one item
  ///   per turn, stopping as soon as the subscription is closed.
  pub fn from<T, E, S>(
    &'static self, source: S, scheduler: impl Scheduler + 'static,
  ) -> Result<Observable<T, E>, Error>
  where
    T: 'static,
    E: From<Error> + 'static,
    S: Interop<T, E>,
  {
    if let Some(observable) = source.as_observable() {
      if std::ptr::eq(observable.species, self) {
        return Ok(observable.clone());
      }
    }

    match source.capability(CapabilityKey::OBSERVABLE) {
      Some(Capability::Observable(open)) => {
        let inner = open().ok_or(Error::NotSubscribable)?;
        tracing::trace!(species = self.name(), "adapting observable-like source");
        return Ok(Observable::with_species(self, move |sink| {
          inner.subscribe(Observer::forward(sink))
        }));
      }
      Some(_) => return Err(Error::NotCallable(CapabilityKey::OBSERVABLE)),
      None => {}
    }

    match source.capability(CapabilityKey::ITERATOR) {
      Some(Capability::Iterator(open)) => {
        tracing::trace!(species = self.name(), "adapting iterable source");
        Ok(from_iter::drain_on(self, open, scheduler))
      }
      Some(_) => Err(Error::NotCallable(CapabilityKey::ITERATOR)),
      None => Err(Error::NotConvertible),
    }
  }

  /// An observable of this species delivering `items` one per turn of
  /// `scheduler`, then completing.
  pub fn of<T, E, I>(&'static self, items: I, scheduler: impl Scheduler + 'static) -> Observable<T, E>
  where
    T: Clone + 'static,
    E: From<Error> + 'static,
    I: IntoIterator<Item = T>,
  {
    let items: Rc<[T]> = items.into_iter().collect();
    let open = move || Box::new(items.to_vec().into_iter()) as Box<dyn Iterator<Item = T>>;
    from_iter::drain_on(self, Rc::new(open), scheduler)
  }
}
