//! Subscription lifecycle.
//!
//! A [`Subscription`] is created by every call to `subscribe`. It owns the
//! normalized observer and the producer's teardown and walks the states
//! `Initializing -> Ready <-> Running -> Closed`. The producer talks to it
//! through a [`SubscriptionObserver`], the caller through `unsubscribe`.
//!
//! Closing always happens in the same order: the state becomes `Closed` and the
//! observer and teardown are detached first, then the terminal handler (if any)
//! runs, then the teardown runs. No `RefCell` borrow is held while user code
//! executes, so every handler may freely call back into its own subscription.

use std::{
  cell::RefCell,
  fmt::{Debug, Formatter},
  rc::Rc,
};

use crate::{observable::Producer, observer::Observer};

mod subscription_observer;
mod teardown;

pub use subscription_observer::SubscriptionObserver;
pub(crate) use teardown::Cleanup;
pub use teardown::{Teardown, Unsubscribe};

/// Lifecycle state of a [`Subscription`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
  /// The observer's `start` hook is running.
  Initializing,
  /// Waiting for the next event.
  Ready,
  /// A `next` handler is executing.
  Running,
  /// Terminal. Observer and teardown are released.
  Closed,
}

pub(crate) struct Inner<T, E> {
  pub(crate) state: State,
  pub(crate) observer: Option<Observer<T, E>>,
  pub(crate) cleanup: Option<Cleanup<E>>,
}

/// Handle to one active observation.
///
/// Cloning the handle does not create a new subscription; all clones observe
/// and control the same one.
pub struct Subscription<T, E>(pub(crate) Rc<RefCell<Inner<T, E>>>);

impl<T, E> Clone for Subscription<T, E> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T, E> Debug for Subscription<T, E> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription").field("state", &self.state()).finish()
  }
}

impl<T, E> Subscription<T, E> {
  pub fn state(&self) -> State { self.0.borrow().state }

  pub fn closed(&self) -> bool { self.state() == State::Closed }

  /// Cancels the observation. The observer is not notified. Runs the teardown
  /// once; calling it again is a no-op.
  ///
  /// The teardown's failure is returned to the caller.
  pub fn unsubscribe(&self) -> Result<(), E> {
    if self.closed() {
      return Ok(());
    }
    tracing::trace!("subscription cancelled");
    let (_observer, cleanup) = self.close();
    run_cleanup(cleanup)
  }

  /// Activates "RAII" behavior for this subscription: `unsubscribe()` is called
  /// as soon as the returned guard goes out of scope.
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard<T, E> { SubscriptionGuard(self) }

  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }

  /// Marks the subscription closed and hands back what it owned. Both values
  /// must be dropped or invoked after the borrow is released.
  pub(crate) fn close(&self) -> (Option<Observer<T, E>>, Option<Cleanup<E>>) {
    let mut inner = self.0.borrow_mut();
    inner.state = State::Closed;
    (inner.observer.take(), inner.cleanup.take())
  }

  fn set_state(&self, state: State) { self.0.borrow_mut().state = state; }
}

impl<T: 'static, E: From<crate::Error> + 'static> Subscription<T, E> {
  /// Runs the `start` hook, then the producer.
  ///
  /// A failing hook or producer is delivered as an error event. The error only
  /// comes back from here when the observer has no `error` handler, or when
  /// that handler fails itself.
  pub(crate) fn new(observer: Observer<T, E>, producer: &Producer<T, E>) -> Result<Self, E> {
    let subscription = Self(Rc::new(RefCell::new(Inner {
      state: State::Initializing,
      observer: Some(observer),
      cleanup: None,
    })));
    let sink = SubscriptionObserver(subscription.clone());

    let start = subscription.0.borrow_mut().observer.as_mut().and_then(|o| o.start.take());
    if let Some(start) = start {
      if let Err(err) = start(&subscription) {
        if subscription.closed() {
          // Cancelled by the hook itself, no observer is left to take it.
          return Err(err);
        }
        sink.fail(err)?;
      }
    }
    if subscription.closed() {
      tracing::trace!("subscription closed during start");
      return Ok(subscription);
    }

    subscription.set_state(State::Ready);
    tracing::trace!("subscription ready, running producer");
    match producer(sink.clone()) {
      Ok(teardown) => {
        let cleanup = {
          let mut inner = subscription.0.borrow_mut();
          inner.cleanup = teardown.into_cleanup();
          if inner.state == State::Closed { inner.cleanup.take() } else { None }
        };
        // The producer finished its work synchronously, the teardown it
        // returned is all that is left to run.
        run_cleanup(cleanup)?;
      }
      Err(err) => sink.fail(err)?,
    }
    Ok(subscription)
  }
}

impl<T, E> Unsubscribe<E> for Subscription<T, E> {
  fn unsubscribe(&self) -> Result<(), E> { Subscription::unsubscribe(self) }

  fn is_closed(&self) -> bool { self.closed() }
}

pub(crate) fn run_cleanup<E>(cleanup: Option<Cleanup<E>>) -> Result<(), E> {
  match cleanup {
    Some(cleanup) => {
      tracing::debug!("running subscription cleanup");
      cleanup()
    }
    None => Ok(()),
  }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope.
#[must_use]
pub struct SubscriptionGuard<T, E>(Subscription<T, E>);

impl<T, E> SubscriptionGuard<T, E> {
  pub fn new(subscription: Subscription<T, E>) -> Self { SubscriptionGuard(subscription) }

  pub fn subscription(&self) -> &Subscription<T, E> { &self.0 }
}

impl<T, E> Drop for SubscriptionGuard<T, E> {
  fn drop(&mut self) {
    if self.0.unsubscribe().is_err() {
      tracing::warn!("cleanup failed while dropping a subscription guard");
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::prelude::*;

  #[derive(Debug, PartialEq)]
  enum TestErr {
    Rx(Error),
    Boom(&'static str),
  }

  impl From<Error> for TestErr {
    fn from(err: Error) -> Self { TestErr::Rx(err) }
  }

  type Calls = Rc<RefCell<Vec<String>>>;

  fn recorder() -> Calls { Rc::new(RefCell::new(vec![])) }

  fn push(calls: &Calls, entry: impl Into<String>) { calls.borrow_mut().push(entry.into()); }

  /// Subscribes to a producer that stashes its sink and returns `teardown`.
  fn capture_sink(
    observer: Observer<i32, TestErr>, teardown: impl Fn() -> Teardown<TestErr> + 'static,
  ) -> (Subscription<i32, TestErr>, SubscriptionObserver<i32, TestErr>) {
    let slot = Rc::new(RefCell::new(None));
    let c_slot = slot.clone();
    let subscription = Observable::new(move |sink| {
      *c_slot.borrow_mut() = Some(sink);
      Ok(teardown())
    })
    .subscribe(observer)
    .unwrap();
    let sink = slot.borrow_mut().take().unwrap();
    (subscription, sink)
  }

  #[es_observable_macro::test]
  fn delivers_in_order_then_cleans_up() {
    let calls = recorder();
    let (c_next, c_done, c_clean) = (calls.clone(), calls.clone(), calls.clone());
    let subscription = Observable::new(move |sink: SubscriptionObserver<i32, TestErr>| {
      sink.next(1)?;
      sink.next(2)?;
      sink.complete()?;
      let c_clean = c_clean.clone();
      Ok(Teardown::new(move || push(&c_clean, "cleanup")))
    })
    .subscribe(
      Observer::new()
        .on_next(move |v: i32| push(&c_next, v.to_string()))
        .on_complete(move || push(&c_done, "done")),
    )
    .unwrap();

    assert_eq!(*calls.borrow(), vec!["1", "2", "done", "cleanup"]);
    assert!(subscription.closed());
  }

  #[es_observable_macro::test]
  fn no_observer_at_all_completes_quietly() {
    let (subscription, sink) = capture_sink(().into(), Teardown::none);
    assert_eq!(sink.complete(), Ok(()));
    assert!(subscription.closed());
  }

  #[es_observable_macro::test]
  fn unsubscribe_is_idempotent() {
    let calls = recorder();
    let c_calls = calls.clone();
    let (subscription, _sink) = capture_sink(().into(), move || {
      let calls = c_calls.clone();
      Teardown::new(move || push(&calls, "cleanup"))
    });

    assert_eq!(subscription.unsubscribe(), Ok(()));
    assert_eq!(subscription.unsubscribe(), Ok(()));
    assert!(subscription.closed());
    assert_eq!(*calls.borrow(), vec!["cleanup"]);
  }

  #[es_observable_macro::test]
  fn unsubscribe_is_silent_and_stops_delivery() {
    let calls = recorder();
    let (c_next, c_done) = (calls.clone(), calls.clone());
    let (subscription, sink) = capture_sink(
      Observer::new()
        .on_next(move |v: i32| push(&c_next, v.to_string()))
        .on_complete(move || push(&c_done, "done")),
      Teardown::none,
    );

    sink.next(1).unwrap();
    subscription.unsubscribe().unwrap();
    sink.next(2).unwrap();
    sink.complete().unwrap();
    assert!(sink.closed());
    assert_eq!(*calls.borrow(), vec!["1"]);
  }

  #[es_observable_macro::test]
  fn unsubscribe_reports_cleanup_failure_once() {
    let (subscription, _sink) =
      capture_sink(().into(), || Teardown::try_new(|| Err(TestErr::Boom("cleanup"))));

    assert_eq!(subscription.unsubscribe(), Err(TestErr::Boom("cleanup")));
    assert_eq!(subscription.unsubscribe(), Ok(()));
  }

  #[es_observable_macro::test]
  fn start_receives_the_subscription_before_the_producer() {
    let calls = recorder();
    let (c_start, c_producer) = (calls.clone(), calls.clone());
    Observable::<i32, TestErr>::new(move |_| {
      push(&c_producer, "producer");
      Ok(Teardown::none())
    })
    .subscribe(Observer::new().on_start(move |subscription| {
      assert_eq!(subscription.state(), State::Initializing);
      push(&c_start, "start");
    }))
    .unwrap();

    assert_eq!(*calls.borrow(), vec!["start", "producer"]);
  }

  #[es_observable_macro::test]
  fn unsubscribe_during_start_skips_the_producer() {
    let ran = Rc::new(RefCell::new(false));
    let c_ran = ran.clone();
    let subscription = Observable::<i32, TestErr>::new(move |_| {
      *c_ran.borrow_mut() = true;
      Ok(Teardown::none())
    })
    .subscribe(Observer::new().on_start(|subscription| subscription.unsubscribe().unwrap()))
    .unwrap();

    assert!(subscription.closed());
    assert!(!*ran.borrow());
  }

  #[es_observable_macro::test]
  fn failing_start_goes_to_the_error_handler() {
    let seen = Rc::new(RefCell::new(None));
    let c_seen = seen.clone();
    let subscription = Observable::<i32, TestErr>::new(|_| Ok(Teardown::none()))
      .subscribe(
        Observer::new()
          .try_on_start(|_| Err(TestErr::Boom("start")))
          .on_error(move |err| *c_seen.borrow_mut() = Some(err)),
      )
      .unwrap();

    assert!(subscription.closed());
    assert_eq!(*seen.borrow(), Some(TestErr::Boom("start")));
  }

  #[es_observable_macro::test]
  fn failing_start_without_error_handler_fails_subscribe() {
    let result = Observable::<i32, TestErr>::new(|_| Ok(Teardown::none()))
      .subscribe(Observer::new().try_on_start(|_| Err(TestErr::Boom("start"))));
    assert_eq!(result.unwrap_err(), TestErr::Boom("start"));
  }

  #[es_observable_macro::test]
  fn failing_start_after_cancelling_itself_fails_subscribe() {
    let seen = Rc::new(RefCell::new(None));
    let c_seen = seen.clone();
    let result = Observable::<i32, TestErr>::new(|_| Ok(Teardown::none())).subscribe(
      Observer::new()
        .try_on_start(|subscription: &Subscription<i32, TestErr>| {
          subscription.unsubscribe()?;
          Err(TestErr::Boom("start"))
        })
        .on_error(move |err| *c_seen.borrow_mut() = Some(err)),
    );

    assert_eq!(result.unwrap_err(), TestErr::Boom("start"));
    assert_eq!(*seen.borrow(), None);
  }

  #[es_observable_macro::test]
  fn failing_producer_is_delivered_as_error() {
    let seen = Rc::new(RefCell::new(None));
    let c_seen = seen.clone();
    let subscription = Observable::<i32, TestErr>::new(|_| Err(TestErr::Boom("producer")))
      .subscribe(Observer::new().on_error(move |err| *c_seen.borrow_mut() = Some(err)))
      .unwrap();

    assert!(subscription.closed());
    assert_eq!(*seen.borrow(), Some(TestErr::Boom("producer")));
  }

  #[es_observable_macro::test]
  fn failing_producer_without_error_handler_fails_subscribe() {
    let result =
      Observable::<i32, TestErr>::new(|_| Err(TestErr::Boom("producer"))).subscribe(());
    assert_eq!(result.unwrap_err(), TestErr::Boom("producer"));
  }

  #[es_observable_macro::test]
  fn cleanup_failure_after_synchronous_completion_fails_subscribe() {
    let result = Observable::<i32, TestErr>::new(|sink| {
      sink.complete()?;
      Ok(Teardown::try_new(|| Err(TestErr::Boom("cleanup"))))
    })
    .subscribe(());
    assert_eq!(result.unwrap_err(), TestErr::Boom("cleanup"));
  }

  #[es_observable_macro::test]
  fn teardown_can_unsubscribe_another_subscription() {
    let inner = Observable::<i32, TestErr>::new(|_| Ok(Teardown::none())).subscribe(()).unwrap();
    let c_inner = inner.clone();
    let outer = Observable::<i32, TestErr>::new(move |_| Ok(c_inner.clone().into()))
      .subscribe(())
      .unwrap();

    assert!(!inner.closed());
    outer.unsubscribe().unwrap();
    assert!(inner.closed());
  }

  #[es_observable_macro::test]
  fn guard_built_from_a_subscription() {
    let calls = recorder();
    let c_calls = calls.clone();
    let (subscription, _sink) = capture_sink(().into(), move || {
      let calls = c_calls.clone();
      Teardown::new(move || push(&calls, "cleanup"))
    });
    {
      let guard = SubscriptionGuard::new(subscription.clone());
      assert!(guard.subscription().ptr_eq(&subscription));
      assert_eq!(guard.subscription().state(), State::Ready);
    }
    assert!(subscription.closed());
    assert_eq!(*calls.borrow(), vec!["cleanup"]);
  }

  #[es_observable_macro::test]
  fn guard_unsubscribes_on_drop() {
    let (subscription, _sink) = capture_sink(().into(), Teardown::none);
    {
      let _guard = subscription.clone().unsubscribe_when_dropped();
      assert!(!subscription.closed());
    }
    assert!(subscription.closed());
  }
}
