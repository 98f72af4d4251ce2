use std::{cell::RefCell, rc::Rc};

use futures::future;

use super::Observable;
use crate::{
  observer::Observer,
  scheduler::Scheduler,
  subscription::{Subscription, Teardown},
  Error,
};

impl<T: 'static, E: From<Error> + 'static> Observable<T, E> {
  /// Postpones the producer to the next turn of `scheduler`.
  ///
  /// `subscribe` on the returned observable hands back the subscription right
  /// away; the source producer runs on the following turn, unless the
  /// subscription was cancelled in the meantime. Failures the source
  /// subscribe would have returned are relayed as error events.
  ///
  /// ```rust
  /// use es_observable::prelude::*;
  /// use futures::executor::LocalPool;
  ///
  /// let mut pool = LocalPool::new();
  /// let greeting = Observable::<&str, Error>::new(|sink| {
  ///   sink.next("hello")?;
  ///   sink.complete()?;
  ///   Ok(Teardown::none())
  /// })
  /// .defer_on(pool.spawner());
  ///
  /// let subscription = greeting.subscribe((|v: &str| println!("{v}"),)).unwrap();
  /// assert!(!subscription.closed());
  /// pool.run_until_stalled();
  /// assert!(subscription.closed());
  /// ```
  pub fn defer_on(&self, scheduler: impl Scheduler + 'static) -> Self {
    let source = self.clone();
    Observable::with_species(self.species, move |sink| {
      let slot: Rc<RefCell<Option<Subscription<T, E>>>> = Rc::default();
      let (task_slot, source) = (slot.clone(), source.clone());
      scheduler.schedule(Box::pin(future::lazy(move |_| {
        if sink.closed() {
          tracing::trace!("deferred subscribe skipped, subscription closed");
          return;
        }
        match source.subscribe(Observer::forward(sink.clone())) {
          Ok(subscription) => *task_slot.borrow_mut() = Some(subscription),
          Err(_) => tracing::warn!("deferred subscribe failed with nobody to handle it"),
        }
        // Cancelled while the source was still delivering: the teardown
        // already ran against an empty slot.
        if sink.closed() {
          let subscription = task_slot.borrow_mut().take();
          if subscription.map_or(Ok(()), |s| s.unsubscribe()).is_err() {
            tracing::warn!("deferred subscription cleanup failed after cancel");
          }
        }
      })))?;

      Ok(Teardown::try_new(move || {
        let subscription = slot.borrow_mut().take();
        subscription.map_or(Ok(()), |s| s.unsubscribe())
      }))
    })
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use futures::executor::LocalPool;

  use crate::prelude::*;

  fn counted(runs: &Rc<RefCell<u32>>, cleaned: &Rc<RefCell<u32>>) -> Observable<i32, Error> {
    let (runs, cleaned) = (runs.clone(), cleaned.clone());
    Observable::new(move |sink| {
      *runs.borrow_mut() += 1;
      sink.next(1)?;
      let cleaned = cleaned.clone();
      Ok(Teardown::new(move || *cleaned.borrow_mut() += 1))
    })
  }

  #[es_observable_macro::test]
  fn producer_runs_on_the_next_turn() {
    let mut pool = LocalPool::new();
    let (runs, cleaned) = (Rc::new(RefCell::new(0)), Rc::new(RefCell::new(0)));
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();

    let subscription = counted(&runs, &cleaned)
      .defer_on(pool.spawner())
      .subscribe((move |v: i32| c_seen.borrow_mut().push(v),))
      .unwrap();
    assert_eq!(*runs.borrow(), 0);

    pool.run_until_stalled();
    assert_eq!(*runs.borrow(), 1);
    assert_eq!(*seen.borrow(), vec![1]);

    subscription.unsubscribe().unwrap();
    assert_eq!(*cleaned.borrow(), 1);
  }

  #[es_observable_macro::test]
  fn cancel_before_the_turn_skips_the_producer() {
    let mut pool = LocalPool::new();
    let (runs, cleaned) = (Rc::new(RefCell::new(0)), Rc::new(RefCell::new(0)));

    let subscription = counted(&runs, &cleaned).defer_on(pool.spawner()).subscribe(()).unwrap();
    subscription.unsubscribe().unwrap();
    pool.run_until_stalled();

    assert_eq!(*runs.borrow(), 0);
    assert_eq!(*cleaned.borrow(), 0);
  }

  #[es_observable_macro::test]
  fn cancel_during_the_source_delivery_still_cleans_up() {
    let mut pool = LocalPool::new();
    let (runs, cleaned) = (Rc::new(RefCell::new(0)), Rc::new(RefCell::new(0)));
    let holder: Rc<RefCell<Option<Subscription<i32, Error>>>> = Rc::default();
    let c_holder = holder.clone();

    let subscription = counted(&runs, &cleaned)
      .defer_on(pool.spawner())
      .subscribe((move |_: i32| c_holder.borrow().as_ref().unwrap().unsubscribe().unwrap(),))
      .unwrap();
    *holder.borrow_mut() = Some(subscription.clone());

    pool.run_until_stalled();
    assert!(subscription.closed());
    assert_eq!(*runs.borrow(), 1);
    assert_eq!(*cleaned.borrow(), 1);
  }

  #[es_observable_macro::test]
  fn deferred_failure_reaches_the_error_handler() {
    let mut pool = LocalPool::new();
    let seen = Rc::new(RefCell::new(None));
    let c_seen = seen.clone();
    let subscription = Observable::<i32, Error>::new(|_| Err(Error::NotConvertible))
      .defer_on(pool.spawner())
      .subscribe(Observer::new().on_error(move |err| *c_seen.borrow_mut() = Some(err)))
      .unwrap();

    pool.run_until_stalled();
    assert_eq!(*seen.borrow(), Some(Error::NotConvertible));
    assert!(subscription.closed());
  }
}
