use std::{
  future::Future,
  pin::Pin,
  task::{Context, Poll},
};

use futures::{ready, stream, Stream};
use pin_project_lite::pin_project;

use super::{from::OpenIterator, Observable, Species};
use crate::{scheduler::Scheduler, subscription::SubscriptionObserver, subscription::Teardown, Error};

/// Builds an observable whose producer schedules a [`Drain`] over a fresh
/// iterator for every subscription.
pub(crate) fn drain_on<T, E>(
  species: &'static Species, open: OpenIterator<T>, scheduler: impl Scheduler + 'static,
) -> Observable<T, E>
where
  T: 'static,
  E: From<Error> + 'static,
{
  Observable::with_species(species, move |sink| {
    scheduler.schedule(Box::pin(Drain { items: stream::iter(open()), sink }))?;
    Ok(Teardown::none())
  })
}

pin_project! {
  /// Delivers one item per poll and wakes itself for the next one, so every
  /// item costs one turn of the scheduler. The subscription is checked before
  /// each step; cancelling it ends the drain.
  pub(crate) struct Drain<S, T, E> {
    #[pin]
    items: S,
    sink: SubscriptionObserver<T, E>,
  }
}

impl<S, T, E> Future for Drain<S, T, E>
where
  S: Stream<Item = T>,
  E: From<Error>,
{
  type Output = ();

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.project();
    if this.sink.closed() {
      tracing::trace!("drain stopped, subscription closed");
      return Poll::Ready(());
    }

    match ready!(this.items.poll_next(cx)) {
      Some(item) => {
        if let Err(err) = this.sink.next(item) {
          // A failing `next` handler turns into an error event, unless the
          // handler also closed the subscription.
          if this.sink.closed() {
            report(Err(err));
          } else {
            report(this.sink.error(err));
          }
          return Poll::Ready(());
        }
        cx.waker().wake_by_ref();
        Poll::Pending
      }
      None => {
        report(this.sink.complete());
        Poll::Ready(())
      }
    }
  }
}

fn report<E>(result: Result<(), E>) {
  if result.is_err() {
    tracing::warn!("error escaped a scheduled drain, no caller left to receive it");
  }
}
