//! Deferred execution.
//!
//! A [`Scheduler`] runs work on a later turn of a single-threaded executor.
//! Nothing here is thread-safe: tasks are `!Send` futures driven by whoever
//! owns the executor.
//!
//! - [`futures::executor::LocalSpawner`] schedules onto a `LocalPool`, which
//!   is also what the tests use to step turns deterministically.
//! - [`TokioLocalScheduler`] (feature `tokio-scheduler`) schedules onto the
//!   current `tokio::task::LocalSet`.
use std::rc::Rc;

use futures::{
  executor::LocalSpawner,
  future::LocalBoxFuture,
  task::LocalSpawnExt,
};

use crate::Error;

/// A Scheduler is an object to order tasks and schedule their execution.
pub trait Scheduler {
  /// Queues `task`. It must not be polled before this call returns.
  fn schedule(&self, task: LocalBoxFuture<'static, ()>) -> Result<(), Error>;
}

impl Scheduler for LocalSpawner {
  fn schedule(&self, task: LocalBoxFuture<'static, ()>) -> Result<(), Error> {
    self.spawn_local(task)?;
    Ok(())
  }
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
  fn schedule(&self, task: LocalBoxFuture<'static, ()>) -> Result<(), Error> { (**self).schedule(task) }
}

/// Spawns onto the `LocalSet` the caller is running in.
///
/// # Panics
///
/// Scheduling outside of a `LocalSet` panics, as `tokio::task::spawn_local`
/// does.
#[cfg(feature = "tokio-scheduler")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioLocalScheduler;

#[cfg(feature = "tokio-scheduler")]
impl Scheduler for TokioLocalScheduler {
  fn schedule(&self, task: LocalBoxFuture<'static, ()>) -> Result<(), Error> {
    tokio::task::spawn_local(task);
    Ok(())
  }
}
