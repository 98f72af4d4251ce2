//! # es-observable: a push-based Observable for Rust
//!
//! A single-observer delivery primitive modelled on the ECMAScript Observable
//! proposal: a lazy producer, a cancellable subscription and a sink that keeps
//! delivery strictly sequential.
//!
//! ## Quick Start
//!
//! ```rust
//! use es_observable::prelude::*;
//!
//! let source = Observable::<i32, Error>::new(|sink| {
//!   sink.next(1)?;
//!   sink.next(2)?;
//!   sink.complete()?;
//!   Ok(Teardown::new(|| println!("released")))
//! });
//!
//! let subscription = source
//!   .subscribe(
//!     Observer::new()
//!       .on_next(|v: i32| println!("Value: {}", v))
//!       .on_complete(|| println!("done")),
//!   )
//!   .unwrap();
//! assert!(subscription.closed());
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | Lazy wrapper around a producer function |
//! | [`Observer`] | Optional `start`, `next`, `error` and `complete` handlers |
//! | [`Subscription`] | One active observation, cancelled with `unsubscribe` |
//! | [`SubscriptionObserver`] | The sink a producer pushes events into |
//! | [`Scheduler`] | Where deferred work (`from`, `of`, `defer_on`) runs |
//!
//! ## Errors
//!
//! Every stream carries one error type `E`. Handlers, producers and teardowns
//! report failures by returning `Err(E)`; failures raised by the crate itself
//! are [`Error`] values converted through `E: From<Error>`.
//!
//! ## Feature Flags
//!
//! - **`tokio-scheduler`** (default): [`TokioLocalScheduler`], spawning onto a
//!   tokio `LocalSet`
//!
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`SubscriptionObserver`]: subscription::SubscriptionObserver
//! [`Scheduler`]: scheduler::Scheduler
//! [`TokioLocalScheduler`]: scheduler::TokioLocalScheduler

pub mod error;
pub mod observable;
pub mod observer;
pub mod prelude;
pub mod scheduler;
pub mod subscription;

pub use error::Error;
pub use prelude::*;
