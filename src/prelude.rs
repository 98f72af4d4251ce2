//! Prelude module for convenient imports

pub use crate::{
  error::Error,
  observable::{
    Capability, CapabilityKey, Interop, Observable, Producer, Species, Subscribable, OBSERVABLE,
  },
  observer::Observer,
  scheduler::Scheduler,
  subscription::{
    State, Subscription, SubscriptionGuard, SubscriptionObserver, Teardown, Unsubscribe,
  },
};

#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioLocalScheduler;
