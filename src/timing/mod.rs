//! Latency telemetry
//!
//! `TimingBus` records `TimingEvent`s at fixed pipeline stages while a test
//! is active, keeps a bounded history for export and pushes each event to
//! live subscribers (the metrics socket).

mod bus;
mod event;

pub use bus::{
    Subscription, SubscriptionId, TimingBus, DEFAULT_CAPACITY, DEFAULT_SUBSCRIBER_QUEUE_SIZE,
};
pub use event::{Stage, TimingEvent};
