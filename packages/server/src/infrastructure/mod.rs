//! Infrastructure layer: concrete implementations of the domain interfaces.

pub mod framing;
pub mod observer;
pub mod outbox;
pub mod registry;
pub mod sink;
pub mod store;
