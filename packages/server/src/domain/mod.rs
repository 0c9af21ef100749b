//! Domain layer: sessions and the interfaces the relay core depends on.

mod event;
mod outbox;
mod registry;
mod session;
mod sink;
mod store;

pub use event::{RelayEvent, RelayObserver};
pub use outbox::WebOutbox;
pub use registry::SessionRegistry;
pub use session::{Session, SessionKey, build_user_list};
pub use sink::{DeliveryError, SessionSink};
pub use store::{PayloadSource, ReceivedFile, ReceivedFileStore, StoreError};

#[cfg(test)]
pub use sink::MockSessionSink;
