mod web;

pub use web::{POLL_INTERVAL, SendForm, index, send, stream};
