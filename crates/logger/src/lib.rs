//! Tracing setup shared by the checkup binaries.

mod subscriber;

pub use subscriber::{LogFormat, init_tracing};
