pub mod clock;
pub mod config;
pub mod counter;
pub mod http;
pub mod observability;
pub mod store;

pub use clock::{Clock, SimulatedClock, SystemClock};
pub use config::ServiceConfig;
pub use counter::{CounterError, CounterKey, CounterRecord, QuerySurface, RetentionConfig, UpdateEngine};
pub use store::CounterStore;
