pub mod retry;
pub mod snapshot;

pub use retry::{retry_cas, retry_on_transient, CasError, IsTransient, RetriesExhausted, RetryConfig, RetryResult};
pub use snapshot::SnapshotList;
