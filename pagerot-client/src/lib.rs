pub mod cancel;
pub mod client;
pub mod error;
pub mod fetch;
pub mod limit;
pub mod record;
pub mod retry;

pub use cancel::CancelToken;
pub use client::WorkspaceClient;
pub use error::{ErrorKind, FetchError};
pub use fetch::{collect_collection, fetch_collection, list_collections};
pub use limit::RateLimiter;
pub use record::{CollectionSnapshot, PageRecord};
pub use retry::RetryPolicy;
