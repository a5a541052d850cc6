//! Async query cache and the dashboard's typed query layer.
//!
//! [`QueryCache`] is generic over key and value and knows nothing about the
//! dashboard; [`Queries`] binds it to the [`TrialApi`](trialdesk_api_client::TrialApi)
//! facade with one [`QueryKey`] per view and invalidation rules per
//! [`Mutation`].

pub mod cache;
pub mod key;
pub mod queries;

pub use cache::{Fetched, QueryCache, QueryConfig, QuerySnapshot, QueryStatus};
pub use key::{Mutation, QueryKey};
pub use queries::{Queries, QueryData, QueryPayload};
pub use trialdesk_api_client::RetryConfig;
