pub mod client;
pub mod facade;
pub mod latency;
pub mod mock;
pub mod retry;

pub use client::HttpApi;
pub use facade::TrialApi;
pub use latency::LatencySimulator;
pub use mock::MockApi;
pub use retry::RetryConfig;
pub use trialdesk_api;
