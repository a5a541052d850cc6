//! Domain records shared by every TrialDesk crate.
//!
//! Sites run trials, sponsors own them. Everything here is plain data:
//! lookups, invitation state and the query cache live in the crates that
//! consume these types.

pub mod analytics;
pub mod document;
pub mod trial;
pub mod user;
pub mod validate;

pub use analytics::*;
pub use document::*;
pub use trial::*;
pub use user::*;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
