//! launchwatch-source: the rocketlaunch.live event source, retry policy and acronym lookups.

pub mod acronyms;
pub mod client;
pub mod retry;
pub mod wire;

pub use acronyms::{AcronymClient, DECRONYM_URL, lookup_in};
pub use client::{DEFAULT_BASE_URL, RocketLaunchClient};
pub use retry::{RetryPolicy, with_retry};
pub use wire::decode_launches;
