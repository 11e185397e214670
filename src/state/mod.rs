//! Session and process-wide state shared by workflow runs.

pub mod exclusions;
pub mod session;
pub mod status;
pub mod ttl_cache;
pub mod watchers;
