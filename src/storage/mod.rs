//! In-process caching. There is deliberately no durable storage here: the
//! engine recomputes everything from the API, and the dashboard's session
//! layer lives outside this crate.

pub mod cache;

pub use cache::TtlCache;
