//! Tournament chat polling.

pub mod poller;

pub use poller::{start_poller, ChatAlert};
