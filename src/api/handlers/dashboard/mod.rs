//! Per-user dashboard statistics.

pub(crate) mod stats;
mod storage;
pub(crate) mod types;
