//! HTTP surface over `streamrelay-core`: indexer search, debrid cache checks
//! and stream resolution.

pub mod api;
pub mod metrics;
pub mod state;
