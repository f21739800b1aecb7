//! Outbound HTTP abstraction.
//!
//! Every indexer and debrid client talks to the network through an injected
//! `HttpTransport`, so tests can substitute a recording transport and no
//! client holds ambient global state.

mod reqwest_transport;
mod types;

pub use reqwest_transport::ReqwestTransport;
pub use types::*;
