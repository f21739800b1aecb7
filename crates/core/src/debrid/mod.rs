//! Debrid services: turning an infohash into a playable URL.
//!
//! Each service is a `DebridProvider` with its own wire format. Shared
//! plumbing lives beside them: `ProviderHttp` for auth, status mapping and
//! token refresh, `HashListEncoding` for the hash-list wire shapes, and
//! `check_in_batches` for chunked availability lookups. `StreamResolver`
//! drives one provider through add, select, poll and unrestrict;
//! `DebridManager` picks providers from the config store and falls back
//! between them.

mod all_debrid;
mod cache_check;
mod easynews;
mod encoding;
mod factory;
mod http;
mod manager;
mod premiumize;
mod real_debrid;
mod resolver;
mod torbox;
mod types;

pub use all_debrid::{AllDebridProvider, DEFAULT_ALL_DEBRID_URL};
pub use cache_check::check_in_batches;
pub use easynews::{EasynewsProvider, DEFAULT_EASYNEWS_URL};
pub use encoding::HashListEncoding;
pub use factory::{HttpProviderFactory, ProviderEndpoints, ProviderFactory};
pub use http::{check_status, ProviderHttp, TokenRefresher};
pub use manager::DebridManager;
pub use premiumize::{PremiumizeProvider, DEFAULT_PREMIUMIZE_URL};
pub use real_debrid::{
    RealDebridProvider, RealDebridRefresher, DEFAULT_REAL_DEBRID_OAUTH_URL,
    DEFAULT_REAL_DEBRID_URL, INSTANT_AVAILABILITY_LIMIT,
};
pub use resolver::{PollPolicy, StreamResolver, WorkflowState};
pub use torbox::{TorboxProvider, DEFAULT_TORBOX_URL};
pub use types::*;
