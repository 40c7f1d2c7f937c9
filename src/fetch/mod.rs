// src/fetch/mod.rs
// =============================================================================
// This module downloads pages.
//
// Submodules:
// - page: the Fetch trait, the Page it returns, and FetchError
// - http: the real fetcher, built on reqwest
//
// The crawler only talks to the Fetch trait, so tests can hand it a
// scripted set of pages instead of going over the network.
// =============================================================================

mod http;
mod page;

pub use http::HttpFetcher;
pub use page::Fetch;

#[cfg(test)]
pub use page::{FetchError, Page};
