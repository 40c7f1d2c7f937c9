// src/crawl/mod.rs
// =============================================================================
// This module drives the crawl.
//
// Features:
// - Depth-first walk over an explicit stack (no recursion)
// - Global depth limit taken from CrawlConfig
// - Failed pages are logged and skipped, never fatal
// - Logs go to an injected tracing Dispatch
// =============================================================================

mod stack;

// Re-export the crawler
pub use stack::Crawler;
