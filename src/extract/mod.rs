// src/extract/mod.rs
// =============================================================================
// This module turns HTML into Links.
//
// Submodules:
// - link: the Link record and its validity rules
// - html: streaming anchor extraction on top of the html5ever tokenizer
// =============================================================================

mod html;
mod link;

pub use html::extract_links;
pub use link::Link;
