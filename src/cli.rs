// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The interface is a single positional argument: the URL to start from.
// It is declared optional so that a missing URL produces our own
// "Missing Url arg" error instead of clap's usage message.
// =============================================================================

use clap::Parser;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(
    name = "link-tree",
    version = "0.1.0",
    about = "Crawl a website and print the tree of links it contains",
    long_about = "link-tree downloads a page, prints every link on it, then follows each link \
                  and prints the links it finds there, indented by depth. \
                  Set LINK_TREE_MAX_DEPTH to change how deep it goes (default: 2) \
                  and RUST_LOG to change log verbosity (default: info)."
)]
pub struct Cli {
    /// URL of the page to start crawling from (e.g., https://example.com)
    pub url: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("Missing Url arg")]
    MissingUrl,
}

impl Cli {
    // Returns the start URL, or CliError::MissingUrl if none was given
    pub fn start_url(&self) -> Result<&str, CliError> {
        self.url.as_deref().ok_or(CliError::MissingUrl)
    }
}
