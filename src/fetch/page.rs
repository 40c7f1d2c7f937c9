// src/fetch/page.rs
// =============================================================================
// The types shared by every fetcher.
//
// A Page owns its response body as a stream of byte chunks. The body can be
// read exactly once; dropping the Page (or the stream) hands the connection
// back to the client, whether or not it was read to the end.
//
// The Page also carries the character encoding the server declared, so the
// extractor can turn the raw bytes into text correctly.
//
// Rust concepts:
// - Traits: Fetch is implemented by the real HTTP fetcher and by test fakes
// - Box<dyn Error>: an error of "any type", used for transport failures
// - &'static Encoding: encoding_rs hands out references to global tables
// =============================================================================

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use futures::stream::BoxStream;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// Response body, one chunk of bytes at a time
pub type BodyStream = BoxStream<'static, Result<Vec<u8>, FetchError>>;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a usable response (DNS, connect, timeout,
    /// malformed URL) or the body broke off half way
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },

    /// The server answered with a status code of 300 or above
    #[error("Error ({status}): {url}")]
    HttpStatus { status: u16, url: String },
}

impl FetchError {
    // Shorthand for building a Transport error from any error type
    pub fn transport(url: &str, source: impl Into<BoxError>) -> Self {
        FetchError::Transport {
            url: url.to_string(),
            source: source.into(),
        }
    }
}

// A successfully fetched page with its body still unread
pub struct Page {
    /// URL the body came from (after redirects)
    pub url: String,
    /// HTTP status code (always 2xx)
    pub status: u16,
    /// Character encoding of the body
    pub encoding: &'static Encoding,
    /// The body itself, readable once
    pub body: BodyStream,
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("url", &self.url)
            .field("status", &self.status)
            .field("encoding", &self.encoding.name())
            .finish_non_exhaustive()
    }
}

// Works out the body encoding from a Content-Type header value
//
// Parameters:
//   content_type: the raw header value, if the server sent one
//
// Returns: the declared charset, or UTF-8 when the header is missing,
// unparsable, or names a charset encoding_rs doesn't know. This is the
// same fallback reqwest's Response::text() uses.
//
// Example:
//   Some("text/html; charset=ISO-8859-1") -> windows-1252
//   (the WHATWG encoding standard treats Latin-1 labels as windows-1252)
pub fn encoding_from_content_type(content_type: Option<&str>) -> &'static Encoding {
    content_type
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .and_then(|parsed| {
            parsed
                .get_param(mime::CHARSET)
                .and_then(|charset| Encoding::for_label(charset.as_str().as_bytes()))
        })
        .unwrap_or(UTF_8)
}

// Anything that can turn a URL into a Page
//
// Implementations log what they do at debug level but must never let
// logging change the result.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Page, FetchError>;
}
