// src/fetch/http.rs
// =============================================================================
// This module fetches pages over HTTP(S).
//
// Key functionality:
// - Makes a plain GET request with the client's default settings
//   (reqwest follows redirects on its own)
// - Turns any status code of 300 or above into FetchError::HttpStatus
// - Hands back the body as a stream so the HTML can be scanned while it
//   downloads instead of being buffered into one big String
// - Reads the charset from the Content-Type header so the body can be
//   decoded correctly later
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use super::page::{encoding_from_content_type, Fetch, FetchError, Page};

// Fetcher backed by a single reqwest Client
//
// The client is reused for every request (connection pooling), and
// cloning the fetcher is cheap.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        debug!(url, "Downloading");

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url, error = %e, "Request failed");
                return Err(FetchError::transport(url, e));
            }
        };

        let status = response.status().as_u16();
        if status > 299 {
            // Dropping the response here releases the connection
            let err = FetchError::HttpStatus {
                status,
                url: url.to_string(),
            };
            debug!(error = %err, "Rejected response");
            return Err(err);
        }

        // Missing or unreadable header means UTF-8
        let encoding = encoding_from_content_type(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        );

        let page_url = response.url().to_string();
        let body_url = page_url.clone();
        let body = response
            .bytes_stream()
            .map_ok(|chunk| chunk.to_vec())
            .map_err(move |e| FetchError::transport(&body_url, e))
            .boxed();

        Ok(Page {
            url: page_url,
            status,
            encoding,
            body,
        })
    }
}
