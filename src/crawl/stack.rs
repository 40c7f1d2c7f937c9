// src/crawl/stack.rs
// =============================================================================
// This module walks a website depth-first and prints every link it finds.
//
// How it works:
// 1. Fetch the start page and extract its links (depth 0)
// 2. Push a frame holding those links onto a stack
// 3. Take the next link from the top frame and print it
// 4. If the next depth is still under the limit, fetch that link's page
//    and push its links as a new frame (depth + 1)
// 5. When a frame runs out of links, pop it and carry on with its parent
//
// That is a pre-order depth-first walk: a link's whole subtree is printed
// before its next sibling. There is no visited set, so a page that links to
// itself is crawled again at every depth until the limit stops it.
//
// A page that fails to download is logged and simply has no links. It never
// stops the rest of the crawl.
// =============================================================================

use anyhow::{Context, Result};
use std::io::Write;
use std::vec;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info, Dispatch};

use crate::config::CrawlConfig;
use crate::extract::{extract_links, Link};
use crate::fetch::Fetch;

// Counters for one run, logged when the crawl finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub pages_fetched: usize,
    pub fetch_failures: usize,
    pub links_printed: usize,
}

// One page on the stack: the links it still has to hand out
struct Frame {
    links: vec::IntoIter<Link>,
}

pub struct Crawler<F> {
    fetcher: F,
    config: CrawlConfig,
    dispatch: Dispatch,
}

impl<F: Fetch> Crawler<F> {
    // Creates a crawler that logs to whatever subscriber is current
    pub fn new(fetcher: F, config: CrawlConfig) -> Self {
        Self {
            fetcher,
            config,
            dispatch: tracing::dispatcher::get_default(|current| current.clone()),
        }
    }

    // Sends this crawler's logs to `dispatch` instead
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    // Crawls from `start_url`, writing one line per valid link to `out`
    //
    // Download and parse problems are logged, not returned. The only error
    // that comes back is failing to write to `out`.
    pub async fn run<W: Write>(&self, start_url: &str, out: &mut W) -> Result<CrawlStats> {
        self.crawl(start_url, out)
            .with_subscriber(self.dispatch.clone())
            .await
    }

    async fn crawl<W: Write>(&self, start_url: &str, out: &mut W) -> Result<CrawlStats> {
        let max_depth = self.config.max_depth();
        info!(url = start_url, max_depth, "Starting crawl");

        // The start page is the bottom frame
        let mut stats = CrawlStats::default();
        let mut stack = vec![self.visit(start_url, 0, &mut stats).await];

        while let Some(frame) = stack.last_mut() {
            // Finished pages drop off and their parent picks up again
            let Some(link) = frame.links.next() else {
                stack.pop();
                continue;
            };

            writeln!(out, "{}", link).context("Failed to write link")?;
            stats.links_printed += 1;

            // Descend right away so the subtree prints before the next sibling
            let next_depth = link.depth() + 1;
            if next_depth < max_depth {
                debug!(url = link.url(), text = link.text(), depth = next_depth, "Following link");
                let child = self.visit(link.url(), next_depth, &mut stats).await;
                stack.push(child);
            }
        }

        out.flush().context("Failed to flush output")?;
        info!(
            pages = stats.pages_fetched,
            failures = stats.fetch_failures,
            links = stats.links_printed,
            "Crawl finished"
        );
        Ok(stats)
    }

    // Downloads one page and extracts its links
    //
    // A failed download short-circuits: the extractor never sees it and
    // the frame comes back empty.
    async fn visit(&self, url: &str, depth: usize, stats: &mut CrawlStats) -> Frame {
        let links = match self.fetcher.fetch(url).await {
            Ok(page) => {
                stats.pages_fetched += 1;
                debug!(
                    url = %page.url,
                    status = page.status,
                    encoding = page.encoding.name(),
                    depth,
                    "Scanning page"
                );
                extract_links(page.body, page.encoding, depth, self.config.max_depth()).await
            }
            Err(e) => {
                stats.fetch_failures += 1;
                error!("{}", e);
                Vec::new()
            }
        };

        Frame {
            links: links.into_iter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, Page};
    use async_trait::async_trait;
    use encoding_rs::UTF_8;
    use futures::stream::{self, StreamExt};
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};

    enum Reply {
        Html(&'static str),
        Status(u16),
        Unreachable,
    }

    // Serves canned pages and remembers every URL it was asked for
    #[derive(Default)]
    struct ScriptedFetcher {
        pages: HashMap<&'static str, Reply>,
        requests: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn page(mut self, url: &'static str, reply: Reply) -> Self {
            self.pages.insert(url, reply);
            self
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetch for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(Reply::Html(html)) => Ok(Page {
                    url: url.to_string(),
                    status: 200,
                    encoding: UTF_8,
                    body: stream::iter(vec![Ok(html.as_bytes().to_vec())]).boxed(),
                }),
                Some(Reply::Status(status)) => Err(FetchError::HttpStatus {
                    status: *status,
                    url: url.to_string(),
                }),
                Some(Reply::Unreachable) | None => {
                    Err(FetchError::transport(url, "connection refused"))
                }
            }
        }
    }

    // Log sink shared with the test
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }

        fn dispatch(&self) -> Dispatch {
            let writer = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::DEBUG)
                .with_ansi(false)
                .with_writer(move || writer.clone())
                .finish();
            Dispatch::new(subscriber)
        }
    }

    fn quiet<F: Fetch>(fetcher: F, max_depth: usize) -> Crawler<F> {
        Crawler::new(fetcher, CrawlConfig::new(max_depth)).with_dispatch(Dispatch::none())
    }

    async fn crawl_to_string<F: Fetch>(crawler: &Crawler<F>, start: &str) -> (String, CrawlStats) {
        let mut out = Vec::new();
        let stats = crawler.run(start, &mut out).await.unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    #[tokio::test]
    async fn test_prints_tree_in_pre_order() {
        let fetcher = ScriptedFetcher::default()
            .page(
                "http://x.test/",
                Reply::Html(r#"<a href="http://x.test/a">A</a> <a href="http://x.test/b">B</a>"#),
            )
            .page("http://x.test/a", Reply::Html(r#"<a href="http://x.test/c">C</a>"#))
            .page("http://x.test/b", Reply::Html(r#"<a href="http://x.test/d">D</a>"#));
        let crawler = quiet(fetcher, 2);

        let (output, stats) = crawl_to_string(&crawler, "http://x.test/").await;

        assert_eq!(
            output,
            "A (0) - http://x.test/a\n\
             \tC (1) - http://x.test/c\n\
             B (0) - http://x.test/b\n\
             \tD (1) - http://x.test/d\n"
        );
        assert_eq!(
            stats,
            CrawlStats {
                pages_fetched: 3,
                fetch_failures: 0,
                links_printed: 4,
            }
        );
        // Depth-1 links are printed but never downloaded
        assert_eq!(
            crawler.fetcher.requests(),
            vec!["http://x.test/", "http://x.test/a", "http://x.test/b"]
        );
    }

    #[tokio::test]
    async fn test_depth_one_only_lists_start_page() {
        let fetcher = ScriptedFetcher::default().page(
            "http://x.test/",
            Reply::Html(r#"<a href="http://x.test/a">A</a>"#),
        );
        let crawler = quiet(fetcher, 1);

        let (output, _) = crawl_to_string(&crawler, "http://x.test/").await;

        assert_eq!(output, "A (0) - http://x.test/a\n");
        assert_eq!(crawler.fetcher.requests(), vec!["http://x.test/"]);
    }

    #[tokio::test]
    async fn test_failed_branch_does_not_stop_siblings() {
        let fetcher = ScriptedFetcher::default()
            .page(
                "http://x.test/",
                Reply::Html(
                    r#"<a href="http://x.test/missing">Missing</a>
                       <a href="http://down.test/">Down</a>
                       <a href="http://x.test/b">B</a>"#,
                ),
            )
            .page("http://x.test/missing", Reply::Status(404))
            .page("http://down.test/", Reply::Unreachable)
            .page("http://x.test/b", Reply::Html(r#"<a href="/d">D</a>"#));
        let crawler = quiet(fetcher, 2);

        let (output, stats) = crawl_to_string(&crawler, "http://x.test/").await;

        assert_eq!(
            output,
            "Missing (0) - http://x.test/missing\n\
             Down (0) - http://down.test/\n\
             B (0) - http://x.test/b\n\
             \tD (1) - /d\n"
        );
        assert_eq!(stats.fetch_failures, 2);
        assert_eq!(stats.pages_fetched, 2);
    }

    #[tokio::test]
    async fn test_unreachable_start_prints_nothing() {
        let crawler = quiet(ScriptedFetcher::default(), 2);

        let (output, stats) = crawl_to_string(&crawler, "http://nowhere.test/").await;

        assert!(output.is_empty());
        assert_eq!(stats.fetch_failures, 1);
        assert_eq!(stats.links_printed, 0);
    }

    #[tokio::test]
    async fn test_cycle_is_bounded_by_depth() {
        let fetcher = ScriptedFetcher::default().page(
            "http://x.test/",
            Reply::Html(r#"<a href="http://x.test/">Home</a>"#),
        );
        let crawler = quiet(fetcher, 3);

        let (output, _) = crawl_to_string(&crawler, "http://x.test/").await;

        assert_eq!(
            output,
            "Home (0) - http://x.test/\n\
             \tHome (1) - http://x.test/\n\
             \t\tHome (2) - http://x.test/\n"
        );
        assert_eq!(crawler.fetcher.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_zero_depth_prints_nothing() {
        let fetcher = ScriptedFetcher::default().page(
            "http://x.test/",
            Reply::Html(r#"<a href="http://x.test/a">A</a>"#),
        );
        let crawler = quiet(fetcher, 0);

        let (output, stats) = crawl_to_string(&crawler, "http://x.test/").await;

        assert!(output.is_empty());
        assert_eq!(stats.pages_fetched, 1);
    }

    #[tokio::test]
    async fn test_logs_go_to_injected_dispatch() {
        let logs = LogBuffer::default();
        let fetcher = ScriptedFetcher::default()
            .page(
                "http://x.test/",
                Reply::Html(r#"</a><a href="http://x.test/gone">Gone</a>"#),
            )
            .page("http://x.test/gone", Reply::Status(404));
        let crawler = Crawler::new(fetcher, CrawlConfig::new(2)).with_dispatch(logs.dispatch());

        let (output, _) = crawl_to_string(&crawler, "http://x.test/").await;

        assert_eq!(output, "Gone (0) - http://x.test/gone\n");
        let logs = logs.contents();
        assert!(logs.contains("Error (404): http://x.test/gone"), "{}", logs);
        assert!(logs.contains("Link end found without start"), "{}", logs);
        assert!(logs.contains("Crawl finished"), "{}", logs);
    }

    #[tokio::test]
    async fn test_write_failure_is_returned() {
        struct ClosedPipe;

        impl io::Write for ClosedPipe {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let fetcher = ScriptedFetcher::default().page(
            "http://x.test/",
            Reply::Html(r#"<a href="http://x.test/a">A</a>"#),
        );
        let crawler = quiet(fetcher, 2);

        let err = crawler.run("http://x.test/", &mut ClosedPipe).await.unwrap_err();
        assert!(err.to_string().contains("Failed to write link"));
    }
}
