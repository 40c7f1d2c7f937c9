// src/extract/link.rs
// =============================================================================
// The Link record and the rules that decide whether a link is worth keeping.
//
// Rust concepts:
// - Private fields + accessor methods: a Link can't be changed once built
// - impl Display: lets us print a Link with println!("{}", link)
// =============================================================================

use std::fmt;

// A hyperlink found on a page
//
// depth is the depth of the page the link was found on (the start page
// is depth 0). Built once by the extractor and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    url: String,
    text: String,
    depth: usize,
}

impl Link {
    // Creates a link
    //
    // Parameters:
    //   url: the href value (surrounding whitespace is trimmed)
    //   text: everything between <a> and </a> (also trimmed)
    //   depth: depth of the page the link was found on
    pub fn new(url: &str, text: &str, depth: usize) -> Self {
        Self {
            url: url.trim().to_string(),
            text: text.trim().to_string(),
            depth,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    // Decides whether the link should be reported
    //
    // Returns: true only when all of these hold
    //   1. it was found above max_depth
    //   2. its text is not blank
    //   3. its URL is not blank, and neither the URL nor the text mentions
    //      "javascript" in any letter case
    //
    // Rule 3 is a plain substring match, so it also drops ordinary links
    // such as /guides/javascript/ or anchors titled "JavaScript".
    pub fn is_valid(&self, max_depth: usize) -> bool {
        // Too deep: the crawl stops before this level
        if self.depth >= max_depth {
            return false;
        }

        // Nothing to show for it in the output
        if self.text.trim().is_empty() {
            return false;
        }

        // Nowhere to go
        if self.url.trim().is_empty() {
            return false;
        }

        // javascript: pseudo-URLs (and anything else that says javascript)
        !mentions_javascript(&self.url) && !mentions_javascript(&self.text)
    }
}

// Case-insensitive check for the substring "javascript"
fn mentions_javascript(value: &str) -> bool {
    value.to_lowercase().contains("javascript")
}

// One line of crawl output: "<tabs><text> (<depth>) - <url>"
impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.depth {
            f.write_str("\t")?;
        }
        write!(f, "{} ({}) - {}", self.text, self.depth, self.url)
    }
}
